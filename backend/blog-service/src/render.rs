/// Response shapes produced by the HTML handlers
///
/// A handler either redirects (`302 Found`) or renders a page. Pages are
/// handed to the presentation layer as `{"template": ..., "context": {...}}`.
use crate::config::SessionConfig;
use actix_web::body::BoxBody;
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, Responder};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Redirect destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Home,
    Login,
}

impl Target {
    pub fn path(&self) -> &'static str {
        match self {
            Target::Home => "/",
            Target::Login => "/login",
        }
    }
}

pub fn redirect(target: Target) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, target.path()))
        .finish()
}

/// Redirect that also sets (or clears) a cookie
pub fn redirect_with_cookie(target: Target, cookie: Cookie<'static>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, target.path()))
        .cookie(cookie)
        .finish()
}

/// Named template plus its context
#[derive(Debug, Clone)]
pub struct Page {
    template: &'static str,
    context: Map<String, Value>,
}

impl Page {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            context: Map::new(),
        }
    }

    /// Add a context entry
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::error!(template = self.template, key, error = %e, "unserializable page context");
            Value::Null
        });
        self.context.insert(key.to_string(), value);
        self
    }

    pub fn render(self) -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "template": self.template,
            "context": Value::Object(self.context),
        }))
    }
}

impl Responder for Page {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        self.render()
    }
}

/// Cookie carrying a freshly issued session token
pub fn session_cookie(config: &SessionConfig, token: &str) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), token.to_string())
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(config.ttl_secs))
        .finish()
}

/// Cookie instructing the browser to drop the session
pub fn expired_session_cookie(config: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.cookie_name.clone(), String::new())
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}
