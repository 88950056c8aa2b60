/// HTTP middleware utilities for blog-service
///
/// - `SessionMiddleware` resolves the session cookie to a user and stores it
///   in request extensions
/// - `CurrentUser` extractor for handlers that require a signed-in caller;
///   anonymous callers are redirected to the login page
/// - `StaffUser` extractor for the moderation pages; signed-in callers
///   without staff rights are sent home
/// - `MetricsMiddleware` records request latency
use crate::db::session_repo;
use crate::error::AppError;
use crate::metrics::blog::HTTP_REQUEST_DURATION_SECONDS;
use crate::models::User;
use crate::render::{redirect, Target};
use crate::security::hash_token;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::InternalError;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

// =====================================================================
// Session resolution
// =====================================================================

/// Signed-in user, stored in request extensions by `SessionMiddleware`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

/// Signed-in user with the staff flag set.
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

impl StaffUser {
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

/// Hash of the session token the request presented, live or not.
#[derive(Debug, Clone)]
pub struct PresentedSession(pub String);

/// Actix middleware that looks up the session cookie in the sessions table.
#[derive(Clone)]
pub struct SessionMiddleware {
    pool: PgPool,
    cookie_name: String,
}

impl SessionMiddleware {
    pub fn new(pool: PgPool, cookie_name: impl Into<String>) -> Self {
        Self {
            pool,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            pool: self.pool.clone(),
            cookie_name: Rc::from(self.cookie_name.as_str()),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    pool: PgPool,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let pool = self.pool.clone();
        let token = req
            .cookie(&self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty());

        Box::pin(async move {
            if let Some(token) = token {
                let token_hash = hash_token(&token);
                match session_repo::find_user(&pool, &token_hash).await {
                    Ok(Some(user)) => {
                        req.extensions_mut().insert(CurrentUser(user));
                    }
                    Ok(None) => tracing::debug!("session cookie matched no live session"),
                    Err(e) => return Err(AppError::from(e).into()),
                }
                req.extensions_mut().insert(PresentedSession(token_hash));
            }

            service.call(req).await
        })
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(req.extensions().get::<CurrentUser>().cloned().ok_or_else(|| {
            InternalError::from_response("login required", redirect(Target::Login)).into()
        }))
    }
}

impl FromRequest for StaffUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let staff = match req.extensions().get::<CurrentUser>() {
            None => Err(InternalError::from_response("login required", redirect(Target::Login))),
            Some(CurrentUser(user)) if user.is_staff => Ok(StaffUser(user.clone())),
            Some(CurrentUser(user)) => {
                tracing::debug!(user_id = user.id, "staff page refused");
                Err(InternalError::from_response("staff only", redirect(Target::Home)))
            }
        };
        ready(staff.map_err(Error::from))
    }
}

impl FromRequest for PresentedSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<PresentedSession>()
                .cloned()
                .ok_or_else(|| actix_web::error::ErrorBadRequest("no session presented")),
        )
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();
            let status = match &res {
                Ok(response) => response.status().as_u16(),
                Err(e) => e.as_response_error().status_code().as_u16(),
            };

            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[method.as_str(), &status.to_string()])
                .observe(elapsed.as_secs_f64());

            let elapsed = elapsed.as_millis();
            tracing::debug!(%method, %path, status, %elapsed, "request completed");
            res
        })
    }
}
