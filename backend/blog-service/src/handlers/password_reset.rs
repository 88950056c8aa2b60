/// Username-based password reset
///
/// Anyone who knows a username can replace its password. Every use is logged
/// at warn level by the auth service.
use crate::config::Config;
use crate::error::Result;
use crate::forms::{FormErrors, PasswordResetForm};
use crate::metrics::blog::PASSWORD_RESETS_TOTAL;
use crate::render::{redirect, Page, Target};
use crate::services::{AuthService, ResetOutcome};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

pub const PASSWORDS_DONT_MATCH: &str = "Passwords don't match";
pub const USERNAME_NOT_FOUND: &str = "Username not found";

fn reset_view(username: &str, error: Option<&str>, errors: FormErrors) -> HttpResponse {
    Page::new("simple_reset")
        .with("username", username)
        .with("error", error)
        .with("errors", errors)
        .render()
}

pub async fn reset_password_page() -> Page {
    Page::new("simple_reset")
}

pub async fn reset_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    form: web::Form<PasswordResetForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim();

    if !form.passwords_match() {
        PASSWORD_RESETS_TOTAL.with_label_values(&["invalid"]).inc();
        return Ok(reset_view(
            username,
            Some(PASSWORDS_DONT_MATCH),
            FormErrors::new(),
        ));
    }

    let errors = form.password_errors();
    if !errors.is_empty() {
        PASSWORD_RESETS_TOTAL.with_label_values(&["invalid"]).inc();
        return Ok(reset_view(username, None, errors));
    }

    let service = AuthService::new(pool.get_ref().clone(), config.session.clone());
    match service.reset_password(username, &form.new_password).await? {
        ResetOutcome::Updated => Ok(redirect(Target::Login)),
        ResetOutcome::UnknownUser => Ok(reset_view(
            username,
            Some(USERNAME_NOT_FOUND),
            FormErrors::new(),
        )),
    }
}
