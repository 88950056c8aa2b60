/// Registration, login and logout
use crate::config::Config;
use crate::error::Result;
use crate::forms::{BoundForm, FormErrors, LoginForm, ProfileForm, RegisterFields, RegisterForm};
use crate::handlers::{read_image_part, text_part};
use crate::metrics::blog::REGISTRATIONS_TOTAL;
use crate::middleware::PresentedSession;
use crate::render::{
    expired_session_cookie, redirect, redirect_with_cookie, session_cookie, Page, Target,
};
use crate::services::{AuthService, RegisterOutcome};
use crate::storage::{MediaKind, MediaStorage};
use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{web, Either, HttpResponse};
use sqlx::PgPool;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Registration submitted as multipart (with an optional picture)
#[derive(MultipartForm)]
pub struct RegisterUpload {
    username: Option<Text<String>>,
    first_name: Option<Text<String>>,
    last_name: Option<Text<String>>,
    email: Option<Text<String>>,
    password1: Option<Text<String>>,
    password2: Option<Text<String>>,
    contact_number: Option<Text<String>>,
    profile_picture: Option<TempFile>,
}

impl RegisterUpload {
    fn into_parts(self) -> (RegisterFields, Option<TempFile>) {
        let fields = RegisterFields {
            username: text_part(self.username),
            first_name: text_part(self.first_name),
            last_name: text_part(self.last_name),
            email: text_part(self.email),
            password1: text_part(self.password1),
            password2: text_part(self.password2),
            contact_number: text_part(self.contact_number),
        };
        (fields, self.profile_picture)
    }
}

pub type RegisterPayload = Either<MultipartForm<RegisterUpload>, web::Form<RegisterFields>>;

fn register_view(
    user_form: &RegisterForm,
    user_errors: FormErrors,
    profile_form: &ProfileForm,
    profile_errors: FormErrors,
) -> HttpResponse {
    Page::new("register")
        .with(
            "form",
            BoundForm {
                data: user_form.public_data(),
                errors: user_errors,
            },
        )
        .with(
            "profile_form",
            BoundForm {
                data: profile_form.public_data(),
                errors: profile_errors,
            },
        )
        .render()
}

pub async fn register_page() -> Page {
    Page::new("register")
        .with("form", BoundForm::unbound())
        .with("profile_form", BoundForm::unbound())
}

/// Create a user and profile, then send the caller to log in
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
    payload: RegisterPayload,
) -> Result<HttpResponse> {
    let (fields, picture) = match payload {
        Either::Left(MultipartForm(upload)) => upload.into_parts(),
        Either::Right(form) => (form.into_inner(), None),
    };
    let (user_form, profile_form) = fields.split();
    let service = AuthService::new(pool.get_ref().clone(), config.session.clone());

    // Both forms are checked so every problem is reported at once
    let mut user_errors = user_form.errors();
    let mut profile_errors = profile_form.errors();
    let picture =
        read_image_part(picture, &storage, "profile_picture", &mut profile_errors).await?;

    if !user_errors.has("username") && service.username_taken(&user_form.username).await? {
        user_errors.add("username", USERNAME_TAKEN);
    }

    if !user_errors.is_empty() || !profile_errors.is_empty() {
        REGISTRATIONS_TOTAL.with_label_values(&["invalid"]).inc();
        return Ok(register_view(
            &user_form,
            user_errors,
            &profile_form,
            profile_errors,
        ));
    }

    let picture_key = match &picture {
        Some(image) => Some(storage.save(MediaKind::ProfilePicture, image).await?),
        None => None,
    };

    let outcome = service
        .register(&user_form, &profile_form, picture_key.as_deref())
        .await;

    if !matches!(outcome, Ok(RegisterOutcome::Created(_))) {
        if let Some(key) = picture_key.as_deref() {
            storage.remove(key).await;
        }
    }

    match outcome? {
        RegisterOutcome::Created(_) => Ok(redirect(Target::Login)),
        RegisterOutcome::UsernameTaken => {
            user_errors.add("username", USERNAME_TAKEN);
            Ok(register_view(
                &user_form,
                user_errors,
                &profile_form,
                profile_errors,
            ))
        }
    }
}

pub async fn login_page() -> Page {
    Page::new("login")
}

/// Check credentials and start a fresh session
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    presented: Option<PresentedSession>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim();
    let service = AuthService::new(pool.get_ref().clone(), config.session.clone());

    let Some(user) = service.authenticate(username, &form.password).await? else {
        return Ok(Page::new("login")
            .with("error", INVALID_CREDENTIALS)
            .with("username", username)
            .render());
    };

    let session = service
        .start_session(&user, presented.as_ref().map(|s| s.0.as_str()))
        .await?;

    Ok(redirect_with_cookie(
        Target::Home,
        session_cookie(&config.session, &session.token),
    ))
}

/// Drop the presented session (if any) and clear the cookie
pub async fn logout(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    presented: Option<PresentedSession>,
) -> Result<HttpResponse> {
    if let Some(session) = presented {
        let service = AuthService::new(pool.get_ref().clone(), config.session.clone());
        service.end_session(&session.0).await?;
    }

    Ok(redirect_with_cookie(
        Target::Login,
        expired_session_cookie(&config.session),
    ))
}
