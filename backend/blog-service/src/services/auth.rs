/// Authentication service - registration, credential checks, sessions and
/// password reset
use crate::config::SessionConfig;
use crate::db::{profile_repo, session_repo, user_repo};
use crate::error::{is_unique_violation, AppError, Result};
use crate::forms::{ProfileForm, RegisterForm};
use crate::metrics::blog::{LOGIN_ATTEMPTS_TOTAL, PASSWORD_RESETS_TOTAL, REGISTRATIONS_TOTAL};
use crate::models::{NewUser, User};
use crate::security::{generate_session_token, hash_password, hash_token, verify_password};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use sqlx::PgPool;
use tracing::{debug, info, warn};

/// Verified against when the username is unknown, so both failure paths do
/// the same hashing work
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("dummy-password-for-timing").ok());

#[derive(Debug)]
pub enum RegisterOutcome {
    Created(User),
    /// Lost a race with a concurrent registration of the same username
    UsernameTaken,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    Updated,
    UnknownUser,
}

/// Newly issued session; the raw token goes into the cookie only
#[derive(Debug)]
pub struct IssuedSession {
    pub token: String,
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
}

async fn verify_blocking(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {e}")))?
}

pub struct AuthService {
    pool: PgPool,
    session: SessionConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, session: SessionConfig) -> Self {
        Self { pool, session }
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        Ok(user_repo::username_exists(&self.pool, username).await?)
    }

    /// Create the user and its profile in one transaction
    ///
    /// Both forms must already be valid. `profile_picture` is the media key of
    /// an already stored upload.
    pub async fn register(
        &self,
        user_form: &RegisterForm,
        profile_form: &ProfileForm,
        profile_picture: Option<&str>,
    ) -> Result<RegisterOutcome> {
        let password_hash = hash_blocking(user_form.password1.clone()).await?;

        let mut tx = self.pool.begin().await?;

        let new_user = NewUser {
            username: &user_form.username,
            email: &user_form.email,
            first_name: &user_form.first_name,
            last_name: &user_form.last_name,
            password_hash: &password_hash,
        };
        let user = match user_repo::create_user(&mut tx, &new_user).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                debug!(username = %user_form.username, "username claimed concurrently");
                REGISTRATIONS_TOTAL.with_label_values(&["invalid"]).inc();
                return Ok(RegisterOutcome::UsernameTaken);
            }
            Err(e) => return Err(e.into()),
        };

        profile_repo::create_profile(
            &mut tx,
            user.id,
            &profile_form.contact_number,
            profile_picture,
        )
        .await?;

        tx.commit().await?;

        REGISTRATIONS_TOTAL.with_label_values(&["created"]).inc();
        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(RegisterOutcome::Created(user))
    }

    /// Check credentials; unknown, wrong and inactive all yield `None`
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = user_repo::find_by_username(&self.pool, username).await? else {
            if let Some(dummy) = DUMMY_HASH.as_ref() {
                verify_blocking(password.to_string(), dummy.clone()).await?;
            }
            LOGIN_ATTEMPTS_TOTAL.with_label_values(&["failure"]).inc();
            return Ok(None);
        };

        let valid = verify_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !valid || !user.is_active {
            LOGIN_ATTEMPTS_TOTAL.with_label_values(&["failure"]).inc();
            debug!(user_id = user.id, active = user.is_active, "login rejected");
            return Ok(None);
        }

        LOGIN_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
        Ok(Some(user))
    }

    /// Issue a session for `user`, revoking the one the request presented
    pub async fn start_session(
        &self,
        user: &User,
        presented_token_hash: Option<&str>,
    ) -> Result<IssuedSession> {
        if let Some(previous) = presented_token_hash {
            session_repo::delete_session(&self.pool, previous).await?;
        }

        let token = generate_session_token();
        let expires_at = Utc::now() + Duration::seconds(self.session.ttl_secs);
        session_repo::create_session(&self.pool, &hash_token(&token), user.id, expires_at)
            .await?;
        user_repo::touch_last_login(&self.pool, user.id).await?;

        info!(user_id = user.id, "session started");
        Ok(IssuedSession { token })
    }

    pub async fn end_session(&self, token_hash: &str) -> Result<bool> {
        Ok(session_repo::delete_session(&self.pool, token_hash).await?)
    }

    /// Replace a user's password by username and revoke all their sessions
    ///
    /// No proof of identity is asked for.
    pub async fn reset_password(&self, username: &str, new_password: &str) -> Result<ResetOutcome> {
        let Some(user) = user_repo::find_by_username(&self.pool, username).await? else {
            PASSWORD_RESETS_TOTAL.with_label_values(&["unknown_user"]).inc();
            return Ok(ResetOutcome::UnknownUser);
        };

        let password_hash = hash_blocking(new_password.to_string()).await?;

        let mut tx = self.pool.begin().await?;
        if !user_repo::update_password(&mut tx, user.id, &password_hash).await? {
            PASSWORD_RESETS_TOTAL.with_label_values(&["unknown_user"]).inc();
            return Ok(ResetOutcome::UnknownUser);
        }
        let revoked = session_repo::delete_user_sessions(&mut tx, user.id).await?;
        tx.commit().await?;

        PASSWORD_RESETS_TOTAL.with_label_values(&["updated"]).inc();
        warn!(
            user_id = user.id,
            sessions_revoked = revoked,
            "password reset without identity verification"
        );
        Ok(ResetOutcome::Updated)
    }
}
