//! Authentication service.
//!
//! Email and password sign-in against the auth provider. Sessions are issued
//! and revoked by the provider; this service validates input and maps
//! provider failures onto [`AuthError`].

mod error;

pub use error::AuthError;

use std::sync::Arc;

use marys_fashion_core::Email;
use tracing::{info, instrument, warn};

use crate::gateway::{AuthGateway, AuthUser, GatewayError, Session};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the provider rejects the
    /// credentials.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;

        let session = self
            .gateway
            .sign_in(email.as_str(), password)
            .await
            .map_err(|e| match e {
                GatewayError::Unauthorized(_) | GatewayError::NotFound(_) => {
                    AuthError::InvalidCredentials
                }
                other => AuthError::Gateway(other),
            })?;

        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        self.gateway
            .sign_up(email.as_str(), password)
            .await
            .map_err(|e| match e {
                GatewayError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Gateway(other),
            })
    }

    /// Revoke a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the provider no longer knows
    /// the token.
    #[instrument(skip(self, session), fields(user_id = %session.user.id))]
    pub async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.gateway
            .sign_out(&session.access_token)
            .await
            .map_err(map_token_error)
    }

    /// Ask the provider to mail a password-reset link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.gateway.reset_password(email.as_str()).await?;
        Ok(())
    }

    /// Resolve the user behind a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the session has expired locally
    /// or the provider rejects its token.
    #[instrument(skip(self, session))]
    pub async fn current_user(&self, session: &Session) -> Result<AuthUser, AuthError> {
        if session.is_expired() {
            warn!("Session expired before lookup");
            return Err(AuthError::SessionExpired);
        }

        self.gateway
            .current_user(&session.access_token)
            .await
            .map_err(map_token_error)
    }
}

fn map_token_error(e: GatewayError) -> AuthError {
    match e {
        GatewayError::Unauthorized(_) => AuthError::SessionExpired,
        other => AuthError::Gateway(other),
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}
