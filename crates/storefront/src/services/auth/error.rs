//! Authentication error types.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marys_fashion_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Access token expired or revoked.
    #[error("session expired")]
    SessionExpired,

    /// Auth provider error.
    #[error("auth provider error: {0}")]
    Gateway(#[from] GatewayError),
}
