//! Command implementations.
//!
//! Every command builds its services from the backend selected by the
//! environment (`MF_BACKEND`, `SUPABASE_*`). Results are printed to stdout
//! as pretty JSON; progress goes to the tracing log on stderr.
//!
//! # Environment Variables
//!
//! - `MF_BACKEND` - `supabase` (default) or `memory`
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_SERVICE_ROLE_KEY`
//! - `MF_ADMIN_EMAIL`, `MF_ADMIN_PASSWORD` - account used for product writes

pub mod catalog;
pub mod images;
pub mod search;
pub mod users;

use std::path::Path;

use marys_fashion_storefront::config::{BackendConfig, ConfigError, SearchConfig};
use marys_fashion_storefront::gateway::{GatewayError, Gateways, Session};
use marys_fashion_storefront::services::{AuthError, AuthService};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Gateway(#[from] GatewayError),

    /// Sign-in failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payload file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Payload or output is not valid JSON for the expected type.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Argument could not be parsed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The service reported failure (details are in the log).
    #[error("{0} failed")]
    Failed(&'static str),

    /// Nothing matched.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Services wired to the configured backend.
pub struct Context {
    pub gateways: Gateways,
    pub search: SearchConfig,
}

impl Context {
    /// Build from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend configuration is missing or invalid.
    pub fn from_env() -> Result<Self, CliError> {
        dotenvy::dotenv().ok();

        let backend = BackendConfig::from_env()?;
        tracing::info!("Using {} backend", backend.name());

        Ok(Self {
            gateways: Gateways::connect(&backend)?,
            search: SearchConfig::from_env()?,
        })
    }

    /// Build over already-wired gateways.
    #[must_use]
    pub fn with_gateways(gateways: Gateways) -> Self {
        Self {
            gateways,
            search: SearchConfig::default(),
        }
    }

    /// Sign in with the back-office account from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are missing or rejected.
    pub async fn admin_session(&self) -> Result<Session, CliError> {
        let email = std::env::var("MF_ADMIN_EMAIL")
            .map_err(|_| CliError::MissingEnvVar("MF_ADMIN_EMAIL"))?;
        let password = std::env::var("MF_ADMIN_PASSWORD")
            .map_err(|_| CliError::MissingEnvVar("MF_ADMIN_PASSWORD"))?;

        let session = AuthService::new(self.gateways.auth.clone())
            .sign_in(&email, &password)
            .await?;
        tracing::info!("Signed in as {}", email);
        Ok(session)
    }
}

/// Read and decode a JSON payload file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded as `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Print a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}

/// Turn a service's `false` into an error.
const fn ensure(ok: bool, action: &'static str) -> Result<(), CliError> {
    if ok { Ok(()) } else { Err(CliError::Failed(action)) }
}

/// Turn a service's `None` into an error.
fn require<T>(value: Option<T>, action: &'static str) -> Result<T, CliError> {
    value.ok_or(CliError::Failed(action))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use marys_fashion_core::NewCategory;

    use super::*;

    #[test]
    fn test_read_json_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "name": "Acessórios" }}"#).unwrap();

        let category: NewCategory = read_json(file.path()).unwrap();
        assert_eq!(category.name, "Acessórios");
        assert!(category.description.is_none());
    }

    #[test]
    fn test_read_json_errors() {
        let missing = read_json::<NewCategory>(Path::new("/nonexistent/payload.json"));
        assert!(matches!(missing, Err(CliError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            read_json::<NewCategory>(file.path()),
            Err(CliError::Json(_))
        ));
    }

    #[test]
    fn test_ensure_and_require() {
        assert!(ensure(true, "delete").is_ok());
        assert_eq!(
            ensure(false, "delete").unwrap_err().to_string(),
            "delete failed"
        );
        assert_eq!(require(Some(1), "get").unwrap(), 1);
        assert!(require::<i32>(None, "get").is_err());
    }
}
