//! Bearer tokens for the classifier endpoint, resolved from Application
//! Default Credentials.

pub mod credentials;
pub mod token;

pub use token::{AdcTokenProvider, TokenProvider};

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Shown to the user whenever a token cannot be obtained.
pub const AUTH_REMEDIATION: &str = "Failed to authenticate with the classifier. \
    Run `gcloud auth application-default login` or set GOOGLE_APPLICATION_CREDENTIALS \
    to a valid service-account key.json.";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to read credentials file {path}: {source}")]
    CredentialsFile {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to sign token assertion: {0}")]
    SigningError(#[from] jsonwebtoken::errors::Error),
    #[error("Token request failed: {0}")]
    TokenEndpoint(String),
    #[error("No application default credentials found")]
    NotFound,
}
