use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::AuthError;

pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
const WELL_KNOWN_FILE: &str = ".config/gcloud/application_default_credentials.json";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Contents of a credentials JSON file, keyed by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Written by `gcloud auth application-default login`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    File(PathBuf),
    MetadataServer,
}

impl CredentialsFile {
    pub fn read(path: &Path) -> Result<Self, AuthError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| AuthError::CredentialsFile {
                path: path.display().to_string(),
                source,
            })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, AuthError> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Picks where credentials come from: the explicit key file, then the gcloud
/// well-known file, then the metadata server.
pub fn locate(env_path: Option<String>, home_dir: Option<PathBuf>) -> CredentialSource {
    if let Some(path) = env_path.filter(|p| !p.trim().is_empty()) {
        return CredentialSource::File(PathBuf::from(path));
    }
    if let Some(well_known) = home_dir.map(|home| home.join(WELL_KNOWN_FILE)) {
        if well_known.is_file() {
            return CredentialSource::File(well_known);
        }
    }
    CredentialSource::MetadataServer
}

pub fn locate_from_env() -> CredentialSource {
    locate(std::env::var(CREDENTIALS_ENV).ok(), dirs::home_dir())
}
