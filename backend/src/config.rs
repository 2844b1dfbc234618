use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "config/neuroscan.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub classifier: ClassifierConfig,
    pub explainer: ExplainerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub frontend_dir: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub project_id: String,
    pub location: String,
    pub endpoint_id: String,
    /// Overrides `https://{location}-aiplatform.googleapis.com`.
    pub api_host: Option<String>,
    pub confidence_threshold: f64,
    pub max_predictions: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let frontend_dir = if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            format!("{}/../frontend/dist", manifest_dir)
        } else {
            "/usr/src/app/frontend/dist".to_string()
        };
        Self {
            port: 8081,
            frontend_dir,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: "us-central1".to_string(),
            endpoint_id: String::new(),
            api_host: None,
            confidence_threshold: 0.5,
            max_predictions: 5,
            timeout_secs: 60,
        }
    }
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Built-in defaults, then the YAML file (if any), then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("NEUROSCAN_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(config_str)?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_var("PORT", port)?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.server.frontend_dir = dir;
        }
        if let Some(max) = lookup("MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", max)?;
        }

        if let Some(project_id) = lookup("VERTEX_PROJECT_ID") {
            self.classifier.project_id = project_id;
        }
        if let Some(location) = lookup("VERTEX_LOCATION") {
            self.classifier.location = location;
        }
        if let Some(endpoint_id) = lookup("VERTEX_ENDPOINT_ID") {
            self.classifier.endpoint_id = endpoint_id;
        }
        if let Some(host) = lookup("VERTEX_API_HOST") {
            self.classifier.api_host = Some(host);
        }
        if let Some(threshold) = lookup("VERTEX_CONFIDENCE_THRESHOLD") {
            self.classifier.confidence_threshold =
                parse_var("VERTEX_CONFIDENCE_THRESHOLD", threshold)?;
        }
        if let Some(max) = lookup("VERTEX_MAX_PREDICTIONS") {
            self.classifier.max_predictions = parse_var("VERTEX_MAX_PREDICTIONS", max)?;
        }

        self.explainer.api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.explainer.base_url = base_url;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.explainer.model = model;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("VERTEX_PROJECT_ID"));
        }
        if self.classifier.endpoint_id.trim().is_empty() {
            return Err(ConfigError::Missing("VERTEX_ENDPOINT_ID"));
        }
        if self.classifier.location.trim().is_empty() {
            return Err(ConfigError::Missing("VERTEX_LOCATION"));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
