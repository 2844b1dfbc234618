use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::{Value, json};
use url::Url;

use crate::auth::{AuthError, TokenProvider};
use crate::codec::EncodedImage;
use crate::config::ClassifierConfig;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid classifier endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Classifier responded with HTTP {status_code} but the body could not be read: {detail}")]
    Body { status_code: u16, detail: String },
}

impl ClassifierError {
    /// HTTP status received before the failure, if the request got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClassifierError::Body { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Status and decoded body of a predict call. Bodies that are not JSON are
/// kept as `{"raw_text": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHttpResponse {
    pub status_code: u16,
    pub body: Value,
}

impl RawHttpResponse {
    pub fn from_text(status_code: u16, text: &str) -> Self {
        let body = serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw_text": text }));
        Self { status_code, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

pub trait Classifier {
    /// Sends one image to the remote classifier. A non-success HTTP status is
    /// not an error here; it comes back in the response.
    async fn classify(
        &self,
        image: &EncodedImage,
        threshold: f64,
        max_results: u32,
    ) -> Result<RawHttpResponse, ClassifierError>;
}

#[derive(Serialize)]
pub struct PredictRequest<'a> {
    pub instances: Vec<PredictInstance<'a>>,
    pub parameters: PredictParameters,
}

#[derive(Serialize)]
pub struct PredictInstance<'a> {
    pub content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    pub confidence_threshold: f64,
    pub max_predictions: u32,
}

impl<'a> PredictRequest<'a> {
    pub fn new(image_b64: &'a str, threshold: f64, max_results: u32) -> Self {
        Self {
            instances: vec![PredictInstance { content: image_b64 }],
            parameters: PredictParameters {
                confidence_threshold: threshold,
                max_predictions: max_results,
            },
        }
    }
}

pub fn predict_url(config: &ClassifierConfig) -> Result<Url, url::ParseError> {
    let host = config
        .api_host
        .clone()
        .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", config.location));
    Url::parse(&format!(
        "{}/v1/projects/{}/locations/{}/endpoints/{}:predict",
        host.trim_end_matches('/'),
        config.project_id,
        config.location,
        config.endpoint_id
    ))
}

/// Vertex AI online prediction endpoint.
#[derive(Clone)]
pub struct VertexClassifier<T> {
    http_client: HttpClient,
    token_provider: T,
    endpoint: Url,
}

impl<T: TokenProvider> VertexClassifier<T> {
    pub fn new(
        http_client: HttpClient,
        token_provider: T,
        config: &ClassifierConfig,
    ) -> Result<Self, ClassifierError> {
        Ok(Self {
            http_client,
            token_provider,
            endpoint: predict_url(config)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl<T: TokenProvider> Classifier for VertexClassifier<T> {
    async fn classify(
        &self,
        image: &EncodedImage,
        threshold: f64,
        max_results: u32,
    ) -> Result<RawHttpResponse, ClassifierError> {
        let token = self.token_provider.access_token().await?;
        let request = PredictRequest::new(&image.base64, threshold, max_results);

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status_code = response.status().as_u16();
        log::info!("Classifier responded with HTTP {}", status_code);
        let text = response
            .text()
            .await
            .map_err(|e| ClassifierError::Body {
                status_code,
                detail: e.to_string(),
            })?;

        Ok(RawHttpResponse::from_text(status_code, &text))
    }
}
