use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::codec::EncodedImage;
use crate::config::ExplainerConfig;

pub const MISSING_KEY_PLACEHOLDER: &str = "[Explanation] Unavailable: OPENAI_API_KEY is not set. \
    Create a .env with OPENAI_API_KEY=... or export it in the environment.";

const SYSTEM_PROMPT: &str = "You are an assistant that describes VISUAL findings of brain scans \
    in plain language. Base yourself primarily on what is visible in the image. \
    Use the status (Demented/nonDemented) only as the focus of the analysis. \
    Do not invent: if something is not clear in the image, say it is uncertain. \
    Do not provide a diagnosis or clinical guidance.";

pub trait Explainer {
    /// Describes the visual evidence in `image`, steered by `focus_label`.
    /// Failures come back as a readable placeholder, never as an error.
    async fn explain(&self, image: &EncodedImage, focus_label: &str) -> String;
}

#[derive(Debug, thiserror::Error)]
enum ExplainError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub fn user_prompt(focus_label: &str) -> String {
    format!(
        "Classifier status: '{}'. \
        Analyze ONLY the image and explain, in 3-5 objective bullet points, \
        what in it supports this status. \
        If 'Demented', focus on signs compatible with Alzheimer's disease (e.g. hippocampal atrophy, \
        enlarged lateral ventricles, temporoparietal cortical thinning). \
        If 'nonDemented', focus on the absence of these patterns (preserved volumes, \
        expected ventricular proportions, symmetry). \
        If it is not possible to identify this reliably, say it is uncertain. \
        At the end, include one line: 'Notice: this is not a medical diagnosis.' \
        Do not mention Vertex/JSON/tokens.",
        focus_label
    )
}

pub fn build_chat_request(config: &ExplainerConfig, image: &EncodedImage, focus_label: &str) -> ChatRequest {
    ChatRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: user_prompt(focus_label),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ]),
            },
        ],
        temperature: config.temperature,
    }
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiExplainer {
    http_client: HttpClient,
    config: ExplainerConfig,
}

impl OpenAiExplainer {
    pub fn new(http_client: HttpClient, config: ExplainerConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn request_explanation(
        &self,
        api_key: &str,
        image: &EncodedImage,
        focus_label: &str,
    ) -> Result<String, ExplainError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = build_chat_request(&self.config, image, focus_label);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(ExplainError::Status { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        Ok(extract_content(chat))
    }
}

fn extract_content(chat: ChatResponse) -> String {
    chat.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default()
        .trim()
        .to_string()
}

impl Explainer for OpenAiExplainer {
    async fn explain(&self, image: &EncodedImage, focus_label: &str) -> String {
        let Some(api_key) = self.config.api_key.as_deref() else {
            log::warn!("OPENAI_API_KEY not set; skipping explanation");
            return MISSING_KEY_PLACEHOLDER.to_string();
        };

        match self.request_explanation(api_key, image, focus_label).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Explanation request failed: {}", e);
                format!("[Explanation] Error generating explanation: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::PNG_HEADER;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn explainer_for(server: &MockServer) -> OpenAiExplainer {
        let config = ExplainerConfig {
            api_key: Some("sk-test".to_string()),
            base_url: format!("{}/v1/", server.uri()),
            ..ExplainerConfig::default()
        };
        OpenAiExplainer::new(HttpClient::new(), config)
    }

    fn image() -> EncodedImage {
        EncodedImage::from_bytes(PNG_HEADER, 1024).unwrap()
    }

    #[actix_web::test]
    async fn test_missing_key_returns_placeholder() {
        let explainer = OpenAiExplainer::new(HttpClient::new(), ExplainerConfig::default());
        assert!(!explainer.is_configured());
        assert_eq!(explainer.explain(&image(), "Demented").await, MISSING_KEY_PLACEHOLDER);
    }

    #[actix_web::test]
    async fn test_transport_failure_returns_placeholder() {
        let config = ExplainerConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://127.0.0.1:1".to_string(),
            ..ExplainerConfig::default()
        };
        let explainer = OpenAiExplainer::new(HttpClient::new(), config);
        let text = explainer.explain(&image(), "Demented").await;
        assert!(text.starts_with("[Explanation] Error generating explanation:"), "{text}");
    }

    #[test]
    fn test_chat_request_shape() {
        let image = image();
        let request = build_chat_request(&ExplainerConfig::default(), &image, "nonDemented");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"][0]["type"], "text");
        assert!(
            body["messages"][1]["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("Classifier status: 'nonDemented'")
        );
        assert_eq!(
            body["messages"][1]["content"][1],
            json!({"type": "image_url", "image_url": {"url": image.data_url()}})
        );
    }

    #[test]
    fn test_extract_content() {
        let chat: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "  - Ventricles look normal.\n"}}]
        }))
        .unwrap();
        assert_eq!(extract_content(chat), "- Ventricles look normal.");

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(extract_content(empty), "");

        let null_content: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert_eq!(extract_content(null_content), "");
    }

    #[actix_web::test]
    async fn test_explanation_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini", "temperature": 0.1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "- Hippocampal volume looks preserved.\n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = explainer_for(&server).explain(&image(), "nonDemented").await;
        assert_eq!(text, "- Hippocampal volume looks preserved.");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["messages"][1]["content"][1]["image_url"]["url"], image().data_url());
    }

    #[actix_web::test]
    async fn test_explanation_error_status_returns_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let text = explainer_for(&server).explain(&image(), "Demented").await;
        assert_eq!(
            text,
            "[Explanation] Error generating explanation: API returned HTTP 429: rate limited"
        );
    }
}
