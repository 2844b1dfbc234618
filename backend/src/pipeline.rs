use serde_json::Value;
use shared::AnalysisReport;
use uuid::Uuid;

use crate::auth::{AUTH_REMEDIATION, AuthError};
use crate::codec::{CodecError, EncodedImage};
use crate::explain::Explainer;
use crate::interpret::interpret;
use crate::vertex::{Classifier, ClassifierError};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub confidence_threshold: f64,
    pub max_predictions: u32,
    pub max_upload_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("{0}")]
    InvalidImage(#[from] CodecError),
    #[error("{remediation} Detail: {0}", remediation = AUTH_REMEDIATION)]
    Auth(AuthError),
}

/// Runs one image through classify → interpret → explain.
pub struct Analyzer<C, E> {
    classifier: C,
    explainer: E,
    settings: AnalysisSettings,
}

impl<C: Classifier, E: Explainer> Analyzer<C, E> {
    pub fn new(classifier: C, explainer: E, settings: AnalysisSettings) -> Self {
        Self {
            classifier,
            explainer,
            settings,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub async fn analyze(
        &self,
        file_name: &str,
        image_data: &[u8],
    ) -> Result<AnalysisReport, AnalyzeError> {
        let image = EncodedImage::from_bytes(image_data, self.settings.max_upload_bytes)?;
        let request_id = Uuid::new_v4().to_string();

        log::info!(
            "[{}] Sending {} ({}, {} bytes) to classifier",
            request_id,
            file_name,
            image.mime_type,
            image_data.len()
        );

        let mut report = AnalysisReport {
            request_id,
            file_name: file_name.to_string(),
            image_sha256: image.sha256.clone(),
            status_code: 0,
            raw_response: Value::Null,
            result: None,
            explanation: None,
            error: None,
        };

        let response = match self
            .classifier
            .classify(
                &image,
                self.settings.confidence_threshold,
                self.settings.max_predictions,
            )
            .await
        {
            Ok(response) => response,
            Err(ClassifierError::Auth(e)) => {
                log::error!("[{}] Authentication failed: {}", report.request_id, e);
                return Err(AnalyzeError::Auth(e));
            }
            Err(e) => {
                log::error!("[{}] {}", report.request_id, e);
                report.status_code = e.status_code().unwrap_or(0);
                report.error = Some(e.to_string());
                return Ok(report);
            }
        };

        let succeeded = response.is_success();
        report.status_code = response.status_code;
        report.raw_response = response.body;

        if !succeeded {
            log::warn!(
                "[{}] Classifier returned HTTP {}",
                report.request_id,
                report.status_code
            );
            report.error = Some(format!(
                "The classifier API returned an error (HTTP {}).",
                report.status_code
            ));
            return Ok(report);
        }

        let result = interpret(&report.raw_response);
        log::info!(
            "[{}] Predicted class: {} (confidence {:.3})",
            report.request_id,
            result.label,
            result.confidence
        );

        let explanation = self.explainer.explain(&image, &result.label).await;
        report.result = Some(result);
        report.explanation = Some(explanation);
        Ok(report)
    }
}
