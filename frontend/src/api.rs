use gloo_file::File as GlooFile;
use gloo_net::http::Request;
use shared::{ANALYZE_ENDPOINT, AnalysisReport, ErrorResponse, IMAGE_FIELD};
use web_sys::FormData;

/// Uploads one image and returns the backend's report. Transport failures and
/// rejected uploads come back as a displayable message.
pub async fn analyze_image(file: &GlooFile) -> Result<AnalysisReport, String> {
    let form_data = FormData::new().map_err(|_| "Failed to build form data".to_string())?;
    let raw_file: &web_sys::File = file.as_ref();
    form_data
        .append_with_blob_and_filename(IMAGE_FIELD, raw_file, &file.name())
        .map_err(|_| "Failed to attach image to request".to_string())?;

    let response = Request::post(ANALYZE_ENDPOINT)
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if response.ok() {
        return response
            .json::<AnalysisReport>()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e));
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => Err(err.error),
        Err(_) => Err(format!("Server error: {} - {}", status, body)),
    }
}
