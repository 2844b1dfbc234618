use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use serde_json::json;
use shared::{ANALYZE_ENDPOINT, ErrorResponse};

use crate::codec::CodecError;
use crate::explain::Explainer;
use crate::pipeline::{AnalyzeError, Analyzer};
use crate::vertex::Classifier;

const DEFAULT_FILE_NAME: &str = "upload";

pub fn configure_routes<C, E>(cfg: &mut web::ServiceConfig, frontend_dir: String)
where
    C: Classifier + 'static,
    E: Explainer + 'static,
{
    cfg.service(web::resource(ANALYZE_ENDPOINT).route(web::post().to(handle_analyze::<C, E>)))
        .service(web::resource("/api/health").route(web::get().to(health)))
        .service(Files::new("/", frontend_dir).index_file("index.html"));
}

fn error_response(mut builder: actix_web::HttpResponseBuilder, message: String) -> HttpResponse {
    builder.json(ErrorResponse { error: message })
}

async fn handle_analyze<C, E>(
    analyzer: web::Data<Analyzer<C, E>>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error>
where
    C: Classifier + 'static,
    E: Explainer + 'static,
{
    let max_upload_bytes = analyzer.settings().max_upload_bytes;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = payload.try_next().await? {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|name| if name.is_empty() { DEFAULT_FILE_NAME } else { name })
            .map(str::to_string);

        // Only the first non-empty file field is the upload; text fields are drained.
        let Some(file_name) = file_name.filter(|_| upload.is_none()) else {
            while let Some(chunk) = field.next().await {
                chunk?;
            }
            continue;
        };

        let mut image_data = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            if image_data.len() + data.len() > max_upload_bytes {
                warn!("Upload {} exceeds {} bytes", file_name, max_upload_bytes);
                let err = CodecError::TooLarge {
                    size: image_data.len() + data.len(),
                    limit: max_upload_bytes,
                };
                return Ok(error_response(HttpResponse::PayloadTooLarge(), err.to_string()));
            }
            image_data.extend_from_slice(&data);
        }

        if !image_data.is_empty() {
            upload = Some((file_name, image_data));
        }
    }

    let Some((file_name, image_data)) = upload else {
        return Ok(error_response(
            HttpResponse::BadRequest(),
            "No image file received".to_string(),
        ));
    };

    match analyzer.analyze(&file_name, &image_data).await {
        Ok(report) => {
            info!(
                "[{}] Analysis finished for {} (HTTP {})",
                report.request_id, report.file_name, report.status_code
            );
            Ok(HttpResponse::Ok().json(report))
        }
        Err(AnalyzeError::InvalidImage(e @ CodecError::TooLarge { .. })) => {
            Ok(error_response(HttpResponse::PayloadTooLarge(), e.to_string()))
        }
        Err(AnalyzeError::InvalidImage(e)) => {
            warn!("Rejected upload {}: {}", file_name, e);
            Ok(error_response(HttpResponse::BadRequest(), e.to_string()))
        }
        Err(e @ AnalyzeError::Auth(_)) => {
            error!("Failed to authenticate/send {}: {}", file_name, e);
            Ok(error_response(HttpResponse::ServiceUnavailable(), e.to_string()))
        }
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
