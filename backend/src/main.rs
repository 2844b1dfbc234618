mod auth;
mod codec;
mod config;
mod explain;
mod interpret;
mod pipeline;
mod routes;
mod vertex;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use auth::AdcTokenProvider;
use config::AppConfig;
use explain::OpenAiExplainer;
use pipeline::{AnalysisSettings, Analyzer};
use routes::configure_routes;
use std::time::Duration;
use vertex::VertexClassifier;

type AppAnalyzer = Analyzer<VertexClassifier<AdcTokenProvider>, OpenAiExplainer>;

fn build_http_client(timeout_secs: u64) -> std::io::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(std::io::Error::other)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::other(e)
    })?;

    let classifier_client = build_http_client(config.classifier.timeout_secs)?;
    let token_provider = AdcTokenProvider::new(classifier_client.clone());
    let classifier = VertexClassifier::new(classifier_client, token_provider, &config.classifier)
        .map_err(|e| {
            log::error!("Invalid classifier configuration: {}", e);
            std::io::Error::other(e)
        })?;
    log::info!("Classifier endpoint: {}", classifier.endpoint());

    let explainer = OpenAiExplainer::new(
        build_http_client(config.explainer.timeout_secs)?,
        config.explainer.clone(),
    );
    if explainer.is_configured() {
        log::info!("Explanations enabled with model {}", config.explainer.model);
    } else {
        log::warn!("OPENAI_API_KEY is not set. Explanations will show a placeholder.");
    }

    let settings = AnalysisSettings {
        confidence_threshold: config.classifier.confidence_threshold,
        max_predictions: config.classifier.max_predictions,
        max_upload_bytes: config.server.max_upload_bytes,
    };
    let analyzer: web::Data<AppAnalyzer> =
        web::Data::new(Analyzer::new(classifier, explainer, settings));

    let frontend_dir = config.server.frontend_dir.clone();
    let bind_address = format!("0.0.0.0:{}", config.server.port);
    log::info!("Serving frontend from {}", frontend_dir);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(analyzer.clone())
            .configure(|cfg| {
                configure_routes::<VertexClassifier<AdcTokenProvider>, OpenAiExplainer>(
                    cfg,
                    frontend_dir.clone(),
                )
            })
    })
    .bind(&bind_address)?
    .run()
    .await
}
