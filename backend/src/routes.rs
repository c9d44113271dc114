use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{web, Error, HttpMessage, HttpRequest, HttpResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use shared::{AnalyzeRequest, SaveHistoryRequest};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::ecg::{self, EcgError, decoder};
use crate::history::repository::HistoryRepository;
use crate::storage::upload_service::{StoredUpload, UploadService, UploadServiceError};

const REQUIRED_HISTORY_FIELDS: [&str; 4] = ["prediction", "confidence", "risk", "thumbnailUrl"];

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.into(),
    })
}

enum Intake {
    Image(Vec<u8>),
    Missing,
    TooLarge,
}

#[derive(Debug, thiserror::Error)]
enum IntakeError {
    #[error(transparent)]
    Decode(#[from] EcgError),
    #[error(transparent)]
    Storage(#[from] UploadServiceError),
}

impl IntakeError {
    fn into_response(self) -> HttpResponse {
        match self {
            IntakeError::Decode(e) => error_response(StatusCode::BAD_REQUEST, e.public_message()),
            IntakeError::Storage(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to analyze ECG image: {}", e),
            ),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: Option<PathBuf>) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)))
        .service(web::resource("/api/analyze").route(web::post().to(analyze_ecg)))
        .service(
            web::resource("/api/history")
                .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                    let response = error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to save history: {}", err),
                    );
                    actix_web::error::InternalError::from_response(err, response).into()
                }))
                .route(web::get().to(get_history))
                .route(web::post().to(save_history)),
        );

    if let Some(dir) = frontend_dir {
        cfg.service(Files::new("/", dir).index_file("index.html"));
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

async fn analyze_ecg(
    req: HttpRequest,
    payload: web::Payload,
    config: web::Data<AppConfig>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, Error> {
    let image_data = match read_image(&req, payload, config.max_upload_bytes).await {
        Intake::Image(data) => data,
        Intake::Missing => {
            return Ok(error_response(StatusCode::BAD_REQUEST, "No valid image provided"));
        }
        Intake::TooLarge => {
            return Ok(error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                UploadServiceError::FileTooLarge.to_string(),
            ));
        }
    };

    if let Err(e) = uploads.validate_image_size(&image_data) {
        warn!("Rejected upload of {} bytes: {}", image_data.len(), e);
        return Ok(error_response(StatusCode::PAYLOAD_TOO_LARGE, e.to_string()));
    }

    let stored = web::block(move || -> Result<StoredUpload, IntakeError> {
        let image = decoder::decode(&image_data)?;
        Ok(uploads.store(&image)?)
    })
    .await;

    let stored = match stored {
        Ok(Ok(stored)) => stored,
        Ok(Err(e)) => {
            error!("Failed to accept ECG upload: {}", e);
            return Ok(e.into_response());
        }
        Err(e) => return Ok(blocking_failure("Failed to analyze ECG image", e)),
    };

    if config.analysis_delay_ms > 0 {
        actix_web::rt::time::sleep(Duration::from_millis(config.analysis_delay_ms)).await;
    }

    let StoredUpload {
        id,
        path,
        image_hash,
        png,
    } = stored;
    let result = match web::block(move || ecg::analyze(&png, &mut rand::rng())).await {
        Ok(result) => result,
        Err(e) => return Ok(blocking_failure("Failed to analyze ECG image", e)),
    };
    match result.error() {
        Some(err) => info!(
            "Analysis of upload {} at {} (sha256 {}) ended with error: {}",
            id,
            path.display(),
            image_hash,
            err
        ),
        None => info!(
            "Analysis of upload {} at {} (sha256 {}) completed",
            id,
            path.display(),
            image_hash
        ),
    }

    Ok(HttpResponse::Ok().json(result))
}

fn blocking_failure(context: &str, e: BlockingError) -> HttpResponse {
    error!("{}: blocking pool error: {}", context, e);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("{}: {}", context, e),
    )
}

/// Malformed bodies are treated as carrying no image.
async fn read_image(req: &HttpRequest, payload: web::Payload, limit: usize) -> Intake {
    let content_type = req.content_type().to_ascii_lowercase();
    let intake = if content_type == "application/json" || content_type.ends_with("+json") {
        // base64 inflates the body by a third
        read_json_image(payload, limit / 3 * 4 + 1024).await
    } else if content_type.starts_with("multipart/form-data") {
        read_multipart_image(Multipart::new(req.headers(), payload), limit).await
    } else {
        Ok(Intake::Missing)
    };

    intake.unwrap_or_else(|e| {
        warn!("Unreadable analyze request body: {}", e);
        Intake::Missing
    })
}

async fn read_json_image(mut payload: web::Payload, limit: usize) -> Result<Intake, Error> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > limit {
            return Ok(Intake::TooLarge);
        }
        body.extend_from_slice(&chunk);
    }

    let request: AnalyzeRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Analyze request without usable image_data: {}", e);
            return Ok(Intake::Missing);
        }
    };

    match STANDARD.decode(request.payload().trim()) {
        Ok(bytes) if !bytes.is_empty() => Ok(Intake::Image(bytes)),
        Ok(_) => Ok(Intake::Missing),
        Err(e) => {
            warn!("image_data is not valid base64: {}", e);
            Ok(Intake::Missing)
        }
    }
}

async fn read_multipart_image(mut payload: Multipart, limit: usize) -> Result<Intake, Error> {
    while let Some(mut field) = payload.try_next().await? {
        let is_image = field.name() == Some("image");
        let mut image_data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if !is_image {
                continue;
            }
            if image_data.len() + chunk.len() > limit {
                return Ok(Intake::TooLarge);
            }
            image_data.extend_from_slice(&chunk);
        }
        if is_image && !image_data.is_empty() {
            return Ok(Intake::Image(image_data));
        }
    }
    Ok(Intake::Missing)
}

async fn get_history(history: web::Data<dyn HistoryRepository>) -> HttpResponse {
    match web::block(move || history.list()).await {
        Ok(Ok(items)) => HttpResponse::Ok().json(items),
        Err(e) => blocking_failure("Failed to load history", e),
        Ok(Err(e)) => {
            error!("Failed to list history: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to load history: {}", e),
            )
        }
    }
}

async fn save_history(
    history: web::Data<dyn HistoryRepository>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let body = body.into_inner();
    if let Some(field) = REQUIRED_HISTORY_FIELDS
        .iter()
        .find(|field| body.get(**field).is_none())
    {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Missing required field: {}", field),
        );
    }

    let request: SaveHistoryRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to save history: {}", e),
            );
        }
    };
    if request.confidence > 100 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Failed to save history: confidence must be between 0 and 100",
        );
    }

    match web::block(move || history.insert(request)).await {
        Ok(Ok(item)) => {
            info!("Saved history item {} ({})", item.id, item.prediction);
            HttpResponse::Ok().json(item)
        }
        Err(e) => blocking_failure("Failed to save history", e),
        Ok(Err(e)) => {
            error!("Failed to save history: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to save history: {}", e),
            )
        }
    }
}
