mod config;
mod ecg;
mod history;
mod routes;
mod storage;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use config::AppConfig;
use history::repository::{HistoryRepository, InMemoryHistory, JsonFileHistory};
use routes::configure_routes;
use std::env;
use std::sync::Arc;
use storage::upload_service::UploadService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let uploads = UploadService::new(&config.upload_dir, config.max_upload_bytes).map_err(|e| {
        log::error!(
            "Failed to prepare upload directory {}: {}",
            config.upload_dir.display(),
            e
        );
        std::io::Error::other(e.to_string())
    })?;

    let history: Arc<dyn HistoryRepository> = match &config.history.path {
        Some(path) => {
            let store = JsonFileHistory::open(path, config.history.capacity).map_err(|e| {
                log::error!("Failed to open history file {}: {}", path.display(), e);
                std::io::Error::other(e.to_string())
            })?;
            Arc::new(store)
        }
        None => {
            log::warn!("No history path configured; saved analyses are kept in memory only");
            Arc::new(InMemoryHistory::new(config.history.capacity))
        }
    };

    let bind_address = config.bind_address();
    let frontend_dir = config.frontend_dir.clone();
    if let Some(dir) = &frontend_dir {
        log::info!("Serving frontend from {}", dir.display());
    }

    log::info!(
        "Starting server on {} (uploads in {}, history capacity {})",
        bind_address,
        uploads.upload_dir().display(),
        config.history.capacity
    );

    let config = web::Data::new(config);
    let uploads = web::Data::new(uploads);
    let history = web::Data::from(history);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(config.clone())
            .app_data(uploads.clone())
            .app_data(history.clone())
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
