#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the feed log dashboard.
//!
//! Serves paginated feed run listings and filter options for the dashboard,
//! and a chat endpoint that translates natural-language questions into
//! document store queries via a hosted language model. Optionally serves the
//! built frontend from `STATIC_DIR`.

pub mod config;
mod handlers;
pub mod rate_limit;
pub mod validation;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use feed_log_ai::providers::create_provider_from_env;
use feed_log_ai::translator::Translator;
use feed_log_database::FeedRunStore;
use feed_log_database::db;
use feed_log_database::mongo::MongoFeedRunStore;

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

/// Shared application state.
pub struct AppState {
    /// Feed run collection.
    pub store: Arc<dyn FeedRunStore>,
    /// Question translator, absent when no model provider is configured.
    pub translator: Option<Translator>,
    /// Chat request limiter.
    pub rate_limiter: RateLimiter,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/dashboard")
                    .route("/data", web::get().to(handlers::dashboard_data))
                    .route("/filter-options", web::get().to(handlers::filter_options)),
            )
            .service(
                web::scope("/chat")
                    .route("/query", web::post().to(handlers::chat_query))
                    .route("/examples", web::get().to(handlers::chat_examples)),
            ),
    );
}

/// Starts the feed log API server.
///
/// Loads `.env` if present, reads [`ServerConfig`] from the environment,
/// connects to the document store, selects a model provider, and starts the
/// Actix-Web HTTP server. Exits the process if `MONGO_URI` is missing or the
/// store is unreachable. A missing model provider only disables chat.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    log::info!("Connecting to database...");
    let database = match db::connect(&config.connection).await {
        Ok(database) => database,
        Err(e) => {
            log::error!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };
    let store = MongoFeedRunStore::new(&database, &config.connection.collection);

    let translator = match create_provider_from_env() {
        Ok(provider) => {
            log::info!("Using {} for chat queries", provider.name());
            Some(Translator::new(
                Arc::from(provider),
                config.connection.collection.clone(),
            ))
        }
        Err(e) => {
            log::warn!("Chat queries disabled: {e}");
            None
        }
    };

    let state = web::Data::new(AppState {
        store: Arc::new(store),
        translator,
        rate_limiter: RateLimiter::new(config.rate_limit_max, config.rate_limit_window),
    });

    let static_dir = config.static_dir.filter(|dir| {
        let present = dir.is_dir();
        if !present {
            log::warn!("STATIC_DIR {} is not a directory, not serving UI", dir.display());
        }
        present
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let app = App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure);

        match &static_dir {
            Some(dir) => app.service(Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
