//! Farmers API Library
//!
//! CRUD over a single `farmers` table with declarative validation, served over axum.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod repositories;
pub mod seed;
pub mod services;
pub mod tracing;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, response::Json, Router};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use utoipa::ToSchema;

use crate::repositories::SeaOrmFarmerRepository;
use crate::services::FarmerService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub farmers: Arc<FarmerService>,
}

impl AppState {
    /// Wires the sea-orm backed services over `db`
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let repository = Arc::new(SeaOrmFarmerRepository::new(db.clone()));
        Self {
            db,
            config,
            farmers: Arc::new(FarmerService::new(repository)),
        }
    }

    pub fn farmer_service(&self) -> Arc<FarmerService> {
        self.farmers.clone()
    }
}

// Common response wrappers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Success envelope for operations that return no resource
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "success": true, "message": "Farmer deleted successfully" }))]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// CORS policy derived from configuration.
///
/// Explicit origins win; otherwise development (or the explicit opt-in) is permissive and
/// anything else gets a policy that allows no cross-origin requests.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(cfg.cors_allow_credentials)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// Full application router: farmers resource, health, OpenAPI docs and the middleware stack
pub fn app_router(state: AppState) -> Router {
    let cfg = state.config.clone();
    let db = state.db.clone();

    Router::new()
        .nest(&cfg.farmers_path(), handlers::farmers::farmer_routes())
        .with_state(state)
        .nest("/health", health::health_routes(db))
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(cfg.max_body_size))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(cors_layer(&cfg))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}
