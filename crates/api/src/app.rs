use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{middleware, routing::get, Router};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::set_expose_internal_errors;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::partners::Partners;
use crate::routes::{
    affiliates, auth, config as config_routes, dashboard, deals, health, invites, referral, sync,
    tracking, webhooks,
};
use crate::services::auth::build_jwt_config;
use crate::services::SyncLocks;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub partners: Partners,
    pub sync_locks: Arc<SyncLocks>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, partners: Partners) -> anyhow::Result<Self> {
        let jwt = build_jwt_config(&config.jwt).context("invalid JWT key configuration")?;
        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            partners,
            sync_locks: Arc::new(SyncLocks::new()),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    set_expose_internal_errors(config.server.expose_errors);

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        .nest("/auth", auth::router())
        .nest("/affiliates", affiliates::router())
        .nest("/deals", deals::router())
        .nest("/config", config_routes::router())
        .nest("/invites", invites::router())
        .nest("/referral", referral::router())
        .nest("/webhooks", webhooks::router())
        .nest("/sync", sync::router())
        .nest("/tracking", tracking::router())
        .nest("/dashboard", dashboard::router());

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        // bottom layers run first
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
