use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use domain::services::{LoanService, StockService};
use persistence::repositories::{
    ItemRepository, LoanRepository, LocationRepository, NotificationRepository, UserRepository,
};
use persistence::PgInventoryStore;
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id,
};
use crate::routes::{admin_users, auth, health, items, loans, locations, me, notifications, stock};

/// Failure to assemble the application state.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid JWT configuration: {0}")]
    Jwt(#[from] JwtError),

    #[error("Invalid stock thresholds: {0}")]
    StockPolicy(String),
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub items: ItemRepository,
    pub locations: LocationRepository,
    pub users: UserRepository,
    pub loans: LoanRepository,
    pub notifications: NotificationRepository,
    pub loan_service: Arc<LoanService<PgInventoryStore>>,
    pub stock_service: Arc<StockService<PgInventoryStore>>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self, StartupError> {
        let jwt = JwtConfig::with_leeway(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;
        let policy = config.stock_policy().map_err(StartupError::StockPolicy)?;
        let store = PgInventoryStore::new(pool.clone());

        Ok(Self {
            items: ItemRepository::new(pool.clone()),
            locations: LocationRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            loans: LoanRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            loan_service: Arc::new(LoanService::new(store.clone(), policy)),
            stock_service: Arc::new(StockService::new(store, policy)),
            jwt: Arc::new(jwt),
            config: Arc::new(config),
            pool,
        })
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, StartupError> {
    let state = AppState::new(config, pool)?;
    Ok(build_router(state))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login));

    // Role checks happen in the AdminAuth / SuperAdminAuth extractors.
    let api_routes = Router::new()
        .route("/api/v1/me", get(me::get_me))
        .route("/api/v1/items", get(items::list_items).post(items::create_item))
        .route("/api/v1/items/autocomplete", get(items::autocomplete))
        .route("/api/v1/items/count-today", get(items::count_today))
        .route("/api/v1/items/batch", post(items::batch_create_items))
        .route("/api/v1/items/temporary", delete(items::purge_temporary_items))
        .route(
            "/api/v1/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/api/v1/items/:id/stock", put(stock::set_stock))
        .route("/api/v1/items/:id/stock/adjust", post(stock::adjust_stock))
        .route("/api/v1/stock/report", get(stock::stock_report))
        .route(
            "/api/v1/locations/zones",
            get(locations::list_zones).post(locations::create_zone),
        )
        .route("/api/v1/locations/zones/:id", delete(locations::delete_zone))
        .route(
            "/api/v1/locations/furniture",
            get(locations::list_furniture).post(locations::create_furniture),
        )
        .route(
            "/api/v1/locations/furniture/:id",
            delete(locations::delete_furniture),
        )
        .route(
            "/api/v1/locations/drawers",
            get(locations::list_drawers).post(locations::create_drawer),
        )
        .route(
            "/api/v1/locations/drawers/:id",
            delete(locations::delete_drawer),
        )
        .route("/api/v1/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/api/v1/loans/:id/return", post(loans::return_loan))
        .route("/api/v1/notifications", get(notifications::list_notifications))
        .route(
            "/api/v1/notifications/:id/dismiss",
            post(notifications::dismiss_notification),
        )
        .route("/api/v1/admin/users", get(admin_users::list_users))
        .route("/api/v1/admin/users/:id", delete(admin_users::delete_user))
        .route(
            "/api/v1/admin/users/:id/role",
            put(admin_users::update_role),
        );

    // Global middleware (order matters: bottom layers run first)
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}
