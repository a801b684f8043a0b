pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use modules::auth::auth_routes;
use modules::auth::guard::{route_guard, RouteTable};
use modules::auth::interface::{
    AccountStore, Mailer, TwoFactorConfirmationStore, UserStore,
};
use modules::auth::session::SessionService;
use modules::auth::tokens::TokenService;
use services::security::security_headers;

pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub confirmations: Arc<dyn TwoFactorConfirmationStore>,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
    pub sessions: SessionService,
    pub routes: RouteTable,
}

pub async fn create_app(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Gatehouse Auth API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
