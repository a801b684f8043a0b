use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(controller::register))
        .route("/login", post(controller::login))
        .route("/reset", post(controller::reset))
        .route("/new-password", post(controller::new_password))
        .route("/new-verification", post(controller::new_verification))
        .route("/settings", post(controller::settings))
        .route("/me", get(controller::me))
}
