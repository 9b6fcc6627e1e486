use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;

use crate::{
    modules,
    web::{AppState, admin, auth},
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/users", get(admin::list_users))
        .merge(modules::stories::router())
        .merge(modules::organizations::router())
        .merge(modules::advisor::router())
        .with_state(state)
}

#[derive(Serialize)]
struct ServiceBanner {
    message: &'static str,
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    service: &'static str,
}

async fn root() -> impl IntoResponse {
    Json(ServiceBanner {
        message: "Netsanet API - Supporting Women in Ethiopia",
    })
}

async fn health() -> impl IntoResponse {
    Json(HealthStatus {
        status: "healthy",
        service: "Netsanet API",
    })
}
