use axum::{Json, extract::State};
use serde::Serialize;
use sqlx::PgPool;

use crate::web::{AdminUser, ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_stories: i64,
    pub approved_stories: i64,
    pub pending_stories: i64,
    pub legal_requests: i64,
    pub appeal_letters: i64,
    pub active_organizations: i64,
    pub total_users: i64,
    pub admin_users: i64,
}

async fn count(pool: &PgPool, query: &str) -> Result<i64, ApiError> {
    Ok(sqlx::query_scalar::<_, i64>(query).fetch_one(pool).await?)
}

/// Dashboard counters. Each count is an independent query; the result is a
/// momentary snapshot, not a transactionally consistent view.
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let pool = state.pool_ref();

    Ok(Json(StatsResponse {
        total_stories: count(pool, "SELECT COUNT(*) FROM stories").await?,
        approved_stories: count(pool, "SELECT COUNT(*) FROM stories WHERE is_approved = TRUE")
            .await?,
        pending_stories: count(pool, "SELECT COUNT(*) FROM stories WHERE is_approved = FALSE")
            .await?,
        legal_requests: count(pool, "SELECT COUNT(*) FROM legal_advice_requests").await?,
        appeal_letters: count(pool, "SELECT COUNT(*) FROM appeal_letters").await?,
        active_organizations: count(
            pool,
            "SELECT COUNT(*) FROM support_organizations WHERE is_active = TRUE",
        )
        .await?,
        total_users: count(pool, "SELECT COUNT(*) FROM users").await?,
        admin_users: count(pool, "SELECT COUNT(*) FROM users WHERE is_admin = TRUE").await?,
    }))
}
