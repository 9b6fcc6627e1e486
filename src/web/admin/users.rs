use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::web::{AdminUser, ApiError, AppState, models::UserRow};

#[derive(Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct UserList {
    pub users: Vec<UserSummary>,
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<UserList>, ApiError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, is_admin, is_active, created_at FROM users ORDER BY created_at DESC",
    )
    .fetch_all(state.pool_ref())
    .await?;

    let users = rows
        .into_iter()
        .map(|row| UserSummary {
            id: row.id,
            username: row.username,
            email: row.email,
            is_admin: row.is_admin,
            is_active: row.is_active,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(UserList { users }))
}
