use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::web::{
    AdminUser, ApiError, AppState,
    models::{AppealLetterRow, LegalAdviceRow},
};

#[derive(Serialize)]
pub struct LegalRequestSummary {
    id: Uuid,
    description: String,
    region: Option<String>,
    case_type: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct LegalRequestList {
    legal_requests: Vec<LegalRequestSummary>,
}

pub async fn list_legal_requests(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<LegalRequestList>, ApiError> {
    let rows = sqlx::query_as::<_, LegalAdviceRow>(
        "SELECT id, description, region, advice, case_type, user_id, created_at
         FROM legal_advice_requests ORDER BY created_at DESC",
    )
    .fetch_all(state.pool_ref())
    .await?;

    let legal_requests = rows
        .into_iter()
        .map(|row| LegalRequestSummary {
            id: row.id,
            description: row.description,
            region: row.region,
            case_type: row.case_type,
            user_id: row.user_id,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(LegalRequestList { legal_requests }))
}

#[derive(Serialize)]
pub struct AppealLetterSummary {
    id: Uuid,
    name: String,
    case_type: String,
    location: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AppealLetterList {
    appeal_letters: Vec<AppealLetterSummary>,
}

/// Summary view only; the letter bodies stay out of the admin listing.
pub async fn list_appeal_letters(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<AppealLetterList>, ApiError> {
    let rows = sqlx::query_as::<_, AppealLetterRow>(
        "SELECT id, name, case_type, location, english_letter, amharic_letter, user_id, created_at
         FROM appeal_letters ORDER BY created_at DESC",
    )
    .fetch_all(state.pool_ref())
    .await?;

    let appeal_letters = rows
        .into_iter()
        .map(|row| AppealLetterSummary {
            id: row.id,
            name: row.name,
            case_type: row.case_type,
            location: row.location,
            user_id: row.user_id,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(AppealLetterList { appeal_letters }))
}
