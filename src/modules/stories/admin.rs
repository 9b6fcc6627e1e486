use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::web::{AdminUser, ApiError, AppState, models::StoryRow};

#[derive(Serialize)]
pub struct PendingStory {
    id: Uuid,
    title: String,
    content: String,
    category: String,
    region: Option<String>,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct PendingStoryList {
    pending_stories: Vec<PendingStory>,
}

/// Moderation queue: every story that has not been approved, newest first.
pub async fn pending_stories(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<PendingStoryList>, ApiError> {
    let rows = sqlx::query_as::<_, StoryRow>(
        "SELECT id, title, content, category, region, is_approved, user_id, created_at
         FROM stories WHERE is_approved = FALSE ORDER BY created_at DESC",
    )
    .fetch_all(state.pool_ref())
    .await?;

    let pending_stories = rows
        .into_iter()
        .map(|row| PendingStory {
            id: row.id,
            title: row.title,
            content: row.content,
            category: row.category,
            region: row.region,
            user_id: row.user_id,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(PendingStoryList { pending_stories }))
}

#[derive(Deserialize)]
pub struct ModerationDecision {
    pub story_id: Uuid,
    pub approved: bool,
}

#[derive(Serialize)]
pub struct ModerationReceipt {
    message: String,
    story_id: Uuid,
}

async fn set_approval(state: &AppState, story_id: Uuid, approved: bool) -> Result<(), ApiError> {
    let result = sqlx::query(
        "UPDATE stories SET is_approved = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(story_id)
    .bind(approved)
    .execute(state.pool_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("story"));
    }

    Ok(())
}

/// Approve or reject a story. A rejected story returns to the unapproved
/// pool; the record keeps only the boolean flag.
pub async fn moderate_story(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(decision): Json<ModerationDecision>,
) -> Result<Json<ModerationReceipt>, ApiError> {
    set_approval(&state, decision.story_id, decision.approved).await?;

    let verdict = if decision.approved { "approved" } else { "rejected" };
    Ok(Json(ModerationReceipt {
        message: format!("Story {verdict} successfully"),
        story_id: decision.story_id,
    }))
}

pub async fn approve_story(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(story_id): Path<Uuid>,
) -> Result<Json<ModerationReceipt>, ApiError> {
    set_approval(&state, story_id, true).await?;

    Ok(Json(ModerationReceipt {
        message: "Story approved successfully".to_string(),
        story_id,
    }))
}

#[derive(Serialize)]
pub struct DeletionReceipt {
    message: &'static str,
}

pub async fn delete_story(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(story_id): Path<Uuid>,
) -> Result<Json<DeletionReceipt>, ApiError> {
    let result = sqlx::query("DELETE FROM stories WHERE id = $1")
        .bind(story_id)
        .execute(state.pool_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("story"));
    }

    Ok(Json(DeletionReceipt {
        message: "Story deleted successfully",
    }))
}
