use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod admin;

use crate::web::{ApiError, AppState, CurrentUser, models::StoryRow};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/case-stories", get(list_public))
        .route("/api/submit-story", post(submit_story))
        .route("/api/my/stories", get(my_stories))
        .route("/api/approve-story/:id", post(admin::approve_story))
        .route("/admin/stories/pending", get(admin::pending_stories))
        .route("/admin/stories/approve", post(admin::moderate_story))
        .route("/admin/stories/:id", delete(admin::delete_story))
}

#[derive(Deserialize)]
pub struct StoryFilter {
    pub category: Option<String>,
    pub region: Option<String>,
}

#[derive(Serialize)]
struct PublicStory {
    id: Uuid,
    title: String,
    content: String,
    category: String,
    region: Option<String>,
    is_approved: bool,
}

#[derive(Serialize)]
struct PublicStoryList {
    stories: Vec<PublicStory>,
}

/// Public story wall. Only approved stories are ever visible here; category
/// is an exact match, region a case-insensitive substring match.
async fn list_public(
    State(state): State<AppState>,
    Query(filter): Query<StoryFilter>,
) -> Result<Json<PublicStoryList>, ApiError> {
    let rows = sqlx::query_as::<_, StoryRow>(
        "SELECT id, title, content, category, region, is_approved, user_id, created_at
         FROM stories
         WHERE is_approved = TRUE
           AND ($1::text IS NULL OR category = $1)
           AND ($2::text IS NULL OR region ILIKE '%' || $2 || '%')
         ORDER BY created_at DESC",
    )
    .bind(filter.category)
    .bind(filter.region)
    .fetch_all(state.pool_ref())
    .await?;

    let stories = rows
        .into_iter()
        .map(|row| PublicStory {
            id: row.id,
            title: row.title,
            content: row.content,
            category: row.category,
            region: row.region,
            is_approved: row.is_approved,
        })
        .collect();

    Ok(Json(PublicStoryList { stories }))
}

#[derive(Deserialize)]
pub struct StorySubmission {
    pub title: String,
    pub content: String,
    pub category: String,
    pub region: Option<String>,
}

#[derive(Serialize)]
struct SubmissionReceipt {
    message: &'static str,
    story_id: Uuid,
    submitted_at: DateTime<Utc>,
}

async fn submit_story(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<StorySubmission>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title must not be empty".into()));
    }

    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("content must not be empty".into()));
    }

    let category = payload.category.trim();
    if category.is_empty() {
        return Err(ApiError::Validation("category must not be empty".into()));
    }

    let region = payload
        .region
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let story_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO stories (id, title, content, category, region, is_approved, user_id)
         VALUES ($1, $2, $3, $4, $5, FALSE, $6)",
    )
    .bind(story_id)
    .bind(title)
    .bind(content)
    .bind(category)
    .bind(region)
    .bind(user.id)
    .execute(state.pool_ref())
    .await?;

    Ok(Json(SubmissionReceipt {
        message: "Story submitted successfully and is pending approval",
        story_id,
        submitted_at: Utc::now(),
    }))
}

#[derive(Serialize)]
struct OwnStory {
    id: Uuid,
    title: String,
    content: String,
    category: String,
    region: Option<String>,
    is_approved: bool,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct OwnStoryList {
    stories: Vec<OwnStory>,
}

/// The caller's own stories, approved or not.
async fn my_stories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<OwnStoryList>, ApiError> {
    let rows = sqlx::query_as::<_, StoryRow>(
        "SELECT id, title, content, category, region, is_approved, user_id, created_at
         FROM stories WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(state.pool_ref())
    .await?;

    let stories = rows
        .into_iter()
        .map(|row| OwnStory {
            id: row.id,
            title: row.title,
            content: row.content,
            category: row.category,
            region: row.region,
            is_approved: row.is_approved,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(OwnStoryList { stories }))
}
