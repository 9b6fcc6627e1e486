use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

mod admin;

use crate::web::{
    ApiError, AppState,
    models::{OrganizationRow, decode_services},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/support-organizations", get(list_public))
        .route(
            "/admin/organizations",
            get(admin::list_all).post(admin::create_organization),
        )
        .route(
            "/admin/organizations/:id",
            put(admin::update_organization).delete(admin::delete_organization),
        )
}

#[derive(Deserialize)]
pub struct RegionFilter {
    pub region: Option<String>,
}

#[derive(Serialize)]
struct PublicOrganization {
    name: String,
    region: String,
    services: Vec<String>,
    contact: String,
    address: String,
    website: Option<String>,
}

#[derive(Serialize)]
struct PublicOrganizationList {
    organizations: Vec<PublicOrganization>,
}

/// Public directory: active organizations only, optionally filtered by a
/// case-insensitive region substring.
async fn list_public(
    State(state): State<AppState>,
    Query(filter): Query<RegionFilter>,
) -> Result<Json<PublicOrganizationList>, ApiError> {
    let rows = sqlx::query_as::<_, OrganizationRow>(
        "SELECT id, name, region, services, contact, address, website, is_active, created_at
         FROM support_organizations
         WHERE is_active = TRUE
           AND ($1::text IS NULL OR region ILIKE '%' || $1 || '%')
         ORDER BY created_at DESC",
    )
    .bind(filter.region)
    .fetch_all(state.pool_ref())
    .await?;

    let organizations = rows
        .into_iter()
        .map(|row| PublicOrganization {
            name: row.name,
            region: row.region,
            services: decode_services(&row.services),
            contact: row.contact,
            address: row.address,
            website: row.website,
        })
        .collect();

    Ok(Json(PublicOrganizationList { organizations }))
}
