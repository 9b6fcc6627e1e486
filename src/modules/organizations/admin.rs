use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::web::{
    AdminUser, ApiError, AppState,
    models::{OrganizationRow, decode_services, encode_services},
};

#[derive(Serialize)]
pub struct OrganizationDetail {
    id: Uuid,
    name: String,
    region: String,
    services: Vec<String>,
    contact: String,
    address: String,
    website: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OrganizationList {
    organizations: Vec<OrganizationDetail>,
}

/// Every organization regardless of the active flag, newest first.
pub async fn list_all(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<OrganizationList>, ApiError> {
    let rows = sqlx::query_as::<_, OrganizationRow>(
        "SELECT id, name, region, services, contact, address, website, is_active, created_at
         FROM support_organizations ORDER BY created_at DESC",
    )
    .fetch_all(state.pool_ref())
    .await?;

    let organizations = rows
        .into_iter()
        .map(|row| OrganizationDetail {
            id: row.id,
            name: row.name,
            region: row.region,
            services: decode_services(&row.services),
            contact: row.contact,
            address: row.address,
            website: row.website,
            is_active: row.is_active,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(OrganizationList { organizations }))
}

#[derive(Deserialize)]
pub struct OrganizationCreate {
    pub name: String,
    pub region: String,
    pub services: Vec<String>,
    pub contact: String,
    pub address: String,
    pub website: Option<String>,
}

#[derive(Serialize)]
pub struct CreateReceipt {
    message: &'static str,
    organization_id: Uuid,
}

pub async fn create_organization(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<OrganizationCreate>,
) -> Result<Json<CreateReceipt>, ApiError> {
    for (field, value) in [
        ("name", &payload.name),
        ("region", &payload.region),
        ("contact", &payload.contact),
        ("address", &payload.address),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} must not be empty")));
        }
    }

    let organization_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO support_organizations (id, name, region, services, contact, address, website, is_active, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)",
    )
    .bind(organization_id)
    .bind(payload.name.trim())
    .bind(payload.region.trim())
    .bind(encode_services(&payload.services))
    .bind(payload.contact.trim())
    .bind(payload.address.trim())
    .bind(payload.website.as_deref().map(str::trim))
    .bind(admin.id)
    .execute(state.pool_ref())
    .await?;

    Ok(Json(CreateReceipt {
        message: "Organization created successfully",
        organization_id,
    }))
}

/// Partial patch: only supplied fields overwrite stored values. The website
/// can be changed but not cleared, matching the create/update contract.
#[derive(Deserialize)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub region: Option<String>,
    pub services: Option<Vec<String>>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub struct UpdateReceipt {
    message: &'static str,
}

pub async fn update_organization(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<OrganizationUpdate>,
) -> Result<Json<UpdateReceipt>, ApiError> {
    let services = payload.services.as_deref().map(encode_services);

    let result = sqlx::query(
        "UPDATE support_organizations SET
             name = COALESCE($2, name),
             region = COALESCE($3, region),
             services = COALESCE($4, services),
             contact = COALESCE($5, contact),
             address = COALESCE($6, address),
             website = COALESCE($7, website),
             is_active = COALESCE($8, is_active),
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(org_id)
    .bind(payload.name)
    .bind(payload.region)
    .bind(services)
    .bind(payload.contact)
    .bind(payload.address)
    .bind(payload.website)
    .bind(payload.is_active)
    .execute(state.pool_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("organization"));
    }

    Ok(Json(UpdateReceipt {
        message: "Organization updated successfully",
    }))
}

pub async fn delete_organization(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<UpdateReceipt>, ApiError> {
    let result = sqlx::query("DELETE FROM support_organizations WHERE id = $1")
        .bind(org_id)
        .execute(state.pool_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("organization"));
    }

    Ok(Json(UpdateReceipt {
        message: "Organization deleted successfully",
    }))
}
