use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, FromRow)]
pub struct StoryRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub region: Option<String>,
    pub is_approved: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, FromRow)]
pub struct LegalAdviceRow {
    pub id: Uuid,
    pub description: String,
    pub region: Option<String>,
    pub advice: String,
    pub case_type: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, FromRow)]
pub struct AppealLetterRow {
    pub id: Uuid,
    pub name: String,
    pub case_type: String,
    pub location: String,
    pub english_letter: String,
    pub amharic_letter: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, FromRow)]
pub struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub region: String,
    pub services: String,
    pub contact: String,
    pub address: String,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// User shape returned by the API; never includes the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
}

/// The `services` column is a JSON-encoded array of free-text tags so the
/// store needs no native array type. Encoding and decoding must round-trip
/// exactly.
pub fn encode_services(services: &[String]) -> String {
    serde_json::to_string(services).unwrap_or_else(|_| String::from("[]"))
}

pub fn decode_services(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn services_round_trip_preserves_entries() {
        let services = vec![
            "Legal Aid".to_string(),
            "Counseling & \"Shelter\"".to_string(),
            "ነጻ የሕግ ድጋፍ".to_string(),
        ];

        let encoded = encode_services(&services);
        assert_eq!(decode_services(&encoded), services);
    }

    #[test]
    fn empty_services_round_trip() {
        let encoded = encode_services(&[]);
        assert_eq!(encoded, "[]");
        assert!(decode_services(&encoded).is_empty());
    }

    #[test]
    fn malformed_services_blob_decodes_to_empty() {
        assert!(decode_services("not json").is_empty());
    }
}
