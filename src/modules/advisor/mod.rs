use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod admin;

use crate::web::{
    ApiError, AppState, CurrentUser,
    models::{AppealLetterRow, LegalAdviceRow},
};

/// The model's free text is stored verbatim; the service does not classify
/// it further, so every stored request carries this fixed tag.
pub const CASE_TYPE_AI: &str = "classified_by_ai";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/legal-advice", post(legal_advice))
        .route("/api/generate-appeal", post(generate_appeal))
        .route("/api/my/legal-advice", get(my_legal_advice))
        .route("/api/my/appeal-letters", get(my_appeal_letters))
        .route("/admin/legal-requests", get(admin::list_legal_requests))
        .route("/admin/appeal-letters", get(admin::list_appeal_letters))
}

fn build_advice_prompt(description: &str, region: Option<&str>) -> String {
    format!(
        "You are a legal advisor specializing in Ethiopian law and women's rights.\n\
         Based on the Ethiopian Constitution and relevant laws, provide clear, actionable guidance for this case.\n\
         \n\
         Case Description: {description}\n\
         Region: {region}\n\
         \n\
         Provide structured advice in the following format:\n\
         \n\
         CASE CLASSIFICATION:\n\
         [Classify the case type]\n\
         \n\
         YOUR RIGHTS:\n\
         [List relevant rights under Ethiopian Constitution and laws]\n\
         \n\
         RECOMMENDED ACTIONS:\n\
         [Step-by-step actions the person can take]\n\
         \n\
         LEGAL CONSIDERATIONS:\n\
         [Important legal points to consider]\n\
         \n\
         EMERGENCY CONTACTS:\n\
         [Relevant emergency contacts if needed]\n\
         \n\
         Be supportive, clear, and provide practical advice. Focus on Ethiopian legal context. \
         Do not include any introductory text or explanations outside of the structured format above.",
        description = description,
        region = region.unwrap_or("Not specified"),
    )
}

fn build_appeal_prompt(form: &AppealForm) -> String {
    format!(
        "Generate ONLY a formal appeal letter in both Amharic and English for the following case. \
         Do not include any explanations, introductions, or additional text - just the letter content.\n\
         \n\
         Case Details:\n\
         Name: {name}\n\
         Case Type: {case_type}\n\
         Incident Date: {incident_date}\n\
         Location: {location}\n\
         Description: {description}\n\
         Evidence: {evidence}\n\
         Contact Information: {contact_info}\n\
         \n\
         Requirements:\n\
         - Write a formal, professional appeal letter\n\
         - Include relevant Ethiopian legal references\n\
         - Clearly state the complaint and requested actions\n\
         - Follow proper legal letter format\n\
         - Provide BOTH English and Amharic versions\n\
         \n\
         Format your response EXACTLY as follows (no other text):\n\
         \n\
         ENGLISH VERSION:\n\
         [Complete English appeal letter with proper formatting]\n\
         \n\
         AMHARIC VERSION:\n\
         [Complete Amharic appeal letter with proper formatting]",
        name = form.name,
        case_type = form.case_type,
        incident_date = form.incident_date,
        location = form.location,
        description = form.description,
        evidence = form.evidence.as_deref().unwrap_or("Not provided"),
        contact_info = form.contact_info,
    )
}

/// Case-insensitive search for an ASCII needle. Match offsets land on ASCII
/// bytes, so they are always valid char boundaries.
fn find_ci(text: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack = text.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < from + needle.len() {
        return None;
    }

    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

fn clean_section(raw: &str) -> String {
    raw.trim_start_matches(':').trim().to_string()
}

/// Best-effort split of a generated letter into its English and Amharic
/// sections. When no headers are found the whole response becomes the
/// English section and the Amharic section is left empty; a hard failure
/// here would lose the user's generation result.
fn split_appeal_sections(response: &str) -> (String, String) {
    const ENGLISH_HEADER: &str = "english version";
    const AMHARIC_HEADER: &str = "amharic version";

    let english = find_ci(response, ENGLISH_HEADER, 0).map(|pos| {
        let body_start = pos + ENGLISH_HEADER.len();
        let end = find_ci(response, AMHARIC_HEADER, body_start).unwrap_or(response.len());
        clean_section(&response[body_start..end])
    });

    let amharic = find_ci(response, AMHARIC_HEADER, 0).map(|pos| {
        let body_start = pos + AMHARIC_HEADER.len();
        let end = find_ci(response, ENGLISH_HEADER, body_start).unwrap_or(response.len());
        clean_section(&response[body_start..end])
    });

    (
        english.unwrap_or_else(|| response.trim().to_string()),
        amharic.unwrap_or_default(),
    )
}

#[derive(Deserialize)]
pub struct CaseDescription {
    pub description: String,
    pub region: Option<String>,
}

#[derive(Serialize)]
struct AdviceResponse {
    advice: String,
    case_type: &'static str,
    timestamp: DateTime<Utc>,
}

async fn legal_advice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CaseDescription>,
) -> Result<Json<AdviceResponse>, ApiError> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::Validation("description must not be empty".into()));
    }

    let region = payload
        .region
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let llm = state.llm_client();
    if !llm.is_configured() {
        return Err(ApiError::UpstreamUnavailable(
            "AI service not available; set GEMINI_API_KEY to enable generation",
        ));
    }

    let prompt = build_advice_prompt(description, region);
    let advice = llm.generate(&prompt).await.map_err(ApiError::Upstream)?;

    // The record is written only after a successful generation so a failed
    // call never leaves a partial row behind.
    sqlx::query(
        "INSERT INTO legal_advice_requests (id, description, region, advice, case_type, user_id)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(description)
    .bind(region)
    .bind(&advice)
    .bind(CASE_TYPE_AI)
    .bind(user.id)
    .execute(state.pool_ref())
    .await?;

    Ok(Json(AdviceResponse {
        advice,
        case_type: CASE_TYPE_AI,
        timestamp: Utc::now(),
    }))
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AppealForm {
    pub name: String,
    pub case_type: String,
    pub incident_date: String,
    pub location: String,
    pub description: String,
    pub evidence: Option<String>,
    pub contact_info: String,
}

#[derive(Serialize)]
struct AppealResponse {
    appeal_letter: String,
    generated_at: DateTime<Utc>,
    case_details: AppealForm,
}

async fn generate_appeal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<AppealForm>,
) -> Result<Json<AppealResponse>, ApiError> {
    for (field, value) in [
        ("name", &form.name),
        ("case_type", &form.case_type),
        ("incident_date", &form.incident_date),
        ("location", &form.location),
        ("description", &form.description),
        ("contact_info", &form.contact_info),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} must not be empty")));
        }
    }

    let llm = state.llm_client();
    if !llm.is_configured() {
        return Err(ApiError::UpstreamUnavailable(
            "AI service not available; set GEMINI_API_KEY to enable generation",
        ));
    }

    let prompt = build_appeal_prompt(&form);
    let letter = llm.generate(&prompt).await.map_err(ApiError::Upstream)?;

    let (english_letter, amharic_letter) = split_appeal_sections(&letter);

    sqlx::query(
        "INSERT INTO appeal_letters (id, name, case_type, incident_date, location, description, evidence, contact_info, english_letter, amharic_letter, user_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(Uuid::new_v4())
    .bind(&form.name)
    .bind(&form.case_type)
    .bind(&form.incident_date)
    .bind(&form.location)
    .bind(&form.description)
    .bind(form.evidence.as_deref())
    .bind(&form.contact_info)
    .bind(&english_letter)
    .bind(&amharic_letter)
    .bind(user.id)
    .execute(state.pool_ref())
    .await?;

    Ok(Json(AppealResponse {
        appeal_letter: letter,
        generated_at: Utc::now(),
        case_details: form,
    }))
}

#[derive(Serialize)]
struct OwnAdvice {
    id: Uuid,
    description: String,
    region: Option<String>,
    advice: String,
    case_type: String,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct OwnAdviceList {
    legal_advice: Vec<OwnAdvice>,
}

async fn my_legal_advice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<OwnAdviceList>, ApiError> {
    let rows = sqlx::query_as::<_, LegalAdviceRow>(
        "SELECT id, description, region, advice, case_type, user_id, created_at
         FROM legal_advice_requests WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(state.pool_ref())
    .await?;

    let legal_advice = rows
        .into_iter()
        .map(|row| OwnAdvice {
            id: row.id,
            description: row.description,
            region: row.region,
            advice: row.advice,
            case_type: row.case_type,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(OwnAdviceList { legal_advice }))
}

#[derive(Serialize)]
struct OwnAppealLetter {
    id: Uuid,
    name: String,
    case_type: String,
    location: String,
    english_letter: String,
    amharic_letter: String,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct OwnAppealLetterList {
    appeal_letters: Vec<OwnAppealLetter>,
}

async fn my_appeal_letters(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<OwnAppealLetterList>, ApiError> {
    let rows = sqlx::query_as::<_, AppealLetterRow>(
        "SELECT id, name, case_type, location, english_letter, amharic_letter, user_id, created_at
         FROM appeal_letters WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(state.pool_ref())
    .await?;

    let appeal_letters = rows
        .into_iter()
        .map(|row| OwnAppealLetter {
            id: row.id,
            name: row.name,
            case_type: row.case_type,
            location: row.location,
            english_letter: row.english_letter,
            amharic_letter: row.amharic_letter,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(OwnAppealLetterList { appeal_letters }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advice_prompt_embeds_description_and_region() {
        let prompt = build_advice_prompt("I was dismissed for being pregnant", Some("Oromia"));
        assert!(prompt.contains("Case Description: I was dismissed for being pregnant"));
        assert!(prompt.contains("Region: Oromia"));
        assert!(prompt.contains("CASE CLASSIFICATION:"));
    }

    #[test]
    fn advice_prompt_uses_placeholder_without_region() {
        let prompt = build_advice_prompt("land dispute", None);
        assert!(prompt.contains("Region: Not specified"));
    }

    #[test]
    fn appeal_prompt_embeds_form_fields_and_evidence_placeholder() {
        let form = AppealForm {
            name: "Alem T.".into(),
            case_type: "workplace discrimination".into(),
            incident_date: "2024-05-01".into(),
            location: "Addis Ababa".into(),
            description: "denied promotion".into(),
            evidence: None,
            contact_info: "alem@example.com".into(),
        };

        let prompt = build_appeal_prompt(&form);
        assert!(prompt.contains("Name: Alem T."));
        assert!(prompt.contains("Evidence: Not provided"));
        assert!(prompt.contains("ENGLISH VERSION:"));
        assert!(prompt.contains("AMHARIC VERSION:"));
    }

    #[test]
    fn splits_both_sections_when_headers_present() {
        let response = "ENGLISH VERSION:\nDear Sir,\nI appeal.\n\nAMHARIC VERSION:\nክቡር አቶ,\nይግባኝ እጠይቃለሁ።";
        let (english, amharic) = split_appeal_sections(response);
        assert_eq!(english, "Dear Sir,\nI appeal.");
        assert_eq!(amharic, "ክቡር አቶ,\nይግባኝ እጠይቃለሁ።");
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let response = "English Version: hello there. Amharic Version: ሰላም";
        let (english, amharic) = split_appeal_sections(response);
        assert_eq!(english, "hello there.");
        assert_eq!(amharic, "ሰላም");
    }

    #[test]
    fn missing_headers_fall_back_to_full_english() {
        let response = "  Just one unstructured letter body.  ";
        let (english, amharic) = split_appeal_sections(response);
        assert_eq!(english, "Just one unstructured letter body.");
        assert_eq!(amharic, "");
    }

    #[test]
    fn amharic_only_header_keeps_full_text_as_english() {
        let response = "AMHARIC VERSION:\nይግባኝ";
        let (english, amharic) = split_appeal_sections(response);
        assert_eq!(english, response.trim());
        assert_eq!(amharic, "ይግባኝ");
    }

    #[test]
    fn headers_without_colon_still_split() {
        let response = "english version\nbody A\namharic version\nbody B";
        let (english, amharic) = split_appeal_sections(response);
        assert_eq!(english, "body A");
        assert_eq!(amharic, "body B");
    }

    #[test]
    fn find_ci_respects_start_offset() {
        let text = "english version ... amharic version ... english version";
        let first = find_ci(text, "english version", 0).expect("first");
        assert_eq!(first, 0);
        let second = find_ci(text, "english version", 1).expect("second");
        assert!(second > first);
        assert!(find_ci(text, "french version", 0).is_none());
    }
}
