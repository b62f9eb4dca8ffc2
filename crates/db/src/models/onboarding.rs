//! Onboarding wizard state model.

use mailroom_core::onboarding::{OnboardingFields, Persona};
use mailroom_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `onboarding_data` table (one per workspace).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingData {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub website: Option<String>,
    pub preferred_domains: Vec<String>,
    pub domain_requirements: Option<String>,
    pub personas: Json<Vec<Persona>>,
    pub esp_provider: Option<String>,
    pub special_requirements: Option<String>,
    pub step_completed: i32,
    pub is_completed: bool,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<OnboardingData> for OnboardingFields {
    fn from(row: OnboardingData) -> Self {
        OnboardingFields {
            business_name: row.business_name,
            business_type: row.business_type,
            industry: row.industry,
            company_size: row.company_size,
            website: row.website,
            preferred_domains: row.preferred_domains,
            domain_requirements: row.domain_requirements,
            personas: row.personas.0,
            esp_provider: row.esp_provider,
            special_requirements: row.special_requirements,
            step_completed: row.step_completed,
            is_completed: row.is_completed,
            completed_at: row.completed_at,
        }
    }
}
