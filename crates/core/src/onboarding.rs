//! Post-purchase onboarding wizard: answer types and the save planner.
//!
//! [`plan_save`] is the single state-transition function for the wizard.
//! Given the current onboarding row (if any), the linked order's status and
//! the incoming answers, it returns the complete next row plus the order
//! write that must be committed in the same transaction.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::order::{OrderStatus, StatusChange};
use crate::types::Timestamp;

/// Maximum number of personas collected by the wizard.
pub const MAX_PERSONAS: usize = 50;

/// A sender persona the customer wants inboxes created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Answers submitted by one step of the wizard. Absent fields are left
/// untouched; present fields replace the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingAnswers {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub website: Option<String>,
    pub preferred_domains: Option<Vec<String>>,
    pub domain_requirements: Option<String>,
    pub personas: Option<Vec<Persona>>,
    pub esp_provider: Option<String>,
    pub special_requirements: Option<String>,
    pub step_completed: Option<i32>,
    pub is_completed: Option<bool>,
}

/// The mutable columns of an onboarding row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingFields {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub website: Option<String>,
    pub preferred_domains: Vec<String>,
    pub domain_requirements: Option<String>,
    pub personas: Vec<Persona>,
    pub esp_provider: Option<String>,
    pub special_requirements: Option<String>,
    pub step_completed: i32,
    pub is_completed: bool,
    pub completed_at: Option<Timestamp>,
}

impl OnboardingFields {
    /// Start a new wizard run for another order of the same workspace.
    /// Answers carry over as a prefill; progress and completion reset.
    pub fn reopened(self) -> Self {
        Self {
            step_completed: 0,
            is_completed: false,
            completed_at: None,
            ..self
        }
    }
}

/// Writes produced by one wizard save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingPlan {
    /// The full next state of the onboarding row.
    pub fields: OnboardingFields,
    /// `true` when no row exists yet and it must be inserted.
    pub insert: bool,
    /// Order status write, present only when this save completes onboarding.
    pub order_change: Option<StatusChange>,
}

/// Reject answers that can never be stored. Call before [`plan_save`].
pub fn validate_answers(answers: &OnboardingAnswers) -> Result<(), CoreError> {
    if let Some(step) = answers.step_completed {
        if step < 0 {
            return Err(CoreError::Validation(
                "stepCompleted must not be negative".into(),
            ));
        }
    }
    if let Some(personas) = &answers.personas {
        if personas.len() > MAX_PERSONAS {
            return Err(CoreError::Validation(format!(
                "At most {MAX_PERSONAS} personas are allowed"
            )));
        }
        if personas
            .iter()
            .any(|p| p.first_name.trim().is_empty() || p.last_name.trim().is_empty())
        {
            return Err(CoreError::Validation(
                "Every persona needs a firstName and lastName".into(),
            ));
        }
    }
    Ok(())
}

/// Compute the next onboarding state for a save.
///
/// - First save: missing lists default to empty, the step counter to 0 and
///   the completion flag to `false`.
/// - Later saves: every field present in `answers` overwrites the stored
///   value; absent fields keep theirs.
/// - Completion is one-way. The first save with `isCompleted: true` stamps
///   `completed_at` and, when the order can still move to COMPLETED, emits
///   the order write with a fulfillment timestamp. A later
///   `isCompleted: false` does not reopen the wizard, and a repeated
///   `isCompleted: true` does not touch the order again, so an
///   administrator who moves a completed order back to PENDING keeps it
///   there. A new order in the workspace starts over from
///   [`OnboardingFields::reopened`].
pub fn plan_save(
    current: Option<OnboardingFields>,
    order_status: OrderStatus,
    answers: OnboardingAnswers,
    now: Timestamp,
) -> OnboardingPlan {
    let insert = current.is_none();
    let mut next = current.unwrap_or_default();
    let was_completed = next.is_completed;

    macro_rules! overwrite {
        ($($field:ident),* $(,)?) => {
            $(if let Some(v) = answers.$field { next.$field = Some(v); })*
        };
    }
    overwrite!(
        business_name,
        business_type,
        industry,
        company_size,
        website,
        domain_requirements,
        esp_provider,
        special_requirements,
    );

    if let Some(domains) = answers.preferred_domains {
        next.preferred_domains = domains;
    }
    if let Some(personas) = answers.personas {
        next.personas = personas;
    }
    if let Some(step) = answers.step_completed {
        next.step_completed = step;
    }

    let completing = answers.is_completed == Some(true) && !was_completed;
    let mut order_change = None;
    if completing {
        next.is_completed = true;
        next.completed_at = Some(now);
        if order_status.can_transition_to(OrderStatus::Completed) {
            order_change = Some(StatusChange {
                status: OrderStatus::Completed,
                fulfilled_at: Some(now),
            });
        }
    }

    OnboardingPlan {
        fields: next,
        insert,
        order_change,
    }
}
