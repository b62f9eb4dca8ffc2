//! Repository for the `onboarding_data` table.

use mailroom_core::onboarding::{plan_save, OnboardingAnswers, OnboardingFields};
use mailroom_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::models::onboarding::OnboardingData;
use crate::models::order::Order;
use crate::repositories::OrderRepo;

/// Column list for `onboarding_data` queries.
const COLUMNS: &str = "id, workspace_id, order_id, business_name, business_type, industry, \
                       company_size, website, preferred_domains, domain_requirements, personas, \
                       esp_provider, special_requirements, step_completed, is_completed, \
                       completed_at, created_at, updated_at";

/// Rows written by one onboarding save.
#[derive(Debug, Clone)]
pub struct OnboardingSaveOutcome {
    pub onboarding: OnboardingData,
    /// The linked order after the save (updated when onboarding completed).
    pub order: Order,
}

/// Provides onboarding wizard persistence.
pub struct OnboardingRepo;

impl OnboardingRepo {
    /// Find the onboarding row of a workspace.
    pub async fn find_by_workspace<'e, E>(
        executor: E,
        workspace_id: DbId,
    ) -> Result<Option<OnboardingData>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM onboarding_data WHERE workspace_id = $1");
        sqlx::query_as::<_, OnboardingData>(&query)
            .bind(workspace_id)
            .fetch_optional(executor)
            .await
    }

    /// Save one wizard step for the order created by `session_id`.
    ///
    /// Returns `None` (and writes nothing) when no order exists for the
    /// session. The order and onboarding rows are locked for the duration
    /// of the transaction so concurrent saves for the same session apply one
    /// after the other; the onboarding write and any resulting order status
    /// change commit together.
    pub async fn save_for_session(
        pool: &PgPool,
        session_id: &str,
        answers: OnboardingAnswers,
        now: Timestamp,
    ) -> Result<Option<OnboardingSaveOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(order) = OrderRepo::lock_by_session_id(&mut *tx, session_id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let lock = format!("SELECT {COLUMNS} FROM onboarding_data WHERE workspace_id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, OnboardingData>(&lock)
            .bind(order.workspace_id)
            .fetch_optional(&mut *tx)
            .await?;

        // The row is per workspace; a save for a newer order of the same
        // workspace starts a fresh run against that order.
        let current = current.map(|row| {
            let same_order = row.order_id == order.id;
            let fields = OnboardingFields::from(row);
            if same_order {
                fields
            } else {
                fields.reopened()
            }
        });

        let plan = plan_save(
            current,
            order.status,
            answers,
            now,
        );
        let fields = plan.fields;

        let query = format!(
            "INSERT INTO onboarding_data (workspace_id, order_id, business_name, business_type, \
                 industry, company_size, website, preferred_domains, domain_requirements, \
                 personas, esp_provider, special_requirements, step_completed, is_completed, \
                 completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (workspace_id) DO UPDATE SET \
                 order_id = EXCLUDED.order_id, \
                 business_name = EXCLUDED.business_name, \
                 business_type = EXCLUDED.business_type, \
                 industry = EXCLUDED.industry, \
                 company_size = EXCLUDED.company_size, \
                 website = EXCLUDED.website, \
                 preferred_domains = EXCLUDED.preferred_domains, \
                 domain_requirements = EXCLUDED.domain_requirements, \
                 personas = EXCLUDED.personas, \
                 esp_provider = EXCLUDED.esp_provider, \
                 special_requirements = EXCLUDED.special_requirements, \
                 step_completed = EXCLUDED.step_completed, \
                 is_completed = EXCLUDED.is_completed, \
                 completed_at = EXCLUDED.completed_at \
             RETURNING {COLUMNS}"
        );
        let onboarding = sqlx::query_as::<_, OnboardingData>(&query)
            .bind(order.workspace_id)
            .bind(order.id)
            .bind(&fields.business_name)
            .bind(&fields.business_type)
            .bind(&fields.industry)
            .bind(&fields.company_size)
            .bind(&fields.website)
            .bind(&fields.preferred_domains)
            .bind(&fields.domain_requirements)
            .bind(Json(&fields.personas))
            .bind(&fields.esp_provider)
            .bind(&fields.special_requirements)
            .bind(fields.step_completed)
            .bind(fields.is_completed)
            .bind(fields.completed_at)
            .fetch_one(&mut *tx)
            .await?;

        let order = match &plan.order_change {
            Some(change) => OrderRepo::apply_status_change(&mut *tx, order.id, change).await?,
            None => order,
        };

        tx.commit().await?;

        if plan.order_change.is_some() {
            tracing::info!(
                order_id = order.id,
                workspace_id = order.workspace_id,
                "Onboarding completed, order marked COMPLETED"
            );
        }

        Ok(Some(OnboardingSaveOutcome { onboarding, order }))
    }
}
