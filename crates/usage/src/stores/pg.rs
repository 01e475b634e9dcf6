//! Postgres implementations of the store interfaces
//!
//! One pool, one `PgStores` value implementing every trait. All aggregates
//! coalesce NULL sums to 0 in SQL and again in Rust, so an empty result set
//! never surfaces as an error or a NULL.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use fieldtally_shared::BillingInterval;

use crate::error::{UsageError, UsageResult};
use crate::periods::SubscriptionPeriods;
use crate::stores::{
    AssetStore, DateRange, FormStore, NlpUsageStore, OrganizationStore, SubmissionCounterStore,
    SubscriptionStore,
};
use crate::types::{AssetRecord, DeploymentInfo, NlpTrackingData, OrganizationRecord};

/// Row type for organization lookups
#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
}

/// Row type for active-subscription lookups
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    billing_interval: String,
    anchor_date: NaiveDate,
    current_period_start: NaiveDate,
}

/// Row type for asset projections
#[derive(Debug, sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    uid: String,
    owner_id: Uuid,
    name: String,
    backend: Option<String>,
    attachment_storage_bytes: Option<i64>,
}

impl From<AssetRow> for AssetRecord {
    fn from(row: AssetRow) -> Self {
        let deployment = row.backend.map(|backend| DeploymentInfo {
            backend,
            attachment_storage_bytes: row.attachment_storage_bytes.unwrap_or(0),
        });
        AssetRecord {
            id: row.id,
            uid: row.uid,
            owner_id: row.owner_id,
            name: row.name,
            deployment,
        }
    }
}

/// Postgres-backed stores for the usage calculator
#[derive(Clone)]
pub struct PgStores {
    pool: PgPool,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using `DATABASE_URL` from the environment (or a `.env` file).
    pub async fn from_env() -> UsageResult<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| UsageError::Config("DATABASE_URL is not set".to_string()))?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrganizationStore for PgStores {
    async fn find(&self, org_id: Uuid) -> UsageResult<Option<OrganizationRecord>> {
        let row: Option<OrganizationRow> =
            sqlx::query_as("SELECT id, name FROM organizations WHERE id = $1")
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| OrganizationRecord {
            id: r.id,
            name: r.name,
        }))
    }

    async fn member_ids(&self, org_id: Uuid) -> UsageResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM organization_users WHERE org_id = $1")
                .bind(org_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }
}

#[async_trait]
impl SubscriptionStore for PgStores {
    async fn active_for_organization(
        &self,
        org_id: Uuid,
    ) -> UsageResult<Option<SubscriptionPeriods>> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT
                billing_interval,
                billing_cycle_anchor::date AS anchor_date,
                current_period_start::date AS current_period_start
            FROM subscriptions
            WHERE org_id = $1
              AND status IN ('active', 'past_due', 'trialing')
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let interval = BillingInterval::parse(&row.billing_interval).ok_or_else(|| {
            UsageError::Database(format!(
                "unknown billing interval '{}' for org {}",
                row.billing_interval, org_id
            ))
        })?;

        Ok(Some(SubscriptionPeriods {
            interval,
            anchor_date: row.anchor_date,
            current_period_start: row.current_period_start,
        }))
    }
}

#[async_trait]
impl AssetStore for PgStores {
    async fn deployed_surveys(&self, owner_ids: &[Uuid]) -> UsageResult<Vec<AssetRecord>> {
        // Only select fields we need; the deployment JSONB is probed for the
        // backend key rather than loaded whole.
        let rows: Vec<AssetRow> = sqlx::query_as(
            r#"
            SELECT
                a.id,
                a.uid,
                a.owner_id,
                a.name,
                a.deployment_data->>'backend' AS backend,
                (a.deployment_data->>'attachment_storage_bytes')::bigint AS attachment_storage_bytes
            FROM assets a
            WHERE a.owner_id = ANY($1)
              AND a.asset_type = 'survey'
              AND a.deployment_data ? 'backend'
            "#,
        )
        .bind(owner_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AssetRecord::from).collect())
    }

    async fn find_by_uid(&self, uid: &str) -> UsageResult<Option<AssetRecord>> {
        let row: Option<AssetRow> = sqlx::query_as(
            r#"
            SELECT
                a.id,
                a.uid,
                a.owner_id,
                a.name,
                a.deployment_data->>'backend' AS backend,
                (a.deployment_data->>'attachment_storage_bytes')::bigint AS attachment_storage_bytes
            FROM assets a
            WHERE a.uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AssetRecord::from))
    }
}

#[async_trait]
impl FormStore for PgStores {
    async fn attachment_storage_bytes(&self, asset_uids: &[String]) -> UsageResult<i64> {
        let result: Option<(Option<i64>,)> = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(attachment_storage_bytes), 0)
            FROM forms
            WHERE asset_uid = ANY($1)
            "#,
        )
        .bind(asset_uids.to_vec())
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.and_then(|(sum,)| sum).unwrap_or(0))
    }

    async fn submission_count_since(
        &self,
        asset_uid: &str,
        start: Option<NaiveDate>,
    ) -> UsageResult<i64> {
        let result: Option<(Option<i64>,)> = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(c.counter), 0)
            FROM daily_submission_counters c
            JOIN forms f ON f.id = c.form_id
            WHERE f.asset_uid = $1
              AND ($2::date IS NULL OR c.date >= $2)
            "#,
        )
        .bind(asset_uid)
        .bind(start)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.and_then(|(sum,)| sum).unwrap_or(0))
    }
}

#[async_trait]
impl SubmissionCounterStore for PgStores {
    async fn counter_sum(&self, asset_uids: &[String], range: DateRange) -> UsageResult<i64> {
        let (start, end) = split_range(range);

        let result: Option<(Option<i64>,)> = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(c.counter), 0)
            FROM daily_submission_counters c
            JOIN forms f ON f.id = c.form_id
            WHERE f.asset_uid = ANY($1)
              AND ($2::date IS NULL OR (c.date >= $2 AND c.date <= $3))
            "#,
        )
        .bind(asset_uids.to_vec())
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.and_then(|(sum,)| sum).unwrap_or(0))
    }
}

#[async_trait]
impl NlpUsageStore for PgStores {
    async fn range_sums(
        &self,
        asset_ids: &[Uuid],
        range: DateRange,
    ) -> UsageResult<NlpTrackingData> {
        let (start, end) = split_range(range);

        let result: Option<(Option<i64>, Option<i64>)> = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(total_asr_seconds), 0),
                COALESCE(SUM(total_mt_characters), 0)
            FROM nlp_usage_counters
            WHERE asset_id = ANY($1)
              AND ($2::date IS NULL OR (date >= $2 AND date <= $3))
            "#,
        )
        .bind(asset_ids.to_vec())
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(nlp_totals(result))
    }

    async fn tracking_data(
        &self,
        asset_ids: &[Uuid],
        start: Option<NaiveDate>,
    ) -> UsageResult<NlpTrackingData> {
        let result: Option<(Option<i64>, Option<i64>)> = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(total_asr_seconds), 0),
                COALESCE(SUM(total_mt_characters), 0)
            FROM nlp_usage_counters
            WHERE asset_id = ANY($1)
              AND ($2::date IS NULL OR date >= $2)
            "#,
        )
        .bind(asset_ids.to_vec())
        .bind(start)
        .fetch_optional(&self.pool)
        .await?;

        Ok(nlp_totals(result))
    }
}

fn split_range(range: DateRange) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match range {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    }
}

fn nlp_totals(row: Option<(Option<i64>, Option<i64>)>) -> NlpTrackingData {
    let (asr, mt) = row.unwrap_or((None, None));
    NlpTrackingData {
        total_nlp_asr_seconds: asr.unwrap_or(0),
        total_nlp_mt_characters: mt.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_range() {
        assert_eq!(split_range(None), (None, None));
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(split_range(Some((start, end))), (Some(start), Some(end)));
    }

    #[test]
    fn test_nlp_totals_coalesces_missing_rows() {
        assert_eq!(nlp_totals(None), NlpTrackingData::default());
        assert_eq!(nlp_totals(Some((None, None))), NlpTrackingData::default());
        assert_eq!(
            nlp_totals(Some((Some(120), Some(4500)))),
            NlpTrackingData {
                total_nlp_asr_seconds: 120,
                total_nlp_mt_characters: 4500,
            }
        );
    }
}
