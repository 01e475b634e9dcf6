//! Store interfaces consumed by the usage calculator
//!
//! Each backing collection is one trait exposing the aggregate queries the
//! calculator needs, and nothing else. The Postgres implementations live in
//! [`pg`]; tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::UsageResult;
use crate::periods::SubscriptionPeriods;
use crate::types::{AssetRecord, NlpTrackingData, OrganizationRecord};

pub mod pg;

pub use pg::PgStores;

/// Inclusive date range for windowed aggregates. `None` means all-time.
pub type DateRange = Option<(NaiveDate, NaiveDate)>;

/// Organization and membership lookups.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Look up an organization by id.
    async fn find(&self, org_id: Uuid) -> UsageResult<Option<OrganizationRecord>>;

    /// User ids of every member of the organization.
    async fn member_ids(&self, org_id: Uuid) -> UsageResult<Vec<Uuid>>;
}

/// Subscription lookups against the payment-provider mirror.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// The organization's first subscription whose status counts as active
    /// (active, past_due or trialing), reduced to its billing-period fields.
    async fn active_for_organization(
        &self,
        org_id: Uuid,
    ) -> UsageResult<Option<SubscriptionPeriods>>;
}

/// Survey asset lookups.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Deployed survey-type assets owned by any of `owner_ids`, projected
    /// down to the fields the calculator needs.
    async fn deployed_surveys(&self, owner_ids: &[Uuid]) -> UsageResult<Vec<AssetRecord>>;

    /// Look up one asset by its public uid, deployed or not.
    async fn find_by_uid(&self, uid: &str) -> UsageResult<Option<AssetRecord>>;
}

/// Deployment/form records linked to assets.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Total attachment storage across the forms linked to `asset_uids`.
    /// 0 when no forms match.
    async fn attachment_storage_bytes(&self, asset_uids: &[String]) -> UsageResult<i64>;

    /// Submission count for one asset's form since `start`, inclusive.
    /// All-time when `start` is `None`.
    async fn submission_count_since(
        &self,
        asset_uid: &str,
        start: Option<NaiveDate>,
    ) -> UsageResult<i64>;
}

/// Per-form per-day submission counters.
#[async_trait]
pub trait SubmissionCounterStore: Send + Sync {
    /// Sum of the daily counters for the forms linked to `asset_uids`,
    /// restricted to `range` when present. 0 when no rows match.
    async fn counter_sum(&self, asset_uids: &[String], range: DateRange) -> UsageResult<i64>;
}

/// Per-asset per-day NLP usage counters.
#[async_trait]
pub trait NlpUsageStore: Send + Sync {
    /// Range sums of the ASR/MT counters for `asset_ids`. Zeros when no
    /// rows match.
    async fn range_sums(
        &self,
        asset_ids: &[Uuid],
        range: DateRange,
    ) -> UsageResult<NlpTrackingData>;

    /// Open-ended totals since `start`, inclusive (all-time when `None`).
    /// Batch lookup used by single-asset callers.
    async fn tracking_data(
        &self,
        asset_ids: &[Uuid],
        start: Option<NaiveDate>,
    ) -> UsageResult<NlpTrackingData>;
}
