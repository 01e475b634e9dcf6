//! Wire types for usage summaries, plus the record projections the stores
//! return to the calculator.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Submission totals, one figure per usage window.
///
/// The three figures are independent range sums sharing an upper bound;
/// billing windows can straddle calendar boundaries, so no numeric ordering
/// between them is guaranteed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionCounts {
    pub all_time: i64,
    pub current_year: i64,
    pub current_month: i64,
}

/// NLP processing totals, one figure per metric per usage window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NlpUsage {
    pub asr_seconds_all_time: i64,
    pub asr_seconds_current_year: i64,
    pub asr_seconds_current_month: i64,
    pub mt_characters_all_time: i64,
    pub mt_characters_current_year: i64,
    pub mt_characters_current_month: i64,
}

/// One ASR/MT total pair, as returned by the NLP counter store and reported
/// per window by the single-asset endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NlpTrackingData {
    pub total_nlp_asr_seconds: i64,
    pub total_nlp_mt_characters: i64,
}

/// Usage summary for one user or one organization's membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    /// Attachment storage across all deployed surveys. All-time only,
    /// storage is a level, not a flow.
    pub total_storage_bytes: i64,
    pub total_submission_count: SubmissionCounts,
    pub total_nlp_usage: NlpUsage,
    pub current_month_start: NaiveDate,
    pub current_year_start: NaiveDate,
}

/// Usage tallies for a single asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetUsage {
    /// The asset's public identifier.
    pub asset_uid: String,
    pub asset_name: String,
    pub nlp_usage_current_month: NlpTrackingData,
    pub nlp_usage_current_year: NlpTrackingData,
    pub nlp_usage_all_time: NlpTrackingData,
    pub storage_bytes: i64,
    pub submission_count_current_month: i64,
    pub submission_count_current_year: i64,
    pub submission_count_all_time: i64,
}

impl AssetUsage {
    /// All-zero usage, reported for assets that have never been deployed.
    pub fn empty(asset_uid: String, asset_name: String) -> Self {
        Self {
            asset_uid,
            asset_name,
            nlp_usage_current_month: NlpTrackingData::default(),
            nlp_usage_current_year: NlpTrackingData::default(),
            nlp_usage_all_time: NlpTrackingData::default(),
            storage_bytes: 0,
            submission_count_current_month: 0,
            submission_count_current_year: 0,
            submission_count_all_time: 0,
        }
    }
}

/// Projection of a deployed survey asset, as returned by the asset store.
/// Only the fields the calculator needs are carried.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    pub id: Uuid,
    /// Public identifier, the join key toward the form store.
    pub uid: String,
    pub owner_id: Uuid,
    pub name: String,
    pub deployment: Option<DeploymentInfo>,
}

impl AssetRecord {
    pub fn has_deployment(&self) -> bool {
        self.deployment.is_some()
    }
}

/// Deployment metadata carried on an asset.
#[derive(Debug, Clone)]
pub struct DeploymentInfo {
    /// Which deployment backend serves the asset.
    pub backend: String,
    /// Attachment storage consumed by the deployment, in bytes.
    pub attachment_storage_bytes: i64,
}

/// An organization row, as returned by the membership store.
#[derive(Debug, Clone)]
pub struct OrganizationRecord {
    pub id: Uuid,
    pub name: String,
}
