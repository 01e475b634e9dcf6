//! Service usage calculation
//!
//! Orchestrates one usage computation: resolve the user set (the requesting
//! user, or an organization's membership), resolve the billing windows from
//! the organization's active subscription, then aggregate storage,
//! submission counts and NLP usage across the users' deployed surveys.
//!
//! The computation is stateless: every call captures `now` once, re-queries
//! the stores, and holds no state between requests.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{UsageError, UsageResult};
use crate::periods::{resolve_windows, SubscriptionPeriods};
use crate::stores::{
    AssetStore, FormStore, NlpUsageStore, OrganizationStore, PgStores, SubmissionCounterStore,
    SubscriptionStore,
};
use crate::types::{AssetUsage, NlpUsage, SubmissionCounts, UsageSummary};

/// Usage calculator over the six store seams.
pub struct UsageService {
    organizations: Arc<dyn OrganizationStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    assets: Arc<dyn AssetStore>,
    forms: Arc<dyn FormStore>,
    submissions: Arc<dyn SubmissionCounterStore>,
    nlp: Arc<dyn NlpUsageStore>,
}

impl UsageService {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        assets: Arc<dyn AssetStore>,
        forms: Arc<dyn FormStore>,
        submissions: Arc<dyn SubmissionCounterStore>,
        nlp: Arc<dyn NlpUsageStore>,
    ) -> Self {
        Self {
            organizations,
            subscriptions,
            assets,
            forms,
            submissions,
            nlp,
        }
    }

    /// Wire every seam to the same Postgres pool.
    pub fn postgres(pool: PgPool) -> Self {
        let stores = Arc::new(PgStores::new(pool));
        Self::new(
            stores.clone(),
            stores.clone(),
            stores.clone(),
            stores.clone(),
            stores.clone(),
            stores,
        )
    }

    /// Usage summary for `requesting_user`, or for every member of
    /// `organization_id` when given.
    pub async fn compute_usage(
        &self,
        requesting_user: Uuid,
        organization_id: Option<Uuid>,
    ) -> UsageResult<UsageSummary> {
        // Capture `now` once so every windowed aggregate in this request
        // shares one upper bound.
        let now = Utc::now().date_naive();
        self.compute_usage_at(now, requesting_user, organization_id)
            .await
    }

    /// As [`compute_usage`](Self::compute_usage), with an explicit `now`.
    pub async fn compute_usage_at(
        &self,
        now: NaiveDate,
        requesting_user: Uuid,
        organization_id: Option<Uuid>,
    ) -> UsageResult<UsageSummary> {
        let (users, subscription) = self
            .resolve_user_set(requesting_user, organization_id)
            .await?;
        let window = resolve_windows(now, subscription.as_ref());

        let assets = self.assets.deployed_surveys(&users).await?;
        let asset_uids: Vec<String> = assets.iter().map(|asset| asset.uid.clone()).collect();
        let asset_ids: Vec<Uuid> = assets.iter().map(|asset| asset.id).collect();

        let total_storage_bytes = self.forms.attachment_storage_bytes(&asset_uids).await?;

        // The three windows are not nested subsets of one another, so each
        // figure is an independent range sum over the same base record set.
        let total_submission_count = SubmissionCounts {
            all_time: self.submissions.counter_sum(&asset_uids, None).await?,
            current_year: self
                .submissions
                .counter_sum(&asset_uids, Some((window.current_year_start, window.now)))
                .await?,
            current_month: self
                .submissions
                .counter_sum(&asset_uids, Some((window.current_month_start, window.now)))
                .await?,
        };

        let nlp_all_time = self.nlp.range_sums(&asset_ids, None).await?;
        let nlp_year = self
            .nlp
            .range_sums(&asset_ids, Some((window.current_year_start, window.now)))
            .await?;
        let nlp_month = self
            .nlp
            .range_sums(&asset_ids, Some((window.current_month_start, window.now)))
            .await?;

        tracing::debug!(
            users = users.len(),
            assets = assets.len(),
            month_start = %window.current_month_start,
            year_start = %window.current_year_start,
            "computed service usage"
        );

        Ok(UsageSummary {
            total_storage_bytes,
            total_submission_count,
            total_nlp_usage: NlpUsage {
                asr_seconds_all_time: nlp_all_time.total_nlp_asr_seconds,
                asr_seconds_current_year: nlp_year.total_nlp_asr_seconds,
                asr_seconds_current_month: nlp_month.total_nlp_asr_seconds,
                mt_characters_all_time: nlp_all_time.total_nlp_mt_characters,
                mt_characters_current_year: nlp_year.total_nlp_mt_characters,
                mt_characters_current_month: nlp_month.total_nlp_mt_characters,
            },
            current_month_start: window.current_month_start,
            current_year_start: window.current_year_start,
        })
    }

    /// Usage tallies for a single asset, looked up by public uid.
    pub async fn asset_usage(&self, asset_uid: &str) -> UsageResult<AssetUsage> {
        let now = Utc::now().date_naive();
        self.asset_usage_at(now, asset_uid).await
    }

    /// As [`asset_usage`](Self::asset_usage), with an explicit `now`.
    ///
    /// Per-asset windows are calendar-derived; subscription anchoring only
    /// applies to the organization-level summary.
    pub async fn asset_usage_at(&self, now: NaiveDate, asset_uid: &str) -> UsageResult<AssetUsage> {
        let asset = self
            .assets
            .find_by_uid(asset_uid)
            .await?
            .ok_or_else(|| UsageError::not_found(format!("asset {asset_uid}")))?;

        let Some(deployment) = asset.deployment.as_ref() else {
            // Never deployed: report zeros without touching the counter stores
            return Ok(AssetUsage::empty(asset.uid, asset.name));
        };
        let storage_bytes = deployment.attachment_storage_bytes;

        let window = resolve_windows(now, None);
        let asset_ids = [asset.id];

        let submission_count_all_time =
            self.forms.submission_count_since(&asset.uid, None).await?;
        let submission_count_current_year = self
            .forms
            .submission_count_since(&asset.uid, Some(window.current_year_start))
            .await?;
        let submission_count_current_month = self
            .forms
            .submission_count_since(&asset.uid, Some(window.current_month_start))
            .await?;

        let nlp_usage_all_time = self.nlp.tracking_data(&asset_ids, None).await?;
        let nlp_usage_current_year = self
            .nlp
            .tracking_data(&asset_ids, Some(window.current_year_start))
            .await?;
        let nlp_usage_current_month = self
            .nlp
            .tracking_data(&asset_ids, Some(window.current_month_start))
            .await?;

        Ok(AssetUsage {
            asset_uid: asset.uid,
            asset_name: asset.name,
            nlp_usage_current_month,
            nlp_usage_current_year,
            nlp_usage_all_time,
            storage_bytes,
            submission_count_current_month,
            submission_count_current_year,
            submission_count_all_time,
        })
    }

    /// Resolve the user set and the subscription anchoring its windows.
    ///
    /// Without an organization id the set is the requesting user alone and
    /// no subscription applies. With one, the set is the organization's
    /// membership; a missing organization is a NotFound failure.
    async fn resolve_user_set(
        &self,
        requesting_user: Uuid,
        organization_id: Option<Uuid>,
    ) -> UsageResult<(Vec<Uuid>, Option<SubscriptionPeriods>)> {
        let Some(org_id) = organization_id else {
            return Ok((vec![requesting_user], None));
        };

        let organization = self
            .organizations
            .find(org_id)
            .await?
            .ok_or_else(|| UsageError::not_found(format!("organization {org_id}")))?;

        let members = self.organizations.member_ids(organization.id).await?;
        let subscription = self
            .subscriptions
            .active_for_organization(organization.id)
            .await?;

        if subscription.is_none() {
            tracing::debug!(
                org_id = %organization.id,
                "no active subscription, windows fall back to calendar boundaries"
            );
        }

        Ok((members, subscription))
    }
}
