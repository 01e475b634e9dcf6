// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fieldtally Usage Module
//!
//! Computes per-user and per-organization resource-usage summaries for the
//! survey platform: attachment storage bytes, submission counts, and NLP
//! processing usage, each split into current-billing-month, current-billing-year
//! and all-time windows.
//!
//! ## Features
//!
//! - **Billing Period Resolution**: Translate a subscription's billing-cycle
//!   anchor into month/year usage window boundaries, with a calendar fallback
//!   when no subscription exists
//! - **Organization Rollups**: Aggregate usage across all members of an
//!   organization, anchored to the organization's active subscription
//! - **Per-Asset Usage**: The same tallies scoped to a single deployed survey
//! - **Store Seams**: Each backing collection is a trait, with Postgres
//!   implementations provided and in-memory fakes used in tests

pub mod error;
pub mod periods;
pub mod service;
pub mod stores;
pub mod types;


// Error
pub use error::{UsageError, UsageResult};

// Periods
pub use periods::{resolve_windows, SubscriptionPeriods, UsageWindow};

// Service
pub use service::UsageService;

// Stores
pub use stores::{
    AssetStore, DateRange, FormStore, NlpUsageStore, OrganizationStore, PgStores,
    SubmissionCounterStore, SubscriptionStore,
};

// Types
pub use types::{
    AssetRecord, AssetUsage, DeploymentInfo, NlpTrackingData, NlpUsage, OrganizationRecord,
    SubmissionCounts, UsageSummary,
};
