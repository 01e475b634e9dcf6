//! Shared domain types for the fieldtally workspace.
//!
//! These are the enums and constants that both the usage crates and any
//! embedding service need to agree on. Keep this crate dependency-light.

use serde::{Deserialize, Serialize};

/// Asset type counted by the usage aggregator. Other asset types (blocks,
/// templates, collections) never carry deployments and are skipped.
pub const ASSET_TYPE_SURVEY: &str = "survey";

/// How often a subscription renews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Month,
    Year,
}

impl BillingInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Month => "month",
            BillingInterval::Year => "year",
        }
    }

    /// Parse the interval string stored on a subscription price.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "month" => Some(BillingInterval::Month),
            "year" => Some(BillingInterval::Year),
            _ => None,
        }
    }
}

impl std::fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription lifecycle status, mirroring the payment provider's states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Trialing,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Unpaid => "unpaid",
        }
    }

    /// Whether this status counts toward billing-period anchoring.
    /// Past-due and trialing subscriptions still define the billing cycle.
    pub fn counts_as_active(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active
                | SubscriptionStatus::PastDue
                | SubscriptionStatus::Trialing
        )
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_interval_round_trip() {
        assert_eq!(BillingInterval::parse("month"), Some(BillingInterval::Month));
        assert_eq!(BillingInterval::parse("year"), Some(BillingInterval::Year));
        assert_eq!(BillingInterval::parse("week"), None);
        assert_eq!(BillingInterval::Month.to_string(), "month");
    }

    #[test]
    fn test_active_statuses() {
        assert!(SubscriptionStatus::Active.counts_as_active());
        assert!(SubscriptionStatus::PastDue.counts_as_active());
        assert!(SubscriptionStatus::Trialing.counts_as_active());
        assert!(!SubscriptionStatus::Canceled.counts_as_active());
        assert!(!SubscriptionStatus::Unpaid.counts_as_active());
    }
}
