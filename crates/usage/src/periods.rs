//! Billing period resolution
//!
//! Translates a subscription's billing-cycle anchor into the start dates of
//! the current month-equivalent and year-equivalent usage windows. Without a
//! subscription the windows fall back to calendar month/year boundaries.
//!
//! Pure date arithmetic: no side effects, no error conditions. `now` must be
//! captured once per request and threaded through so that every windowed
//! aggregate in the request shares one upper bound.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use fieldtally_shared::BillingInterval;

/// Billing-period fields extracted from an organization's active subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPeriods {
    /// How often the subscription renews.
    pub interval: BillingInterval,
    /// Date part of the subscription's billing cycle anchor.
    pub anchor_date: NaiveDate,
    /// Start of the current billing period, as computed by the payment
    /// provider.
    pub current_period_start: NaiveDate,
}

/// Usage window boundaries for one request. Derived per request, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageWindow {
    pub current_month_start: NaiveDate,
    pub current_year_start: NaiveDate,
    /// Inclusive upper bound shared by every windowed aggregate.
    pub now: NaiveDate,
}

/// Compute the current usage windows for `now`.
///
/// Both window starts are always on or before `now`.
pub fn resolve_windows(now: NaiveDate, subscription: Option<&SubscriptionPeriods>) -> UsageWindow {
    UsageWindow {
        current_month_start: month_window_start(now, subscription),
        current_year_start: year_window_start(now, subscription),
        now,
    }
}

fn month_window_start(now: NaiveDate, subscription: Option<&SubscriptionPeriods>) -> NaiveDate {
    let Some(sub) = subscription else {
        // No subscription info, use the first day of the current month
        return date_with_day_clamped(now.year(), now.month(), 1);
    };
    match sub.interval {
        // Billed monthly: the provider already computed the period boundary
        BillingInterval::Month => sub.current_period_start,
        // Billed yearly: the month window rolls over on the anchor day
        BillingInterval::Year => {
            let anchor_day = sub.anchor_date.day();
            if now.day() > anchor_day {
                date_with_day_clamped(now.year(), now.month(), anchor_day)
            } else if now.month() == 1 {
                date_with_day_clamped(now.year() - 1, 12, anchor_day)
            } else {
                date_with_day_clamped(now.year(), now.month() - 1, anchor_day)
            }
        }
    }
}

fn year_window_start(now: NaiveDate, subscription: Option<&SubscriptionPeriods>) -> NaiveDate {
    let Some(sub) = subscription else {
        // No subscription info, use the first day of the current year
        return date_with_day_clamped(now.year(), 1, 1);
    };
    match sub.interval {
        // Billed yearly: the provider already computed the period boundary
        BillingInterval::Year => sub.current_period_start,
        // Billed monthly: project the anchor date into the current year,
        // stepping back one year if that projection lies after `now`
        BillingInterval::Month => {
            let anchor = sub.anchor_date;
            let this_year = date_with_day_clamped(now.year(), anchor.month(), anchor.day());
            if this_year > now {
                date_with_day_clamped(now.year() - 1, anchor.month(), anchor.day())
            } else {
                this_year
            }
        }
    }
}

/// Build a date from components, clamping `day` down to the last valid day
/// of the month when it overshoots (anchor day 31 in February resolves to
/// Feb 28/29, a Feb 29 anchor resolves to Feb 28 in non-leap years).
fn date_with_day_clamped(year: i32, month: u32, day: u32) -> NaiveDate {
    (1..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        // Unreachable for month in 1..=12, day >= 1; MIN keeps this total
        .unwrap_or(NaiveDate::MIN)
}
