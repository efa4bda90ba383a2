//! Selection of subscriptions active inside a query window.

use super::QueryFilter;
use crate::models::{Period, SubscriptionRecord};

/// Part of a subscription that falls inside the query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippedInterval {
    pub start: Period,
    pub end: Period,
}

impl ClippedInterval {
    /// Billed months, both ends included. At least 1 for any selected record.
    pub fn months(&self) -> u64 {
        Period::inclusive_month_span(self.start, self.end)
    }
}

/// Last billed month of `record` for this query: its end period, or the
/// window end for a subscription that is still running.
pub fn effective_end(record: &SubscriptionRecord, filter: &QueryFilter) -> Period {
    record.end.unwrap_or_else(|| filter.window_end())
}

/// Intersect the record's active months with the window, ignoring the
/// owner and service predicates.
pub fn clip(record: &SubscriptionRecord, filter: &QueryFilter) -> Option<ClippedInterval> {
    let end = effective_end(record, filter);

    if record.start > filter.window_end() || end < filter.window_start() {
        return None;
    }

    Some(ClippedInterval {
        start: record.start.clip_lower(filter.window_start()),
        end: end.clip_upper(filter.window_end()),
    })
}

/// Apply the owner and service predicates, then the window overlap.
pub fn select(record: &SubscriptionRecord, filter: &QueryFilter) -> Option<ClippedInterval> {
    if !filter.matches_owner(&record.owner_id) || !filter.matches_service(&record.service_name) {
        return None;
    }
    clip(record, filter)
}
