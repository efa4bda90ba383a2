//! Summation of per-subscription contributions.

use super::{overlap, CostError, QueryFilter};
use crate::models::SubscriptionRecord;
use crate::services::metrics::record_cost_query;
use crate::services::SubscriptionStore;
use tracing::{debug, instrument, warn};

/// Price times billed months for one record, or 0 if it is not selected.
pub fn contribution(record: &SubscriptionRecord, filter: &QueryFilter) -> u64 {
    overlap::select(record, filter)
        .map(|interval| record.price.saturating_mul(interval.months()))
        .unwrap_or(0)
}

/// Total cost of `records` under `filter`.
///
/// Records the filter does not select contribute nothing, so callers may pass
/// a superset of the matching subscriptions.
pub fn aggregate<'a, I>(records: I, filter: &QueryFilter) -> u64
where
    I: IntoIterator<Item = &'a SubscriptionRecord>,
{
    records
        .into_iter()
        .map(|record| contribution(record, filter))
        .fold(0u64, u64::saturating_add)
}

/// Fetch candidate subscriptions from `store` and sum their cost.
#[instrument(
    skip(store, filter),
    fields(
        window_start = %filter.window_start(),
        window_end = %filter.window_end(),
        owner_id = ?filter.owner_id(),
        service_name = ?filter.service_name()
    )
)]
pub async fn compute_total_cost<S>(store: &S, filter: &QueryFilter) -> Result<u64, CostError>
where
    S: SubscriptionStore + ?Sized,
{
    let records = match store.fetch_candidates(filter).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Failed to read subscriptions for cost query");
            record_cost_query("unavailable");
            return Err(CostError::AggregationUnavailable(anyhow::Error::new(e)));
        }
    };

    let total = aggregate(&records, filter);
    record_cost_query("ok");
    debug!(candidates = records.len(), total, "Cost query computed");

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateSubscription, Period};
    use crate::services::InMemoryStore;
    use uuid::Uuid;

    fn period(text: &str) -> Period {
        Period::parse(text).unwrap()
    }

    fn record(
        id: i64,
        name: &str,
        price: u64,
        owner: Uuid,
        start: &str,
        end: Option<&str>,
    ) -> SubscriptionRecord {
        SubscriptionRecord {
            id,
            service_name: name.to_string(),
            price,
            owner_id: owner,
            start: period(start),
            end: end.map(period),
        }
    }

    fn window(start: &str, end: &str) -> QueryFilter {
        QueryFilter::new(period(start), period(end)).unwrap()
    }

    #[test]
    fn sums_open_ended_and_clipped_records() {
        let owner = Uuid::new_v4();
        let records = vec![
            record(1, "Netflix", 100, owner, "01-2025", None),
            record(2, "Spotify", 50, owner, "11-2024", Some("02-2025")),
        ];

        // 100 * 3 + 50 * 2
        assert_eq!(aggregate(&records, &window("01-2025", "03-2025")), 400);
    }

    #[test]
    fn owner_filter_limits_the_sum() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let records = vec![
            record(1, "Netflix", 100, alice, "01-2025", None),
            record(2, "Netflix", 70, bob, "01-2025", None),
        ];

        let filter = window("01-2025", "02-2025").with_owner(bob);
        assert_eq!(aggregate(&records, &filter), 140);
    }

    #[test]
    fn service_filter_is_case_insensitive() {
        let owner = Uuid::new_v4();
        let records = vec![
            record(1, "Yandex Plus", 400, owner, "07-2025", None),
            record(2, "Netflix", 100, owner, "07-2025", None),
        ];

        let filter = window("07-2025", "07-2025").with_service_name("yandex plus");
        assert_eq!(aggregate(&records, &filter), 400);
    }

    #[test]
    fn no_overlap_sums_to_zero() {
        let records = vec![record(1, "Netflix", 100, Uuid::new_v4(), "01-2024", Some("06-2024"))];
        assert_eq!(aggregate(&records, &window("01-2025", "03-2025")), 0);
        assert_eq!(aggregate(&Vec::<SubscriptionRecord>::new(), &window("01-2025", "03-2025")), 0);
    }

    #[test]
    fn contribution_saturates_instead_of_overflowing() {
        let records = vec![
            record(1, "Huge", u64::MAX, Uuid::new_v4(), "01-2025", None),
            record(2, "Huge", u64::MAX, Uuid::new_v4(), "01-2025", None),
        ];
        let filter = window("01-2025", "02-2025");
        assert_eq!(contribution(&records[0], &filter), u64::MAX);
        assert_eq!(aggregate(&records, &filter), u64::MAX);
    }

    fn input(
        name: &str,
        price: i64,
        owner: Uuid,
        start: &str,
        end: Option<&str>,
    ) -> CreateSubscription {
        CreateSubscription {
            service_name: name.to_string(),
            price,
            user_id: owner,
            start: period(start),
            end: end.map(period),
        }
    }

    #[tokio::test]
    async fn computes_total_from_store() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        store
            .create(&input("Netflix", 100, owner, "01-2025", None))
            .await
            .unwrap();
        store
            .create(&input("Spotify", 50, owner, "11-2024", Some("02-2025")))
            .await
            .unwrap();

        let total = compute_total_cost(&store, &window("01-2025", "03-2025"))
            .await
            .unwrap();
        assert_eq!(total, 400);
    }

    #[tokio::test]
    async fn store_failure_is_aggregation_unavailable() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);

        let err = compute_total_cost(&store, &window("01-2025", "03-2025"))
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::AggregationUnavailable(_)));
    }
}
