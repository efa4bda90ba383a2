//! In-process subscription store used by tests and local runs without
//! PostgreSQL.

use super::store::{unordered_period_error, SubscriptionStore};
use crate::cost::QueryFilter;
use crate::models::{
    CreateSubscription, PageRequest, Subscription, SubscriptionPage, SubscriptionRecord,
    UpdateSubscription,
};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Rows {
    next_id: i64,
    by_id: BTreeMap<i64, Subscription>,
}

#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Rows>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail as if the backing database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rows>, AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "In-memory store marked unavailable"
            )));
        }
        self.rows
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Store mutex poisoned: {}", e)))
    }
}

fn apply(row: &mut Subscription, input: &CreateSubscription) {
    row.service_name = input.service_name.clone();
    row.price = input.price;
    row.user_id = input.user_id;
    row.start_date = input.start.first_day();
    row.end_date = input.end.map(|end| end.first_day());
    row.updated_utc = Utc::now();
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn list(&self, page: PageRequest) -> Result<SubscriptionPage, AppError> {
        let rows = self.lock()?;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = rows
            .by_id
            .values()
            .skip(offset)
            .take(page.size as usize)
            .cloned()
            .collect();

        Ok(SubscriptionPage {
            items,
            total: rows.by_id.len() as u64,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Subscription>, AppError> {
        Ok(self.lock()?.by_id.get(&id).cloned())
    }

    async fn create(&self, input: &CreateSubscription) -> Result<Subscription, AppError> {
        if !input.has_ordered_period() {
            return Err(unordered_period_error());
        }

        let mut rows = self.lock()?;
        rows.next_id += 1;
        let now = Utc::now();
        let subscription = Subscription {
            id: rows.next_id,
            service_name: input.service_name.clone(),
            price: input.price,
            user_id: input.user_id,
            start_date: input.start.first_day(),
            end_date: input.end.map(|end| end.first_day()),
            created_utc: now,
            updated_utc: now,
        };
        rows.by_id.insert(subscription.id, subscription.clone());

        Ok(subscription)
    }

    async fn replace(
        &self,
        id: i64,
        input: &CreateSubscription,
    ) -> Result<Option<Subscription>, AppError> {
        if !input.has_ordered_period() {
            return Err(unordered_period_error());
        }

        let mut rows = self.lock()?;
        Ok(rows.by_id.get_mut(&id).map(|row| {
            apply(row, input);
            row.clone()
        }))
    }

    async fn patch(
        &self,
        id: i64,
        input: &UpdateSubscription,
    ) -> Result<Option<Subscription>, AppError> {
        let mut rows = self.lock()?;
        let Some(row) = rows.by_id.get_mut(&id) else {
            return Ok(None);
        };

        let merged = input.merge(row);
        if !merged.has_ordered_period() {
            return Err(unordered_period_error());
        }
        apply(row, &merged);

        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.lock()?.by_id.remove(&id).is_some())
    }

    async fn fetch_candidates(
        &self,
        _filter: &QueryFilter,
    ) -> Result<Vec<SubscriptionRecord>, AppError> {
        let rows = self.lock()?;
        rows.by_id
            .values()
            .cloned()
            .map(|row| SubscriptionRecord::try_from(row).map_err(AppError::InternalError))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use uuid::Uuid;

    fn input(name: &str, start: &str, end: Option<&str>) -> CreateSubscription {
        CreateSubscription {
            service_name: name.to_string(),
            price: 100,
            user_id: Uuid::new_v4(),
            start: Period::parse(start).unwrap(),
            end: end.map(|e| Period::parse(e).unwrap()),
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let first = store.create(&input("Netflix", "01-2025", None)).await.unwrap();
        let second = store.create(&input("Spotify", "02-2025", None)).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn lists_in_pages() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .create(&input(&format!("Service {i}"), "01-2025", None))
                .await
                .unwrap();
        }

        let page = store.list(PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].service_name, "Service 2");
    }

    #[tokio::test]
    async fn patch_rejects_end_before_stored_start() {
        let store = InMemoryStore::new();
        let created = store.create(&input("Netflix", "06-2025", None)).await.unwrap();

        let update = UpdateSubscription {
            end: Some(Period::parse("01-2025").unwrap()),
            ..Default::default()
        };
        let err = store.patch(created.id, &update).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let unchanged = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(unchanged.end_date, None);
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let store = InMemoryStore::new();
        assert!(store.get(9).await.unwrap().is_none());
        assert!(store
            .replace(9, &input("Netflix", "01-2025", None))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .patch(9, &UpdateSubscription::default())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete(9).await.unwrap());
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        assert!(store.health_check().await.is_err());
        assert!(store.list(PageRequest::new(1, 10)).await.is_err());
    }
}
