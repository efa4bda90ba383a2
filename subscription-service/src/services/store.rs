use crate::cost::QueryFilter;
use crate::models::{
    CreateSubscription, PageRequest, Subscription, SubscriptionPage, SubscriptionRecord,
    UpdateSubscription,
};
use async_trait::async_trait;
use service_core::error::AppError;

/// Persistence seam for subscriptions.
///
/// `replace`, `patch` and `get` return `None` when the id is unknown;
/// `delete` reports whether a row was removed.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    async fn list(&self, page: PageRequest) -> Result<SubscriptionPage, AppError>;

    async fn get(&self, id: i64) -> Result<Option<Subscription>, AppError>;

    async fn create(&self, input: &CreateSubscription) -> Result<Subscription, AppError>;

    async fn replace(
        &self,
        id: i64,
        input: &CreateSubscription,
    ) -> Result<Option<Subscription>, AppError>;

    /// Apply a partial update. Fails with `BadRequest` if the merged end
    /// period falls before the merged start period.
    async fn patch(
        &self,
        id: i64,
        input: &UpdateSubscription,
    ) -> Result<Option<Subscription>, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Subscriptions that may contribute to a cost query.
    ///
    /// Implementations may return a superset of the matching records; the
    /// aggregator applies the full selection again.
    async fn fetch_candidates(
        &self,
        filter: &QueryFilter,
    ) -> Result<Vec<SubscriptionRecord>, AppError>;
}

pub(crate) fn unordered_period_error() -> AppError {
    AppError::BadRequest(anyhow::anyhow!("start_date cannot be after end_date"))
}
