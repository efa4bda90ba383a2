//! Subscription model.

use super::Period;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription as stored in the `subscriptions` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: i64,
    pub service_name: String,
    pub price: i64,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Subscription {
    pub fn start_period(&self) -> Period {
        Period::from(self.start_date)
    }

    pub fn end_period(&self) -> Option<Period> {
        self.end_date.map(Period::from)
    }
}

/// Read-only snapshot of a subscription as seen by cost aggregation.
///
/// `end` of `None` means the subscription is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub id: i64,
    pub service_name: String,
    pub price: u64,
    pub owner_id: Uuid,
    pub start: Period,
    pub end: Option<Period>,
}

impl TryFrom<Subscription> for SubscriptionRecord {
    type Error = anyhow::Error;

    fn try_from(row: Subscription) -> Result<Self, Self::Error> {
        let price = u64::try_from(row.price).map_err(|_| {
            anyhow::anyhow!("Subscription {} has negative price {}", row.id, row.price)
        })?;

        Ok(Self {
            id: row.id,
            start: Period::from(row.start_date),
            end: row.end_date.map(Period::from),
            service_name: row.service_name,
            price,
            owner_id: row.user_id,
        })
    }
}

/// Input for creating a subscription, also used for full replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscription {
    pub service_name: String,
    pub price: i64,
    pub user_id: Uuid,
    pub start: Period,
    pub end: Option<Period>,
}

impl CreateSubscription {
    /// Whether the end period, if any, is not before the start period.
    pub fn has_ordered_period(&self) -> bool {
        self.end.map_or(true, |end| end >= self.start)
    }
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSubscription {
    pub service_name: Option<String>,
    pub price: Option<i64>,
    pub user_id: Option<Uuid>,
    pub start: Option<Period>,
    pub end: Option<Period>,
}

impl UpdateSubscription {
    pub fn is_empty(&self) -> bool {
        self == &UpdateSubscription::default()
    }

    /// Overlay this update on a stored subscription.
    pub fn merge(&self, current: &Subscription) -> CreateSubscription {
        CreateSubscription {
            service_name: self
                .service_name
                .clone()
                .unwrap_or_else(|| current.service_name.clone()),
            price: self.price.unwrap_or(current.price),
            user_id: self.user_id.unwrap_or(current.user_id),
            start: self.start.unwrap_or_else(|| current.start_period()),
            end: self.end.or_else(|| current.end_period()),
        }
    }
}

/// Page selection for listing subscriptions. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;
    pub const MAX_SIZE: u32 = 100;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

/// One page of subscriptions plus the total row count.
#[derive(Debug, Clone)]
pub struct SubscriptionPage {
    pub items: Vec<Subscription>,
    pub total: u64,
}

impl SubscriptionPage {
    pub fn total_pages(&self, size: u32) -> u64 {
        self.total.div_ceil(u64::from(size.max(1)))
    }
}
