//! Domain models for subscription-service.

mod period;
mod subscription;

pub use period::{Period, PeriodError};
pub use subscription::{
    CreateSubscription, PageRequest, Subscription, SubscriptionPage, SubscriptionRecord,
    UpdateSubscription,
};
