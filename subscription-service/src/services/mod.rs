//! Services module for subscription-service.

pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::Database;
pub use memory::InMemoryStore;
pub use metrics::{
    get_metrics, init_metrics, record_cost_query, record_error, record_subscription_operation,
};
pub use store::SubscriptionStore;
