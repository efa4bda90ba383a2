//! HTTP handlers for subscription-service.

pub mod cost;
pub mod health;
pub mod subscriptions;

use crate::services::{record_error, record_subscription_operation};
use service_core::error::AppError;

/// Count the outcome of a handler under `operation`.
pub(crate) fn observe<T>(
    operation: &'static str,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match &result {
        Ok(_) => record_subscription_operation(operation),
        Err(e) => record_error(e.kind(), operation),
    }
    result
}
