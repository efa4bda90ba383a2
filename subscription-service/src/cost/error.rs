use crate::models::{Period, PeriodError};
use service_core::error::AppError;
use thiserror::Error;

/// Failures of a cost query. Everything but `AggregationUnavailable` is a
/// caller error detected before any subscription is read.
#[derive(Debug, Error)]
pub enum CostError {
    #[error("invalid {field} '{value}': expected MM-YYYY")]
    InvalidFormat { field: &'static str, value: String },

    #[error("invalid {field} '{value}': month must be between 01 and 12")]
    InvalidMonth { field: &'static str, value: String },

    #[error("window start {start} is after window end {end}")]
    InvertedWindow { start: Period, end: Period },

    #[error("invalid owner id '{0}'")]
    InvalidOwnerId(String),

    #[error("subscriptions unavailable: {0}")]
    AggregationUnavailable(#[source] anyhow::Error),
}

impl CostError {
    /// Attach the name of the query field that failed to parse.
    pub fn from_period(field: &'static str, err: PeriodError) -> Self {
        match err {
            PeriodError::InvalidFormat(value) => CostError::InvalidFormat { field, value },
            PeriodError::InvalidMonth(value) => CostError::InvalidMonth { field, value },
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CostError::InvalidFormat { .. } => "invalid_format",
            CostError::InvalidMonth { .. } => "invalid_month",
            CostError::InvertedWindow { .. } => "inverted_window",
            CostError::InvalidOwnerId(_) => "invalid_owner_id",
            CostError::AggregationUnavailable(_) => "aggregation_unavailable",
        }
    }
}

impl From<CostError> for AppError {
    fn from(err: CostError) -> Self {
        match err {
            CostError::AggregationUnavailable(source) => AppError::UnprocessableEntity(
                source.context("Cannot calculate sum of subscriptions"),
            ),
            other => AppError::BadRequest(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_errors_carry_field_name() {
        let err = CostError::from_period(
            "startDate",
            PeriodError::InvalidMonth("13-2025".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "invalid startDate '13-2025': month must be between 01 and 12"
        );
    }

    #[test]
    fn validation_errors_become_bad_requests() {
        let app_err = AppError::from(CostError::InvalidOwnerId("nope".to_string()));
        assert!(matches!(app_err, AppError::BadRequest(_)));
    }

    #[test]
    fn unavailable_becomes_unprocessable() {
        let app_err = AppError::from(CostError::AggregationUnavailable(anyhow::anyhow!(
            "connection reset"
        )));
        match app_err {
            AppError::UnprocessableEntity(err) => {
                assert_eq!(err.to_string(), "Cannot calculate sum of subscriptions");
                assert_eq!(err.chain().nth(1).unwrap().to_string(), "connection reset");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
