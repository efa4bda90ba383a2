use crate::models::{CreateSubscription, Period, Subscription, UpdateSubscription};
use crate::services::store::unordered_period_error;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_period(value: &str) -> Result<(), ValidationError> {
    Period::parse(value).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("period");
        err.message = Some(e.to_string().into());
        err
    })
}

fn parse_period(value: &str) -> Result<Period, AppError> {
    Period::parse(value).map_err(|e| AppError::BadRequest(anyhow::Error::new(e)))
}

/// Body of `POST /api/v1/subs` and `PUT /api/v1/subs/{id}`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubscriptionRequest {
    #[validate(length(min = 1, message = "service_name is required"))]
    #[schema(example = "Yandex Plus")]
    pub service_name: String,

    #[validate(range(min = 1, message = "price must be at least 1"))]
    #[schema(example = 400, minimum = 1)]
    pub price: i64,

    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: Uuid,

    #[validate(custom(function = "validate_period"))]
    #[schema(example = "07-2025")]
    pub start_date: String,

    #[validate(custom(function = "validate_period"))]
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

impl SubscriptionRequest {
    pub fn into_input(self) -> Result<CreateSubscription, AppError> {
        let input = CreateSubscription {
            start: parse_period(&self.start_date)?,
            end: self.end_date.as_deref().map(parse_period).transpose()?,
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
        };

        if !input.has_ordered_period() {
            return Err(unordered_period_error());
        }
        Ok(input)
    }
}

/// Body of `PATCH /api/v1/subs/{id}`. Absent fields keep their value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct PatchSubscriptionRequest {
    #[validate(length(min = 1, message = "service_name must not be empty"))]
    pub service_name: Option<String>,

    #[validate(range(min = 1, message = "price must be at least 1"))]
    pub price: Option<i64>,

    pub user_id: Option<Uuid>,

    #[validate(custom(function = "validate_period"))]
    pub start_date: Option<String>,

    #[validate(custom(function = "validate_period"))]
    pub end_date: Option<String>,
}

impl PatchSubscriptionRequest {
    pub fn into_update(self) -> Result<UpdateSubscription, AppError> {
        let update = UpdateSubscription {
            start: self.start_date.as_deref().map(parse_period).transpose()?,
            end: self.end_date.as_deref().map(parse_period).transpose()?,
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
        };

        if update.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("no fields to update")));
        }
        if let (Some(start), Some(end)) = (update.start, update.end) {
            if start > end {
                return Err(unordered_period_error());
            }
        }
        Ok(update)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[schema(example = 400)]
    pub price: i64,
    pub user_id: Uuid,
    #[schema(example = "07-2025")]
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            start_date: sub.start_period().to_string(),
            end_date: sub.end_period().map(|end| end.to_string()),
            id: sub.id,
            service_name: sub.service_name,
            price: sub.price,
            user_id: sub.user_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    #[schema(example = 1)]
    pub id: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number, default 1.
    pub page: Option<i64>,
    /// Page size, default 10, capped at 100.
    pub size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginationInfo {
    pub page_number: u32,
    pub size: u32,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
    pub pagination: PaginationInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: &str, end: Option<&str>) -> SubscriptionRequest {
        SubscriptionRequest {
            service_name: "Netflix".to_string(),
            price: 100,
            user_id: Uuid::new_v4(),
            start_date: start.to_string(),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn valid_request_converts() {
        let req = request("01-2025", Some("03-2025"));
        assert!(req.validate().is_ok());
        let input = req.into_input().unwrap();
        assert_eq!(input.start.to_string(), "01-2025");
        assert_eq!(input.end.map(|p| p.to_string()).as_deref(), Some("03-2025"));
    }

    #[test]
    fn bad_period_fails_validation() {
        let err = request("2025-01", None).validate().unwrap_err();
        assert!(err.field_errors().contains_key("start_date"));

        let err = request("01-2025", Some("13-2025")).validate().unwrap_err();
        assert!(err.field_errors().contains_key("end_date"));
    }

    #[test]
    fn zero_price_fails_validation() {
        let mut req = request("01-2025", None);
        req.price = 0;
        assert!(req.validate().unwrap_err().field_errors().contains_key("price"));
    }

    #[test]
    fn end_before_start_is_bad_request() {
        let err = request("05-2025", Some("04-2025")).into_input().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = PatchSubscriptionRequest::default().into_update().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn response_renders_periods_as_text() {
        let now = chrono::Utc::now();
        let sub = Subscription {
            id: 3,
            service_name: "Netflix".to_string(),
            price: 100,
            user_id: Uuid::nil(),
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            end_date: None,
            created_utc: now,
            updated_utc: now,
        };

        let json = serde_json::to_value(SubscriptionResponse::from(sub)).unwrap();
        assert_eq!(json["start_date"], "07-2025");
        assert!(json.get("end_date").is_none());
    }
}
