use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string of `GET /api/v1/subs/sub_sum`.
///
/// Fields stay raw text so that malformed values are reported by the cost
/// query validation with the name of the offending field.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CostQueryParams {
    /// First month of the window, `MM-YYYY`.
    #[serde(rename = "startDate", default)]
    #[param(example = "01-2025")]
    pub start_date: String,

    /// Last month of the window, `MM-YYYY`.
    #[serde(rename = "endDate", default)]
    #[param(example = "03-2025")]
    pub end_date: String,

    #[serde(rename = "userID")]
    #[param(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: Option<String>,

    #[serde(rename = "serviceName")]
    #[param(example = "Yandex Plus")]
    pub service_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalCostResponse {
    #[schema(example = 1200)]
    pub total_sum: u64,
}
