//! Cost aggregation handler.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::cost::{compute_total_cost, QueryFilter};
use crate::dtos::cost::{CostQueryParams, TotalCostResponse};
use crate::dtos::ErrorResponse;
use crate::services::{record_cost_query, record_error};
use crate::AppState;

/// Total cost of subscriptions active within a window of months
#[utoipa::path(
    get,
    path = "/api/v1/subs/sub_sum",
    params(CostQueryParams),
    responses(
        (status = 200, description = "Sum of prices over the window", body = TotalCostResponse),
        (status = 400, description = "Invalid window or owner id", body = ErrorResponse),
        (status = 422, description = "Cannot calculate sum of subscriptions", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn total_cost(
    State(state): State<AppState>,
    query: Result<Query<CostQueryParams>, QueryRejection>,
) -> Result<Json<TotalCostResponse>, AppError> {
    let Query(params) = query.inspect_err(|_| record_cost_query("rejected"))?;

    let filter = QueryFilter::parse(
        &params.start_date,
        &params.end_date,
        params.user_id.as_deref(),
        params.service_name.as_deref(),
    )
    .inspect_err(|e| {
        record_cost_query("rejected");
        record_error(e.kind(), "sub_sum");
    })?;

    let total_sum = compute_total_cost(state.store.as_ref(), &filter)
        .await
        .inspect_err(|e| record_error(e.kind(), "sub_sum"))?;

    Ok(Json(TotalCostResponse { total_sum }))
}
