//! Subscription CRUD handlers.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use service_core::utils::ValidatedJson;

use super::observe;
use crate::dtos::subscription::{
    CreatedResponse, ListParams, PaginationInfo, PatchSubscriptionRequest,
    SubscriptionListResponse, SubscriptionRequest, SubscriptionResponse,
};
use crate::dtos::{ErrorResponse, MessageResponse};
use crate::models::PageRequest;
use crate::AppState;

fn not_found(id: i64) -> AppError {
    AppError::NotFound(anyhow::anyhow!("subscription {} not found", id))
}

fn page_request(params: &ListParams) -> Result<PageRequest, AppError> {
    let page = params.page.unwrap_or(1);
    let size = params.size.unwrap_or(i64::from(PageRequest::DEFAULT_SIZE));

    if page < 1 {
        return Err(AppError::BadRequest(anyhow::anyhow!("page must be at least 1")));
    }
    if size < 1 {
        return Err(AppError::BadRequest(anyhow::anyhow!("size must be at least 1")));
    }

    Ok(PageRequest::new(
        u32::try_from(page).unwrap_or(u32::MAX),
        u32::try_from(size).unwrap_or(u32::MAX),
    ))
}

/// List subscriptions page by page
#[utoipa::path(
    get,
    path = "/api/v1/subs",
    params(ListParams),
    responses(
        (status = 200, description = "Page of subscriptions", body = SubscriptionListResponse),
        (status = 400, description = "Invalid page or size", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<SubscriptionListResponse>, AppError> {
    let result: Result<SubscriptionListResponse, AppError> = async {
        let Query(params) = query?;
        let request = page_request(&params)?;
        let page = state.store.list(request).await?;

        let total_pages = page.total_pages(request.size);
        let current = u64::from(request.page);

        Ok(SubscriptionListResponse {
            pagination: PaginationInfo {
                page_number: request.page,
                size: request.size,
                total_pages,
                has_next: current < total_pages,
                has_prev: current > 1 && total_pages > 0,
            },
            subscriptions: page.items.into_iter().map(SubscriptionResponse::from).collect(),
        })
    }
    .await;

    observe("list", result).map(Json)
}

/// Get a subscription by id
#[utoipa::path(
    get,
    path = "/api/v1/subs/{id}",
    params(("id" = i64, Path, description = "Subscription id")),
    responses(
        (status = 200, description = "Subscription found", body = SubscriptionResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let result: Result<SubscriptionResponse, AppError> = async {
        let Path(id) = path?;
        state
            .store
            .get(id)
            .await?
            .map(SubscriptionResponse::from)
            .ok_or_else(|| not_found(id))
    }
    .await;

    observe("get", result).map(Json)
}

/// Create a subscription
#[utoipa::path(
    post,
    path = "/api/v1/subs",
    request_body = SubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = CreatedResponse),
        (status = 400, description = "Malformed body or inverted period", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    body: Result<ValidatedJson<SubscriptionRequest>, AppError>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let result: Result<CreatedResponse, AppError> = async {
        let ValidatedJson(req) = body?;
        let input = req.into_input()?;
        let created = state.store.create(&input).await?;
        Ok(CreatedResponse { id: created.id })
    }
    .await;

    observe("create", result).map(|created| (StatusCode::CREATED, Json(created)))
}

/// Replace every field of a subscription
#[utoipa::path(
    put,
    path = "/api/v1/subs/{id}",
    params(("id" = i64, Path, description = "Subscription id")),
    request_body = SubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = MessageResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn replace_subscription(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<ValidatedJson<SubscriptionRequest>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    let result: Result<MessageResponse, AppError> = async {
        let Path(id) = path?;
        let ValidatedJson(req) = body?;
        let input = req.into_input()?;
        state.store.replace(id, &input).await?.ok_or_else(|| not_found(id))?;
        Ok(MessageResponse::new("subscription updated"))
    }
    .await;

    observe("replace", result).map(Json)
}

/// Update selected fields of a subscription
#[utoipa::path(
    patch,
    path = "/api/v1/subs/{id}",
    params(("id" = i64, Path, description = "Subscription id")),
    request_body = PatchSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = MessageResponse),
        (status = 400, description = "Malformed request or inverted period", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn patch_subscription(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<ValidatedJson<PatchSubscriptionRequest>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    let result: Result<MessageResponse, AppError> = async {
        let Path(id) = path?;
        let ValidatedJson(req) = body?;
        let update = req.into_update()?;
        state.store.patch(id, &update).await?.ok_or_else(|| not_found(id))?;
        Ok(MessageResponse::new("subscription updated"))
    }
    .await;

    observe("patch", result).map(Json)
}

/// Delete a subscription
#[utoipa::path(
    delete,
    path = "/api/v1/subs/{id}",
    params(("id" = i64, Path, description = "Subscription id")),
    responses(
        (status = 200, description = "Subscription deleted", body = MessageResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn delete_subscription(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let result: Result<MessageResponse, AppError> = async {
        let Path(id) = path?;
        if !state.store.delete(id).await? {
            return Err(not_found(id));
        }
        Ok(MessageResponse::new("subscription deleted"))
    }
    .await;

    observe("delete", result).map(Json)
}
