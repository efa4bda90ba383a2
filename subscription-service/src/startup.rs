//! Application startup and lifecycle management.

use crate::config::SubscriptionConfig;
use crate::dtos::{self, cost, subscription};
use crate::handlers;
use crate::services::{init_metrics, Database, SubscriptionStore};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::subscriptions::list_subscriptions,
        handlers::subscriptions::get_subscription,
        handlers::subscriptions::create_subscription,
        handlers::subscriptions::replace_subscription,
        handlers::subscriptions::patch_subscription,
        handlers::subscriptions::delete_subscription,
        handlers::cost::total_cost,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            subscription::SubscriptionRequest,
            subscription::PatchSubscriptionRequest,
            subscription::SubscriptionResponse,
            subscription::SubscriptionListResponse,
            subscription::PaginationInfo,
            subscription::CreatedResponse,
            cost::TotalCostResponse,
        )
    ),
    tags(
        (name = "Subscriptions", description = "Subscription records and cost aggregation"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub store: Arc<dyn SubscriptionStore>,
}

impl AppState {
    pub fn new(service_name: impl Into<String>, store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            service_name: service_name.into(),
            store,
        }
    }
}

/// Build the HTTP router over any store.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/subs",
            get(handlers::subscriptions::list_subscriptions)
                .post(handlers::subscriptions::create_subscription),
        )
        .route("/subs/sub_sum", get(handlers::cost::total_cost))
        .route(
            "/subs/:id",
            get(handlers::subscriptions::get_subscription)
                .put(handlers::subscriptions::replace_subscription)
                .patch(handlers::subscriptions::patch_subscription)
                .delete(handlers::subscriptions::delete_subscription),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api/v1", api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect to PostgreSQL, apply migrations if enabled and bind the listener.
    pub async fn build(config: SubscriptionConfig) -> Result<Self, AppError> {
        init_metrics();

        let options = config.database.connect_options()?;
        let db = Database::connect(
            options,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if config.database.run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let state = AppState::new(config.service_name.clone(), Arc::new(db));
        Self::bind(&config, state).await
    }

    /// Bind the listener for an already constructed state.
    pub async fn bind(config: &SubscriptionConfig, state: AppState) -> Result<Self, AppError> {
        let addr = config.common.address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Subscription service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until `shutdown` completes, then drain in-flight requests.
    pub async fn run_until(self, shutdown: impl Future<Output = ()> + Send + 'static) -> std::io::Result<()> {
        let router = build_router(self.state);

        tracing::info!(
            service = "subscription-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "HTTP server error");
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }

    /// Run the application until the process is stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }
}
