//! Database service for subscription-service.

use super::store::{unordered_period_error, SubscriptionStore};
use crate::cost::QueryFilter;
use crate::models::{
    CreateSubscription, PageRequest, Subscription, SubscriptionPage, SubscriptionRecord,
    UpdateSubscription,
};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

const SUBSCRIPTION_COLUMNS: &str =
    "id, service_name, price, user_id, start_date, end_date, created_utc, updated_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool from a connection URL.
    #[instrument(skip(database_url), fields(service = "subscription-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        let options = PgConnectOptions::from_str(database_url).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid database URL: {}", e))
        })?;
        Self::connect(options, max_connections, min_connections).await
    }

    /// Create a new database connection pool.
    #[instrument(skip(options), fields(service = "subscription-service"))]
    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for Database {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, page: PageRequest) -> Result<SubscriptionPage, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_subscriptions"])
            .start_timer();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count subscriptions: {}", e))
            })?;

        let items = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.size))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list subscriptions: {}", e))
        })?;

        timer.observe_duration();

        Ok(SubscriptionPage {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<Option<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get subscription: {}", e))
        })?;

        timer.observe_duration();

        Ok(subscription)
    }

    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn create(&self, input: &CreateSubscription) -> Result<Subscription, AppError> {
        if !input.has_ordered_period() {
            return Err(unordered_period_error());
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions (service_name, price, user_id, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(&input.service_name)
        .bind(input.price)
        .bind(input.user_id)
        .bind(input.start.first_day())
        .bind(input.end.map(|end| end.first_day()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create subscription: {}", e))
        })?;

        timer.observe_duration();
        info!(id = subscription.id, service_name = %subscription.service_name, "Subscription created");

        Ok(subscription)
    }

    #[instrument(skip(self, input))]
    async fn replace(
        &self,
        id: i64,
        input: &CreateSubscription,
    ) -> Result<Option<Subscription>, AppError> {
        if !input.has_ordered_period() {
            return Err(unordered_period_error());
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["replace_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET service_name = $2,
                price = $3,
                user_id = $4,
                start_date = $5,
                end_date = $6,
                updated_utc = NOW()
            WHERE id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.service_name)
        .bind(input.price)
        .bind(input.user_id)
        .bind(input.start.first_day())
        .bind(input.end.map(|end| end.first_day()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update subscription: {}", e))
        })?;

        timer.observe_duration();

        Ok(subscription)
    }

    #[instrument(skip(self, input))]
    async fn patch(
        &self,
        id: i64,
        input: &UpdateSubscription,
    ) -> Result<Option<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["patch_subscription"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let current = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to lock subscription: {}", e))
        })?;

        let Some(current) = current else {
            tx.rollback().await.ok();
            return Ok(None);
        };

        let merged = input.merge(&current);
        if !merged.has_ordered_period() {
            tx.rollback().await.ok();
            return Err(unordered_period_error());
        }

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET service_name = $2,
                price = $3,
                user_id = $4,
                start_date = $5,
                end_date = $6,
                updated_utc = NOW()
            WHERE id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&merged.service_name)
        .bind(merged.price)
        .bind(merged.user_id)
        .bind(merged.start.first_day())
        .bind(merged.end.map(|end| end.first_day()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to patch subscription: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        Ok(Some(subscription))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_subscription"])
            .start_timer();

        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete subscription: {}", e))
            })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(id, "Subscription deleted");
        }

        Ok(deleted)
    }

    /// Pushes the window, owner and service predicates into SQL.
    #[instrument(skip(self, filter))]
    async fn fetch_candidates(
        &self,
        filter: &QueryFilter,
    ) -> Result<Vec<SubscriptionRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["fetch_cost_candidates"])
            .start_timer();

        let rows = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE start_date <= $2
              AND (end_date IS NULL OR end_date >= $1)
              AND ($3::uuid IS NULL OR user_id = $3)
              AND ($4::text IS NULL OR LOWER(service_name) = LOWER($4))
            ORDER BY id
            "#
        ))
        .bind(filter.window_start().first_day())
        .bind(filter.window_end().first_day())
        .bind(filter.owner_id())
        .bind(filter.service_name())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch subscriptions: {}", e))
        })?;

        timer.observe_duration();

        rows.into_iter()
            .map(|row| SubscriptionRecord::try_from(row).map_err(AppError::DatabaseError))
            .collect()
    }
}
