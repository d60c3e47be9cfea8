use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::RateError;
use crate::model::RateInterval;

/// Storage contract for rate intervals.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// The interval with the greatest `valid_to`, if any.
    async fn find_latest(&self) -> Result<Option<RateInterval>, RateError>;

    /// The interval whose validity window contains `on`. If overlapping
    /// windows ever exist the most recent effective date wins.
    async fn find_active(&self, on: NaiveDate) -> Result<Option<RateInterval>, RateError>;

    /// Inserts the interval, or updates only `rate` when an interval for
    /// this effective date already exists. A single atomic statement, so
    /// concurrent runs for the same day cannot produce duplicates.
    async fn upsert(
        &self,
        effective_date: NaiveDate,
        rate: Decimal,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
    ) -> Result<RateInterval, RateError>;
}

/// Storage contract for the named key/value parameters.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Writes or overwrites the parameter atomically.
    async fn upsert_parameter(&self, key: &str, value: &str) -> Result<(), RateError>;
}

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn find_latest(&self) -> Result<Option<RateInterval>, RateError> {
        let interval = sqlx::query_as::<_, RateInterval>(
            "SELECT id, effective_date, rate, valid_from, valid_to
             FROM bcv_rates
             ORDER BY valid_to DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(interval)
    }

    async fn find_active(&self, on: NaiveDate) -> Result<Option<RateInterval>, RateError> {
        let interval = sqlx::query_as::<_, RateInterval>(
            "SELECT id, effective_date, rate, valid_from, valid_to
             FROM bcv_rates
             WHERE valid_from <= $1 AND valid_to >= $1
             ORDER BY effective_date DESC
             LIMIT 1",
        )
        .bind(on)
        .fetch_optional(&self.pool)
        .await?;

        Ok(interval)
    }

    async fn upsert(
        &self,
        effective_date: NaiveDate,
        rate: Decimal,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
    ) -> Result<RateInterval, RateError> {
        // Window columns are deliberately absent from the UPDATE arm:
        // they are fixed at creation.
        let interval = sqlx::query_as::<_, RateInterval>(
            "INSERT INTO bcv_rates (effective_date, rate, valid_from, valid_to)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (effective_date) DO UPDATE SET rate = EXCLUDED.rate
             RETURNING id, effective_date, rate, valid_from, valid_to",
        )
        .bind(effective_date)
        .bind(rate)
        .bind(valid_from)
        .bind(valid_to)
        .fetch_one(&self.pool)
        .await?;

        Ok(interval)
    }
}

#[async_trait]
impl ParameterStore for PgRateStore {
    async fn upsert_parameter(&self, key: &str, value: &str) -> Result<(), RateError> {
        sqlx::query(
            "INSERT INTO parameters (key, value)
             VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
