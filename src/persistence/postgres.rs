//! PostgreSQL implementation of the durable store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use sqlx::postgres::PgPoolOptions;

use super::DurableStore;
use super::models::{PaymentRow, PromptRow, SnapshotRow};
use crate::config::DatabaseConfig;
use crate::domain::{EnergyDelta, GlobalSnapshot, PaymentRecord, TrackedEvent};
use crate::error::SapError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from configuration and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] if the database is unreachable or a
    /// migration fails.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, SapError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(db_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| SapError::Persistence(e.to_string()))?;

        tracing::info!(
            max_connections = config.max_connections,
            "connected to postgres"
        );
        Ok(Self::new(pool))
    }
}

/// Latest snapshot; `id` breaks ties between rows with equal timestamps.
const LATEST_SNAPSHOT_SQL: &str = "SELECT total_prompts, total_energy, total_co2, created_at \
     FROM global_stats ORDER BY created_at DESC, id DESC LIMIT 1";

fn db_error(e: sqlx::Error) -> SapError {
    SapError::Persistence(e.to_string())
}

async fn insert_prompt<'e, E>(executor: E, row: &PromptRow) -> Result<(), SapError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO prompt_tracking \
         (id, prompt, model, tokens, energy, co2, user_id, source, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(row.id)
    .bind(&row.prompt)
    .bind(&row.model)
    .bind(row.tokens)
    .bind(row.energy)
    .bind(row.co2)
    .bind(&row.user_id)
    .bind(&row.source)
    .bind(row.created_at)
    .execute(executor)
    .await
    .map_err(db_error)?;
    Ok(())
}

async fn insert_snapshot<'e, E>(executor: E, row: &SnapshotRow) -> Result<(), SapError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO global_stats (total_prompts, total_energy, total_co2, created_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(row.total_prompts)
    .bind(row.total_energy)
    .bind(row.total_co2)
    .bind(row.created_at)
    .execute(executor)
    .await
    .map_err(db_error)?;
    Ok(())
}

#[async_trait]
impl DurableStore for PostgresStore {
    async fn save_event(&self, event: &TrackedEvent, delta: EnergyDelta) -> Result<(), SapError> {
        let row = PromptRow::from_event(event, delta)?;
        insert_prompt(&self.pool, &row).await
    }

    async fn save_snapshot(&self, snapshot: &GlobalSnapshot) -> Result<(), SapError> {
        let row = SnapshotRow::from_snapshot(snapshot)?;
        insert_snapshot(&self.pool, &row).await
    }

    async fn save_tracked(
        &self,
        event: &TrackedEvent,
        delta: EnergyDelta,
        snapshot: &GlobalSnapshot,
    ) -> Result<(), SapError> {
        let prompt = PromptRow::from_event(event, delta)?;
        let snapshot = SnapshotRow::from_snapshot(snapshot)?;

        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        insert_prompt(&mut *tx, &prompt).await?;
        insert_snapshot(&mut *tx, &snapshot).await?;
        tx.commit().await.map_err(db_error)
    }

    async fn latest_snapshot(&self) -> Result<Option<GlobalSnapshot>, SapError> {
        let row = sqlx::query_as::<_, SnapshotRow>(LATEST_SNAPSHOT_SQL)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(SnapshotRow::into_snapshot).transpose()
    }

    async fn save_payment(&self, record: &PaymentRecord) -> Result<(), SapError> {
        let row = PaymentRow::from(record);
        sqlx::query(
            "INSERT INTO user_payments (user_id, type, amount, stripe_session_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&row.user_id)
        .bind(&row.payment_type)
        .bind(row.amount)
        .bind(&row.stripe_session_id)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn payments_for_user(&self, user_id: &str) -> Result<Vec<PaymentRecord>, SapError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT user_id, type, amount, stripe_session_id, created_at FROM user_payments \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(PaymentRow::into_record).collect()
    }
}
