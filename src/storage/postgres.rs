use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::models::payment::{Payment, Processor, Summary};
use crate::storage::{PaymentStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS payments (
    correlation_id TEXT PRIMARY KEY,
    amount         NUMERIC(20, 2) NOT NULL,
    requested_at   TIMESTAMPTZ NOT NULL,
    processor      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS payments_processor_requested_at
    ON payments (processor, requested_at);
"#;

/// Relational store. The primary key on `correlation_id` gives the same
/// replace-on-retry behavior as the other backends, via upsert.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl PaymentStore for PostgresStore {
    async fn record(&self, payment: Payment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO payments (correlation_id, amount, requested_at, processor)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (correlation_id) DO UPDATE
                SET amount = EXCLUDED.amount,
                    requested_at = EXCLUDED.requested_at,
                    processor = EXCLUDED.processor
            "#,
        )
        .bind(&payment.correlation_id)
        .bind(payment.amount)
        .bind(payment.requested_at)
        .bind(payment.processor.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn summarize(
        &self,
        processor: Processor,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Summary, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_requests,
                   COALESCE(SUM(amount), 0) AS total_amount
            FROM payments
            WHERE processor = $1 AND requested_at BETWEEN $2 AND $3
            "#,
        )
        .bind(processor.as_str())
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let total_requests: i64 = row.get("total_requests");
        let total_amount: Decimal = row.get("total_amount");
        Ok(Summary {
            total_requests: total_requests as u64,
            total_amount: total_amount.round_dp(2),
        })
    }

    async fn purge_all(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM payments")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
