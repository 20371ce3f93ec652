use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use rust_decimal::Decimal;

use crate::models::payment::{Payment, Processor, Summary};
use crate::storage::{PaymentStore, StoreError};

/// Column family holding payments keyed for ordered time-range scans.
const CF_PAYMENTS: &str = "payments";
/// Column family mapping correlation id to its current payment key, so a
/// retried confirmation replaces the earlier record instead of adding a
/// second one.
const CF_CORRELATIONS: &str = "correlations";

/// Durable key/value store. Payment keys are
/// `{processor}:{requested_at_ms:020}:{correlation_id}`, which keeps each
/// processor's records contiguous and ordered by timestamp.
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_correlations = ColumnFamilyDescriptor::new(CF_CORRELATIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_correlations])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &'static str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or(StoreError::MissingColumnFamily(name))
    }

    fn payment_key(payment: &Payment) -> String {
        format!(
            "{}:{:020}:{}",
            payment.processor.as_str(),
            payment.requested_at.timestamp_millis(),
            payment.correlation_id
        )
    }
}

#[async_trait]
impl PaymentStore for RocksStore {
    async fn record(&self, payment: Payment) -> Result<(), StoreError> {
        let cf_payments = self.cf(CF_PAYMENTS)?;
        let cf_correlations = self.cf(CF_CORRELATIONS)?;

        let key = Self::payment_key(&payment);
        let value = serde_json::to_vec(&payment)?;

        let mut batch = WriteBatch::default();
        if let Some(previous) = self
            .db
            .get_cf(&cf_correlations, payment.correlation_id.as_bytes())?
        {
            batch.delete_cf(&cf_payments, previous);
        }
        batch.put_cf(&cf_payments, key.as_bytes(), value);
        batch.put_cf(
            &cf_correlations,
            payment.correlation_id.as_bytes(),
            key.as_bytes(),
        );
        self.db.write(batch)?;
        Ok(())
    }

    async fn summarize(
        &self,
        processor: Processor,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Summary, StoreError> {
        let cf = self.cf(CF_PAYMENTS)?;

        let start = format!("{}:{:020}", processor.as_str(), from.timestamp_millis());
        // ';' sorts after ':', making the bound inclusive of the whole
        // final millisecond.
        let end = format!("{}:{:020};", processor.as_str(), to.timestamp_millis());

        let mut total_requests = 0u64;
        let mut total_amount = Decimal::ZERO;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(start.as_bytes(), Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if key.as_ref() > end.as_bytes() {
                break;
            }
            let payment: Payment = serde_json::from_slice(&value)?;
            total_requests += 1;
            total_amount += payment.amount;
        }

        Ok(Summary {
            total_requests,
            total_amount: total_amount.round_dp(2),
        })
    }

    async fn purge_all(&self) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        for cf_name in [CF_PAYMENTS, CF_CORRELATIONS] {
            let cf = self.cf(cf_name)?;
            for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
                let (key, _) = item?;
                batch.delete_cf(&cf, key);
            }
        }
        self.db.write(batch)?;
        Ok(())
    }
}
