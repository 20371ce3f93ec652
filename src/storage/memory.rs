use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::models::payment::{Payment, Processor, Summary};
use crate::storage::{PaymentStore, StoreError};

/// In-process store. Keyed by correlation id, so a duplicate confirmation
/// of a retried payment overwrites its predecessor instead of counting
/// twice, same as the durable backends.
pub struct MemoryStore {
    payments: DashMap<String, Payment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            payments: DashMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.payments.iter().map(|e| e.value().clone()).collect()
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn record(&self, payment: Payment) -> Result<(), StoreError> {
        self.payments
            .insert(payment.correlation_id.clone(), payment);
        Ok(())
    }

    async fn summarize(
        &self,
        processor: Processor,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Summary, StoreError> {
        let mut total_requests = 0u64;
        let mut total_amount = Decimal::ZERO;
        for entry in self.payments.iter() {
            let payment = entry.value();
            if payment.processor == processor
                && payment.requested_at >= from
                && payment.requested_at <= to
            {
                total_requests += 1;
                total_amount += payment.amount;
            }
        }
        Ok(Summary {
            total_requests,
            total_amount: total_amount.round_dp(2),
        })
    }

    async fn purge_all(&self) -> Result<(), StoreError> {
        self.payments.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payment(id: &str, amount: Decimal, at: &str, processor: Processor) -> Payment {
        Payment {
            correlation_id: id.to_string(),
            amount,
            requested_at: at.parse().unwrap(),
            processor,
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .record(payment("a", dec!(10.00), "2025-07-01T10:00:00Z", Processor::Default))
            .await
            .unwrap();
        store
            .record(payment("b", dec!(5.25), "2025-07-01T11:00:00Z", Processor::Default))
            .await
            .unwrap();
        store
            .record(payment("c", dec!(3.50), "2025-07-01T12:00:00Z", Processor::Fallback))
            .await
            .unwrap();
        store
    }

    fn window(from: &str, to: &str) -> (DateTime<Utc>, DateTime<Utc>) {
        (from.parse().unwrap(), to.parse().unwrap())
    }

    #[tokio::test]
    async fn summarize_splits_by_processor_and_window() {
        let store = seeded().await;
        let (from, to) = window("2025-07-01T00:00:00Z", "2025-07-01T23:59:59Z");

        let default = store.summarize(Processor::Default, from, to).await.unwrap();
        assert_eq!(default.total_requests, 2);
        assert_eq!(default.total_amount, dec!(15.25));

        let fallback = store.summarize(Processor::Fallback, from, to).await.unwrap();
        assert_eq!(fallback.total_requests, 1);
        assert_eq!(fallback.total_amount, dec!(3.50));
    }

    #[tokio::test]
    async fn window_bounds_are_inclusive() {
        let store = seeded().await;
        let (from, to) = window("2025-07-01T10:00:00Z", "2025-07-01T11:00:00Z");

        let summary = store.summarize(Processor::Default, from, to).await.unwrap();
        assert_eq!(summary.total_requests, 2);
    }

    #[tokio::test]
    async fn summarize_is_idempotent_without_writes() {
        let store = seeded().await;
        let (from, to) = window("2025-07-01T00:00:00Z", "2025-07-02T00:00:00Z");

        let first = store.summarize(Processor::Default, from, to).await.unwrap();
        let second = store.summarize(Processor::Default, from, to).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn widening_the_window_never_shrinks_totals() {
        let store = seeded().await;
        let (from, to) = window("2025-07-01T10:30:00Z", "2025-07-01T11:30:00Z");
        let narrow = store.summarize(Processor::Default, from, to).await.unwrap();

        let (wide_from, wide_to) = window("2025-07-01T00:00:00Z", "2025-07-02T00:00:00Z");
        let wide = store
            .summarize(Processor::Default, wide_from, wide_to)
            .await
            .unwrap();

        assert!(wide.total_requests >= narrow.total_requests);
        assert!(wide.total_amount >= narrow.total_amount);
    }

    #[tokio::test]
    async fn retried_confirmation_overwrites_by_correlation_id() {
        let store = MemoryStore::new();
        store
            .record(payment("dup", dec!(7.00), "2025-07-01T10:00:00Z", Processor::Default))
            .await
            .unwrap();
        store
            .record(payment("dup", dec!(7.00), "2025-07-01T10:05:00Z", Processor::Fallback))
            .await
            .unwrap();

        let (from, to) = window("2025-07-01T00:00:00Z", "2025-07-02T00:00:00Z");
        let default = store.summarize(Processor::Default, from, to).await.unwrap();
        let fallback = store.summarize(Processor::Fallback, from, to).await.unwrap();
        assert_eq!(default.total_requests + fallback.total_requests, 1);
    }

    #[tokio::test]
    async fn purge_zeroes_every_window() {
        let store = seeded().await;
        store.purge_all().await.unwrap();

        let (from, to) = window("2025-07-01T00:00:00Z", "2025-07-02T00:00:00Z");
        for processor in [Processor::Default, Processor::Fallback] {
            let summary = store.summarize(processor, from, to).await.unwrap();
            assert_eq!(summary.total_requests, 0);
            assert_eq!(summary.total_amount, Decimal::ZERO);
        }
    }

    #[tokio::test]
    async fn totals_are_rounded_to_two_decimal_places() {
        let store = MemoryStore::new();
        store
            .record(payment("x", dec!(0.333), "2025-07-01T10:00:00Z", Processor::Default))
            .await
            .unwrap();
        store
            .record(payment("y", dec!(0.333), "2025-07-01T10:01:00Z", Processor::Default))
            .await
            .unwrap();

        let (from, to) = window("2025-07-01T00:00:00Z", "2025-07-02T00:00:00Z");
        let summary = store.summarize(Processor::Default, from, to).await.unwrap();
        assert_eq!(summary.total_amount, dec!(0.67));
    }
}
