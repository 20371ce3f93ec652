use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /payments`. Lives only until it is enqueued or rejected;
/// the retry path resubmits it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub correlation_id: String,
    pub amount: Decimal,
}

/// Payload sent to a downstream processor. Built fresh on every delivery
/// attempt, so `requested_at` changes across retries of the same request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub correlation_id: String,
    pub amount: Decimal,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Processor {
    Default,
    Fallback,
}

impl Processor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Processor::Default => "default",
            Processor::Fallback => "fallback",
        }
    }
}

/// Confirmed payment as persisted by the store. Written once per successful
/// delivery attempt, tagged with the processor that was active at delivery
/// time; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub correlation_id: String,
    pub amount: Decimal,
    pub requested_at: DateTime<Utc>,
    pub processor: Processor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_requests: u64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub default: Summary,
    pub fallback: Summary,
}

impl SummaryResponse {
    /// Folds a peer instance's totals into this one.
    pub fn merge(&mut self, other: SummaryResponse) {
        self.default.total_requests += other.default.total_requests;
        self.default.total_amount += other.default.total_amount;
        self.fallback.total_requests += other.fallback.total_requests;
        self.fallback.total_amount += other.fallback.total_amount;
    }
}
