use serde::{Deserialize, Serialize};

/// Snapshot returned by the health endpoint. Transient: each probe result
/// supersedes the previous one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub default_healthy: bool,
    pub fallback_healthy: bool,
    pub default_min_response_ms: u64,
    pub fallback_min_response_ms: u64,
    pub next_check_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_health_payload() {
        let health: ServiceHealth = serde_json::from_str(
            r#"{
                "defaultHealthy": true,
                "fallbackHealthy": false,
                "defaultMinResponseMs": 120,
                "fallbackMinResponseMs": 40,
                "nextCheckMs": 5000
            }"#,
        )
        .unwrap();
        assert!(health.default_healthy);
        assert!(!health.fallback_healthy);
        assert_eq!(health.default_min_response_ms, 120);
        assert_eq!(health.next_check_ms, 5000);
    }
}
