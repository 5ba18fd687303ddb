//! Quota ledger client
//!
//! Talks to the accounts service about per-user question quotas. Reads
//! happen before assembly to decide how many questions a user may still
//! receive; writes happen after assembly, fire-and-forget, so a slow or
//! down accounts service never blocks or fails quiz delivery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const USER_AGENT: &str = "qprep-qa/0.1.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Quota ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Accounts service returned an error response
    #[error("Accounts API error {0}: {1}")]
    Api(u16, String),

    /// Failed to parse accounts service response
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A user's remaining question allowance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Unlimited users are never decremented
    pub unlimited: bool,
    /// Questions left on the plan; meaningless when `unlimited`
    #[serde(default)]
    pub remaining: i64,
}

impl QuotaStatus {
    pub fn unlimited() -> Self {
        Self {
            unlimited: true,
            remaining: 0,
        }
    }
}

/// Ledger operations the assembly engine needs.
#[async_trait]
pub trait QuotaLedger: Send + Sync {
    /// Current allowance for a user.
    async fn status(&self, user_id: Uuid) -> Result<QuotaStatus, LedgerError>;

    /// Record that a user consumed one quiz.
    async fn record_usage(&self, user_id: Uuid) -> Result<(), LedgerError>;
}

/// Ledger backed by the accounts service HTTP API.
pub struct HttpQuotaLedger {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpQuotaLedger {
    pub fn new(base_url: &str) -> Result<Self, LedgerError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl QuotaLedger for HttpQuotaLedger {
    async fn status(&self, user_id: Uuid) -> Result<QuotaStatus, LedgerError> {
        let url = format!("{}/api/users/{}/quota", self.base_url, user_id);
        tracing::debug!(user_id = %user_id, url = %url, "Querying quota status");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LedgerError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::Parse(e.to_string()))
    }

    async fn record_usage(&self, user_id: Uuid) -> Result<(), LedgerError> {
        let url = format!("{}/api/users/{}/quota/consume", self.base_url, user_id);
        tracing::debug!(user_id = %user_id, "Recording quota usage");

        let response = self
            .http_client
            .post(&url)
            .send()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LedgerError::Api(status.as_u16(), error_text));
        }

        Ok(())
    }
}
