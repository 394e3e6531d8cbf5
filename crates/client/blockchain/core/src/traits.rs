//! Contract client abstraction.
//!
//! This module defines a layered abstraction:
//! - Layer 0: ContractTransport (submit calls, query transactions)
//! - Layer 1: ContractClient (transport plus account identity)

use async_trait::async_trait;

use crate::types::{ContractCall, EthAddress, TransactionId, TransactionStatus};

// ============================================================================
// Error Types
// ============================================================================

/// Transport layer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Insufficient gas: required {required}, available {available}")]
    InsufficientGas { required: u64, available: u64 },

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Backend-specific error: {0}")]
    BackendError(String),
}

impl TransportError {
    /// Whether resubmitting the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::NetworkError(_))
    }
}

// ============================================================================
// Layer 0: Pure Infrastructure
// ============================================================================

/// Low-level contract transport without account knowledge.
#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// Submit a call to the game contract.
    async fn submit(&self, call: &ContractCall) -> Result<TransactionId, TransportError>;

    /// Query transaction status.
    async fn transaction_status(
        &self,
        tx_id: &TransactionId,
    ) -> Result<TransactionStatus, TransportError>;

    /// Health check: verify connection to the chain.
    async fn health_check(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

// ============================================================================
// Layer 1: Composite
// ============================================================================

/// Everything the game manager needs from the chain.
pub trait ContractClient: ContractTransport {
    /// Address of the account signing transactions.
    fn account(&self) -> EthAddress;

    /// Address of the game contract.
    fn contract_address(&self) -> EthAddress;

    /// Network name (e.g., "mainnet", "local").
    fn network(&self) -> &str;
}
