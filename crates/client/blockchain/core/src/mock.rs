//! Mock contract client for testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::traits::{ContractClient, ContractTransport, TransportError};
use crate::types::{CallKind, ContractCall, EthAddress, TransactionId, TransactionStatus};

#[derive(Default)]
struct MockState {
    submitted: Vec<ContractCall>,
    /// Remaining pending polls per transaction.
    pending: HashMap<TransactionId, u32>,
    reverted: HashSet<TransactionId>,
    network_failures: u32,
    counter: u64,
    block: u64,
}

/// Mock contract client for testing without network.
///
/// Simulates submission and confirmation in-memory.
#[derive(Clone)]
pub struct MockContractClient {
    state: Arc<Mutex<MockState>>,
    account: EthAddress,
    confirm_after_polls: u32,
    revert_kinds: Arc<HashSet<CallKind>>,
}

impl MockContractClient {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            account: EthAddress([0x11; 20]),
            confirm_after_polls: 0,
            revert_kinds: Arc::new(HashSet::new()),
        }
    }

    /// Transactions report `Pending` for `polls` status queries before confirming.
    pub fn confirm_after(mut self, polls: u32) -> Self {
        self.confirm_after_polls = polls;
        self
    }

    /// The next `count` submissions fail with a retryable network error.
    pub fn fail_next_submissions(self, count: u32) -> Self {
        self.lock().network_failures = count;
        self
    }

    /// Calls of this kind are mined but revert.
    pub fn revert_on(mut self, kind: CallKind) -> Self {
        let mut kinds = (*self.revert_kinds).clone();
        kinds.insert(kind);
        self.revert_kinds = Arc::new(kinds);
        self
    }

    /// Calls accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<ContractCall> {
        self.lock().submitted.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MockContractClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractTransport for MockContractClient {
    async fn submit(&self, call: &ContractCall) -> Result<TransactionId, TransportError> {
        let mut state = self.lock();

        if state.network_failures > 0 {
            state.network_failures -= 1;
            return Err(TransportError::NetworkError("connection reset".to_string()));
        }

        state.counter += 1;
        let tx_id = TransactionId::from_bytes(state.counter.to_be_bytes().to_vec());
        state.submitted.push(call.clone());
        state.pending.insert(tx_id.clone(), self.confirm_after_polls);
        if self.revert_kinds.contains(&call.kind()) {
            state.reverted.insert(tx_id.clone());
        }

        tracing::debug!("mock submitted {} as {}", call.kind(), tx_id);
        Ok(tx_id)
    }

    async fn transaction_status(
        &self,
        tx_id: &TransactionId,
    ) -> Result<TransactionStatus, TransportError> {
        let mut state = self.lock();
        let remaining = state
            .pending
            .get_mut(tx_id)
            .ok_or_else(|| TransportError::TransactionNotFound(tx_id.clone()))?;

        if *remaining > 0 {
            *remaining -= 1;
            return Ok(TransactionStatus::Pending);
        }

        if state.reverted.contains(tx_id) {
            return Ok(TransactionStatus::Failed {
                reason: "execution reverted".to_string(),
            });
        }

        state.block += 1;
        Ok(TransactionStatus::Confirmed {
            block_number: state.block,
        })
    }
}

impl ContractClient for MockContractClient {
    fn account(&self) -> EthAddress {
        self.account
    }

    fn contract_address(&self) -> EthAddress {
        EthAddress([0xdf; 20])
    }

    fn network(&self) -> &str {
        "mock-network"
    }
}

#[cfg(test)]
mod tests {
    use game_core::{LocationId, WorldCoords};

    use super::*;

    fn join_call() -> ContractCall {
        ContractCall::JoinGame {
            home: LocationId::of(WorldCoords::new(1, 2), 0),
        }
    }

    #[tokio::test]
    async fn confirms_after_configured_polls() {
        let client = MockContractClient::new().confirm_after(2);
        let tx = client.submit(&join_call()).await.unwrap();

        assert_eq!(
            client.transaction_status(&tx).await.unwrap(),
            TransactionStatus::Pending
        );
        assert_eq!(
            client.transaction_status(&tx).await.unwrap(),
            TransactionStatus::Pending
        );
        assert!(matches!(
            client.transaction_status(&tx).await.unwrap(),
            TransactionStatus::Confirmed { .. }
        ));
        assert_eq!(client.submitted(), vec![join_call()]);
    }

    #[tokio::test]
    async fn network_failures_are_retryable() {
        let client = MockContractClient::new().fail_next_submissions(1);
        let err = client.submit(&join_call()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(client.submit(&join_call()).await.is_ok());
        assert_eq!(client.submitted().len(), 1);
    }

    #[tokio::test]
    async fn reverted_kinds_fail_on_chain() {
        let client = MockContractClient::new().revert_on(CallKind::JoinGame);
        let tx = client.submit(&join_call()).await.unwrap();
        assert!(matches!(
            client.transaction_status(&tx).await.unwrap(),
            TransactionStatus::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn unknown_transaction_is_reported() {
        let client = MockContractClient::new();
        let missing = TransactionId::from_bytes(vec![9]);
        assert_eq!(
            client.transaction_status(&missing).await,
            Err(TransportError::TransactionNotFound(missing.clone()))
        );
    }
}
