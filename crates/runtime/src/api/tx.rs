use tokio::sync::oneshot;

use client_blockchain_core::{CallKind, TransactionReceipt};

use super::errors::{Result, RuntimeError};
use crate::events::TxSequence;

/// Awaitable handle to a queued contract call.
///
/// Dropping the handle does not cancel the transaction; it only discards the
/// receipt. Progress is also published on [`Topic::Transaction`](crate::Topic).
#[derive(Debug)]
pub struct TxHandle {
    sequence: TxSequence,
    kind: CallKind,
    receipt_rx: oneshot::Receiver<Result<TransactionReceipt>>,
}

impl TxHandle {
    pub(crate) fn new(
        sequence: TxSequence,
        kind: CallKind,
        receipt_rx: oneshot::Receiver<Result<TransactionReceipt>>,
    ) -> Self {
        Self {
            sequence,
            kind,
            receipt_rx,
        }
    }

    pub fn sequence(&self) -> TxSequence {
        self.sequence
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// Waits until the transaction is confirmed or fails.
    pub async fn wait(self) -> Result<TransactionReceipt> {
        self.receipt_rx
            .await
            .map_err(RuntimeError::ReplyChannelClosed)?
    }
}
