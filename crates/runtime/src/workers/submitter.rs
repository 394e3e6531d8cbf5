//! Transaction submission worker.
//!
//! Processes contract calls one at a time in submission order: submit with
//! retries, poll until the chain settles the transaction, then reply to the
//! waiting [`TxHandle`](crate::api::TxHandle).

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use client_blockchain_core::{
    CallKind, ContractCall, ContractClient, TransactionId, TransactionReceipt, TransactionStatus,
};

use crate::account::PendingTransactions;
use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, TransactionEvent, TxSequence};
use crate::runtime::SubmitterConfig;

/// A queued contract call.
pub struct SubmitRequest {
    pub sequence: TxSequence,
    pub call: ContractCall,
    pub reply: oneshot::Sender<Result<TransactionReceipt>>,
}

/// Background task that drives transactions to settlement.
pub struct TransactionWorker {
    client: Arc<dyn ContractClient>,
    config: SubmitterConfig,
    request_rx: mpsc::Receiver<SubmitRequest>,
    event_bus: EventBus,
    pending: Arc<Mutex<PendingTransactions>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TransactionWorker {
    pub fn new(
        client: Arc<dyn ContractClient>,
        config: SubmitterConfig,
        request_rx: mpsc::Receiver<SubmitRequest>,
        event_bus: EventBus,
        pending: Arc<Mutex<PendingTransactions>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        info!(
            "TransactionWorker initialized for {} on {}",
            client.account(),
            client.network()
        );
        Self {
            client,
            config,
            request_rx,
            event_bus,
            pending,
            shutdown_rx,
        }
    }

    /// Main worker loop.
    ///
    /// On shutdown the in-flight transaction and every queued request are
    /// abandoned with [`RuntimeError::ShuttingDown`].
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                request = self.request_rx.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => break,
                },
            }
        }
        self.drain();
        info!("TransactionWorker stopped");
    }

    async fn handle_request(&self, request: SubmitRequest) {
        let SubmitRequest {
            sequence,
            call,
            reply,
        } = request;
        let kind = call.kind();

        let mut shutdown_rx = self.shutdown_rx.clone();
        let result = tokio::select! {
            result = self.process(sequence, call) => result,
            _ = shutdown_signalled(&mut shutdown_rx) => Err(RuntimeError::ShuttingDown),
        };

        self.settle(sequence, kind, result, reply);
    }

    /// Rejects requests still queued when the worker stops.
    fn drain(&mut self) {
        self.request_rx.close();
        while let Ok(SubmitRequest {
            sequence,
            call,
            reply,
        }) = self.request_rx.try_recv()
        {
            self.settle(sequence, call.kind(), Err(RuntimeError::ShuttingDown), reply);
        }
    }

    fn settle(
        &self,
        sequence: TxSequence,
        kind: CallKind,
        result: Result<TransactionReceipt>,
        reply: oneshot::Sender<Result<TransactionReceipt>>,
    ) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .settle(sequence);

        match &result {
            Ok(receipt) => {
                info!(
                    "Transaction #{} ({}) confirmed in block {}",
                    sequence, kind, receipt.block_number
                );
                self.publish(TransactionEvent::Confirmed {
                    sequence,
                    transaction_id: receipt.transaction_id.clone(),
                    block_number: receipt.block_number,
                });
            }
            Err(e) => {
                warn!("Transaction #{} ({}) failed: {}", sequence, kind, e);
                self.publish(TransactionEvent::Failed {
                    sequence,
                    error: e.to_string(),
                });
            }
        }

        if reply.send(result).is_err() {
            debug!("Transaction #{} handle dropped before settlement", sequence);
        }
    }

    async fn process(&self, sequence: TxSequence, call: ContractCall) -> Result<TransactionReceipt> {
        let transaction_id = self.submit_with_retry(sequence, &call).await?;
        self.publish(TransactionEvent::Submitted {
            sequence,
            transaction_id: transaction_id.clone(),
        });

        let block_number = self.await_confirmation(&transaction_id).await?;
        Ok(TransactionReceipt {
            transaction_id,
            block_number,
            call,
        })
    }

    /// Submits `call`, retrying retryable transport errors with linear backoff.
    async fn submit_with_retry(
        &self,
        sequence: TxSequence,
        call: &ContractCall,
    ) -> Result<TransactionId> {
        let mut attempt = 0u32;
        loop {
            match self.client.submit(call).await {
                Ok(transaction_id) => {
                    debug!("Transaction #{} submitted as {}", sequence, transaction_id);
                    return Ok(transaction_id);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "Transaction #{} submit attempt {} failed: {}; retrying",
                        sequence, attempt, e
                    );
                    self.publish(TransactionEvent::Retrying {
                        sequence,
                        attempt,
                        error: e.to_string(),
                    });
                    time::sleep(self.config.retry_backoff * attempt).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Polls the chain until the transaction settles or the timeout passes.
    async fn await_confirmation(&self, transaction_id: &TransactionId) -> Result<u64> {
        let deadline = Instant::now() + self.config.confirmation_timeout;
        loop {
            match self.client.transaction_status(transaction_id).await? {
                TransactionStatus::Confirmed { block_number } => return Ok(block_number),
                TransactionStatus::Failed { reason } => {
                    return Err(RuntimeError::TransactionFailed { reason });
                }
                TransactionStatus::Pending => {}
            }

            if Instant::now() + self.config.confirmation_poll_interval > deadline {
                return Err(RuntimeError::ConfirmationTimeout {
                    timeout_ms: self.config.confirmation_timeout.as_millis() as u64,
                });
            }
            time::sleep(self.config.confirmation_poll_interval).await;
        }
    }

    fn publish(&self, event: TransactionEvent) {
        self.event_bus.publish(Event::Transaction(event));
    }
}

/// Resolves once shutdown is requested or the runtime is gone.
async fn shutdown_signalled(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}
