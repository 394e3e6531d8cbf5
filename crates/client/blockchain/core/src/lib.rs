//! Contract abstraction layer for the game client.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: ContractClient (transport + account identity)
//!
//! Layer 0: ContractTransport (submit calls, query transactions)
//! ```
//!
//! Concrete chain bindings live outside this workspace; the runtime only
//! talks to `dyn ContractClient`.
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::{ContractCall, ContractClient};
//!
//! async fn join(client: &dyn ContractClient, home: LocationId) {
//!     let tx = client.submit(&ContractCall::JoinGame { home }).await?;
//!     let status = client.transaction_status(&tx).await?;
//! }
//! ```

pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use traits::{ContractClient, ContractTransport, TransportError};

pub use types::{
    ArtifactId, CallKind, ContractCall, EthAddress, TransactionId, TransactionReceipt,
    TransactionStatus,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockContractClient;
