//! Common types for contract interactions.

use std::fmt;

use game_core::LocationId;
use serde::{Deserialize, Serialize};
use strum::Display;

/// 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EthAddress(pub [u8; 20]);

impl EthAddress {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self)
    }
}

/// Identifier of an artifact minted by the game contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub u64);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifact#{}", self.0)
    }
}

/// Generic transaction identifier (chain-specific hash bytes).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Vec<u8>);

impl TransactionId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self)
    }
}

/// Transaction status on the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Transaction is pending in mempool
    Pending,

    /// Transaction is confirmed on-chain
    Confirmed { block_number: u64 },

    /// Transaction reverted on-chain
    Failed { reason: String },
}

/// Discriminant of [`ContractCall`], used for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum CallKind {
    JoinGame,
    Move,
    Upgrade,
    BuyHat,
    FindArtifact,
    DepositArtifact,
    WithdrawArtifact,
}

/// A state-changing call on the game contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCall {
    /// Claim a home planet and join the round.
    JoinGame { home: LocationId },

    /// Send energy (and optionally silver) between planets.
    Move {
        from: LocationId,
        to: LocationId,
        forces: u64,
        silver: u64,
    },

    /// Upgrade a planet along one of the three branches.
    Upgrade { planet: LocationId, branch: u8 },

    BuyHat { planet: LocationId },

    /// Dig up the artifact buried on a planet.
    FindArtifact { planet: LocationId },

    DepositArtifact {
        planet: LocationId,
        artifact: ArtifactId,
    },

    WithdrawArtifact { planet: LocationId },
}

impl ContractCall {
    pub fn kind(&self) -> CallKind {
        match self {
            ContractCall::JoinGame { .. } => CallKind::JoinGame,
            ContractCall::Move { .. } => CallKind::Move,
            ContractCall::Upgrade { .. } => CallKind::Upgrade,
            ContractCall::BuyHat { .. } => CallKind::BuyHat,
            ContractCall::FindArtifact { .. } => CallKind::FindArtifact,
            ContractCall::DepositArtifact { .. } => CallKind::DepositArtifact,
            ContractCall::WithdrawArtifact { .. } => CallKind::WithdrawArtifact,
        }
    }
}

/// Receipt of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: TransactionId,
    pub block_number: u64,
    pub call: ContractCall,
}
