//! Cached account state and transactions awaiting confirmation.

use std::collections::BTreeMap;

use client_blockchain_core::ContractCall;
use game_core::{LocationId, WorldCoords};

use crate::events::TxSequence;

/// What the client knows about its own player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountState {
    pub home: Option<WorldCoords>,
    pub home_hash: Option<LocationId>,
}

impl AccountState {
    pub fn has_joined(&self) -> bool {
        self.home.is_some()
    }
}

/// A move submitted but not yet settled on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnconfirmedMove {
    pub sequence: TxSequence,
    pub from: LocationId,
    pub to: LocationId,
    pub forces: u64,
    pub silver: u64,
}

/// An upgrade submitted but not yet settled on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnconfirmedUpgrade {
    pub sequence: TxSequence,
    pub planet: LocationId,
    pub branch: u8,
}

/// Moves and upgrades keyed by submission sequence.
#[derive(Debug, Default)]
pub struct PendingTransactions {
    moves: BTreeMap<TxSequence, UnconfirmedMove>,
    upgrades: BTreeMap<TxSequence, UnconfirmedUpgrade>,
}

impl PendingTransactions {
    /// Tracks `call` if it is a kind the façade reports as unconfirmed.
    pub fn track(&mut self, sequence: TxSequence, call: &ContractCall) {
        match *call {
            ContractCall::Move {
                from,
                to,
                forces,
                silver,
            } => {
                self.moves.insert(
                    sequence,
                    UnconfirmedMove {
                        sequence,
                        from,
                        to,
                        forces,
                        silver,
                    },
                );
            }
            ContractCall::Upgrade { planet, branch } => {
                self.upgrades.insert(
                    sequence,
                    UnconfirmedUpgrade {
                        sequence,
                        planet,
                        branch,
                    },
                );
            }
            _ => {}
        }
    }

    pub fn settle(&mut self, sequence: TxSequence) {
        self.moves.remove(&sequence);
        self.upgrades.remove(&sequence);
    }

    pub fn moves(&self) -> Vec<UnconfirmedMove> {
        self.moves.values().cloned().collect()
    }

    pub fn upgrades(&self) -> Vec<UnconfirmedUpgrade> {
        self.upgrades.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> LocationId {
        LocationId([byte; 32])
    }

    #[test]
    fn only_moves_and_upgrades_are_tracked() {
        let mut pending = PendingTransactions::default();
        pending.track(
            0,
            &ContractCall::Move {
                from: id(1),
                to: id(2),
                forces: 100,
                silver: 0,
            },
        );
        pending.track(1, &ContractCall::Upgrade { planet: id(1), branch: 2 });
        pending.track(2, &ContractCall::BuyHat { planet: id(1) });

        assert_eq!(pending.moves().len(), 1);
        assert_eq!(pending.upgrades()[0].branch, 2);

        pending.settle(0);
        pending.settle(2);
        assert!(pending.moves().is_empty());
        assert_eq!(pending.upgrades().len(), 1);
    }
}
