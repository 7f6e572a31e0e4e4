//! Stability Pool Events
//!
//! Every committed state transition appends typed events to an [`EventLog`].
//! Events are the pool's audit trail and can be indexed off-chain.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::math::U256;
use crate::types::{Address, Amount};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Depositor Events (0x20 - 0x2F)
    DepositOperation = 0x20,
    DepositUpdated = 0x21,

    // Ledger Events (0x30 - 0x3F)
    LiquidationOffset = 0x30,
    ScaleUpdated = 0x31,
    EpochUpdated = 0x32,
    YieldDistributed = 0x33,
}

/// Depositor operation that produced a [`BoldEvent::DepositOperation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum DepositOperationKind {
    Provide,
    Withdraw,
    ClaimAllCollateral,
}

/// Main event enum containing all Stability Pool events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum BoldEvent {
    // ============ Depositor Events ============

    /// Emitted once per provide/withdraw/claim
    DepositOperation {
        depositor: Address,
        operation: DepositOperationKind,
        /// Principal lost to offsets since the previous snapshot
        deposit_loss: Amount,
        top_up: Amount,
        withdrawal: Amount,
        yield_gain_since_last_op: Amount,
        yield_gain_claimed: Amount,
        coll_gain_since_last_op: Amount,
        coll_gain_claimed: Amount,
    },

    /// Emitted whenever a deposit and its snapshot are rewritten
    DepositUpdated {
        depositor: Address,
        new_deposit: Amount,
        stashed_coll: Amount,
        snapshot_p: u128,
        snapshot_s: U256,
        snapshot_b: U256,
        snapshot_scale: u64,
        snapshot_epoch: u64,
    },

    // ============ Ledger Events ============

    /// Emitted when the pool absorbs liquidated debt
    LiquidationOffset {
        debt_offset: Amount,
        collateral_gained: Amount,
        new_total_deposits: Amount,
        new_p: u128,
    },

    /// Emitted when P is rescaled by SCALE_FACTOR
    ScaleUpdated { scale: u64 },

    /// Emitted when the pool is emptied and a new epoch starts
    EpochUpdated { epoch: u64 },

    /// Emitted on every yield notification, attributed or not
    YieldDistributed {
        amount: Amount,
        /// False when the pool was below the dust threshold and B was left untouched
        attributed: bool,
        new_yield_gains_owed: Amount,
    },
}

impl BoldEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::DepositOperation { .. } => EventType::DepositOperation,
            Self::DepositUpdated { .. } => EventType::DepositUpdated,
            Self::LiquidationOffset { .. } => EventType::LiquidationOffset,
            Self::ScaleUpdated { .. } => EventType::ScaleUpdated,
            Self::EpochUpdated { .. } => EventType::EpochUpdated,
            Self::YieldDistributed { .. } => EventType::YieldDistributed,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<BoldEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: BoldEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[BoldEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<BoldEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&BoldEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&BoldEvent> {
        self.events.last()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }
}
