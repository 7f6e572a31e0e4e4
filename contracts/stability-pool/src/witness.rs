//! Witness Codec for Stability Pool Actions
//!
//! Actions arrive from the host as CBOR-encoded witnesses. A witness carries
//! an operation code plus the optional fields that operation needs:
//!
//! ```text
//! PROVIDE     { op: 0x20, amount, claim }
//! WITHDRAW    { op: 0x21, amount, claim }
//! CLAIM_COLL  { op: 0x22 }
//! OFFSET      { op: 0x23, debt, collateral }
//! YIELD       { op: 0x24, amount }
//! ```

use serde::{Deserialize, Serialize};

use bold_common::{
    errors::{BoldError, BoldResult},
    types::{Amount, AppId, StabilityPoolAction},
    Vec,
};

use crate::{StabilityPool, TokenLedger};

fn missing(reason: &'static str) -> BoldError {
    BoldError::InvalidWitness { reason }
}

// ============ Operation Codes ============

/// Operation codes for stability pool actions (encoded in witness)
pub mod op {
    /// Deposit BOLD into the stability pool
    pub const PROVIDE: u8 = 0x20;
    /// Withdraw BOLD from the stability pool
    pub const WITHDRAW: u8 = 0x21;
    /// Claim stashed collateral after a full withdrawal
    pub const CLAIM_COLL: u8 = 0x22;
    /// Offset debt during liquidation (liquidation engine only)
    pub const OFFSET: u8 = 0x23;
    /// Attribute minted interest (interest engine only)
    pub const YIELD: u8 = 0x24;
}

// ============ Witness Structure ============

/// Witness data for stability pool operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityWitness {
    /// Operation type (see `op` module)
    pub op: u8,
    /// Amount for provide/withdraw/yield operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// Whether gains are paid out instead of compounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<bool>,
    /// Debt amount for offset operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt: Option<Amount>,
    /// Collateral amount for offset operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral: Option<Amount>,
}

impl StabilityWitness {
    fn bare(op: u8) -> Self {
        Self {
            op,
            amount: None,
            claim: None,
            debt: None,
            collateral: None,
        }
    }

    /// Create witness for provide operation
    pub fn provide(amount: Amount, claim: bool) -> Self {
        Self {
            amount: Some(amount),
            claim: Some(claim),
            ..Self::bare(op::PROVIDE)
        }
    }

    /// Create witness for withdraw operation
    pub fn withdraw(amount: Amount, claim: bool) -> Self {
        Self {
            amount: Some(amount),
            claim: Some(claim),
            ..Self::bare(op::WITHDRAW)
        }
    }

    /// Create witness for claiming stashed collateral
    pub fn claim_collateral() -> Self {
        Self::bare(op::CLAIM_COLL)
    }

    /// Create witness for offset operation
    pub fn offset(debt: Amount, collateral: Amount) -> Self {
        Self {
            debt: Some(debt),
            collateral: Some(collateral),
            ..Self::bare(op::OFFSET)
        }
    }

    /// Create witness for a yield notification
    pub fn distribute_yield(amount: Amount) -> Self {
        Self {
            amount: Some(amount),
            ..Self::bare(op::YIELD)
        }
    }

    /// Encode as CBOR
    pub fn to_bytes(&self) -> BoldResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).map_err(|_| BoldError::InvalidWitness {
            reason: "cbor encoding failed",
        })?;
        Ok(bytes)
    }

    /// Decode from CBOR
    pub fn from_bytes(bytes: &[u8]) -> BoldResult<Self> {
        ciborium::from_reader(bytes).map_err(|_| BoldError::InvalidWitness {
            reason: "malformed cbor",
        })
    }

    /// Convert to the action it describes
    pub fn to_action(&self) -> BoldResult<StabilityPoolAction> {
        match self.op {
            op::PROVIDE => Ok(StabilityPoolAction::Provide {
                amount: self.amount.ok_or(missing("provide without amount"))?,
                claim: self.claim.unwrap_or(false),
            }),
            op::WITHDRAW => Ok(StabilityPoolAction::Withdraw {
                amount: self.amount.ok_or(missing("withdraw without amount"))?,
                claim: self.claim.unwrap_or(false),
            }),
            op::CLAIM_COLL => Ok(StabilityPoolAction::ClaimAllCollateral),
            op::OFFSET => Ok(StabilityPoolAction::Offset {
                debt: self.debt.ok_or(missing("offset without debt"))?,
                collateral: self.collateral.ok_or(missing("offset without collateral"))?,
            }),
            op::YIELD => Ok(StabilityPoolAction::DistributeYield {
                amount: self.amount.ok_or(missing("yield without amount"))?,
            }),
            _ => Err(missing("unknown operation code")),
        }
    }
}

impl From<&StabilityPoolAction> for StabilityWitness {
    fn from(action: &StabilityPoolAction) -> Self {
        match *action {
            StabilityPoolAction::Provide { amount, claim } => Self::provide(amount, claim),
            StabilityPoolAction::Withdraw { amount, claim } => Self::withdraw(amount, claim),
            StabilityPoolAction::ClaimAllCollateral => Self::claim_collateral(),
            StabilityPoolAction::Offset { debt, collateral } => Self::offset(debt, collateral),
            StabilityPoolAction::DistributeYield { amount } => Self::distribute_yield(amount),
        }
    }
}

impl<L: TokenLedger> StabilityPool<L> {
    /// Decode a CBOR witness and execute it on behalf of `caller`
    pub fn execute_witness(&mut self, caller: AppId, witness: &[u8]) -> BoldResult<()> {
        let action = StabilityWitness::from_bytes(witness)?.to_action()?;
        log::debug!("executing witness action {:?}", action);
        self.execute(caller, &action)
    }
}
