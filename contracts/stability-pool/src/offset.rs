//! Offset Processor
//!
//! Bridges liquidations into the ledger. The liquidation engine hands over
//! `(debt, collateral)` from a liquidated trove; the pool burns that much
//! BOLD out of its deposits and takes the collateral in return.
//!
//! ```text
//! S += P * collateral / total_deposits
//! P -= ceil(P * debt / total_deposits)
//! total_deposits -= debt
//! coll_balance   += collateral
//! ```

use bold_common::{
    errors::BoldResult,
    events::BoldEvent,
    ledger::OffsetOutcome,
    types::{Amount, AppId},
    validation::require_caller,
};

use crate::{StabilityPool, TokenLedger};

impl<L: TokenLedger> StabilityPool<L> {
    /// Absorb `debt` of liquidated troves in exchange for `collateral`.
    ///
    /// Only the configured liquidation engine may call this.
    pub fn offset(&mut self, caller: AppId, debt: Amount, collateral: Amount) -> BoldResult<OffsetOutcome> {
        // 1. Only the liquidation engine can offset
        require_caller(self.config.liquidation_engine_id, caller)?;

        // 2. Ledger update against the pre-offset total
        let total_deposits = self.accounting.total_deposits();
        let outcome = self.ledger.preview_offset(debt, collateral, total_deposits)?;

        // 3. Stage aggregate updates
        let mut accounting = self.accounting;
        accounting.decrease_total_deposits(debt)?;
        accounting.increase_coll_balance(collateral)?;

        // 4. Move tokens on a staged copy
        let mut tokens = self.tokens.clone();
        if debt > 0 {
            tokens.burn_from_pool(debt)?;
        }
        if collateral > 0 {
            tokens.pull_collateral_from_active_pool(collateral)?;
        }

        // 5. Commit
        self.tokens = tokens;
        let old_scale = self.ledger.current_scale();
        self.ledger.commit_offset(&outcome);
        self.accounting = accounting;

        self.events.emit(BoldEvent::LiquidationOffset {
            debt_offset: debt,
            collateral_gained: collateral,
            new_total_deposits: accounting.total_deposits(),
            new_p: outcome.new_p,
        });
        if outcome.epoch_rolled {
            self.events.emit(BoldEvent::EpochUpdated {
                epoch: outcome.new_epoch,
            });
            self.events.emit(BoldEvent::ScaleUpdated { scale: 0 });
        } else {
            for scale in old_scale + 1..=outcome.new_scale {
                self.events.emit(BoldEvent::ScaleUpdated { scale });
            }
        }

        Ok(outcome)
    }
}
