//! Yield Distributor
//!
//! Folds interest minted by the branch into B. The interest engine mints the
//! BOLD to the pool first, then notifies it here.
//!
//! `yield_gains_owed` always grows by the full amount. When the pool holds
//! less than `MIN_DEPOSITS_FOR_YIELD`, B is left untouched and the yield
//! stays in the pool unattributed.

use bold_common::{
    errors::BoldResult,
    events::BoldEvent,
    ledger::YieldOutcome,
    types::{Amount, AppId},
    validation::require_caller,
};

use crate::{StabilityPool, TokenLedger};

impl<L: TokenLedger> StabilityPool<L> {
    /// Attribute `amount` of freshly minted yield to current depositors.
    ///
    /// Only the configured interest engine may call this.
    pub fn trigger_yield(&mut self, caller: AppId, amount: Amount) -> BoldResult<YieldOutcome> {
        require_caller(self.config.interest_engine_id, caller)?;

        let outcome = self
            .ledger
            .preview_yield(amount, self.accounting.total_deposits())?;

        let mut accounting = self.accounting;
        accounting.increase_yield_gains_owed(amount)?;

        self.ledger.commit_yield(&outcome);
        self.accounting = accounting;

        if !outcome.attributed && amount > 0 {
            log::warn!(
                "yield of {} left unattributed, total deposits {} below threshold",
                amount,
                accounting.total_deposits()
            );
        }
        self.events.emit(BoldEvent::YieldDistributed {
            amount,
            attributed: outcome.attributed,
            new_yield_gains_owed: accounting.yield_gains_owed(),
        });

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::{alice, bob, funded_pool, INTEREST_ENGINE, LIQUIDATION_ENGINE};
    use bold_common::{
        constants::token::ONE,
        errors::BoldError,
        events::BoldEvent,
    };

    #[test]
    fn test_yield_split_pro_rata() {
        let mut pool = funded_pool();
        pool.provide_to_sp(&alice(), 750 * ONE, false).unwrap();
        pool.provide_to_sp(&bob(), 250 * ONE, false).unwrap();
        pool.tokens_mut().mint_to_pool(100 * ONE);

        let outcome = pool.trigger_yield(INTEREST_ENGINE, 100 * ONE).unwrap();

        assert!(outcome.attributed);
        assert_eq!(pool.get_yield_gains_owed(), 100 * ONE);
        assert_eq!(pool.get_depositor_yield_gain(&alice()).unwrap(), 75 * ONE);
        assert_eq!(pool.get_depositor_yield_gain(&bob()).unwrap(), 25 * ONE);
    }

    #[test]
    fn test_dust_yield_drop() {
        let mut pool = funded_pool();
        pool.provide_to_sp(&alice(), ONE - 1, false).unwrap();

        let outcome = pool.trigger_yield(INTEREST_ENGINE, 100).unwrap();

        assert!(!outcome.attributed);
        assert!(pool.ledger().current_b().is_zero());
        assert_eq!(pool.get_yield_gains_owed(), 100);
        assert_eq!(pool.get_depositor_yield_gain(&alice()).unwrap(), 0);
        assert_eq!(
            pool.events().last(),
            Some(&BoldEvent::YieldDistributed {
                amount: 100,
                attributed: false,
                new_yield_gains_owed: 100,
            })
        );
    }

    #[test]
    fn test_yield_unauthorized() {
        let mut pool = funded_pool();
        pool.provide_to_sp(&alice(), 10 * ONE, false).unwrap();

        let result = pool.trigger_yield(LIQUIDATION_ENGINE, ONE);

        assert_eq!(
            result,
            Err(BoldError::Unauthorized { expected: INTEREST_ENGINE, actual: LIQUIDATION_ENGINE })
        );
        assert_eq!(pool.get_yield_gains_owed(), 0);
    }

    #[test]
    fn test_withdraw_claims_yield() {
        let mut pool = funded_pool();
        pool.provide_to_sp(&alice(), 1_000 * ONE, false).unwrap();
        pool.tokens_mut().mint_to_pool(10 * ONE);
        pool.trigger_yield(INTEREST_ENGINE, 10 * ONE).unwrap();

        pool.withdraw_from_sp(&alice(), 1_000 * ONE, true).unwrap();

        assert_eq!(pool.tokens().debt_balance_of(&alice()), 1_000_010 * ONE);
        assert_eq!(pool.get_yield_gains_owed(), 0);
        assert_eq!(pool.registry().depositor_count(), 0);
    }

    #[test]
    fn test_withdraw_without_claim_compounds_yield() {
        let mut pool = funded_pool();
        pool.provide_to_sp(&alice(), 1_000 * ONE, false).unwrap();
        pool.tokens_mut().mint_to_pool(10 * ONE);
        pool.trigger_yield(INTEREST_ENGINE, 10 * ONE).unwrap();

        pool.withdraw_from_sp(&alice(), 1_000 * ONE, false).unwrap();

        assert_eq!(pool.get_compounded_deposit(&alice()).unwrap(), 10 * ONE);
        assert_eq!(pool.get_total_deposits(), 10 * ONE);
        assert_eq!(pool.get_yield_gains_owed(), 0);
    }
}
