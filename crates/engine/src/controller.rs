//! Position management: deposit, mint, redeem and burn.
//!
//! Each operation stages its ledger changes, checks the caller's health
//! factor against the staged state, and only then talks to the tokens.

use alloy::primitives::{Address, U256};
use pegvault_common::error::EngineError;

use crate::engine::{PegEngine, require_positive};
use crate::ledger::LedgerTx;
use crate::settlement::Settlement;

impl PegEngine {
    /// Move `amount` of `asset` from `caller` into custody and credit it to
    /// their position.
    pub fn deposit_collateral(
        &mut self,
        caller: Address,
        asset: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        self.transact("deposit_collateral", |engine, tx, settlement| {
            engine.deposit_leg(tx, settlement, caller, asset, amount)
        })
    }

    /// Issue `amount` of PEG to `caller` against their collateral.
    pub fn mint(&mut self, caller: Address, amount: U256) -> Result<(), EngineError> {
        self.transact("mint", |engine, tx, settlement| {
            engine.mint_leg(tx, settlement, caller, amount)
        })
    }

    /// Deposit and mint in one step. Either both legs happen or neither does.
    pub fn deposit_collateral_and_mint(
        &mut self,
        caller: Address,
        asset: Address,
        amount_collateral: U256,
        amount_to_mint: U256,
    ) -> Result<(), EngineError> {
        self.transact("deposit_collateral_and_mint", |engine, tx, settlement| {
            engine.deposit_leg(tx, settlement, caller, asset, amount_collateral)?;
            engine.mint_leg(tx, settlement, caller, amount_to_mint)
        })
    }

    /// Withdraw `amount` of `asset` from the caller's position back to them.
    pub fn redeem_collateral(
        &mut self,
        caller: Address,
        asset: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        self.transact("redeem_collateral", |engine, tx, settlement| {
            let listing = engine.listing(asset)?;
            require_positive(amount, "collateral amount")?;

            tx.record_withdrawal(caller, caller, asset, amount)?;
            engine.ensure_healthy(&*tx, caller)?;

            settlement.pay_collateral(&listing.token, caller, amount)
        })
    }

    /// Repay `amount` of the caller's own debt with PEG they hold.
    pub fn burn(&mut self, caller: Address, amount: U256) -> Result<(), EngineError> {
        self.transact("burn", |engine, tx, settlement| {
            require_positive(amount, "burn amount")?;

            tx.record_burn(caller, caller, amount)?;
            engine.ensure_healthy(&*tx, caller)?;

            settlement.pull_and_burn_peg(&engine.peg, caller, amount)
        })
    }

    /// Burn PEG and withdraw collateral in one step.
    pub fn redeem_collateral_for_peg(
        &mut self,
        caller: Address,
        asset: Address,
        amount_collateral: U256,
        amount_to_burn: U256,
    ) -> Result<(), EngineError> {
        self.transact("redeem_collateral_for_peg", |engine, tx, settlement| {
            let listing = engine.listing(asset)?;
            require_positive(amount_collateral, "collateral amount")?;
            require_positive(amount_to_burn, "burn amount")?;

            tx.record_burn(caller, caller, amount_to_burn)?;
            tx.record_withdrawal(caller, caller, asset, amount_collateral)?;
            engine.ensure_healthy(&*tx, caller)?;

            settlement.pull_and_burn_peg(&engine.peg, caller, amount_to_burn)?;
            settlement.pay_collateral(&listing.token, caller, amount_collateral)
        })
    }

    fn deposit_leg(
        &self,
        tx: &mut LedgerTx<'_>,
        settlement: &mut Settlement,
        caller: Address,
        asset: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        let listing = self.listing(asset)?;
        require_positive(amount, "collateral amount")?;

        tx.record_deposit(caller, asset, amount)?;
        settlement.pull_collateral(&listing.token, caller, amount)
    }

    fn mint_leg(
        &self,
        tx: &mut LedgerTx<'_>,
        settlement: &mut Settlement,
        caller: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        require_positive(amount, "mint amount")?;

        tx.record_mint(caller, amount)?;
        self.ensure_healthy(&*tx, caller)?;

        settlement.mint_peg(&self.peg, caller, amount)
    }
}
