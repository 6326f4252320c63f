//! Collateral and debt bookkeeping.
//!
//! Operations never write to the [`CollateralLedger`] directly. They open a
//! [`LedgerTx`], stage their changes there, and the engine applies the
//! resulting [`Changeset`] only once every check and token interaction has
//! succeeded. Dropping a transaction discards it.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use pegvault_common::error::EngineError;
use pegvault_common::types::EventType;

/// Collateral deposited and PEG owed by one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    collateral: HashMap<Address, U256>,
    debt_minted: U256,
}

impl Position {
    pub fn collateral(&self, asset: Address) -> U256 {
        self.collateral.get(&asset).copied().unwrap_or_default()
    }

    pub fn debt_minted(&self) -> U256 {
        self.debt_minted
    }

    pub fn is_empty(&self) -> bool {
        self.debt_minted.is_zero() && self.collateral.values().all(|a| a.is_zero())
    }
}

/// Read access to positions, committed or staged.
pub trait PositionView {
    fn position(&self, user: Address) -> Option<&Position>;

    fn collateral_of(&self, user: Address, asset: Address) -> U256 {
        self.position(user).map(|p| p.collateral(asset)).unwrap_or_default()
    }

    fn debt_of(&self, user: Address) -> U256 {
        self.position(user).map(Position::debt_minted).unwrap_or_default()
    }
}

/// An event staged by a transaction, journaled on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub event_type: EventType,
    pub user: Address,
    pub counterparty: Option<Address>,
    pub asset: Option<Address>,
    pub amount: U256,
}

/// Staged positions and events of a finished transaction.
#[derive(Debug, Default)]
pub struct Changeset {
    positions: HashMap<Address, Position>,
    events: Vec<PendingEvent>,
}

impl Changeset {
    pub fn events(&self) -> &[PendingEvent] {
        &self.events
    }
}

#[derive(Debug)]
pub struct CollateralLedger {
    /// Asset debt is denominated in, reported on burn shortfalls
    debt_asset: Address,
    positions: HashMap<Address, Position>,
}

impl CollateralLedger {
    pub fn new(debt_asset: Address) -> Self {
        Self {
            debt_asset,
            positions: HashMap::new(),
        }
    }

    pub fn begin(&self) -> LedgerTx<'_> {
        LedgerTx {
            base: self,
            staged: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Apply a changeset and hand back its events for journaling.
    /// Positions that end up empty are dropped.
    pub fn apply(&mut self, changes: Changeset) -> Vec<PendingEvent> {
        for (user, mut position) in changes.positions {
            position.collateral.retain(|_, amount| !amount.is_zero());
            if position.is_empty() {
                self.positions.remove(&user);
            } else {
                self.positions.insert(user, position);
            }
        }
        changes.events
    }

    pub fn positions(&self) -> impl Iterator<Item = (Address, &Position)> {
        self.positions.iter().map(|(user, position)| (*user, position))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl PositionView for CollateralLedger {
    fn position(&self, user: Address) -> Option<&Position> {
        self.positions.get(&user)
    }
}

/// Copy-on-write view over the ledger for one operation.
#[derive(Debug)]
pub struct LedgerTx<'a> {
    base: &'a CollateralLedger,
    staged: HashMap<Address, Position>,
    events: Vec<PendingEvent>,
}

impl LedgerTx<'_> {
    fn position_mut(&mut self, user: Address) -> &mut Position {
        let base = self.base;
        self.staged
            .entry(user)
            .or_insert_with(|| base.position(user).cloned().unwrap_or_default())
    }

    fn push(
        &mut self,
        event_type: EventType,
        user: Address,
        counterparty: Option<Address>,
        asset: Option<Address>,
        amount: U256,
    ) {
        self.events.push(PendingEvent {
            event_type,
            user,
            counterparty,
            asset,
            amount,
        });
    }

    pub fn record_deposit(
        &mut self,
        user: Address,
        asset: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        let balance = self.position_mut(user).collateral.entry(asset).or_default();
        *balance = balance.checked_add(amount).ok_or_else(|| {
            EngineError::ArithmeticFault(format!("collateral of {user} overflows"))
        })?;

        self.push(EventType::CollateralDeposited, user, None, Some(asset), amount);
        Ok(())
    }

    /// Debit `from`'s collateral. `to` is the account the tokens go to.
    pub fn record_withdrawal(
        &mut self,
        from: Address,
        to: Address,
        asset: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        let available = self.collateral_of(from, asset);
        if amount > available {
            return Err(EngineError::InsufficientBalance {
                account: from,
                asset,
                requested: amount,
                available,
            });
        }
        self.position_mut(from).collateral.insert(asset, available - amount);

        self.push(EventType::CollateralRedeemed, from, Some(to), Some(asset), amount);
        Ok(())
    }

    pub fn record_mint(&mut self, user: Address, amount: U256) -> Result<(), EngineError> {
        let position = self.position_mut(user);
        position.debt_minted = position
            .debt_minted
            .checked_add(amount)
            .ok_or_else(|| EngineError::ArithmeticFault(format!("debt of {user} overflows")))?;

        self.push(EventType::PegMinted, user, None, None, amount);
        Ok(())
    }

    /// Reduce `on_behalf_of`'s debt. `payer` is the account whose PEG is destroyed.
    pub fn record_burn(
        &mut self,
        on_behalf_of: Address,
        payer: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        let available = self.debt_of(on_behalf_of);
        if amount > available {
            return Err(EngineError::InsufficientBalance {
                account: on_behalf_of,
                asset: self.base.debt_asset,
                requested: amount,
                available,
            });
        }
        self.position_mut(on_behalf_of).debt_minted = available - amount;

        self.push(EventType::PegBurned, on_behalf_of, Some(payer), None, amount);
        Ok(())
    }

    /// Marker event for a completed liquidation; balances move through the
    /// withdrawal and burn recorded alongside it.
    pub fn record_liquidation(
        &mut self,
        user: Address,
        liquidator: Address,
        asset: Address,
        debt_covered: U256,
    ) {
        self.push(EventType::PositionLiquidated, user, Some(liquidator), Some(asset), debt_covered);
    }

    pub fn into_changeset(self) -> Changeset {
        Changeset {
            positions: self.staged,
            events: self.events,
        }
    }
}

impl PositionView for LedgerTx<'_> {
    fn position(&self, user: Address) -> Option<&Position> {
        self.staged.get(&user).or_else(|| self.base.position(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peg() -> Address {
        Address::repeat_byte(0xBE)
    }

    fn weth() -> Address {
        Address::repeat_byte(0xE1)
    }

    fn alice() -> Address {
        Address::repeat_byte(0x01)
    }

    fn bob() -> Address {
        Address::repeat_byte(0x02)
    }

    fn commit(
        ledger: &mut CollateralLedger,
        f: impl FnOnce(&mut LedgerTx<'_>),
    ) -> Vec<PendingEvent> {
        let changes = {
            let mut tx = ledger.begin();
            f(&mut tx);
            tx.into_changeset()
        };
        ledger.apply(changes)
    }

    #[test]
    fn test_staged_changes_invisible_until_applied() {
        let mut ledger = CollateralLedger::new(peg());
        let changes = {
            let mut tx = ledger.begin();
            tx.record_deposit(alice(), weth(), U256::from(10u64)).unwrap();
            assert_eq!(tx.collateral_of(alice(), weth()), U256::from(10u64));
            assert_eq!(ledger.collateral_of(alice(), weth()), U256::ZERO);
            tx.into_changeset()
        };
        assert_eq!(changes.events().len(), 1);

        ledger.apply(changes);
        assert_eq!(ledger.collateral_of(alice(), weth()), U256::from(10u64));
    }

    #[test]
    fn test_dropped_tx_discards() {
        let ledger = CollateralLedger::new(peg());
        {
            let mut tx = ledger.begin();
            tx.record_mint(alice(), U256::from(5u64)).unwrap();
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_withdrawal_beyond_balance() {
        let mut ledger = CollateralLedger::new(peg());
        commit(&mut ledger, |tx| tx.record_deposit(alice(), weth(), U256::from(3u64)).unwrap());

        let mut tx = ledger.begin();
        let err = tx.record_withdrawal(alice(), bob(), weth(), U256::from(4u64)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientBalance {
                account: alice(),
                asset: weth(),
                requested: U256::from(4u64),
                available: U256::from(3u64),
            }
        );
    }

    #[test]
    fn test_burn_beyond_debt_reports_debt_asset() {
        let mut ledger = CollateralLedger::new(peg());
        commit(&mut ledger, |tx| tx.record_mint(alice(), U256::from(2u64)).unwrap());

        let mut tx = ledger.begin();
        match tx.record_burn(alice(), alice(), U256::from(3u64)) {
            Err(EngineError::InsufficientBalance { asset, .. }) => assert_eq!(asset, peg()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_emptied_position_is_dropped() {
        let mut ledger = CollateralLedger::new(peg());
        commit(&mut ledger, |tx| {
            tx.record_deposit(alice(), weth(), U256::from(7u64)).unwrap();
            tx.record_mint(alice(), U256::from(1u64)).unwrap();
        });
        assert_eq!(ledger.len(), 1);

        let events = commit(&mut ledger, |tx| {
            tx.record_burn(alice(), alice(), U256::from(1u64)).unwrap();
            tx.record_withdrawal(alice(), alice(), weth(), U256::from(7u64)).unwrap();
        });
        assert_eq!(events.len(), 2);
        assert!(ledger.is_empty());
        assert!(ledger.position(alice()).is_none());
    }

    #[test]
    fn test_events_carry_counterparty() {
        let mut ledger = CollateralLedger::new(peg());
        commit(&mut ledger, |tx| tx.record_deposit(alice(), weth(), U256::from(7u64)).unwrap());

        let events = commit(&mut ledger, |tx| {
            tx.record_withdrawal(alice(), bob(), weth(), U256::from(2u64)).unwrap();
            tx.record_liquidation(alice(), bob(), weth(), U256::from(1u64));
        });
        assert_eq!(events[0].event_type, EventType::CollateralRedeemed);
        assert_eq!(events[0].counterparty, Some(bob()));
        assert_eq!(events[1].event_type, EventType::PositionLiquidated);
        assert_eq!(ledger.collateral_of(alice(), weth()), U256::from(5u64));
    }
}
