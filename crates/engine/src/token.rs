//! Token collaborators.
//!
//! The engine never owns balances of its own; it asks a [`TokenLedger`] to
//! move collateral and a [`PegToken`] to issue and destroy PEG. Both report
//! refusals as [`TokenError`], which the engine maps onto its own taxonomy.
//!
//! [`InMemoryToken`] is the process-local implementation used by the sandbox
//! API and by tests.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use alloy::primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("{account} holds {available}, needs {requested}")]
    InsufficientBalance {
        account: Address,
        requested: U256,
        available: U256,
    },

    #[error("amount must be more than zero")]
    ZeroAmount,

    #[error("{0} may not mint or burn")]
    Unauthorized(Address),

    #[error("cannot mint to the zero address")]
    ZeroAddress,

    #[error("token is paused")]
    Paused,

    #[error("{0}")]
    Rejected(String),
}

/// Fungible balances that the engine can move.
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from `owner` to `recipient` using an allowance the owner granted.
    fn transfer_from(
        &self,
        owner: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Move `amount` out of `sender`'s own balance.
    fn transfer(&self, sender: Address, recipient: Address, amount: U256) -> Result<(), TokenError>;

    fn balance_of(&self, account: Address) -> U256;
}

/// The PEG token. Only its minter may issue or destroy supply.
pub trait PegToken: TokenLedger {
    fn mint(&self, minter: Address, recipient: Address, amount: U256) -> Result<(), TokenError>;

    /// Destroy `amount` from `holder`'s own balance.
    fn burn(&self, holder: Address, amount: U256) -> Result<(), TokenError>;

    fn total_supply(&self) -> U256;
}

#[derive(Debug, Default)]
struct Balances {
    accounts: HashMap<Address, U256>,
    total_supply: U256,
    paused: bool,
}

impl Balances {
    fn balance(&self, account: Address) -> U256 {
        self.accounts.get(&account).copied().unwrap_or_default()
    }

    fn debit(&mut self, account: Address, amount: U256) -> Result<(), TokenError> {
        let available = self.balance(account);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account,
                requested: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining.is_zero() {
            self.accounts.remove(&account);
        } else {
            self.accounts.insert(account, remaining);
        }
        Ok(())
    }

    fn credit(&mut self, account: Address, amount: U256) {
        let balance = self.accounts.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }
}

/// Shared in-memory token. Clones refer to the same balances.
#[derive(Debug, Clone)]
pub struct InMemoryToken {
    address: Address,
    minter: Option<Address>,
    state: Arc<RwLock<Balances>>,
}

impl InMemoryToken {
    /// A plain collateral token with no mint authority.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            minter: None,
            state: Arc::default(),
        }
    }

    /// A token whose supply is controlled by `minter`.
    pub fn mintable(address: Address, minter: Address) -> Self {
        Self {
            minter: Some(minter),
            ..Self::new(address)
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Grant `amount` to `account` out of thin air. Sandbox faucet and test setup.
    pub fn credit(&self, account: Address, amount: U256) {
        let mut state = self.write();
        state.credit(account, amount);
        state.total_supply = state.total_supply.saturating_add(amount);
    }

    /// While paused every transfer, mint and burn is refused.
    pub fn set_paused(&self, paused: bool) {
        self.write().paused = paused;
    }

    fn move_balance(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        let mut state = self.write();
        if state.paused {
            return Err(TokenError::Paused);
        }
        state.debit(from, amount)?;
        state.credit(to, amount);
        Ok(())
    }

    fn ensure_minter(&self, caller: Address) -> Result<(), TokenError> {
        match self.minter {
            Some(minter) if minter == caller => Ok(()),
            _ => Err(TokenError::Unauthorized(caller)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Balances> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Balances> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenLedger for InMemoryToken {
    fn transfer_from(
        &self,
        owner: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.move_balance(owner, recipient, amount)
    }

    fn transfer(
        &self,
        sender: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.move_balance(sender, recipient, amount)
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.read().balance(account)
    }
}

impl PegToken for InMemoryToken {
    fn mint(&self, minter: Address, recipient: Address, amount: U256) -> Result<(), TokenError> {
        self.ensure_minter(minter)?;
        if recipient == Address::ZERO {
            return Err(TokenError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(TokenError::ZeroAmount);
        }

        let mut state = self.write();
        if state.paused {
            return Err(TokenError::Paused);
        }
        state.credit(recipient, amount);
        state.total_supply = state.total_supply.saturating_add(amount);
        Ok(())
    }

    fn burn(&self, holder: Address, amount: U256) -> Result<(), TokenError> {
        self.ensure_minter(holder)?;
        if amount.is_zero() {
            return Err(TokenError::ZeroAmount);
        }

        let mut state = self.write();
        if state.paused {
            return Err(TokenError::Paused);
        }
        state.debit(holder, amount)?;
        state.total_supply -= amount;
        Ok(())
    }

    fn total_supply(&self) -> U256 {
        self.read().total_supply
    }
}
