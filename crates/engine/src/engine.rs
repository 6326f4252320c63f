//! The PEG engine: construction, read-only views and the commit path shared
//! by every state-changing operation.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use pegvault_common::error::EngineError;
use pegvault_common::types::{AccountInformation, AssetConfig, LedgerEvent, ProtocolTotals};
use pegvault_oracle::PriceOracle;

use crate::guard::ReentrancyGuard;
use crate::health::{calculate_health_factor, is_healthy};
use crate::journal::EventJournal;
use crate::ledger::{Changeset, CollateralLedger, LedgerTx, PositionView};
use crate::math;
use crate::registry::{CollateralListing, CollateralRegistry};
use crate::settlement::Settlement;
use crate::token::{PegToken, TokenLedger};

pub struct PegEngine {
    registry: CollateralRegistry,
    ledger: CollateralLedger,
    journal: EventJournal,
    oracle: Arc<dyn PriceOracle>,
    peg_asset: Address,
    pub(crate) peg: Arc<dyn PegToken>,
    custody: Address,
    guard: ReentrancyGuard,
}

impl fmt::Debug for PegEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PegEngine")
            .field("registry", &self.registry)
            .field("peg_asset", &self.peg_asset)
            .field("custody", &self.custody)
            .field("positions", &self.ledger.len())
            .field("events", &self.journal.len())
            .finish_non_exhaustive()
    }
}

pub struct PegEngineBuilder {
    oracle: Arc<dyn PriceOracle>,
    peg_asset: Address,
    peg: Arc<dyn PegToken>,
    custody: Address,
    registry: CollateralRegistry,
    error: Option<EngineError>,
}

impl PegEngineBuilder {
    /// Accept `asset` as collateral, valued by `price_feed`.
    pub fn collateral(
        mut self,
        asset: Address,
        price_feed: Address,
        token: Arc<dyn TokenLedger>,
    ) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.registry.register(asset, price_feed, token) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Replace the collateral registered so far.
    pub fn registry(mut self, registry: CollateralRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Result<PegEngine, EngineError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.registry.is_empty() {
            return Err(EngineError::Config(
                "at least one collateral asset is required".to_string(),
            ));
        }
        if self.registry.is_allowed(self.peg_asset) {
            return Err(EngineError::Config("PEG cannot back itself as collateral".to_string()));
        }

        tracing::info!(
            peg_asset = %self.peg_asset,
            custody = %self.custody,
            collateral_assets = self.registry.len(),
            "PEG engine initialized"
        );

        Ok(PegEngine {
            registry: self.registry,
            ledger: CollateralLedger::new(self.peg_asset),
            journal: EventJournal::new(),
            oracle: self.oracle,
            peg_asset: self.peg_asset,
            peg: self.peg,
            custody: self.custody,
            guard: ReentrancyGuard::new(),
        })
    }
}

impl PegEngine {
    /// Start building an engine. `custody` is the account that holds
    /// deposited collateral and is the PEG token's minter.
    pub fn builder(
        oracle: Arc<dyn PriceOracle>,
        peg_asset: Address,
        peg: Arc<dyn PegToken>,
        custody: Address,
    ) -> PegEngineBuilder {
        PegEngineBuilder {
            oracle,
            peg_asset,
            peg,
            custody,
            registry: CollateralRegistry::new(),
            error: None,
        }
    }

    // ── views ──

    pub fn calculate_health_factor(total_minted: U256, collateral_value_usd: U256) -> U256 {
        calculate_health_factor(total_minted, collateral_value_usd)
    }

    pub fn account_information(&self, user: Address) -> Result<AccountInformation, EngineError> {
        self.account_information_in(&self.ledger, user)
    }

    /// Sum of `user`'s collateral in 18-decimal USD.
    pub fn total_collateral_value(&self, user: Address) -> Result<U256, EngineError> {
        self.collateral_value_in(&self.ledger, user)
    }

    pub fn health_factor(&self, user: Address) -> Result<U256, EngineError> {
        self.health_factor_in(&self.ledger, user)
    }

    pub fn usd_value(&self, asset: Address, amount: U256) -> Result<U256, EngineError> {
        math::usd_value(self.price_of(asset)?, amount)
    }

    pub fn token_amount_from_usd(
        &self,
        asset: Address,
        usd_amount: U256,
    ) -> Result<U256, EngineError> {
        math::asset_amount(self.price_of(asset)?, usd_amount)
    }

    pub fn collateral_balance(&self, user: Address, asset: Address) -> U256 {
        self.ledger.collateral_of(user, asset)
    }

    pub fn debt_of(&self, user: Address) -> U256 {
        self.ledger.debt_of(user)
    }

    pub fn collateral_tokens(&self) -> &[Address] {
        self.registry.assets()
    }

    pub fn collateral_configs(&self) -> Vec<AssetConfig> {
        self.registry.configs()
    }

    pub fn price_feed(&self, asset: Address) -> Option<Address> {
        self.registry.price_feed(asset)
    }

    pub fn peg_asset(&self) -> Address {
        self.peg_asset
    }

    pub fn custody(&self) -> Address {
        self.custody
    }

    /// Debt and collateral value summed over every open position.
    pub fn protocol_totals(&self) -> Result<ProtocolTotals, EngineError> {
        let mut totals = ProtocolTotals::default();
        for (user, position) in self.ledger.positions() {
            let info = self.account_information_in(&self.ledger, user)?;
            totals.total_debt = math::checked_add(totals.total_debt, position.debt_minted())?;
            totals.total_collateral_value_usd =
                math::checked_add(totals.total_collateral_value_usd, info.collateral_value_usd)?;
            totals.open_positions += 1;
        }
        Ok(totals)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        self.journal.events()
    }

    pub fn events_for(&self, account: Address) -> Vec<LedgerEvent> {
        self.journal.events_for(account).cloned().collect()
    }

    pub fn events_since(&self, sequence: u64) -> &[LedgerEvent] {
        self.journal.since(sequence)
    }

    /// Handle on the engine's reentrancy flag, for collaborators that need
    /// to know whether an operation is in flight.
    pub fn reentrancy_guard(&self) -> ReentrancyGuard {
        self.guard.clone()
    }

    // ── internals ──

    pub(crate) fn listing(&self, asset: Address) -> Result<&CollateralListing, EngineError> {
        self.registry.listing(asset)
    }

    /// Normalized price of a registered asset.
    fn price_of(&self, asset: Address) -> Result<U256, EngineError> {
        let feed = self.listing(asset)?.config.price_feed;
        let quote = self
            .oracle
            .latest_price(feed)
            .map_err(|e| EngineError::PriceUnavailable {
                feed,
                reason: e.to_string(),
            })?;
        math::normalized_price(&quote)
    }

    /// Zero balances are skipped so an empty account never needs a price.
    pub(crate) fn collateral_value_in(
        &self,
        view: &impl PositionView,
        user: Address,
    ) -> Result<U256, EngineError> {
        let Some(position) = view.position(user) else {
            return Ok(U256::ZERO);
        };

        let mut total = U256::ZERO;
        for asset in self.registry.assets() {
            let amount = position.collateral(*asset);
            if amount.is_zero() {
                continue;
            }
            total = math::checked_add(total, self.usd_value(*asset, amount)?)?;
        }
        Ok(total)
    }

    pub(crate) fn account_information_in(
        &self,
        view: &impl PositionView,
        user: Address,
    ) -> Result<AccountInformation, EngineError> {
        Ok(AccountInformation {
            total_minted: view.debt_of(user),
            collateral_value_usd: self.collateral_value_in(view, user)?,
        })
    }

    pub(crate) fn health_factor_in(
        &self,
        view: &impl PositionView,
        user: Address,
    ) -> Result<U256, EngineError> {
        let debt = view.debt_of(user);
        if debt.is_zero() {
            return Ok(U256::MAX);
        }
        Ok(calculate_health_factor(debt, self.collateral_value_in(view, user)?))
    }

    pub(crate) fn ensure_healthy(
        &self,
        view: &impl PositionView,
        user: Address,
    ) -> Result<(), EngineError> {
        let health_factor = self.health_factor_in(view, user)?;
        if !is_healthy(health_factor) {
            return Err(EngineError::HealthFactorBreach(health_factor));
        }
        Ok(())
    }

    /// Run one state-changing operation.
    ///
    /// `body` stages ledger changes and performs token interactions. If it
    /// succeeds the staged changes are committed and journaled; otherwise
    /// they are dropped and completed interactions are reversed.
    pub(crate) fn transact<T>(
        &mut self,
        operation: &'static str,
        body: impl FnOnce(&Self, &mut LedgerTx<'_>, &mut Settlement) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let _entered = self.guard.enter()?;
        let mut settlement = Settlement::new(self.custody);

        let outcome = {
            let mut tx = self.ledger.begin();
            match body(self, &mut tx, &mut settlement) {
                Ok(value) => Ok((value, tx.into_changeset())),
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok((value, changes)) => {
                let events = changes.events().len();
                self.commit(changes);
                tracing::debug!(operation, events, "Operation committed");
                Ok(value)
            }
            Err(e) => {
                let failures = settlement.unwind();
                let e = if failures.is_empty() {
                    e
                } else {
                    EngineError::RollbackIncomplete {
                        cause: Box::new(e),
                        failures,
                    }
                };
                tracing::warn!(operation, kind = e.kind(), error = %e, "Operation rejected");
                Err(e)
            }
        }
    }

    fn commit(&mut self, changes: Changeset) {
        for event in self.ledger.apply(changes) {
            self.journal.append(event);
        }
    }
}

pub(crate) fn require_positive(amount: U256, what: &str) -> Result<(), EngineError> {
    if amount.is_zero() {
        return Err(EngineError::Validation(format!("{what} must be more than zero")));
    }
    Ok(())
}
