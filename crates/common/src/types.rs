use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binding of an accepted collateral asset to the price feed that values it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub asset: Address,
    pub price_feed: Address,
}

/// Types of ledger events the engine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CollateralDeposited,
    CollateralRedeemed,
    PegMinted,
    PegBurned,
    PositionLiquidated,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::CollateralDeposited => write!(f, "collateral_deposited"),
            EventType::CollateralRedeemed => write!(f, "collateral_redeemed"),
            EventType::PegMinted => write!(f, "peg_minted"),
            EventType::PegBurned => write!(f, "peg_burned"),
            EventType::PositionLiquidated => write!(f, "position_liquidated"),
        }
    }
}

/// A committed ledger event. The journal is append-only and never read back
/// by the engine for control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: Uuid,
    /// Monotonic position in the journal, starting at 1
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event_type: EventType,
    /// Account whose position changed
    pub user: Address,
    /// Other side of the movement (redeem recipient, burn payer, liquidator)
    pub counterparty: Option<Address>,
    /// Collateral asset; `None` for PEG debt movements
    pub asset: Option<Address>,
    pub amount: U256,
}

/// Debt and collateral value of one account, both in 18-decimal USD units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInformation {
    pub total_minted: U256,
    pub collateral_value_usd: U256,
}

/// Aggregate debt against aggregate collateral value across every open position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolTotals {
    pub total_debt: U256,
    pub total_collateral_value_usd: U256,
    pub open_positions: usize,
}

impl ProtocolTotals {
    /// Whether outstanding PEG is covered by the value of the collateral held.
    pub fn is_solvent(&self) -> bool {
        self.total_debt <= self.total_collateral_value_usd
    }
}
