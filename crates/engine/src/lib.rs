//! Overcollateralized PEG engine.
//!
//! Users lock collateral assets, mint PEG against them up to a 2:1 ratio,
//! and repay or get liquidated when prices move. The engine keeps the books;
//! balances live with the token collaborators in [`token`].

pub mod constants;
mod controller;
pub mod engine;
pub mod guard;
pub mod health;
pub mod journal;
pub mod ledger;
pub mod liquidation;
pub mod math;
pub mod registry;
mod settlement;
pub mod token;

pub use engine::{PegEngine, PegEngineBuilder};
pub use guard::ReentrancyGuard;
pub use health::calculate_health_factor;
pub use liquidation::LiquidationReceipt;
pub use registry::CollateralRegistry;
pub use token::{InMemoryToken, PegToken, TokenError, TokenLedger};
