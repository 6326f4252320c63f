//! Token interactions of one operation.
//!
//! Every completed interaction that a later failure would have to reverse
//! leaves a compensation behind. On failure [`Settlement::unwind`] replays
//! them newest first, returning tokens to where they came from. Payouts to
//! users cannot be taken back, so they are always the final interaction.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use pegvault_common::error::EngineError;

use crate::token::{PegToken, TokenError, TokenLedger};

enum Compensation {
    /// Return collateral pulled into custody.
    Refund {
        token: Arc<dyn TokenLedger>,
        to: Address,
        amount: U256,
    },
    /// Return PEG pulled into custody but not yet burned.
    RefundPeg {
        peg: Arc<dyn PegToken>,
        to: Address,
        amount: U256,
    },
    /// Reissue PEG that was pulled and burned.
    Remint {
        peg: Arc<dyn PegToken>,
        to: Address,
        amount: U256,
    },
}

pub(crate) struct Settlement {
    custody: Address,
    compensations: Vec<Compensation>,
    paid_out: bool,
}

fn transfer_failed(e: TokenError) -> EngineError {
    EngineError::TransferFailed(e.to_string())
}

impl Settlement {
    pub(crate) fn new(custody: Address) -> Self {
        Self {
            custody,
            compensations: Vec::new(),
            paid_out: false,
        }
    }

    /// Pull collateral from `owner` into custody.
    pub(crate) fn pull_collateral(
        &mut self,
        token: &Arc<dyn TokenLedger>,
        owner: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        debug_assert!(!self.paid_out, "pull after payout");
        token
            .transfer_from(owner, self.custody, amount)
            .map_err(transfer_failed)?;

        self.compensations.push(Compensation::Refund {
            token: Arc::clone(token),
            to: owner,
            amount,
        });
        Ok(())
    }

    /// Pull PEG from `payer` into custody and destroy it.
    pub(crate) fn pull_and_burn_peg(
        &mut self,
        peg: &Arc<dyn PegToken>,
        payer: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        debug_assert!(!self.paid_out, "pull after payout");
        peg.transfer_from(payer, self.custody, amount)
            .map_err(transfer_failed)?;

        if let Err(e) = peg.burn(self.custody, amount) {
            self.compensations.push(Compensation::RefundPeg {
                peg: Arc::clone(peg),
                to: payer,
                amount,
            });
            return Err(EngineError::TransferFailed(format!("burn failed: {e}")));
        }

        self.compensations.push(Compensation::Remint {
            peg: Arc::clone(peg),
            to: payer,
            amount,
        });
        Ok(())
    }

    /// Issue new PEG to `recipient`.
    pub(crate) fn mint_peg(
        &mut self,
        peg: &Arc<dyn PegToken>,
        recipient: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        peg.mint(self.custody, recipient, amount)
            .map_err(|e| EngineError::MintFailed(e.to_string()))?;
        self.paid_out = true;
        Ok(())
    }

    /// Pay collateral out of custody to `recipient`.
    pub(crate) fn pay_collateral(
        &mut self,
        token: &Arc<dyn TokenLedger>,
        recipient: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        token
            .transfer(self.custody, recipient, amount)
            .map_err(transfer_failed)?;
        self.paid_out = true;
        Ok(())
    }

    /// Reverse completed interactions, newest first. Returns a description of
    /// every compensation that could not be applied.
    pub(crate) fn unwind(self) -> Vec<String> {
        let custody = self.custody;
        let mut failures = Vec::new();

        for compensation in self.compensations.into_iter().rev() {
            let (kind, to, amount, result) = match compensation {
                Compensation::Refund { token, to, amount } => {
                    ("refund", to, amount, token.transfer(custody, to, amount))
                }
                Compensation::RefundPeg { peg, to, amount } => {
                    ("refund_peg", to, amount, peg.transfer(custody, to, amount))
                }
                Compensation::Remint { peg, to, amount } => {
                    ("remint", to, amount, peg.mint(custody, to, amount))
                }
            };

            match result {
                Ok(()) => tracing::debug!(kind, to = %to, amount = %amount, "Interaction reversed"),
                Err(e) => {
                    tracing::error!(
                        kind,
                        to = %to,
                        amount = %amount,
                        error = %e,
                        "Failed to reverse interaction"
                    );
                    failures.push(format!("{kind} of {amount} to {to} failed: {e}"));
                }
            }
        }
        failures
    }
}
