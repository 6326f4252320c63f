//! Reentrancy protection for state-changing engine operations.
//!
//! Token collaborators run foreign code in the middle of an operation. A
//! collaborator holding a guard handle can observe that the engine is busy,
//! and any attempt to start a second operation through it is refused.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pegvault_common::error::EngineError;

#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    entered: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the engine busy until the returned token is dropped.
    pub fn enter(&self) -> Result<Entered, EngineError> {
        if self.entered.swap(true, Ordering::AcqRel) {
            tracing::warn!("Rejected reentrant engine call");
            return Err(EngineError::Reentrancy);
        }
        Ok(Entered {
            entered: Arc::clone(&self.entered),
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Held for the duration of one operation.
#[derive(Debug)]
pub struct Entered {
    entered: Arc<AtomicBool>,
}

impl Drop for Entered {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}
