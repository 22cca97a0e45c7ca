//! Mutual exclusion against reentrant ledger operations.

use std::sync::atomic::{AtomicBool, Ordering};

use chipvault_common::{LedgerError, Result};

/// Guard preventing a ledger operation from being re-entered via a callback
/// triggered by the external asset-transfer capability.
///
/// The flag is transient: it is scoped to one top-level operation and always
/// returns to idle when the operation leaves the stack, on success and on
/// abort alike.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    locked: AtomicBool,
}

impl ReentrancyGuard {
    /// Create a new guard in the idle state.
    pub fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Enter the guarded region.
    ///
    /// Fails with `ReentrancyDetected` when another guarded operation is
    /// already in progress, without mutating anything. On success the
    /// returned section releases the guard when dropped.
    pub fn enter(&self) -> Result<GuardSection<'_>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            return Err(LedgerError::ReentrancyDetected);
        }
        Ok(GuardSection { guard: self })
    }

    /// Check whether a guarded operation is currently in progress.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}

/// Scoped acquisition of a [`ReentrancyGuard`]; releases on drop.
#[derive(Debug)]
pub struct GuardSection<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardSection<'_> {
    fn drop(&mut self) {
        self.guard.locked.store(false, Ordering::Release);
    }
}
