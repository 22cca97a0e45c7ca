//! Access control for the single administrative identity.

use parking_lot::RwLock;
use tracing::info;

use chipvault_common::{AccountId, LedgerError, Result};

/// Identifies and gates the single privileged identity (the operator).
///
/// The owner is set at construction and reassigned only through
/// [`transfer_ownership`](AccessControl::transfer_ownership); it is never the
/// null identity.
#[derive(Debug)]
pub struct AccessControl {
    owner: RwLock<AccountId>,
}

impl AccessControl {
    /// Create with the given initial owner.
    pub fn new(owner: AccountId) -> Result<Self> {
        if owner.is_null() {
            return Err(LedgerError::InvalidAddress);
        }
        Ok(Self {
            owner: RwLock::new(owner),
        })
    }

    /// Get the current owner.
    pub fn current_owner(&self) -> AccountId {
        self.owner.read().clone()
    }

    /// Fail with `AccessDenied` unless `caller` is the owner.
    pub fn require_owner(&self, caller: &AccountId) -> Result<()> {
        if *self.owner.read() != *caller {
            return Err(LedgerError::AccessDenied);
        }
        Ok(())
    }

    /// Reassign the owner. Only the current owner may do this, and the new
    /// owner must be a real identity. Returns the previous owner.
    pub fn transfer_ownership(&self, caller: &AccountId, new_owner: &AccountId) -> Result<AccountId> {
        if new_owner.is_null() {
            return Err(LedgerError::InvalidAddress);
        }

        let mut owner = self.owner.write();
        if *owner != *caller {
            return Err(LedgerError::AccessDenied);
        }

        let previous = std::mem::replace(&mut *owner, new_owner.clone());
        info!(previous_owner = %previous, new_owner = %new_owner, "Ownership transferred");
        Ok(previous)
    }
}
