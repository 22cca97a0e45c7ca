//! The external asset-transfer capability consumed by the ledger.

use chipvault_common::AccountId;

/// Minimal surface of the external fungible-asset interface the ledger
/// custodies and moves funds through.
///
/// Each call is a single blocking step with exactly two outcomes: it succeeds
/// or it reports failure. Implementations run code outside the ledger's
/// control and may attempt to call back into the ledger before returning;
/// the ledger's reentrancy guard rejects such calls.
pub trait AssetTransfer: Send + Sync {
    /// Move `amount` token units from `from` into `to`.
    ///
    /// Returns `false` when the transfer could not be performed; no custody
    /// changes in that case.
    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: u64) -> bool;

    /// Move `amount` token units from the capability's view of the caller
    /// (the vault) into `to`.
    fn transfer(&self, to: &AccountId, amount: u64) -> bool;

    /// Current token balance of `account`.
    fn balance_of(&self, account: &AccountId) -> u64;
}
