//! Simulated fungible token for testing.

use dashmap::DashMap;

use chipvault_common::AccountId;
use chipvault_ledger::AssetTransfer;

/// An in-memory fungible token implementing the asset-transfer capability.
///
/// Transfers report failure (return `false`) when the source balance cannot
/// cover the amount; custody never changes on a failed transfer. Outbound
/// `transfer` calls debit the vault account the token was created with.
pub struct SimulatedToken {
    /// The vault identity debited by `transfer`.
    vault_account: AccountId,
    /// Token balances by account.
    balances: DashMap<AccountId, u64>,
}

impl SimulatedToken {
    /// Create a new token with the given vault identity.
    pub fn new(vault_account: AccountId) -> Self {
        Self {
            vault_account,
            balances: DashMap::new(),
        }
    }

    /// Mint tokens into an account (test setup only).
    pub fn mint(&self, account: &AccountId, amount: u64) {
        *self.balances.entry(account.clone()).or_insert(0) += amount;
    }

    /// Total tokens in circulation.
    pub fn total_supply(&self) -> u64 {
        self.balances.iter().map(|entry| *entry.value()).sum()
    }

    fn move_tokens(&self, from: &AccountId, to: &AccountId, amount: u64) -> bool {
        {
            let mut entry = match self.balances.get_mut(from) {
                Some(entry) => entry,
                None => return amount == 0,
            };
            let current = *entry;
            match current.checked_sub(amount) {
                Some(next) => *entry = next,
                None => return false,
            }
        }
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        true
    }
}

impl AssetTransfer for SimulatedToken {
    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: u64) -> bool {
        self.move_tokens(from, to, amount)
    }

    fn transfer(&self, to: &AccountId, amount: u64) -> bool {
        let vault = self.vault_account.clone();
        self.move_tokens(&vault, to, amount)
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        self.balances.get(account).map(|b| *b).unwrap_or(0)
    }
}
