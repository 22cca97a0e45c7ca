//! Events emitted by the ledger.
//!
//! Each event is recorded exactly once per successful operation, never on a
//! failed or aborted one, and carries the account(s) and amounts involved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AccountId;

/// A state-change notification emitted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Tokens were pulled into the vault and credits issued.
    Deposited {
        account: AccountId,
        token_amount: u64,
        credit_amount: u64,
    },
    /// Credits were spent on gameplay.
    CreditsSpent { account: AccountId, amount: u64 },
    /// The operator awarded winnings.
    WinningsAwarded { account: AccountId, amount: u64 },
    /// Credits were redeemed and tokens paid out of the vault.
    Withdrawn {
        account: AccountId,
        credit_amount: u64,
        token_amount: u64,
    },
    /// Administrative identity was reassigned.
    OwnershipTransferred {
        previous_owner: AccountId,
        new_owner: AccountId,
    },
}

impl LedgerEvent {
    /// Accounts involved in this event.
    pub fn accounts(&self) -> Vec<&AccountId> {
        match self {
            LedgerEvent::Deposited { account, .. }
            | LedgerEvent::CreditsSpent { account, .. }
            | LedgerEvent::WinningsAwarded { account, .. }
            | LedgerEvent::Withdrawn { account, .. } => vec![account],
            LedgerEvent::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => vec![previous_owner, new_owner],
        }
    }

    /// Short kind label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::Deposited { .. } => "deposited",
            LedgerEvent::CreditsSpent { .. } => "credits_spent",
            LedgerEvent::WinningsAwarded { .. } => "winnings_awarded",
            LedgerEvent::Withdrawn { .. } => "withdrawn",
            LedgerEvent::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }
}

/// A recorded event in the ledger journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// The event payload.
    pub event: LedgerEvent,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl EventRecord {
    /// Wrap an event into a new record.
    pub fn new(event: LedgerEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            recorded_at: Utc::now(),
        }
    }

    /// Check whether the record involves the given account.
    pub fn involves(&self, account: &AccountId) -> bool {
        self.event.accounts().contains(&account)
    }
}
