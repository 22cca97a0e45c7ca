//! ChipVault Ledger Engine
//!
//! Converts a deposited fungible-token balance into gameplay credits and
//! back, with owner-gated awards and reentrancy-safe calls into the external
//! asset-transfer capability.

pub mod access;
pub mod asset;
pub mod engine;
pub mod guard;
pub mod journal;

pub use access::AccessControl;
pub use asset::AssetTransfer;
pub use engine::{CreditLedger, CREDIT_RATE};
pub use guard::{GuardSection, ReentrancyGuard};
pub use journal::EventLog;
