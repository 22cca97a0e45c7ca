//! Error types for ChipVault ledger operations.
//!
//! Every variant is a local, synchronous, deterministic outcome that aborts
//! the whole operation with zero observable mutation. None are retried
//! internally; retry is the caller's responsibility and always safe from a
//! clean state.

use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A zero amount supplied where a positive amount is required.
    #[error("Amount must be positive")]
    InvalidAmount,

    /// A null identity supplied where a real account is required.
    #[error("Null identity supplied where a real account is required")]
    InvalidAddress,

    /// Spend/withdraw amount exceeds the caller's credit balance.
    #[error("Insufficient credits: requested {requested}, available {available}")]
    InsufficientCredits { requested: u64, available: u64 },

    /// The vault's own asset custody cannot cover a withdrawal.
    #[error("Insufficient reserve: required {required} tokens, vault holds {available}")]
    InsufficientReserve { required: u64, available: u64 },

    /// Withdrawal credit amount truncates to zero transferable token units.
    #[error("Withdrawal of {credits} credits converts to zero tokens at rate {rate}")]
    WithdrawalTooSmall { credits: u64, rate: u64 },

    /// Non-owner invoking a privileged operation.
    #[error("Access denied: caller is not the owner")]
    AccessDenied,

    /// The external asset-transfer capability reported failure.
    #[error("Asset transfer failed: {0}")]
    TransferFailed(String),

    /// A guarded operation was invoked while another was already in progress.
    #[error("Reentrant call rejected")]
    ReentrancyDetected,

    /// A credit would overflow the balance representation.
    #[error("Credit balance overflow")]
    BalanceOverflow,
}

impl LedgerError {
    /// Get error code for event payloads and diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::InvalidAddress => "INVALID_ADDRESS",
            LedgerError::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            LedgerError::InsufficientReserve { .. } => "INSUFFICIENT_RESERVE",
            LedgerError::WithdrawalTooSmall { .. } => "WITHDRAWAL_TOO_SMALL",
            LedgerError::AccessDenied => "ACCESS_DENIED",
            LedgerError::TransferFailed(_) => "TRANSFER_FAILED",
            LedgerError::ReentrancyDetected => "REENTRANCY_DETECTED",
            LedgerError::BalanceOverflow => "BALANCE_OVERFLOW",
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
