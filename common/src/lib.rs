//! ChipVault Common Types
//!
//! This crate contains shared types used across the ChipVault ledger,
//! including account identifiers, error definitions and emitted events.

pub mod error;
pub mod events;
pub mod identifiers;

pub use error::*;
pub use events::*;
pub use identifiers::*;
