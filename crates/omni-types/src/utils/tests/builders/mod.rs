//! Builder patterns for account types
//!
//! This module provides fluent builder APIs for constructing bundles, sessions
//! and receipts with sensible defaults.

pub mod multichain_compact;
pub mod session;
pub mod user_operation_receipt;

// Re-export builders for convenience
pub use multichain_compact::MultiChainCompactBuilder;
pub use session::SessionBuilder;
pub use user_operation_receipt::UserOperationReceiptBuilder;
