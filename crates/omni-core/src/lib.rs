//! Core module for omnichain smart accounts.
//!
//! This crate sequences the hashing and signing layer with the chain,
//! bundler and orchestrator collaborators: it checks and installs sessions
//! and drives each transaction through prepare, sign, submit and wait.

/// Account facade.
pub mod account;
/// Per-account handles shared by every stage.
pub mod context;
/// Error taxonomy.
pub mod error;
/// User operation construction.
pub mod operations;
/// Transaction pipeline and its artifacts.
pub mod pipeline;
/// Bounded polling with backoff.
pub mod polling;
/// Session lifecycle management.
pub mod session;

#[cfg(test)]
mod fixtures;

pub use account::SmartAccount;
pub use context::AccountContext;
pub use error::{CoreError, ErrorKind};
pub use pipeline::{
	ExecutionOutcome, PipelineArtifact, PreparedPath, PreparedTransaction, SignedTransaction,
	TransactionPipeline, TransactionResult, TransactionSignature,
};
pub use polling::RetryPolicy;
pub use session::{InstallOutcome, SessionManager};
