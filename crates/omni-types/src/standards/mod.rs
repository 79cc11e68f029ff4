//! Standard-specific encoders.
//!
//! Each submodule implements the hashing or packing rules of one standard.
//! All functions here are pure: no I/O, no hidden state.

pub mod compact;
pub mod erc4337;
pub mod erc7579;
pub mod erc7739;
pub mod smart_session;
