//! Test builders for account types
//!
//! This module provides fluent builder APIs for constructing various types
//! with sensible defaults for TESTING purposes.
pub mod builders;
