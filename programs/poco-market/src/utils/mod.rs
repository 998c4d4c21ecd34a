//! Shared utilities for the PoCo market program

pub mod hashing;
pub mod multisig;
pub mod validation;
pub mod version;
