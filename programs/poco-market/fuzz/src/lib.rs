//! Property-based fuzz testing library for the PoCo market program
//!
//! Arbitrary orders and task histories are pushed through the program's
//! matching, consensus and settlement helpers over in-memory stores, and
//! the market invariants are checked after every step.
//!
//! # Usage
//!
//! ```bash
//! # Run all property-based tests
//! cargo test --release
//!
//! # Run the fuzz test runner
//! cargo run --release
//!
//! # Run with more iterations
//! PROPTEST_CASES=10000 cargo test --release
//! ```

pub mod arbitrary;
pub mod invariants;
pub mod scenarios;

pub use arbitrary::*;
pub use invariants::*;
pub use scenarios::*;

#[cfg(test)]
#[path = "../fuzz_targets/match_orders.rs"]
mod match_orders_tests;

#[cfg(test)]
#[path = "../fuzz_targets/contribute.rs"]
mod contribute_tests;

#[cfg(test)]
#[path = "../fuzz_targets/reveal.rs"]
mod reveal_tests;

#[cfg(test)]
#[path = "../fuzz_targets/task_lifecycle.rs"]
mod task_lifecycle_tests;
