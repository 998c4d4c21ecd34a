//! Fuzz target for whole task lifecycles
//!
//! Tests invariants:
//! - Value conservation from match to settlement
//! - All escrow released once the task is terminal
//! - Scores grow exactly for proved workers
//! - Terminal tasks cannot be settled twice
//!
//! Run with: cargo test --release -p poco-market-fuzz task_lifecycle

use crate::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn fuzz_task_lifecycle(input in any::<LifecycleInput>()) {
        let result = simulate_task_lifecycle(&input);
        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);
        prop_assert!(result.is_success(), "Unexpected rejection: {:?}", result);
    }
}

#[test]
fn test_silent_reveal_scenario() {
    let result = scenario_silent_reveal_claim();
    assert!(result.is_success(), "{:?}", result);
}

#[test]
fn test_losing_worker_scenario() {
    let result = scenario_losing_worker_seized();
    assert!(result.is_success(), "{:?}", result);
}
