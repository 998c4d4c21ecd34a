//! Fuzz test runner for the PoCo market program
//!
//! Run with: cargo run --release
//! Or: cargo test (for property-based tests)

use poco_market_fuzz::*;
use proptest::prelude::*;
use std::time::Instant;

fn main() {
    println!("=== PoCo Market Fuzz Testing ===\n");

    let start = Instant::now();
    let mut total_tests = 0;
    let mut passed = 0;
    let mut failed = 0;

    println!("Running match_orders fuzz tests...");
    let (p, f) = run_match_orders_fuzz(200);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running task lifecycle fuzz tests...");
    let (p, f) = run_task_lifecycle_fuzz(200);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running reference scenarios...");
    let (p, f) = run_reference_scenarios();
    passed += p;
    failed += f;
    total_tests += p + f;

    let duration = start.elapsed();

    println!("\n=== Fuzz Testing Complete ===");
    println!("Total tests: {}", total_tests);
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!("Duration: {:?}", duration);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn run_match_orders_fuzz(iterations: usize) -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;
    let mut rejected = 0;

    let mut runner = proptest::test_runner::TestRunner::default();

    for i in 0..iterations {
        let input = any::<MatchOrdersInput>()
            .new_tree(&mut runner)
            .expect("Failed to generate MatchOrdersInput")
            .current();

        let result = simulate_match_orders(&input);
        if result.is_invariant_violation() {
            println!("  [FAIL] Iteration {}: {:?}", i, result);
            failed += 1;
        } else {
            if result.is_error() {
                rejected += 1;
            }
            passed += 1;
        }
    }

    println!(
        "  match_orders: {} passed ({} rejected as invalid), {} failed",
        passed, rejected, failed
    );
    (passed, failed)
}

fn run_task_lifecycle_fuzz(iterations: usize) -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;

    let mut runner = proptest::test_runner::TestRunner::default();

    for i in 0..iterations {
        let input = any::<LifecycleInput>()
            .new_tree(&mut runner)
            .expect("Failed to generate LifecycleInput")
            .current();

        let result = simulate_task_lifecycle(&input);
        if result.is_success() {
            passed += 1;
        } else {
            println!("  [FAIL] Iteration {}: {:?}", i, result);
            failed += 1;
        }
    }

    println!("  task_lifecycle: {} passed, {} failed", passed, failed);
    (passed, failed)
}

fn run_reference_scenarios() -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;

    let scenarios: [(&str, fn() -> SimulationResult); 5] = [
        ("price resolution", scenario_price_resolution),
        ("dissenter cannot reveal", scenario_dissenter_cannot_reveal),
        ("silent reveal claim", scenario_silent_reveal_claim),
        ("losing worker seized", scenario_losing_worker_seized),
        ("single step finalize", scenario_single_step_finalize),
    ];

    for (name, scenario) in scenarios {
        let result = scenario();
        if result.is_success() {
            passed += 1;
        } else {
            println!("  [FAIL] {}: {:?}", name, result);
            failed += 1;
        }
    }

    println!("  scenarios: {} passed, {} failed", passed, failed);
    (passed, failed)
}
