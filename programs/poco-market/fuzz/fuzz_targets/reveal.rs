//! Fuzz target for reveal
//!
//! Tests invariants:
//! - A reveal opens only the worker's own seal
//! - Only the consensus value can be revealed
//!
//! Run with: cargo test --release -p poco-market-fuzz reveal

use crate::*;
use poco_market::state::{ContributionStatus, ProtocolConfig, TaskStatus};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A worker cannot reveal with a digest other than the one it sealed,
    /// nor through another worker's contribution
    #[test]
    fn fuzz_reveal_binding(digest in arb_id(), wrong in arb_id()) {
        prop_assume!(digest != wrong && digest != [0u8; 32]);
        let book = OrderBook::priced(3, None, 25, 2, 1);
        let mut sim = MarketSimulation::open(&book, ProtocolConfig::default(), 28, 25, 0).unwrap();
        for index in 0..2 {
            sim.fund_worker(index, 0).unwrap();
            sim.contribute(index, digest, START + 1 + index as i64).unwrap();
        }
        prop_assert_eq!(sim.task.status, TaskStatus::Revealing);

        prop_assert!(sim.reveal(0, wrong, START + 5).is_err());

        // worker 1 presents worker 0's contribution
        let mut borrowed = sim.contributions[0].clone();
        let worker = worker_key(1);
        let stolen = poco_market::instructions::consensus_helpers::apply_reveal(
            &mut sim.task, &mut borrowed, &worker, digest, START + 5);
        prop_assert!(stolen.is_err());

        sim.reveal(0, digest, START + 5).unwrap();
        sim.reveal(1, digest, START + 5).unwrap();
        prop_assert!(sim.reveal(1, digest, START + 6).is_err(), "revealed twice");
        prop_assert_eq!(sim.task.reveal_counter, 2);
        prop_assert!(sim.contributions.iter().all(|c| c.status == ContributionStatus::Proved));
    }

    /// Reveals are refused at or after the reveal deadline
    #[test]
    fn fuzz_reveal_deadline(offset in 0i64..1_000i64) {
        let book = OrderBook::priced(3, None, 25, 1, 1);
        let mut sim = MarketSimulation::open(&book, ProtocolConfig::default(), 28, 25, 0).unwrap();
        sim.fund_worker(0, 0).unwrap();
        sim.contribute(0, DIGEST_CHOICES[0], START + 1).unwrap();
        let now = START + 1 + offset;
        let result = sim.reveal(0, DIGEST_CHOICES[0], now);
        prop_assert_eq!(result.is_ok(), now < sim.task.reveal_deadline);
    }
}

#[test]
fn test_dissenter_scenario() {
    let result = scenario_dissenter_cannot_reveal();
    assert!(result.is_success(), "{:?}", result);
}
