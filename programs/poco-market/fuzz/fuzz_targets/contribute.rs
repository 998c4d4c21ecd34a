//! Fuzz target for contribute
//!
//! Tests invariants:
//! - Weight is monotone in score and never zero
//! - At most one result hash reaches the trust target
//! - Contributions after consensus are refused
//!
//! Run with: cargo test --release -p poco-market-fuzz contribute

use crate::*;
use poco_market::state::{ProtocolConfig, TaskStatus, WeightPolicy};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn fuzz_weight_monotonic(low in arb_score(), high in arb_score(), policy in 0u8..=1u8) {
        let policy = WeightPolicy::from_u8(policy).unwrap();
        prop_assert_eq!(check_weight_monotonic(policy, low, high), WeightInvariantResult::Valid);
    }

    /// Contribute every worker in turn and check consensus after each step
    #[test]
    fn fuzz_contribute_consensus(
        trust in 1u64..12u64,
        plans in prop::collection::vec(arb_worker_plan(), 1..=MAX_SIMULATED_WORKERS),
    ) {
        let book = OrderBook::priced(3, None, 25, trust, 1);
        let mut sim = MarketSimulation::open(&book, ProtocolConfig::default(), 28, 25, 0).unwrap();
        for (index, plan) in plans.iter().enumerate() {
            sim.fund_worker(index, plan.score).unwrap();
        }

        for (index, plan) in plans.iter().enumerate() {
            let before = sim.task.clone();
            let result = sim.contribute(index, DIGEST_CHOICES[plan.choice], START + 1 + index as i64);
            prop_assert_eq!(result.is_ok(), before.status == TaskStatus::Active);
            prop_assert_eq!(check_consensus_unique(&sim.task, trust), ConsensusInvariantResult::Valid);
            prop_assert_eq!(check_consensus_immutable(&before, &sim.task), ConsensusInvariantResult::Valid);
        }

        let reached = sim.task.groups.iter().any(|group| group.weight >= trust);
        prop_assert_eq!(reached, sim.task.status == TaskStatus::Revealing);
    }

    /// No contribution lands at or after the contribution deadline
    #[test]
    fn fuzz_contribute_deadline(offset in 0i64..10_000i64) {
        let book = OrderBook::priced(3, None, 25, 2, 1);
        let mut sim = MarketSimulation::open(&book, ProtocolConfig::default(), 28, 25, 0).unwrap();
        sim.fund_worker(0, 0).unwrap();
        let now = START + offset;
        let result = sim.contribute(0, DIGEST_CHOICES[0], now);
        prop_assert_eq!(result.is_ok(), now < sim.task.contribution_deadline);
    }
}
