//! Arbitrary input generators for fuzz testing
//!
//! Generates random but mostly well-formed orders and task histories.

use proptest::prelude::*;

/// Digests workers pick their results from. Few choices make ties likely.
pub const DIGEST_CHOICES: [[u8; 32]; 3] = [[0x11; 32], [0x22; 32], [0x33; 32]];

/// Maximum number of workers in a simulated task
pub const MAX_SIMULATED_WORKERS: usize = 8;

/// Arbitrary 32-byte salt or identifier
pub fn arb_id() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Arbitrary order price with edge cases
pub fn arb_price() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1u64),
        Just(u64::MAX),
        1u64..100u64,
        100u64..1_000_000_000u64,
    ]
}

/// Arbitrary order volume, zero included
pub fn arb_volume() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1u64),
        Just(u64::MAX),
        1u64..16u64,
    ]
}

/// Arbitrary percentage (0-100)
pub fn arb_ratio() -> impl Strategy<Value = u8> {
    prop_oneof![
        Just(0u8),
        Just(100u8),
        Just(30u8), // typical worker stake ratio
        0u8..=100u8,
    ]
}

/// Arbitrary worker score
pub fn arb_score() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(u64::MAX),
        0u64..10u64,
        10u64..100_000u64,
    ]
}

/// Arbitrary tag bitmask over the named capability bits
pub fn arb_tag() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1u64), // TEE
        Just(2u64), // BAG_OF_TASKS
        0u64..32u64,
    ]
}

/// Arbitrary kitty balance
pub fn arb_kitty() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1_000_000_000u64),
        0u64..10_000u64,
    ]
}

/// Input for match_orders fuzz testing
#[derive(Debug, Clone)]
pub struct MatchOrdersInput {
    pub app_price: u64,
    pub dataset_price: Option<u64>,
    pub workerpool_price: u64,
    pub app_max_price: u64,
    pub dataset_max_price: u64,
    pub workerpool_max_price: u64,
    pub app_volume: u64,
    pub dataset_volume: u64,
    pub workerpool_volume: u64,
    pub request_volume: u64,
    pub app_tag: u64,
    pub workerpool_tag: u64,
    pub request_tag: u64,
    pub request_trust: u64,
    pub workerpool_trust: u64,
    pub worker_stake_ratio: u8,
    pub scheduler_reward_ratio: u8,
    pub requester_deposit: u64,
    pub scheduler_deposit: u64,
    pub salt: [u8; 32],
}

impl Arbitrary for MatchOrdersInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let prices = (
            arb_price(),
            proptest::option::of(arb_price()),
            arb_price(),
            arb_price(),
            arb_price(),
            arb_price(),
        );
        let volumes = (arb_volume(), arb_volume(), arb_volume(), arb_volume());
        let terms = (
            arb_tag(),
            arb_tag(),
            arb_tag(),
            0u64..8u64,
            0u64..8u64,
            arb_ratio(),
            arb_ratio(),
        );
        let funds = (arb_price(), arb_price(), arb_id());

        (prices, volumes, terms, funds)
            .prop_map(
                |(
                    (app_price, dataset_price, workerpool_price, app_max_price, dataset_max_price, workerpool_max_price),
                    (app_volume, dataset_volume, workerpool_volume, request_volume),
                    (app_tag, workerpool_tag, request_tag, request_trust, workerpool_trust, worker_stake_ratio, scheduler_reward_ratio),
                    (requester_deposit, scheduler_deposit, salt),
                )| {
                    MatchOrdersInput {
                        app_price,
                        dataset_price,
                        workerpool_price,
                        app_max_price,
                        dataset_max_price,
                        workerpool_max_price,
                        app_volume,
                        dataset_volume,
                        workerpool_volume,
                        request_volume,
                        app_tag,
                        workerpool_tag,
                        request_tag,
                        request_trust,
                        workerpool_trust,
                        worker_stake_ratio,
                        scheduler_reward_ratio,
                        requester_deposit,
                        scheduler_deposit,
                        salt,
                    }
                },
            )
            .boxed()
    }
}

/// One worker's part in a simulated task
#[derive(Debug, Clone)]
pub struct WorkerPlan {
    pub score: u64,
    /// Index into [`DIGEST_CHOICES`]
    pub choice: usize,
    pub reveals: bool,
}

/// Input for whole-task lifecycle fuzz testing
#[derive(Debug, Clone)]
pub struct LifecycleInput {
    pub app_price: u64,
    pub dataset_price: Option<u64>,
    pub workerpool_price: u64,
    pub worker_stake_ratio: u8,
    pub scheduler_reward_ratio: u8,
    pub trust: u64,
    pub weight_policy: u8,
    pub kitty: u64,
    pub kitty_ratio: u8,
    pub kitty_min: u64,
    pub workers: Vec<WorkerPlan>,
    /// Scheduler never finalizes, the task gets claimed after its final deadline
    pub scheduler_absent: bool,
}

pub fn arb_worker_plan() -> impl Strategy<Value = WorkerPlan> {
    (0u64..20u64, 0usize..DIGEST_CHOICES.len(), any::<bool>())
        .prop_map(|(score, choice, reveals)| WorkerPlan {
            score,
            choice,
            reveals,
        })
}

impl Arbitrary for LifecycleInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let deal = (
            0u64..1_000u64,
            proptest::option::of(0u64..1_000u64),
            0u64..10_000u64,
            arb_ratio(),
            arb_ratio(),
            1u64..12u64,
            0u8..=1u8,
        );
        let kitty = (arb_kitty(), arb_ratio(), prop_oneof![Just(0u64), 0u64..500u64]);
        let workers = (
            prop::collection::vec(arb_worker_plan(), 1..=MAX_SIMULATED_WORKERS),
            any::<bool>(),
        );

        (deal, kitty, workers)
            .prop_map(
                |(
                    (app_price, dataset_price, workerpool_price, worker_stake_ratio, scheduler_reward_ratio, trust, weight_policy),
                    (kitty, kitty_ratio, kitty_min),
                    (workers, scheduler_absent),
                )| {
                    LifecycleInput {
                        app_price,
                        dataset_price,
                        workerpool_price,
                        worker_stake_ratio,
                        scheduler_reward_ratio,
                        trust,
                        weight_policy,
                        kitty,
                        kitty_ratio,
                        kitty_min,
                        workers,
                        scheduler_absent,
                    }
                },
            )
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_arb_ratio_within_bounds(ratio in arb_ratio()) {
            prop_assert!(ratio <= 100);
        }

        #[test]
        fn test_lifecycle_input_generates(input in any::<LifecycleInput>()) {
            prop_assert!(!input.workers.is_empty());
            prop_assert!(input.workers.len() <= MAX_SIMULATED_WORKERS);
            prop_assert!(input.trust >= 1);
            prop_assert!(input.workers.iter().all(|w| w.choice < DIGEST_CHOICES.len()));
        }
    }
}
