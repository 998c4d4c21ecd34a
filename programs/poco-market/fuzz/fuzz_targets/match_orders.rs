//! Fuzz target for match_orders
//!
//! Tests invariants:
//! - Matched prices never exceed the requester's ceilings
//! - Escrow locked equals task price times volume
//! - Matching moves no value between parties
//!
//! Run with: cargo test --release -p poco-market-fuzz match_orders

use crate::*;
use poco_market::orders::{Order, RequestOrder};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Arbitrary orders either fail to match or match consistently
    #[test]
    fn fuzz_match_orders(input in any::<MatchOrdersInput>()) {
        let result = simulate_match_orders(&input);
        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);
    }

    /// Any ceiling below an asked price rejects the match
    #[test]
    fn fuzz_match_orders_price_ceiling(
        app_price in 1u64..1_000u64,
        workerpool_price in 1u64..1_000u64,
        shortfall in 1u64..1_000u64,
        app_side in any::<bool>(),
    ) {
        let mut book = OrderBook::priced(app_price, None, workerpool_price, 1, 1);
        if app_side {
            book.request.app_max_price = app_price.saturating_sub(shortfall);
        } else {
            book.request.workerpool_max_price = workerpool_price.saturating_sub(shortfall);
        }
        let result = MarketSimulation::open(
            &book,
            poco_market::state::ProtocolConfig::default(),
            u64::MAX / 2,
            u64::MAX / 2,
            0,
        );
        prop_assert!(result.is_err(), "match accepted a price above its ceiling");
    }

    /// Changing the price, volume or salt of an order changes its hash
    #[test]
    fn fuzz_order_hash_binding(
        price in any::<u64>(),
        volume in any::<u64>(),
        salt in arb_id(),
        field in 0u8..3u8,
        delta in 1u64..u64::MAX,
    ) {
        let original = RequestOrder {
            app_max_price: price,
            volume,
            salt,
            ..RequestOrder::default()
        };
        let mut mutated = original.clone();
        match field {
            0 => mutated.app_max_price = price.wrapping_add(delta),
            1 => mutated.volume = volume.wrapping_add(delta),
            _ => mutated.salt[0] ^= (delta as u8).max(1),
        }
        let domain = [7u8; 32];
        prop_assert_eq!(
            check_order_hash_binding(&Order::Request(original.clone()), &Order::Request(mutated), &domain),
            OrderInvariantResult::Valid
        );

        let other_domain = [8u8; 32];
        let order = Order::Request(original);
        prop_assert_ne!(order.hash(&domain).unwrap(), order.hash(&other_domain).unwrap());
    }
}

#[test]
fn test_price_resolution_scenario() {
    let result = scenario_price_resolution();
    assert!(result.is_success(), "{:?}", result);
}
