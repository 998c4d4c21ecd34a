//! Order reconciliation for `match_orders`.
//!
//! [`resolve_deal_terms`] is a pure function of the four orders, the
//! workerpool policy and the remaining volumes. It performs every compatibility check
//! and returns the resolved [`DealTerms`] without touching any account, so
//! the handler can reject a match before anything is written.
//!
//! Checks run in a fixed order and each failure has its own error:
//! identity, restrictions, price, category and trust, tag, volume.

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::instructions::constants::PERCENT_BASE;
use crate::orders::{restriction_allows, AppOrder, DatasetOrder, RequestOrder, WorkerpoolOrder};
use crate::state::tag;

/// Policies of the matched workerpool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerpoolPolicy {
    pub worker_stake_ratio: u8,
    pub scheduler_reward_ratio: u8,
}

/// Volume still available on each order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingVolumes {
    pub app: u64,
    pub dataset: Option<u64>,
    pub workerpool: u64,
    pub request: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DealTerms {
    pub app_price: u64,
    pub dataset_price: u64,
    pub workerpool_price: u64,
    /// Number of tasks the deal covers
    pub volume: u64,
    pub tag: u64,
    pub trust: u64,
    pub category: u64,
    /// Price the payer owes per task
    pub task_price: u64,
    /// Stake each contributing worker locks per task
    pub worker_stake: u64,
    /// Stake the workerpool owner locks per task
    pub scheduler_stake: u64,
    pub scheduler_reward_ratio: u8,
    /// Total escrow locked from the requester or sponsor
    pub payer_lock: u64,
    /// Total escrow locked from the workerpool owner
    pub scheduler_lock: u64,
}

/// Volume an order can still provide
pub fn remaining_volume(volume: u64, consumed: u64, cancelled: bool) -> Result<u64> {
    require!(!cancelled, PocoError::OrderCancelled);
    let remaining = volume.saturating_sub(consumed);
    require!(remaining > 0, PocoError::OrderFullyConsumed);
    Ok(remaining)
}

/// `price × ratio / 100`, rounded up when `round_up` is set
pub fn stake_from_price(price: u64, ratio: u8, round_up: bool) -> Result<u64> {
    let scaled = price
        .checked_mul(ratio as u64)
        .ok_or(PocoError::ArithmeticOverflow)?;
    let stake = if round_up {
        scaled
            .checked_add(PERCENT_BASE - 1)
            .ok_or(PocoError::ArithmeticOverflow)?
            / PERCENT_BASE
    } else {
        scaled / PERCENT_BASE
    };
    Ok(stake)
}

fn check_identity(
    app: &AppOrder,
    dataset: Option<&DatasetOrder>,
    workerpool: &WorkerpoolOrder,
    request: &RequestOrder,
) -> Result<()> {
    require_keys_eq!(request.app, app.app, PocoError::AppMismatch);
    match dataset {
        Some(dataset) => require_keys_eq!(request.dataset, dataset.dataset, PocoError::DatasetMismatch),
        None => require_keys_eq!(request.dataset, Pubkey::default(), PocoError::DatasetMismatch),
    }
    require!(
        request.workerpool == Pubkey::default() || request.workerpool == workerpool.workerpool,
        PocoError::WorkerpoolMismatch
    );
    Ok(())
}

fn check_restrictions(
    app: &AppOrder,
    dataset: Option<&DatasetOrder>,
    workerpool: &WorkerpoolOrder,
    request: &RequestOrder,
) -> Result<()> {
    let dataset_key = dataset.map(|order| order.dataset).unwrap_or_default();

    require!(
        restriction_allows(&app.dataset_restrict, &dataset_key),
        PocoError::DatasetRestricted
    );
    require!(
        restriction_allows(&app.workerpool_restrict, &workerpool.workerpool),
        PocoError::WorkerpoolRestricted
    );
    require!(
        restriction_allows(&app.requester_restrict, &request.requester),
        PocoError::RequesterRestricted
    );

    if let Some(dataset) = dataset {
        require!(
            restriction_allows(&dataset.app_restrict, &app.app),
            PocoError::AppRestricted
        );
        require!(
            restriction_allows(&dataset.workerpool_restrict, &workerpool.workerpool),
            PocoError::WorkerpoolRestricted
        );
        require!(
            restriction_allows(&dataset.requester_restrict, &request.requester),
            PocoError::RequesterRestricted
        );
    }

    require!(
        restriction_allows(&workerpool.app_restrict, &app.app),
        PocoError::AppRestricted
    );
    require!(
        restriction_allows(&workerpool.dataset_restrict, &dataset_key),
        PocoError::DatasetRestricted
    );
    require!(
        restriction_allows(&workerpool.requester_restrict, &request.requester),
        PocoError::RequesterRestricted
    );
    Ok(())
}

/// Validate that four orders can form a deal and resolve its terms
pub fn resolve_deal_terms(
    app: &AppOrder,
    dataset: Option<&DatasetOrder>,
    workerpool: &WorkerpoolOrder,
    request: &RequestOrder,
    policy: &WorkerpoolPolicy,
    remaining: &RemainingVolumes,
) -> Result<DealTerms> {
    check_identity(app, dataset, workerpool, request)?;
    check_restrictions(app, dataset, workerpool, request)?;

    // Providers' ask prices against the requester's ceilings
    let dataset_price = dataset.map(|order| order.dataset_price).unwrap_or(0);
    require!(
        request.app_max_price >= app.app_price,
        PocoError::AppPriceTooHigh
    );
    require!(
        request.dataset_max_price >= dataset_price,
        PocoError::DatasetPriceTooHigh
    );
    require!(
        request.workerpool_max_price >= workerpool.workerpool_price,
        PocoError::WorkerpoolPriceTooHigh
    );

    require!(
        request.category == workerpool.category,
        PocoError::CategoryMismatch
    );
    require!(workerpool.trust >= request.trust, PocoError::TrustMismatch);

    let required = request.tag | dataset.map(|order| order.tag).unwrap_or(0);
    require!(
        tag::covers(workerpool.tag, required | app.tag),
        PocoError::TagMismatch
    );
    require!(
        tag::covers(app.tag, required & tag::TEE),
        PocoError::TagMismatch
    );

    let mut volume = remaining
        .app
        .min(remaining.workerpool)
        .min(remaining.request);
    if let Some(dataset_remaining) = remaining.dataset {
        volume = volume.min(dataset_remaining);
    }
    require!(volume > 0, PocoError::OrderFullyConsumed);
    if request.tag & tag::BAG_OF_TASKS == 0 {
        volume = 1;
    }

    let task_price = app
        .app_price
        .checked_add(dataset_price)
        .and_then(|sum| sum.checked_add(workerpool.workerpool_price))
        .ok_or(PocoError::ArithmeticOverflow)?;
    let worker_stake = stake_from_price(workerpool.workerpool_price, policy.worker_stake_ratio, false)?;
    let scheduler_stake = stake_from_price(workerpool.workerpool_price, policy.worker_stake_ratio, true)?;

    Ok(DealTerms {
        app_price: app.app_price,
        dataset_price,
        workerpool_price: workerpool.workerpool_price,
        volume,
        tag: required | app.tag,
        // at least one unit of weight
        trust: request.trust.max(1),
        category: request.category,
        task_price,
        worker_stake,
        scheduler_stake,
        scheduler_reward_ratio: policy.scheduler_reward_ratio,
        payer_lock: task_price
            .checked_mul(volume)
            .ok_or(PocoError::ArithmeticOverflow)?,
        scheduler_lock: scheduler_stake
            .checked_mul(volume)
            .ok_or(PocoError::ArithmeticOverflow)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        app: AppOrder,
        dataset: DatasetOrder,
        workerpool: WorkerpoolOrder,
        request: RequestOrder,
        policy: WorkerpoolPolicy,
        remaining: RemainingVolumes,
    }

    impl Fixture {
        /// Scenario prices: app 3, dataset 1, workerpool 25
        fn new() -> Self {
            let app = AppOrder {
                app: Pubkey::new_unique(),
                app_price: 3,
                volume: 10,
                ..AppOrder::default()
            };
            let dataset = DatasetOrder {
                dataset: Pubkey::new_unique(),
                dataset_price: 1,
                volume: 10,
                ..DatasetOrder::default()
            };
            let workerpool = WorkerpoolOrder {
                workerpool: Pubkey::new_unique(),
                workerpool_price: 25,
                volume: 10,
                category: 2,
                trust: 3,
                tag: tag::BAG_OF_TASKS,
                ..WorkerpoolOrder::default()
            };
            let request = RequestOrder {
                app: app.app,
                app_max_price: 3,
                dataset: dataset.dataset,
                dataset_max_price: 1,
                workerpool_max_price: 25,
                requester: Pubkey::new_unique(),
                volume: 4,
                category: 2,
                trust: 3,
                tag: tag::BAG_OF_TASKS,
                ..RequestOrder::default()
            };
            let policy = WorkerpoolPolicy {
                worker_stake_ratio: 30,
                scheduler_reward_ratio: 20,
            };
            Self {
                app,
                dataset,
                workerpool,
                request,
                policy,
                remaining: RemainingVolumes {
                    app: 10,
                    dataset: Some(10),
                    workerpool: 10,
                    request: 4,
                },
            }
        }

        fn resolve(&self) -> Result<DealTerms> {
            resolve_deal_terms(
                &self.app,
                Some(&self.dataset),
                &self.workerpool,
                &self.request,
                &self.policy,
                &self.remaining,
            )
        }
    }

    fn assert_error(result: Result<DealTerms>, expected: PocoError) {
        let err = result.expect_err("match should fail");
        assert_eq!(err, error!(expected));
    }

    mod terms_tests {
        use super::*;

        #[test]
        fn test_scenario_prices_and_escrow() {
            let fixture = Fixture::new();
            let terms = fixture.resolve().unwrap();
            assert_eq!(terms.task_price, 29);
            assert_eq!(terms.volume, 4);
            assert_eq!(terms.payer_lock, 29 * 4);
            // 25 * 30 / 100 = 7.5
            assert_eq!(terms.worker_stake, 7);
            assert_eq!(terms.scheduler_stake, 8);
            assert_eq!(terms.scheduler_lock, 8 * 4);
            assert_eq!(terms.scheduler_reward_ratio, 20);
        }

        #[test]
        fn test_provider_ask_price_is_used() {
            let mut fixture = Fixture::new();
            fixture.request.app_max_price = 100;
            fixture.request.workerpool_max_price = 100;
            let terms = fixture.resolve().unwrap();
            assert_eq!(terms.app_price, 3);
            assert_eq!(terms.workerpool_price, 25);
        }

        #[test]
        fn test_volume_is_minimum_of_remaining() {
            let mut fixture = Fixture::new();
            fixture.remaining.dataset = Some(2);
            assert_eq!(fixture.resolve().unwrap().volume, 2);
        }

        #[test]
        fn test_volume_capped_without_bag_of_tasks() {
            let mut fixture = Fixture::new();
            fixture.request.tag = 0;
            assert_eq!(fixture.resolve().unwrap().volume, 1);
        }

        #[test]
        fn test_no_dataset() {
            let mut fixture = Fixture::new();
            fixture.request.dataset = Pubkey::default();
            fixture.request.dataset_max_price = 0;
            fixture.remaining.dataset = None;
            let terms = resolve_deal_terms(
                &fixture.app,
                None,
                &fixture.workerpool,
                &fixture.request,
                &fixture.policy,
                &fixture.remaining,
            )
            .unwrap();
            assert_eq!(terms.task_price, 28);
            assert_eq!(terms.dataset_price, 0);
        }

        #[test]
        fn test_wildcard_workerpool() {
            let mut fixture = Fixture::new();
            fixture.request.workerpool = Pubkey::default();
            assert!(fixture.resolve().is_ok());
            fixture.request.workerpool = fixture.workerpool.workerpool;
            assert!(fixture.resolve().is_ok());
        }

        #[test]
        fn test_deal_tag_merges_requirements() {
            let mut fixture = Fixture::new();
            fixture.dataset.tag = tag::GPU;
            fixture.app.tag = tag::TEE;
            fixture.workerpool.tag = tag::TEE | tag::GPU | tag::BAG_OF_TASKS;
            let terms = fixture.resolve().unwrap();
            assert_eq!(terms.tag, tag::TEE | tag::GPU | tag::BAG_OF_TASKS);
        }

        #[test]
        fn test_stake_rounding() {
            assert_eq!(stake_from_price(25, 30, false).unwrap(), 7);
            assert_eq!(stake_from_price(25, 30, true).unwrap(), 8);
            assert_eq!(stake_from_price(100, 30, true).unwrap(), 30);
            assert_eq!(stake_from_price(0, 30, true).unwrap(), 0);
            assert!(stake_from_price(u64::MAX, 2, false).is_err());
        }
    }

    mod rejection_tests {
        use super::*;

        #[test]
        fn test_identity_mismatches() {
            let mut fixture = Fixture::new();
            fixture.request.app = Pubkey::new_unique();
            assert_error(fixture.resolve(), PocoError::AppMismatch);

            let mut fixture = Fixture::new();
            fixture.request.dataset = Pubkey::new_unique();
            assert_error(fixture.resolve(), PocoError::DatasetMismatch);

            let mut fixture = Fixture::new();
            fixture.request.workerpool = Pubkey::new_unique();
            assert_error(fixture.resolve(), PocoError::WorkerpoolMismatch);
        }

        #[test]
        fn test_missing_dataset_order_for_dataset_request() {
            let fixture = Fixture::new();
            let result = resolve_deal_terms(
                &fixture.app,
                None,
                &fixture.workerpool,
                &fixture.request,
                &fixture.policy,
                &fixture.remaining,
            );
            assert_error(result, PocoError::DatasetMismatch);
        }

        #[test]
        fn test_restrictions() {
            let mut fixture = Fixture::new();
            fixture.app.requester_restrict = vec![Pubkey::new_unique()];
            assert_error(fixture.resolve(), PocoError::RequesterRestricted);

            let mut fixture = Fixture::new();
            fixture.dataset.app_restrict = vec![Pubkey::new_unique()];
            assert_error(fixture.resolve(), PocoError::AppRestricted);

            let mut fixture = Fixture::new();
            fixture.workerpool.dataset_restrict = vec![Pubkey::new_unique()];
            assert_error(fixture.resolve(), PocoError::DatasetRestricted);

            let mut fixture = Fixture::new();
            fixture.app.workerpool_restrict = vec![Pubkey::new_unique()];
            assert_error(fixture.resolve(), PocoError::WorkerpoolRestricted);

            let mut fixture = Fixture::new();
            fixture.app.workerpool_restrict = vec![Pubkey::new_unique(), fixture.workerpool.workerpool];
            assert!(fixture.resolve().is_ok());
        }

        #[test]
        fn test_prices_above_ceiling() {
            let mut fixture = Fixture::new();
            fixture.app.app_price = 4;
            assert_error(fixture.resolve(), PocoError::AppPriceTooHigh);

            let mut fixture = Fixture::new();
            fixture.dataset.dataset_price = 2;
            assert_error(fixture.resolve(), PocoError::DatasetPriceTooHigh);

            let mut fixture = Fixture::new();
            fixture.workerpool.workerpool_price = 26;
            assert_error(fixture.resolve(), PocoError::WorkerpoolPriceTooHigh);
        }

        #[test]
        fn test_category_and_trust() {
            let mut fixture = Fixture::new();
            fixture.workerpool.category = 3;
            assert_error(fixture.resolve(), PocoError::CategoryMismatch);

            let mut fixture = Fixture::new();
            fixture.request.trust = 4;
            assert_error(fixture.resolve(), PocoError::TrustMismatch);
        }

        #[test]
        fn test_tags() {
            let mut fixture = Fixture::new();
            fixture.request.tag |= tag::GPU;
            assert_error(fixture.resolve(), PocoError::TagMismatch);

            // workerpool offers TEE but the app cannot run in an enclave
            let mut fixture = Fixture::new();
            fixture.request.tag |= tag::TEE;
            fixture.workerpool.tag = tag::TEE | tag::BAG_OF_TASKS;
            assert_error(fixture.resolve(), PocoError::TagMismatch);
        }

        #[test]
        fn test_exhausted_volume() {
            let mut fixture = Fixture::new();
            fixture.remaining.workerpool = 0;
            assert_error(fixture.resolve(), PocoError::OrderFullyConsumed);
        }

        #[test]
        fn test_remaining_volume() {
            assert_eq!(remaining_volume(5, 2, false).unwrap(), 3);
            assert!(remaining_volume(5, 5, false).is_err());
            assert!(remaining_volume(5, 0, true).is_err());
        }
    }
}
