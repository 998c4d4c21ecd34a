//! Ledger and score effects of finalize and claim.
//!
//! Both settlements consume exactly the escrow that matching and
//! contributing locked for one task: the payer's task price, the
//! scheduler's task stake and each contributor's worker stake. Nothing is
//! minted and nothing is burnt; value only moves between parties and the
//! kitty.

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::instructions::constants::PERCENT_BASE;
use crate::instructions::ledger_helpers::LedgerStore;
use crate::instructions::score_helpers::ScoreStore;
use crate::state::{Contribution, ContributionStatus, Deal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub recipient: Pubkey,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeOutcome {
    /// Share paid to each proved worker, in contribution order
    pub worker_rewards: Vec<Payout>,
    /// Stakes of losing or silent workers moved into the kitty
    pub seized: Vec<Payout>,
    /// Part of the workerpool price kept by the scheduler
    pub scheduler_reward: u64,
    /// Kitty payout added to the scheduler reward
    pub kitty_reward: u64,
    pub task_price: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// Task price returned to the payer
    pub refunded: u64,
    /// Scheduler and worker stakes moved into the kitty
    pub seized: Vec<Payout>,
}

/// Kitty payout on a finalize: a `ratio` percent slice, at least `min`,
/// never more than the kitty holds
pub fn kitty_share(kitty: u64, ratio: u8, min: u64) -> u64 {
    let proportional = (kitty as u128 * ratio as u128 / PERCENT_BASE as u128) as u64;
    kitty.min(proportional.max(min))
}

/// Split `pool` pro rata by `weights`, rounding every share down
pub fn split_worker_rewards(pool: u64, weights: &[u64]) -> Result<Vec<u64>> {
    let total: u128 = weights.iter().map(|weight| *weight as u128).sum();
    if total == 0 {
        return Ok(vec![0; weights.len()]);
    }
    weights
        .iter()
        .map(|weight| {
            u64::try_from(pool as u128 * *weight as u128 / total)
                .map_err(|_| error!(PocoError::ArithmeticOverflow))
        })
        .collect()
}

/// Pay everyone for a task whose consensus value was revealed
pub fn settle_finalize<L: LedgerStore, S: ScoreStore>(
    deal: &Deal,
    contributions: &mut [Contribution],
    ledger: &mut L,
    scores: &mut S,
    kitty_ratio: u8,
    kitty_min: u64,
) -> Result<FinalizeOutcome> {
    let task_price = deal.task_price().ok_or(PocoError::ArithmeticOverflow)?;
    let workers_ratio = PERCENT_BASE
        .checked_sub(deal.scheduler_reward_ratio as u64)
        .ok_or(PocoError::InvalidPercentage)?;
    let workers_pool = (deal.workerpool_price as u128 * workers_ratio as u128
        / PERCENT_BASE as u128) as u64;
    let winner_weights: Vec<u64> = contributions
        .iter()
        .filter(|contribution| contribution.status == ContributionStatus::Proved)
        .map(|contribution| contribution.weight)
        .collect();
    require!(!winner_weights.is_empty(), PocoError::NoRevealedContribution);
    let mut shares = split_worker_rewards(workers_pool, &winner_weights)?.into_iter();

    // Requester side: the task price leaves escrow and goes to the payees
    ledger.spend_locked(&deal.sponsor, task_price)?;
    ledger.reward(&deal.app_owner, deal.app_price)?;
    if deal.has_dataset() {
        ledger.reward(&deal.dataset_owner, deal.dataset_price)?;
    }

    let mut outcome = FinalizeOutcome {
        task_price,
        ..FinalizeOutcome::default()
    };
    let mut distributed = 0u64;
    for contribution in contributions.iter_mut() {
        if contribution.status == ContributionStatus::Proved {
            let share = shares.next().ok_or(PocoError::ArithmeticOverflow)?;
            ledger.unlock(&contribution.worker, deal.worker_stake)?;
            ledger.reward(&contribution.worker, share)?;
            contribution.score_delta = scores.increment(&contribution.worker)?;
            distributed = distributed
                .checked_add(share)
                .ok_or(PocoError::ArithmeticOverflow)?;
            outcome.worker_rewards.push(Payout {
                recipient: contribution.worker,
                amount: share,
            });
        } else {
            ledger.seize(&contribution.worker, deal.worker_stake)?;
            contribution.status = ContributionStatus::Rejected;
            outcome.seized.push(Payout {
                recipient: contribution.worker,
                amount: deal.worker_stake,
            });
        }
    }

    let scheduler = deal.workerpool_owner;
    outcome.scheduler_reward = deal
        .workerpool_price
        .checked_sub(distributed)
        .ok_or(PocoError::ArithmeticOverflow)?;
    ledger.unlock(&scheduler, deal.scheduler_stake)?;
    ledger.reward(&scheduler, outcome.scheduler_reward)?;

    outcome.kitty_reward = kitty_share(ledger.kitty(), kitty_ratio, kitty_min);
    if outcome.kitty_reward > 0 {
        ledger.pay_from_kitty(&scheduler, outcome.kitty_reward)?;
    }

    Ok(outcome)
}

/// Refund the payer of a failed task and seize every stake bound to it
pub fn settle_claim<L: LedgerStore>(
    deal: &Deal,
    contributions: &mut [Contribution],
    ledger: &mut L,
) -> Result<ClaimOutcome> {
    let refunded = deal.task_price().ok_or(PocoError::ArithmeticOverflow)?;
    ledger.unlock(&deal.sponsor, refunded)?;

    let mut outcome = ClaimOutcome {
        refunded,
        ..ClaimOutcome::default()
    };

    ledger.seize(&deal.workerpool_owner, deal.scheduler_stake)?;
    outcome.seized.push(Payout {
        recipient: deal.workerpool_owner,
        amount: deal.scheduler_stake,
    });

    for contribution in contributions.iter_mut() {
        if matches!(
            contribution.status,
            ContributionStatus::Contributed | ContributionStatus::Proved
        ) {
            ledger.seize(&contribution.worker, deal.worker_stake)?;
            contribution.status = ContributionStatus::Rejected;
            outcome.seized.push(Payout {
                recipient: contribution.worker,
                amount: deal.worker_stake,
            });
        }
    }

    Ok(outcome)
}
