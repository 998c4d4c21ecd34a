//! Finalize a task and settle its payments

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::{RewardDistributed, StakeSeized, TaskCallback, TaskFinalized};
use crate::instructions::account_books::{split_remaining, ContributionBook, LedgerBook, ScoreBook};
use crate::instructions::consensus_helpers::check_finalize;
use crate::instructions::settlement_helpers::{settle_finalize, FinalizeOutcome};
use crate::state::{Deal, ProtocolConfig, Task, TaskStatus};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct FinalizeTask<'info> {
    #[account(
        mut,
        seeds = [b"task", task.deal_id.as_ref(), task.index.to_le_bytes().as_ref()],
        bump = task.bump
    )]
    pub task: Box<Account<'info, Task>>,

    #[account(
        mut,
        constraint = deal.key() == task.deal @ PocoError::InvalidAccountAddress,
        constraint = deal.workerpool_owner == scheduler.key() @ PocoError::UnauthorizedScheduler
    )]
    pub deal: Box<Account<'info, Deal>>,

    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    pub scheduler: Signer<'info>,
}

/// `remaining_accounts` layout:
/// - one `Contribution` per task contributor, in contribution order
/// - one `WorkerScore` per task contributor, same order
/// - the `LedgerAccount` of every party paid or charged: payer, app owner,
///   dataset owner, workers and scheduler, each once
pub fn handler(ctx: Context<FinalizeTask>, results: Vec<u8>, results_callback: Vec<u8>) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    check_version_compatible(config)?;

    let clock = Clock::get()?;
    let task = &ctx.accounts.task;
    let deal = &ctx.accounts.deal;
    check_finalize(task, deal, &results, &results_callback, clock.unix_timestamp)?;

    let contributors = task.contributors.len();
    let (contribution_infos, rest) = split_remaining(ctx.remaining_accounts, contributors)?;
    let (score_infos, ledger_infos) = split_remaining(rest, contributors)?;
    let mut contributions = ContributionBook::load(contribution_infos, task, ctx.program_id)?;
    let mut scores = ScoreBook::load(score_infos, task, ctx.program_id)?;
    let mut ledger = LedgerBook::load(ledger_infos, ctx.program_id, config.kitty)?;

    let outcome = settle_finalize(
        deal,
        &mut contributions.contributions,
        &mut ledger,
        &mut scores,
        config.kitty_ratio,
        config.kitty_min,
    )?;

    contributions.commit()?;
    scores.commit()?;
    let kitty = ledger.commit()?;

    let timestamp = clock.unix_timestamp;
    record_completion(
        &mut ctx.accounts.task,
        &mut ctx.accounts.deal,
        &mut ctx.accounts.protocol_config,
        kitty,
        outcome.task_price,
        results,
        results_callback,
    )?;
    emit_finalize(&ctx.accounts.task, &ctx.accounts.deal, &outcome, kitty, timestamp)
}

/// Close a settled task as COMPLETED and update the deal and protocol counters
pub(crate) fn record_completion(
    task: &mut Task,
    deal: &mut Deal,
    config: &mut ProtocolConfig,
    kitty: u64,
    task_price: u64,
    results: Vec<u8>,
    results_callback: Vec<u8>,
) -> Result<()> {
    config.kitty = kitty;
    config.completed_tasks = config
        .completed_tasks
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;
    config.total_value_settled = config
        .total_value_settled
        .checked_add(task_price)
        .ok_or(PocoError::ArithmeticOverflow)?;

    deal.tasks_settled = deal
        .tasks_settled
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;

    task.status = TaskStatus::Completed;
    task.results = results;
    task.results_callback = results_callback;
    Ok(())
}

/// Payout, seizure, finalize and callback events of a completed task
pub(crate) fn emit_finalize(
    task: &Task,
    deal: &Deal,
    outcome: &FinalizeOutcome,
    kitty: u64,
    timestamp: i64,
) -> Result<()> {
    let task_id = task.task_id;
    let scheduler = deal.workerpool_owner;
    if outcome.kitty_reward > 0 {
        msg!(
            "Kitty payout {} to scheduler {}, {} left",
            outcome.kitty_reward,
            scheduler,
            kitty
        );
    }

    let mut payouts = vec![(deal.app_owner, deal.app_price)];
    if deal.has_dataset() {
        payouts.push((deal.dataset_owner, deal.dataset_price));
    }
    payouts.extend(
        outcome
            .worker_rewards
            .iter()
            .map(|payout| (payout.recipient, payout.amount)),
    );
    payouts.push((
        scheduler,
        outcome
            .scheduler_reward
            .checked_add(outcome.kitty_reward)
            .ok_or(PocoError::ArithmeticOverflow)?,
    ));
    for (recipient, amount) in payouts {
        emit!(RewardDistributed {
            task_id,
            recipient,
            amount,
            timestamp,
        });
    }
    for seized in &outcome.seized {
        emit!(StakeSeized {
            task_id,
            party: seized.recipient,
            amount: seized.amount,
            timestamp,
        });
    }

    emit!(TaskFinalized {
        task_id,
        result_digest: task.result_digest,
        winners: outcome.worker_rewards.len() as u32,
        scheduler_reward: outcome.scheduler_reward,
        kitty_reward: outcome.kitty_reward,
        timestamp,
    });

    if deal.has_callback() {
        emit!(TaskCallback {
            task_id,
            callback: deal.callback,
            payload: task.results_callback.clone(),
            timestamp,
        });
    }

    Ok(())
}
