//! Claim a failed task: refund the payer, seize the stakes

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::{StakeSeized, TaskClaimed};
use crate::instructions::account_books::{split_remaining, ContributionBook, LedgerBook};
use crate::instructions::consensus_helpers::check_claimable;
use crate::instructions::settlement_helpers::{settle_claim, ClaimOutcome};
use crate::state::{Deal, ProtocolConfig, Task, TaskStatus};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct ClaimTask<'info> {
    #[account(
        mut,
        seeds = [b"task", task.deal_id.as_ref(), task.index.to_le_bytes().as_ref()],
        bump = task.bump
    )]
    pub task: Box<Account<'info, Task>>,

    #[account(
        mut,
        constraint = deal.key() == task.deal @ PocoError::InvalidAccountAddress
    )]
    pub deal: Box<Account<'info, Deal>>,

    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,
}

/// Anyone may claim. `remaining_accounts` holds one `Contribution` per task
/// contributor, then the ledgers of the payer, the scheduler and every
/// contributor.
pub fn handler(ctx: Context<ClaimTask>) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;

    let clock = Clock::get()?;
    check_claimable(&ctx.accounts.task, clock.unix_timestamp)?;

    let task = &ctx.accounts.task;
    let (contribution_infos, ledger_infos) =
        split_remaining(ctx.remaining_accounts, task.contributors.len())?;
    let mut contributions = ContributionBook::load(contribution_infos, task, ctx.program_id)?;
    let mut ledger = LedgerBook::load(
        ledger_infos,
        ctx.program_id,
        ctx.accounts.protocol_config.kitty,
    )?;

    let outcome = settle_claim(
        &ctx.accounts.deal,
        &mut contributions.contributions,
        &mut ledger,
    )?;
    contributions.commit()?;
    let kitty = ledger.commit()?;

    record_failure(
        &mut ctx.accounts.task,
        &mut ctx.accounts.deal,
        &mut ctx.accounts.protocol_config,
        kitty,
    )?;
    emit_claim(&ctx.accounts.task, &outcome, clock.unix_timestamp)
}

/// Mark `task` failed and count it against its deal and the protocol
pub(crate) fn record_failure(
    task: &mut Task,
    deal: &mut Deal,
    config: &mut ProtocolConfig,
    kitty: u64,
) -> Result<()> {
    task.status = TaskStatus::Failed;
    deal.tasks_settled = deal
        .tasks_settled
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;
    config.kitty = kitty;
    config.failed_tasks = config
        .failed_tasks
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;
    Ok(())
}

pub(crate) fn emit_claim(task: &Task, outcome: &ClaimOutcome, timestamp: i64) -> Result<()> {
    let mut seized_total: u64 = 0;
    for seized in &outcome.seized {
        seized_total = seized_total
            .checked_add(seized.amount)
            .ok_or(PocoError::ArithmeticOverflow)?;
        emit!(StakeSeized {
            task_id: task.task_id,
            party: seized.recipient,
            amount: seized.amount,
            timestamp,
        });
    }

    msg!(
        "Task {} claimed: refunded {}, seized {}",
        task.index,
        outcome.refunded,
        seized_total
    );

    emit!(TaskClaimed {
        task_id: task.task_id,
        deal_id: task.deal_id,
        refunded: outcome.refunded,
        seized: seized_total,
        timestamp,
    });
    Ok(())
}
