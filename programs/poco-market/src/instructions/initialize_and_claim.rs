//! Create a task that was never initialized and claim it in one step

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::TaskInitialized;
use crate::instructions::account_books::LedgerBook;
use crate::instructions::claim_task::{emit_claim, record_failure};
use crate::instructions::consensus_helpers::{activate_task, check_claimable};
use crate::instructions::settlement_helpers::settle_claim;
use crate::state::{Deal, ProtocolConfig, Task};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
#[instruction(index: u64)]
pub struct InitializeAndClaim<'info> {
    #[account(
        init,
        payer = payer,
        space = 8 + Task::INIT_SPACE,
        seeds = [b"task", deal.deal_id.as_ref(), index.to_le_bytes().as_ref()],
        bump
    )]
    pub task: Box<Account<'info, Task>>,

    #[account(
        mut,
        seeds = [b"deal", deal.request_hash.as_ref(), deal.bot_first.to_le_bytes().as_ref()],
        bump = deal.bump
    )]
    pub deal: Box<Account<'info, Deal>>,

    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// `remaining_accounts` holds the ledgers of the deal payer and the scheduler.
pub fn handler(ctx: Context<InitializeAndClaim>, index: u64) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;

    let clock = Clock::get()?;
    require!(
        clock.unix_timestamp >= ctx.accounts.deal.final_deadline,
        PocoError::DealNotExpired
    );

    let deal_key = ctx.accounts.deal.key();
    let task = &mut ctx.accounts.task;
    activate_task(task, &ctx.accounts.deal, deal_key, index)?;
    task.bump = ctx.bumps.task;
    check_claimable(task, clock.unix_timestamp)?;

    emit!(TaskInitialized {
        task_id: task.task_id,
        deal_id: task.deal_id,
        index,
        contribution_deadline: task.contribution_deadline,
        final_deadline: task.final_deadline,
        timestamp: clock.unix_timestamp,
    });

    let mut ledger = LedgerBook::load(
        ctx.remaining_accounts,
        ctx.program_id,
        ctx.accounts.protocol_config.kitty,
    )?;
    let outcome = settle_claim(&ctx.accounts.deal, &mut [], &mut ledger)?;
    let kitty = ledger.commit()?;

    let deal = &mut ctx.accounts.deal;
    deal.tasks_initialized = deal
        .tasks_initialized
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;
    record_failure(
        &mut ctx.accounts.task,
        deal,
        &mut ctx.accounts.protocol_config,
        kitty,
    )?;
    emit_claim(&ctx.accounts.task, &outcome, clock.unix_timestamp)
}
