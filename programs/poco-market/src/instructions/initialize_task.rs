//! Initialize one task of a deal

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::TaskInitialized;
use crate::instructions::consensus_helpers::activate_task;
use crate::state::{Deal, ProtocolConfig, Task};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
#[instruction(index: u64)]
pub struct InitializeTask<'info> {
    #[account(
        init,
        payer = scheduler,
        space = 8 + Task::INIT_SPACE,
        seeds = [b"task", deal.deal_id.as_ref(), index.to_le_bytes().as_ref()],
        bump
    )]
    pub task: Box<Account<'info, Task>>,

    #[account(
        mut,
        seeds = [b"deal", deal.request_hash.as_ref(), deal.bot_first.to_le_bytes().as_ref()],
        bump = deal.bump,
        constraint = deal.workerpool_owner == scheduler.key() @ PocoError::UnauthorizedScheduler
    )]
    pub deal: Box<Account<'info, Deal>>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(mut)]
    pub scheduler: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// The task account is created here, so a second initialization of the
/// same index fails on the existing account.
pub fn handler(ctx: Context<InitializeTask>, index: u64) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;

    let clock = Clock::get()?;
    let deal_key = ctx.accounts.deal.key();
    let deal = &mut ctx.accounts.deal;
    require!(
        clock.unix_timestamp < deal.final_deadline,
        PocoError::FinalDeadlineReached
    );

    let task = &mut ctx.accounts.task;
    activate_task(task, deal, deal_key, index)?;
    task.bump = ctx.bumps.task;
    deal.tasks_initialized = deal
        .tasks_initialized
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;

    emit!(TaskInitialized {
        task_id: task.task_id,
        deal_id: deal.deal_id,
        index,
        contribution_deadline: task.contribution_deadline,
        final_deadline: task.final_deadline,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}
