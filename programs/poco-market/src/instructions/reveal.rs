//! Reveal the result digest behind a consensus contribution

use anchor_lang::prelude::*;

use crate::events::TaskRevealed;
use crate::instructions::consensus_helpers::apply_reveal;
use crate::state::{Contribution, ProtocolConfig, Task};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct Reveal<'info> {
    #[account(
        mut,
        seeds = [b"task", task.deal_id.as_ref(), task.index.to_le_bytes().as_ref()],
        bump = task.bump
    )]
    pub task: Box<Account<'info, Task>>,

    #[account(
        mut,
        seeds = [b"contribution", task.task_id.as_ref(), worker.key().as_ref()],
        bump = contribution.bump
    )]
    pub contribution: Account<'info, Contribution>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    pub worker: Signer<'info>,
}

pub fn handler(ctx: Context<Reveal>, digest: [u8; 32]) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;

    let clock = Clock::get()?;
    let worker = ctx.accounts.worker.key();
    let task = &mut ctx.accounts.task;
    apply_reveal(
        task,
        &mut ctx.accounts.contribution,
        &worker,
        digest,
        clock.unix_timestamp,
    )?;

    emit!(TaskRevealed {
        task_id: task.task_id,
        worker,
        digest,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}
