//! Update the stake and reward policy of a workerpool

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::WorkerpoolPolicyUpdated;
use crate::state::{Asset, AssetKind};
use crate::utils::validation::validate_percentage;

#[derive(Accounts)]
pub struct UpdateWorkerpoolPolicy<'info> {
    #[account(
        mut,
        seeds = [b"asset", workerpool.asset_id.as_ref()],
        bump = workerpool.bump,
        has_one = owner @ PocoError::UnauthorizedAssetOwner,
        constraint = workerpool.kind == AssetKind::Workerpool @ PocoError::AssetKindMismatch
    )]
    pub workerpool: Account<'info, Asset>,

    pub owner: Signer<'info>,
}

/// Policies apply to deals matched afterwards; existing deals keep the
/// stakes and ratios recorded at match time.
pub fn handler(
    ctx: Context<UpdateWorkerpoolPolicy>,
    worker_stake_ratio_policy: u8,
    scheduler_reward_ratio_policy: u8,
) -> Result<()> {
    validate_percentage(worker_stake_ratio_policy)?;
    validate_percentage(scheduler_reward_ratio_policy)?;

    let workerpool = &mut ctx.accounts.workerpool;
    workerpool.worker_stake_ratio_policy = worker_stake_ratio_policy;
    workerpool.scheduler_reward_ratio_policy = scheduler_reward_ratio_policy;

    emit!(WorkerpoolPolicyUpdated {
        workerpool: workerpool.key(),
        worker_stake_ratio_policy,
        scheduler_reward_ratio_policy,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
