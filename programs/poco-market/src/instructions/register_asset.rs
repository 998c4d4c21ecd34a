//! Register an app, dataset or workerpool

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::AssetRegistered;
use crate::state::{Asset, AssetKind, ProtocolConfig};
use crate::utils::validation::validate_percentage;
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
#[instruction(asset_id: [u8; 32])]
pub struct RegisterAsset<'info> {
    #[account(
        init,
        payer = owner,
        space = 8 + Asset::INIT_SPACE,
        seeds = [b"asset", asset_id.as_ref()],
        bump
    )]
    pub asset: Account<'info, Asset>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<RegisterAsset>,
    asset_id: [u8; 32],
    kind: AssetKind,
    worker_stake_ratio_policy: u8,
    scheduler_reward_ratio_policy: u8,
) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;
    require!(asset_id != [0u8; 32], PocoError::InvalidInput);

    // Stake and reward policies only mean something for workerpools
    if kind == AssetKind::Workerpool {
        validate_percentage(worker_stake_ratio_policy)?;
        validate_percentage(scheduler_reward_ratio_policy)?;
    } else {
        require!(
            worker_stake_ratio_policy == 0 && scheduler_reward_ratio_policy == 0,
            PocoError::InvalidInput
        );
    }

    let clock = Clock::get()?;
    let asset = &mut ctx.accounts.asset;
    asset.asset_id = asset_id;
    asset.kind = kind;
    asset.owner = ctx.accounts.owner.key();
    asset.worker_stake_ratio_policy = worker_stake_ratio_policy;
    asset.scheduler_reward_ratio_policy = scheduler_reward_ratio_policy;
    asset.created_at = clock.unix_timestamp;
    asset.bump = ctx.bumps.asset;

    emit!(AssetRegistered {
        asset: asset.key(),
        asset_id,
        kind: kind as u8,
        owner: asset.owner,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}
