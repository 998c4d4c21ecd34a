//! Initialize protocol configuration and the custody vault

use crate::errors::PocoError;
use crate::events::ProtocolInitialized;
use crate::state::{ProtocolConfig, Vault, WeightPolicy, CURRENT_PROTOCOL_VERSION, MIN_SUPPORTED_VERSION};
use crate::utils::hashing::domain_separator;
use crate::utils::multisig::{count_approvals, validate_multisig_owners};
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct InitializeProtocol<'info> {
    #[account(
        init,
        payer = authority,
        space = ProtocolConfig::SIZE,
        seeds = [b"protocol"],
        bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(
        init,
        payer = authority,
        space = 8 + Vault::INIT_SPACE,
        seeds = [b"vault"],
        bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<InitializeProtocol>,
    stake_mint: Option<Pubkey>,
    tee_broker: Pubkey,
    weight_policy: u8,
    multisig_threshold: u8,
    multisig_owners: Vec<Pubkey>,
) -> Result<()> {
    // Validate parameters BEFORE writing any config
    let weight_policy = WeightPolicy::from_u8(weight_policy).ok_or(PocoError::InvalidInput)?;
    validate_multisig_owners(&multisig_owners)?;
    require!(
        multisig_threshold > 0 && (multisig_threshold as usize) <= multisig_owners.len(),
        PocoError::MultisigInvalidThreshold
    );

    let signers = ctx
        .remaining_accounts
        .iter()
        .filter(|account| account.is_signer)
        .map(|account| account.key);
    require!(
        count_approvals(&multisig_owners, signers)? >= multisig_threshold as usize,
        PocoError::MultisigNotEnoughSigners
    );

    let config = &mut ctx.accounts.protocol_config;
    config.authority = ctx.accounts.authority.key();
    config.domain_separator = domain_separator(ctx.program_id);
    config.stake_mint = stake_mint;
    config.tee_broker = tee_broker;
    config.kitty_ratio = ProtocolConfig::DEFAULT_KITTY_RATIO;
    config.kitty_min = ProtocolConfig::DEFAULT_KITTY_MIN;
    config.weight_policy = weight_policy;
    config.contribution_deadline_ratio = ProtocolConfig::DEFAULT_CONTRIBUTION_DEADLINE_RATIO;
    config.reveal_deadline_ratio = ProtocolConfig::DEFAULT_REVEAL_DEADLINE_RATIO;
    config.final_deadline_ratio = ProtocolConfig::DEFAULT_FINAL_DEADLINE_RATIO;
    config.kitty = 0;
    config.category_count = 0;
    config.total_deals = 0;
    config.completed_tasks = 0;
    config.failed_tasks = 0;
    config.total_value_settled = 0;
    config.bump = ctx.bumps.protocol_config;
    config.multisig_threshold = multisig_threshold;
    config.multisig_owners_len = multisig_owners.len() as u8;
    config.protocol_version = CURRENT_PROTOCOL_VERSION;
    config.min_supported_version = MIN_SUPPORTED_VERSION;
    config._padding = [0u8; 2];
    config.multisig_owners = [Pubkey::default(); ProtocolConfig::MAX_MULTISIG_OWNERS];
    for (index, owner) in multisig_owners.iter().enumerate() {
        config.multisig_owners[index] = *owner;
    }

    let vault = &mut ctx.accounts.vault;
    vault.total_deposited = 0;
    vault.bump = ctx.bumps.vault;

    emit!(ProtocolInitialized {
        authority: config.authority,
        domain_separator: config.domain_separator,
        stake_mint,
        multisig_threshold,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
