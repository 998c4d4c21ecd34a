//! Create an execution category (multisig gated)

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::CategoryCreated;
use crate::instructions::constants::{MAX_CATEGORY_DESCRIPTION_LEN, MAX_CATEGORY_NAME_LEN};
use crate::state::{Category, ProtocolConfig};
use crate::utils::multisig::require_multisig;
use crate::utils::validation::validate_label;
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct CreateCategory<'info> {
    #[account(
        init,
        payer = payer,
        space = 8 + Category::INIT_SPACE,
        seeds = [b"category", protocol_config.category_count.to_le_bytes().as_ref()],
        bump
    )]
    pub category: Account<'info, Category>,

    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<CreateCategory>,
    name: String,
    description: String,
    work_clock_time_ref: i64,
) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;

    validate_label(&name, MAX_CATEGORY_NAME_LEN)?;
    require!(
        description.len() <= MAX_CATEGORY_DESCRIPTION_LEN,
        PocoError::StringTooLong
    );
    require!(work_clock_time_ref > 0, PocoError::InvalidWorkClockTimeRef);

    let config = &mut ctx.accounts.protocol_config;
    let category_id = config.category_count;
    config.category_count = category_id
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;

    let clock = Clock::get()?;
    let category = &mut ctx.accounts.category;
    category.category_id = category_id;
    category.name = name;
    category.description = description;
    category.work_clock_time_ref = work_clock_time_ref;
    category.created_at = clock.unix_timestamp;
    category.bump = ctx.bumps.category;

    emit!(CategoryCreated {
        category_id,
        name: category.name.clone(),
        work_clock_time_ref,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}
