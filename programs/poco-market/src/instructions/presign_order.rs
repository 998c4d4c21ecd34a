//! Register an order on-chain in place of an off-chain signature

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::OrderPresigned;
use crate::instructions::order_helpers::{open_order_state, resolve_order_owner};
use crate::orders::Order;
use crate::state::{Asset, OrderState, ProtocolConfig};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
#[instruction(order_hash: [u8; 32])]
pub struct PresignOrder<'info> {
    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + OrderState::INIT_SPACE,
        seeds = [b"order", order_hash.as_ref()],
        bump
    )]
    pub order_state: Account<'info, OrderState>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    /// Asset the order refers to (absent for request orders)
    pub asset: Option<Account<'info, Asset>>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<PresignOrder>, order_hash: [u8; 32], order: Order) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    check_version_compatible(config)?;
    order.validate()?;
    require!(
        order.hash(&config.domain_separator)? == order_hash,
        PocoError::OrderHashMismatch
    );

    let asset = ctx
        .accounts
        .asset
        .as_ref()
        .map(|asset| (&**asset, asset.key()));
    let owner = resolve_order_owner(&order, asset)?;
    require_keys_eq!(
        owner,
        ctx.accounts.owner.key(),
        PocoError::UnauthorizedOrderOwner
    );

    let state = &mut ctx.accounts.order_state;
    open_order_state(state, order_hash, order.kind(), owner, ctx.bumps.order_state)?;
    require!(!state.cancelled, PocoError::OrderCancelled);
    state.presigned = true;

    emit!(OrderPresigned {
        order_hash,
        kind: order.kind() as u8,
        owner,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
