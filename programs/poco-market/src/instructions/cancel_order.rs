//! Cancel an order so it can never match again

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::OrderCancelled;
use crate::instructions::order_helpers::{open_order_state, resolve_order_owner};
use crate::orders::Order;
use crate::state::{Asset, OrderState, ProtocolConfig};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
#[instruction(order_hash: [u8; 32])]
pub struct CancelOrder<'info> {
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

/// Marks the whole volume consumed. Deals already matched against the order
/// are unaffected.
pub fn handler(ctx: Context<CancelOrder>, order_hash: [u8; 32], order: Order) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    check_version_compatible(config)?;
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
    state.cancelled = true;
    state.consumed = order.volume();

    emit!(OrderCancelled {
        order_hash,
        kind: order.kind() as u8,
        owner,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
