//! Withdraw spendable stake from the caller's ledger

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PocoError;
use crate::events::Withdrawn;
use crate::instructions::lamport_transfer::withdraw_lamports;
use crate::instructions::token_helpers::{validate_token_account, withdraw_tokens};
use crate::state::{LedgerAccount, ProtocolConfig, Vault};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(
        mut,
        seeds = [b"ledger", owner.key().as_ref()],
        bump = ledger.bump,
        has_one = owner @ PocoError::LedgerNotFound
    )]
    pub ledger: Account<'info, LedgerAccount>,

    #[account(
        mut,
        seeds = [b"vault"],
        bump = vault.bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(mut)]
    pub owner: Signer<'info>,

    // === Token accounts, required when the protocol has a stake mint ===

    #[account(mut)]
    pub owner_token_account: Option<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub vault_token_account: Option<Account<'info, TokenAccount>>,

    pub token_program: Option<Program<'info, Token>>,
}

/// Only `stake` can be withdrawn; escrowed funds stay locked until their
/// deal or task settles.
pub fn handler(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;
    require!(amount > 0, PocoError::InvalidAmount);

    ctx.accounts.ledger.debit(amount)?;
    let vault = &mut ctx.accounts.vault;
    vault.total_deposited = vault
        .total_deposited
        .checked_sub(amount)
        .ok_or(PocoError::InsufficientVaultFunds)?;

    match ctx.accounts.protocol_config.stake_mint {
        None => withdraw_lamports(
            &ctx.accounts.vault.to_account_info(),
            &ctx.accounts.owner.to_account_info(),
            amount,
        )?,
        Some(mint) => {
            let (Some(destination), Some(vault_tokens), Some(token_program)) = (
                ctx.accounts.owner_token_account.as_ref(),
                ctx.accounts.vault_token_account.as_ref(),
                ctx.accounts.token_program.as_ref(),
            ) else {
                return Err(PocoError::MissingTokenAccounts.into());
            };
            let vault_key = ctx.accounts.vault.key();
            validate_token_account(destination, &mint, &ctx.accounts.owner.key())?;
            validate_token_account(vault_tokens, &mint, &vault_key)?;

            let bump = [ctx.accounts.vault.bump];
            let vault_seeds: &[&[u8]] = &[b"vault", &bump];
            withdraw_tokens(
                vault_tokens,
                destination,
                &ctx.accounts.vault.to_account_info(),
                amount,
                vault_seeds,
                token_program,
            )?;
        }
    }

    emit!(Withdrawn {
        owner: ctx.accounts.owner.key(),
        amount,
        stake: ctx.accounts.ledger.stake,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
