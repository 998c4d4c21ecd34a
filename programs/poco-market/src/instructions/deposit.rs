//! Deposit funds into the caller's ledger

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PocoError;
use crate::events::Deposited;
use crate::instructions::lamport_transfer::deposit_lamports;
use crate::instructions::token_helpers::{deposit_tokens, validate_token_account};
use crate::state::{LedgerAccount, ProtocolConfig, Vault};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + LedgerAccount::INIT_SPACE,
        seeds = [b"ledger", owner.key().as_ref()],
        bump
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

    pub system_program: Program<'info, System>,

    // === Token accounts, required when the protocol has a stake mint ===

    #[account(mut)]
    pub owner_token_account: Option<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub vault_token_account: Option<Account<'info, TokenAccount>>,

    pub token_program: Option<Program<'info, Token>>,
}

/// A zero amount is accepted only to open an empty ledger, which asset
/// owners need before their first payout.
pub fn handler(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;

    let owner_key = ctx.accounts.owner.key();
    let opening = ctx.accounts.ledger.owner == Pubkey::default();
    require!(amount > 0 || opening, PocoError::InvalidAmount);

    if amount > 0 {
        match ctx.accounts.protocol_config.stake_mint {
            None => deposit_lamports(
                &ctx.accounts.owner.to_account_info(),
                &ctx.accounts.vault.to_account_info(),
                &ctx.accounts.system_program.to_account_info(),
                amount,
            )?,
            Some(mint) => {
                let (Some(source), Some(vault_tokens), Some(token_program)) = (
                    ctx.accounts.owner_token_account.as_ref(),
                    ctx.accounts.vault_token_account.as_ref(),
                    ctx.accounts.token_program.as_ref(),
                ) else {
                    return Err(PocoError::MissingTokenAccounts.into());
                };
                validate_token_account(source, &mint, &owner_key)?;
                validate_token_account(vault_tokens, &mint, &ctx.accounts.vault.key())?;
                deposit_tokens(
                    source,
                    vault_tokens,
                    &ctx.accounts.owner.to_account_info(),
                    amount,
                    token_program,
                )?;
            }
        }
    }

    let vault = &mut ctx.accounts.vault;
    vault.total_deposited = vault
        .total_deposited
        .checked_add(amount)
        .ok_or(PocoError::ArithmeticOverflow)?;

    let ledger = &mut ctx.accounts.ledger;
    if opening {
        ledger.owner = owner_key;
        ledger.bump = ctx.bumps.ledger;
    }
    ledger.credit(amount)?;

    emit!(Deposited {
        owner: owner_key,
        amount,
        stake: ledger.stake,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
