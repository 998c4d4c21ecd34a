//! SPL token custody for a token-denominated protocol.
//!
//! The vault PDA is the authority of the vault token account; it signs
//! withdrawals with `[b"vault", &[bump]]`.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::errors::PocoError;

/// Transfer tokens from a depositor's account into the vault token account
pub fn deposit_tokens<'info>(
    source: &Account<'info, TokenAccount>,
    vault_token_account: &Account<'info, TokenAccount>,
    depositor: &AccountInfo<'info>,
    amount: u64,
    token_program: &Program<'info, Token>,
) -> Result<()> {
    token::transfer(
        CpiContext::new(
            token_program.to_account_info(),
            Transfer {
                from: source.to_account_info(),
                to: vault_token_account.to_account_info(),
                authority: depositor.clone(),
            },
        ),
        amount,
    )
    .map_err(|_| PocoError::TokenTransferFailed)?;
    Ok(())
}

/// Transfer tokens out of the vault using the vault PDA signature
pub fn withdraw_tokens<'info>(
    vault_token_account: &Account<'info, TokenAccount>,
    destination: &Account<'info, TokenAccount>,
    vault: &AccountInfo<'info>,
    amount: u64,
    vault_seeds: &[&[u8]],
    token_program: &Program<'info, Token>,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    require!(
        vault_token_account.amount >= amount,
        PocoError::InsufficientVaultFunds
    );

    let signer_seeds: &[&[&[u8]]] = &[vault_seeds];
    token::transfer(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            Transfer {
                from: vault_token_account.to_account_info(),
                to: destination.to_account_info(),
                authority: vault.clone(),
            },
            signer_seeds,
        ),
        amount,
    )
    .map_err(|_| PocoError::TokenTransferFailed)?;
    Ok(())
}

/// Validate that a token account has the expected mint and owner.
pub fn validate_token_account(
    token_account: &TokenAccount,
    expected_mint: &Pubkey,
    expected_owner: &Pubkey,
) -> Result<()> {
    require!(
        token_account.mint == *expected_mint,
        PocoError::InvalidTokenMint
    );
    require!(
        token_account.owner == *expected_owner,
        PocoError::InvalidTokenAccount
    );
    Ok(())
}
