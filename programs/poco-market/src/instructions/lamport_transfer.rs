//! Native SOL custody for the protocol vault.
//!
//! The vault is a program-owned PDA, so withdrawals adjust lamports
//! directly; deposits go through the system program because the depositor
//! is a system account.

use anchor_lang::prelude::*;
use anchor_lang::system_program;

use crate::errors::PocoError;

/// Move `amount` lamports from a signing wallet into the vault
pub fn deposit_lamports<'info>(
    depositor: &AccountInfo<'info>,
    vault: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    system_program::transfer(
        CpiContext::new(
            system_program.clone(),
            system_program::Transfer {
                from: depositor.clone(),
                to: vault.clone(),
            },
        ),
        amount,
    )
}

/// Pay `amount` lamports out of the vault.
///
/// The vault never drops below its rent-exempt minimum.
pub fn withdraw_lamports<'info>(
    vault: &AccountInfo<'info>,
    recipient: &AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let rent_floor = Rent::get()?.minimum_balance(vault.data_len());
    let available = vault.lamports().saturating_sub(rent_floor);
    require!(available >= amount, PocoError::InsufficientVaultFunds);

    **vault.try_borrow_mut_lamports()? = vault
        .lamports()
        .checked_sub(amount)
        .ok_or(PocoError::ArithmeticOverflow)?;
    **recipient.try_borrow_mut_lamports()? = recipient
        .lamports()
        .checked_add(amount)
        .ok_or(PocoError::ArithmeticOverflow)?;
    Ok(())
}
