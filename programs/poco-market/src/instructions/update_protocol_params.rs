//! Update protocol parameters (multisig gated)

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::events::ProtocolParamsUpdated;
use crate::state::{ProtocolConfig, WeightPolicy};
use crate::utils::multisig::require_multisig;
use crate::utils::validation::validate_percentage;
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct UpdateProtocolParams<'info> {
    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,
}

/// New parameter values. `None` keeps the current value.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default)]
pub struct ProtocolParams {
    pub kitty_ratio: Option<u8>,
    pub kitty_min: Option<u64>,
    pub weight_policy: Option<u8>,
    pub contribution_deadline_ratio: Option<u32>,
    pub reveal_deadline_ratio: Option<u32>,
    pub final_deadline_ratio: Option<u32>,
    pub tee_broker: Option<Pubkey>,
}

/// Deadline ratios must be positive, and a reveal window opened at the
/// contribution deadline must still close by the final deadline
pub fn validate_deadline_ratios(contribution: u32, reveal: u32, final_: u32) -> Result<()> {
    let reveal_end = (contribution as u64) + (reveal as u64);
    require!(
        contribution > 0 && reveal > 0 && reveal_end <= final_ as u64,
        PocoError::InvalidDeadlineRatios
    );
    Ok(())
}

pub fn handler(ctx: Context<UpdateProtocolParams>, params: ProtocolParams) -> Result<()> {
    check_version_compatible(&ctx.accounts.protocol_config)?;
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;

    let config = &ctx.accounts.protocol_config;
    let kitty_ratio = params.kitty_ratio.unwrap_or(config.kitty_ratio);
    validate_percentage(kitty_ratio)?;
    let weight_policy = match params.weight_policy {
        Some(value) => WeightPolicy::from_u8(value).ok_or(PocoError::InvalidInput)?,
        None => config.weight_policy,
    };
    let contribution = params
        .contribution_deadline_ratio
        .unwrap_or(config.contribution_deadline_ratio);
    let reveal = params.reveal_deadline_ratio.unwrap_or(config.reveal_deadline_ratio);
    let final_ = params.final_deadline_ratio.unwrap_or(config.final_deadline_ratio);
    validate_deadline_ratios(contribution, reveal, final_)?;

    let config = &mut ctx.accounts.protocol_config;
    config.kitty_ratio = kitty_ratio;
    config.kitty_min = params.kitty_min.unwrap_or(config.kitty_min);
    config.weight_policy = weight_policy;
    config.contribution_deadline_ratio = contribution;
    config.reveal_deadline_ratio = reveal;
    config.final_deadline_ratio = final_;
    config.tee_broker = params.tee_broker.unwrap_or(config.tee_broker);

    emit!(ProtocolParamsUpdated {
        kitty_ratio,
        kitty_min: config.kitty_min,
        weight_policy: weight_policy as u8,
        contribution_deadline_ratio: contribution,
        reveal_deadline_ratio: reveal,
        final_deadline_ratio: final_,
        tee_broker: config.tee_broker,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ratios_are_valid() {
        assert!(validate_deadline_ratios(
            ProtocolConfig::DEFAULT_CONTRIBUTION_DEADLINE_RATIO,
            ProtocolConfig::DEFAULT_REVEAL_DEADLINE_RATIO,
            ProtocolConfig::DEFAULT_FINAL_DEADLINE_RATIO,
        )
        .is_ok());
    }

    #[test]
    fn test_invalid_ratios() {
        assert!(validate_deadline_ratios(0, 2, 10).is_err());
        assert!(validate_deadline_ratios(7, 0, 10).is_err());
        assert!(validate_deadline_ratios(10, 2, 10).is_err());
    }

    #[test]
    fn test_reveal_window_must_close_by_final_deadline() {
        assert!(validate_deadline_ratios(7, 3, 10).is_ok());
        assert!(validate_deadline_ratios(7, 4, 10).is_err());
        assert!(validate_deadline_ratios(9, 2, 10).is_err());
        assert!(validate_deadline_ratios(u32::MAX, u32::MAX, u32::MAX).is_err());
    }
}
