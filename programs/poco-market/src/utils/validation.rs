//! Input validation utilities for the PoCo market program

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::instructions::constants::MAX_PERCENT;

/// Validates that a string contains only printable ASCII characters or spaces.
///
/// # Examples
/// ```
/// use poco_market::utils::validation::validate_string_input;
///
/// assert!(validate_string_input("ubuntu-batch"));
/// assert!(!validate_string_input("line\nbreak"));
/// ```
pub fn validate_string_input(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_graphic() || c == ' ')
}

/// Non-empty printable label no longer than `max_len`
pub fn validate_label(label: &str, max_len: usize) -> Result<()> {
    require!(!label.is_empty(), PocoError::InvalidInput);
    require!(label.len() <= max_len, PocoError::StringTooLong);
    require!(validate_string_input(label), PocoError::InvalidInput);
    Ok(())
}

/// Percentage in `0..=100`
pub fn validate_percentage(value: u8) -> Result<()> {
    require!(value <= MAX_PERCENT, PocoError::InvalidPercentage);
    Ok(())
}
