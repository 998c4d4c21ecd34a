//! Shared constants for instruction handlers

/// Base for percentage calculations (100 = 100%)
pub const PERCENT_BASE: u64 = 100;

/// Maximum valid percentage value
pub const MAX_PERCENT: u8 = 100;

/// Score gained by each worker whose contribution is proved
pub const SCORE_PER_PROVED_CONTRIBUTION: u64 = 1;

// ============================================================================
// Category Constants
// ============================================================================

/// Maximum category name length
pub const MAX_CATEGORY_NAME_LEN: usize = 64;

/// Maximum category description length
pub const MAX_CATEGORY_DESCRIPTION_LEN: usize = 256;
