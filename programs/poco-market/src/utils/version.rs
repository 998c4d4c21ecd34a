//! Version checking utilities for protocol upgrades

use crate::errors::PocoError;
use crate::state::{ProtocolConfig, CURRENT_PROTOCOL_VERSION, MIN_SUPPORTED_VERSION};
use anchor_lang::prelude::*;

/// Detailed compatibility of a config account with this program build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    /// Version is current
    Current,
    /// Version is compatible but not the latest
    CompatibleOld,
    /// Version is too old, migration required
    TooOld,
    /// Version is too new, program upgrade required
    TooNew,
    /// Config carries a minimum outside the supported range
    Inconsistent,
}

pub fn get_version_status(config: &ProtocolConfig) -> VersionStatus {
    if config.protocol_version < config.min_supported_version {
        VersionStatus::TooOld
    } else if config.protocol_version > CURRENT_PROTOCOL_VERSION {
        VersionStatus::TooNew
    } else if config.min_supported_version < MIN_SUPPORTED_VERSION
        || config.min_supported_version > CURRENT_PROTOCOL_VERSION
    {
        VersionStatus::Inconsistent
    } else if config.protocol_version < CURRENT_PROTOCOL_VERSION {
        VersionStatus::CompatibleOld
    } else {
        VersionStatus::Current
    }
}

/// Check that the protocol config is usable by this program build
///
/// # Returns
/// * `Err(PocoError::AccountVersionTooOld)` if the config needs migration
/// * `Err(PocoError::AccountVersionTooNew)` if the program needs upgrade
/// * `Err(PocoError::VersionMismatchProtocol)` if the config is inconsistent
pub fn check_version_compatible(config: &ProtocolConfig) -> Result<()> {
    match get_version_status(config) {
        VersionStatus::Current | VersionStatus::CompatibleOld => Ok(()),
        VersionStatus::TooOld => {
            msg!(
                "Config version {} is below its minimum supported {}",
                config.protocol_version,
                config.min_supported_version
            );
            Err(PocoError::AccountVersionTooOld.into())
        }
        VersionStatus::TooNew => {
            msg!(
                "Config version {} is newer than program version {}",
                config.protocol_version,
                CURRENT_PROTOCOL_VERSION
            );
            Err(PocoError::AccountVersionTooNew.into())
        }
        VersionStatus::Inconsistent => {
            msg!(
                "Config min_supported_version {} is outside supported range {}-{}",
                config.min_supported_version,
                MIN_SUPPORTED_VERSION,
                CURRENT_PROTOCOL_VERSION
            );
            Err(PocoError::VersionMismatchProtocol.into())
        }
    }
}
