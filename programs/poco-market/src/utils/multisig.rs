//! Multisig approval helpers

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::state::ProtocolConfig;

/// Validate multisig owner pubkeys before config is written
pub fn validate_multisig_owners(owners: &[Pubkey]) -> Result<()> {
    require!(
        !owners.is_empty() && owners.len() <= ProtocolConfig::MAX_MULTISIG_OWNERS,
        PocoError::MultisigInvalidSigners
    );
    for (index, owner) in owners.iter().enumerate() {
        require!(*owner != Pubkey::default(), PocoError::MultisigDefaultSigner);
        require!(
            !owners[index + 1..].contains(owner),
            PocoError::MultisigDuplicateSigner
        );
    }
    Ok(())
}

/// Count distinct `owners` among the signer keys
pub fn count_approvals<'a>(
    owners: &[Pubkey],
    signers: impl IntoIterator<Item = &'a Pubkey>,
) -> Result<usize> {
    let mut seen_owner = [false; ProtocolConfig::MAX_MULTISIG_OWNERS];
    let mut approvals = 0usize;

    for signer in signers {
        if let Some(index) = owners.iter().position(|owner| owner == signer) {
            require!(!seen_owner[index], PocoError::MultisigDuplicateSigner);
            seen_owner[index] = true;
            approvals += 1;
        }
    }

    Ok(approvals)
}

/// Require `config.multisig_threshold` owner signatures in `remaining_accounts`
pub fn require_multisig(config: &ProtocolConfig, remaining_accounts: &[AccountInfo]) -> Result<()> {
    let owners_len = config.multisig_owners_len as usize;
    let threshold = config.multisig_threshold as usize;

    if owners_len == 0 || owners_len > ProtocolConfig::MAX_MULTISIG_OWNERS {
        return Err(error!(PocoError::MultisigInvalidSigners));
    }

    if threshold == 0 || threshold > owners_len {
        return Err(error!(PocoError::MultisigInvalidThreshold));
    }

    let owners = &config.multisig_owners[..owners_len];
    if owners.iter().any(|owner| *owner == Pubkey::default()) {
        return Err(error!(PocoError::MultisigDefaultSigner));
    }

    let signers = remaining_accounts
        .iter()
        .filter(|account| account.is_signer)
        .map(|account| account.key);
    if count_approvals(owners, signers)? < threshold {
        return Err(error!(PocoError::MultisigNotEnoughSigners));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(owners: &[Pubkey], threshold: u8) -> ProtocolConfig {
        let mut config = ProtocolConfig {
            multisig_threshold: threshold,
            multisig_owners_len: owners.len() as u8,
            ..ProtocolConfig::default()
        };
        config.multisig_owners[..owners.len()].copy_from_slice(owners);
        config
    }

    #[test]
    fn test_validate_multisig_owners() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        assert!(validate_multisig_owners(&[a, b]).is_ok());
        assert!(validate_multisig_owners(&[]).is_err());
        assert!(validate_multisig_owners(&[a, a]).is_err());
        assert!(validate_multisig_owners(&[a, Pubkey::default()]).is_err());
        assert!(validate_multisig_owners(&[Pubkey::new_unique(); 6]).is_err());
    }

    #[test]
    fn test_count_approvals_ignores_strangers() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let stranger = Pubkey::new_unique();
        assert_eq!(count_approvals(&[a, b], [&a, &stranger]).unwrap(), 1);
        assert_eq!(count_approvals(&[a, b], [&b, &a]).unwrap(), 2);
        assert_eq!(count_approvals(&[a, b], []).unwrap(), 0);
    }

    #[test]
    fn test_count_approvals_rejects_repeated_signer() {
        let a = Pubkey::new_unique();
        assert!(count_approvals(&[a], [&a, &a]).is_err());
    }

    #[test]
    fn test_require_multisig_rejects_bad_config() {
        let a = Pubkey::new_unique();
        assert!(require_multisig(&config_with(&[a], 0), &[]).is_err());
        assert!(require_multisig(&config_with(&[a], 2), &[]).is_err());
        assert!(require_multisig(&config_with(&[], 1), &[]).is_err());
        assert!(require_multisig(&config_with(&[a], 1), &[]).is_err());
    }
}
