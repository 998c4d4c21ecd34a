//! Ed25519 attestations read from the instructions sysvar.
//!
//! Signatures are never verified by the program itself. A client places
//! one or more native Ed25519 verification instructions ahead of the
//! program instruction; the runtime rejects the whole transaction if any
//! of them fails, so every (public key, message) pair they carry is an
//! attestation that the key signed the message.

use anchor_lang::prelude::*;
use solana_sdk_ids::ed25519_program;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};

use crate::errors::PocoError;
use crate::state::{tag, Contribution, Deal, ProtocolConfig};
use crate::utils::hashing::{authorization_message, enclave_message};

const HEADER_LEN: usize = 2;
const OFFSETS_LEN: usize = 14;
const PUBKEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;
/// Offsets index meaning "this instruction's own data"
const INLINE: u16 = u16::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Attestation {
    pub signer: Pubkey,
    pub message: Vec<u8>,
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or(PocoError::MalformedSignatureInstruction)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn slice(data: &[u8], offset: u16, len: usize) -> Result<&[u8]> {
    let start = offset as usize;
    data.get(start..start + len)
        .ok_or_else(|| error!(PocoError::MalformedSignatureInstruction))
}

/// Decode the attestations of one Ed25519 program instruction.
///
/// Only entries whose signature, key and message all live in the same
/// instruction are accepted.
pub fn parse_ed25519_instruction(data: &[u8]) -> Result<Vec<Ed25519Attestation>> {
    let count = *data
        .first()
        .ok_or(PocoError::MalformedSignatureInstruction)? as usize;

    let mut attestations = Vec::with_capacity(count);
    for entry in 0..count {
        let base = HEADER_LEN + entry * OFFSETS_LEN;
        let signature_offset = read_u16(data, base)?;
        let signature_ix = read_u16(data, base + 2)?;
        let pubkey_offset = read_u16(data, base + 4)?;
        let pubkey_ix = read_u16(data, base + 6)?;
        let message_offset = read_u16(data, base + 8)?;
        let message_size = read_u16(data, base + 10)?;
        let message_ix = read_u16(data, base + 12)?;

        require!(
            signature_ix == INLINE && pubkey_ix == INLINE && message_ix == INLINE,
            PocoError::MalformedSignatureInstruction
        );
        slice(data, signature_offset, SIGNATURE_LEN)?;
        let pubkey = slice(data, pubkey_offset, PUBKEY_LEN)?;
        let message = slice(data, message_offset, message_size as usize)?;

        attestations.push(Ed25519Attestation {
            signer: Pubkey::try_from(pubkey)
                .map_err(|_| error!(PocoError::MalformedSignatureInstruction))?,
            message: message.to_vec(),
        });
    }
    Ok(attestations)
}

/// Every attestation carried by Ed25519 instructions that precede the
/// current instruction in this transaction
pub fn collect_attestations(instructions_sysvar: &AccountInfo) -> Result<Vec<Ed25519Attestation>> {
    let current = load_current_index_checked(instructions_sysvar)? as usize;
    let mut attestations = Vec::new();
    for index in 0..current {
        let instruction = load_instruction_at_checked(index, instructions_sysvar)?;
        if instruction.program_id == ed25519_program::ID {
            attestations.extend(parse_ed25519_instruction(&instruction.data)?);
        }
    }
    Ok(attestations)
}

pub fn is_attested(attestations: &[Ed25519Attestation], signer: &Pubkey, message: &[u8]) -> bool {
    attestations
        .iter()
        .any(|attestation| attestation.signer == *signer && attestation.message == message)
}

/// Order signature checks for one match. Attestations are loaded the first
/// time an order is not presigned, and at most once.
pub struct OrderAuthorization<F> {
    attestations: Option<Vec<Ed25519Attestation>>,
    load: F,
}

impl<F> OrderAuthorization<F>
where
    F: FnMut() -> Result<Vec<Ed25519Attestation>>,
{
    pub fn new(load: F) -> Self {
        Self {
            attestations: None,
            load,
        }
    }

    /// Accept a presigned order, or one whose hash `owner` attested
    pub fn require(
        &mut self,
        presigned: bool,
        owner: &Pubkey,
        order_hash: &[u8; 32],
        error: PocoError,
    ) -> Result<()> {
        if presigned {
            return Ok(());
        }
        if self.attestations.is_none() {
            self.attestations = Some((self.load)()?);
        }
        let attested = self
            .attestations
            .as_deref()
            .is_some_and(|attestations| is_attested(attestations, owner, order_hash));
        if !attested {
            return Err(error.into());
        }
        Ok(())
    }
}

/// Attestations a contribution needs.
///
/// The workerpool owner signs the authorization for the worker, task and
/// enclave; on TEE deals the configured broker may sign it instead. A TEE
/// deal requires an enclave, and an enclave, when named, must sign the
/// result hash and seal.
pub fn check_contribution_authorization(
    attestations: &[Ed25519Attestation],
    config: &ProtocolConfig,
    deal: &Deal,
    contribution: &Contribution,
) -> Result<()> {
    let enclave = contribution.enclave_challenge;
    let requires_tee = deal.tag & tag::TEE != 0;
    if requires_tee {
        require!(enclave != Pubkey::default(), PocoError::EnclaveRequired);
    }

    let authorization = authorization_message(
        &config.domain_separator,
        &contribution.worker,
        &contribution.task_id,
        &enclave,
    );
    let by_scheduler = is_attested(attestations, &deal.workerpool_owner, &authorization);
    let by_broker = requires_tee
        && config.tee_broker != Pubkey::default()
        && is_attested(attestations, &config.tee_broker, &authorization);
    require!(by_scheduler || by_broker, PocoError::InvalidAuthorization);

    if enclave != Pubkey::default() {
        let message = enclave_message(
            &config.domain_separator,
            &contribution.result_hash,
            &contribution.result_seal,
        );
        require!(
            is_attested(attestations, &enclave, &message),
            PocoError::InvalidEnclaveSignature
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    /// Lay out an Ed25519 program instruction the way client SDKs do
    fn instruction_data(entries: &[(&SigningKey, &[u8])]) -> Vec<u8> {
        let mut data = vec![entries.len() as u8, 0];
        let mut payload = Vec::new();
        let payload_start = HEADER_LEN + entries.len() * OFFSETS_LEN;
        for (key, message) in entries {
            let pubkey_offset = (payload_start + payload.len()) as u16;
            payload.extend_from_slice(key.verifying_key().as_bytes());
            let signature_offset = (payload_start + payload.len()) as u16;
            payload.extend_from_slice(&key.sign(message).to_bytes());
            let message_offset = (payload_start + payload.len()) as u16;
            payload.extend_from_slice(message);

            for value in [
                signature_offset,
                INLINE,
                pubkey_offset,
                INLINE,
                message_offset,
                message.len() as u16,
                INLINE,
            ] {
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
        data.extend_from_slice(&payload);
        data
    }

    fn signer_key(key: &SigningKey) -> Pubkey {
        Pubkey::new_from_array(key.verifying_key().to_bytes())
    }

    #[test]
    fn test_parse_multiple_signatures() {
        let owner = SigningKey::from_bytes(&[3u8; 32]);
        let scheduler = SigningKey::from_bytes(&[4u8; 32]);
        let order_hash = [9u8; 32];
        let authorization = [10u8; 32];
        let data = instruction_data(&[(&owner, &order_hash), (&scheduler, &authorization)]);

        let attestations = parse_ed25519_instruction(&data).unwrap();
        assert_eq!(attestations.len(), 2);
        assert!(is_attested(&attestations, &signer_key(&owner), &order_hash));
        assert!(is_attested(&attestations, &signer_key(&scheduler), &authorization));
        assert!(!is_attested(&attestations, &signer_key(&owner), &authorization));
        assert!(!is_attested(&attestations, &Pubkey::new_unique(), &order_hash));
    }

    #[test]
    fn test_reject_out_of_line_references() {
        let owner = SigningKey::from_bytes(&[3u8; 32]);
        let mut data = instruction_data(&[(&owner, &[1u8; 32])]);
        // point the public key at instruction 0
        data[HEADER_LEN + 6..HEADER_LEN + 8].copy_from_slice(&0u16.to_le_bytes());
        let err = parse_ed25519_instruction(&data).unwrap_err();
        assert_eq!(err, error!(PocoError::MalformedSignatureInstruction));
    }

    #[test]
    fn test_reject_truncated_data() {
        let owner = SigningKey::from_bytes(&[3u8; 32]);
        let data = instruction_data(&[(&owner, &[1u8; 32])]);
        assert!(parse_ed25519_instruction(&data[..data.len() - 1]).is_err());
        assert!(parse_ed25519_instruction(&data[..10]).is_err());
        assert!(parse_ed25519_instruction(&[]).is_err());
    }

    #[test]
    fn test_empty_instruction_attests_nothing() {
        let attestations = parse_ed25519_instruction(&[0, 0]).unwrap();
        assert!(attestations.is_empty());
    }

    mod order_authorization_tests {
        use super::*;
        use std::cell::Cell;

        #[test]
        fn test_presigned_orders_skip_the_sysvar() {
            let loads = Cell::new(0);
            let mut authorization = OrderAuthorization::new(|| {
                loads.set(loads.get() + 1);
                Ok(Vec::new())
            });
            authorization
                .require(true, &Pubkey::new_unique(), &[1u8; 32], PocoError::InvalidAppOrderSignature)
                .unwrap();
            assert_eq!(loads.get(), 0);
        }

        #[test]
        fn test_attested_orders_load_once() {
            let app_owner = SigningKey::from_bytes(&[3u8; 32]);
            let requester = SigningKey::from_bytes(&[4u8; 32]);
            let (app_hash, request_hash) = ([1u8; 32], [2u8; 32]);
            let data = instruction_data(&[(&app_owner, &app_hash), (&requester, &request_hash)]);

            let loads = Cell::new(0);
            let mut authorization = OrderAuthorization::new(|| {
                loads.set(loads.get() + 1);
                parse_ed25519_instruction(&data)
            });
            authorization
                .require(false, &signer_key(&app_owner), &app_hash, PocoError::InvalidAppOrderSignature)
                .unwrap();
            authorization
                .require(
                    false,
                    &signer_key(&requester),
                    &request_hash,
                    PocoError::InvalidRequestOrderSignature,
                )
                .unwrap();
            assert_eq!(loads.get(), 1);
        }

        #[test]
        fn test_unsigned_order_rejected_with_its_error() {
            let app_owner = SigningKey::from_bytes(&[3u8; 32]);
            let stranger = SigningKey::from_bytes(&[5u8; 32]);
            let order_hash = [1u8; 32];
            let data = instruction_data(&[(&stranger, &order_hash)]);
            let mut authorization = OrderAuthorization::new(|| parse_ed25519_instruction(&data));

            let err = authorization
                .require(
                    false,
                    &signer_key(&app_owner),
                    &order_hash,
                    PocoError::InvalidWorkerpoolOrderSignature,
                )
                .unwrap_err();
            assert_eq!(err, error!(PocoError::InvalidWorkerpoolOrderSignature));

            // the owner signed a different order
            let data = instruction_data(&[(&app_owner, &[9u8; 32])]);
            let mut authorization = OrderAuthorization::new(|| parse_ed25519_instruction(&data));
            let err = authorization
                .require(false, &signer_key(&app_owner), &order_hash, PocoError::InvalidAppOrderSignature)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::InvalidAppOrderSignature));
        }
    }

    mod contribution_authorization_tests {
        use super::*;
        use crate::utils::hashing;

        const DOMAIN: [u8; 32] = [42u8; 32];

        struct Keys {
            scheduler: SigningKey,
            broker: SigningKey,
            enclave: SigningKey,
        }

        fn keys() -> Keys {
            Keys {
                scheduler: SigningKey::from_bytes(&[11u8; 32]),
                broker: SigningKey::from_bytes(&[12u8; 32]),
                enclave: SigningKey::from_bytes(&[13u8; 32]),
            }
        }

        fn config(keys: &Keys) -> ProtocolConfig {
            ProtocolConfig {
                domain_separator: DOMAIN,
                tee_broker: signer_key(&keys.broker),
                ..ProtocolConfig::default()
            }
        }

        fn deal(keys: &Keys, deal_tag: u64) -> Deal {
            Deal {
                workerpool_owner: signer_key(&keys.scheduler),
                tag: deal_tag,
                ..Deal::default()
            }
        }

        fn contribution(enclave: Pubkey) -> Contribution {
            let task_id = [7u8; 32];
            let worker = Pubkey::new_from_array([8u8; 32]);
            let digest = [9u8; 32];
            Contribution {
                task_id,
                worker,
                result_hash: hashing::result_hash(&task_id, &digest),
                result_seal: hashing::result_seal(&worker, &task_id, &digest),
                enclave_challenge: enclave,
                ..Contribution::default()
            }
        }

        fn authorization(contribution: &Contribution) -> [u8; 32] {
            hashing::authorization_message(
                &DOMAIN,
                &contribution.worker,
                &contribution.task_id,
                &contribution.enclave_challenge,
            )
        }

        fn enclave_signature(contribution: &Contribution) -> [u8; 32] {
            hashing::enclave_message(&DOMAIN, &contribution.result_hash, &contribution.result_seal)
        }

        fn attest(entries: &[(&SigningKey, &[u8])]) -> Vec<Ed25519Attestation> {
            parse_ed25519_instruction(&instruction_data(entries)).unwrap()
        }

        #[test]
        fn test_scheduler_authorizes_standard_contribution() {
            let keys = keys();
            let contribution = contribution(Pubkey::default());
            let message = authorization(&contribution);
            let attestations = attest(&[(&keys.scheduler, &message)]);
            check_contribution_authorization(&attestations, &config(&keys), &deal(&keys, 0), &contribution)
                .unwrap();
        }

        #[test]
        fn test_missing_authorization_rejected() {
            let keys = keys();
            let contribution = contribution(Pubkey::default());
            let message = authorization(&contribution);
            let stranger = SigningKey::from_bytes(&[14u8; 32]);
            for attestations in [Vec::new(), attest(&[(&stranger, &message)])] {
                let err = check_contribution_authorization(
                    &attestations,
                    &config(&keys),
                    &deal(&keys, 0),
                    &contribution,
                )
                .unwrap_err();
                assert_eq!(err, error!(PocoError::InvalidAuthorization));
            }
        }

        #[test]
        fn test_authorization_bound_to_worker() {
            let keys = keys();
            let contribution = contribution(Pubkey::default());
            let message = authorization(&contribution);
            let other = Contribution {
                worker: Pubkey::new_unique(),
                ..contribution
            };
            let attestations = attest(&[(&keys.scheduler, &message)]);
            let err = check_contribution_authorization(&attestations, &config(&keys), &deal(&keys, 0), &other)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::InvalidAuthorization));
        }

        #[test]
        fn test_tee_deal_requires_enclave() {
            let keys = keys();
            let contribution = contribution(Pubkey::default());
            let message = authorization(&contribution);
            let attestations = attest(&[(&keys.scheduler, &message)]);
            let err = check_contribution_authorization(
                &attestations,
                &config(&keys),
                &deal(&keys, tag::TEE),
                &contribution,
            )
            .unwrap_err();
            assert_eq!(err, error!(PocoError::EnclaveRequired));
        }

        #[test]
        fn test_broker_authorizes_only_tee_deals() {
            let keys = keys();
            let contribution = contribution(signer_key(&keys.enclave));
            let message = authorization(&contribution);
            let sealed = enclave_signature(&contribution);
            let attestations = attest(&[(&keys.broker, &message), (&keys.enclave, &sealed)]);

            check_contribution_authorization(
                &attestations,
                &config(&keys),
                &deal(&keys, tag::TEE),
                &contribution,
            )
            .unwrap();

            let err = check_contribution_authorization(
                &attestations,
                &config(&keys),
                &deal(&keys, 0),
                &contribution,
            )
            .unwrap_err();
            assert_eq!(err, error!(PocoError::InvalidAuthorization));

            // no broker configured
            let unbrokered = ProtocolConfig {
                tee_broker: Pubkey::default(),
                ..config(&keys)
            };
            let err = check_contribution_authorization(
                &attestations,
                &unbrokered,
                &deal(&keys, tag::TEE),
                &contribution,
            )
            .unwrap_err();
            assert_eq!(err, error!(PocoError::InvalidAuthorization));
        }

        #[test]
        fn test_enclave_must_sign_the_result() {
            let keys = keys();
            let contribution = contribution(signer_key(&keys.enclave));
            let message = authorization(&contribution);
            let deal = deal(&keys, tag::TEE);

            let unsigned = attest(&[(&keys.scheduler, &message)]);
            let err = check_contribution_authorization(&unsigned, &config(&keys), &deal, &contribution)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::InvalidEnclaveSignature));

            // signed by the scheduler instead of the enclave
            let sealed = enclave_signature(&contribution);
            let forged = attest(&[(&keys.scheduler, &message), (&keys.scheduler, &sealed)]);
            let err = check_contribution_authorization(&forged, &config(&keys), &deal, &contribution)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::InvalidEnclaveSignature));

            let signed = attest(&[(&keys.scheduler, &message), (&keys.enclave, &sealed)]);
            check_contribution_authorization(&signed, &config(&keys), &deal, &contribution).unwrap();
        }

        #[test]
        fn test_enclave_on_standard_deal_still_checked() {
            let keys = keys();
            let contribution = contribution(signer_key(&keys.enclave));
            let message = authorization(&contribution);
            let attestations = attest(&[(&keys.scheduler, &message)]);
            let err = check_contribution_authorization(
                &attestations,
                &config(&keys),
                &deal(&keys, 0),
                &contribution,
            )
            .unwrap_err();
            assert_eq!(err, error!(PocoError::InvalidEnclaveSignature));
        }
    }
}
