//! Digests shared by matching and consensus.
//!
//! Every digest is SHA-256 over a fixed concatenation of its inputs. Values
//! that a signer attests to are prefixed with the protocol domain separator,
//! so a signature produced for one deployment never verifies on another.

use anchor_lang::prelude::*;
use solana_sha256_hasher::hashv;

pub const DOMAIN_NAME: &[u8] = b"PoCo";
pub const DOMAIN_VERSION: &[u8] = b"5.0.0";

const AUTHORIZATION_PREFIX: &[u8] = b"authorization";
const ENCLAVE_PREFIX: &[u8] = b"enclave";

/// Binds the protocol name, version and deployed program address
pub fn domain_separator(program_id: &Pubkey) -> [u8; 32] {
    hashv(&[DOMAIN_NAME, DOMAIN_VERSION, program_id.as_ref()]).to_bytes()
}

pub fn deal_id(request_hash: &[u8; 32], start_index: u64) -> [u8; 32] {
    hashv(&[&request_hash[..], &start_index.to_le_bytes()]).to_bytes()
}

pub fn task_id(deal_id: &[u8; 32], index: u64) -> [u8; 32] {
    hashv(&[&deal_id[..], &index.to_le_bytes()]).to_bytes()
}

/// Public commitment to a result, identical for every honest worker
pub fn result_hash(task_id: &[u8; 32], digest: &[u8; 32]) -> [u8; 32] {
    hashv(&[&task_id[..], &digest[..]]).to_bytes()
}

/// Worker-bound commitment, stops one worker from replaying another's reveal
pub fn result_seal(worker: &Pubkey, task_id: &[u8; 32], digest: &[u8; 32]) -> [u8; 32] {
    hashv(&[worker.as_ref(), &task_id[..], &digest[..]]).to_bytes()
}

/// Message a scheduler signs to admit `worker` on `task_id`
pub fn authorization_message(
    domain_separator: &[u8; 32],
    worker: &Pubkey,
    task_id: &[u8; 32],
    enclave: &Pubkey,
) -> [u8; 32] {
    hashv(&[
        &domain_separator[..],
        AUTHORIZATION_PREFIX,
        worker.as_ref(),
        &task_id[..],
        enclave.as_ref(),
    ])
    .to_bytes()
}

/// Message an enclave signs over a contribution
pub fn enclave_message(
    domain_separator: &[u8; 32],
    result_hash: &[u8; 32],
    result_seal: &[u8; 32],
) -> [u8; 32] {
    hashv(&[
        &domain_separator[..],
        ENCLAVE_PREFIX,
        &result_hash[..],
        &result_seal[..],
    ])
    .to_bytes()
}

pub fn callback_digest(payload: &[u8]) -> [u8; 32] {
    hashv(&[payload]).to_bytes()
}
