//! Events emitted by the PoCo market program
//!
//! Indexers reconcile deals and tasks off-chain from these events; every
//! one carries the deal or task id it concerns.

use anchor_lang::prelude::*;

/// Emitted when the protocol is initialized
#[event]
pub struct ProtocolInitialized {
    pub authority: Pubkey,
    pub domain_separator: [u8; 32],
    pub stake_mint: Option<Pubkey>,
    pub multisig_threshold: u8,
    pub timestamp: i64,
}

/// Emitted when protocol parameters are updated
#[event]
pub struct ProtocolParamsUpdated {
    pub kitty_ratio: u8,
    pub kitty_min: u64,
    pub weight_policy: u8,
    pub contribution_deadline_ratio: u32,
    pub reveal_deadline_ratio: u32,
    pub final_deadline_ratio: u32,
    pub tee_broker: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct CategoryCreated {
    pub category_id: u64,
    pub name: String,
    pub work_clock_time_ref: i64,
    pub timestamp: i64,
}

#[event]
pub struct AssetRegistered {
    pub asset: Pubkey,
    pub asset_id: [u8; 32],
    pub kind: u8,
    pub owner: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct WorkerpoolPolicyUpdated {
    pub workerpool: Pubkey,
    pub worker_stake_ratio_policy: u8,
    pub scheduler_reward_ratio_policy: u8,
    pub timestamp: i64,
}

#[event]
pub struct Deposited {
    pub owner: Pubkey,
    pub amount: u64,
    pub stake: u64,
    pub timestamp: i64,
}

#[event]
pub struct Withdrawn {
    pub owner: Pubkey,
    pub amount: u64,
    pub stake: u64,
    pub timestamp: i64,
}

#[event]
pub struct OrderPresigned {
    pub order_hash: [u8; 32],
    pub kind: u8,
    pub owner: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct OrderCancelled {
    pub order_hash: [u8; 32],
    pub kind: u8,
    pub owner: Pubkey,
    pub timestamp: i64,
}

/// Emitted when four orders form a deal
#[event]
pub struct OrdersMatched {
    pub deal_id: [u8; 32],
    pub app_hash: [u8; 32],
    pub dataset_hash: [u8; 32],
    pub workerpool_hash: [u8; 32],
    pub request_hash: [u8; 32],
    pub volume: u64,
    pub start_index: u64,
    pub timestamp: i64,
}

/// Tells the scheduler of a workerpool that a deal awaits task initialization
#[event]
pub struct SchedulerNotice {
    pub workerpool: Pubkey,
    pub deal_id: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct TaskInitialized {
    pub task_id: [u8; 32],
    pub deal_id: [u8; 32],
    pub index: u64,
    pub contribution_deadline: i64,
    pub final_deadline: i64,
    pub timestamp: i64,
}

#[event]
pub struct TaskContributed {
    pub task_id: [u8; 32],
    pub worker: Pubkey,
    pub result_hash: [u8; 32],
    pub weight: u64,
    pub timestamp: i64,
}

#[event]
pub struct ConsensusReached {
    pub task_id: [u8; 32],
    pub consensus_value: [u8; 32],
    pub reveal_deadline: i64,
    pub timestamp: i64,
}

#[event]
pub struct TaskRevealed {
    pub task_id: [u8; 32],
    pub worker: Pubkey,
    pub digest: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct TaskFinalized {
    pub task_id: [u8; 32],
    pub result_digest: [u8; 32],
    pub winners: u32,
    pub scheduler_reward: u64,
    pub kitty_reward: u64,
    pub timestamp: i64,
}

/// Result delivery for deals that requested a callback
#[event]
pub struct TaskCallback {
    pub task_id: [u8; 32],
    pub callback: Pubkey,
    pub payload: Vec<u8>,
    pub timestamp: i64,
}

#[event]
pub struct TaskClaimed {
    pub task_id: [u8; 32],
    pub deal_id: [u8; 32],
    pub refunded: u64,
    pub seized: u64,
    pub timestamp: i64,
}

#[event]
pub struct RewardDistributed {
    pub task_id: [u8; 32],
    pub recipient: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Emitted for each stake moved into the kitty
#[event]
pub struct StakeSeized {
    pub task_id: [u8; 32],
    pub party: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}
