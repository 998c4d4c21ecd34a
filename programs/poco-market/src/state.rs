//! Account state structures for the PoCo market program

use anchor_lang::prelude::*;

// ============================================================================
// Size Constants
// ============================================================================

/// Size of cryptographic hashes and IDs (SHA256, Pubkey bytes)
pub const HASH_SIZE: usize = 32;

/// Maximum number of workers that may contribute to a single task
pub const MAX_CONTRIBUTORS: usize = 16;

/// Maximum size of the results payload stored on a task
pub const MAX_RESULTS_LEN: usize = 256;

/// Maximum size of the callback payload stored on a task
pub const MAX_CALLBACK_LEN: usize = 128;

/// Maximum size of the free-form request parameters copied into a deal
pub const MAX_PARAMS_LEN: usize = 256;

/// Maximum number of addresses in one order restriction list
pub const MAX_RESTRICTIONS: usize = 8;

/// Deal capability tags (bitmask).
///
/// A request asks for a set of bits, apps and workerpools advertise the bits
/// they support. Bits outside the named ones are carried through unchanged.
///
/// | Bit | Constant       | Meaning                                          |
/// |-----|----------------|--------------------------------------------------|
/// |  0  | `TEE`          | Execution must happen inside a trusted enclave   |
/// |  1  | `BAG_OF_TASKS` | Request may be split into several task indices   |
/// |  2  | `GPU`          | Workers must expose a GPU                        |
/// |  3  | `FPGA`         | Workers must expose an FPGA                      |
/// |  4  | `LARGE_MEMORY` | Workers must provide a large memory profile      |
pub mod tag {
    pub const TEE: u64 = 1 << 0;
    pub const BAG_OF_TASKS: u64 = 1 << 1;
    pub const GPU: u64 = 1 << 2;
    pub const FPGA: u64 = 1 << 3;
    pub const LARGE_MEMORY: u64 = 1 << 4;

    /// True when `advertised` carries every bit of `required`
    pub fn covers(advertised: u64, required: u64) -> bool {
        advertised & required == required
    }
}

/// Kind of a registered asset
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
#[repr(u8)]
pub enum AssetKind {
    #[default]
    App = 0,
    Dataset = 1,
    Workerpool = 2,
}

/// Task status
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
#[repr(u8)]
pub enum TaskStatus {
    #[default]
    Unset = 0,
    Active = 1,
    Revealing = 2,
    Completed = 3,
    Failed = 4,
}

impl TaskStatus {
    /// Validates whether a status transition is allowed.
    ///
    /// Valid transitions:
    /// - Unset → Active (initialize)
    /// - Active → Revealing (consensus reached during contribute)
    /// - Active → Failed (claim after the contribution or final deadline)
    /// - Revealing → Completed (finalize)
    /// - Revealing → Failed (claim after the reveal or final deadline)
    ///
    /// Completed and Failed are terminal.
    pub fn can_transition_to(&self, new_status: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, new_status),
            (Unset, Active)
                | (Active, Revealing)
                | (Active, Failed)
                | (Revealing, Completed)
                | (Revealing, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Contribution status
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
#[repr(u8)]
pub enum ContributionStatus {
    #[default]
    Unset = 0,
    Contributed = 1,
    Proved = 2,
    Rejected = 3,
}

/// Function mapping a worker score to a contribution weight.
///
/// Every policy is monotone in the score and never yields less than 1.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
#[repr(u8)]
pub enum WeightPolicy {
    /// `1 + score`
    #[default]
    Linear = 0,
    /// `max(score / 3, 3) - 1`: flat for newcomers, grows slowly afterwards
    Tiered = 1,
}

impl WeightPolicy {
    pub fn weight(&self, score: u64) -> u64 {
        match self {
            WeightPolicy::Linear => score.saturating_add(1),
            WeightPolicy::Tiered => (score / 3).max(3) - 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WeightPolicy::Linear),
            1 => Some(WeightPolicy::Tiered),
            _ => None,
        }
    }
}

/// Current protocol version
pub const CURRENT_PROTOCOL_VERSION: u8 = 1;

/// Minimum supported protocol version for backward compatibility
pub const MIN_SUPPORTED_VERSION: u8 = 1;

/// Protocol configuration account
/// PDA seeds: ["protocol"]
#[account]
pub struct ProtocolConfig {
    /// Account that initialized the protocol
    pub authority: Pubkey,
    /// Domain separator bound into every order and authorization digest
    pub domain_separator: [u8; 32],
    /// SPL mint the ledger is denominated in (None = native lamports)
    pub stake_mint: Option<Pubkey>,
    /// Broker allowed to authorize contributions on TEE deals
    pub tee_broker: Pubkey,
    /// Percentage of the kitty paid to a scheduler on each finalize
    pub kitty_ratio: u8,
    /// Minimum kitty payout per finalize (capped by the kitty balance)
    pub kitty_min: u64,
    /// Score to weight function used at contribute time
    pub weight_policy: WeightPolicy,
    /// Contribution deadline in multiples of the category time reference
    pub contribution_deadline_ratio: u32,
    /// Reveal window in multiples of the category time reference
    pub reveal_deadline_ratio: u32,
    /// Final deadline in multiples of the category time reference
    pub final_deadline_ratio: u32,
    /// Seized stakes awaiting redistribution
    pub kitty: u64,
    /// Number of categories created so far (next category id)
    pub category_count: u64,
    /// Total deals matched
    pub total_deals: u64,
    /// Total tasks finalized
    pub completed_tasks: u64,
    /// Total tasks claimed as failed
    pub failed_tasks: u64,
    /// Total value moved from payers to payees
    pub total_value_settled: u64,
    /// Bump seed for PDA
    pub bump: u8,
    /// Multisig threshold
    pub multisig_threshold: u8,
    /// Length of configured multisig owners
    pub multisig_owners_len: u8,
    /// Current protocol version (for upgrades)
    pub protocol_version: u8,
    /// Minimum supported version for backward compatibility
    pub min_supported_version: u8,
    /// Reserved, always zero
    pub _padding: [u8; 2],
    /// Multisig owners. Only the first `multisig_owners_len` entries are
    /// valid; remaining slots are always `Pubkey::default()`.
    pub multisig_owners: [Pubkey; ProtocolConfig::MAX_MULTISIG_OWNERS],
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            authority: Pubkey::default(),
            domain_separator: [0u8; 32],
            stake_mint: None,
            tee_broker: Pubkey::default(),
            kitty_ratio: ProtocolConfig::DEFAULT_KITTY_RATIO,
            kitty_min: ProtocolConfig::DEFAULT_KITTY_MIN,
            weight_policy: WeightPolicy::Linear,
            contribution_deadline_ratio: ProtocolConfig::DEFAULT_CONTRIBUTION_DEADLINE_RATIO,
            reveal_deadline_ratio: ProtocolConfig::DEFAULT_REVEAL_DEADLINE_RATIO,
            final_deadline_ratio: ProtocolConfig::DEFAULT_FINAL_DEADLINE_RATIO,
            kitty: 0,
            category_count: 0,
            total_deals: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            total_value_settled: 0,
            bump: 0,
            multisig_threshold: 0,
            multisig_owners_len: 0,
            protocol_version: CURRENT_PROTOCOL_VERSION,
            min_supported_version: MIN_SUPPORTED_VERSION,
            _padding: [0u8; 2],
            multisig_owners: [Pubkey::default(); ProtocolConfig::MAX_MULTISIG_OWNERS],
        }
    }
}

impl ProtocolConfig {
    pub const MAX_MULTISIG_OWNERS: usize = 5;
    pub const DEFAULT_KITTY_RATIO: u8 = 10;
    pub const DEFAULT_KITTY_MIN: u64 = 1_000_000_000;
    pub const DEFAULT_CONTRIBUTION_DEADLINE_RATIO: u32 = 7;
    pub const DEFAULT_REVEAL_DEADLINE_RATIO: u32 = 2;
    pub const DEFAULT_FINAL_DEADLINE_RATIO: u32 = 10;
    pub const SIZE: usize = 8 + // discriminator
        32 + // authority
        32 + // domain_separator
        33 + // stake_mint
        32 + // tee_broker
        1 +  // kitty_ratio
        8 +  // kitty_min
        1 +  // weight_policy
        4 +  // contribution_deadline_ratio
        4 +  // reveal_deadline_ratio
        4 +  // final_deadline_ratio
        8 +  // kitty
        8 +  // category_count
        8 +  // total_deals
        8 +  // completed_tasks
        8 +  // failed_tasks
        8 +  // total_value_settled
        1 +  // bump
        1 +  // multisig_threshold
        1 +  // multisig_owners_len
        1 +  // protocol_version
        1 +  // min_supported_version
        2 +  // padding
        (32 * Self::MAX_MULTISIG_OWNERS); // multisig owners

    /// Check if the protocol version is compatible
    pub fn is_version_compatible(&self) -> bool {
        self.min_supported_version <= self.protocol_version
            && self.protocol_version <= CURRENT_PROTOCOL_VERSION
            && self.protocol_version >= MIN_SUPPORTED_VERSION
    }
}

/// Custody account for deposited funds
/// PDA seeds: ["vault"]
#[account]
#[derive(Default, InitSpace)]
pub struct Vault {
    /// Sum of all ledger balances backed by this vault
    pub total_deposited: u64,
    pub bump: u8,
}

/// Execution category with its reference duration
/// PDA seeds: ["category", category_id]
#[account]
#[derive(Default, InitSpace)]
pub struct Category {
    pub category_id: u64,
    #[max_len(64)]
    pub name: String,
    #[max_len(256)]
    pub description: String,
    /// Base time unit (seconds) all task deadlines are multiples of
    pub work_clock_time_ref: i64,
    pub created_at: i64,
    pub bump: u8,
}

/// Registered app, dataset or workerpool
/// PDA seeds: ["asset", asset_id]
#[account]
#[derive(Default, InitSpace)]
pub struct Asset {
    pub asset_id: [u8; 32],
    pub kind: AssetKind,
    pub owner: Pubkey,
    /// Workerpools only: percent of the pool price each worker stakes per task
    pub worker_stake_ratio_policy: u8,
    /// Workerpools only: percent of the pool price the scheduler keeps
    pub scheduler_reward_ratio_policy: u8,
    pub created_at: i64,
    pub bump: u8,
}

/// Per-party balance
/// PDA seeds: ["ledger", owner]
#[account]
#[derive(Default, InitSpace, Debug, PartialEq, Eq)]
pub struct LedgerAccount {
    pub owner: Pubkey,
    /// Spendable balance
    pub stake: u64,
    /// Balance escrowed by open deals and contributions
    pub locked: u64,
    pub bump: u8,
}

/// Monotonic worker reputation counter
/// PDA seeds: ["score", worker]
#[account]
#[derive(Default, InitSpace)]
pub struct WorkerScore {
    pub worker: Pubkey,
    pub score: u64,
    pub bump: u8,
}

/// Consumption record of a single order
/// PDA seeds: ["order", order_hash]
#[account]
#[derive(Default, InitSpace)]
pub struct OrderState {
    pub order_hash: [u8; 32],
    pub kind: crate::orders::OrderKind,
    /// Party whose signature authorizes the order
    pub owner: Pubkey,
    /// Owner registered the order on-chain instead of signing it
    pub presigned: bool,
    pub cancelled: bool,
    /// Volume already matched (equal to the order volume once cancelled)
    pub consumed: u64,
    pub bump: u8,
}

/// Escrow-backed agreement produced by matching orders
/// PDA seeds: ["deal", request_hash, start_index]
#[account]
#[derive(Default, InitSpace)]
pub struct Deal {
    pub deal_id: [u8; 32],
    pub app_hash: [u8; 32],
    pub dataset_hash: [u8; 32],
    pub workerpool_hash: [u8; 32],
    pub request_hash: [u8; 32],
    pub app: Pubkey,
    pub app_owner: Pubkey,
    pub app_price: u64,
    /// Default when the deal has no dataset
    pub dataset: Pubkey,
    pub dataset_owner: Pubkey,
    pub dataset_price: u64,
    pub workerpool: Pubkey,
    pub workerpool_owner: Pubkey,
    pub workerpool_price: u64,
    pub requester: Pubkey,
    /// Party whose ledger funds the deal (the requester when unsponsored)
    pub sponsor: Pubkey,
    pub beneficiary: Pubkey,
    /// Default when no callback is requested
    pub callback: Pubkey,
    #[max_len(256)]
    pub params: String,
    pub trust: u64,
    pub category: u64,
    pub tag: u64,
    pub start_time: i64,
    pub contribution_deadline: i64,
    pub final_deadline: i64,
    /// Reveal window length, added to the consensus time
    pub reveal_window: i64,
    pub bot_first: u64,
    pub bot_size: u64,
    pub worker_stake: u64,
    pub scheduler_stake: u64,
    pub scheduler_reward_ratio: u8,
    pub tasks_initialized: u64,
    pub tasks_settled: u64,
    pub bump: u8,
}

impl Deal {
    /// Price the payer owes for one task
    pub fn task_price(&self) -> Option<u64> {
        self.app_price
            .checked_add(self.dataset_price)?
            .checked_add(self.workerpool_price)
    }

    pub fn has_dataset(&self) -> bool {
        self.dataset != Pubkey::default()
    }

    pub fn has_callback(&self) -> bool {
        self.callback != Pubkey::default()
    }

    pub fn covers_index(&self, index: u64) -> bool {
        index >= self.bot_first && index - self.bot_first < self.bot_size
    }
}

/// Accumulated weight behind one result hash
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub struct WeightGroup {
    pub result_hash: [u8; 32],
    pub weight: u64,
    pub contributors: u32,
}

/// One unit of work of a deal
/// PDA seeds: ["task", deal_id, index]
#[account]
#[derive(Default, InitSpace)]
pub struct Task {
    pub task_id: [u8; 32],
    pub deal: Pubkey,
    pub deal_id: [u8; 32],
    pub index: u64,
    pub status: TaskStatus,
    pub contribution_deadline: i64,
    pub reveal_deadline: i64,
    pub final_deadline: i64,
    /// Zero until consensus is reached, immutable afterwards
    pub consensus_value: [u8; 32],
    /// Digest revealed for the consensus value
    pub result_digest: [u8; 32],
    pub reveal_counter: u32,
    /// Contributors backing the consensus value at consensus time
    pub winner_counter: u32,
    pub total_weight: u64,
    /// Contributing workers in submission order
    #[max_len(16)]
    pub contributors: Vec<Pubkey>,
    #[max_len(16)]
    pub groups: Vec<WeightGroup>,
    #[max_len(256)]
    pub results: Vec<u8>,
    #[max_len(128)]
    pub results_callback: Vec<u8>,
    pub bump: u8,
}

impl Task {
    pub fn has_consensus(&self) -> bool {
        self.consensus_value != [0u8; 32]
    }

    pub fn group_weight(&self, result_hash: &[u8; 32]) -> u64 {
        self.groups
            .iter()
            .find(|group| &group.result_hash == result_hash)
            .map(|group| group.weight)
            .unwrap_or(0)
    }
}

/// A worker's staked claim about a task result
/// PDA seeds: ["contribution", task_id, worker]
#[account]
#[derive(Default, InitSpace, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub task_id: [u8; 32],
    pub worker: Pubkey,
    pub status: ContributionStatus,
    pub result_hash: [u8; 32],
    pub result_seal: [u8; 32],
    /// Default when the contribution was not produced inside an enclave
    pub enclave_challenge: Pubkey,
    pub weight: u64,
    pub score_delta: u64,
    pub bump: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_forward_only() {
        use TaskStatus::*;
        assert!(Unset.can_transition_to(Active));
        assert!(Active.can_transition_to(Revealing));
        assert!(Active.can_transition_to(Failed));
        assert!(Revealing.can_transition_to(Completed));
        assert!(Revealing.can_transition_to(Failed));

        assert!(!Active.can_transition_to(Unset));
        assert!(!Revealing.can_transition_to(Active));
        assert!(!Active.can_transition_to(Completed));
        assert!(!Unset.can_transition_to(Revealing));
        for terminal in [Completed, Failed] {
            assert!(terminal.is_terminal());
            for next in [Unset, Active, Revealing, Completed, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_weight_policies_floor_and_monotonicity() {
        for policy in [WeightPolicy::Linear, WeightPolicy::Tiered] {
            let mut previous = 0;
            for score in 0..200u64 {
                let weight = policy.weight(score);
                assert!(weight >= 1);
                assert!(weight >= previous);
                previous = weight;
            }
        }
        assert_eq!(WeightPolicy::Linear.weight(0), 1);
        assert_eq!(WeightPolicy::Linear.weight(u64::MAX), u64::MAX);
        assert_eq!(WeightPolicy::Tiered.weight(0), 2);
        assert_eq!(WeightPolicy::Tiered.weight(30), 9);
    }

    #[test]
    fn test_weight_policy_from_u8() {
        assert_eq!(WeightPolicy::from_u8(0), Some(WeightPolicy::Linear));
        assert_eq!(WeightPolicy::from_u8(1), Some(WeightPolicy::Tiered));
        assert_eq!(WeightPolicy::from_u8(2), None);
    }

    #[test]
    fn test_tag_covers() {
        assert!(tag::covers(tag::TEE | tag::GPU, tag::TEE));
        assert!(tag::covers(0, 0));
        assert!(!tag::covers(tag::GPU, tag::TEE | tag::GPU));
    }

    #[test]
    fn test_deal_index_range() {
        let deal = Deal {
            bot_first: 4,
            bot_size: 3,
            ..Deal::default()
        };
        assert!(!deal.covers_index(3));
        assert!(deal.covers_index(4));
        assert!(deal.covers_index(6));
        assert!(!deal.covers_index(7));
    }

    #[test]
    fn test_deal_task_price() {
        let deal = Deal {
            app_price: 3,
            dataset_price: 1,
            workerpool_price: 25,
            ..Deal::default()
        };
        assert_eq!(deal.task_price(), Some(29));
        let overflow = Deal {
            app_price: u64::MAX,
            workerpool_price: 1,
            ..Deal::default()
        };
        assert_eq!(overflow.task_price(), None);
    }

    #[test]
    fn test_protocol_config_size_covers_default() {
        let config = ProtocolConfig {
            stake_mint: Some(Pubkey::new_unique()),
            ..ProtocolConfig::default()
        };
        let mut data = Vec::new();
        config.serialize(&mut data).unwrap();
        assert_eq!(data.len() + 8, ProtocolConfig::SIZE);
    }
}
