//! Market invariant checking for fuzz testing

use anchor_lang::prelude::Pubkey;
use poco_market::instructions::ledger_helpers::MemoryLedger;
use poco_market::orders::Order;
use poco_market::state::{Task, TaskStatus, WeightPolicy};

/// Ledger invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerInvariantResult {
    Valid,
    /// Total value overflowed u64, which no real ledger can reach
    Unmeasurable,
    ValueChanged { before: u64, after: u64 },
    EscrowLeft { owner: Pubkey, locked: u64 },
}

/// Consensus invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusInvariantResult {
    Valid,
    SeveralGroupsReachedTrust { groups: usize },
    ConsensusWithoutTrust { weight: u64, trust: u64 },
    ConsensusValueChanged { before: [u8; 32], after: [u8; 32] },
    WeightMismatch { total: u64, groups: u64 },
}

/// Task state machine invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskInvariantResult {
    Valid,
    InvalidStateTransition { from: TaskStatus, to: TaskStatus },
    TooManyWinners { winners: u32, revealed: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightInvariantResult {
    Valid,
    ZeroWeight { score: u64 },
    NotMonotonic { low: u64, high: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderInvariantResult {
    Valid,
    HashCollision,
}

// ============================================================================
// Ledger Invariants
// ============================================================================

/// Nothing is minted or burnt between two snapshots of the same ledger
pub fn check_value_conservation(before: &MemoryLedger, after: &MemoryLedger) -> LedgerInvariantResult {
    match (before.total_value(), after.total_value()) {
        (Some(before), Some(after)) if before == after => LedgerInvariantResult::Valid,
        (Some(before), Some(after)) => LedgerInvariantResult::ValueChanged { before, after },
        _ => LedgerInvariantResult::Unmeasurable,
    }
}

/// Once every task of a deal is settled, none of its parties has escrow left
pub fn check_escrow_released(ledger: &MemoryLedger, parties: &[Pubkey]) -> LedgerInvariantResult {
    for owner in parties {
        if let Some(account) = ledger.accounts.get(owner) {
            if account.locked != 0 {
                return LedgerInvariantResult::EscrowLeft {
                    owner: *owner,
                    locked: account.locked,
                };
            }
        }
    }
    LedgerInvariantResult::Valid
}

// ============================================================================
// Consensus Invariants
// ============================================================================

/// At most one result hash ever gathers the trust weight, and it is the
/// consensus value whenever one is set
pub fn check_consensus_unique(task: &Task, trust: u64) -> ConsensusInvariantResult {
    let reached: Vec<_> = task.groups.iter().filter(|group| group.weight >= trust).collect();
    if reached.len() > 1 {
        return ConsensusInvariantResult::SeveralGroupsReachedTrust {
            groups: reached.len(),
        };
    }

    let group_total = task
        .groups
        .iter()
        .fold(0u64, |sum, group| sum.saturating_add(group.weight));
    if group_total != task.total_weight {
        return ConsensusInvariantResult::WeightMismatch {
            total: task.total_weight,
            groups: group_total,
        };
    }

    if task.has_consensus() {
        let weight = task.group_weight(&task.consensus_value);
        if weight < trust {
            return ConsensusInvariantResult::ConsensusWithoutTrust { weight, trust };
        }
    }
    ConsensusInvariantResult::Valid
}

/// A consensus value, once set, never changes
pub fn check_consensus_immutable(before: &Task, after: &Task) -> ConsensusInvariantResult {
    if before.has_consensus() && before.consensus_value != after.consensus_value {
        return ConsensusInvariantResult::ConsensusValueChanged {
            before: before.consensus_value,
            after: after.consensus_value,
        };
    }
    ConsensusInvariantResult::Valid
}

// ============================================================================
// Task State Machine Invariants
// ============================================================================

pub fn check_task_transition(from: TaskStatus, to: TaskStatus) -> TaskInvariantResult {
    if from == to || from.can_transition_to(to) {
        TaskInvariantResult::Valid
    } else {
        TaskInvariantResult::InvalidStateTransition { from, to }
    }
}

pub fn check_reveal_count(task: &Task) -> TaskInvariantResult {
    if task.reveal_counter > task.winner_counter {
        TaskInvariantResult::TooManyWinners {
            winners: task.winner_counter,
            revealed: task.reveal_counter,
        }
    } else {
        TaskInvariantResult::Valid
    }
}

// ============================================================================
// Weight Invariants
// ============================================================================

/// A higher score never yields a lower weight, and no weight is zero
pub fn check_weight_monotonic(policy: WeightPolicy, low: u64, high: u64) -> WeightInvariantResult {
    let (low, high) = (low.min(high), low.max(high));
    if policy.weight(low) == 0 {
        return WeightInvariantResult::ZeroWeight { score: low };
    }
    if policy.weight(high) < policy.weight(low) {
        return WeightInvariantResult::NotMonotonic { low, high };
    }
    WeightInvariantResult::Valid
}

// ============================================================================
// Order Invariants
// ============================================================================

/// Two orders that differ anywhere hash differently
pub fn check_order_hash_binding(
    original: &Order,
    mutated: &Order,
    domain: &[u8; 32],
) -> OrderInvariantResult {
    if original == mutated {
        return OrderInvariantResult::Valid;
    }
    match (original.hash(domain), mutated.hash(domain)) {
        (Ok(a), Ok(b)) if a == b => OrderInvariantResult::HashCollision,
        _ => OrderInvariantResult::Valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poco_market::state::WeightGroup;

    #[test]
    fn test_conservation_detects_minting() {
        let owner = Pubkey::new_from_array([1u8; 32]);
        let mut before = MemoryLedger::new();
        before.deposit(owner, 10).unwrap();
        let mut after = before.clone();
        assert_eq!(check_value_conservation(&before, &after), LedgerInvariantResult::Valid);
        after.kitty += 1;
        assert_eq!(
            check_value_conservation(&before, &after),
            LedgerInvariantResult::ValueChanged { before: 10, after: 11 }
        );
    }

    #[test]
    fn test_two_groups_at_trust_flagged() {
        let task = Task {
            groups: vec![
                WeightGroup {
                    result_hash: [1u8; 32],
                    weight: 2,
                    contributors: 2,
                },
                WeightGroup {
                    result_hash: [2u8; 32],
                    weight: 2,
                    contributors: 2,
                },
            ],
            total_weight: 4,
            ..Task::default()
        };
        assert_eq!(
            check_consensus_unique(&task, 2),
            ConsensusInvariantResult::SeveralGroupsReachedTrust { groups: 2 }
        );
        assert_eq!(check_consensus_unique(&task, 3), ConsensusInvariantResult::Valid);
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert_eq!(
            check_task_transition(TaskStatus::Failed, TaskStatus::Completed),
            TaskInvariantResult::InvalidStateTransition {
                from: TaskStatus::Failed,
                to: TaskStatus::Completed,
            }
        );
        assert_eq!(
            check_task_transition(TaskStatus::Active, TaskStatus::Revealing),
            TaskInvariantResult::Valid
        );
    }
}
