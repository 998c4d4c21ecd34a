//! Task consensus state machine.
//!
//! These helpers mutate [`Task`] and [`Contribution`] values only; ledger
//! effects belong to the handlers and to `settlement_helpers`.
//!
//! Consensus forms automatically: the contribution that brings the weight
//! behind one result hash up to the deal's trust target fixes that hash as
//! the consensus value and opens the reveal window. The task then stops
//! accepting contributions, so the first hash to cross the threshold is the
//! only one that ever can.

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::state::{
    Contribution, ContributionStatus, Deal, ProtocolConfig, Task, TaskStatus, WeightGroup,
    MAX_CALLBACK_LEN, MAX_CONTRIBUTORS, MAX_RESULTS_LEN,
};
use crate::utils::hashing;

/// Deal-wide timing derived from the category reference duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealDeadlines {
    pub contribution_deadline: i64,
    pub final_deadline: i64,
    pub reveal_window: i64,
}

fn multiple_of(reference: i64, ratio: u32) -> Result<i64> {
    reference
        .checked_mul(ratio as i64)
        .ok_or_else(|| error!(PocoError::ArithmeticOverflow))
}

pub fn deal_deadlines(
    start_time: i64,
    work_clock_time_ref: i64,
    config: &ProtocolConfig,
) -> Result<DealDeadlines> {
    require!(work_clock_time_ref > 0, PocoError::InvalidWorkClockTimeRef);
    let contribution = multiple_of(work_clock_time_ref, config.contribution_deadline_ratio)?;
    let final_ = multiple_of(work_clock_time_ref, config.final_deadline_ratio)?;
    Ok(DealDeadlines {
        contribution_deadline: start_time
            .checked_add(contribution)
            .ok_or(PocoError::ArithmeticOverflow)?,
        final_deadline: start_time
            .checked_add(final_)
            .ok_or(PocoError::ArithmeticOverflow)?,
        reveal_window: multiple_of(work_clock_time_ref, config.reveal_deadline_ratio)?,
    })
}

/// Bring an UNSET task of `deal` to ACTIVE
pub fn activate_task(task: &mut Task, deal: &Deal, deal_key: Pubkey, index: u64) -> Result<()> {
    require!(deal.covers_index(index), PocoError::TaskIndexOutOfRange);
    require!(
        task.status.can_transition_to(TaskStatus::Active),
        PocoError::InvalidStatusTransition
    );

    task.task_id = hashing::task_id(&deal.deal_id, index);
    task.deal = deal_key;
    task.deal_id = deal.deal_id;
    task.index = index;
    task.status = TaskStatus::Active;
    task.contribution_deadline = deal.contribution_deadline;
    task.final_deadline = deal.final_deadline;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionOutcome {
    /// No result hash has reached the trust target yet
    Pending { group_weight: u64 },
    ConsensusReached {
        consensus_value: [u8; 32],
        reveal_deadline: i64,
    },
}

/// Add a worker's weighted vote for `result_hash` and form consensus if the
/// trust target is reached
pub fn record_contribution(
    task: &mut Task,
    worker: Pubkey,
    result_hash: [u8; 32],
    weight: u64,
    trust: u64,
    reveal_window: i64,
    now: i64,
) -> Result<ContributionOutcome> {
    require!(task.status == TaskStatus::Active, PocoError::TaskNotActive);
    require!(
        now < task.contribution_deadline,
        PocoError::ContributionDeadlineReached
    );
    require!(result_hash != [0u8; 32], PocoError::InvalidResultHash);
    require!(
        !task.contributors.contains(&worker),
        PocoError::AlreadyContributed
    );
    require!(
        task.contributors.len() < MAX_CONTRIBUTORS,
        PocoError::TaskFullyContributed
    );

    let total_weight = task
        .total_weight
        .checked_add(weight)
        .ok_or(PocoError::ArithmeticOverflow)?;

    let group_index = match task
        .groups
        .iter()
        .position(|group| group.result_hash == result_hash)
    {
        Some(index) => index,
        None => {
            task.groups.push(WeightGroup {
                result_hash,
                ..WeightGroup::default()
            });
            task.groups.len() - 1
        }
    };
    let group = &mut task.groups[group_index];
    group.weight = group
        .weight
        .checked_add(weight)
        .ok_or(PocoError::ArithmeticOverflow)?;
    group.contributors += 1;
    let group = *group;

    task.contributors.push(worker);
    task.total_weight = total_weight;

    if group.weight < trust {
        return Ok(ContributionOutcome::Pending {
            group_weight: group.weight,
        });
    }

    let reveal_deadline = now
        .checked_add(reveal_window)
        .ok_or(PocoError::ArithmeticOverflow)?;
    task.status = TaskStatus::Revealing;
    task.consensus_value = result_hash;
    task.winner_counter = group.contributors;
    task.reveal_deadline = reveal_deadline;

    Ok(ContributionOutcome::ConsensusReached {
        consensus_value: result_hash,
        reveal_deadline,
    })
}

/// Check that `digest` opens `contribution` and matches the consensus
pub fn verify_reveal(
    task: &Task,
    contribution: &Contribution,
    worker: &Pubkey,
    digest: &[u8; 32],
    now: i64,
) -> Result<()> {
    require!(
        task.status == TaskStatus::Revealing,
        PocoError::TaskNotRevealing
    );
    require!(now < task.reveal_deadline, PocoError::RevealDeadlineReached);
    require!(
        contribution.status == ContributionStatus::Contributed,
        PocoError::ContributionNotContributed
    );
    require!(
        contribution.result_hash == task.consensus_value,
        PocoError::ConsensusMismatch
    );
    require!(
        hashing::result_hash(&task.task_id, digest) == contribution.result_hash,
        PocoError::ResultHashMismatch
    );
    require!(
        hashing::result_seal(worker, &task.task_id, digest) == contribution.result_seal,
        PocoError::ResultSealMismatch
    );
    Ok(())
}

/// Verify and record a reveal
pub fn apply_reveal(
    task: &mut Task,
    contribution: &mut Contribution,
    worker: &Pubkey,
    digest: [u8; 32],
    now: i64,
) -> Result<()> {
    verify_reveal(task, contribution, worker, &digest, now)?;

    contribution.status = ContributionStatus::Proved;
    task.reveal_counter = task
        .reveal_counter
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;
    if task.result_digest == [0u8; 32] {
        task.result_digest = digest;
    }
    Ok(())
}

/// Preconditions of `finalize_task`
pub fn check_finalize(
    task: &Task,
    deal: &Deal,
    results: &[u8],
    results_callback: &[u8],
    now: i64,
) -> Result<()> {
    require!(
        task.status.can_transition_to(TaskStatus::Completed),
        PocoError::TaskNotRevealing
    );
    require!(now < task.final_deadline, PocoError::FinalDeadlineReached);
    require!(task.reveal_counter > 0, PocoError::NoRevealedContribution);
    require!(
        task.reveal_counter == task.winner_counter || now >= task.reveal_deadline,
        PocoError::RevealsPending
    );
    require!(results.len() <= MAX_RESULTS_LEN, PocoError::ResultsTooLong);
    require!(
        results_callback.len() <= MAX_CALLBACK_LEN,
        PocoError::ResultsTooLong
    );
    if deal.has_callback() {
        require!(
            hashing::callback_digest(results_callback) == task.result_digest,
            PocoError::CallbackDigestMismatch
        );
    } else {
        require!(
            results_callback.is_empty(),
            PocoError::CallbackDigestMismatch
        );
    }
    Ok(())
}

/// Contribute, reveal and pass the finalize checks in one step.
///
/// Only trust-one deals qualify: there the first contribution is the
/// consensus, so the worker can open its own commitment at once. The
/// caller fills in `contribution` (hash and seal over `digest`, weight) and
/// gets the reveal deadline the consensus opened.
pub fn contribute_and_reveal(
    task: &mut Task,
    deal: &Deal,
    contribution: &mut Contribution,
    digest: [u8; 32],
    results: &[u8],
    results_callback: &[u8],
    now: i64,
) -> Result<i64> {
    require!(deal.trust <= 1, PocoError::TrustAboveOne);
    let worker = contribution.worker;
    let outcome = record_contribution(
        task,
        worker,
        contribution.result_hash,
        contribution.weight,
        deal.trust,
        deal.reveal_window,
        now,
    )?;
    let ContributionOutcome::ConsensusReached {
        reveal_deadline, ..
    } = outcome
    else {
        return Err(PocoError::TrustAboveOne.into());
    };

    contribution.status = ContributionStatus::Contributed;
    apply_reveal(task, contribution, &worker, digest, now)?;
    check_finalize(task, deal, results, results_callback, now)?;
    Ok(reveal_deadline)
}

/// Whether a task may be claimed as failed at `now`
pub fn check_claimable(task: &Task, now: i64) -> Result<()> {
    require!(
        task.status.can_transition_to(TaskStatus::Failed),
        PocoError::InvalidStatusTransition
    );
    let past_final = now >= task.final_deadline;
    let claimable = match task.status {
        TaskStatus::Active => past_final || now >= task.contribution_deadline,
        TaskStatus::Revealing => {
            past_final || (task.reveal_counter == 0 && now >= task.reveal_deadline)
        }
        _ => false,
    };
    require!(claimable, PocoError::ClaimTooEarly);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REF: i64 = 300;
    const START: i64 = 1_000;

    fn deal_with_trust(trust: u64) -> Deal {
        let config = ProtocolConfig::default();
        let deadlines = deal_deadlines(START, REF, &config).unwrap();
        Deal {
            deal_id: [7u8; 32],
            trust,
            start_time: START,
            contribution_deadline: deadlines.contribution_deadline,
            final_deadline: deadlines.final_deadline,
            reveal_window: deadlines.reveal_window,
            bot_first: 0,
            bot_size: 2,
            ..Deal::default()
        }
    }

    fn active_task(deal: &Deal) -> Task {
        let mut task = Task::default();
        activate_task(&mut task, deal, Pubkey::new_unique(), 0).unwrap();
        task
    }

    /// Contribution committing `worker` to `digest` on `task`
    fn commit(task: &Task, worker: Pubkey, digest: [u8; 32]) -> Contribution {
        Contribution {
            task_id: task.task_id,
            worker,
            status: ContributionStatus::Contributed,
            result_hash: hashing::result_hash(&task.task_id, &digest),
            result_seal: hashing::result_seal(&worker, &task.task_id, &digest),
            weight: 1,
            ..Contribution::default()
        }
    }

    fn contribute(task: &mut Task, deal: &Deal, contribution: &Contribution, now: i64) -> Result<ContributionOutcome> {
        record_contribution(
            task,
            contribution.worker,
            contribution.result_hash,
            contribution.weight,
            deal.trust,
            deal.reveal_window,
            now,
        )
    }

    mod deadline_tests {
        use super::*;

        #[test]
        fn test_deadline_multiples() {
            let deadlines = deal_deadlines(START, REF, &ProtocolConfig::default()).unwrap();
            assert_eq!(deadlines.contribution_deadline, START + 7 * REF);
            assert_eq!(deadlines.final_deadline, START + 10 * REF);
            assert_eq!(deadlines.reveal_window, 2 * REF);
        }

        #[test]
        fn test_deadline_rejects_bad_reference() {
            assert!(deal_deadlines(START, 0, &ProtocolConfig::default()).is_err());
            assert!(deal_deadlines(START, i64::MAX, &ProtocolConfig::default()).is_err());
        }

        #[test]
        fn test_activate_out_of_range_index() {
            let deal = deal_with_trust(1);
            let mut task = Task::default();
            assert!(activate_task(&mut task, &deal, Pubkey::new_unique(), 2).is_err());
            assert_eq!(task.status, TaskStatus::Unset);
        }

        #[test]
        fn test_activate_twice_fails() {
            let deal = deal_with_trust(1);
            let mut task = active_task(&deal);
            assert_eq!(task.task_id, hashing::task_id(&deal.deal_id, 0));
            assert!(activate_task(&mut task, &deal, Pubkey::new_unique(), 0).is_err());
        }
    }

    mod contribution_tests {
        use super::*;

        #[test]
        fn test_consensus_on_trust_threshold() {
            let deal = deal_with_trust(2);
            let mut task = active_task(&deal);
            let first = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            let second = commit(&task, Pubkey::new_unique(), [1u8; 32]);

            let outcome = contribute(&mut task, &deal, &first, START + 10).unwrap();
            assert_eq!(outcome, ContributionOutcome::Pending { group_weight: 1 });
            assert_eq!(task.status, TaskStatus::Active);

            let outcome = contribute(&mut task, &deal, &second, START + 20).unwrap();
            assert_eq!(
                outcome,
                ContributionOutcome::ConsensusReached {
                    consensus_value: first.result_hash,
                    reveal_deadline: START + 20 + 2 * REF,
                }
            );
            assert_eq!(task.status, TaskStatus::Revealing);
            assert_eq!(task.consensus_value, first.result_hash);
            assert_eq!(task.winner_counter, 2);
            assert_eq!(task.total_weight, 2);
        }

        #[test]
        fn test_weight_counts_toward_trust() {
            let deal = deal_with_trust(5);
            let mut task = active_task(&deal);
            let mut heavy = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            heavy.weight = 5;
            contribute(&mut task, &deal, &heavy, START).unwrap();
            assert_eq!(task.status, TaskStatus::Revealing);
        }

        #[test]
        fn test_no_contribution_after_consensus() {
            let deal = deal_with_trust(1);
            let mut task = active_task(&deal);
            let winner = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            let late = commit(&task, Pubkey::new_unique(), [2u8; 32]);
            contribute(&mut task, &deal, &winner, START).unwrap();
            let err = contribute(&mut task, &deal, &late, START).unwrap_err();
            assert_eq!(err, error!(PocoError::TaskNotActive));
            assert_eq!(task.consensus_value, winner.result_hash);
        }

        #[test]
        fn test_double_contribution_rejected() {
            let deal = deal_with_trust(3);
            let mut task = active_task(&deal);
            let worker = Pubkey::new_unique();
            let first = commit(&task, worker, [1u8; 32]);
            contribute(&mut task, &deal, &first, START).unwrap();
            let second = commit(&task, worker, [2u8; 32]);
            let err = contribute(&mut task, &deal, &second, START).unwrap_err();
            assert_eq!(err, error!(PocoError::AlreadyContributed));
            assert_eq!(task.contributors.len(), 1);
        }

        #[test]
        fn test_contribution_after_deadline_rejected() {
            let deal = deal_with_trust(3);
            let mut task = active_task(&deal);
            let late = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            let deadline = task.contribution_deadline;
            let err = contribute(&mut task, &deal, &late, deadline).unwrap_err();
            assert_eq!(err, error!(PocoError::ContributionDeadlineReached));
        }

        #[test]
        fn test_capacity_bound() {
            let deal = deal_with_trust(u64::MAX);
            let mut task = active_task(&deal);
            for index in 0..MAX_CONTRIBUTORS {
                let contribution = commit(&task, Pubkey::new_unique(), [index as u8 + 1; 32]);
                contribute(&mut task, &deal, &contribution, START).unwrap();
            }
            let extra = commit(&task, Pubkey::new_unique(), [99u8; 32]);
            let err = contribute(&mut task, &deal, &extra, START).unwrap_err();
            assert_eq!(err, error!(PocoError::TaskFullyContributed));
        }

        #[test]
        fn test_zero_hash_rejected() {
            let deal = deal_with_trust(1);
            let mut task = active_task(&deal);
            let result = record_contribution(
                &mut task,
                Pubkey::new_unique(),
                [0u8; 32],
                1,
                1,
                deal.reveal_window,
                START,
            );
            assert!(result.is_err());
        }
    }

    mod reveal_tests {
        use super::*;

        /// Two agreeing workers and one dissenter contributed before the
        /// second agreeing vote fixed the consensus
        fn revealing_task() -> (Deal, Task, [Contribution; 3]) {
            let deal = deal_with_trust(2);
            let mut task = active_task(&deal);
            let honest_a = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            let dissent = commit(&task, Pubkey::new_unique(), [2u8; 32]);
            let honest_b = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            for contribution in [&honest_a, &dissent, &honest_b] {
                contribute(&mut task, &deal, contribution, START + 5).unwrap();
            }
            assert_eq!(task.status, TaskStatus::Revealing);
            (deal, task, [honest_a, dissent, honest_b])
        }

        #[test]
        fn test_honest_reveal_is_proved() {
            let (_, mut task, [mut honest_a, _, _]) = revealing_task();
            let worker = honest_a.worker;
            apply_reveal(&mut task, &mut honest_a, &worker, [1u8; 32], START + 6).unwrap();
            assert_eq!(honest_a.status, ContributionStatus::Proved);
            assert_eq!(task.reveal_counter, 1);
            assert_eq!(task.result_digest, [1u8; 32]);
        }

        #[test]
        fn test_dissenter_can_never_reveal() {
            let (_, mut task, [_, mut dissent, _]) = revealing_task();
            let worker = dissent.worker;
            for digest in [[1u8; 32], [2u8; 32]] {
                let err = apply_reveal(&mut task, &mut dissent, &worker, digest, START + 6).unwrap_err();
                assert_eq!(err, error!(PocoError::ConsensusMismatch));
            }
            assert_eq!(task.reveal_counter, 0);
        }

        #[test]
        fn test_reveal_with_other_workers_seal_fails() {
            let (_, mut task, [mut honest_a, _, honest_b]) = revealing_task();
            // honest_b knows the digest but cannot open honest_a's seal
            let err = apply_reveal(&mut task, &mut honest_a, &honest_b.worker, [1u8; 32], START + 6)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::ResultSealMismatch));
        }

        #[test]
        fn test_wrong_digest_fails() {
            let (_, mut task, [mut honest_a, _, _]) = revealing_task();
            let worker = honest_a.worker;
            let err = apply_reveal(&mut task, &mut honest_a, &worker, [3u8; 32], START + 6).unwrap_err();
            assert_eq!(err, error!(PocoError::ResultHashMismatch));
        }

        #[test]
        fn test_reveal_twice_fails() {
            let (_, mut task, [mut honest_a, _, _]) = revealing_task();
            let worker = honest_a.worker;
            apply_reveal(&mut task, &mut honest_a, &worker, [1u8; 32], START + 6).unwrap();
            assert!(apply_reveal(&mut task, &mut honest_a, &worker, [1u8; 32], START + 7).is_err());
            assert_eq!(task.reveal_counter, 1);
        }

        #[test]
        fn test_reveal_after_deadline_fails() {
            let (_, mut task, [mut honest_a, _, _]) = revealing_task();
            let worker = honest_a.worker;
            let deadline = task.reveal_deadline;
            let err = apply_reveal(&mut task, &mut honest_a, &worker, [1u8; 32], deadline).unwrap_err();
            assert_eq!(err, error!(PocoError::RevealDeadlineReached));
        }

        #[test]
        fn test_finalize_waits_for_all_winners_or_deadline() {
            let (deal, mut task, [mut honest_a, _, _]) = revealing_task();
            let worker = honest_a.worker;
            apply_reveal(&mut task, &mut honest_a, &worker, [1u8; 32], START + 6).unwrap();

            let err = check_finalize(&task, &deal, &[], &[], START + 7).unwrap_err();
            assert_eq!(err, error!(PocoError::RevealsPending));
            assert!(check_finalize(&task, &deal, &[], &[], task.reveal_deadline).is_ok());
            let err = check_finalize(&task, &deal, &[], &[], task.final_deadline).unwrap_err();
            assert_eq!(err, error!(PocoError::FinalDeadlineReached));
        }

        #[test]
        fn test_finalize_requires_a_reveal() {
            let (deal, task, _) = revealing_task();
            let err = check_finalize(&task, &deal, &[], &[], task.reveal_deadline).unwrap_err();
            assert_eq!(err, error!(PocoError::NoRevealedContribution));
        }

        #[test]
        fn test_finalize_callback_binding() {
            let (mut deal, mut task, [mut honest_a, _, mut honest_b]) = revealing_task();
            deal.callback = Pubkey::new_unique();
            let payload = b"price:42".to_vec();
            let digest = hashing::callback_digest(&payload);

            // recommit both winners to the callback digest
            let (worker_a, worker_b) = (honest_a.worker, honest_b.worker);
            honest_a = commit(&task, worker_a, digest);
            honest_b = commit(&task, worker_b, digest);
            task.consensus_value = honest_a.result_hash;
            apply_reveal(&mut task, &mut honest_a, &worker_a, digest, START + 6).unwrap();
            apply_reveal(&mut task, &mut honest_b, &worker_b, digest, START + 6).unwrap();

            assert!(check_finalize(&task, &deal, &[], &payload, START + 7).is_ok());
            let err = check_finalize(&task, &deal, &[], b"price:43", START + 7).unwrap_err();
            assert_eq!(err, error!(PocoError::CallbackDigestMismatch));

            deal.callback = Pubkey::default();
            let err = check_finalize(&task, &deal, &[], &payload, START + 7).unwrap_err();
            assert_eq!(err, error!(PocoError::CallbackDigestMismatch));
        }
    }

    mod single_step_tests {
        use super::*;

        #[test]
        fn test_trust_one_completes_in_one_step() {
            let deal = deal_with_trust(1);
            let mut task = active_task(&deal);
            let mut contribution = commit(&task, Pubkey::new_unique(), [1u8; 32]);

            let reveal_deadline = contribute_and_reveal(
                &mut task,
                &deal,
                &mut contribution,
                [1u8; 32],
                b"ipfs://result",
                &[],
                START + 5,
            )
            .unwrap();
            assert_eq!(reveal_deadline, START + 5 + 2 * REF);
            assert_eq!(contribution.status, ContributionStatus::Proved);
            assert_eq!(task.status, TaskStatus::Revealing);
            assert_eq!(task.consensus_value, contribution.result_hash);
            assert_eq!((task.reveal_counter, task.winner_counter), (1, 1));
            assert_eq!(task.result_digest, [1u8; 32]);
            assert_eq!(task.contributors, vec![contribution.worker]);
        }

        #[test]
        fn test_higher_trust_rejected() {
            let deal = deal_with_trust(2);
            let mut task = active_task(&deal);
            let mut contribution = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            let err = contribute_and_reveal(&mut task, &deal, &mut contribution, [1u8; 32], &[], &[], START)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::TrustAboveOne));
            assert!(task.contributors.is_empty());
        }

        #[test]
        fn test_task_already_contributed() {
            let deal = deal_with_trust(1);
            let mut task = active_task(&deal);
            let first = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            contribute(&mut task, &deal, &first, START).unwrap();

            let mut second = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            let err = contribute_and_reveal(&mut task, &deal, &mut second, [1u8; 32], &[], &[], START)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::TaskNotActive));
        }

        #[test]
        fn test_after_contribution_deadline() {
            let deal = deal_with_trust(1);
            let mut task = active_task(&deal);
            let mut contribution = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            let deadline = task.contribution_deadline;
            let err = contribute_and_reveal(&mut task, &deal, &mut contribution, [1u8; 32], &[], &[], deadline)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::ContributionDeadlineReached));
        }

        #[test]
        fn test_digest_must_open_the_commitment() {
            let deal = deal_with_trust(1);
            let mut task = active_task(&deal);
            let mut contribution = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            let err = contribute_and_reveal(&mut task, &deal, &mut contribution, [2u8; 32], &[], &[], START)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::ResultHashMismatch));
        }

        #[test]
        fn test_callback_payload_required() {
            let mut deal = deal_with_trust(1);
            deal.callback = Pubkey::new_unique();
            let payload = b"price:42".to_vec();
            let digest = hashing::callback_digest(&payload);

            let mut task = active_task(&deal);
            let mut contribution = commit(&task, Pubkey::new_unique(), digest);
            let err = contribute_and_reveal(&mut task, &deal, &mut contribution, digest, &[], &[], START)
                .unwrap_err();
            assert_eq!(err, error!(PocoError::CallbackDigestMismatch));

            let mut task = active_task(&deal);
            let mut contribution = commit(&task, Pubkey::new_unique(), digest);
            contribute_and_reveal(&mut task, &deal, &mut contribution, digest, &[], &payload, START).unwrap();
        }
    }

    mod claim_tests {
        use super::*;

        #[test]
        fn test_active_claimable_after_contribution_deadline() {
            let deal = deal_with_trust(3);
            let task = active_task(&deal);
            assert!(check_claimable(&task, task.contribution_deadline - 1).is_err());
            assert!(check_claimable(&task, task.contribution_deadline).is_ok());
        }

        #[test]
        fn test_revealing_claimable_without_reveals() {
            let deal = deal_with_trust(1);
            let mut task = active_task(&deal);
            let contribution = commit(&task, Pubkey::new_unique(), [1u8; 32]);
            contribute(&mut task, &deal, &contribution, START).unwrap();

            assert!(check_claimable(&task, task.reveal_deadline - 1).is_err());
            assert!(check_claimable(&task, task.reveal_deadline).is_ok());

            task.reveal_counter = 1;
            assert!(check_claimable(&task, task.reveal_deadline).is_err());
            assert!(check_claimable(&task, task.final_deadline).is_ok());
        }

        #[test]
        fn test_terminal_and_unset_tasks_not_claimable() {
            let mut task = Task {
                final_deadline: 10,
                ..Task::default()
            };
            assert!(check_claimable(&task, 100).is_err());
            for status in [TaskStatus::Completed, TaskStatus::Failed] {
                task.status = status;
                assert!(check_claimable(&task, 100).is_err());
            }
        }
    }
}
