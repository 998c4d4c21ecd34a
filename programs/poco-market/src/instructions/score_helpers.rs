//! Worker reputation store.
//!
//! Scores only grow: each proved contribution adds
//! [`SCORE_PER_PROVED_CONTRIBUTION`]. The weight a worker brings to a
//! consensus is derived from its score by the configured [`WeightPolicy`].

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::instructions::constants::SCORE_PER_PROVED_CONTRIBUTION;
use crate::state::{WeightPolicy, WorkerScore};

pub trait ScoreStore {
    fn score_of(&self, worker: &Pubkey) -> Result<u64>;

    /// Add [`SCORE_PER_PROVED_CONTRIBUTION`] to the worker score, returning the delta
    fn increment(&mut self, worker: &Pubkey) -> Result<u64>;
}

impl WorkerScore {
    pub fn increment(&mut self) -> Result<u64> {
        self.score = self
            .score
            .checked_add(SCORE_PER_PROVED_CONTRIBUTION)
            .ok_or(PocoError::ArithmeticOverflow)?;
        Ok(SCORE_PER_PROVED_CONTRIBUTION)
    }
}

/// One worker's score account, for settlements with a single contributor
impl ScoreStore for WorkerScore {
    fn score_of(&self, worker: &Pubkey) -> Result<u64> {
        require_keys_eq!(self.worker, *worker, PocoError::ScoreAccountMismatch);
        Ok(self.score)
    }

    fn increment(&mut self, worker: &Pubkey) -> Result<u64> {
        require_keys_eq!(self.worker, *worker, PocoError::ScoreAccountMismatch);
        WorkerScore::increment(self)
    }
}

/// Weight of a contribution made by a worker with `score`
pub fn contribution_weight(policy: WeightPolicy, score: u64) -> u64 {
    policy.weight(score)
}

/// In-memory score store. Unknown workers have score 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryScores {
    pub scores: BTreeMap<Pubkey, u64>,
}

impl MemoryScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, worker: Pubkey, score: u64) -> Self {
        self.scores.insert(worker, score);
        self
    }
}

impl ScoreStore for MemoryScores {
    fn score_of(&self, worker: &Pubkey) -> Result<u64> {
        Ok(self.scores.get(worker).copied().unwrap_or(0))
    }

    fn increment(&mut self, worker: &Pubkey) -> Result<u64> {
        let score = self.scores.entry(*worker).or_insert(0);
        *score = score
            .checked_add(SCORE_PER_PROVED_CONTRIBUTION)
            .ok_or(PocoError::ArithmeticOverflow)?;
        Ok(SCORE_PER_PROVED_CONTRIBUTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_scores_default_zero_and_increment() {
        let worker = Pubkey::new_unique();
        let mut scores = MemoryScores::new();
        assert_eq!(scores.score_of(&worker).unwrap(), 0);
        assert_eq!(scores.increment(&worker).unwrap(), 1);
        scores.increment(&worker).unwrap();
        assert_eq!(scores.score_of(&worker).unwrap(), 2);
    }

    #[test]
    fn test_worker_score_increment_overflow() {
        let mut score = WorkerScore {
            score: u64::MAX,
            ..WorkerScore::default()
        };
        assert!(score.increment().is_err());
        assert_eq!(score.score, u64::MAX);
    }

    #[test]
    fn test_worker_score_as_store() {
        let worker = Pubkey::new_unique();
        let mut score = WorkerScore {
            worker,
            score: 2,
            ..WorkerScore::default()
        };
        assert_eq!(ScoreStore::increment(&mut score, &worker).unwrap(), 1);
        assert_eq!(score.score_of(&worker).unwrap(), 3);

        let stranger = Pubkey::new_unique();
        let err = ScoreStore::increment(&mut score, &stranger).unwrap_err();
        assert_eq!(err, error!(PocoError::ScoreAccountMismatch));
        assert!(score.score_of(&stranger).is_err());
        assert_eq!(score.score, 3);
    }

    #[test]
    fn test_higher_score_never_lowers_weight() {
        let low = Pubkey::new_unique();
        let high = Pubkey::new_unique();
        let scores = MemoryScores::new().with_score(low, 4).with_score(high, 9);
        for policy in [WeightPolicy::Linear, WeightPolicy::Tiered] {
            let low_weight = contribution_weight(policy, scores.score_of(&low).unwrap());
            let high_weight = contribution_weight(policy, scores.score_of(&high).unwrap());
            assert!(high_weight >= low_weight);
        }
    }
}
