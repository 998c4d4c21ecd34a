//! Fuzz testing scenarios that drive the program's own helpers
//!
//! Matching, consensus and settlement run through the same pure functions
//! the instruction handlers call, over in-memory ledger and score stores,
//! without a Solana runtime. A step that fails restores the state it
//! started from, the way a failed transaction is reverted.

use anchor_lang::prelude::*;
use poco_market::errors::PocoError;
use poco_market::instructions::consensus_helpers::{
    activate_task, apply_reveal, check_claimable, check_finalize, contribute_and_reveal,
    deal_deadlines, record_contribution, ContributionOutcome,
};
use poco_market::instructions::ledger_helpers::{LedgerStore, MemoryLedger};
use poco_market::instructions::match_helpers::{
    resolve_deal_terms, DealTerms, RemainingVolumes, WorkerpoolPolicy,
};
use poco_market::instructions::score_helpers::{contribution_weight, MemoryScores, ScoreStore};
use poco_market::instructions::settlement_helpers::{
    settle_claim, settle_finalize, ClaimOutcome, FinalizeOutcome,
};
use poco_market::orders::{AppOrder, DatasetOrder, Order, RequestOrder, WorkerpoolOrder};
use poco_market::state::{
    tag, Contribution, ContributionStatus, Deal, ProtocolConfig, Task, TaskStatus, WeightPolicy,
};
use poco_market::utils::hashing;

use crate::arbitrary::{LifecycleInput, MatchOrdersInput, DIGEST_CHOICES};
use crate::invariants::*;

/// Deal start time used by every simulation
pub const START: i64 = 1_700_000_000;

/// Category reference duration used by every simulation
pub const WORK_CLOCK_TIME_REF: i64 = 60;

/// Funds each simulated worker deposits before contributing
pub const WORKER_DEPOSIT: u64 = 1_000_000;

const DOMAIN: [u8; 32] = [0xD0; 32];

/// Roles used to derive deterministic party keys
pub mod role {
    pub const APP: u8 = 1;
    pub const APP_OWNER: u8 = 2;
    pub const DATASET: u8 = 3;
    pub const DATASET_OWNER: u8 = 4;
    pub const WORKERPOOL: u8 = 5;
    pub const SCHEDULER: u8 = 6;
    pub const REQUESTER: u8 = 7;
    pub const WORKER: u8 = 8;
    pub const DEAL: u8 = 9;
}

pub fn party(role: u8, index: u8) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes[0] = role;
    bytes[1] = index;
    Pubkey::new_from_array(bytes)
}

pub fn worker_key(index: usize) -> Pubkey {
    party(role::WORKER, index as u8)
}

/// Result of a simulated instruction sequence
#[derive(Debug, Clone)]
pub enum SimulationResult {
    Success,
    Error(String),
    InvariantViolation(String),
}

impl SimulationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SimulationResult::Success)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SimulationResult::Error(_))
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SimulationResult::InvariantViolation(_))
    }
}

macro_rules! violation {
    ($($arg:tt)*) => {
        return SimulationResult::InvariantViolation(format!($($arg)*))
    };
}

// ============================================================================
// Orders
// ============================================================================

/// Four orders plus the policy of the workerpool they name
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub app: AppOrder,
    pub dataset: Option<DatasetOrder>,
    pub workerpool: WorkerpoolOrder,
    pub request: RequestOrder,
    pub policy: WorkerpoolPolicy,
}

impl OrderBook {
    /// Compatible orders whose request ceilings equal the asked prices
    pub fn priced(
        app_price: u64,
        dataset_price: Option<u64>,
        workerpool_price: u64,
        trust: u64,
        volume: u64,
    ) -> Self {
        let bag = if volume > 1 { tag::BAG_OF_TASKS } else { 0 };
        let dataset = dataset_price.map(|price| DatasetOrder {
            dataset: party(role::DATASET, 0),
            dataset_price: price,
            volume,
            ..DatasetOrder::default()
        });
        Self {
            app: AppOrder {
                app: party(role::APP, 0),
                app_price,
                volume,
                ..AppOrder::default()
            },
            workerpool: WorkerpoolOrder {
                workerpool: party(role::WORKERPOOL, 0),
                workerpool_price,
                volume,
                tag: bag,
                trust,
                ..WorkerpoolOrder::default()
            },
            request: RequestOrder {
                app: party(role::APP, 0),
                app_max_price: app_price,
                dataset: dataset
                    .as_ref()
                    .map(|order| order.dataset)
                    .unwrap_or_default(),
                dataset_max_price: dataset_price.unwrap_or(0),
                workerpool_max_price: workerpool_price,
                requester: party(role::REQUESTER, 0),
                volume,
                tag: bag,
                trust,
                beneficiary: party(role::REQUESTER, 0),
                ..RequestOrder::default()
            },
            dataset,
            policy: WorkerpoolPolicy {
                worker_stake_ratio: 30,
                scheduler_reward_ratio: 20,
            },
        }
    }

    pub fn from_input(input: &MatchOrdersInput) -> Self {
        let dataset = input.dataset_price.map(|price| DatasetOrder {
            dataset: party(role::DATASET, 0),
            dataset_price: price,
            volume: input.dataset_volume,
            salt: input.salt,
            ..DatasetOrder::default()
        });
        Self {
            app: AppOrder {
                app: party(role::APP, 0),
                app_price: input.app_price,
                volume: input.app_volume,
                tag: input.app_tag,
                salt: input.salt,
                ..AppOrder::default()
            },
            workerpool: WorkerpoolOrder {
                workerpool: party(role::WORKERPOOL, 0),
                workerpool_price: input.workerpool_price,
                volume: input.workerpool_volume,
                tag: input.workerpool_tag,
                trust: input.workerpool_trust,
                salt: input.salt,
                ..WorkerpoolOrder::default()
            },
            request: RequestOrder {
                app: party(role::APP, 0),
                app_max_price: input.app_max_price,
                dataset: dataset
                    .as_ref()
                    .map(|order| order.dataset)
                    .unwrap_or_default(),
                dataset_max_price: input.dataset_max_price,
                workerpool_max_price: input.workerpool_max_price,
                requester: party(role::REQUESTER, 0),
                volume: input.request_volume,
                tag: input.request_tag,
                trust: input.request_trust,
                beneficiary: party(role::REQUESTER, 0),
                salt: input.salt,
                ..RequestOrder::default()
            },
            dataset,
            policy: WorkerpoolPolicy {
                worker_stake_ratio: input.worker_stake_ratio,
                scheduler_reward_ratio: input.scheduler_reward_ratio,
            },
        }
    }

    fn remaining(&self) -> RemainingVolumes {
        RemainingVolumes {
            app: self.app.volume,
            dataset: self.dataset.as_ref().map(|order| order.volume),
            workerpool: self.workerpool.volume,
            request: self.request.volume,
        }
    }
}

// ============================================================================
// Market Simulation
// ============================================================================

/// One matched deal and its first task
#[derive(Clone)]
pub struct MarketSimulation {
    pub config: ProtocolConfig,
    pub terms: DealTerms,
    pub deal: Deal,
    pub task: Task,
    pub contributions: Vec<Contribution>,
    pub ledger: MemoryLedger,
    pub scores: MemoryScores,
}

impl MarketSimulation {
    /// Match `book`, lock the escrow and initialize task 0
    pub fn open(
        book: &OrderBook,
        config: ProtocolConfig,
        requester_deposit: u64,
        scheduler_deposit: u64,
        kitty: u64,
    ) -> Result<Self> {
        let terms = resolve_deal_terms(
            &book.app,
            book.dataset.as_ref(),
            &book.workerpool,
            &book.request,
            &book.policy,
            &book.remaining(),
        )?;
        let deadlines = deal_deadlines(START, WORK_CLOCK_TIME_REF, &config)?;

        let requester = book.request.requester;
        let scheduler = party(role::SCHEDULER, 0);
        let app_owner = party(role::APP_OWNER, 0);
        let dataset_owner = party(role::DATASET_OWNER, 0);

        let mut ledger = MemoryLedger::new();
        ledger.kitty = kitty;
        ledger.deposit(requester, requester_deposit)?;
        ledger.deposit(scheduler, scheduler_deposit)?;
        ledger.deposit(app_owner, 0)?;
        if book.dataset.is_some() {
            ledger.deposit(dataset_owner, 0)?;
        }
        ledger.lock(&requester, terms.payer_lock)?;
        ledger.lock(&scheduler, terms.scheduler_lock)?;

        let request_hash = Order::Request(book.request.clone()).hash(&DOMAIN)?;
        let deal = Deal {
            deal_id: hashing::deal_id(&request_hash, 0),
            request_hash,
            app: book.app.app,
            app_owner,
            app_price: terms.app_price,
            dataset: book.request.dataset,
            dataset_owner: if book.dataset.is_some() {
                dataset_owner
            } else {
                Pubkey::default()
            },
            dataset_price: terms.dataset_price,
            workerpool: book.workerpool.workerpool,
            workerpool_owner: scheduler,
            workerpool_price: terms.workerpool_price,
            requester,
            sponsor: requester,
            beneficiary: book.request.beneficiary,
            callback: book.request.callback,
            trust: terms.trust,
            category: terms.category,
            tag: terms.tag,
            start_time: START,
            contribution_deadline: deadlines.contribution_deadline,
            final_deadline: deadlines.final_deadline,
            reveal_window: deadlines.reveal_window,
            bot_first: 0,
            bot_size: terms.volume,
            worker_stake: terms.worker_stake,
            scheduler_stake: terms.scheduler_stake,
            scheduler_reward_ratio: terms.scheduler_reward_ratio,
            ..Deal::default()
        };

        let mut task = Task::default();
        activate_task(&mut task, &deal, party(role::DEAL, 0), 0)?;

        Ok(Self {
            config,
            terms,
            deal,
            task,
            contributions: Vec::new(),
            ledger,
            scores: MemoryScores::new(),
        })
    }

    /// Run `step`, restoring the previous state if it fails
    fn atomically<T>(&mut self, step: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        let result = step(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    pub fn fund_worker(&mut self, index: usize, score: u64) -> Result<()> {
        let worker = worker_key(index);
        self.ledger.deposit(worker, WORKER_DEPOSIT)?;
        self.scores.scores.insert(worker, score);
        Ok(())
    }

    pub fn contribute(
        &mut self,
        index: usize,
        digest: [u8; 32],
        now: i64,
    ) -> Result<ContributionOutcome> {
        self.atomically(|sim| {
            let worker = worker_key(index);
            let task_id = sim.task.task_id;
            let weight = contribution_weight(sim.config.weight_policy, sim.scores.score_of(&worker)?);
            sim.ledger.lock(&worker, sim.deal.worker_stake)?;

            let result_hash = hashing::result_hash(&task_id, &digest);
            let outcome = record_contribution(
                &mut sim.task,
                worker,
                result_hash,
                weight,
                sim.deal.trust,
                sim.deal.reveal_window,
                now,
            )?;
            sim.contributions.push(Contribution {
                task_id,
                worker,
                status: ContributionStatus::Contributed,
                result_hash,
                result_seal: hashing::result_seal(&worker, &task_id, &digest),
                weight,
                ..Contribution::default()
            });
            Ok(outcome)
        })
    }

    pub fn reveal(&mut self, index: usize, digest: [u8; 32], now: i64) -> Result<()> {
        self.atomically(|sim| {
            let worker = worker_key(index);
            let contribution = sim
                .contributions
                .iter_mut()
                .find(|contribution| contribution.worker == worker)
                .ok_or_else(|| error!(PocoError::ContributionAccountMismatch))?;
            apply_reveal(&mut sim.task, contribution, &worker, digest, now)
        })
    }

    pub fn finalize(&mut self, now: i64) -> Result<FinalizeOutcome> {
        self.atomically(|sim| {
            check_finalize(&sim.task, &sim.deal, &[], &[], now)?;
            let outcome = settle_finalize(
                &sim.deal,
                &mut sim.contributions,
                &mut sim.ledger,
                &mut sim.scores,
                sim.config.kitty_ratio,
                sim.config.kitty_min,
            )?;
            sim.task.status = TaskStatus::Completed;
            Ok(outcome)
        })
    }

    /// Contribute, reveal and finalize in one step, as a trust-one deal allows
    pub fn contribute_and_finalize(
        &mut self,
        index: usize,
        digest: [u8; 32],
        now: i64,
    ) -> Result<FinalizeOutcome> {
        self.atomically(|sim| {
            let worker = worker_key(index);
            let task_id = sim.task.task_id;
            let mut contribution = Contribution {
                task_id,
                worker,
                result_hash: hashing::result_hash(&task_id, &digest),
                result_seal: hashing::result_seal(&worker, &task_id, &digest),
                weight: contribution_weight(sim.config.weight_policy, sim.scores.score_of(&worker)?),
                ..Contribution::default()
            };
            contribute_and_reveal(&mut sim.task, &sim.deal, &mut contribution, digest, &[], &[], now)?;
            sim.contributions.push(contribution);

            sim.ledger.lock(&worker, sim.deal.worker_stake)?;
            let outcome = settle_finalize(
                &sim.deal,
                &mut sim.contributions,
                &mut sim.ledger,
                &mut sim.scores,
                sim.config.kitty_ratio,
                sim.config.kitty_min,
            )?;
            sim.task.status = TaskStatus::Completed;
            Ok(outcome)
        })
    }

    pub fn claim(&mut self, now: i64) -> Result<ClaimOutcome> {
        self.atomically(|sim| {
            check_claimable(&sim.task, now)?;
            let outcome = settle_claim(&sim.deal, &mut sim.contributions, &mut sim.ledger)?;
            sim.task.status = TaskStatus::Failed;
            Ok(outcome)
        })
    }

    /// Every party whose escrow the deal can touch
    pub fn parties(&self) -> Vec<Pubkey> {
        let mut parties = vec![self.deal.sponsor, self.deal.workerpool_owner];
        parties.extend(self.contributions.iter().map(|contribution| contribution.worker));
        parties
    }
}

// ============================================================================
// Match Orders Simulation
// ============================================================================

/// Match arbitrary orders and check the resolved terms and escrow
pub fn simulate_match_orders(input: &MatchOrdersInput) -> SimulationResult {
    let book = OrderBook::from_input(input);
    let sim = match MarketSimulation::open(
        &book,
        ProtocolConfig::default(),
        input.requester_deposit,
        input.scheduler_deposit,
        0,
    ) {
        Ok(sim) => sim,
        Err(err) => return SimulationResult::Error(err.to_string()),
    };
    let terms = sim.terms;

    let expected_price = book
        .app
        .app_price
        .checked_add(book.dataset.as_ref().map(|order| order.dataset_price).unwrap_or(0))
        .and_then(|sum| sum.checked_add(book.workerpool.workerpool_price));
    if Some(terms.task_price) != expected_price {
        violation!("task price {} is not the sum of the asked prices", terms.task_price);
    }
    if terms.app_price > book.request.app_max_price
        || terms.dataset_price > book.request.dataset_max_price
        || terms.workerpool_price > book.request.workerpool_max_price
    {
        violation!("a matched price exceeds the requester's ceiling");
    }

    let remaining = book.remaining();
    let smallest = remaining
        .app
        .min(remaining.workerpool)
        .min(remaining.request)
        .min(remaining.dataset.unwrap_or(u64::MAX));
    if terms.volume == 0 || terms.volume > smallest {
        violation!("volume {} outside 1..={}", terms.volume, smallest);
    }
    if book.request.tag & tag::BAG_OF_TASKS == 0 && terms.volume != 1 {
        violation!("single-task request matched {} tasks", terms.volume);
    }
    if terms.trust == 0 {
        violation!("deal trust is zero");
    }

    if Some(terms.payer_lock) != terms.task_price.checked_mul(terms.volume) {
        violation!("payer lock {} is not price x volume", terms.payer_lock);
    }
    match sim.ledger.locked_of(&sim.deal.sponsor) {
        Ok(locked) if locked == terms.payer_lock => {}
        other => violation!("requester escrow {:?} differs from {}", other.ok(), terms.payer_lock),
    }
    match sim.ledger.locked_of(&sim.deal.workerpool_owner) {
        Ok(locked) if locked == terms.scheduler_lock => {}
        other => violation!("scheduler escrow {:?} differs from {}", other.ok(), terms.scheduler_lock),
    }

    if let Some(deposits) = input.requester_deposit.checked_add(input.scheduler_deposit) {
        if sim.ledger.total_value() != Some(deposits) {
            violation!("matching changed total value");
        }
    }

    SimulationResult::Success
}

// ============================================================================
// Task Lifecycle Simulation
// ============================================================================

/// Run one task from contributions to finalize or claim, checking every
/// invariant after each step
pub fn simulate_task_lifecycle(input: &LifecycleInput) -> SimulationResult {
    let mut book = OrderBook::priced(
        input.app_price,
        input.dataset_price,
        input.workerpool_price,
        input.trust,
        1,
    );
    book.policy = WorkerpoolPolicy {
        worker_stake_ratio: input.worker_stake_ratio,
        scheduler_reward_ratio: input.scheduler_reward_ratio,
    };
    let config = ProtocolConfig {
        weight_policy: WeightPolicy::from_u8(input.weight_policy).unwrap_or_default(),
        kitty_ratio: input.kitty_ratio,
        kitty_min: input.kitty_min,
        ..ProtocolConfig::default()
    };
    let task_price = input.app_price + input.dataset_price.unwrap_or(0) + input.workerpool_price;

    let mut sim = match MarketSimulation::open(
        &book,
        config,
        task_price,
        input.workerpool_price,
        input.kitty,
    ) {
        Ok(sim) => sim,
        Err(err) => return SimulationResult::Error(err.to_string()),
    };
    for (index, plan) in input.workers.iter().enumerate() {
        if let Err(err) = sim.fund_worker(index, plan.score) {
            return SimulationResult::Error(err.to_string());
        }
    }
    let opened = sim.ledger.clone();
    let trust = sim.deal.trust;
    let mut now = START;

    // Contributions until consensus forms
    for (index, plan) in input.workers.iter().enumerate() {
        now += 1;
        let before = sim.task.clone();
        let result = sim.contribute(index, DIGEST_CHOICES[plan.choice], now);
        match (&result, before.status) {
            (Err(err), TaskStatus::Active) => {
                violation!("contribution {} rejected on an active task: {}", index, err)
            }
            (Ok(_), status) if status != TaskStatus::Active => {
                violation!("contribution {} accepted in status {:?}", index, status)
            }
            (Err(_), _) if sim.task.contributors.len() != before.contributors.len() => {
                violation!("rejected contribution {} left a trace", index)
            }
            _ => {}
        }

        if let TaskInvariantResult::InvalidStateTransition { from, to } =
            check_task_transition(before.status, sim.task.status)
        {
            violation!("contribution moved task from {:?} to {:?}", from, to);
        }
        if let Some(result) = consensus_violation(&before, &sim.task, trust) {
            return result;
        }
        if check_value_conservation(&opened, &sim.ledger) != LedgerInvariantResult::Valid {
            violation!("contribution {} changed total value", index);
        }
    }

    // Reveals
    if sim.task.status == TaskStatus::Revealing {
        now += 1;
        let consensus_value = sim.task.consensus_value;
        let task_id = sim.task.task_id;
        for (index, plan) in input.workers.iter().enumerate() {
            if !plan.reveals || !sim.task.contributors.contains(&worker_key(index)) {
                continue;
            }
            let digest = DIGEST_CHOICES[plan.choice];
            let on_consensus = hashing::result_hash(&task_id, &digest) == consensus_value;
            match (sim.reveal(index, digest, now), on_consensus) {
                (Ok(()), false) => violation!("worker {} revealed a losing result", index),
                (Err(err), true) => violation!("worker {} could not reveal the consensus: {}", index, err),
                _ => {}
            }
            if check_reveal_count(&sim.task) != TaskInvariantResult::Valid {
                violation!("more reveals than winners");
            }
        }
    }

    // Settlement
    let scores_before = sim.scores.clone();
    let finalizable = sim.task.status == TaskStatus::Revealing && sim.task.reveal_counter > 0;
    if finalizable && !input.scheduler_absent {
        now = now.max(sim.task.reveal_deadline);
        if let Err(err) = sim.finalize(now) {
            violation!("finalize of a revealed task failed: {}", err);
        }
        for contribution in &sim.contributions {
            let before = scores_before.score_of(&contribution.worker).unwrap_or(0);
            let after = sim.scores.score_of(&contribution.worker).unwrap_or(0);
            let proved = contribution.status == ContributionStatus::Proved;
            if proved != (after > before) || after < before {
                violation!("score of {} went from {} to {}", contribution.worker, before, after);
            }
        }
    } else {
        now = sim.deal.final_deadline;
        if let Err(err) = sim.claim(now) {
            violation!("claim after the final deadline failed: {}", err);
        }
        match sim.ledger.account(&sim.deal.sponsor) {
            Ok(account) if account.stake == task_price && account.locked == 0 => {}
            _ => violation!("requester not refunded in full"),
        }
    }

    if !sim.task.status.is_terminal() {
        violation!("task left in {:?}", sim.task.status);
    }
    if check_value_conservation(&opened, &sim.ledger) != LedgerInvariantResult::Valid {
        violation!("settlement changed total value");
    }
    if let LedgerInvariantResult::EscrowLeft { owner, locked } =
        check_escrow_released(&sim.ledger, &sim.parties())
    {
        violation!("{} still has {} locked", owner, locked);
    }
    if sim.claim(now).is_ok() {
        violation!("settled task was claimed again");
    }

    SimulationResult::Success
}

fn consensus_violation(before: &Task, after: &Task, trust: u64) -> Option<SimulationResult> {
    let unique = check_consensus_unique(after, trust);
    if unique != ConsensusInvariantResult::Valid {
        return Some(SimulationResult::InvariantViolation(format!("{:?}", unique)));
    }
    let immutable = check_consensus_immutable(before, after);
    if immutable != ConsensusInvariantResult::Valid {
        return Some(SimulationResult::InvariantViolation(format!("{:?}", immutable)));
    }
    None
}

// ============================================================================
// Reference Scenarios
// ============================================================================

/// Prices 3, 1 and 25 under generous ceilings match at 29 per task
pub fn scenario_price_resolution() -> SimulationResult {
    let mut book = OrderBook::priced(3, Some(1), 25, 1, 5);
    book.request.app_max_price = 10;
    book.request.dataset_max_price = 10;
    book.request.workerpool_max_price = 30;

    let sim = match MarketSimulation::open(&book, ProtocolConfig::default(), 200, 100, 0) {
        Ok(sim) => sim,
        Err(err) => return SimulationResult::Error(err.to_string()),
    };
    if sim.terms.task_price != 29 {
        violation!("deal price {} instead of 29", sim.terms.task_price);
    }
    if sim.terms.volume != 5 || sim.ledger.locked_of(&sim.deal.sponsor).ok() != Some(145) {
        violation!("requester lock is not 29 x 5");
    }
    SimulationResult::Success
}

/// Two matching hashes reach trust 2; a dissenting worker who contributed in
/// between can never reveal
pub fn scenario_dissenter_cannot_reveal() -> SimulationResult {
    let book = OrderBook::priced(3, None, 25, 2, 1);
    let mut sim = match MarketSimulation::open(&book, ProtocolConfig::default(), 28, 25, 0) {
        Ok(sim) => sim,
        Err(err) => return SimulationResult::Error(err.to_string()),
    };
    let (agreed, dissent) = (DIGEST_CHOICES[0], DIGEST_CHOICES[1]);
    for index in 0..3 {
        if let Err(err) = sim.fund_worker(index, 0) {
            return SimulationResult::Error(err.to_string());
        }
    }

    let steps = [(0, agreed), (1, dissent), (2, agreed)];
    for (offset, (index, digest)) in steps.into_iter().enumerate() {
        if let Err(err) = sim.contribute(index, digest, START + 1 + offset as i64) {
            return SimulationResult::Error(err.to_string());
        }
    }
    let expected = hashing::result_hash(&sim.task.task_id, &agreed);
    if sim.task.status != TaskStatus::Revealing || sim.task.consensus_value != expected {
        violation!("consensus not fixed on the agreed hash");
    }
    if sim.reveal(1, dissent, START + 10).is_ok() || sim.reveal(1, agreed, START + 10).is_ok() {
        violation!("dissenting worker revealed");
    }
    if sim.task.reveal_counter != 0 {
        violation!("failed reveals were counted");
    }
    SimulationResult::Success
}

/// Nobody reveals before the reveal deadline: the task is claimed, the
/// requester refunded and the scheduler stake seized
pub fn scenario_silent_reveal_claim() -> SimulationResult {
    let book = OrderBook::priced(3, Some(1), 25, 2, 1);
    let mut sim = match MarketSimulation::open(&book, ProtocolConfig::default(), 29, 25, 0) {
        Ok(sim) => sim,
        Err(err) => return SimulationResult::Error(err.to_string()),
    };
    for index in 0..2 {
        let step = sim
            .fund_worker(index, 0)
            .and_then(|_| sim.contribute(index, DIGEST_CHOICES[0], START + 1 + index as i64));
        if let Err(err) = step {
            return SimulationResult::Error(err.to_string());
        }
    }
    let reveal_deadline = sim.task.reveal_deadline;
    if sim.claim(reveal_deadline - 1).is_ok() {
        violation!("claimed before the reveal deadline");
    }
    if let Err(err) = sim.claim(reveal_deadline) {
        violation!("claim after a silent reveal window failed: {}", err);
    }

    if sim.task.status != TaskStatus::Failed {
        violation!("claimed task is {:?}", sim.task.status);
    }
    match sim.ledger.account(&sim.deal.sponsor) {
        Ok(account) if account.stake == 29 && account.locked == 0 => {}
        _ => violation!("requester not refunded"),
    }
    let seized = sim.deal.scheduler_stake + 2 * sim.deal.worker_stake;
    if sim.ledger.kitty != seized {
        violation!("kitty holds {} instead of {}", sim.ledger.kitty, seized);
    }
    SimulationResult::Success
}

/// A losing worker who never reveals loses its stake on finalize; the
/// winners and the scheduler share the reward and the loser's score stays
pub fn scenario_losing_worker_seized() -> SimulationResult {
    let book = OrderBook::priced(3, Some(1), 25, 2, 1);
    let config = ProtocolConfig {
        kitty_min: 0,
        ..ProtocolConfig::default()
    };
    let mut sim = match MarketSimulation::open(&book, config, 29, 25, 0) {
        Ok(sim) => sim,
        Err(err) => return SimulationResult::Error(err.to_string()),
    };
    let (winning, losing) = (DIGEST_CHOICES[0], DIGEST_CHOICES[1]);
    let steps = [(0, winning), (1, losing), (2, winning)];
    for (offset, (index, digest)) in steps.into_iter().enumerate() {
        let step = sim
            .fund_worker(index, 0)
            .and_then(|_| sim.contribute(index, digest, START + 1 + offset as i64));
        if let Err(err) = step {
            return SimulationResult::Error(err.to_string());
        }
    }
    for index in [0, 2] {
        if let Err(err) = sim.reveal(index, winning, START + 10) {
            return SimulationResult::Error(err.to_string());
        }
    }
    let outcome = match sim.finalize(START + 11) {
        Ok(outcome) => outcome,
        Err(err) => violation!("finalize failed: {}", err),
    };

    let loser = worker_key(1);
    let stake = sim.deal.worker_stake;
    match sim.ledger.account(&loser) {
        Ok(account) if account.stake == WORKER_DEPOSIT - stake && account.locked == 0 => {}
        _ => violation!("losing stake not seized"),
    }
    if sim.scores.score_of(&loser).ok() != Some(0) {
        violation!("losing worker score changed");
    }
    let paid: u64 = outcome.worker_rewards.iter().map(|payout| payout.amount).sum();
    if outcome.worker_rewards.len() != 2 || paid + outcome.scheduler_reward != sim.deal.workerpool_price {
        violation!("workerpool price not split between winners and scheduler");
    }
    SimulationResult::Success
}

/// A trust-one deal settles on the worker's single contribution: the worker
/// keeps its stake, gains a point of score and the requester pays the price
pub fn scenario_single_step_finalize() -> SimulationResult {
    let book = OrderBook::priced(3, None, 25, 1, 1);
    let config = ProtocolConfig {
        kitty_min: 0,
        ..ProtocolConfig::default()
    };
    let mut sim = match MarketSimulation::open(&book, config, 28, 25, 0) {
        Ok(sim) => sim,
        Err(err) => return SimulationResult::Error(err.to_string()),
    };
    if let Err(err) = sim.fund_worker(0, 0) {
        return SimulationResult::Error(err.to_string());
    }
    let opened = sim.ledger.clone();
    if sim
        .contribute_and_finalize(0, DIGEST_CHOICES[0], sim.task.contribution_deadline)
        .is_ok()
    {
        violation!("finalized at the contribution deadline");
    }
    let outcome = match sim.contribute_and_finalize(0, DIGEST_CHOICES[0], START + 1) {
        Ok(outcome) => outcome,
        Err(err) => violation!("single step finalize failed: {}", err),
    };

    if sim.task.status != TaskStatus::Completed {
        violation!("task is {:?} after a single step finalize", sim.task.status);
    }
    let worker = worker_key(0);
    match sim.ledger.account(&worker) {
        Ok(account) if account.locked == 0 && account.stake >= WORKER_DEPOSIT => {}
        _ => violation!("worker stake not released"),
    }
    if sim.scores.score_of(&worker).ok() != Some(1) {
        violation!("worker score not incremented");
    }
    let paid: u64 = outcome.worker_rewards.iter().map(|payout| payout.amount).sum();
    if paid + outcome.scheduler_reward != sim.deal.workerpool_price {
        violation!("workerpool price not split between worker and scheduler");
    }
    if check_value_conservation(&opened, &sim.ledger) != LedgerInvariantResult::Valid {
        violation!("single step finalize changed the total value");
    }
    if let LedgerInvariantResult::EscrowLeft { owner, locked } =
        check_escrow_released(&sim.ledger, &sim.parties())
    {
        violation!("{} still has {} locked", owner, locked);
    }
    if sim.contribute_and_finalize(1, DIGEST_CHOICES[0], START + 2).is_ok() {
        violation!("completed task accepted another contribution");
    }
    SimulationResult::Success
}
