//! Contribute, reveal and finalize a trust-one task in a single step

use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions as sysvar_instructions;

use crate::errors::PocoError;
use crate::events::{ConsensusReached, TaskContributed, TaskRevealed};
use crate::instructions::account_books::LedgerBook;
use crate::instructions::consensus_helpers::contribute_and_reveal;
use crate::instructions::finalize_task::{emit_finalize, record_completion};
use crate::instructions::ledger_helpers::LedgerStore;
use crate::instructions::score_helpers::contribution_weight;
use crate::instructions::settlement_helpers::settle_finalize;
use crate::instructions::signature_helpers::{
    check_contribution_authorization, collect_attestations,
};
use crate::state::{Contribution, ContributionStatus, Deal, ProtocolConfig, Task, WorkerScore};
use crate::utils::hashing;
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct ContributeAndFinalize<'info> {
    #[account(
        init,
        payer = worker,
        space = 8 + Contribution::INIT_SPACE,
        seeds = [b"contribution", task.task_id.as_ref(), worker.key().as_ref()],
        bump
    )]
    pub contribution: Account<'info, Contribution>,

    #[account(
        mut,
        seeds = [b"task", task.deal_id.as_ref(), task.index.to_le_bytes().as_ref()],
        bump = task.bump
    )]
    pub task: Box<Account<'info, Task>>,

    #[account(
        mut,
        constraint = deal.key() == task.deal @ PocoError::InvalidAccountAddress
    )]
    pub deal: Box<Account<'info, Deal>>,

    #[account(
        init_if_needed,
        payer = worker,
        space = 8 + WorkerScore::INIT_SPACE,
        seeds = [b"score", worker.key().as_ref()],
        bump
    )]
    pub worker_score: Account<'info, WorkerScore>,

    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    #[account(mut)]
    pub worker: Signer<'info>,

    /// CHECK: address checked against the instructions sysvar id
    #[account(address = sysvar_instructions::ID)]
    pub instructions: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

/// The worker stake is locked and released within the instruction, so the
/// worker must hold it like any other contributor.
///
/// `remaining_accounts`: the `LedgerAccount` of every party paid or
/// charged (payer, app owner, dataset owner, worker and scheduler), each once.
pub fn handler(
    ctx: Context<ContributeAndFinalize>,
    digest: [u8; 32],
    results: Vec<u8>,
    results_callback: Vec<u8>,
    enclave_challenge: Pubkey,
) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    check_version_compatible(config)?;

    let clock = Clock::get()?;
    let now = clock.unix_timestamp;
    let worker = ctx.accounts.worker.key();
    let deal = &ctx.accounts.deal;
    let task_id = ctx.accounts.task.task_id;

    let score = &mut ctx.accounts.worker_score;
    if score.worker == Pubkey::default() {
        score.worker = worker;
        score.bump = ctx.bumps.worker_score;
    }
    let weight = contribution_weight(config.weight_policy, score.score);

    let contribution = &mut ctx.accounts.contribution;
    contribution.task_id = task_id;
    contribution.worker = worker;
    contribution.status = ContributionStatus::Contributed;
    contribution.result_hash = hashing::result_hash(&task_id, &digest);
    contribution.result_seal = hashing::result_seal(&worker, &task_id, &digest);
    contribution.enclave_challenge = enclave_challenge;
    contribution.weight = weight;
    contribution.score_delta = 0;
    contribution.bump = ctx.bumps.contribution;

    let attestations = collect_attestations(&ctx.accounts.instructions.to_account_info())?;
    check_contribution_authorization(&attestations, config, deal, contribution)?;

    let task = &mut ctx.accounts.task;
    let reveal_deadline = contribute_and_reveal(
        task,
        deal,
        contribution,
        digest,
        &results,
        &results_callback,
        now,
    )?;
    let result_hash = contribution.result_hash;

    let mut ledger = LedgerBook::load(ctx.remaining_accounts, ctx.program_id, config.kitty)?;
    ledger.lock(&worker, deal.worker_stake)?;
    let outcome = settle_finalize(
        deal,
        std::slice::from_mut(&mut **contribution),
        &mut ledger,
        &mut **score,
        config.kitty_ratio,
        config.kitty_min,
    )?;
    let kitty = ledger.commit()?;

    emit!(TaskContributed {
        task_id,
        worker,
        result_hash,
        weight,
        timestamp: now,
    });
    emit!(ConsensusReached {
        task_id,
        consensus_value: result_hash,
        reveal_deadline,
        timestamp: now,
    });
    emit!(TaskRevealed {
        task_id,
        worker,
        digest,
        timestamp: now,
    });

    record_completion(
        &mut ctx.accounts.task,
        &mut ctx.accounts.deal,
        &mut ctx.accounts.protocol_config,
        kitty,
        outcome.task_price,
        results,
        results_callback,
    )?;
    emit_finalize(&ctx.accounts.task, &ctx.accounts.deal, &outcome, kitty, now)
}
