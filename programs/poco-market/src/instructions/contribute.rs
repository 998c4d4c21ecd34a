//! Submit a worker's staked result commitment

use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions as sysvar_instructions;

use crate::errors::PocoError;
use crate::events::{ConsensusReached, TaskContributed};
use crate::instructions::consensus_helpers::{record_contribution, ContributionOutcome};
use crate::instructions::score_helpers::contribution_weight;
use crate::instructions::signature_helpers::{
    check_contribution_authorization, collect_attestations,
};
use crate::state::{
    Contribution, ContributionStatus, Deal, LedgerAccount, ProtocolConfig, Task, WorkerScore,
};
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
pub struct Contribute<'info> {
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
        constraint = deal.key() == task.deal @ PocoError::InvalidAccountAddress
    )]
    pub deal: Box<Account<'info, Deal>>,

    #[account(
        mut,
        seeds = [b"ledger", worker.key().as_ref()],
        bump = worker_ledger.bump
    )]
    pub worker_ledger: Account<'info, LedgerAccount>,

    #[account(
        init_if_needed,
        payer = worker,
        space = 8 + WorkerScore::INIT_SPACE,
        seeds = [b"score", worker.key().as_ref()],
        bump
    )]
    pub worker_score: Account<'info, WorkerScore>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(mut)]
    pub worker: Signer<'info>,

    /// CHECK: address checked against the instructions sysvar id
    #[account(address = sysvar_instructions::ID)]
    pub instructions: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

/// Authorization must be attested by the workerpool owner, or by the TEE
/// broker on deals that require an enclave. See
/// [`check_contribution_authorization`].
pub fn handler(
    ctx: Context<Contribute>,
    result_hash: [u8; 32],
    result_seal: [u8; 32],
    enclave_challenge: Pubkey,
) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    check_version_compatible(config)?;
    require!(result_seal != [0u8; 32], PocoError::InvalidResultHash);

    let clock = Clock::get()?;
    let worker = ctx.accounts.worker.key();
    let deal = &ctx.accounts.deal;
    let task_id = ctx.accounts.task.task_id;

    let contribution = &mut ctx.accounts.contribution;
    contribution.task_id = task_id;
    contribution.worker = worker;
    contribution.status = ContributionStatus::Contributed;
    contribution.result_hash = result_hash;
    contribution.result_seal = result_seal;
    contribution.enclave_challenge = enclave_challenge;
    contribution.score_delta = 0;
    contribution.bump = ctx.bumps.contribution;

    let attestations = collect_attestations(&ctx.accounts.instructions.to_account_info())?;
    check_contribution_authorization(&attestations, config, deal, contribution)?;

    let score = &mut ctx.accounts.worker_score;
    if score.worker == Pubkey::default() {
        score.worker = worker;
        score.bump = ctx.bumps.worker_score;
    }
    let weight = contribution_weight(config.weight_policy, score.score);

    ctx.accounts.worker_ledger.lock(deal.worker_stake)?;

    let task = &mut ctx.accounts.task;
    let outcome = record_contribution(
        task,
        worker,
        result_hash,
        weight,
        deal.trust,
        deal.reveal_window,
        clock.unix_timestamp,
    )?;

    ctx.accounts.contribution.weight = weight;

    emit!(TaskContributed {
        task_id,
        worker,
        result_hash,
        weight,
        timestamp: clock.unix_timestamp,
    });

    if let ContributionOutcome::ConsensusReached {
        consensus_value,
        reveal_deadline,
    } = outcome
    {
        emit!(ConsensusReached {
            task_id,
            consensus_value,
            reveal_deadline,
            timestamp: clock.unix_timestamp,
        });
    }

    Ok(())
}
