#![allow(unexpected_cfgs)]
//! PoCo Market
//!
//! Proof-of-Contribution marketplace for off-chain computation. App,
//! dataset, workerpool and request orders are matched into escrowed deals;
//! workers of the chosen pool contribute hashed results per task, reach a
//! weighted consensus, reveal, and get paid from the locked stakes.

use anchor_lang::prelude::*;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

pub mod errors;
pub mod events;
pub mod instructions;
pub mod orders;
pub mod state;
pub mod utils;

use instructions::*;
use orders::{AppOrder, DatasetOrder, Order, RequestOrder, WorkerpoolOrder};
use state::AssetKind;

#[program]
pub mod poco_market {
    use super::*;

    /// Create the protocol config and the vault holding every deposit.
    ///
    /// # Arguments
    /// * `stake_mint` - SPL mint of the stake token, `None` for native SOL
    /// * `tee_broker` - Key allowed to authorize workers on TEE deals
    /// * `weight_policy` - Contribution weight policy (see WeightPolicy)
    /// * `multisig_threshold` - Approvals required for admin instructions
    /// * `multisig_owners` - Keys counted towards the threshold
    pub fn initialize_protocol(
        ctx: Context<InitializeProtocol>,
        stake_mint: Option<Pubkey>,
        tee_broker: Pubkey,
        weight_policy: u8,
        multisig_threshold: u8,
        multisig_owners: Vec<Pubkey>,
    ) -> Result<()> {
        instructions::initialize_protocol::handler(
            ctx,
            stake_mint,
            tee_broker,
            weight_policy,
            multisig_threshold,
            multisig_owners,
        )
    }

    /// Update kitty, deadline and weight parameters.
    /// Requires multisig approval.
    pub fn update_protocol_params(
        ctx: Context<UpdateProtocolParams>,
        params: ProtocolParams,
    ) -> Result<()> {
        instructions::update_protocol_params::handler(ctx, params)
    }

    /// Add a work category with its reference clock time.
    /// Requires multisig approval.
    pub fn create_category(
        ctx: Context<CreateCategory>,
        name: String,
        description: String,
        work_clock_time_ref: i64,
    ) -> Result<()> {
        instructions::create_category::handler(ctx, name, description, work_clock_time_ref)
    }

    /// Register an app, dataset or workerpool owned by the signer.
    pub fn register_asset(
        ctx: Context<RegisterAsset>,
        asset_id: [u8; 32],
        kind: AssetKind,
        worker_stake_ratio_policy: u8,
        scheduler_reward_ratio_policy: u8,
    ) -> Result<()> {
        instructions::register_asset::handler(
            ctx,
            asset_id,
            kind,
            worker_stake_ratio_policy,
            scheduler_reward_ratio_policy,
        )
    }

    pub fn update_workerpool_policy(
        ctx: Context<UpdateWorkerpoolPolicy>,
        worker_stake_ratio_policy: u8,
        scheduler_reward_ratio_policy: u8,
    ) -> Result<()> {
        instructions::update_workerpool_policy::handler(
            ctx,
            worker_stake_ratio_policy,
            scheduler_reward_ratio_policy,
        )
    }

    /// Move funds into the vault and credit the signer's ledger.
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        instructions::deposit::handler(ctx, amount)
    }

    /// Pay unlocked ledger funds back out of the vault.
    pub fn withdraw(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
        instructions::withdraw::handler(ctx, amount)
    }

    /// Approve an order on-chain so matching needs no signature for it.
    pub fn presign_order(
        ctx: Context<PresignOrder>,
        order_hash: [u8; 32],
        order: Order,
    ) -> Result<()> {
        instructions::presign_order::handler(ctx, order_hash, order)
    }

    /// Consume the whole remaining volume of an order.
    pub fn cancel_order(
        ctx: Context<CancelOrder>,
        order_hash: [u8; 32],
        order: Order,
    ) -> Result<()> {
        instructions::cancel_order::handler(ctx, order_hash, order)
    }

    /// Match compatible orders into a deal and lock its escrow.
    ///
    /// Orders that were not presigned must be signed by their owner in an
    /// Ed25519 instruction earlier in the same transaction. Ledgers of the
    /// payer, the scheduler, the app owner and the dataset owner go in
    /// `remaining_accounts`.
    #[allow(clippy::too_many_arguments)]
    pub fn match_orders(
        ctx: Context<MatchOrders>,
        app_hash: [u8; 32],
        dataset_hash: [u8; 32],
        workerpool_hash: [u8; 32],
        request_hash: [u8; 32],
        start_index: u64,
        app_order: AppOrder,
        dataset_order: Option<DatasetOrder>,
        workerpool_order: WorkerpoolOrder,
        request_order: RequestOrder,
    ) -> Result<()> {
        instructions::match_orders::handler(
            ctx,
            app_hash,
            dataset_hash,
            workerpool_hash,
            request_hash,
            start_index,
            app_order,
            dataset_order,
            workerpool_order,
            request_order,
        )
    }

    /// Open task `index` of a deal. Only the deal's scheduler can do this.
    pub fn initialize_task(ctx: Context<InitializeTask>, index: u64) -> Result<()> {
        instructions::initialize_task::handler(ctx, index)
    }

    /// Commit a sealed result for an active task.
    ///
    /// # Arguments
    /// * `result_hash` - Hash binding the result digest to the task
    /// * `result_seal` - Hash binding the result digest to the worker
    /// * `enclave_challenge` - Enclave key for TEE deals, default otherwise
    pub fn contribute(
        ctx: Context<Contribute>,
        result_hash: [u8; 32],
        result_seal: [u8; 32],
        enclave_challenge: Pubkey,
    ) -> Result<()> {
        instructions::contribute::handler(ctx, result_hash, result_seal, enclave_challenge)
    }

    /// Disclose the digest behind a contribution matching the consensus.
    pub fn reveal(ctx: Context<Reveal>, digest: [u8; 32]) -> Result<()> {
        instructions::reveal::handler(ctx, digest)
    }

    /// Complete a revealed task and distribute rewards.
    pub fn finalize_task(
        ctx: Context<FinalizeTask>,
        results: Vec<u8>,
        results_callback: Vec<u8>,
    ) -> Result<()> {
        instructions::finalize_task::handler(ctx, results, results_callback)
    }

    /// Contribute, reveal and finalize in one step on a trust-one deal.
    ///
    /// Takes the same authorization and enclave attestations as
    /// `contribute`; the result hash and seal are derived from `digest`.
    pub fn contribute_and_finalize(
        ctx: Context<ContributeAndFinalize>,
        digest: [u8; 32],
        results: Vec<u8>,
        results_callback: Vec<u8>,
        enclave_challenge: Pubkey,
    ) -> Result<()> {
        instructions::contribute_and_finalize::handler(
            ctx,
            digest,
            results,
            results_callback,
            enclave_challenge,
        )
    }

    /// Fail a task past its deadlines, refund the payer and seize stakes.
    pub fn claim_task(ctx: Context<ClaimTask>) -> Result<()> {
        instructions::claim_task::handler(ctx)
    }

    pub fn initialize_and_claim(ctx: Context<InitializeAndClaim>, index: u64) -> Result<()> {
        instructions::initialize_and_claim::handler(ctx, index)
    }
}
