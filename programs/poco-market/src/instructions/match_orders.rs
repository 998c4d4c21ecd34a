//! Match four orders into an escrow-backed deal

use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions as sysvar_instructions;

use crate::errors::PocoError;
use crate::events::{OrdersMatched, SchedulerNotice};
use crate::instructions::account_books::LedgerBook;
use crate::instructions::consensus_helpers::deal_deadlines;
use crate::instructions::ledger_helpers::lock_deal_escrow;
use crate::instructions::match_helpers::{
    remaining_volume, resolve_deal_terms, RemainingVolumes, WorkerpoolPolicy,
};
use crate::instructions::order_helpers::{check_asset, check_start_index, consume, open_order_state};
use crate::instructions::signature_helpers::{collect_attestations, OrderAuthorization};
use crate::orders::{AppOrder, DatasetOrder, Order, OrderKind, RequestOrder, WorkerpoolOrder};
use crate::state::{Asset, AssetKind, Category, Deal, OrderState, ProtocolConfig};
use crate::utils::hashing;
use crate::utils::version::check_version_compatible;

#[derive(Accounts)]
#[instruction(
    app_hash: [u8; 32],
    dataset_hash: [u8; 32],
    workerpool_hash: [u8; 32],
    request_hash: [u8; 32],
    start_index: u64
)]
pub struct MatchOrders<'info> {
    #[account(
        init,
        payer = payer,
        space = 8 + Deal::INIT_SPACE,
        seeds = [b"deal", request_hash.as_ref(), start_index.to_le_bytes().as_ref()],
        bump
    )]
    pub deal: Box<Account<'info, Deal>>,

    #[account(
        init_if_needed,
        payer = payer,
        space = 8 + OrderState::INIT_SPACE,
        seeds = [b"order", app_hash.as_ref()],
        bump
    )]
    pub app_order_state: Box<Account<'info, OrderState>>,

    #[account(
        init_if_needed,
        payer = payer,
        space = 8 + OrderState::INIT_SPACE,
        seeds = [b"order", dataset_hash.as_ref()],
        bump
    )]
    pub dataset_order_state: Option<Account<'info, OrderState>>,

    #[account(
        init_if_needed,
        payer = payer,
        space = 8 + OrderState::INIT_SPACE,
        seeds = [b"order", workerpool_hash.as_ref()],
        bump
    )]
    pub workerpool_order_state: Box<Account<'info, OrderState>>,

    #[account(
        init_if_needed,
        payer = payer,
        space = 8 + OrderState::INIT_SPACE,
        seeds = [b"order", request_hash.as_ref()],
        bump
    )]
    pub request_order_state: Box<Account<'info, OrderState>>,

    pub app_asset: Box<Account<'info, Asset>>,

    pub dataset_asset: Option<Box<Account<'info, Asset>>>,

    pub workerpool_asset: Box<Account<'info, Asset>>,

    pub category: Box<Account<'info, Category>>,

    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    /// Funds the requester side of the escrow when present
    pub sponsor: Option<Signer<'info>>,

    #[account(mut)]
    pub payer: Signer<'info>,

    /// CHECK: address checked against the instructions sysvar id
    #[account(address = sysvar_instructions::ID)]
    pub instructions: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

#[allow(clippy::too_many_arguments)]
pub fn handler(
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
    let clock = Clock::get()?;
    let config = &ctx.accounts.protocol_config;
    check_version_compatible(config)?;
    let domain = config.domain_separator;

    // Order digests must match the consumption records the caller selected
    let orders = [
        (Order::App(app_order.clone()), app_hash),
        (Order::Workerpool(workerpool_order.clone()), workerpool_hash),
        (Order::Request(request_order.clone()), request_hash),
    ];
    for (order, hash) in &orders {
        order.validate()?;
        require!(order.hash(&domain)? == *hash, PocoError::OrderHashMismatch);
    }
    match (&dataset_order, &ctx.accounts.dataset_order_state, &ctx.accounts.dataset_asset) {
        (Some(order), Some(_), Some(_)) => {
            let order = Order::Dataset(order.clone());
            order.validate()?;
            require!(order.hash(&domain)? == dataset_hash, PocoError::OrderHashMismatch);
        }
        (None, None, None) => {
            require!(dataset_hash == [0u8; 32], PocoError::OrderHashMismatch);
        }
        _ => return Err(PocoError::DatasetMismatch.into()),
    }

    // Assets
    let app_asset = &ctx.accounts.app_asset;
    let workerpool_asset = &ctx.accounts.workerpool_asset;
    check_asset(app_asset, &app_asset.key(), &app_order.app, AssetKind::App)?;
    check_asset(
        workerpool_asset,
        &workerpool_asset.key(),
        &workerpool_order.workerpool,
        AssetKind::Workerpool,
    )?;
    let dataset_owner = match (&dataset_order, &ctx.accounts.dataset_asset) {
        (Some(order), Some(asset)) => {
            check_asset(asset, &asset.key(), &order.dataset, AssetKind::Dataset)?;
            Some(asset.owner)
        }
        _ => None,
    };

    let category = &ctx.accounts.category;
    require!(
        category.category_id == request_order.category,
        PocoError::CategoryNotFound
    );

    // Signatures
    let instructions = ctx.accounts.instructions.to_account_info();
    let mut authorization = OrderAuthorization::new(|| collect_attestations(&instructions));
    authorization.require(
        ctx.accounts.app_order_state.presigned,
        &app_asset.owner,
        &app_hash,
        PocoError::InvalidAppOrderSignature,
    )?;
    if let (Some(state), Some(owner)) = (&ctx.accounts.dataset_order_state, &dataset_owner) {
        authorization.require(
            state.presigned,
            owner,
            &dataset_hash,
            PocoError::InvalidDatasetOrderSignature,
        )?;
    }
    authorization.require(
        ctx.accounts.workerpool_order_state.presigned,
        &workerpool_asset.owner,
        &workerpool_hash,
        PocoError::InvalidWorkerpoolOrderSignature,
    )?;
    authorization.require(
        ctx.accounts.request_order_state.presigned,
        &request_order.requester,
        &request_hash,
        PocoError::InvalidRequestOrderSignature,
    )?;

    // Volumes
    check_start_index(start_index, &ctx.accounts.request_order_state)?;
    let app_state = &ctx.accounts.app_order_state;
    let workerpool_state = &ctx.accounts.workerpool_order_state;
    let request_state = &ctx.accounts.request_order_state;
    let remaining = RemainingVolumes {
        app: remaining_volume(app_order.volume, app_state.consumed, app_state.cancelled)?,
        dataset: match (&dataset_order, &ctx.accounts.dataset_order_state) {
            (Some(order), Some(state)) => Some(remaining_volume(
                order.volume,
                state.consumed,
                state.cancelled,
            )?),
            _ => None,
        },
        workerpool: remaining_volume(
            workerpool_order.volume,
            workerpool_state.consumed,
            workerpool_state.cancelled,
        )?,
        request: remaining_volume(
            request_order.volume,
            request_state.consumed,
            request_state.cancelled,
        )?,
    };

    let policy = WorkerpoolPolicy {
        worker_stake_ratio: workerpool_asset.worker_stake_ratio_policy,
        scheduler_reward_ratio: workerpool_asset.scheduler_reward_ratio_policy,
    };
    let terms = resolve_deal_terms(
        &app_order,
        dataset_order.as_ref(),
        &workerpool_order,
        &request_order,
        &policy,
        &remaining,
    )?;
    let deadlines = deal_deadlines(clock.unix_timestamp, category.work_clock_time_ref, config)?;

    // Escrow: nothing is written back unless both locks hold
    let payer = ctx
        .accounts
        .sponsor
        .as_ref()
        .map(|sponsor| sponsor.key())
        .unwrap_or(request_order.requester);
    let app_owner = app_asset.owner;
    let workerpool_owner = workerpool_asset.owner;
    let mut ledger = LedgerBook::load(ctx.remaining_accounts, ctx.program_id, config.kitty)?;
    let mut parties = vec![payer, workerpool_owner, app_owner];
    parties.extend(dataset_owner);
    ledger.require_owners(&parties)?;
    lock_deal_escrow(
        &mut ledger,
        &payer,
        terms.payer_lock,
        &workerpool_owner,
        terms.scheduler_lock,
    )?;

    // All checks passed: write
    ledger.commit()?;

    let deal_id = hashing::deal_id(&request_hash, start_index);
    let deal = &mut ctx.accounts.deal;
    deal.deal_id = deal_id;
    deal.app_hash = app_hash;
    deal.dataset_hash = dataset_hash;
    deal.workerpool_hash = workerpool_hash;
    deal.request_hash = request_hash;
    deal.app = app_order.app;
    deal.app_owner = app_owner;
    deal.app_price = terms.app_price;
    deal.dataset = dataset_order
        .as_ref()
        .map(|order| order.dataset)
        .unwrap_or_default();
    deal.dataset_owner = dataset_owner.unwrap_or_default();
    deal.dataset_price = terms.dataset_price;
    deal.workerpool = workerpool_order.workerpool;
    deal.workerpool_owner = workerpool_owner;
    deal.workerpool_price = terms.workerpool_price;
    deal.requester = request_order.requester;
    deal.sponsor = payer;
    deal.beneficiary = request_order.beneficiary;
    deal.callback = request_order.callback;
    deal.params = request_order.params.clone();
    deal.trust = terms.trust;
    deal.category = terms.category;
    deal.tag = terms.tag;
    deal.start_time = clock.unix_timestamp;
    deal.contribution_deadline = deadlines.contribution_deadline;
    deal.final_deadline = deadlines.final_deadline;
    deal.reveal_window = deadlines.reveal_window;
    deal.bot_first = start_index;
    deal.bot_size = terms.volume;
    deal.worker_stake = terms.worker_stake;
    deal.scheduler_stake = terms.scheduler_stake;
    deal.scheduler_reward_ratio = terms.scheduler_reward_ratio;
    deal.tasks_initialized = 0;
    deal.tasks_settled = 0;
    deal.bump = ctx.bumps.deal;

    let app_state = &mut ctx.accounts.app_order_state;
    open_order_state(app_state, app_hash, OrderKind::App, app_owner, ctx.bumps.app_order_state)?;
    consume(app_state, terms.volume, app_order.volume)?;

    if let (Some(state), Some(order), Some(owner)) = (
        ctx.accounts.dataset_order_state.as_mut(),
        dataset_order.as_ref(),
        dataset_owner,
    ) {
        let (_, bump) =
            Pubkey::find_program_address(&[b"order", dataset_hash.as_ref()], ctx.program_id);
        open_order_state(state, dataset_hash, OrderKind::Dataset, owner, bump)?;
        consume(state, terms.volume, order.volume)?;
    }

    let workerpool_state = &mut ctx.accounts.workerpool_order_state;
    open_order_state(
        workerpool_state,
        workerpool_hash,
        OrderKind::Workerpool,
        workerpool_owner,
        ctx.bumps.workerpool_order_state,
    )?;
    consume(workerpool_state, terms.volume, workerpool_order.volume)?;

    let request_state = &mut ctx.accounts.request_order_state;
    open_order_state(
        request_state,
        request_hash,
        OrderKind::Request,
        request_order.requester,
        ctx.bumps.request_order_state,
    )?;
    consume(request_state, terms.volume, request_order.volume)?;

    let config = &mut ctx.accounts.protocol_config;
    config.total_deals = config
        .total_deals
        .checked_add(1)
        .ok_or(PocoError::ArithmeticOverflow)?;

    emit!(OrdersMatched {
        deal_id,
        app_hash,
        dataset_hash,
        workerpool_hash,
        request_hash,
        volume: terms.volume,
        start_index,
        timestamp: clock.unix_timestamp,
    });
    emit!(SchedulerNotice {
        workerpool: workerpool_order.workerpool,
        deal_id,
        timestamp: clock.unix_timestamp,
    });

    Ok(())
}
