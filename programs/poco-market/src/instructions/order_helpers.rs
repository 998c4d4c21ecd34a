//! Consumption records and ownership of orders

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::orders::{Order, OrderKind};
use crate::state::{Asset, AssetKind, OrderState};

/// Asset kind an asset order must point to
pub fn expected_asset_kind(kind: OrderKind) -> Option<AssetKind> {
    match kind {
        OrderKind::App => Some(AssetKind::App),
        OrderKind::Dataset => Some(AssetKind::Dataset),
        OrderKind::Workerpool => Some(AssetKind::Workerpool),
        OrderKind::Request => None,
    }
}

/// Check that `asset` (stored at `asset_key`) is the asset `pointer` of `kind`
pub fn check_asset(asset: &Asset, asset_key: &Pubkey, pointer: &Pubkey, kind: AssetKind) -> Result<()> {
    require_keys_eq!(*asset_key, *pointer, PocoError::AssetMismatch);
    require!(asset.kind == kind, PocoError::AssetKindMismatch);
    Ok(())
}

/// Party whose signature authorizes `order`: the asset owner for asset
/// orders, the requester for request orders
pub fn resolve_order_owner(order: &Order, asset: Option<(&Asset, Pubkey)>) -> Result<Pubkey> {
    match (order, expected_asset_kind(order.kind())) {
        (Order::Request(request), _) => Ok(request.requester),
        (_, Some(kind)) => {
            let (asset, asset_key) = asset.ok_or(PocoError::AssetMismatch)?;
            let pointer = order.asset().ok_or(PocoError::AssetMismatch)?;
            check_asset(asset, &asset_key, &pointer, kind)?;
            Ok(asset.owner)
        }
        (_, None) => Err(PocoError::AssetKindMismatch.into()),
    }
}

/// Fill a freshly created record, or check an existing one belongs to the
/// same order
pub fn open_order_state(
    state: &mut OrderState,
    order_hash: [u8; 32],
    kind: OrderKind,
    owner: Pubkey,
    bump: u8,
) -> Result<()> {
    if state.order_hash == [0u8; 32] {
        state.order_hash = order_hash;
        state.kind = kind;
        state.owner = owner;
        state.presigned = false;
        state.cancelled = false;
        state.consumed = 0;
        state.bump = bump;
        return Ok(());
    }
    require!(state.order_hash == order_hash, PocoError::OrderHashMismatch);
    require!(state.kind == kind, PocoError::OrderHashMismatch);
    require_keys_eq!(state.owner, owner, PocoError::UnauthorizedOrderOwner);
    Ok(())
}

/// A match starts at the first unmatched unit of the request order, so a
/// replayed or racing match sees a stale index
pub fn check_start_index(start_index: u64, request_state: &OrderState) -> Result<()> {
    require!(
        start_index == request_state.consumed,
        PocoError::StaleStartIndex
    );
    Ok(())
}

/// Record `volume` more units matched against the order
pub fn consume(state: &mut OrderState, volume: u64, order_volume: u64) -> Result<()> {
    let consumed = state
        .consumed
        .checked_add(volume)
        .ok_or(PocoError::ArithmeticOverflow)?;
    require!(consumed <= order_volume, PocoError::OrderFullyConsumed);
    state.consumed = consumed;
    Ok(())
}
