//! Signed market orders.
//!
//! Four kinds of intent meet in a deal: the app owner's [`AppOrder`], the
//! dataset owner's [`DatasetOrder`], the workerpool owner's
//! [`WorkerpoolOrder`] and the requester's [`RequestOrder`]. [`Order`] is the
//! closed variant set used wherever an instruction accepts "any order", and
//! owns the structured hash shared by all kinds.
//!
//! An order is never mutated once signed. Only its consumption record
//! ([`crate::state::OrderState`]) changes.

use anchor_lang::prelude::*;
use solana_sha256_hasher::hashv;

use crate::errors::PocoError;
use crate::state::MAX_RESTRICTIONS;

/// Hash prefix per order kind, keeps digests of different kinds disjoint
pub const APP_ORDER_PREFIX: &[u8] = b"AppOrder";
pub const DATASET_ORDER_PREFIX: &[u8] = b"DatasetOrder";
pub const WORKERPOOL_ORDER_PREFIX: &[u8] = b"WorkerpoolOrder";
pub const REQUEST_ORDER_PREFIX: &[u8] = b"RequestOrder";

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
#[repr(u8)]
pub enum OrderKind {
    #[default]
    App = 0,
    Dataset = 1,
    Workerpool = 2,
    Request = 3,
}

/// Offer to run an app at a given price
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct AppOrder {
    /// Asset account of the app
    pub app: Pubkey,
    pub app_price: u64,
    pub volume: u64,
    pub tag: u64,
    pub dataset_restrict: Vec<Pubkey>,
    pub workerpool_restrict: Vec<Pubkey>,
    pub requester_restrict: Vec<Pubkey>,
    pub salt: [u8; 32],
}

/// Offer to license a dataset at a given price
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct DatasetOrder {
    /// Asset account of the dataset
    pub dataset: Pubkey,
    pub dataset_price: u64,
    pub volume: u64,
    pub tag: u64,
    pub app_restrict: Vec<Pubkey>,
    pub workerpool_restrict: Vec<Pubkey>,
    pub requester_restrict: Vec<Pubkey>,
    pub salt: [u8; 32],
}

/// Offer of compute capacity from a workerpool
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct WorkerpoolOrder {
    /// Asset account of the workerpool
    pub workerpool: Pubkey,
    pub workerpool_price: u64,
    pub volume: u64,
    pub tag: u64,
    pub category: u64,
    pub trust: u64,
    pub app_restrict: Vec<Pubkey>,
    pub dataset_restrict: Vec<Pubkey>,
    pub requester_restrict: Vec<Pubkey>,
    pub salt: [u8; 32],
}

/// Demand for an execution, with price ceilings for every counterpart
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct RequestOrder {
    pub app: Pubkey,
    pub app_max_price: u64,
    /// Default when no dataset is requested
    pub dataset: Pubkey,
    pub dataset_max_price: u64,
    /// Default matches any workerpool
    pub workerpool: Pubkey,
    pub workerpool_max_price: u64,
    pub requester: Pubkey,
    pub volume: u64,
    pub tag: u64,
    pub category: u64,
    pub trust: u64,
    pub beneficiary: Pubkey,
    /// Default when no callback is requested
    pub callback: Pubkey,
    pub params: String,
    pub salt: [u8; 32],
}

/// Any of the four order kinds
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub enum Order {
    App(AppOrder),
    Dataset(DatasetOrder),
    Workerpool(WorkerpoolOrder),
    Request(RequestOrder),
}

impl Order {
    pub fn kind(&self) -> OrderKind {
        match self {
            Order::App(_) => OrderKind::App,
            Order::Dataset(_) => OrderKind::Dataset,
            Order::Workerpool(_) => OrderKind::Workerpool,
            Order::Request(_) => OrderKind::Request,
        }
    }

    pub fn volume(&self) -> u64 {
        match self {
            Order::App(order) => order.volume,
            Order::Dataset(order) => order.volume,
            Order::Workerpool(order) => order.volume,
            Order::Request(order) => order.volume,
        }
    }

    /// Asset account an asset order refers to. Request orders have none.
    pub fn asset(&self) -> Option<Pubkey> {
        match self {
            Order::App(order) => Some(order.app),
            Order::Dataset(order) => Some(order.dataset),
            Order::Workerpool(order) => Some(order.workerpool),
            Order::Request(_) => None,
        }
    }

    fn prefix(&self) -> &'static [u8] {
        match self {
            Order::App(_) => APP_ORDER_PREFIX,
            Order::Dataset(_) => DATASET_ORDER_PREFIX,
            Order::Workerpool(_) => WORKERPOOL_ORDER_PREFIX,
            Order::Request(_) => REQUEST_ORDER_PREFIX,
        }
    }

    fn body(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let written = match self {
            Order::App(order) => order.serialize(&mut data),
            Order::Dataset(order) => order.serialize(&mut data),
            Order::Workerpool(order) => order.serialize(&mut data),
            Order::Request(order) => order.serialize(&mut data),
        };
        written.map_err(|_| error!(PocoError::InvalidInput))?;
        Ok(data)
    }

    /// Domain-bound structured hash over every order field
    pub fn hash(&self, domain_separator: &[u8; 32]) -> Result<[u8; 32]> {
        let body = self.body()?;
        Ok(hashv(&[&domain_separator[..], self.prefix(), &body[..]]).to_bytes())
    }

    /// Shape checks that do not depend on any counterpart
    pub fn validate(&self) -> Result<()> {
        require!(self.volume() > 0, PocoError::InvalidOrderVolume);
        let restrictions: [&[Pubkey]; 3] = match self {
            Order::App(order) => [
                &order.dataset_restrict,
                &order.workerpool_restrict,
                &order.requester_restrict,
            ],
            Order::Dataset(order) => [
                &order.app_restrict,
                &order.workerpool_restrict,
                &order.requester_restrict,
            ],
            Order::Workerpool(order) => [
                &order.app_restrict,
                &order.dataset_restrict,
                &order.requester_restrict,
            ],
            Order::Request(order) => {
                require!(
                    order.params.len() <= crate::state::MAX_PARAMS_LEN,
                    PocoError::StringTooLong
                );
                [&[], &[], &[]]
            }
        };
        for list in restrictions {
            require!(
                list.len() <= MAX_RESTRICTIONS,
                PocoError::TooManyRestrictions
            );
        }
        Ok(())
    }
}

/// An empty restriction list admits everyone
pub fn restriction_allows(list: &[Pubkey], candidate: &Pubkey) -> bool {
    list.is_empty() || list.contains(candidate)
}
