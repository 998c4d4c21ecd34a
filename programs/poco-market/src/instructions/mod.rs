//! Instruction handlers for the PoCo market program

pub mod account_books;
pub mod consensus_helpers;
pub mod constants;
pub mod lamport_transfer;
pub mod ledger_helpers;
pub mod match_helpers;
pub mod order_helpers;
pub mod score_helpers;
pub mod settlement_helpers;
pub mod signature_helpers;
pub mod token_helpers;

pub mod cancel_order;
pub mod claim_task;
pub mod contribute;
pub mod contribute_and_finalize;
pub mod create_category;
pub mod deposit;
pub mod finalize_task;
pub mod initialize_and_claim;
pub mod initialize_protocol;
pub mod initialize_task;
pub mod match_orders;
pub mod presign_order;
pub mod register_asset;
pub mod reveal;
pub mod update_protocol_params;
pub mod update_workerpool_policy;
pub mod withdraw;

#[allow(ambiguous_glob_reexports)]
pub use cancel_order::*;
#[allow(ambiguous_glob_reexports)]
pub use claim_task::*;
#[allow(ambiguous_glob_reexports)]
pub use contribute::*;
#[allow(ambiguous_glob_reexports)]
pub use contribute_and_finalize::*;
#[allow(ambiguous_glob_reexports)]
pub use create_category::*;
#[allow(ambiguous_glob_reexports)]
pub use deposit::*;
#[allow(ambiguous_glob_reexports)]
pub use finalize_task::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize_and_claim::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize_protocol::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize_task::*;
#[allow(ambiguous_glob_reexports)]
pub use match_orders::*;
#[allow(ambiguous_glob_reexports)]
pub use presign_order::*;
#[allow(ambiguous_glob_reexports)]
pub use register_asset::*;
#[allow(ambiguous_glob_reexports)]
pub use reveal::*;
#[allow(ambiguous_glob_reexports)]
pub use update_protocol_params::*;
#[allow(ambiguous_glob_reexports)]
pub use update_workerpool_policy::*;
#[allow(ambiguous_glob_reexports)]
pub use withdraw::*;
