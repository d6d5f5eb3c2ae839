//! # settlement-engine
//!
//! Atomic settlement of batch payouts and token purchases over two asset
//! kinds: a native base value and fungible token ledgers.
//!
//! Every entry point is role-gated, guarded against reentrant callbacks,
//! and all-or-nothing: a failing call leaves no trace in balances, roles,
//! configuration or the event log.
//!
//! ## Architecture
//!
//! - **core**: foundational types for accounts, assets, units, errors
//! - **runtime**: in-memory substrate with balances, roles, hooks, reentrancy guard
//! - **token**: fungible ledgers, including the mint/burn-only ledger token
//! - **settlement**: currency transfers, batch payouts, crowdsale purchases
//! - **simulation**: JSON scenarios and random payout workloads

pub mod core;
pub mod runtime;
pub mod settlement;
pub mod simulation;
pub mod token;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::account::AccountId;
    pub use crate::core::asset::AssetId;
    pub use crate::core::error::{ErrorKind, SettlementError, SettlementResult};
    pub use crate::core::units::{Amount, TOKEN_SCALE};
    pub use crate::runtime::env::{CallContext, Env};
    pub use crate::runtime::hooks::{AccountHook, HookEnv};
    pub use crate::runtime::roles::Role;
    pub use crate::settlement::crowdsale::{CrowdsaleConfig, CrowdsaleSettlement};
    pub use crate::settlement::distributor::{BatchPayoutDistributor, BatchPayoutJob};
    pub use crate::settlement::receipt::{DistributionReceipt, PurchaseReceipt, SettlementEvent};
    pub use crate::settlement::transfer::{TransferOrigin, TransferRequest};
    pub use crate::token::{Token, TransferPolicy};
}
