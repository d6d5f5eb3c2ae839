use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::units::Amount;
use crate::runtime::roles::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every reason a settlement call can be voided.
///
/// Each variant names the exact precondition that was violated; a failed
/// call never leaves a partial mutation behind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("amount must be strictly positive")]
    ZeroAmount,

    #[error("recipient must not be the null account")]
    ZeroAddressRecipient,

    #[error("payout batch has no recipients")]
    EmptyBatch,

    #[error("{recipients} recipients but {amounts} amounts")]
    LengthMismatch { recipients: usize, amounts: usize },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("reserve holds {available} of {asset}, batch needs {required}")]
    InsufficientFunds {
        asset: AssetId,
        available: Amount,
        required: Amount,
    },

    #[error("{account} holds {available} of {asset}, needs {required}")]
    InsufficientBalance {
        asset: AssetId,
        account: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("{spender} may spend {available} of {owner}'s {asset}, needs {required}")]
    InsufficientAllowance {
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("attached value {sent} does not match required {expected}")]
    IncorrectValueSent { expected: Amount, sent: Amount },

    #[error("{to} rejected native transfer: {reason}")]
    TransferFailure { to: AccountId, reason: String },

    #[error("{account} lacks role {role} on {scope}")]
    Unauthorized {
        scope: AccountId,
        role: Role,
        account: AccountId,
    },

    #[error("transfers of {token} between accounts are disabled")]
    TransfersDisabled { token: AccountId },

    #[error("reentrant call into {component}")]
    ReentrantCall { component: AccountId },

    #[error("price per token must be positive")]
    InvalidPrice,

    #[error("funds receiver must not be the null account")]
    InvalidReceiver,

    #[error("no token ledger at {0}")]
    UnknownToken(AccountId),

    #[error("no component deployed at {0}")]
    UnknownComponent(AccountId),

    #[error("address {0} is reserved")]
    ReservedAddress(AccountId),

    #[error("address {0} is already in use")]
    AlreadyDeployed(AccountId),
}

/// Result type for settlement operations.
pub type SettlementResult<T> = Result<T, SettlementError>;

/// Coarse failure taxonomy callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authorization,
    InsufficientFunds,
    TransferFailure,
    ArithmeticOverflow,
    PolicyViolation,
    Reentrancy,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::TransferFailure => "transfer_failure",
            ErrorKind::ArithmeticOverflow => "arithmetic_overflow",
            ErrorKind::PolicyViolation => "policy_violation",
            ErrorKind::Reentrancy => "reentrancy",
        };
        f.write_str(name)
    }
}

impl SettlementError {
    pub fn kind(&self) -> ErrorKind {
        use SettlementError::*;
        match self {
            ZeroAmount
            | ZeroAddressRecipient
            | EmptyBatch
            | LengthMismatch { .. }
            | IncorrectValueSent { .. }
            | InvalidPrice
            | InvalidReceiver
            | UnknownToken(_)
            | UnknownComponent(_)
            | ReservedAddress(_)
            | AlreadyDeployed(_) => ErrorKind::Validation,
            Unauthorized { .. } => ErrorKind::Authorization,
            InsufficientFunds { .. } | InsufficientBalance { .. } | InsufficientAllowance { .. } => {
                ErrorKind::InsufficientFunds
            }
            TransferFailure { .. } => ErrorKind::TransferFailure,
            ArithmeticOverflow => ErrorKind::ArithmeticOverflow,
            TransfersDisabled { .. } => ErrorKind::PolicyViolation,
            ReentrantCall { .. } => ErrorKind::Reentrancy,
        }
    }
}
