//! One transfer of either asset kind.
//!
//! Callers state where the value comes from: the engine's own reserve
//! (`push_from_reserve`) or an external caller who pays into the call
//! (`pull_from_caller`). Both debit an arbitrary `from`, so only the
//! engine's own entry points reach them, from inside their checkpoint.

use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::error::{SettlementError, SettlementResult};
use crate::core::units::Amount;
use crate::runtime::env::Env;
use log::debug;

/// A single movement of value, consumed by the call that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub asset: AssetId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

impl TransferRequest {
    pub fn new(asset: AssetId, from: AccountId, to: AccountId, amount: Amount) -> Self {
        Self {
            asset,
            from,
            to,
            amount,
        }
    }

    fn validate(&self) -> SettlementResult<()> {
        if self.amount == 0 {
            return Err(SettlementError::ZeroAmount);
        }
        if self.to.is_null() {
            return Err(SettlementError::ZeroAddressRecipient);
        }
        Ok(())
    }
}

/// Where the value of a [`TransferRequest`] comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOrigin {
    /// `from` is the engine's own reserve.
    Reserve,
    /// `from` is the external caller paying `engine`.
    Caller {
        /// Spender of token allowances.
        engine: AccountId,
        /// Native value attached to the call.
        attached: Amount,
    },
}

pub(crate) struct CurrencyTransfer;

impl CurrencyTransfer {
    /// Dispatch on the origin of the funds.
    pub(crate) fn transfer(
        env: &mut Env,
        request: &TransferRequest,
        origin: &TransferOrigin,
    ) -> SettlementResult<()> {
        match origin {
            TransferOrigin::Reserve => Self::push_from_reserve(env, request),
            TransferOrigin::Caller { engine, attached } => {
                Self::pull_from_caller(env, request, engine, *attached)
            }
        }
    }

    /// Pay out of the engine's own holdings.
    pub(crate) fn push_from_reserve(env: &mut Env, request: &TransferRequest) -> SettlementResult<()> {
        request.validate()?;
        debug!(
            "push {} {} from reserve {} to {}",
            request.amount, request.asset, request.from, request.to
        );
        match &request.asset {
            AssetId::Native => env.push_native(&request.from, &request.to, request.amount),
            AssetId::Token(token) => {
                env.move_tokens(token, &request.from, &request.to, request.amount)
            }
        }
    }

    /// Collect a payment from the caller on behalf of `engine`.
    ///
    /// Native payments must arrive as exactly `amount` of attached value.
    /// Token payments draw on the allowance the caller granted `engine`
    /// and carry no attached value.
    pub(crate) fn pull_from_caller(
        env: &mut Env,
        request: &TransferRequest,
        engine: &AccountId,
        attached: Amount,
    ) -> SettlementResult<()> {
        request.validate()?;
        debug!(
            "pull {} {} from {} to {} for {}",
            request.amount, request.asset, request.from, request.to, engine
        );
        match &request.asset {
            AssetId::Native => {
                if attached != request.amount {
                    return Err(SettlementError::IncorrectValueSent {
                        expected: request.amount,
                        sent: attached,
                    });
                }
                env.push_native(&request.from, &request.to, request.amount)
            }
            AssetId::Token(token) => {
                if attached != 0 {
                    return Err(SettlementError::IncorrectValueSent {
                        expected: 0,
                        sent: attached,
                    });
                }
                let ledger = env.token(token)?;
                ledger.check_movement(&request.from, &request.to)?;

                let allowed = ledger.allowance(&request.from, engine);
                if allowed < request.amount {
                    return Err(SettlementError::InsufficientAllowance {
                        asset: request.asset.clone(),
                        owner: request.from.clone(),
                        spender: engine.clone(),
                        available: allowed,
                        required: request.amount,
                    });
                }
                let balance = ledger.balance_of(&request.from);
                if balance < request.amount {
                    return Err(SettlementError::InsufficientBalance {
                        asset: request.asset.clone(),
                        account: request.from.clone(),
                        available: balance,
                        required: request.amount,
                    });
                }
                env.move_tokens_from(token, engine, &request.from, &request.to, request.amount)
            }
        }
    }
}
