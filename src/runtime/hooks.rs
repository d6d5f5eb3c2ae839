use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::error::{SettlementError, SettlementResult};
use crate::core::units::Amount;
use crate::runtime::env::{CallContext, Env};
use crate::settlement::crowdsale::CrowdsaleSettlement;
use crate::settlement::distributor::BatchPayoutDistributor;
use crate::settlement::receipt::{DistributionReceipt, PurchaseReceipt};
use crate::token::Token;
use std::fmt;
use std::ops::Deref;

/// Code attached to an account, run whenever value lands in it.
///
/// Returning an error rejects the incoming value, which voids the entry
/// point that delivered it.
pub trait AccountHook: fmt::Debug + Send + Sync {
    fn on_native_received(
        &self,
        _env: &mut HookEnv<'_>,
        _from: &AccountId,
        _amount: Amount,
    ) -> SettlementResult<()> {
        Ok(())
    }

    fn on_token_received(
        &self,
        _env: &mut HookEnv<'_>,
        _token: &AccountId,
        _from: &AccountId,
        _amount: Amount,
    ) -> SettlementResult<()> {
        Ok(())
    }
}

/// The substrate as seen from inside a hook.
///
/// Reads go through `Deref<Target = Env>`. Every call back into the engine
/// runs as the hooked account, so a hook can only spend what that account
/// owns or is entitled to.
pub struct HookEnv<'a> {
    env: &'a mut Env,
    account: AccountId,
}

impl<'a> HookEnv<'a> {
    pub(crate) fn new(env: &'a mut Env, account: AccountId) -> Self {
        Self { env, account }
    }

    /// The account whose hook is running.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    fn ctx(&self) -> CallContext {
        CallContext::new(self.account.clone())
    }

    pub fn send_native(&mut self, to: &AccountId, amount: Amount) -> SettlementResult<()> {
        let ctx = self.ctx().with_value(amount);
        self.env.send_native(&ctx, to)
    }

    pub fn transfer_token(
        &mut self,
        token: &Token,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        let ctx = self.ctx();
        token.transfer(self.env, &ctx, to, amount)
    }

    pub fn distribute(
        &mut self,
        distributor: &BatchPayoutDistributor,
        asset: &AssetId,
        recipients: &[AccountId],
        amounts: &[Amount],
    ) -> SettlementResult<DistributionReceipt> {
        let ctx = self.ctx();
        distributor.distribute(self.env, &ctx, asset, recipients, amounts)
    }

    /// Buy with `value` of native value attached.
    pub fn buy_tokens(
        &mut self,
        sale: &CrowdsaleSettlement,
        amount: Amount,
        value: Amount,
    ) -> SettlementResult<PurchaseReceipt> {
        let ctx = self.ctx().with_value(value);
        sale.buy_tokens(self.env, &ctx, amount)
    }
}

impl Deref for HookEnv<'_> {
    type Target = Env;

    fn deref(&self) -> &Env {
        self.env
    }
}

/// Refuses every native payment; tokens are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectNative;

impl AccountHook for RejectNative {
    fn on_native_received(
        &self,
        env: &mut HookEnv<'_>,
        _from: &AccountId,
        _amount: Amount,
    ) -> SettlementResult<()> {
        Err(SettlementError::TransferFailure {
            to: env.account().clone(),
            reason: "account does not accept native value".to_string(),
        })
    }
}
