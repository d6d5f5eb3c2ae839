//! Fungible token ledgers.
//!
//! A [`Token`] is a handle to a ledger living in the substrate. With
//! [`TransferPolicy::NonTransferable`] it is the mint/burn-only ledger token
//! sold by crowdsales and paid out by distributors; with
//! [`TransferPolicy::Free`] it is an ordinary payment token.

pub mod ledger;

use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::error::{SettlementError, SettlementResult};
use crate::core::units::Amount;
use crate::runtime::env::{CallContext, Env};
use crate::runtime::roles::Role;
use log::info;

pub use ledger::{TokenLedger, TransferPolicy};

/// Handle to a token ledger deployed in an [`Env`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    address: AccountId,
}

impl Token {
    /// Deploy an empty ledger at `address` administered by `admin`.
    pub fn deploy(
        env: &mut Env,
        address: AccountId,
        policy: TransferPolicy,
        admin: &AccountId,
    ) -> SettlementResult<Self> {
        env.deploy_token(&address, policy)?;
        env.roles_mut().bootstrap_admin(&address, admin);
        info!("deployed {:?} token {} (admin {})", policy, address, admin);
        Ok(Self { address })
    }

    /// Handle to an existing ledger.
    pub fn at(env: &Env, address: AccountId) -> SettlementResult<Self> {
        env.token(&address)?;
        Ok(Self { address })
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn asset(&self) -> AssetId {
        AssetId::Token(self.address.clone())
    }

    pub fn balance_of(&self, env: &Env, account: &AccountId) -> SettlementResult<Amount> {
        Ok(env.token(&self.address)?.balance_of(account))
    }

    pub fn total_supply(&self, env: &Env) -> SettlementResult<Amount> {
        Ok(env.token(&self.address)?.total_supply())
    }

    pub fn allowance(
        &self,
        env: &Env,
        owner: &AccountId,
        spender: &AccountId,
    ) -> SettlementResult<Amount> {
        Ok(env.token(&self.address)?.allowance(owner, spender))
    }

    /// Create `amount` new tokens for `to`. Requires `Minter` on this token.
    pub fn mint(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        ctx.require_no_value()?;
        env.roles()
            .require_role(&self.address, Role::Minter, &ctx.caller)?;
        if amount == 0 {
            return Err(SettlementError::ZeroAmount);
        }
        if to.is_null() {
            return Err(SettlementError::ZeroAddressRecipient);
        }
        env.transact(|env| env.move_tokens(&self.address, &AccountId::NULL, to, amount))?;
        info!("{} minted {} {} to {}", ctx.caller, amount, self.address, to);
        Ok(())
    }

    /// Destroy `amount` of the caller's own tokens.
    pub fn burn(&self, env: &mut Env, ctx: &CallContext, amount: Amount) -> SettlementResult<()> {
        ctx.require_no_value()?;
        let holder = real_account(&ctx.caller)?;
        if amount == 0 {
            return Err(SettlementError::ZeroAmount);
        }
        env.transact(|env| env.move_tokens(&self.address, holder, &AccountId::NULL, amount))?;
        info!("{} burned {} {}", holder, amount, self.address);
        Ok(())
    }

    pub fn transfer(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        ctx.require_no_value()?;
        let from = real_account(&ctx.caller)?;
        check_movement_args(to, amount)?;
        env.transact(|env| env.move_tokens(&self.address, from, to, amount))
    }

    pub fn approve(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        spender: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        ctx.require_no_value()?;
        let owner = real_account(&ctx.caller)?;
        if spender.is_null() {
            return Err(SettlementError::ZeroAddressRecipient);
        }
        env.token_mut(&self.address)?.approve(owner, spender, amount);
        Ok(())
    }

    /// Move `owner`'s tokens using the caller's allowance.
    pub fn transfer_from(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        ctx.require_no_value()?;
        let spender = real_account(&ctx.caller)?;
        real_account(owner)?;
        check_movement_args(to, amount)?;
        env.transact(|env| env.move_tokens_from(&self.address, spender, owner, to, amount))
    }
}

// The null account only appears as the implicit side of a mint or burn.
fn real_account(account: &AccountId) -> SettlementResult<&AccountId> {
    if account.is_null() {
        Err(SettlementError::ReservedAddress(AccountId::NULL))
    } else {
        Ok(account)
    }
}

fn check_movement_args(to: &AccountId, amount: Amount) -> SettlementResult<()> {
    if amount == 0 {
        return Err(SettlementError::ZeroAmount);
    }
    if to.is_null() {
        return Err(SettlementError::ZeroAddressRecipient);
    }
    Ok(())
}
