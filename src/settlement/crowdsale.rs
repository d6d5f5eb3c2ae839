use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::error::{SettlementError, SettlementResult};
use crate::core::units::{Amount, TOKEN_SCALE};
use crate::runtime::env::{CallContext, Env};
use crate::runtime::guard::ReentrancyGuard;
use crate::runtime::roles::Role;
use crate::settlement::receipt::{PurchaseReceipt, SettlementEvent};
use crate::settlement::transfer::{CurrencyTransfer, TransferOrigin, TransferRequest};
use crate::token::Token;
use log::info;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Persistent settings of a crowdsale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsaleConfig {
    /// Ledger token minted to buyers.
    pub token: AccountId,
    /// Asset buyers pay in.
    pub accepted_asset: AssetId,
    /// Cost of one whole token, in minimal units of the accepted asset.
    pub price_per_token: Amount,
    /// Account every payment is forwarded to.
    pub funds_receiver: AccountId,
}

impl CrowdsaleConfig {
    fn validate(&self, env: &Env) -> SettlementResult<()> {
        if self.price_per_token == 0 {
            return Err(SettlementError::InvalidPrice);
        }
        if self.funds_receiver.is_null() {
            return Err(SettlementError::InvalidReceiver);
        }
        env.token(&self.token)?;
        if let AssetId::Token(payment) = &self.accepted_asset {
            env.token(payment)?;
        }
        Ok(())
    }
}

/// Payment owed for `amount` minimal token units at `price_per_token`.
///
/// Truncates toward zero: a buyer forfeits any fraction of a minimal
/// payment unit.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::units::TOKEN_SCALE;
/// use settlement_engine::settlement::crowdsale::purchase_cost;
///
/// // 10 tokens at half a unit each
/// assert_eq!(
///     purchase_cost(10 * TOKEN_SCALE, TOKEN_SCALE / 2).unwrap(),
///     5 * TOKEN_SCALE
/// );
/// assert_eq!(purchase_cost(1, 1).unwrap(), 0);
///
/// // Large purchases widen before scaling back down
/// assert_eq!(
///     purchase_cost(1_000_000 * TOKEN_SCALE, 10 * TOKEN_SCALE).unwrap(),
///     10_000_000 * TOKEN_SCALE
/// );
/// ```
pub fn purchase_cost(amount: Amount, price_per_token: Amount) -> SettlementResult<Amount> {
    // u128 * u128 always fits in 256 bits.
    let gross = U256::from(amount) * U256::from(price_per_token);
    let cost = gross / U256::from(TOKEN_SCALE);
    if cost.bits() > 128 {
        return Err(SettlementError::ArithmeticOverflow);
    }
    Ok(cost.low_u128())
}

/// Sells freshly minted ledger tokens for a configurable payment asset.
///
/// The crowdsale must hold `Minter` on its token; if that role is revoked,
/// every purchase fails without moving the buyer's payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrowdsaleSettlement {
    address: AccountId,
}

impl CrowdsaleSettlement {
    /// Deploy a crowdsale at `address` administered by `admin`.
    ///
    /// Granting the crowdsale `Minter` on the token is left to the token's
    /// admin.
    pub fn deploy(
        env: &mut Env,
        address: AccountId,
        admin: &AccountId,
        config: CrowdsaleConfig,
    ) -> SettlementResult<Self> {
        config.validate(env)?;
        env.claim_address(&address)?;
        info!(
            "deployed crowdsale {} selling {} for {} (admin {})",
            address, config.token, config.accepted_asset, admin
        );
        env.store_crowdsale(&address, config);
        env.roles_mut().bootstrap_admin(&address, admin);
        Ok(Self { address })
    }

    /// Handle to an existing crowdsale.
    pub fn at(env: &Env, address: AccountId) -> SettlementResult<Self> {
        env.crowdsale_config(&address)?;
        Ok(Self { address })
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn config(&self, env: &Env) -> SettlementResult<CrowdsaleConfig> {
        env.crowdsale_config(&self.address).cloned()
    }

    /// Payment currently required for `amount` tokens.
    pub fn quote(&self, env: &Env, amount: Amount) -> SettlementResult<Amount> {
        let config = env.crowdsale_config(&self.address)?;
        purchase_cost(amount, config.price_per_token)
    }

    /// Buy `amount` minimal units of the ledger token.
    ///
    /// Native payments must be attached to the call as exactly the quoted
    /// cost; token payments are drawn from the allowance the buyer gave
    /// this crowdsale.
    pub fn buy_tokens(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        amount: Amount,
    ) -> SettlementResult<PurchaseReceipt> {
        let mut env = ReentrancyGuard::enter(env, &self.address)?;
        if amount == 0 {
            return Err(SettlementError::ZeroAmount);
        }
        if ctx.caller.is_null() {
            return Err(SettlementError::ReservedAddress(AccountId::NULL));
        }

        let config = env.crowdsale_config(&self.address)?.clone();
        let cost = purchase_cost(amount, config.price_per_token)?;

        env.transact(|env| {
            let payment = TransferRequest::new(
                config.accepted_asset.clone(),
                ctx.caller.clone(),
                config.funds_receiver.clone(),
                cost,
            );
            let origin = TransferOrigin::Caller {
                engine: self.address.clone(),
                attached: ctx.value,
            };
            CurrencyTransfer::transfer(env, &payment, &origin)?;

            let token = Token::at(env, config.token.clone())?;
            token.mint(env, &CallContext::new(self.address.clone()), &ctx.caller, amount)?;

            let receipt = PurchaseReceipt::new(
                self.address.clone(),
                ctx.caller.clone(),
                cost,
                config.accepted_asset.clone(),
                amount,
            );
            env.emit(SettlementEvent::Purchased(receipt.clone()));
            info!("{}", receipt);
            Ok(receipt)
        })
    }

    pub fn set_accepted_currency(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        asset: AssetId,
    ) -> SettlementResult<()> {
        self.require_admin(env, ctx)?;
        if let AssetId::Token(token) = &asset {
            env.token(token)?;
        }
        info!("{} accepts {} from now on", self.address, asset);
        env.crowdsale_config_mut(&self.address)?.accepted_asset = asset;
        Ok(())
    }

    pub fn set_price_per_token(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        price_per_token: Amount,
    ) -> SettlementResult<()> {
        self.require_admin(env, ctx)?;
        if price_per_token == 0 {
            return Err(SettlementError::InvalidPrice);
        }
        info!("{} price per token set to {}", self.address, price_per_token);
        env.crowdsale_config_mut(&self.address)?.price_per_token = price_per_token;
        Ok(())
    }

    pub fn set_funds_receiver(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        receiver: AccountId,
    ) -> SettlementResult<()> {
        self.require_admin(env, ctx)?;
        if receiver.is_null() {
            return Err(SettlementError::InvalidReceiver);
        }
        info!("{} forwards funds to {}", self.address, receiver);
        env.crowdsale_config_mut(&self.address)?.funds_receiver = receiver;
        Ok(())
    }

    fn require_admin(&self, env: &Env, ctx: &CallContext) -> SettlementResult<()> {
        env.roles()
            .require_role(&self.address, Role::Admin, &ctx.caller)?;
        ctx.require_no_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TransferPolicy;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s)
    }

    fn setup(price: Amount) -> (Env, Token, CrowdsaleSettlement) {
        let mut env = Env::new();
        let admin = acct("admin");
        let token = Token::deploy(&mut env, acct("GOV"), TransferPolicy::NonTransferable, &admin).unwrap();
        let sale = CrowdsaleSettlement::deploy(
            &mut env,
            acct("sale"),
            &admin,
            CrowdsaleConfig {
                token: token.address().clone(),
                accepted_asset: AssetId::Native,
                price_per_token: price,
                funds_receiver: acct("treasury"),
            },
        )
        .unwrap();
        env.roles_mut()
            .grant_role(token.address(), &admin, Role::Minter, sale.address())
            .unwrap();
        env.deposit_native(&acct("alice"), 100 * TOKEN_SCALE).unwrap();
        (env, token, sale)
    }

    #[test]
    fn test_buy_with_native() {
        let (mut env, token, sale) = setup(TOKEN_SCALE / 2);
        let ctx = CallContext::new("alice").with_value(5 * TOKEN_SCALE);
        let receipt = sale.buy_tokens(&mut env, &ctx, 10 * TOKEN_SCALE).unwrap();
        assert_eq!(receipt.cost, 5 * TOKEN_SCALE);
        assert_eq!(token.balance_of(&env, &acct("alice")).unwrap(), 10 * TOKEN_SCALE);
        assert_eq!(env.native_balance(&acct("treasury")), 5 * TOKEN_SCALE);
        assert_eq!(env.native_balance(&acct("alice")), 95 * TOKEN_SCALE);
    }

    #[test]
    fn test_buy_zero() {
        let (mut env, _, sale) = setup(TOKEN_SCALE);
        assert_eq!(
            sale.buy_tokens(&mut env, &CallContext::new("alice"), 0),
            Err(SettlementError::ZeroAmount)
        );
    }

    #[test]
    fn test_wrong_value_moves_nothing() {
        let (mut env, token, sale) = setup(TOKEN_SCALE);
        let ctx = CallContext::new("alice").with_value(1);
        assert_eq!(
            sale.buy_tokens(&mut env, &ctx, TOKEN_SCALE),
            Err(SettlementError::IncorrectValueSent { expected: TOKEN_SCALE, sent: 1 })
        );
        assert_eq!(token.total_supply(&env).unwrap(), 0);
        assert_eq!(env.native_balance(&acct("treasury")), 0);
    }

    #[test]
    fn test_dust_purchase_rounds_to_zero_cost() {
        let (mut env, _, sale) = setup(TOKEN_SCALE / 2);
        assert_eq!(sale.quote(&env, 1).unwrap(), 0);
        assert_eq!(
            sale.buy_tokens(&mut env, &CallContext::new("alice"), 1),
            Err(SettlementError::ZeroAmount)
        );
    }

    #[test]
    fn test_admin_setters() {
        let (mut env, _, sale) = setup(TOKEN_SCALE);
        let admin = CallContext::new("admin");

        assert_eq!(sale.set_price_per_token(&mut env, &admin, 0), Err(SettlementError::InvalidPrice));
        assert_eq!(
            sale.set_funds_receiver(&mut env, &admin, AccountId::NULL),
            Err(SettlementError::InvalidReceiver)
        );
        assert!(matches!(
            sale.set_price_per_token(&mut env, &CallContext::new("alice"), 7),
            Err(SettlementError::Unauthorized { role: Role::Admin, .. })
        ));

        sale.set_price_per_token(&mut env, &admin, 2 * TOKEN_SCALE).unwrap();
        sale.set_funds_receiver(&mut env, &admin, acct("vault")).unwrap();
        let config = sale.config(&env).unwrap();
        assert_eq!(config.price_per_token, 2 * TOKEN_SCALE);
        assert_eq!(config.funds_receiver, acct("vault"));
    }

    #[test]
    fn test_accepted_currency_must_exist() {
        let (mut env, _, sale) = setup(TOKEN_SCALE);
        assert_eq!(
            sale.set_accepted_currency(&mut env, &CallContext::new("admin"), AssetId::token("NOPE")),
            Err(SettlementError::UnknownToken(acct("NOPE")))
        );
    }

    #[test]
    fn test_deploy_validates_config() {
        let mut env = Env::new();
        Token::deploy(&mut env, acct("GOV"), TransferPolicy::NonTransferable, &acct("admin")).unwrap();
        let config = CrowdsaleConfig {
            token: acct("GOV"),
            accepted_asset: AssetId::Native,
            price_per_token: 0,
            funds_receiver: acct("treasury"),
        };
        assert_eq!(
            CrowdsaleSettlement::deploy(&mut env, acct("sale"), &acct("admin"), config),
            Err(SettlementError::InvalidPrice)
        );
        assert!(!env.is_deployed(&acct("sale")));
    }

    #[test]
    fn test_cost_overflow() {
        assert_eq!(
            purchase_cost(Amount::MAX, Amount::MAX),
            Err(SettlementError::ArithmeticOverflow)
        );
        assert_eq!(purchase_cost(Amount::MAX, TOKEN_SCALE), Ok(Amount::MAX));
    }

    #[test]
    fn test_cost_of_large_purchases() {
        assert_eq!(purchase_cost(341 * TOKEN_SCALE, TOKEN_SCALE), Ok(341 * TOKEN_SCALE));
        assert_eq!(purchase_cost(35 * TOKEN_SCALE, 10 * TOKEN_SCALE), Ok(350 * TOKEN_SCALE));
        assert_eq!(
            purchase_cost(1_000_000_000 * TOKEN_SCALE, 1_000 * TOKEN_SCALE),
            Ok(1_000_000_000_000 * TOKEN_SCALE)
        );
        // Fractional price still truncates.
        assert_eq!(purchase_cost(3, TOKEN_SCALE / 2), Ok(1));
    }

    #[test]
    fn test_buy_large_amount_with_native() {
        let (mut env, token, sale) = setup(TOKEN_SCALE);
        env.deposit_native(&acct("alice"), 900 * TOKEN_SCALE).unwrap();
        let ctx = CallContext::new("alice").with_value(341 * TOKEN_SCALE);
        let receipt = sale.buy_tokens(&mut env, &ctx, 341 * TOKEN_SCALE).unwrap();
        assert_eq!(receipt.cost, 341 * TOKEN_SCALE);
        assert_eq!(token.balance_of(&env, &acct("alice")).unwrap(), 341 * TOKEN_SCALE);
        assert_eq!(env.native_balance(&acct("treasury")), 341 * TOKEN_SCALE);
        assert_eq!(env.native_balance(&acct("alice")), 659 * TOKEN_SCALE);
    }
}
