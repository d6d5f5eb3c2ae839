use primitive_types::U256;
use proptest::prelude::*;
use settlement_engine::core::account::AccountId;
use settlement_engine::core::asset::AssetId;
use settlement_engine::core::error::SettlementError;
use settlement_engine::core::units::{Amount, TOKEN_SCALE};
use settlement_engine::runtime::env::{CallContext, Env};
use settlement_engine::runtime::roles::Role;
use settlement_engine::settlement::crowdsale::{purchase_cost, CrowdsaleConfig, CrowdsaleSettlement};
use settlement_engine::settlement::distributor::BatchPayoutDistributor;
use settlement_engine::token::{Token, TransferPolicy};
use std::collections::HashMap;

/// Recipient drawn from a small pool so duplicates show up.
fn arb_recipient() -> impl Strategy<Value = AccountId> {
    prop::sample::select(vec![
        AccountId::new("A"),
        AccountId::new("B"),
        AccountId::new("C"),
        AccountId::new("D"),
        AccountId::new("E"),
    ])
}

/// Generate a payout amount (1 to 10^24 minimal units).
fn arb_amount() -> impl Strategy<Value = Amount> {
    1u128..1_000_000 * TOKEN_SCALE
}

/// Generate a batch of 1..30 payouts.
fn arb_batch() -> impl Strategy<Value = Vec<(AccountId, Amount)>> {
    prop::collection::vec((arb_recipient(), arb_amount()), 1..30)
}

fn split(batch: &[(AccountId, Amount)]) -> (Vec<AccountId>, Vec<Amount>) {
    batch.iter().cloned().unzip()
}

fn distributor_env(reserve: Amount) -> (Env, BatchPayoutDistributor) {
    let mut env = Env::new();
    let admin = AccountId::new("admin");
    let distributor = BatchPayoutDistributor::deploy(&mut env, AccountId::new("payroll"), &admin).unwrap();
    env.roles_mut()
        .grant_role(distributor.address(), &admin, Role::Distributor, &AccountId::new("ops"))
        .unwrap();
    env.deposit_native(distributor.address(), reserve).unwrap();
    (env, distributor)
}

fn gov_env() -> (Env, Token) {
    let mut env = Env::new();
    let admin = AccountId::new("admin");
    let token = Token::deploy(&mut env, AccountId::new("GOV"), TransferPolicy::NonTransferable, &admin).unwrap();
    env.roles_mut()
        .grant_role(token.address(), &admin, Role::Minter, &AccountId::new("minter"))
        .unwrap();
    (env, token)
}

/// Crowdsale selling GOV for native value at `price`, paying `treasury`.
fn native_sale(price: Amount) -> (Env, Token, CrowdsaleSettlement) {
    let (mut env, token) = gov_env();
    let admin = AccountId::new("admin");
    let sale = CrowdsaleSettlement::deploy(
        &mut env,
        AccountId::new("sale"),
        &admin,
        CrowdsaleConfig {
            token: token.address().clone(),
            accepted_asset: AssetId::Native,
            price_per_token: price,
            funds_receiver: AccountId::new("treasury"),
        },
    )
    .unwrap();
    env.roles_mut()
        .grant_role(token.address(), &admin, Role::Minter, sale.address())
        .unwrap();
    (env, token, sale)
}

proptest! {
    // ===================================================================
    // Batch total equals the sum of its amounts, and each recipient is
    // credited with the sum of its own lines.
    // ===================================================================
    #[test]
    fn batch_credits_each_recipient(batch in arb_batch(), slack in 0u128..1_000) {
        let total: Amount = batch.iter().map(|(_, a)| a).sum();
        let (mut env, distributor) = distributor_env(total + slack);
        let (recipients, amounts) = split(&batch);

        let receipt = distributor
            .distribute(&mut env, &CallContext::new("ops"), &AssetId::Native, &recipients, &amounts)
            .unwrap();
        prop_assert_eq!(receipt.total, total);
        prop_assert_eq!(receipt.count, batch.len());

        let mut expected: HashMap<AccountId, Amount> = HashMap::new();
        for (recipient, amount) in &batch {
            *expected.entry(recipient.clone()).or_default() += amount;
        }
        for (recipient, amount) in expected {
            prop_assert_eq!(env.native_balance(&recipient), amount);
        }
        prop_assert_eq!(env.native_balance(distributor.address()), slack);
    }

    // ===================================================================
    // A reserve short of the total, even by one unit, moves nothing.
    // ===================================================================
    #[test]
    fn short_reserve_moves_nothing(batch in arb_batch(), shortfall in 1u128..1_000) {
        let total: Amount = batch.iter().map(|(_, a)| a).sum();
        let reserve = total.saturating_sub(shortfall);
        let (mut env, distributor) = distributor_env(reserve);
        let (recipients, amounts) = split(&batch);

        let err = distributor
            .distribute(&mut env, &CallContext::new("ops"), &AssetId::Native, &recipients, &amounts)
            .unwrap_err();
        let is_insufficient = matches!(err, SettlementError::InsufficientFunds { .. });
        prop_assert!(is_insufficient);
        prop_assert_eq!(env.native_balance(distributor.address()), reserve);
        for recipient in &recipients {
            prop_assert_eq!(env.native_balance(recipient), 0);
        }
    }

    // ===================================================================
    // A zero amount or null recipient anywhere voids the whole batch.
    // ===================================================================
    #[test]
    fn bad_line_voids_batch(batch in arb_batch(), position in any::<prop::sample::Index>(), null_recipient in any::<bool>()) {
        let mut batch = batch;
        let i = position.index(batch.len());
        let expected = if null_recipient {
            batch[i].0 = AccountId::NULL;
            SettlementError::ZeroAddressRecipient
        } else {
            batch[i].1 = 0;
            SettlementError::ZeroAmount
        };
        let total: Amount = batch.iter().map(|(_, a)| a).sum();
        let (mut env, distributor) = distributor_env(total);
        let (recipients, amounts) = split(&batch);

        let result = distributor.distribute(&mut env, &CallContext::new("ops"), &AssetId::Native, &recipients, &amounts);
        prop_assert_eq!(result, Err(expected));
        prop_assert_eq!(env.native_balance(distributor.address()), total);
        prop_assert!(env.events().is_empty());
        prop_assert!(!env.is_entered(distributor.address()));
    }

    // ===================================================================
    // Recipient and amount lists of different lengths are rejected.
    // ===================================================================
    #[test]
    fn length_mismatch_rejected(batch in arb_batch(), extra in 1usize..5) {
        let (mut env, distributor) = distributor_env(Amount::MAX);
        let (recipients, mut amounts) = split(&batch);
        amounts.extend(std::iter::repeat(1).take(extra));

        let result = distributor.distribute(&mut env, &CallContext::new("ops"), &AssetId::Native, &recipients, &amounts);
        prop_assert_eq!(
            result,
            Err(SettlementError::LengthMismatch { recipients: recipients.len(), amounts: recipients.len() + extra })
        );
    }

    // ===================================================================
    // Minting raises both the holder's balance and the total supply.
    // ===================================================================
    #[test]
    fn mint_tracks_balance_and_supply(mints in prop::collection::vec((arb_recipient(), arb_amount()), 1..20)) {
        let (mut env, token) = gov_env();
        let minter = CallContext::new("minter");
        let mut expected: HashMap<AccountId, Amount> = HashMap::new();
        for (to, amount) in &mints {
            token.mint(&mut env, &minter, to, *amount).unwrap();
            *expected.entry(to.clone()).or_default() += amount;
        }
        let supply: Amount = mints.iter().map(|(_, a)| a).sum();
        prop_assert_eq!(token.total_supply(&env).unwrap(), supply);
        for (holder, amount) in expected {
            prop_assert_eq!(token.balance_of(&env, &holder).unwrap(), amount);
        }
    }

    // ===================================================================
    // The ledger token never moves between real accounts, whatever the
    // balance or allowance.
    // ===================================================================
    #[test]
    fn ledger_token_never_transfers(balance in arb_amount(), allowance in any::<u128>(), amount in 1u128..=1_000) {
        let (mut env, token) = gov_env();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        token.mint(&mut env, &CallContext::new("minter"), &alice, balance).unwrap();
        token.approve(&mut env, &CallContext::new("alice"), &bob, allowance).unwrap();

        let disabled = SettlementError::TransfersDisabled { token: token.address().clone() };
        prop_assert_eq!(
            token.transfer(&mut env, &CallContext::new("alice"), &bob, amount),
            Err(disabled.clone())
        );
        prop_assert_eq!(
            token.transfer_from(&mut env, &CallContext::new("bob"), &alice, &bob, amount),
            Err(disabled)
        );
        prop_assert_eq!(token.balance_of(&env, &alice).unwrap(), balance);
        prop_assert_eq!(token.allowance(&env, &alice, &bob).unwrap(), allowance);
    }

    // ===================================================================
    // Purchase cost is floor(amount * price / 10^18).
    // ===================================================================
    #[test]
    fn purchase_cost_is_floor(
        amount in 0u128..1_000_000_000_000 * TOKEN_SCALE,
        price in 1u128..1_000_000 * TOKEN_SCALE,
    ) {
        let cost = purchase_cost(amount, price).unwrap();
        let exact = U256::from(amount) * U256::from(price);
        let scale = U256::from(TOKEN_SCALE);
        prop_assert!(U256::from(cost) * scale <= exact);
        prop_assert!(exact < (U256::from(cost) + U256::one()) * scale);
    }

    // ===================================================================
    // Paying exactly the quote moves the cost from buyer to receiver and
    // mints exactly the amount bought.
    // ===================================================================
    #[test]
    fn exact_payment_purchase_settles(
        amount in 1u128..1_000_000_000 * TOKEN_SCALE,
        price in 1u128..1_000_000 * TOKEN_SCALE,
        slack in 0u128..1_000,
    ) {
        let cost = (U256::from(amount) * U256::from(price) / U256::from(TOKEN_SCALE)).low_u128();
        prop_assume!(cost > 0);
        let (mut env, token, sale) = native_sale(price);
        let alice = AccountId::new("alice");
        env.deposit_native(&alice, cost + slack).unwrap();
        prop_assert_eq!(sale.quote(&env, amount).unwrap(), cost);

        let ctx = CallContext::new("alice").with_value(cost);
        let receipt = sale.buy_tokens(&mut env, &ctx, amount).unwrap();

        prop_assert_eq!(receipt.cost, cost);
        prop_assert_eq!(receipt.amount, amount);
        prop_assert_eq!(env.native_balance(&alice), slack);
        prop_assert_eq!(env.native_balance(&AccountId::new("treasury")), cost);
        prop_assert_eq!(token.balance_of(&env, &alice).unwrap(), amount);
        prop_assert_eq!(token.total_supply(&env).unwrap(), amount);
    }

    // ===================================================================
    // Buying nothing always fails, at any price.
    // ===================================================================
    #[test]
    fn buying_zero_fails(price in 1u128..1_000 * TOKEN_SCALE, value in any::<u64>()) {
        let (mut env, token, sale) = native_sale(price);
        let ctx = CallContext::new("alice").with_value(u128::from(value));
        prop_assert_eq!(sale.buy_tokens(&mut env, &ctx, 0), Err(SettlementError::ZeroAmount));
        prop_assert_eq!(token.total_supply(&env).unwrap(), 0);
    }
}
