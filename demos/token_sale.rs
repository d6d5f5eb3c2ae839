//! Token sale example.
//!
//! Demonstrates buying a non-transferable ledger token with native value
//! and with a payment token, and the sale halting once its minting
//! authority is revoked.

use rust_decimal_macros::dec;
use settlement_engine::core::account::AccountId;
use settlement_engine::core::asset::AssetId;
use settlement_engine::core::units::{format_units, to_base_units};
use settlement_engine::runtime::env::{CallContext, Env};
use settlement_engine::runtime::roles::Role;
use settlement_engine::settlement::crowdsale::{CrowdsaleConfig, CrowdsaleSettlement};
use settlement_engine::token::{Token, TransferPolicy};

fn main() {
    println!("╔═════════════════════════════════════════╗");
    println!("║  settlement-engine: Token Sale Example  ║");
    println!("╚═════════════════════════════════════════╝\n");

    let mut env = Env::new();
    let admin = AccountId::new("DAO-ADMIN");
    let alice = AccountId::new("ALICE");

    let gov = Token::deploy(&mut env, AccountId::new("GOV"), TransferPolicy::NonTransferable, &admin)
        .expect("deploy GOV");
    let usdc = Token::deploy(&mut env, AccountId::new("USDC"), TransferPolicy::Free, &admin)
        .expect("deploy USDC");
    env.roles_mut()
        .grant_role(usdc.address(), &admin, Role::Minter, &admin)
        .expect("grant USDC minter");
    usdc.mint(
        &mut env,
        &CallContext::new(admin.clone()),
        &alice,
        to_base_units(dec!(500)).expect("amount"),
    )
    .expect("mint USDC");
    env.deposit_native(&alice, to_base_units(dec!(50)).expect("amount"))
        .expect("fund alice");

    let sale = CrowdsaleSettlement::deploy(
        &mut env,
        AccountId::new("SALE"),
        &admin,
        CrowdsaleConfig {
            token: gov.address().clone(),
            accepted_asset: AssetId::Native,
            price_per_token: to_base_units(dec!(0.25)).expect("price"),
            funds_receiver: AccountId::new("TREASURY"),
        },
    )
    .expect("deploy sale");
    env.roles_mut()
        .grant_role(gov.address(), &admin, Role::Minter, sale.address())
        .expect("grant GOV minter");

    // --- Scenario 1: pay with native value ---
    println!("━━━ Scenario 1: Native Payment ━━━\n");

    let amount = to_base_units(dec!(40)).expect("amount");
    let cost = sale.quote(&env, amount).expect("quote");
    let receipt = sale
        .buy_tokens(&mut env, &CallContext::new(alice.clone()).with_value(cost), amount)
        .expect("native purchase");
    println!("Receipt:          {}", receipt);
    println!("Treasury native:  {}\n", format_units(env.native_balance(&AccountId::new("TREASURY"))));

    // --- Scenario 2: switch to USDC ---
    println!("━━━ Scenario 2: Token Payment ━━━\n");

    let admin_ctx = CallContext::new(admin.clone());
    sale.set_accepted_currency(&mut env, &admin_ctx, usdc.asset())
        .expect("accept USDC");
    sale.set_price_per_token(&mut env, &admin_ctx, to_base_units(dec!(2)).expect("price"))
        .expect("reprice");

    let amount = to_base_units(dec!(100)).expect("amount");
    let cost = sale.quote(&env, amount).expect("quote");
    usdc.approve(&mut env, &CallContext::new(alice.clone()), sale.address(), cost)
        .expect("approve");
    let receipt = sale
        .buy_tokens(&mut env, &CallContext::new(alice.clone()), amount)
        .expect("token purchase");
    println!("Receipt:          {}", receipt);
    println!(
        "Treasury USDC:    {}",
        format_units(usdc.balance_of(&env, &AccountId::new("TREASURY")).expect("balance"))
    );
    println!(
        "ALICE GOV:        {}\n",
        format_units(gov.balance_of(&env, &alice).expect("balance"))
    );

    // --- Scenario 3: GOV stays put ---
    println!("━━━ Scenario 3: Non-Transferable Ledger ━━━\n");

    if let Err(e) = gov.transfer(&mut env, &CallContext::new(alice.clone()), &AccountId::new("BOB"), 1) {
        println!("Transfer refused: [{}] {}\n", e.kind(), e);
    }

    // --- Scenario 4: minting authority revoked ---
    println!("━━━ Scenario 4: Sale Halted ━━━\n");

    env.roles_mut()
        .revoke_role(gov.address(), &admin, Role::Minter, sale.address())
        .expect("revoke minter");
    usdc.approve(&mut env, &CallContext::new(alice.clone()), sale.address(), cost)
        .expect("approve");
    match sale.buy_tokens(&mut env, &CallContext::new(alice.clone()), amount) {
        Ok(receipt) => println!("Unexpected:       {}", receipt),
        Err(e) => println!("Purchase refused: [{}] {}", e.kind(), e),
    }
    println!(
        "ALICE USDC:       {}",
        format_units(usdc.balance_of(&env, &alice).expect("balance"))
    );
    println!(
        "GOV supply:       {}",
        format_units(gov.total_supply(&env).expect("supply"))
    );
}
