//! Batch payroll example.
//!
//! Demonstrates an all-or-nothing payout from a distributor reserve, and
//! what happens when the reserve comes up short or a recipient refuses.

use rust_decimal_macros::dec;
use settlement_engine::core::account::AccountId;
use settlement_engine::core::asset::AssetId;
use settlement_engine::core::units::{format_units, to_base_units};
use settlement_engine::runtime::env::{CallContext, Env};
use settlement_engine::runtime::hooks::RejectNative;
use settlement_engine::runtime::roles::Role;
use settlement_engine::settlement::distributor::{BatchPayoutDistributor, BatchPayoutJob};
use std::sync::Arc;

fn main() {
    println!("╔═══════════════════════════════════════════╗");
    println!("║  settlement-engine: Batch Payroll Example  ║");
    println!("╚═══════════════════════════════════════════╝\n");

    let mut env = Env::new();
    let admin = AccountId::new("HR-ADMIN");
    let ops = AccountId::new("PAYROLL-OPS");

    let payroll = BatchPayoutDistributor::deploy(&mut env, AccountId::new("PAYROLL"), &admin)
        .expect("deploy payroll");
    env.roles_mut()
        .grant_role(payroll.address(), &admin, Role::Distributor, &ops)
        .expect("grant distributor role");

    let mut job = BatchPayoutJob::new(AssetId::Native);
    job.add(AccountId::new("ALICE"), to_base_units(dec!(1200.50)).expect("amount"));
    job.add(AccountId::new("BOB"), to_base_units(dec!(980)).expect("amount"));
    job.add(AccountId::new("CAROL"), to_base_units(dec!(1430.25)).expect("amount"));
    let total = job.gross_total().expect("total");

    // --- Scenario 1: reserve short by a cent ---
    println!("━━━ Scenario 1: Underfunded Reserve ━━━\n");

    let short = total - to_base_units(dec!(0.01)).expect("amount");
    env.deposit_native(payroll.address(), short).expect("fund reserve");
    println!("Batch total:   {}", format_units(total));
    println!("Reserve:       {}", format_units(short));

    match payroll.distribute_job(&mut env, &CallContext::new(ops.clone()), &job) {
        Ok(receipt) => println!("Unexpected:    {}", receipt),
        Err(e) => println!("Rejected:      [{}] {}", e.kind(), e),
    }
    println!(
        "ALICE holds:   {}\n",
        format_units(env.native_balance(&AccountId::new("ALICE")))
    );

    // --- Scenario 2: one recipient refuses payment ---
    println!("━━━ Scenario 2: Refusing Recipient ━━━\n");

    env.deposit_native(payroll.address(), to_base_units(dec!(0.01)).expect("amount"))
        .expect("top up reserve");
    env.set_hook(AccountId::new("CAROL"), Arc::new(RejectNative));

    match payroll.distribute_job(&mut env, &CallContext::new(ops.clone()), &job) {
        Ok(receipt) => println!("Unexpected:    {}", receipt),
        Err(e) => println!("Rejected:      [{}] {}", e.kind(), e),
    }
    println!(
        "Reserve still: {}\n",
        format_units(
            payroll
                .held_balance(&env, &AssetId::Native)
                .expect("reserve")
        )
    );

    // --- Scenario 3: clean run ---
    println!("━━━ Scenario 3: Full Payout ━━━\n");

    env.clear_hook(&AccountId::new("CAROL"));
    let receipt = payroll
        .distribute_job(&mut env, &CallContext::new(ops), &job)
        .expect("payout");
    println!("Receipt:       {}", receipt);
    for payout in &job.payouts {
        println!(
            "  {:<8} {}",
            payout.recipient.to_string(),
            format_units(env.native_balance(&payout.recipient))
        );
    }
    println!(
        "Reserve left:  {}",
        format_units(
            payroll
                .held_balance(&env, &AssetId::Native)
                .expect("reserve")
        )
    );
}
