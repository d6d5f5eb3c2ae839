use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use settlement_engine::core::account::AccountId;
use settlement_engine::core::asset::AssetId;
use settlement_engine::runtime::env::{CallContext, Env};
use settlement_engine::runtime::roles::Role;
use settlement_engine::settlement::distributor::{BatchPayoutDistributor, BatchPayoutJob};
use settlement_engine::simulation::generator::{generate_payout_job, PayoutConfig};

fn funded(job: &BatchPayoutJob) -> (Env, BatchPayoutDistributor) {
    let mut env = Env::new();
    let admin = AccountId::new("admin");
    let distributor = BatchPayoutDistributor::deploy(&mut env, AccountId::new("payroll"), &admin)
        .expect("deploy distributor");
    env.roles_mut()
        .grant_role(distributor.address(), &admin, Role::Distributor, &AccountId::new("ops"))
        .expect("grant distributor");
    let total = job.gross_total().expect("job total");
    env.deposit_native(distributor.address(), total)
        .expect("fund reserve");
    (env, distributor)
}

fn bench_distribute(c: &mut Criterion, recipients: usize) {
    let config = PayoutConfig {
        recipients,
        asset: AssetId::Native,
        ..Default::default()
    };
    let job = generate_payout_job(&config);
    let ctx = CallContext::new("ops");

    c.bench_function(&format!("distribute_{}_recipients", recipients), |b| {
        b.iter_batched(
            || funded(&job),
            |(mut env, distributor)| distributor.distribute_job(&mut env, &ctx, black_box(&job)),
            BatchSize::SmallInput,
        )
    });
}

fn bench_distribute_10_recipients(c: &mut Criterion) {
    bench_distribute(c, 10);
}

fn bench_distribute_100_recipients(c: &mut Criterion) {
    bench_distribute(c, 100);
}

fn bench_distribute_1000_recipients(c: &mut Criterion) {
    bench_distribute(c, 1000);
}

criterion_group!(
    benches,
    bench_distribute_10_recipients,
    bench_distribute_100_recipients,
    bench_distribute_1000_recipients
);
criterion_main!(benches);
