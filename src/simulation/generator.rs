//! Random payout workloads for testing and benchmarks.

use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::simulation::scenario::{DistributorSpec, PayoutLine, Scenario, Step, TokenSpec};
use crate::settlement::distributor::BatchPayoutJob;
use crate::token::TransferPolicy;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Shape of a generated payout batch.
#[derive(Debug, Clone)]
pub struct PayoutConfig {
    /// Number of recipients.
    pub recipients: usize,
    pub asset: AssetId,
    /// Smallest payout, in whole units.
    pub min_amount: Decimal,
    /// Largest payout, in whole units.
    pub max_amount: Decimal,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            recipients: 10,
            asset: AssetId::Native,
            min_amount: Decimal::ONE,
            max_amount: Decimal::from(1_000),
        }
    }
}

/// Random payout lines in whole units, rounded to cents.
pub fn generate_payout_lines(config: &PayoutConfig) -> Vec<PayoutLine> {
    let mut rng = rand::thread_rng();
    let to_cents = |d: Decimal| (d * Decimal::from(100)).trunc().to_i64().unwrap_or(1).max(1);
    let min_cents = to_cents(config.min_amount);
    let max_cents = to_cents(config.max_amount).max(min_cents);

    (0..config.recipients)
        .map(|i| PayoutLine {
            recipient: AccountId::new(format!("RECIPIENT-{:04}", i)),
            amount: Decimal::new(rng.gen_range(min_cents..=max_cents), 2),
        })
        .collect()
}

/// A payout job in minimal units, for driving a distributor directly.
pub fn generate_payout_job(config: &PayoutConfig) -> BatchPayoutJob {
    let mut rng = rand::thread_rng();
    let mut job = BatchPayoutJob::new(config.asset.clone());
    for i in 0..config.recipients {
        job.add(
            AccountId::new(format!("RECIPIENT-{:04}", i)),
            rng.gen_range(1..=1_000_000u128),
        );
    }
    job
}

/// A complete scenario: a funded distributor paying out one random batch.
///
/// The reserve holds exactly the batch total, so the single step succeeds.
pub fn generate_payout_scenario(config: &PayoutConfig) -> Scenario {
    let admin = AccountId::new("admin");
    let operator = AccountId::new("ops");
    let distributor = AccountId::new("payroll");

    let payouts = generate_payout_lines(config);
    let total: Decimal = payouts.iter().map(|p| p.amount).sum();

    let mut tokens = Vec::new();
    if let AssetId::Token(address) = &config.asset {
        tokens.push(TokenSpec {
            address: address.clone(),
            policy: TransferPolicy::Free,
            admin: admin.clone(),
            minters: Vec::new(),
            balances: BTreeMap::new(),
        });
    }

    let mut reserve = BTreeMap::new();
    reserve.insert(config.asset.clone(), total);

    Scenario {
        tokens,
        distributors: vec![DistributorSpec {
            address: distributor.clone(),
            admin,
            distributors: vec![operator.clone()],
            reserve,
        }],
        steps: vec![Step::Distribute {
            caller: operator,
            distributor,
            asset: config.asset.clone(),
            payouts,
        }],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_within_bounds() {
        let config = PayoutConfig {
            recipients: 50,
            min_amount: Decimal::from(5),
            max_amount: Decimal::from(10),
            ..Default::default()
        };
        let lines = generate_payout_lines(&config);
        assert_eq!(lines.len(), 50);
        for line in &lines {
            assert!(line.amount >= Decimal::from(5));
            assert!(line.amount <= Decimal::from(10));
        }
    }

    #[test]
    fn test_generated_scenario_settles() {
        let config = PayoutConfig {
            recipients: 20,
            asset: AssetId::token("USDC"),
            ..Default::default()
        };
        let (_, report) = generate_payout_scenario(&config).run().unwrap();
        assert_eq!(report.failed(), 0);
        assert_eq!(report.succeeded(), 1);
    }

    #[test]
    fn test_job_has_positive_amounts() {
        let job = generate_payout_job(&PayoutConfig::default());
        assert_eq!(job.len(), 10);
        assert!(job.amounts().iter().all(|&a| a > 0));
    }
}
