//! Declarative settlement scenarios.
//!
//! A scenario is a JSON document describing an opening state (accounts,
//! token ledgers, distributors, crowdsales) followed by an ordered list of
//! calls. Running it executes every call against a fresh [`Env`] and
//! records what each one did. Amounts are decimal strings in whole units.
//!
//! ```json
//! {
//!   "accounts": { "alice": "10" },
//!   "distributors": [
//!     { "address": "payroll", "admin": "admin", "distributors": ["ops"],
//!       "reserve": { "native": "3" } }
//!   ],
//!   "steps": [
//!     { "op": "distribute", "caller": "ops", "distributor": "payroll",
//!       "asset": "native",
//!       "payouts": [ { "recipient": "x", "amount": "1" },
//!                    { "recipient": "y", "amount": "2" } ] }
//!   ]
//! }
//! ```

use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::error::{ErrorKind, SettlementError};
use crate::core::units::{format_units, to_base_units, Amount, UnitsError};
use crate::runtime::env::{CallContext, Env};
use crate::runtime::hooks::RejectNative;
use crate::runtime::roles::Role;
use crate::settlement::crowdsale::{CrowdsaleConfig, CrowdsaleSettlement};
use crate::settlement::distributor::BatchPayoutDistributor;
use crate::settlement::receipt::SettlementEvent;
use crate::token::{Token, TransferPolicy};
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid amount: {0}")]
    Units(#[from] UnitsError),
    #[error("setting up {what}: {source}")]
    Setup {
        what: String,
        #[source]
        source: SettlementError,
    },
}

/// A token ledger present at the start of the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSpec {
    pub address: AccountId,
    #[serde(default)]
    pub policy: TransferPolicy,
    pub admin: AccountId,
    #[serde(default)]
    pub minters: Vec<AccountId>,
    /// Opening balances, minted at genesis.
    #[serde(default)]
    pub balances: BTreeMap<AccountId, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributorSpec {
    pub address: AccountId,
    pub admin: AccountId,
    #[serde(default)]
    pub distributors: Vec<AccountId>,
    /// Opening reserve per asset.
    #[serde(default)]
    pub reserve: BTreeMap<AssetId, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdsaleSpec {
    pub address: AccountId,
    pub admin: AccountId,
    pub token: AccountId,
    pub accepted_asset: AssetId,
    pub price_per_token: Decimal,
    pub funds_receiver: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutLine {
    pub recipient: AccountId,
    pub amount: Decimal,
}

/// One call made during the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Distribute {
        caller: AccountId,
        distributor: AccountId,
        asset: AssetId,
        payouts: Vec<PayoutLine>,
    },
    Buy {
        caller: AccountId,
        crowdsale: AccountId,
        amount: Decimal,
        /// Attached native value. Defaults to the exact quote when the
        /// crowdsale accepts native value, and to nothing otherwise.
        #[serde(default)]
        value: Option<Decimal>,
    },
    Mint {
        caller: AccountId,
        token: AccountId,
        to: AccountId,
        amount: Decimal,
    },
    Burn {
        caller: AccountId,
        token: AccountId,
        amount: Decimal,
    },
    Transfer {
        caller: AccountId,
        token: AccountId,
        to: AccountId,
        amount: Decimal,
    },
    Approve {
        caller: AccountId,
        token: AccountId,
        spender: AccountId,
        amount: Decimal,
    },
    GrantRole {
        caller: AccountId,
        scope: AccountId,
        role: Role,
        account: AccountId,
    },
    RevokeRole {
        caller: AccountId,
        scope: AccountId,
        role: Role,
        account: AccountId,
    },
    SetPrice {
        caller: AccountId,
        crowdsale: AccountId,
        price_per_token: Decimal,
    },
    SetAcceptedCurrency {
        caller: AccountId,
        crowdsale: AccountId,
        asset: AssetId,
    },
    SetFundsReceiver {
        caller: AccountId,
        crowdsale: AccountId,
        receiver: AccountId,
    },
    /// `from` sends its own native value to `to`.
    FundNative {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Distribute { .. } => "distribute",
            Step::Buy { .. } => "buy",
            Step::Mint { .. } => "mint",
            Step::Burn { .. } => "burn",
            Step::Transfer { .. } => "transfer",
            Step::Approve { .. } => "approve",
            Step::GrantRole { .. } => "grant_role",
            Step::RevokeRole { .. } => "revoke_role",
            Step::SetPrice { .. } => "set_price",
            Step::SetAcceptedCurrency { .. } => "set_accepted_currency",
            Step::SetFundsReceiver { .. } => "set_funds_receiver",
            Step::FundNative { .. } => "fund_native",
        }
    }
}

/// Opening state plus the calls to run against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Opening native balances.
    #[serde(default)]
    pub accounts: BTreeMap<AccountId, Decimal>,
    #[serde(default)]
    pub tokens: Vec<TokenSpec>,
    #[serde(default)]
    pub distributors: Vec<DistributorSpec>,
    #[serde(default)]
    pub crowdsales: Vec<CrowdsaleSpec>,
    /// Accounts whose hook refuses native value.
    #[serde(default)]
    pub rejects_native: Vec<AccountId>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// What a single step did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        event: Option<SettlementEvent>,
    },
    Failed {
        kind: ErrorKind,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: String,
    #[serde(flatten)]
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, StepStatus::Ok { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceLine {
    pub account: AccountId,
    pub asset: AssetId,
    pub balance: String,
}

/// Outcome of every step plus the closing balances.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub outcomes: Vec<StepOutcome>,
    pub balances: Vec<BalanceLine>,
}

impl ScenarioReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Steps ===")?;
        for outcome in &self.outcomes {
            match &outcome.status {
                StepStatus::Ok { event: Some(event) } => {
                    writeln!(f, "  #{:<3} {:<22} ok      {}", outcome.index, outcome.op, event)?
                }
                StepStatus::Ok { event: None } => {
                    writeln!(f, "  #{:<3} {:<22} ok", outcome.index, outcome.op)?
                }
                StepStatus::Failed { kind, error } => writeln!(
                    f,
                    "  #{:<3} {:<22} FAILED  [{}] {}",
                    outcome.index, outcome.op, kind, error
                )?,
            }
        }
        writeln!(
            f,
            "  {} succeeded, {} failed",
            self.succeeded(),
            self.failed()
        )?;
        writeln!(f)?;
        writeln!(f, "=== Closing balances ===")?;
        for line in &self.balances {
            writeln!(f, "  {:<20} {:<10} {}", line.account.to_string(), line.asset.to_string(), line.balance)?;
        }
        Ok(())
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build the opening state.
    pub fn build(&self) -> Result<Env, ScenarioError> {
        let mut env = Env::new();

        for (account, units) in &self.accounts {
            env.deposit_native(account, to_base_units(*units)?)
                .map_err(setup(format!("account {}", account)))?;
        }

        for spec in &self.tokens {
            let what = format!("token {}", spec.address);
            let token = Token::deploy(&mut env, spec.address.clone(), spec.policy, &spec.admin)
                .map_err(setup(&what))?;
            for minter in &spec.minters {
                env.roles_mut()
                    .grant_role(token.address(), &spec.admin, Role::Minter, minter)
                    .map_err(setup(&what))?;
            }
            for (holder, units) in &spec.balances {
                env.move_tokens(token.address(), &AccountId::NULL, holder, to_base_units(*units)?)
                    .map_err(setup(&what))?;
            }
        }

        for spec in &self.distributors {
            let what = format!("distributor {}", spec.address);
            let distributor = BatchPayoutDistributor::deploy(&mut env, spec.address.clone(), &spec.admin)
                .map_err(setup(&what))?;
            for account in &spec.distributors {
                env.roles_mut()
                    .grant_role(distributor.address(), &spec.admin, Role::Distributor, account)
                    .map_err(setup(&what))?;
            }
            for (asset, units) in &spec.reserve {
                let amount = to_base_units(*units)?;
                let funded = match asset {
                    AssetId::Native => env.deposit_native(distributor.address(), amount),
                    AssetId::Token(token) => {
                        env.move_tokens(token, &AccountId::NULL, distributor.address(), amount)
                    }
                };
                funded.map_err(setup(&what))?;
            }
        }

        for spec in &self.crowdsales {
            let config = CrowdsaleConfig {
                token: spec.token.clone(),
                accepted_asset: spec.accepted_asset.clone(),
                price_per_token: to_base_units(spec.price_per_token)?,
                funds_receiver: spec.funds_receiver.clone(),
            };
            CrowdsaleSettlement::deploy(&mut env, spec.address.clone(), &spec.admin, config)
                .map_err(setup(format!("crowdsale {}", spec.address)))?;
        }

        for account in &self.rejects_native {
            env.set_hook(account.clone(), Arc::new(RejectNative));
        }

        Ok(env)
    }

    /// Build the opening state and run every step against it.
    ///
    /// A failing step is recorded and rolled back; later steps still run.
    pub fn run(&self) -> Result<(Env, ScenarioReport), ScenarioError> {
        let mut env = self.build()?;
        let mut outcomes = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let status = match execute(&mut env, step)? {
                Ok(event) => StepStatus::Ok { event },
                Err(err) => StepStatus::Failed {
                    kind: err.kind(),
                    error: err.to_string(),
                },
            };
            outcomes.push(StepOutcome {
                index,
                op: step.name().to_string(),
                status,
            });
        }

        let report = ScenarioReport {
            outcomes,
            balances: closing_balances(&env),
        };
        info!(
            "scenario finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok((env, report))
    }
}

fn setup(what: impl Into<String>) -> impl FnOnce(SettlementError) -> ScenarioError {
    let what = what.into();
    move |source| ScenarioError::Setup { what, source }
}

type StepResult = Result<Option<SettlementEvent>, SettlementError>;

/// Run one step. The outer error is a malformed step; the inner one is the
/// settlement failure the step produced.
fn execute(env: &mut Env, step: &Step) -> Result<StepResult, ScenarioError> {
    let result = match step {
        Step::Distribute {
            caller,
            distributor,
            asset,
            payouts,
        } => {
            let recipients: Vec<AccountId> = payouts.iter().map(|p| p.recipient.clone()).collect();
            let amounts = payouts
                .iter()
                .map(|p| to_base_units(p.amount))
                .collect::<Result<Vec<Amount>, _>>()?;
            BatchPayoutDistributor::at(env, distributor.clone()).and_then(|d| {
                d.distribute(env, &CallContext::new(caller.clone()), asset, &recipients, &amounts)
                    .map(|r| Some(SettlementEvent::Distributed(r)))
            })
        }
        Step::Buy {
            caller,
            crowdsale,
            amount,
            value,
        } => {
            let amount = to_base_units(*amount)?;
            let explicit = value.map(to_base_units).transpose()?;
            CrowdsaleSettlement::at(env, crowdsale.clone()).and_then(|sale| {
                let attached = match explicit {
                    Some(value) => value,
                    None => default_payment(env, &sale, amount)?,
                };
                let ctx = CallContext::new(caller.clone()).with_value(attached);
                sale.buy_tokens(env, &ctx, amount)
                    .map(|r| Some(SettlementEvent::Purchased(r)))
            })
        }
        Step::Mint {
            caller,
            token,
            to,
            amount,
        } => {
            let amount = to_base_units(*amount)?;
            Token::at(env, token.clone())
                .and_then(|t| t.mint(env, &CallContext::new(caller.clone()), to, amount))
                .map(|_| None)
        }
        Step::Burn {
            caller,
            token,
            amount,
        } => {
            let amount = to_base_units(*amount)?;
            Token::at(env, token.clone())
                .and_then(|t| t.burn(env, &CallContext::new(caller.clone()), amount))
                .map(|_| None)
        }
        Step::Transfer {
            caller,
            token,
            to,
            amount,
        } => {
            let amount = to_base_units(*amount)?;
            Token::at(env, token.clone())
                .and_then(|t| t.transfer(env, &CallContext::new(caller.clone()), to, amount))
                .map(|_| None)
        }
        Step::Approve {
            caller,
            token,
            spender,
            amount,
        } => {
            let amount = to_base_units(*amount)?;
            Token::at(env, token.clone())
                .and_then(|t| t.approve(env, &CallContext::new(caller.clone()), spender, amount))
                .map(|_| None)
        }
        Step::GrantRole {
            caller,
            scope,
            role,
            account,
        } => env
            .roles_mut()
            .grant_role(scope, caller, *role, account)
            .map(|_| None),
        Step::RevokeRole {
            caller,
            scope,
            role,
            account,
        } => env
            .roles_mut()
            .revoke_role(scope, caller, *role, account)
            .map(|_| None),
        Step::SetPrice {
            caller,
            crowdsale,
            price_per_token,
        } => {
            let price = to_base_units(*price_per_token)?;
            CrowdsaleSettlement::at(env, crowdsale.clone())
                .and_then(|sale| sale.set_price_per_token(env, &CallContext::new(caller.clone()), price))
                .map(|_| None)
        }
        Step::SetAcceptedCurrency {
            caller,
            crowdsale,
            asset,
        } => CrowdsaleSettlement::at(env, crowdsale.clone())
            .and_then(|sale| {
                sale.set_accepted_currency(env, &CallContext::new(caller.clone()), asset.clone())
            })
            .map(|_| None),
        Step::SetFundsReceiver {
            caller,
            crowdsale,
            receiver,
        } => CrowdsaleSettlement::at(env, crowdsale.clone())
            .and_then(|sale| {
                sale.set_funds_receiver(env, &CallContext::new(caller.clone()), receiver.clone())
            })
            .map(|_| None),
        Step::FundNative { from, to, amount } => {
            let ctx = CallContext::new(from.clone()).with_value(to_base_units(*amount)?);
            env.send_native(&ctx, to).map(|_| None)
        }
    };
    Ok(result)
}

fn default_payment(
    env: &Env,
    sale: &CrowdsaleSettlement,
    amount: Amount,
) -> Result<Amount, SettlementError> {
    if sale.config(env)?.accepted_asset.is_native() {
        sale.quote(env, amount)
    } else {
        Ok(0)
    }
}

fn closing_balances(env: &Env) -> Vec<BalanceLine> {
    let mut lines = Vec::new();
    let native: BTreeSet<(&AccountId, Amount)> = env.native_holders().collect();
    for (account, balance) in native {
        if balance > 0 {
            lines.push(BalanceLine {
                account: account.clone(),
                asset: AssetId::Native,
                balance: format_units(balance),
            });
        }
    }
    for ledger in env.tokens() {
        let holders: BTreeSet<(&AccountId, Amount)> = ledger.holders().collect();
        for (account, balance) in holders {
            if balance > 0 {
                lines.push(BalanceLine {
                    account: account.clone(),
                    asset: ledger.asset(),
                    balance: format_units(balance),
                });
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYROLL: &str = r#"{
        "distributors": [
            { "address": "payroll", "admin": "admin", "distributors": ["ops"],
              "reserve": { "native": "3" } }
        ],
        "steps": [
            { "op": "distribute", "caller": "ops", "distributor": "payroll", "asset": "native",
              "payouts": [ { "recipient": "x", "amount": "1" }, { "recipient": "y", "amount": "2" } ] },
            { "op": "distribute", "caller": "ops", "distributor": "payroll", "asset": "native",
              "payouts": [ { "recipient": "x", "amount": "1" } ] }
        ]
    }"#;

    #[test]
    fn test_payroll_scenario() {
        let scenario = Scenario::from_json(PAYROLL).unwrap();
        let (env, report) = scenario.run().unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            &report.outcomes[1].status,
            StepStatus::Failed { kind: ErrorKind::InsufficientFunds, .. }
        ));
        assert_eq!(env.native_balance(&AccountId::new("y")), to_base_units(Decimal::from(2)).unwrap());
    }

    #[test]
    fn test_sale_scenario_with_default_payment() {
        let json = r#"{
            "accounts": { "alice": "10" },
            "tokens": [ { "address": "GOV", "policy": "non_transferable", "admin": "admin",
                          "minters": ["sale"] } ],
            "crowdsales": [ { "address": "sale", "admin": "admin", "token": "GOV",
                              "accepted_asset": "native", "price_per_token": "0.5",
                              "funds_receiver": "treasury" } ],
            "steps": [
                { "op": "buy", "caller": "alice", "crowdsale": "sale", "amount": "4" },
                { "op": "revoke_role", "caller": "admin", "scope": "GOV", "role": "minter", "account": "sale" },
                { "op": "buy", "caller": "alice", "crowdsale": "sale", "amount": "4" }
            ]
        }"#;
        let (env, report) = Scenario::from_json(json).unwrap().run().unwrap();
        assert!(report.outcomes[0].is_ok());
        assert!(report.outcomes[1].is_ok());
        assert!(matches!(
            &report.outcomes[2].status,
            StepStatus::Failed { kind: ErrorKind::Authorization, .. }
        ));
        assert_eq!(
            env.native_balance(&AccountId::new("treasury")),
            to_base_units(Decimal::from(2)).unwrap()
        );
    }

    #[test]
    fn test_bad_amount_is_scenario_error() {
        let json = r#"{ "accounts": { "alice": "-1" } }"#;
        assert!(matches!(
            Scenario::from_json(json).unwrap().build(),
            Err(ScenarioError::Units(UnitsError::Negative(_)))
        ));
    }

    #[test]
    fn test_setup_error_names_component() {
        let json = r#"{ "tokens": [ { "address": "native", "admin": "admin" } ] }"#;
        let err = Scenario::from_json(json).unwrap().build().unwrap_err();
        assert_eq!(err.to_string(), "setting up token native: address native is reserved");
    }

    #[test]
    fn test_report_serializes() {
        let (_, report) = Scenario::from_json(PAYROLL).unwrap().run().unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "ok");
        assert_eq!(json["outcomes"][1]["kind"], "insufficient_funds");
    }
}
