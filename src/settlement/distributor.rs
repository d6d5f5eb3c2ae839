use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::error::{SettlementError, SettlementResult};
use crate::core::units::Amount;
use crate::runtime::env::{CallContext, Env};
use crate::runtime::guard::ReentrancyGuard;
use crate::runtime::roles::Role;
use crate::settlement::receipt::{DistributionReceipt, SettlementEvent};
use crate::settlement::transfer::{CurrencyTransfer, TransferOrigin, TransferRequest};
use log::info;
use serde::{Deserialize, Serialize};

/// One line of a payout batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub recipient: AccountId,
    pub amount: Amount,
}

/// A list of payouts in a single asset.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::account::AccountId;
/// use settlement_engine::core::asset::AssetId;
/// use settlement_engine::settlement::distributor::BatchPayoutJob;
///
/// let mut job = BatchPayoutJob::new(AssetId::Native);
/// job.add(AccountId::new("x"), 1);
/// job.add(AccountId::new("y"), 2);
/// assert_eq!(job.gross_total().unwrap(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPayoutJob {
    pub asset: AssetId,
    pub payouts: Vec<Payout>,
}

impl BatchPayoutJob {
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            payouts: Vec::new(),
        }
    }

    pub fn add(&mut self, recipient: AccountId, amount: Amount) {
        self.payouts.push(Payout { recipient, amount });
    }

    pub fn len(&self) -> usize {
        self.payouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payouts.is_empty()
    }

    pub fn recipients(&self) -> Vec<AccountId> {
        self.payouts.iter().map(|p| p.recipient.clone()).collect()
    }

    pub fn amounts(&self) -> Vec<Amount> {
        self.payouts.iter().map(|p| p.amount).collect()
    }

    /// Overflow-checked sum of every payout.
    pub fn gross_total(&self) -> SettlementResult<Amount> {
        checked_total(self.payouts.iter().map(|p| p.amount))
    }
}

fn checked_total(amounts: impl IntoIterator<Item = Amount>) -> SettlementResult<Amount> {
    amounts.into_iter().try_fold(0 as Amount, |acc, amount| {
        acc.checked_add(amount)
            .ok_or(SettlementError::ArithmeticOverflow)
    })
}

/// Pays many recipients out of its own reserve in one all-or-nothing call.
///
/// The reserve is the distributor's own address: whatever native value or
/// tokens are sent there can be paid out by holders of the `Distributor`
/// role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchPayoutDistributor {
    address: AccountId,
}

impl BatchPayoutDistributor {
    /// Deploy a distributor at `address` administered by `admin`.
    pub fn deploy(env: &mut Env, address: AccountId, admin: &AccountId) -> SettlementResult<Self> {
        env.claim_address(&address)?;
        env.register_distributor(&address);
        env.roles_mut().bootstrap_admin(&address, admin);
        info!("deployed distributor {} (admin {})", address, admin);
        Ok(Self { address })
    }

    /// Handle to an existing distributor.
    pub fn at(env: &Env, address: AccountId) -> SettlementResult<Self> {
        if !env.is_distributor(&address) {
            return Err(SettlementError::UnknownComponent(address));
        }
        Ok(Self { address })
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    /// What the reserve currently holds of `asset`.
    pub fn held_balance(&self, env: &Env, asset: &AssetId) -> SettlementResult<Amount> {
        env.balance_of(asset, &self.address)
    }

    /// Pay `amounts[i]` of `asset` to `recipients[i]`, for every `i`.
    ///
    /// The reserve is checked once against the batch total before the
    /// first payout. This holds because the whole batch runs under one
    /// exclusive borrow of the substrate; the first failing payout voids
    /// the entire batch.
    pub fn distribute(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        asset: &AssetId,
        recipients: &[AccountId],
        amounts: &[Amount],
    ) -> SettlementResult<DistributionReceipt> {
        let mut env = ReentrancyGuard::enter(env, &self.address)?;
        env.roles()
            .require_role(&self.address, Role::Distributor, &ctx.caller)?;
        ctx.require_no_value()?;

        if recipients.is_empty() {
            return Err(SettlementError::EmptyBatch);
        }
        if recipients.len() != amounts.len() {
            return Err(SettlementError::LengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            });
        }

        let total = checked_total(amounts.iter().copied())?;
        let available = env.balance_of(asset, &self.address)?;
        if available < total {
            return Err(SettlementError::InsufficientFunds {
                asset: asset.clone(),
                available,
                required: total,
            });
        }

        env.transact(|env| {
            for (recipient, amount) in recipients.iter().zip(amounts) {
                let request = TransferRequest::new(
                    asset.clone(),
                    self.address.clone(),
                    recipient.clone(),
                    *amount,
                );
                CurrencyTransfer::transfer(env, &request, &TransferOrigin::Reserve)?;
            }

            let receipt = DistributionReceipt::new(
                self.address.clone(),
                asset.clone(),
                ctx.caller.clone(),
                total,
                recipients.len(),
            );
            env.emit(SettlementEvent::Distributed(receipt.clone()));
            info!("{}", receipt);
            Ok(receipt)
        })
    }

    /// [`distribute`](Self::distribute) for a prepared job.
    pub fn distribute_job(
        &self,
        env: &mut Env,
        ctx: &CallContext,
        job: &BatchPayoutJob,
    ) -> SettlementResult<DistributionReceipt> {
        self.distribute(env, ctx, &job.asset, &job.recipients(), &job.amounts())
    }
}
