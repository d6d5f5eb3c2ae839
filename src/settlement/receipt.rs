use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::units::{format_units, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Completion record of a batch payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReceipt {
    pub id: Uuid,
    /// Distributor whose reserve paid out.
    pub distributor: AccountId,
    pub asset: AssetId,
    /// Account that invoked the payout.
    pub actor: AccountId,
    /// Sum of every payout in the batch.
    pub total: Amount,
    /// Number of recipients credited.
    pub count: usize,
    pub recorded_at: DateTime<Utc>,
}

impl DistributionReceipt {
    pub(crate) fn new(
        distributor: AccountId,
        asset: AssetId,
        actor: AccountId,
        total: Amount,
        count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            distributor,
            asset,
            actor,
            total,
            count,
            recorded_at: Utc::now(),
        }
    }
}

impl fmt::Display for DistributionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} distributed {} {} to {} recipients from {}",
            self.actor,
            format_units(self.total),
            self.asset,
            self.count,
            self.distributor
        )
    }
}

/// Completion record of a token purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub id: Uuid,
    pub crowdsale: AccountId,
    pub buyer: AccountId,
    /// Payment taken, in the accepted asset.
    pub cost: Amount,
    pub payment_asset: AssetId,
    /// Ledger tokens minted to the buyer.
    pub amount: Amount,
    pub recorded_at: DateTime<Utc>,
}

impl PurchaseReceipt {
    pub(crate) fn new(
        crowdsale: AccountId,
        buyer: AccountId,
        cost: Amount,
        payment_asset: AssetId,
        amount: Amount,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            crowdsale,
            buyer,
            cost,
            payment_asset,
            amount,
            recorded_at: Utc::now(),
        }
    }
}

impl fmt::Display for PurchaseReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bought {} tokens from {} for {} {}",
            self.buyer,
            format_units(self.amount),
            self.crowdsale,
            format_units(self.cost),
            self.payment_asset
        )
    }
}

/// Structured completion records appended to the substrate's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SettlementEvent {
    Distributed(DistributionReceipt),
    Purchased(PurchaseReceipt),
}

impl fmt::Display for SettlementEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementEvent::Distributed(receipt) => receipt.fmt(f),
            SettlementEvent::Purchased(receipt) => receipt.fmt(f),
        }
    }
}
