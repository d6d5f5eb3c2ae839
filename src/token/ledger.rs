use crate::core::account::AccountId;
use crate::core::asset::AssetId;
use crate::core::error::{SettlementError, SettlementResult};
use crate::core::units::Amount;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which balance movements a token ledger accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPolicy {
    /// Standard fungible ledger.
    #[default]
    Free,
    /// Mint and burn only; nothing moves between two real accounts.
    NonTransferable,
}

impl TransferPolicy {
    /// Gate every movement on this ledger passes through.
    pub fn check(&self, token: &AccountId, from: &AccountId, to: &AccountId) -> SettlementResult<()> {
        match self {
            TransferPolicy::Free => Ok(()),
            TransferPolicy::NonTransferable if !from.is_null() && !to.is_null() => {
                Err(SettlementError::TransfersDisabled {
                    token: token.clone(),
                })
            }
            TransferPolicy::NonTransferable => Ok(()),
        }
    }
}

/// Balance and allowance storage of a single fungible token.
///
/// All balance changes go through [`TokenLedger::update`]: a movement from
/// the null account is a mint, a movement to it is a burn.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    address: AccountId,
    policy: TransferPolicy,
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
}

impl TokenLedger {
    pub fn new(address: AccountId, policy: TransferPolicy) -> Self {
        Self {
            address,
            policy,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        }
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    pub fn asset(&self) -> AssetId {
        AssetId::Token(self.address.clone())
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn holders(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.balances.iter().map(|(account, &balance)| (account, balance))
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Enforce the transfer policy without moving anything.
    pub fn check_movement(&self, from: &AccountId, to: &AccountId) -> SettlementResult<()> {
        self.policy.check(&self.address, from, to)
    }

    /// Move `amount` from `from` to `to`. Nothing is written unless every
    /// check passes.
    pub fn update(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> SettlementResult<()> {
        self.check_movement(from, to)?;

        let supply = if from.is_null() {
            self.total_supply
                .checked_add(amount)
                .ok_or(SettlementError::ArithmeticOverflow)?
        } else {
            self.total_supply
        };

        let debited = if from.is_null() {
            None
        } else {
            let available = self.balance_of(from);
            if available < amount {
                return Err(SettlementError::InsufficientBalance {
                    asset: self.asset(),
                    account: from.clone(),
                    available,
                    required: amount,
                });
            }
            Some(available - amount)
        };

        let credited = if to.is_null() {
            None
        } else {
            // A self-transfer credits the already-debited balance.
            let base = match &debited {
                Some(rest) if from == to => *rest,
                _ => self.balance_of(to),
            };
            Some(base.checked_add(amount).ok_or(SettlementError::ArithmeticOverflow)?)
        };

        let supply = if to.is_null() { supply - amount } else { supply };

        if let Some(rest) = debited {
            self.balances.insert(from.clone(), rest);
        }
        if let Some(total) = credited {
            self.balances.insert(to.clone(), total);
        }
        self.total_supply = supply;
        Ok(())
    }

    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    /// Spend `spender`'s allowance from `owner` and move the funds.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        self.check_movement(owner, to)?;
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(SettlementError::InsufficientAllowance {
                asset: self.asset(),
                owner: owner.clone(),
                spender: spender.clone(),
                available: allowed,
                required: amount,
            });
        }
        self.update(owner, to, amount)?;
        self.approve(owner, spender, allowed - amount);
        Ok(())
    }
}
