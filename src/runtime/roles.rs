use crate::core::account::AccountId;
use crate::core::error::{SettlementError, SettlementResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Named capability checked before privileged operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administers the other roles of a scope and its configuration.
    Admin,
    /// May run batch payouts from a distributor's reserve.
    Distributor,
    /// May mint a token ledger.
    Minter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "ADMIN",
            Role::Distributor => "DISTRIBUTOR",
            Role::Minter => "MINTER",
        };
        f.write_str(name)
    }
}

/// Role assignments, scoped per component or token address.
///
/// Each scope has its own `Admin` holders; only they may grant or revoke
/// roles within that scope.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    members: HashMap<(AccountId, Role), BTreeSet<AccountId>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_role(&self, scope: &AccountId, role: Role, account: &AccountId) -> bool {
        self.members
            .get(&(scope.clone(), role))
            .map(|set| set.contains(account))
            .unwrap_or(false)
    }

    /// Fail with `Unauthorized` unless `account` holds `role` in `scope`.
    pub fn require_role(
        &self,
        scope: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> SettlementResult<()> {
        if self.has_role(scope, role, account) {
            Ok(())
        } else {
            Err(SettlementError::Unauthorized {
                scope: scope.clone(),
                role,
                account: account.clone(),
            })
        }
    }

    /// Install the first admin of a freshly deployed scope.
    pub(crate) fn bootstrap_admin(&mut self, scope: &AccountId, admin: &AccountId) {
        self.insert(scope, Role::Admin, admin);
    }

    /// Grant `role` to `account`. Returns whether the account was newly added.
    pub fn grant_role(
        &mut self,
        scope: &AccountId,
        granter: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> SettlementResult<bool> {
        self.require_role(scope, Role::Admin, granter)?;
        let added = self.insert(scope, role, account);
        if added {
            info!("{} granted {} on {} to {}", granter, role, scope, account);
        }
        Ok(added)
    }

    /// Revoke `role` from `account`. Returns whether the account held it.
    pub fn revoke_role(
        &mut self,
        scope: &AccountId,
        revoker: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> SettlementResult<bool> {
        self.require_role(scope, Role::Admin, revoker)?;
        let removed = self.remove(scope, role, account);
        if removed {
            info!("{} revoked {} on {} from {}", revoker, role, scope, account);
        }
        Ok(removed)
    }

    /// Give up a role held by the caller itself.
    pub fn renounce_role(&mut self, scope: &AccountId, role: Role, account: &AccountId) -> bool {
        self.remove(scope, role, account)
    }

    /// All holders of `role` in `scope`, in sorted order.
    pub fn members(&self, scope: &AccountId, role: Role) -> impl Iterator<Item = &AccountId> {
        self.members
            .get(&(scope.clone(), role))
            .map(|set| set.iter())
            .into_iter()
            .flatten()
    }

    fn insert(&mut self, scope: &AccountId, role: Role, account: &AccountId) -> bool {
        self.members
            .entry((scope.clone(), role))
            .or_default()
            .insert(account.clone())
    }

    fn remove(&mut self, scope: &AccountId, role: Role, account: &AccountId) -> bool {
        self.members
            .get_mut(&(scope.clone(), role))
            .map(|set| set.remove(account))
            .unwrap_or(false)
    }
}
