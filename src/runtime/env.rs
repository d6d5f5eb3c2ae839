use crate::core::account::AccountId;
use crate::core::asset::{AssetId, NATIVE_SYMBOL};
use crate::core::error::{SettlementError, SettlementResult};
use crate::core::units::Amount;
use crate::runtime::hooks::{AccountHook, HookEnv};
use crate::runtime::roles::RoleRegistry;
use crate::settlement::crowdsale::CrowdsaleConfig;
use crate::settlement::receipt::SettlementEvent;
use crate::token::ledger::{TokenLedger, TransferPolicy};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Who is calling an entry point, and how much native value rides along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub value: Amount,
}

impl CallContext {
    pub fn new(caller: impl Into<AccountId>) -> Self {
        Self {
            caller: caller.into(),
            value: 0,
        }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }

    /// Entry points that do not take payment refuse attached value.
    pub fn require_no_value(&self) -> SettlementResult<()> {
        if self.value == 0 {
            Ok(())
        } else {
            Err(SettlementError::IncorrectValueSent {
                expected: 0,
                sent: self.value,
            })
        }
    }
}

/// In-memory account and balance substrate the engine settles against.
///
/// Holds native balances, token ledgers, role assignments, component
/// storage, account hooks and the completion event log. Every entry point
/// borrows it mutably, so calls are serialized.
#[derive(Debug, Clone, Default)]
pub struct Env {
    native: HashMap<AccountId, Amount>,
    tokens: BTreeMap<AccountId, TokenLedger>,
    roles: RoleRegistry,
    distributors: BTreeSet<AccountId>,
    crowdsales: BTreeMap<AccountId, CrowdsaleConfig>,
    entered: HashSet<AccountId>,
    hooks: HashMap<AccountId, Arc<dyn AccountHook>>,
    events: Vec<SettlementEvent>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` as one unit: if it fails, every balance, ledger, role,
    /// crowdsale setting and event it produced is undone.
    ///
    /// Entry points call this once; the movements inside validate before
    /// they write and leave undo to the enclosing checkpoint.
    pub fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut Env) -> SettlementResult<T>,
    ) -> SettlementResult<T> {
        let checkpoint = self.checkpoint();
        let outcome = f(self);
        if let Err(err) = &outcome {
            warn!("rolling back: {}", err);
            self.restore(checkpoint);
        }
        outcome
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            native: self.native.clone(),
            tokens: self.tokens.clone(),
            roles: self.roles.clone(),
            crowdsales: self.crowdsales.clone(),
            events: self.events.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.native = checkpoint.native;
        self.tokens = checkpoint.tokens;
        self.roles = checkpoint.roles;
        self.crowdsales = checkpoint.crowdsales;
        // The log is append-only, so its length is enough.
        self.events.truncate(checkpoint.events);
    }

    // --- Roles ---

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn roles_mut(&mut self) -> &mut RoleRegistry {
        &mut self.roles
    }

    // --- Hooks ---

    pub fn set_hook(&mut self, account: AccountId, hook: Arc<dyn AccountHook>) {
        self.hooks.insert(account, hook);
    }

    pub fn clear_hook(&mut self, account: &AccountId) {
        self.hooks.remove(account);
    }

    fn hook(&self, account: &AccountId) -> Option<Arc<dyn AccountHook>> {
        self.hooks.get(account).cloned()
    }

    // --- Native value ---

    /// Every account with a recorded native balance.
    pub fn native_holders(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.native.iter().map(|(account, &balance)| (account, balance))
    }

    pub fn native_balance(&self, account: &AccountId) -> Amount {
        self.native.get(account).copied().unwrap_or(0)
    }

    /// Credit native value from outside the system (genesis, faucet).
    pub fn deposit_native(&mut self, account: &AccountId, amount: Amount) -> SettlementResult<()> {
        if account.is_null() {
            return Err(SettlementError::ZeroAddressRecipient);
        }
        let balance = self
            .native_balance(account)
            .checked_add(amount)
            .ok_or(SettlementError::ArithmeticOverflow)?;
        self.native.insert(account.clone(), balance);
        Ok(())
    }

    /// Send the native value attached to `ctx` from the caller to `to`.
    pub fn send_native(&mut self, ctx: &CallContext, to: &AccountId) -> SettlementResult<()> {
        if ctx.caller.is_null() {
            return Err(SettlementError::ReservedAddress(AccountId::NULL));
        }
        if ctx.value == 0 {
            return Err(SettlementError::ZeroAmount);
        }
        self.transact(|env| env.push_native(&ctx.caller, to, ctx.value))
    }

    /// Move native value and run the recipient's hook.
    ///
    /// Nothing is written unless the balance suffices. A rejecting hook
    /// fails `TransferFailure` with the movement already applied; the
    /// caller's checkpoint discards it.
    pub(crate) fn push_native(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        if to.is_null() {
            return Err(SettlementError::ZeroAddressRecipient);
        }
        let available = self.native_balance(from);
        if available < amount {
            return Err(SettlementError::InsufficientBalance {
                asset: AssetId::Native,
                account: from.clone(),
                available,
                required: amount,
            });
        }
        self.native.insert(from.clone(), available - amount);
        let credited = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or(SettlementError::ArithmeticOverflow)?;
        self.native.insert(to.clone(), credited);
        debug!("native {} -> {}: {}", from, to, amount);

        if let Some(hook) = self.hook(to) {
            hook.on_native_received(&mut HookEnv::new(self, to.clone()), from, amount)
                .map_err(|err| rejected(to, err))?;
        }
        Ok(())
    }

    // --- Token ledgers ---

    /// Create an empty token ledger at `address`.
    pub(crate) fn deploy_token(&mut self, address: &AccountId, policy: TransferPolicy) -> SettlementResult<()> {
        self.claim_address(address)?;
        self.tokens
            .insert(address.clone(), TokenLedger::new(address.clone(), policy));
        Ok(())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenLedger> {
        self.tokens.values()
    }

    pub fn token(&self, address: &AccountId) -> SettlementResult<&TokenLedger> {
        self.tokens
            .get(address)
            .ok_or_else(|| SettlementError::UnknownToken(address.clone()))
    }

    pub(crate) fn token_mut(&mut self, address: &AccountId) -> SettlementResult<&mut TokenLedger> {
        self.tokens
            .get_mut(address)
            .ok_or_else(|| SettlementError::UnknownToken(address.clone()))
    }

    /// Move tokens on a ledger and notify the recipient's hook.
    ///
    /// `from = null` mints and `to = null` burns; the ledger's policy
    /// decides everything else. Like [`Env::push_native`], a rejecting
    /// hook leaves undo to the caller's checkpoint.
    pub(crate) fn move_tokens(
        &mut self,
        token: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        self.token_mut(token)?.update(from, to, amount)?;
        debug!("{} {} -> {}: {}", token, from, to, amount);
        self.notify_token_received(token, from, to, amount)
    }

    /// Spend an allowance and notify the recipient's hook.
    pub(crate) fn move_tokens_from(
        &mut self,
        token: &AccountId,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        self.token_mut(token)?
            .transfer_from(spender, owner, to, amount)?;
        debug!("{} {} -> {} by {}: {}", token, owner, to, spender, amount);
        self.notify_token_received(token, owner, to, amount)
    }

    fn notify_token_received(
        &mut self,
        token: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> SettlementResult<()> {
        if to.is_null() {
            return Ok(());
        }
        match self.hook(to) {
            Some(hook) => hook
                .on_token_received(&mut HookEnv::new(self, to.clone()), token, from, amount)
                .map_err(|err| rejected(to, err)),
            None => Ok(()),
        }
    }

    /// Balance of `account` in either asset kind.
    pub fn balance_of(&self, asset: &AssetId, account: &AccountId) -> SettlementResult<Amount> {
        match asset {
            AssetId::Native => Ok(self.native_balance(account)),
            AssetId::Token(token) => Ok(self.token(token)?.balance_of(account)),
        }
    }

    // --- Component storage ---

    /// Reserve `address` for a new ledger or component.
    pub(crate) fn claim_address(&self, address: &AccountId) -> SettlementResult<()> {
        if address.is_null() || address.as_str() == NATIVE_SYMBOL {
            return Err(SettlementError::ReservedAddress(address.clone()));
        }
        if self.is_deployed(address) {
            return Err(SettlementError::AlreadyDeployed(address.clone()));
        }
        Ok(())
    }

    pub fn is_deployed(&self, address: &AccountId) -> bool {
        self.tokens.contains_key(address)
            || self.distributors.contains(address)
            || self.crowdsales.contains_key(address)
    }

    pub(crate) fn register_distributor(&mut self, address: &AccountId) {
        self.distributors.insert(address.clone());
    }

    pub(crate) fn is_distributor(&self, address: &AccountId) -> bool {
        self.distributors.contains(address)
    }

    pub fn crowdsale_config(&self, address: &AccountId) -> SettlementResult<&CrowdsaleConfig> {
        self.crowdsales
            .get(address)
            .ok_or_else(|| SettlementError::UnknownComponent(address.clone()))
    }

    pub(crate) fn crowdsale_config_mut(
        &mut self,
        address: &AccountId,
    ) -> SettlementResult<&mut CrowdsaleConfig> {
        self.crowdsales
            .get_mut(address)
            .ok_or_else(|| SettlementError::UnknownComponent(address.clone()))
    }

    pub(crate) fn store_crowdsale(&mut self, address: &AccountId, config: CrowdsaleConfig) {
        self.crowdsales.insert(address.clone(), config);
    }

    // --- Reentrancy flags ---

    pub(crate) fn mark_entered(&mut self, component: &AccountId) -> bool {
        self.entered.insert(component.clone())
    }

    pub(crate) fn mark_left(&mut self, component: &AccountId) {
        self.entered.remove(component);
    }

    pub fn is_entered(&self, component: &AccountId) -> bool {
        self.entered.contains(component)
    }

    // --- Events ---

    pub fn events(&self) -> &[SettlementEvent] {
        &self.events
    }

    pub(crate) fn emit(&mut self, event: SettlementEvent) {
        self.events.push(event);
    }
}

/// What a failed entry point restores.
#[derive(Debug)]
struct Checkpoint {
    native: HashMap<AccountId, Amount>,
    tokens: BTreeMap<AccountId, TokenLedger>,
    roles: RoleRegistry,
    crowdsales: BTreeMap<AccountId, CrowdsaleConfig>,
    events: usize,
}

fn rejected(to: &AccountId, err: SettlementError) -> SettlementError {
    match err {
        SettlementError::TransferFailure { .. } => err,
        other => SettlementError::TransferFailure {
            to: to.clone(),
            reason: other.to_string(),
        },
    }
}
