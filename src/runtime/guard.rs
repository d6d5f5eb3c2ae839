//! Per-component reentrancy flag with scoped release.
//!
//! A component is either entered or not. Entering an already entered
//! component fails `ReentrantCall`; the flag is cleared when the guard is
//! dropped, whichever way the call leaves.

use crate::core::account::AccountId;
use crate::core::error::{SettlementError, SettlementResult};
use crate::runtime::env::Env;
use log::warn;
use std::ops::{Deref, DerefMut};

/// Exclusive access to the substrate for the duration of one guarded call.
///
/// Dereferences to [`Env`], so the guarded body works through it directly.
#[derive(Debug)]
pub struct ReentrancyGuard<'a> {
    env: &'a mut Env,
    component: AccountId,
}

impl<'a> ReentrancyGuard<'a> {
    pub fn enter(env: &'a mut Env, component: &AccountId) -> SettlementResult<Self> {
        if !env.mark_entered(component) {
            warn!("blocked reentrant call into {}", component);
            return Err(SettlementError::ReentrantCall {
                component: component.clone(),
            });
        }
        Ok(Self {
            env,
            component: component.clone(),
        })
    }
}

impl Deref for ReentrancyGuard<'_> {
    type Target = Env;

    fn deref(&self) -> &Env {
        self.env
    }
}

impl DerefMut for ReentrancyGuard<'_> {
    fn deref_mut(&mut self) -> &mut Env {
        self.env
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.env.mark_left(&self.component);
    }
}
