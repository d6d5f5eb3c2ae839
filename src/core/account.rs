use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of an account, component or token ledger.
///
/// The empty identity is the distinguished null account: it stands for
/// "no one" and is the source of every mint and the sink of every burn.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::account::AccountId;
///
/// let alice = AccountId::new("alice");
/// assert!(!alice.is_null());
/// assert!(AccountId::NULL.is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// The null account.
    pub const NULL: AccountId = AccountId(String::new());

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this account.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<null>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_account() {
        assert!(AccountId::NULL.is_null());
        assert!(AccountId::new("").is_null());
        assert_eq!(AccountId::default(), AccountId::NULL);
    }

    #[test]
    fn test_account_display() {
        assert_eq!(format!("{}", AccountId::new("treasury")), "treasury");
        assert_eq!(format!("{}", AccountId::NULL), "<null>");
    }

    #[test]
    fn test_account_serializes_transparently() {
        let json = serde_json::to_string(&AccountId::new("ops")).unwrap();
        assert_eq!(json, "\"ops\"");
    }
}
