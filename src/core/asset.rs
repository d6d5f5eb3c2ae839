use crate::core::account::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Textual form of the native asset. No token ledger may live at this address.
pub const NATIVE_SYMBOL: &str = "native";

/// Identifies the asset a transfer moves.
///
/// `Native` is the platform's base value; `Token` references a fungible
/// ledger by its address. The two variants can never collide: the
/// reserved word `native` and the null account are refused as token
/// addresses when a ledger is deployed.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::asset::AssetId;
///
/// let native: AssetId = "native".parse().unwrap();
/// assert!(native.is_native());
///
/// let usdc: AssetId = "USDC".parse().unwrap();
/// assert_eq!(usdc.to_string(), "USDC");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AssetId {
    Native,
    Token(AccountId),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("asset identifier must not be empty")]
pub struct EmptyAssetId;

impl AssetId {
    pub fn token(address: impl Into<String>) -> Self {
        AssetId::Token(AccountId::new(address))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, AssetId::Native)
    }

    /// The ledger address for token assets.
    pub fn token_address(&self) -> Option<&AccountId> {
        match self {
            AssetId::Native => None,
            AssetId::Token(address) => Some(address),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Native => write!(f, "{}", NATIVE_SYMBOL),
            AssetId::Token(address) => write!(f, "{}", address),
        }
    }
}

impl FromStr for AssetId {
    type Err = EmptyAssetId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(EmptyAssetId),
            NATIVE_SYMBOL => Ok(AssetId::Native),
            other => Ok(AssetId::token(other)),
        }
    }
}

impl TryFrom<String> for AssetId {
    type Error = EmptyAssetId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetId> for String {
    fn from(asset: AssetId) -> Self {
        asset.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_sentinel_is_distinct() {
        assert_ne!(AssetId::Native, AssetId::token("native-wrapped"));
        assert!(AssetId::Native.token_address().is_none());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!("  ".parse::<AssetId>(), Err(EmptyAssetId));
    }

    #[test]
    fn test_serde_uses_text_form() {
        let json = serde_json::to_string(&AssetId::token("GOV")).unwrap();
        assert_eq!(json, "\"GOV\"");
        let back: AssetId = serde_json::from_str("\"native\"").unwrap();
        assert_eq!(back, AssetId::Native);
    }
}
