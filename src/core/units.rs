//! Conversion between whole units and minimal units.
//!
//! Balances are carried as integer minimal units. Humans (scenario files,
//! the CLI) speak in decimal whole units; `rust_decimal` bridges the two.

use rust_decimal::Decimal;
use thiserror::Error;

/// An amount in minimal units.
pub type Amount = u128;

/// Decimal places of one whole unit.
pub const UNIT_DECIMALS: u32 = 18;

/// Minimal units per whole unit. Also the denominator of per-token prices.
pub const TOKEN_SCALE: Amount = 1_000_000_000_000_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    #[error("amount must not be negative, got {0}")]
    Negative(Decimal),
    #[error("amount {0} is finer than one minimal unit")]
    TooPrecise(Decimal),
    #[error("amount {0} does not fit in minimal units")]
    OutOfRange(Decimal),
    #[error("invalid decimal amount '{0}'")]
    Parse(String),
}

/// Convert whole units into minimal units.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::units::{to_base_units, TOKEN_SCALE};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(to_base_units(dec!(3)).unwrap(), 3 * TOKEN_SCALE);
/// assert_eq!(to_base_units(dec!(0.5)).unwrap(), TOKEN_SCALE / 2);
/// ```
pub fn to_base_units(units: Decimal) -> Result<Amount, UnitsError> {
    if units.is_sign_negative() && !units.is_zero() {
        return Err(UnitsError::Negative(units));
    }
    let scaled = units
        .checked_mul(Decimal::from(TOKEN_SCALE as u64))
        .ok_or(UnitsError::OutOfRange(units))?;
    if !scaled.fract().is_zero() {
        return Err(UnitsError::TooPrecise(units));
    }
    let whole = scaled.normalize();
    u128::try_from(whole.mantissa()).map_err(|_| UnitsError::OutOfRange(units))
}

/// Parse a decimal string in whole units into minimal units.
pub fn parse_units(text: &str) -> Result<Amount, UnitsError> {
    let units: Decimal = text
        .trim()
        .parse()
        .map_err(|_| UnitsError::Parse(text.to_string()))?;
    to_base_units(units)
}

/// Convert minimal units back into whole units, if representable.
pub fn from_base_units(amount: Amount) -> Option<Decimal> {
    let mantissa = i128::try_from(amount).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, UNIT_DECIMALS)
        .ok()
        .map(|d| d.normalize())
}

/// Human-readable whole-unit rendering. Falls back to raw minimal units.
pub fn format_units(amount: Amount) -> String {
    match from_base_units(amount) {
        Some(units) => units.to_string(),
        None => format!("{} (minimal units)", amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fractional_units() {
        assert_eq!(
            to_base_units(dec!(2.9)).unwrap(),
            2_900_000_000_000_000_000
        );
    }

    #[test]
    fn test_too_precise() {
        let tiny = Decimal::new(1, 19);
        assert_eq!(to_base_units(tiny), Err(UnitsError::TooPrecise(tiny)));
    }

    #[test]
    fn test_negative() {
        assert!(matches!(
            to_base_units(dec!(-1)),
            Err(UnitsError::Negative(_))
        ));
    }

    #[test]
    fn test_parse_and_format() {
        let amount = parse_units("12.25").unwrap();
        assert_eq!(format_units(amount), "12.25");
        assert!(matches!(parse_units("abc"), Err(UnitsError::Parse(_))));
    }

    #[test]
    fn test_format_out_of_range_falls_back() {
        assert!(format_units(u128::MAX).ends_with("(minimal units)"));
    }
}
