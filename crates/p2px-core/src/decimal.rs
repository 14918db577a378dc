//! Precision-safe money and quantity types.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Fiat amounts, crypto
//! quantities and unit prices are distinct types so a price can never be
//! added to an amount by accident.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Sub};
use std::str::FromStr;

/// Amount of fiat currency (offer currency units, e.g. USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiatAmount(pub Decimal);

impl FiatAmount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round to cents for display in messages.
    #[inline]
    pub fn round_cents(&self) -> Self {
        Self(self.0.round_dp(2))
    }

    /// Sum that returns `None` instead of panicking past `Decimal::MAX`.
    #[inline]
    pub fn checked_add(&self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl fmt::Display for FiatAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FiatAmount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for FiatAmount {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for FiatAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for FiatAmount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Fiat price of one unit of the traded crypto asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitPrice(pub Decimal);

impl UnitPrice {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UnitPrice {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for UnitPrice {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Quantity of the traded crypto asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CryptoAmount(pub Decimal);

impl CryptoAmount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    /// Quantity bought with `fiat` at `price`.
    ///
    /// Returns `None` for a non-positive price.
    #[inline]
    pub fn from_fiat(fiat: FiatAmount, price: UnitPrice) -> Option<Self> {
        if !price.is_positive() {
            return None;
        }
        fiat.0.checked_div(price.0).map(Self)
    }
}

impl fmt::Display for CryptoAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for CryptoAmount {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Div<UnitPrice> for FiatAmount {
    type Output = Option<CryptoAmount>;

    fn div(self, rhs: UnitPrice) -> Self::Output {
        CryptoAmount::from_fiat(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_crypto_amount_from_fiat() {
        let fiat = FiatAmount::new(dec!(500));
        let price = UnitPrice::new(dec!(25000));

        let qty = (fiat / price).unwrap();
        assert_eq!(qty.inner(), dec!(0.02));
    }

    #[test]
    fn test_crypto_amount_rejects_zero_price() {
        let fiat = FiatAmount::new(dec!(500));
        assert!(CryptoAmount::from_fiat(fiat, UnitPrice::new(Decimal::ZERO)).is_none());
        assert!(CryptoAmount::from_fiat(fiat, UnitPrice::new(dec!(-1))).is_none());
    }

    #[test]
    fn test_fiat_arithmetic() {
        let a = FiatAmount::new(dec!(100.25));
        let b = FiatAmount::new(dec!(0.75));
        assert_eq!((a + b).inner(), dec!(101.00));
        assert_eq!((a - b).inner(), dec!(99.50));
    }

    #[test]
    fn test_round_cents() {
        let a = FiatAmount::new(dec!(10.005));
        assert_eq!(a.round_cents().inner(), dec!(10.00));
    }

    #[test]
    fn test_parse_amount() {
        let a: FiatAmount = "1500.50".parse().unwrap();
        assert_eq!(a.inner(), dec!(1500.50));
    }
}
