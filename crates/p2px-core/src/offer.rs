//! Offer catalog types (read-only in this system).

use crate::decimal::{FiatAmount, UnitPrice};
use crate::error::{CoreError, Result};
use crate::ids::{OfferId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Offer direction, from the owner's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Owner wants to buy crypto; the requester sells.
    Buy,
    /// Owner sells crypto; the requester buys.
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Jurisdictions an offer accepts trades from.
///
/// Jurisdictions are ISO country codes, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "countries", rename_all = "snake_case")]
pub enum CountryRestriction {
    /// Open to every jurisdiction.
    #[default]
    None,
    /// Only the listed jurisdictions may trade.
    AllowOnly(Vec<String>),
    /// The listed jurisdictions may not trade.
    Exclude(Vec<String>),
}

impl CountryRestriction {
    /// Returns true if the restriction excludes `jurisdiction`.
    ///
    /// An unknown jurisdiction (`None`) is never excluded.
    pub fn excludes(&self, jurisdiction: Option<&str>) -> bool {
        let Some(code) = jurisdiction else {
            return false;
        };
        let listed = |list: &[String]| list.iter().any(|c| c.eq_ignore_ascii_case(code));
        match self {
            Self::None => false,
            Self::AllowOnly(list) => !listed(list),
            Self::Exclude(list) => listed(list),
        }
    }
}

/// A published offer to buy or sell crypto against fiat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub owner_id: UserId,
    pub direction: Direction,
    pub crypto_symbol: String,
    pub fiat_currency: String,
    pub unit_price: UnitPrice,
    pub min_amount: FiatAmount,
    pub max_amount: FiatAmount,
    pub payment_method_label: String,
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub country_restrictions: CountryRestriction,
}

impl Offer {
    /// Returns true if `amount` lies within `[min_amount, max_amount]`.
    #[inline]
    pub fn accepts_amount(&self, amount: FiatAmount) -> bool {
        amount >= self.min_amount && amount <= self.max_amount
    }

    /// Reject catalog entries the trade math cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.unit_price.is_positive() {
            return Err(CoreError::InvalidAmount(format!(
                "offer {} unit price must be positive, got {}",
                self.id, self.unit_price
            )));
        }
        if !self.min_amount.is_positive() || self.min_amount > self.max_amount {
            return Err(CoreError::InvalidAmount(format!(
                "offer {} range [{}, {}] is invalid",
                self.id, self.min_amount, self.max_amount
            )));
        }
        if self.time_limit_minutes == 0 {
            return Err(CoreError::InvalidAmount(format!(
                "offer {} time limit must be at least one minute",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_offer() -> Offer {
        Offer {
            id: OfferId::from("offer-1"),
            owner_id: UserId::from("owner"),
            direction: Direction::Sell,
            crypto_symbol: "BTC".into(),
            fiat_currency: "USD".into(),
            unit_price: UnitPrice::new(dec!(25000)),
            min_amount: FiatAmount::new(dec!(50)),
            max_amount: FiatAmount::new(dec!(1000)),
            payment_method_label: "bank_transfer".into(),
            time_limit_minutes: 30,
            country_restrictions: CountryRestriction::None,
        }
    }

    #[test]
    fn test_accepts_amount_inclusive_bounds() {
        let offer = sample_offer();
        assert!(offer.accepts_amount(FiatAmount::new(dec!(50))));
        assert!(offer.accepts_amount(FiatAmount::new(dec!(1000))));
        assert!(!offer.accepts_amount(FiatAmount::new(dec!(49.99))));
        assert!(!offer.accepts_amount(FiatAmount::new(dec!(1000.01))));
    }

    #[test]
    fn test_validate() {
        assert!(sample_offer().validate().is_ok());

        let mut bad = sample_offer();
        bad.unit_price = UnitPrice::new(dec!(0));
        assert!(bad.validate().is_err());

        let mut bad = sample_offer();
        bad.min_amount = FiatAmount::new(dec!(2000));
        assert!(bad.validate().is_err());

        let mut bad = sample_offer();
        bad.time_limit_minutes = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_unknown_jurisdiction_never_excluded() {
        let allow = CountryRestriction::AllowOnly(vec!["DE".into()]);
        assert!(!allow.excludes(None));
        assert!(!CountryRestriction::Exclude(vec!["US".into()]).excludes(None));
    }

    #[test]
    fn test_allow_only() {
        let allow = CountryRestriction::AllowOnly(vec!["DE".into(), "FR".into()]);
        assert!(!allow.excludes(Some("de")));
        assert!(allow.excludes(Some("US")));
    }

    #[test]
    fn test_exclude() {
        let exclude = CountryRestriction::Exclude(vec!["US".into()]);
        assert!(exclude.excludes(Some("US")));
        assert!(!exclude.excludes(Some("GB")));
        assert!(!CountryRestriction::None.excludes(Some("US")));
    }

    #[test]
    fn test_restriction_serde_shape() {
        let json = r#"{"mode":"exclude","countries":["US"]}"#;
        let parsed: CountryRestriction = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, CountryRestriction::Exclude(vec!["US".into()]));
    }
}
