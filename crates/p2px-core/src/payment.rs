//! Payment methods and the instructions message derived from them.

use crate::decimal::FiatAmount;
use crate::ids::{PaymentMethodId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored fiat payment method owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub owner_id: UserId,
    pub payment_type: String,
    pub account_holder: String,
    pub provider: String,
    pub account_number: String,
}

/// Structured message telling the buyer how to pay the seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub amount: FiatAmount,
    pub currency: String,
    pub payment_type: String,
    pub account_holder: String,
    pub provider: String,
    pub account_number: String,
}

impl PaymentInstructions {
    pub fn new(amount: FiatAmount, currency: impl Into<String>, method: &PaymentMethod) -> Self {
        Self {
            amount,
            currency: currency.into(),
            payment_type: method.payment_type.clone(),
            account_holder: method.account_holder.clone(),
            provider: method.provider.clone(),
            account_number: method.account_number.clone(),
        }
    }
}

impl fmt::Display for PaymentInstructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Payment instructions")?;
        writeln!(f, "Amount: {} {}", self.amount.round_cents(), self.currency)?;
        writeln!(f, "Method: {}", self.payment_type)?;
        writeln!(f, "Account holder: {}", self.account_holder)?;
        writeln!(f, "Provider: {}", self.provider)?;
        write!(f, "Account number: {}", self.account_number)
    }
}
