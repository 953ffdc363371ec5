//! Payment selection made at checkout.
//!
//! Payment is a pass-through selector: the storefront validates that the
//! chosen method carries its required details, then records only the method
//! tag on the order. Card numbers, CVVs and UPI handles never leave the
//! checkout request.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A required payment detail was missing or blank.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("missing payment detail: {field}")]
pub struct PaymentDetailsError {
    /// Name of the missing field (`number`, `expiry`, `cvv`, `holder_name`, `handle`).
    pub field: &'static str,
}

/// Card details entered at checkout.
///
/// `Debug` redacts the number and CVV.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub number: String,
    /// `MM/YY`.
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub holder_name: String,
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .field("holder_name", &self.holder_name)
            .finish()
    }
}

/// The payment method chosen by the customer, with any details it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentSelection {
    /// Pay when the order arrives.
    #[serde(rename = "cod")]
    CashOnDelivery,
    /// Credit or debit card.
    Card(CardDetails),
    /// UPI transfer to the given handle.
    Upi {
        #[serde(default)]
        handle: String,
    },
    /// Redirect to the customer's bank.
    #[serde(rename = "netbanking")]
    NetBanking,
}

impl PaymentSelection {
    /// The method tag recorded on the order.
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        match self {
            Self::CashOnDelivery => PaymentMethod::CashOnDelivery,
            Self::Card(_) => PaymentMethod::Card,
            Self::Upi { .. } => PaymentMethod::Upi,
            Self::NetBanking => PaymentMethod::NetBanking,
        }
    }

    /// Check that every detail the method needs is present.
    ///
    /// Whitespace-only values count as missing. The first missing field is
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentDetailsError`] naming the missing field.
    pub fn validate(&self) -> Result<PaymentMethod, PaymentDetailsError> {
        match self {
            Self::CashOnDelivery | Self::NetBanking => {}
            Self::Card(card) => {
                require("number", &card.number)?;
                require("expiry", &card.expiry)?;
                require("cvv", &card.cvv)?;
                require("holder_name", &card.holder_name)?;
            }
            Self::Upi { handle } => require("handle", handle)?,
        }
        Ok(self.method())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), PaymentDetailsError> {
    if value.trim().is_empty() {
        return Err(PaymentDetailsError { field });
    }
    Ok(())
}

/// Payment method tag, without any details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "cod")]
    CashOnDelivery,
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "upi")]
    Upi,
    #[serde(rename = "netbanking")]
    NetBanking,
}

impl PaymentMethod {
    /// Returns the wire/database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cod",
            Self::Card => "card",
            Self::Upi => "upi",
            Self::NetBanking => "netbanking",
        }
    }

    /// Customer-facing name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on Delivery",
            Self::Card => "Credit/Debit Card",
            Self::Upi => "UPI Payment",
            Self::NetBanking => "Net Banking",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::CashOnDelivery),
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "netbanking" => Ok(Self::NetBanking),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}
