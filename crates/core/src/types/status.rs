//! Status enums for orders and accounts.
//!
//! # Order lifecycle
//!
//! ```text
//! pending ──► confirmed ──► delivered
//!    │            │
//!    └────────────┴──────► cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal. The allowed moves live in
//! [`OrderStatus::TRANSITIONS`]; everything else is rejected.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A status string that is not one of the four order statuses.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order status: {value}")]
pub struct InvalidStatus {
    /// The rejected input.
    pub value: String,
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, awaiting confirmation. Every order starts here.
    #[default]
    Pending,
    /// Accepted by the store and being packed.
    Confirmed,
    /// Handed to the customer. Terminal.
    Delivered,
    /// Abandoned before delivery. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Allowed `(from, to)` pairs.
    pub const TRANSITIONS: [(Self, Self); 4] = [
        (Self::Pending, Self::Confirmed),
        (Self::Pending, Self::Cancelled),
        (Self::Confirmed, Self::Delivered),
        (Self::Confirmed, Self::Cancelled),
    ];

    /// Returns the wire/database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Staying in the same status is not a transition and returns `false`;
    /// callers treat it as a no-op.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        Self::TRANSITIONS.contains(&(*self, next))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(InvalidStatus {
                value: s.to_owned(),
            }),
        }
    }
}

/// Role of a signed-in account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// A shopper. May manage their own cart and read their own orders.
    #[default]
    User,
    /// Store staff. May list every order and drive status transitions.
    Admin,
}

impl AccountRole {
    /// Whether this role may use the admin console.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid account role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_statuses() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_unknown_status() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.value, "shipped");
        assert!("Pending".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_skipping_and_backward_moves_rejected() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivered).unwrap(),
            "\"delivered\""
        );
    }

    #[test]
    fn test_account_role_roundtrip() {
        assert_eq!("admin".parse::<AccountRole>().unwrap(), AccountRole::Admin);
        assert_eq!(AccountRole::User.to_string(), "user");
        assert!("super_admin".parse::<AccountRole>().is_err());
        assert!(AccountRole::Admin.is_admin());
        assert!(!AccountRole::User.is_admin());
    }
}
