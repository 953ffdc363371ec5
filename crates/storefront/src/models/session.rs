//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use grocer_core::{AccountId, AccountRole, Phone};

/// Session-stored account identity.
///
/// Written by the sign-in collaborator; the storefront only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAccount {
    /// Account's database ID.
    pub id: AccountId,
    /// Display name, copied onto orders.
    pub name: String,
    /// Contact number, copied onto orders.
    pub phone: Phone,
    #[serde(default)]
    pub role: AccountRole,
}

impl CurrentAccount {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in account.
    pub const CURRENT_ACCOUNT: &str = "current_account";
}
