//! Authentication extractors.
//!
//! The sign-in handshake lives outside the storefront; whatever performs it
//! calls [`sign_in`] to put a [`CurrentAccount`] into the session. Handlers
//! then ask for [`RequireAccount`] or [`RequireAdmin`].

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAccount, session_keys};

/// Extractor that requires a signed-in account.
///
/// Rejects with `401 Unauthorized` when no account is in the session and
/// `503` when the session store cannot be read.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAccount(account): RequireAccount) -> String {
///     format!("Hello, {}!", account.name)
/// }
/// ```
pub struct RequireAccount(pub CurrentAccount);

impl<S> FromRequestParts<S> for RequireAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_account(parts)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_string()))
    }
}

/// Extractor that requires a signed-in admin.
///
/// Rejects with `401` when signed out and `403` for non-admin accounts.
pub struct RequireAdmin(pub CurrentAccount);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAccount(account) = RequireAccount::from_request_parts(parts, state).await?;
        if !account.is_admin() {
            tracing::warn!(account_id = %account.id, "Non-admin attempted admin operation");
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(Self(account))
    }
}

async fn current_account(parts: &Parts) -> Result<Option<CurrentAccount>, AppError> {
    // Get the session from extensions (set by SessionManagerLayer)
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    match session
        .get::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
        .await
    {
        Ok(account) => Ok(account),
        Err(SessionError::Store(e)) => {
            tracing::error!(error = %e, "Session store unavailable");
            Err(AppError::Unavailable(format!("session store: {e}")))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable session account, treating as signed out");
            Ok(None)
        }
    }
}

/// Put `account` into the session.
///
/// The session ID is cycled so a pre-login session cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(
    session: &Session,
    account: &CurrentAccount,
) -> Result<(), SessionError> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_ACCOUNT, account)
        .await?;
    set_sentry_user(&account.id, Some(&account.name));
    Ok(())
}

/// Remove the signed-in account from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_out(session: &Session) -> Result<(), SessionError> {
    session
        .remove::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
        .await?;
    clear_sentry_user();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Request, StatusCode};
    use tower_sessions::session::{Id, Record};
    use tower_sessions::{MemoryStore, SessionStore, session_store};

    use grocer_core::{AccountId, AccountRole};

    use super::*;

    #[derive(Debug, Clone)]
    struct UnreachableStore;

    #[async_trait::async_trait]
    impl SessionStore for UnreachableStore {
        async fn save(&self, _record: &Record) -> session_store::Result<()> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }

        async fn load(&self, _id: &Id) -> session_store::Result<Option<Record>> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }

        async fn delete(&self, _id: &Id) -> session_store::Result<()> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }
    }

    fn parts_with(session: Session) -> Parts {
        let (mut parts, ()) = Request::new(()).into_parts();
        parts.extensions.insert(session);
        parts
    }

    fn shopper() -> CurrentAccount {
        CurrentAccount {
            id: AccountId::new(7),
            name: "Ravi".to_string(),
            phone: "9123456780".parse().unwrap(),
            role: AccountRole::User,
        }
    }

    #[tokio::test]
    async fn test_session_store_outage_is_unavailable() {
        let session = Session::new(Some(Id::default()), Arc::new(UnreachableStore), None);

        let mut parts = parts_with(session.clone());
        let err = RequireAccount::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let mut parts = parts_with(session);
        let err = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_empty_session_is_unauthorized() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut parts = parts_with(session);

        let err = RequireAccount::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signed_in_account_and_role_check() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        sign_in(&session, &shopper()).await.unwrap();

        let mut parts = parts_with(session.clone());
        let RequireAccount(account) = RequireAccount::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(account, shopper());

        let mut parts = parts_with(session);
        let err = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
