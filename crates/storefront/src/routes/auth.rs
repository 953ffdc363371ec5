//! Session route handlers.

use axum::http::StatusCode;
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::sign_out;

/// Sign the current account out.
///
/// The persisted cart is kept for the next sign-in. Signing out without an
/// account is not an error.
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    sign_out(&session).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to clear session");
        AppError::Internal(format!("session error: {e}"))
    })?;

    Ok(StatusCode::NO_CONTENT)
}
