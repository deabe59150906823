//! Service-layer error type
//!
//! `ServiceError` bridges infrastructure errors (`sqlx::Error`, scan and
//! Google failures) and the API-layer `AppError`, so services can use `?`
//! and handlers still answer with a proper `ErrorCode`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::google::GoogleApiError;
use crate::scanner::{MailboxError, ScanError};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: database/infrastructure errors (logged, mapped to DatabaseError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error
    Db(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ScanError> for ServiceError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::Store(store) => ServiceError::Db(store.into()),
            ScanError::Mailbox(MailboxError::Unauthorized(msg)) => {
                tracing::warn!("Inbox authorization failed: {msg}");
                ServiceError::App(AppError::new(ErrorCode::GoogleAuthExpired))
            }
            ScanError::Mailbox(other) => {
                tracing::warn!("Inbox unavailable: {other}");
                ServiceError::App(AppError::with_message(
                    ErrorCode::ProviderError,
                    other.to_string(),
                ))
            }
        }
    }
}

impl From<GoogleApiError> for ServiceError {
    fn from(e: GoogleApiError) -> Self {
        tracing::warn!("Google API error: {e}");
        let code = match e {
            GoogleApiError::AuthExpired => ErrorCode::GoogleAuthExpired,
            _ => ErrorCode::OAuthExchangeFailed,
        };
        ServiceError::App(AppError::new(code))
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(e: impl Into<ServiceError>) -> ErrorCode {
        AppError::from(e.into()).code
    }

    #[test]
    fn scan_errors_map_to_codes() {
        assert_eq!(
            code_of(ScanError::Mailbox(MailboxError::Unauthorized("revoked".into()))),
            ErrorCode::GoogleAuthExpired
        );
        assert_eq!(
            code_of(ScanError::Mailbox(MailboxError::Transport("503".into()))),
            ErrorCode::ProviderError
        );
        assert_eq!(
            code_of(ScanError::Store(sqlx::Error::PoolTimedOut.into())),
            ErrorCode::DatabaseError
        );
    }

    #[test]
    fn google_errors_map_to_codes() {
        assert_eq!(code_of(GoogleApiError::AuthExpired), ErrorCode::GoogleAuthExpired);
        assert_eq!(
            code_of(GoogleApiError::RefreshFailed("x".into())),
            ErrorCode::OAuthExchangeFailed
        );
    }
}
