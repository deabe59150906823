//! Unified error codes for SpendShred
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Subscription errors
//! - 4xxx: Integration errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the frontend can switch
/// on them without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// User referenced by a token no longer exists
    UserNotFound = 1005,
    /// Email is already registered
    EmailAlreadyRegistered = 1006,
    /// Password too short
    PasswordTooShort = 1008,
    /// Too many attempts
    TooManyAttempts = 1009,

    // ==================== 3xxx: Subscription ====================
    /// Subscription not found
    SubscriptionNotFound = 3001,
    /// Seat counts violate 0 <= seats_unused <= seats_total, seats_total >= 1
    SubscriptionInvalidSeats = 3002,
    /// Amount is negative or not finite
    SubscriptionInvalidAmount = 3003,
    /// Subscription name is empty
    SubscriptionNameRequired = 3004,

    // ==================== 4xxx: Integration ====================
    /// Gmail account has not been connected
    GmailNotConnected = 4001,
    /// Stored Google credential was rejected and could not be refreshed
    GoogleAuthExpired = 4002,
    /// Google OAuth code exchange failed
    OAuthExchangeFailed = 4003,
    /// Upstream provider returned an error
    ProviderError = 4004,
    /// Third-party integration rejected the connection
    IntegrationConnectionFailed = 4005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailAlreadyRegistered => "Email already registered",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::TooManyAttempts => "Too many attempts",

            // Subscription
            ErrorCode::SubscriptionNotFound => "Subscription not found",
            ErrorCode::SubscriptionInvalidSeats => "Invalid seat counts",
            ErrorCode::SubscriptionInvalidAmount => "Amount must be a non-negative number",
            ErrorCode::SubscriptionNameRequired => "Subscription name is required",

            // Integration
            ErrorCode::GmailNotConnected => "Gmail not connected",
            ErrorCode::GoogleAuthExpired => "Google authorization expired, reconnect Gmail",
            ErrorCode::OAuthExchangeFailed => "Google sign-in failed",
            ErrorCode::ProviderError => "Upstream provider error",
            ErrorCode::IntegrationConnectionFailed => "Invalid API Key or Connection Failed",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::UserNotFound),
            1006 => Ok(ErrorCode::EmailAlreadyRegistered),
            1008 => Ok(ErrorCode::PasswordTooShort),
            1009 => Ok(ErrorCode::TooManyAttempts),

            // Subscription
            3001 => Ok(ErrorCode::SubscriptionNotFound),
            3002 => Ok(ErrorCode::SubscriptionInvalidSeats),
            3003 => Ok(ErrorCode::SubscriptionInvalidAmount),
            3004 => Ok(ErrorCode::SubscriptionNameRequired),

            // Integration
            4001 => Ok(ErrorCode::GmailNotConnected),
            4002 => Ok(ErrorCode::GoogleAuthExpired),
            4003 => Ok(ErrorCode::OAuthExchangeFailed),
            4004 => Ok(ErrorCode::ProviderError),
            4005 => Ok(ErrorCode::IntegrationConnectionFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
