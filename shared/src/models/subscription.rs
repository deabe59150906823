//! Subscription Model

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// Team assigned to subscriptions created without one
pub const DEFAULT_TEAM: &str = "Unassigned";

/// `last_used` marker for records that carry no usage information
pub const UNKNOWN_LAST_USED: &str = "Unknown";

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum SubscriptionStatus {
    #[default]
    Active,
    /// Paid for but apparently unused
    Zombie,
    Critical,
    Cancelled,
}

impl SubscriptionStatus {
    /// Zombie and critical subscriptions count their whole amount as waste
    pub fn is_wasteful(&self) -> bool {
        matches!(self, Self::Zombie | Self::Critical)
    }
}

/// Subscription entity
///
/// `name` is the natural key used to deduplicate inbox findings. It is
/// indexed but not unique: uniqueness is only maintained by lookup before
/// insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    pub team: String,
    /// Monthly cost; `0.0` means unknown
    pub amount: f64,
    pub seats_total: i32,
    pub seats_unused: i32,
    pub status: SubscriptionStatus,
    /// Free-text marker ("2024-05-01", "Long time ago", "2h ago")
    pub last_used: String,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Check amount and seat invariants
    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(
            &self.name,
            self.amount,
            self.seats_total,
            self.seats_unused,
        )
    }
}

/// Create subscription payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCreate {
    pub name: String,
    pub team: Option<String>,
    pub amount: f64,
    pub seats_total: i32,
    pub seats_unused: i32,
    pub status: Option<SubscriptionStatus>,
    pub last_used: Option<String>,
}

impl SubscriptionCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(
            &self.name,
            self.amount,
            self.seats_total,
            self.seats_unused,
        )
    }
}

/// Update subscription payload (PATCH semantics: absent fields are kept)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub name: Option<String>,
    pub team: Option<String>,
    pub amount: Option<f64>,
    pub seats_total: Option<i32>,
    pub seats_unused: Option<i32>,
    pub status: Option<SubscriptionStatus>,
    pub last_used: Option<String>,
}

impl SubscriptionUpdate {
    /// Merge this patch into `sub`
    pub fn apply_to(self, sub: &mut Subscription) {
        if let Some(name) = self.name {
            sub.name = name;
        }
        if let Some(team) = self.team {
            sub.team = team;
        }
        if let Some(amount) = self.amount {
            sub.amount = amount;
        }
        if let Some(seats_total) = self.seats_total {
            sub.seats_total = seats_total;
        }
        if let Some(seats_unused) = self.seats_unused {
            sub.seats_unused = seats_unused;
        }
        if let Some(status) = self.status {
            sub.status = status;
        }
        if let Some(last_used) = self.last_used {
            sub.last_used = last_used;
        }
    }
}

fn validate_fields(
    name: &str,
    amount: f64,
    seats_total: i32,
    seats_unused: i32,
) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::new(ErrorCode::SubscriptionNameRequired));
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::new(ErrorCode::SubscriptionInvalidAmount).with_detail("amount", amount));
    }
    if seats_total < 1 || seats_unused < 0 || seats_unused > seats_total {
        return Err(AppError::new(ErrorCode::SubscriptionInvalidSeats)
            .with_detail("seats_total", seats_total)
            .with_detail("seats_unused", seats_unused));
    }
    Ok(())
}
