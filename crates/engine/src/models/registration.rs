use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Cancelled,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// `pending → paid → {cancelled, refunded}`; nothing returns to pending.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!((self, next), (Pending, Paid) | (Paid, Cancelled) | (Paid, Refunded))
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "payment status",
                value: s.to_string(),
            })
    }
}

/// A competitor's enrollment in one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub registration_id: Uuid,
    pub stage_id: Uuid,
    pub competitor_id: Uuid,
    pub ruler_id: Option<Uuid>,
    pub registered_at: DateTime<Utc>,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_receipt: Option<String>,
    pub eliminated: bool,
    pub elimination_reason: Option<String>,
    pub eliminated_at: Option<DateTime<Utc>>,
    pub ruler_returned: bool,
    pub ruler_returned_at: Option<DateTime<Utc>>,
    pub total_score: Decimal,
    pub counted_fish: i32,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Registration {
    pub fn new(stage_id: Uuid, competitor_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            registration_id: Uuid::new_v4(),
            stage_id,
            competitor_id,
            ruler_id: None,
            registered_at: now,
            amount_paid: Decimal::ZERO,
            payment_status: PaymentStatus::Pending,
            paid_at: None,
            payment_receipt: None,
            eliminated: false,
            elimination_reason: None,
            eliminated_at: None,
            ruler_returned: false,
            ruler_returned_at: None,
            total_score: Decimal::ZERO,
            counted_fish: 0,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
