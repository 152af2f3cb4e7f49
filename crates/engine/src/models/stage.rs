use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Open,
    InProgress,
    Finished,
    Cancelled,
}

impl StageStatus {
    pub const ALL: [StageStatus; 4] = [
        StageStatus::Open,
        StageStatus::InProgress,
        StageStatus::Finished,
        StageStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
        }
    }

    /// `open → in_progress → finished`, and `cancelled` from anything not finished.
    pub fn can_transition_to(&self, next: StageStatus) -> bool {
        use StageStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (InProgress, Finished) | (Open | InProgress, Cancelled)
        )
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "stage status",
                value: s.to_string(),
            })
    }
}

/// A single timed tournament event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub stage_id: Uuid,
    pub edition_id: Option<Uuid>,
    pub name: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub entry_fee: Decimal,
    /// Zero means unlimited.
    pub capacity: i32,
    pub occupied: i32,
    pub status: StageStatus,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Stage {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        starts_at: DateTime<Utc>,
        capacity: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            stage_id: Uuid::new_v4(),
            edition_id: None,
            name: name.into(),
            location: location.into(),
            starts_at,
            entry_fee: Decimal::ZERO,
            capacity,
            occupied: 0,
            status: StageStatus::Open,
            created_at: now,
            deleted_at: None,
        }
    }

    pub fn has_free_slot(&self) -> bool {
        self.capacity == 0 || self.occupied < self.capacity
    }
}
