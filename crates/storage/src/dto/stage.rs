use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Stage, StageStatus};

/// Request payload for scheduling a stage. A capacity of 0 means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStageRequest {
    /// Edition the stage belongs to. Must exist when given.
    #[serde(default)]
    pub edition_id: Option<Uuid>,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    pub location: String,

    pub starts_at: DateTime<Utc>,

    #[validate(custom(function = "validate_fee"))]
    #[serde(default)]
    pub entry_fee: Decimal,

    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    #[serde(default)]
    pub capacity: i32,
}

fn validate_fee(fee: &Decimal) -> Result<(), validator::ValidationError> {
    if *fee < Decimal::ZERO {
        return Err(validator::ValidationError::new("negative_entry_fee"));
    }
    Ok(())
}

impl CreateStageRequest {
    pub fn into_stage(self, now: DateTime<Utc>) -> Stage {
        Stage {
            edition_id: self.edition_id,
            entry_fee: self.entry_fee,
            ..Stage::new(self.name, self.location, self.starts_at, self.capacity, now)
        }
    }
}

/// Narrows a stage listing. Results come in start order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageFilter {
    pub edition_id: Option<Uuid>,
    pub status: Option<StageStatus>,
}
