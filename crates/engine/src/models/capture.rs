use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Species;

/// One video-evidenced catch tied to a registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub capture_id: Uuid,
    pub registration_id: Uuid,
    pub species: Species,
    pub original_size: Decimal,
    pub penalty: Decimal,
    pub penalty_reason: Option<String>,
    pub final_size: Decimal,
    pub evidence_url: String,
    pub validated: bool,
    pub validated_by: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub annulled: bool,
    pub annulment_reason: Option<String>,
    pub counts_toward_quota: bool,
    pub captured_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Capture {
    /// Validated and not annulled.
    pub fn is_valid(&self) -> bool {
        self.validated && !self.annulled
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
