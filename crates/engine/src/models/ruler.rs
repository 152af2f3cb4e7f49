use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A numbered physical measuring ruler handed to a competitor for a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruler {
    pub ruler_id: Uuid,
    pub stage_id: Uuid,
    pub number: i32,
    pub available: bool,
    pub returned: bool,
    pub created_at: DateTime<Utc>,
}
