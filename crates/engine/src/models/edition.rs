use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One season of the tournament. Stages are grouped under an edition, and at
/// most one edition is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edition {
    pub edition_id: Uuid,
    pub year: i32,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Edition {
    pub fn new(year: i32, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            edition_id: Uuid::new_v4(),
            year,
            name: name.into(),
            description: None,
            active: true,
            created_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
