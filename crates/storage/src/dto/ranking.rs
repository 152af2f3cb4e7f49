use chrono::{DateTime, Utc};
use engine::StageRanking;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RankingCategory, RankingEntry};

/// Narrows a listing of stored ranking entries across stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingFilter {
    pub stage_id: Option<Uuid>,
    pub edition_id: Option<Uuid>,
    pub competitor_id: Option<Uuid>,
    pub category: Option<RankingCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntryResponse {
    pub stage_id: Uuid,
    pub position: i32,
    pub registration_id: Uuid,
    pub category: RankingCategory,
    pub total_score: Decimal,
    pub largest_fish: Decimal,
    pub counted_fish: i32,
    pub award: Option<String>,
}

impl From<RankingEntry> for RankingEntryResponse {
    fn from(entry: RankingEntry) -> Self {
        Self {
            stage_id: entry.stage_id,
            position: entry.position,
            registration_id: entry.registration_id,
            category: entry.category,
            total_score: entry.total_score,
            largest_fish: entry.largest_fish,
            counted_fish: entry.counted_fish,
            award: entry.award.map(|award| award.label()),
        }
    }
}

/// A stage ranking snapshot split into the overall table and the largest-fish
/// winners. `generated_at` is `None` when no snapshot has been built yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRankingResponse {
    pub stage_id: Uuid,
    pub generated_at: Option<DateTime<Utc>>,
    pub overall: Vec<RankingEntryResponse>,
    pub largest: Vec<RankingEntryResponse>,
}

impl StageRankingResponse {
    /// Groups stored entries by category, overall first, each ordered by position.
    pub fn from_entries(stage_id: Uuid, entries: Vec<RankingEntry>) -> Self {
        let generated_at = entries.iter().map(|entry| entry.generated_at).max();

        let (mut overall, mut largest): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.category == RankingCategory::Overall);

        overall.sort_by_key(|entry| entry.position);
        largest.sort_by_key(|entry| {
            RankingCategory::ALL
                .iter()
                .position(|category| *category == entry.category)
        });

        Self {
            stage_id,
            generated_at,
            overall: overall.into_iter().map(Into::into).collect(),
            largest: largest.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<StageRanking> for StageRankingResponse {
    fn from(ranking: StageRanking) -> Self {
        Self {
            stage_id: ranking.stage_id,
            generated_at: Some(ranking.generated_at),
            overall: ranking.overall.into_iter().map(Into::into).collect(),
            largest: ranking.largest.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Award, Species};

    fn entry(category: RankingCategory, position: i32, award: Option<Award>) -> RankingEntry {
        RankingEntry {
            stage_id: Uuid::nil(),
            registration_id: Uuid::new_v4(),
            position,
            total_score: Decimal::from(100 - position),
            largest_fish: Decimal::from(40),
            counted_fish: 4,
            category,
            award,
            generated_at: Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_entries_are_grouped_by_category() {
        let entries = vec![
            entry(RankingCategory::LargestWolffish, 1, Some(Award::Largest(Species::Wolffish))),
            entry(RankingCategory::Overall, 2, Some(Award::Place(2))),
            entry(RankingCategory::LargestBlue, 1, Some(Award::Largest(Species::BluePeacockBass))),
            entry(RankingCategory::Overall, 1, Some(Award::Place(1))),
        ];

        let response = StageRankingResponse::from_entries(Uuid::nil(), entries);

        assert_eq!(response.overall.len(), 2);
        assert_eq!(response.overall[0].position, 1);
        assert_eq!(response.overall[0].award.as_deref(), Some("1º Lugar"));
        assert_eq!(response.largest[0].category, RankingCategory::LargestBlue);
        assert_eq!(response.largest[1].category, RankingCategory::LargestWolffish);
        assert!(response.generated_at.is_some());
    }

    #[test]
    fn test_empty_snapshot_has_no_timestamp() {
        let response = StageRankingResponse::from_entries(Uuid::nil(), Vec::new());
        assert!(response.generated_at.is_none());
        assert!(response.overall.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["generated_at"], serde_json::Value::Null);
    }
}
