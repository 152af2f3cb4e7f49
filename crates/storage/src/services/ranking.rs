use std::collections::HashMap;

use chrono::Utc;
use engine::ranking::build_stage_ranking;
use engine::{Participant, StageRanking};
use uuid::Uuid;

use crate::Database;
use crate::dto::{RankingEntryResponse, RankingFilter, StageRankingResponse};
use crate::error::Result;
use crate::models::{Capture, RankingCategory, Registration};
use crate::repository::{
    CaptureRepository, RankingRepository, RegistrationRepository, StageRepository,
};

/// Pairs registrations with their captures, keeping both orders as loaded.
fn participants(
    registrations: Vec<Registration>,
    captures: Vec<Capture>,
) -> Vec<Participant> {
    let mut by_registration: HashMap<Uuid, Vec<Capture>> = HashMap::new();
    for capture in captures {
        by_registration
            .entry(capture.registration_id)
            .or_default()
            .push(capture);
    }

    registrations
        .into_iter()
        .map(|registration| Participant {
            captures: by_registration
                .remove(&registration.registration_id)
                .unwrap_or_default(),
            registration,
        })
        .collect()
}

/// Rebuilds the stage's ranking snapshot and replaces the stored one.
///
/// Reads run under REPEATABLE READ so every registration and capture comes
/// from the same database snapshot. Concurrent rebuilds wait on the rankings
/// table lock instead of failing with a serialization error.
pub async fn rebuild_stage_ranking(db: &Database, stage_id: Uuid) -> Result<StageRanking> {
    let mut tx = db.pool().begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
        .execute(&mut *tx)
        .await?;
    RankingRepository::new(&mut tx).lock_for_rebuild().await?;

    StageRepository::new(&mut tx).find_by_id(stage_id).await?;
    let registrations = RegistrationRepository::new(&mut tx)
        .list_for_stage(stage_id)
        .await?;
    let captures = CaptureRepository::new(&mut tx).list_for_stage(stage_id).await?;

    let ranking = build_stage_ranking(stage_id, &participants(registrations, captures), Utc::now());
    let stored = RankingRepository::new(&mut tx)
        .replace_for_stage(stage_id, &ranking.clone().into_entries())
        .await?;
    tx.commit().await?;

    tracing::info!(
        "Rebuilt ranking for stage {}: {} ranked, {} species winners, {} rows stored",
        stage_id,
        ranking.overall.len(),
        ranking.largest.len(),
        stored
    );
    Ok(ranking)
}

/// Stored snapshot of a stage, optionally limited to one category.
pub async fn stage_ranking(
    db: &Database,
    stage_id: Uuid,
    category: Option<RankingCategory>,
) -> Result<StageRankingResponse> {
    let mut conn = db.pool().acquire().await?;
    StageRepository::new(&mut conn).find_by_id(stage_id).await?;
    let entries = RankingRepository::new(&mut conn)
        .list_for_stage(stage_id, category)
        .await?;

    Ok(StageRankingResponse::from_entries(stage_id, entries))
}

/// Stored entries across stages, e.g. one competitor's placings over an edition.
pub async fn list_rankings(
    db: &Database,
    filter: &RankingFilter,
) -> Result<Vec<RankingEntryResponse>> {
    let mut conn = db.pool().acquire().await?;
    let entries = RankingRepository::new(&mut conn).list(filter).await?;
    Ok(entries.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::Species;

    fn capture(registration_id: Uuid, size: i64) -> Capture {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        Capture {
            capture_id: Uuid::new_v4(),
            registration_id,
            species: Species::BluePeacockBass,
            original_size: Decimal::from(size),
            penalty: Decimal::ZERO,
            penalty_reason: None,
            final_size: Decimal::from(size),
            evidence_url: "https://videos.example.com/x.mp4".to_string(),
            validated: true,
            validated_by: Some("fiscal".to_string()),
            validated_at: Some(at),
            annulled: false,
            annulment_reason: None,
            counts_toward_quota: true,
            captured_at: at,
            notes: None,
            created_at: at,
            deleted_at: None,
        }
    }

    #[test]
    fn test_participants_keep_registration_and_capture_order() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let stage_id = Uuid::new_v4();
        let first = Registration::new(stage_id, Uuid::new_v4(), now);
        let second = Registration::new(stage_id, Uuid::new_v4(), now);

        let captures = vec![
            capture(second.registration_id, 30),
            capture(first.registration_id, 25),
            capture(second.registration_id, 22),
        ];

        let grouped = participants(vec![first.clone(), second.clone()], captures);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].registration.registration_id, first.registration_id);
        assert_eq!(grouped[0].captures.len(), 1);
        let sizes: Vec<_> = grouped[1].captures.iter().map(|c| c.final_size).collect();
        assert_eq!(sizes, vec![Decimal::from(30), Decimal::from(22)]);
    }

    #[test]
    fn test_registration_without_captures_gets_empty_list() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let registration = Registration::new(Uuid::new_v4(), Uuid::new_v4(), now);

        let grouped = participants(vec![registration], Vec::new());
        assert!(grouped[0].captures.is_empty());
    }
}
