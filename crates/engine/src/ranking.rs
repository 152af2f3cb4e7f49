//! Stage rankings: the overall table and the largest fish of each species.
//!
//! Builders read registrations and captures and never modify them. The result
//! is a snapshot that replaces any earlier snapshot of the same stage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::eligibility::can_participate;
use crate::models::{Award, Capture, RankingCategory, RankingEntry, Registration, Species};
use crate::quota::is_countable;
use crate::score::compute_score;

/// A registration together with its captures in creation order.
#[derive(Debug, Clone)]
pub struct Participant {
    pub registration: Registration,
    pub captures: Vec<Capture>,
}

impl Participant {
    fn is_ranked_in(&self, stage_id: Uuid) -> bool {
        self.registration.stage_id == stage_id
            && !self.registration.is_deleted()
            && can_participate(&self.registration)
    }

    fn largest_countable(&self) -> Decimal {
        self.captures
            .iter()
            .filter(|capture| is_countable(capture))
            .map(|capture| capture.final_size)
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Full snapshot of a stage's rankings.
#[derive(Debug, Clone, Serialize)]
pub struct StageRanking {
    pub stage_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub overall: Vec<RankingEntry>,
    /// At most one entry per species, in [`Species::ALL`] order.
    pub largest: Vec<RankingEntry>,
}

impl StageRanking {
    pub fn into_entries(self) -> Vec<RankingEntry> {
        self.overall.into_iter().chain(self.largest).collect()
    }
}

/// Ranks eligible registrations by total score, highest first.
///
/// Equal totals keep the order in which `participants` were given; there is no
/// secondary key. Callers wanting reproducible output pass participants sorted
/// by registration time. Awards go to positions 1 to 3 regardless of ties.
pub fn build_overall_ranking(
    stage_id: Uuid,
    participants: &[Participant],
    now: DateTime<Utc>,
) -> Vec<RankingEntry> {
    let mut standings: Vec<_> = participants
        .iter()
        .filter(|participant| participant.is_ranked_in(stage_id))
        .map(|participant| {
            let score = compute_score(&participant.captures);
            (participant, score, participant.largest_countable())
        })
        .collect();

    // sort_by is stable
    standings.sort_by(|a, b| b.1.total.cmp(&a.1.total));

    standings
        .into_iter()
        .enumerate()
        .map(|(index, (participant, score, largest))| RankingEntry {
            stage_id,
            registration_id: participant.registration.registration_id,
            position: index as i32 + 1,
            total_score: score.total,
            largest_fish: largest,
            counted_fish: score.counted_fish,
            category: RankingCategory::Overall,
            award: Award::for_position(index + 1),
            generated_at: now,
        })
        .collect()
}

/// The single largest validated, non-annulled catch of `species` in the stage.
///
/// Quota exemption does not matter here, so wolffish competes for its own
/// category. Equal sizes go to the catch made first; if that ties too, the
/// earlier one in input order wins.
pub fn build_species_ranking(
    stage_id: Uuid,
    participants: &[Participant],
    species: Species,
    now: DateTime<Utc>,
) -> Option<RankingEntry> {
    let best = participants
        .iter()
        .filter(|participant| participant.is_ranked_in(stage_id))
        .flat_map(|participant| participant.captures.iter())
        .filter(|capture| capture.species == species && capture.is_valid() && !capture.is_deleted())
        .fold(None::<&Capture>, |best, capture| match best {
            Some(current)
                if current.final_size > capture.final_size
                    || (current.final_size == capture.final_size
                        && current.captured_at <= capture.captured_at) =>
            {
                Some(current)
            }
            _ => Some(capture),
        })?;

    Some(RankingEntry {
        stage_id,
        registration_id: best.registration_id,
        position: 1,
        total_score: Decimal::ZERO,
        largest_fish: best.final_size,
        counted_fish: 1,
        category: RankingCategory::largest(species),
        award: Some(Award::Largest(species)),
        generated_at: now,
    })
}

/// Overall table plus every species category, stamped with one timestamp.
pub fn build_stage_ranking(
    stage_id: Uuid,
    participants: &[Participant],
    now: DateTime<Utc>,
) -> StageRanking {
    let overall = build_overall_ranking(stage_id, participants, now);
    let largest = Species::ALL
        .into_iter()
        .filter_map(|species| build_species_ranking(stage_id, participants, species, now))
        .collect();

    StageRanking {
        stage_id,
        generated_at: now,
        overall,
        largest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::annul_capture;
    use crate::fixtures::{minutes, now, paid_registration_in, validated_capture};
    use crate::models::PaymentStatus;

    fn participant(stage_id: Uuid, offset: i64, sizes: &[i64]) -> Participant {
        let registration = paid_registration_in(stage_id, offset);
        let captures = sizes
            .iter()
            .map(|&size| validated_capture(&registration, Species::BluePeacockBass, size))
            .collect();
        Participant {
            registration,
            captures,
        }
    }

    #[test]
    fn test_ties_keep_input_order_and_awards_follow_position() {
        let stage_id = Uuid::new_v4();
        let participants = vec![
            participant(stage_id, 0, &[25, 25]),
            participant(stage_id, 1, &[40, 40]),
            participant(stage_id, 2, &[30, 50]),
        ];

        let ranking = build_overall_ranking(stage_id, &participants, now());

        let order: Vec<_> = ranking.iter().map(|e| e.registration_id).collect();
        assert_eq!(
            order,
            vec![
                participants[1].registration.registration_id,
                participants[2].registration.registration_id,
                participants[0].registration.registration_id,
            ]
        );
        let totals: Vec<_> = ranking.iter().map(|e| e.total_score).collect();
        assert_eq!(
            totals,
            vec![Decimal::from(80), Decimal::from(80), Decimal::from(50)]
        );
        let positions: Vec<_> = ranking.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        let labels: Vec<_> = ranking
            .iter()
            .map(|e| e.award.map(|a| a.label()))
            .collect();
        assert_eq!(
            labels,
            vec![
                Some("1º Lugar".to_string()),
                Some("2º Lugar".to_string()),
                Some("3º Lugar".to_string()),
            ]
        );
    }

    #[test]
    fn test_only_podium_gets_awards() {
        let stage_id = Uuid::new_v4();
        let participants: Vec<_> = (0..5)
            .map(|i| participant(stage_id, i, &[30 + i]))
            .collect();

        let ranking = build_overall_ranking(stage_id, &participants, now());
        assert_eq!(ranking.len(), 5);
        assert!(ranking[2].award.is_some());
        assert!(ranking[3].award.is_none());
        assert!(ranking[4].award.is_none());
        assert_eq!(ranking[0].total_score, Decimal::from(34));
    }

    #[test]
    fn test_unpaid_eliminated_and_foreign_registrations_excluded() {
        let stage_id = Uuid::new_v4();
        let mut unpaid = participant(stage_id, 0, &[40]);
        unpaid.registration.payment_status = PaymentStatus::Pending;
        let mut eliminated = participant(stage_id, 1, &[45]);
        eliminated.registration.eliminated = true;
        let foreign = participant(Uuid::new_v4(), 2, &[50]);
        let mut removed = participant(stage_id, 3, &[55]);
        removed.registration.deleted_at = Some(now());
        let eligible = participant(stage_id, 4, &[21]);

        let ranking = build_overall_ranking(
            stage_id,
            &[unpaid, eliminated, foreign, removed, eligible.clone()],
            now(),
        );

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].registration_id, eligible.registration.registration_id);
    }

    #[test]
    fn test_largest_fish_uses_countable_catches() {
        let stage_id = Uuid::new_v4();
        let mut p = participant(stage_id, 0, &[30, 44]);
        p.captures[1] = annul_capture(&p.captures[1], "fora do horário");
        p.captures
            .push(validated_capture(&p.registration, Species::Wolffish, 60));

        let ranking = build_overall_ranking(stage_id, &[p], now());
        assert_eq!(ranking[0].largest_fish, Decimal::from(30));
        assert_eq!(ranking[0].counted_fish, 1);
    }

    #[test]
    fn test_participant_without_catches_ranks_with_zero() {
        let stage_id = Uuid::new_v4();
        let ranking = build_overall_ranking(stage_id, &[participant(stage_id, 0, &[])], now());
        assert_eq!(ranking[0].total_score, Decimal::ZERO);
        assert_eq!(ranking[0].largest_fish, Decimal::ZERO);
    }

    #[test]
    fn test_species_ranking_picks_largest() {
        let stage_id = Uuid::new_v4();
        let a = participant(stage_id, 0, &[30, 35]);
        let b = participant(stage_id, 1, &[41]);

        let entry = build_species_ranking(
            stage_id,
            &[a, b.clone()],
            Species::BluePeacockBass,
            now(),
        )
        .unwrap();

        assert_eq!(entry.registration_id, b.registration.registration_id);
        assert_eq!(entry.largest_fish, Decimal::from(41));
        assert_eq!(entry.position, 1);
        assert_eq!(entry.category, RankingCategory::LargestBlue);
        assert_eq!(
            entry.award.map(|a| a.label()),
            Some("Maior Tucunaré Azul".to_string())
        );
    }

    #[test]
    fn test_species_ranking_tie_goes_to_earliest_catch() {
        let stage_id = Uuid::new_v4();
        let mut late = participant(stage_id, 0, &[38]);
        late.captures[0].captured_at = now() + minutes(90);
        let mut early = participant(stage_id, 1, &[38]);
        early.captures[0].captured_at = now() + minutes(10);

        let entry =
            build_species_ranking(stage_id, &[late, early.clone()], Species::BluePeacockBass, now())
                .unwrap();
        assert_eq!(entry.registration_id, early.registration.registration_id);
    }

    #[test]
    fn test_wolffish_category_despite_quota_exemption() {
        let stage_id = Uuid::new_v4();
        let mut p = participant(stage_id, 0, &[]);
        p.captures
            .push(validated_capture(&p.registration, Species::Wolffish, 52));

        let entry = build_species_ranking(stage_id, &[p], Species::Wolffish, now()).unwrap();
        assert_eq!(entry.largest_fish, Decimal::from(52));
        assert_eq!(entry.category, RankingCategory::LargestWolffish);
    }

    #[test]
    fn test_species_ranking_empty_when_no_valid_catch() {
        let stage_id = Uuid::new_v4();
        let mut p = participant(stage_id, 0, &[33]);
        p.captures[0] = annul_capture(&p.captures[0], "sem régua");

        assert!(build_species_ranking(stage_id, &[p], Species::BluePeacockBass, now()).is_none());
    }

    #[test]
    fn test_stage_ranking_is_idempotent() {
        let stage_id = Uuid::new_v4();
        let mut p = participant(stage_id, 0, &[30]);
        p.captures
            .push(validated_capture(&p.registration, Species::YellowPeacockBass, 27));
        let participants = vec![p, participant(stage_id, 1, &[44])];

        let first = build_stage_ranking(stage_id, &participants, now());
        let second = build_stage_ranking(stage_id, &participants, now());

        assert_eq!(first.overall, second.overall);
        assert_eq!(first.largest, second.largest);
        assert_eq!(first.largest.len(), 2);
        assert_eq!(first.clone().into_entries().len(), 4);
    }
}
