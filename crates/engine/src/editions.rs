//! Tournament editions (seasons) and the single active edition.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ConflictError, EngineError, Entity, Result, ValidationError};
use crate::models::Edition;

/// Accepted edition years.
pub const YEARS: std::ops::RangeInclusive<i32> = 2000..=2100;

#[derive(Debug, Clone)]
pub struct NewEdition {
    pub year: i32,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

/// Builds a new edition.
///
/// When the new edition is active, every other active edition comes back
/// deactivated in the second element so the caller can persist both sides of
/// the switch together.
pub fn create_edition(
    new: NewEdition,
    existing: &[Edition],
    now: DateTime<Utc>,
) -> Result<(Edition, Vec<Edition>)> {
    if new.name.trim().is_empty() {
        return Err(ValidationError::MissingField("name").into());
    }
    if !YEARS.contains(&new.year) {
        return Err(ValidationError::InvalidYear(new.year).into());
    }
    if existing
        .iter()
        .any(|edition| !edition.is_deleted() && edition.year == new.year)
    {
        return Err(ConflictError::EditionYearTaken(new.year).into());
    }

    let edition = Edition {
        description: new.description,
        active: new.active,
        ..Edition::new(new.year, new.name, now)
    };
    let deactivated = if edition.active {
        deactivate_others(existing, edition.edition_id)
    } else {
        Vec::new()
    };
    Ok((edition, deactivated))
}

/// Makes `edition_id` the active edition. Returns every record that changed,
/// the activated edition first. Activating the active edition changes nothing.
pub fn activate_edition(editions: &[Edition], edition_id: Uuid) -> Result<Vec<Edition>> {
    let target = editions
        .iter()
        .find(|edition| edition.edition_id == edition_id && !edition.is_deleted())
        .ok_or(EngineError::NotFound(Entity::Edition))?;

    let mut changed = Vec::new();
    if !target.active {
        changed.push(Edition {
            active: true,
            ..target.clone()
        });
    }
    changed.extend(deactivate_others(editions, edition_id));
    Ok(changed)
}

fn deactivate_others(editions: &[Edition], keep: Uuid) -> Vec<Edition> {
    editions
        .iter()
        .filter(|edition| edition.active && edition.edition_id != keep)
        .map(|edition| Edition {
            active: false,
            ..edition.clone()
        })
        .collect()
}

/// The live active edition. Should stored data ever hold more than one, the
/// most recent year wins.
pub fn active_edition(editions: &[Edition]) -> Option<&Edition> {
    editions
        .iter()
        .filter(|edition| edition.active && !edition.is_deleted())
        .max_by_key(|edition| edition.year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::now;

    fn new_edition(year: i32, active: bool) -> NewEdition {
        NewEdition {
            year,
            name: format!("Copa {year}"),
            description: None,
            active,
        }
    }

    fn edition(year: i32, active: bool) -> Edition {
        Edition {
            active,
            ..Edition::new(year, format!("Copa {year}"), now())
        }
    }

    #[test]
    fn test_create_active_edition_deactivates_previous() {
        let previous = edition(2025, true);
        let older = edition(2024, false);

        let (created, deactivated) =
            create_edition(new_edition(2026, true), &[previous.clone(), older], now()).unwrap();

        assert!(created.active);
        assert_eq!(created.year, 2026);
        assert_eq!(deactivated.len(), 1);
        assert_eq!(deactivated[0].edition_id, previous.edition_id);
        assert!(!deactivated[0].active);
    }

    #[test]
    fn test_create_inactive_edition_leaves_others() {
        let previous = edition(2025, true);
        let (created, deactivated) =
            create_edition(new_edition(2027, false), &[previous], now()).unwrap();
        assert!(!created.active);
        assert!(deactivated.is_empty());
    }

    #[test]
    fn test_create_rejects_taken_year_and_bad_input() {
        let existing = [edition(2026, true)];
        assert_eq!(
            create_edition(new_edition(2026, false), &existing, now()).unwrap_err(),
            ConflictError::EditionYearTaken(2026).into()
        );

        let mut removed = edition(2026, false);
        removed.deleted_at = Some(now());
        assert!(create_edition(new_edition(2026, false), &[removed], now()).is_ok());

        assert_eq!(
            create_edition(new_edition(1899, true), &[], now()).unwrap_err(),
            ValidationError::InvalidYear(1899).into()
        );

        let mut unnamed = new_edition(2026, true);
        unnamed.name = " ".to_string();
        assert_eq!(
            create_edition(unnamed, &[], now()).unwrap_err(),
            ValidationError::MissingField("name").into()
        );
    }

    #[test]
    fn test_activate_switches_active_edition() {
        let current = edition(2025, true);
        let next = edition(2026, false);
        let editions = [current.clone(), next.clone()];

        let changed = activate_edition(&editions, next.edition_id).unwrap();
        assert_eq!(changed.len(), 2);
        assert_eq!(changed[0].edition_id, next.edition_id);
        assert!(changed[0].active);
        assert_eq!(changed[1].edition_id, current.edition_id);
        assert!(!changed[1].active);

        assert!(activate_edition(&editions, current.edition_id).unwrap().is_empty());
    }

    #[test]
    fn test_activate_unknown_edition_is_not_found() {
        assert_eq!(
            activate_edition(&[edition(2025, true)], Uuid::new_v4()).unwrap_err(),
            EngineError::NotFound(Entity::Edition)
        );
    }

    #[test]
    fn test_active_edition_prefers_latest_live_year() {
        let mut removed = edition(2027, true);
        removed.deleted_at = Some(now());
        let editions = [edition(2024, true), edition(2026, true), edition(2025, false), removed];

        assert_eq!(active_edition(&editions).map(|e| e.year), Some(2026));
        assert!(active_edition(&[edition(2025, false)]).is_none());
    }
}
