//! Numbered measuring rulers: generation, the pre-stage draw, and returns.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConflictError, Result, ValidationError};
use crate::models::{Registration, Ruler};

/// How available rulers are matched to waiting registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Lowest ruler number to the first waiting registration, and so on.
    #[default]
    Sequential,
    /// Rulers shuffled with the given seed before pairing. The seed is kept so
    /// the draw can be reproduced.
    Shuffled { seed: u64 },
}

impl FromStr for DrawMode {
    type Err = ValidationError;

    /// Accepts `sequential`, `shuffled` (fresh random seed) or `shuffled:<seed>`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "sequential" => Ok(Self::Sequential),
            None if s == "shuffled" => Ok(Self::Shuffled {
                seed: rand::random(),
            }),
            Some(("shuffled", seed)) => seed
                .parse()
                .map(|seed| Self::Shuffled { seed })
                .map_err(|_| ValidationError::UnknownValue {
                    field: "draw seed",
                    value: seed.to_string(),
                }),
            _ => Err(ValidationError::UnknownValue {
                field: "draw mode",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulerAssignment {
    pub registration_id: Uuid,
    pub ruler_id: Uuid,
    pub ruler_number: i32,
}

/// Creates `count` rulers numbered after the highest existing number of the stage.
pub fn generate_rulers(
    stage_id: Uuid,
    existing: &[Ruler],
    count: i32,
    now: DateTime<Utc>,
) -> Result<Vec<Ruler>> {
    if count < 1 {
        return Err(ValidationError::InvalidRulerCount(count).into());
    }

    let highest = existing
        .iter()
        .filter(|ruler| ruler.stage_id == stage_id)
        .map(|ruler| ruler.number)
        .max()
        .unwrap_or(0);

    Ok((1..=count)
        .map(|offset| Ruler {
            ruler_id: Uuid::new_v4(),
            stage_id,
            number: highest + offset,
            available: true,
            returned: false,
            created_at: now,
        })
        .collect())
}

/// Pairs every registration still without a ruler with an available ruler.
///
/// Registrations are taken in the order given. Fails without assigning
/// anything when there are fewer available rulers than waiting registrations.
pub fn assign_rulers(
    registrations: &[Registration],
    rulers: &[Ruler],
    mode: DrawMode,
) -> Result<Vec<RulerAssignment>> {
    let waiting: Vec<_> = registrations
        .iter()
        .filter(|registration| registration.ruler_id.is_none() && !registration.is_deleted())
        .collect();
    if waiting.is_empty() {
        return Err(ConflictError::NothingToAssign.into());
    }

    let mut available: Vec<_> = rulers.iter().filter(|ruler| ruler.available).collect();
    if available.len() < waiting.len() {
        return Err(ConflictError::InsufficientRulers {
            available: available.len(),
            required: waiting.len(),
        }
        .into());
    }

    available.sort_by_key(|ruler| ruler.number);
    if let DrawMode::Shuffled { seed } = mode {
        available.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    Ok(waiting
        .into_iter()
        .zip(available)
        .map(|(registration, ruler)| RulerAssignment {
            registration_id: registration.registration_id,
            ruler_id: ruler.ruler_id,
            ruler_number: ruler.number,
        })
        .collect())
}

/// Applies one assignment: the registration holds the ruler, the ruler leaves the pool.
pub fn apply_assignment(registration: &Registration, ruler: &Ruler) -> (Registration, Ruler) {
    (
        Registration {
            ruler_id: Some(ruler.ruler_id),
            ..registration.clone()
        },
        Ruler {
            available: false,
            ..ruler.clone()
        },
    )
}

/// Records the ruler coming back after the stage. Returned rulers stay out of
/// the pool; only [`generate_rulers`] adds new available ones.
pub fn return_ruler(
    registration: &Registration,
    ruler: &Ruler,
    now: DateTime<Utc>,
) -> Result<(Registration, Ruler)> {
    let Some(ruler_id) = registration.ruler_id else {
        return Err(ConflictError::NoRulerAssigned.into());
    };
    if ruler_id != ruler.ruler_id {
        return Err(ConflictError::RulerMismatch.into());
    }
    if registration.ruler_returned {
        return Err(ConflictError::RulerAlreadyReturned.into());
    }

    Ok((
        Registration {
            ruler_returned: true,
            ruler_returned_at: Some(now),
            ..registration.clone()
        },
        Ruler {
            returned: true,
            ..ruler.clone()
        },
    ))
}

/// Refuses to delete a ruler that was ever handed out.
///
/// `holders` are the registrations, removed ones included, that reference the
/// ruler.
pub fn ensure_deletable(ruler: &Ruler, holders: &[Registration]) -> Result<()> {
    let referenced = holders
        .iter()
        .any(|registration| registration.ruler_id == Some(ruler.ruler_id));
    if referenced || !ruler.available || ruler.returned {
        return Err(ConflictError::RulerInUse(ruler.number).into());
    }
    Ok(())
}
