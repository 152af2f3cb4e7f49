//! The fish quota: at most four catches count toward a registration's score.

use crate::error::EligibilityError;
use crate::models::{Capture, Species};

pub const QUOTA_MAX: usize = 4;

/// Validated, not annulled, and flagged to count toward quota and score.
pub fn is_countable(capture: &Capture) -> bool {
    capture.is_valid() && capture.counts_toward_quota && !capture.is_deleted()
}

/// Flag a new catch receives at intake. Wolffish is exempt from the cap.
pub fn counts_toward_quota(species: Species) -> bool {
    !species.is_quota_exempt()
}

/// Number of quota slots already taken by a registration's catches.
pub fn occupied_slots(captures: &[Capture]) -> usize {
    captures
        .iter()
        .filter(|capture| !capture.species.is_quota_exempt() && is_countable(capture))
        .count()
}

/// Refuses a new catch of `species` once the quota is full. Wolffish always passes.
pub fn check_intake(species: Species, existing: &[Capture]) -> Result<(), EligibilityError> {
    if species.is_quota_exempt() {
        return Ok(());
    }
    if occupied_slots(existing) >= QUOTA_MAX {
        return Err(EligibilityError::QuotaReached { max: QUOTA_MAX });
    }
    Ok(())
}
