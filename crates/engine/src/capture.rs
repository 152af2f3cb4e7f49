//! Catch intake and officiating: create, validate with a penalty, annul.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::eligibility::check_participation;
use crate::error::{ConflictError, EngineError, Result, ValidationError};
use crate::models::{Capture, Registration, Species};
use crate::quota;

/// Largest penalty an official may apply, in size units.
pub const MAX_PENALTY: i64 = 3;

/// Decimal places kept for sizes and penalties, matching the stored columns.
pub const SIZE_SCALE: u32 = 2;

/// A catch as submitted by a competitor.
#[derive(Debug, Clone)]
pub struct NewCapture {
    pub species: Species,
    pub original_size: Decimal,
    pub evidence_url: String,
    pub captured_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// An official's decision on a pending catch.
#[derive(Debug, Clone)]
pub struct Officiating {
    pub validator: String,
    pub penalty: Decimal,
    pub penalty_reason: Option<String>,
}

/// `max(0, original - penalty)`.
pub fn final_size(original: Decimal, penalty: Decimal) -> Decimal {
    (original - penalty).max(Decimal::ZERO)
}

pub fn meets_minimum_size(species: Species, size: Decimal) -> bool {
    species.minimum_size().is_none_or(|minimum| size >= minimum)
}

/// True when `value` survives storage unchanged. Trailing zeros do not count.
pub fn fits_scale(value: Decimal) -> bool {
    value.normalize().scale() <= SIZE_SCALE
}

fn check_scale(field: &'static str, value: Decimal) -> std::result::Result<(), ValidationError> {
    if !fits_scale(value) {
        return Err(ValidationError::TooPrecise { field, value });
    }
    Ok(())
}

fn check_penalty(penalty: Decimal) -> std::result::Result<(), ValidationError> {
    if penalty < Decimal::ZERO || penalty > Decimal::from(MAX_PENALTY) {
        return Err(ValidationError::PenaltyOutOfRange(penalty));
    }
    check_scale("penalty", penalty)
}

/// Builds a new pending catch for `registration`.
///
/// `existing` are the registration's current catches, used for the quota check.
pub fn create_capture(
    registration: &Registration,
    existing: &[Capture],
    new: NewCapture,
    now: DateTime<Utc>,
) -> Result<Capture> {
    check_participation(registration)?;

    if new.original_size < Decimal::ZERO {
        return Err(ValidationError::NegativeSize(new.original_size).into());
    }
    check_scale("original_size", new.original_size)?;
    if new.evidence_url.trim().is_empty() {
        return Err(ValidationError::MissingField("evidence_url").into());
    }

    quota::check_intake(new.species, existing)?;

    Ok(Capture {
        capture_id: Uuid::new_v4(),
        registration_id: registration.registration_id,
        species: new.species,
        original_size: new.original_size,
        penalty: Decimal::ZERO,
        penalty_reason: None,
        final_size: new.original_size,
        evidence_url: new.evidence_url,
        validated: false,
        validated_by: None,
        validated_at: None,
        annulled: false,
        annulment_reason: None,
        counts_toward_quota: quota::counts_toward_quota(new.species),
        captured_at: new.captured_at.unwrap_or(now),
        notes: new.notes,
        created_at: now,
        deleted_at: None,
    })
}

/// Applies an official's decision. The input capture is left untouched on failure.
pub fn validate_capture(
    capture: &Capture,
    decision: Officiating,
    now: DateTime<Utc>,
) -> Result<Capture> {
    if capture.validated {
        return Err(ConflictError::AlreadyValidated.into());
    }
    if decision.validator.trim().is_empty() {
        return Err(ValidationError::MissingField("validator").into());
    }
    check_penalty(decision.penalty)?;

    let size = final_size(capture.original_size, decision.penalty);
    if let Some(minimum) = capture.species.minimum_size()
        && size < minimum
    {
        return Err(ValidationError::BelowMinimumSize {
            final_size: size,
            minimum,
        }
        .into());
    }

    Ok(Capture {
        validated: true,
        validated_by: Some(decision.validator),
        validated_at: Some(now),
        penalty: decision.penalty,
        penalty_reason: decision.penalty_reason,
        final_size: size,
        ..capture.clone()
    })
}

/// Marks a capture annulled. Calling it again only replaces the reason.
pub fn annul_capture(capture: &Capture, reason: impl Into<String>) -> Capture {
    Capture {
        annulled: true,
        annulment_reason: Some(reason.into()),
        ..capture.clone()
    }
}

/// [`annul_capture`] for callers that must not annul twice.
pub fn annul_once(capture: &Capture, reason: impl Into<String>) -> Result<Capture> {
    if capture.annulled {
        return Err(ConflictError::AlreadyAnnulled.into());
    }
    let reason = reason.into();
    if reason.trim().is_empty() {
        return Err(EngineError::from(ValidationError::MissingField("reason")));
    }
    Ok(annul_capture(capture, reason))
}

/// Tombstones a capture so it drops out of every count.
pub fn remove_capture(capture: &Capture, now: DateTime<Utc>) -> Capture {
    Capture {
        deleted_at: Some(now),
        ..capture.clone()
    }
}
