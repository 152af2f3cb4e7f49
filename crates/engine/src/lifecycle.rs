//! State transitions for competitors, stages and registrations.

use chrono::{DateTime, Utc};

use crate::eligibility::{can_compete, can_register};
use crate::error::{ConflictError, EligibilityError, Result, ValidationError};
use crate::models::{Competitor, PaymentStatus, Registration, Stage, StageStatus};

/// Enrolls `competitor` in `stage`, taking one slot.
///
/// The caller must hold the stage exclusively between reading it and
/// persisting the returned stage, otherwise two registrations could share the
/// last slot.
pub fn register(
    competitor: &Competitor,
    stage: &Stage,
    already_registered: bool,
    now: DateTime<Utc>,
) -> Result<(Registration, Stage)> {
    can_register(stage, now)?;
    can_compete(competitor, now)?;
    if already_registered {
        return Err(ConflictError::AlreadyRegistered.into());
    }

    let registration = Registration {
        amount_paid: stage.entry_fee,
        ..Registration::new(stage.stage_id, competitor.competitor_id, now)
    };
    let stage = Stage {
        occupied: stage.occupied + 1,
        ..stage.clone()
    };
    Ok((registration, stage))
}

fn transition_payment(
    registration: &Registration,
    to: PaymentStatus,
) -> Result<Registration> {
    let from = registration.payment_status;
    if !from.can_transition_to(to) {
        return Err(ConflictError::InvalidPaymentTransition { from, to }.into());
    }
    Ok(Registration {
        payment_status: to,
        ..registration.clone()
    })
}

pub fn confirm_payment(
    registration: &Registration,
    receipt: Option<String>,
    now: DateTime<Utc>,
) -> Result<Registration> {
    let paid = transition_payment(registration, PaymentStatus::Paid)?;
    Ok(Registration {
        paid_at: Some(now),
        payment_receipt: receipt,
        ..paid
    })
}

pub fn cancel_payment(registration: &Registration) -> Result<Registration> {
    transition_payment(registration, PaymentStatus::Cancelled)
}

pub fn refund_payment(registration: &Registration) -> Result<Registration> {
    transition_payment(registration, PaymentStatus::Refunded)
}

/// Elimination is final and independent of the payment status.
pub fn eliminate(
    registration: &Registration,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<Registration> {
    if registration.eliminated {
        return Err(ConflictError::AlreadyEliminated.into());
    }
    if reason.trim().is_empty() {
        return Err(ValidationError::MissingField("reason").into());
    }
    Ok(Registration {
        eliminated: true,
        elimination_reason: Some(reason.to_string()),
        eliminated_at: Some(now),
        ..registration.clone()
    })
}

pub fn ban(competitor: &Competitor, reason: &str, now: DateTime<Utc>) -> Result<Competitor> {
    if competitor.banned {
        return Err(ConflictError::AlreadyBanned.into());
    }
    if reason.trim().is_empty() {
        return Err(ValidationError::MissingField("reason").into());
    }
    Ok(Competitor {
        banned: true,
        ban_reason: Some(reason.to_string()),
        banned_at: Some(now),
        ..competitor.clone()
    })
}

pub fn unban(competitor: &Competitor) -> Result<Competitor> {
    if !competitor.banned {
        return Err(ConflictError::NotBanned.into());
    }
    Ok(Competitor {
        banned: false,
        ban_reason: None,
        banned_at: None,
        ..competitor.clone()
    })
}

/// Profile fields an organizer may correct. `None` leaves the field as it is.
///
/// Ban state and removal have their own operations and are not editable here.
#[derive(Debug, Clone, Default)]
pub struct CompetitorChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub license_number: Option<String>,
    pub license_expires_at: Option<DateTime<Utc>>,
    pub active: Option<bool>,
}

impl CompetitorChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.license_number.is_none()
            && self.license_expires_at.is_none()
            && self.active.is_none()
    }
}

pub fn update_competitor(competitor: &Competitor, changes: CompetitorChanges) -> Result<Competitor> {
    if competitor.is_deleted() {
        return Err(EligibilityError::CompetitorRemoved.into());
    }
    if changes.is_empty() {
        return Err(ValidationError::NothingToUpdate.into());
    }
    if changes.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ValidationError::MissingField("name").into());
    }
    if changes.email.as_deref().is_some_and(|email| email.trim().is_empty()) {
        return Err(ValidationError::MissingField("email").into());
    }

    let current = competitor.clone();
    Ok(Competitor {
        name: changes.name.unwrap_or(current.name),
        email: changes.email.unwrap_or(current.email),
        license_number: changes.license_number.or(current.license_number),
        license_expires_at: changes.license_expires_at.or(current.license_expires_at),
        active: changes.active.unwrap_or(current.active),
        ..current
    })
}

/// Soft delete: the record stays but is filtered out everywhere.
pub fn remove_competitor(competitor: &Competitor, now: DateTime<Utc>) -> Competitor {
    Competitor {
        deleted_at: Some(competitor.deleted_at.unwrap_or(now)),
        ..competitor.clone()
    }
}

pub fn transition_stage(stage: &Stage, to: StageStatus) -> Result<Stage> {
    let from = stage.status;
    if !from.can_transition_to(to) {
        return Err(ConflictError::InvalidStageTransition { from, to }.into());
    }
    Ok(Stage {
        status: to,
        ..stage.clone()
    })
}
