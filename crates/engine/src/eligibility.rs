//! Permission predicates for competitors, stages and registrations.
//!
//! Each check returns the first reason the action is refused. The clock is
//! always passed in so the same record can be judged at any instant.

use chrono::{DateTime, Utc};

use crate::error::EligibilityError;
use crate::models::{Competitor, PaymentStatus, Registration, Stage, StageStatus};

/// Whether a competitor may enter a stage.
///
/// The license is checked first so an expired license is always reported as
/// such. Banned or inactive competitors fail even with a valid license.
pub fn can_compete(competitor: &Competitor, now: DateTime<Utc>) -> Result<(), EligibilityError> {
    if !competitor.has_valid_license(now) {
        return Err(EligibilityError::LicenseExpired);
    }
    if competitor.is_deleted() {
        return Err(EligibilityError::CompetitorRemoved);
    }
    if !competitor.active {
        return Err(EligibilityError::CompetitorInactive);
    }
    if competitor.banned {
        return Err(EligibilityError::CompetitorBanned);
    }
    Ok(())
}

/// Whether a stage currently accepts registrations.
pub fn can_register(stage: &Stage, now: DateTime<Utc>) -> Result<(), EligibilityError> {
    if stage.status != StageStatus::Open {
        return Err(EligibilityError::StageNotOpen(stage.status));
    }
    if !stage.has_free_slot() {
        return Err(EligibilityError::StageFull {
            capacity: stage.capacity,
        });
    }
    if now >= stage.starts_at {
        return Err(EligibilityError::StageAlreadyStarted);
    }
    Ok(())
}

/// Paid and not eliminated. Gates catch submission and ranking inclusion.
pub fn can_participate(registration: &Registration) -> bool {
    check_participation(registration).is_ok()
}

/// [`can_participate`] with the refusal reason.
pub fn check_participation(registration: &Registration) -> Result<(), EligibilityError> {
    if registration.payment_status != PaymentStatus::Paid {
        return Err(EligibilityError::PaymentNotConfirmed);
    }
    if registration.eliminated {
        return Err(EligibilityError::Eliminated);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{licensed_competitor, minutes, now, open_stage, paid_registration};

    #[test]
    fn test_licensed_active_competitor_can_compete() {
        assert_eq!(can_compete(&licensed_competitor(), now()), Ok(()));
    }

    #[test]
    fn test_missing_license_fails() {
        let mut competitor = licensed_competitor();
        competitor.license_expires_at = None;
        assert_eq!(
            can_compete(&competitor, now()),
            Err(EligibilityError::LicenseExpired)
        );
    }

    #[test]
    fn test_license_expiring_now_is_expired() {
        let mut competitor = licensed_competitor();
        competitor.license_expires_at = Some(now());
        assert_eq!(
            can_compete(&competitor, now()),
            Err(EligibilityError::LicenseExpired)
        );
    }

    #[test]
    fn test_expired_license_reported_regardless_of_flags() {
        let mut competitor = licensed_competitor();
        competitor.license_expires_at = Some(now() - minutes(1));
        competitor.active = false;
        competitor.banned = true;
        assert_eq!(
            can_compete(&competitor, now()),
            Err(EligibilityError::LicenseExpired)
        );
    }

    #[test]
    fn test_banned_or_inactive_never_eligible() {
        let mut banned = licensed_competitor();
        banned.banned = true;
        assert_eq!(
            can_compete(&banned, now()),
            Err(EligibilityError::CompetitorBanned)
        );

        let mut inactive = licensed_competitor();
        inactive.active = false;
        assert_eq!(
            can_compete(&inactive, now()),
            Err(EligibilityError::CompetitorInactive)
        );

        let mut removed = licensed_competitor();
        removed.deleted_at = Some(now());
        assert_eq!(
            can_compete(&removed, now()),
            Err(EligibilityError::CompetitorRemoved)
        );
    }

    #[test]
    fn test_open_future_stage_accepts_registrations() {
        assert_eq!(can_register(&open_stage(10), now()), Ok(()));
    }

    #[test]
    fn test_closed_stage_refuses() {
        let mut stage = open_stage(10);
        stage.status = StageStatus::InProgress;
        assert_eq!(
            can_register(&stage, now()),
            Err(EligibilityError::StageNotOpen(StageStatus::InProgress))
        );
    }

    #[test]
    fn test_full_stage_refuses() {
        let mut stage = open_stage(2);
        stage.occupied = 2;
        assert_eq!(
            can_register(&stage, now()),
            Err(EligibilityError::StageFull { capacity: 2 })
        );
    }

    #[test]
    fn test_unlimited_capacity_never_full() {
        let mut stage = open_stage(0);
        stage.occupied = 500;
        assert_eq!(can_register(&stage, now()), Ok(()));
    }

    #[test]
    fn test_stage_start_is_exclusive() {
        let stage = open_stage(0);
        assert_eq!(
            can_register(&stage, stage.starts_at),
            Err(EligibilityError::StageAlreadyStarted)
        );
        assert_eq!(can_register(&stage, stage.starts_at - minutes(1)), Ok(()));
    }

    #[test]
    fn test_participation_requires_payment_and_no_elimination() {
        let registration = paid_registration();
        assert!(can_participate(&registration));

        let mut pending = registration.clone();
        pending.payment_status = PaymentStatus::Pending;
        assert_eq!(
            check_participation(&pending),
            Err(EligibilityError::PaymentNotConfirmed)
        );

        let mut refunded = registration.clone();
        refunded.payment_status = PaymentStatus::Refunded;
        assert!(!can_participate(&refunded));

        let mut eliminated = registration;
        eliminated.eliminated = true;
        assert_eq!(
            check_participation(&eliminated),
            Err(EligibilityError::Eliminated)
        );
    }
}
