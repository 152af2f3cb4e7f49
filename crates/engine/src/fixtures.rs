//! Builders shared by the unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Capture, Competitor, PaymentStatus, Registration, Ruler, Species, Stage};

/// Fixed reference clock: stage day, 06:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 6, 0, 0).unwrap()
}

pub fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

pub fn licensed_competitor() -> Competitor {
    let mut competitor = Competitor::new("Ana Ribeiro", "ana@example.com", now());
    competitor.license_number = Some("AM-4471".to_string());
    competitor.license_expires_at = Some(now() + Duration::days(90));
    competitor
}

pub fn open_stage(capacity: i32) -> Stage {
    Stage::new("1ª Etapa", "Rio Negro", now() + Duration::hours(1), capacity, now())
}

pub fn paid_registration() -> Registration {
    let mut registration = Registration::new(Uuid::new_v4(), Uuid::new_v4(), now());
    registration.payment_status = PaymentStatus::Paid;
    registration.paid_at = Some(now());
    registration
}

pub fn paid_registration_in(stage_id: Uuid, offset_minutes: i64) -> Registration {
    let mut registration = paid_registration();
    registration.stage_id = stage_id;
    registration.registered_at = now() + minutes(offset_minutes);
    registration
}

/// An unvalidated catch as it arrives from the competitor.
pub fn pending_capture(registration: &Registration, species: Species, size: i64) -> Capture {
    let size = Decimal::from(size);
    Capture {
        capture_id: Uuid::new_v4(),
        registration_id: registration.registration_id,
        species,
        original_size: size,
        penalty: Decimal::ZERO,
        penalty_reason: None,
        final_size: size,
        evidence_url: "https://videos.example.com/catch.mp4".to_string(),
        validated: false,
        validated_by: None,
        validated_at: None,
        annulled: false,
        annulment_reason: None,
        counts_toward_quota: !species.is_quota_exempt(),
        captured_at: now(),
        notes: None,
        created_at: now(),
        deleted_at: None,
    }
}

pub fn validated_capture(registration: &Registration, species: Species, size: i64) -> Capture {
    let mut capture = pending_capture(registration, species, size);
    capture.validated = true;
    capture.validated_by = Some("fiscal-01".to_string());
    capture.validated_at = Some(now());
    capture
}

pub fn ruler(stage_id: Uuid, number: i32) -> Ruler {
    Ruler {
        ruler_id: Uuid::new_v4(),
        stage_id,
        number,
        available: true,
        returned: false,
        created_at: now(),
    }
}
