use chrono::Utc;
use engine::Score;
use engine::capture::{self, NewCapture};
use engine::error::EngineError;
use engine::score::apply_score;
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use super::checked;
use crate::Database;
use crate::dto::{
    AnnulCaptureRequest, CaptureFilter, CreateCaptureRequest, ValidateCaptureRequest,
};
use crate::error::Result;
use crate::models::{Capture, Registration};
use crate::repository::{CaptureRepository, RegistrationRepository};

/// Stores the registration's score as recomputed from its live captures.
async fn refresh_score(conn: &mut PgConnection, registration: &Registration) -> Result<Score> {
    let captures = CaptureRepository::new(&mut *conn)
        .list_for_registration(registration.registration_id)
        .await?;
    let (updated, score) = apply_score(registration, &captures);
    RegistrationRepository::new(&mut *conn).update(&updated).await?;
    Ok(score)
}

/// Loads a capture and locks its owning registration, then re-reads the
/// capture so the returned copy is current under the lock.
async fn lock_capture(conn: &mut PgConnection, capture_id: Uuid) -> Result<(Registration, Capture)> {
    let capture = CaptureRepository::new(&mut *conn).find_by_id(capture_id).await?;
    let registration = RegistrationRepository::new(&mut *conn)
        .lock(capture.registration_id)
        .await?;
    let capture = CaptureRepository::new(&mut *conn).find_by_id(capture_id).await?;
    Ok((registration, capture))
}

/// Records a new catch pending validation.
///
/// The registration row is locked while the quota is counted, so concurrent
/// submissions cannot both take the last quota slot. A pending catch never
/// scores, so the stored score is left alone.
pub async fn submit_capture(
    db: &Database,
    registration_id: Uuid,
    request: CreateCaptureRequest,
) -> Result<Capture> {
    request.validate()?;
    let new = NewCapture::try_from(request).map_err(EngineError::from)?;

    let mut tx = db.pool().begin().await?;
    let registration = RegistrationRepository::new(&mut tx).lock(registration_id).await?;
    let existing = CaptureRepository::new(&mut tx)
        .list_for_registration(registration_id)
        .await?;

    let created = checked(
        "capture submission",
        capture::create_capture(&registration, &existing, new, Utc::now()),
    )?;
    CaptureRepository::new(&mut tx).insert(&created).await?;
    tx.commit().await?;

    tracing::info!(
        "Capture {} submitted for registration {} ({}, {})",
        created.capture_id,
        registration_id,
        created.species,
        created.original_size
    );
    Ok(created)
}

pub async fn validate_capture(
    db: &Database,
    capture_id: Uuid,
    request: ValidateCaptureRequest,
) -> Result<Capture> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    let (registration, pending) = lock_capture(&mut tx, capture_id).await?;
    let validated = checked(
        "capture validation",
        capture::validate_capture(&pending, request.into(), Utc::now()),
    )?;
    CaptureRepository::new(&mut tx).update(&validated).await?;
    let score = refresh_score(&mut tx, &registration).await?;
    tx.commit().await?;

    tracing::info!(
        "Capture {} validated at {} (penalty {}), registration {} now at {} over {} fish",
        capture_id,
        validated.final_size,
        validated.penalty,
        registration.registration_id,
        score.total,
        score.counted_fish
    );
    Ok(validated)
}

/// Annuls a capture. A capture that is already annulled is a conflict.
pub async fn annul_capture(
    db: &Database,
    capture_id: Uuid,
    request: AnnulCaptureRequest,
) -> Result<Capture> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    let (registration, current) = lock_capture(&mut tx, capture_id).await?;
    let annulled = checked(
        "capture annulment",
        capture::annul_once(&current, request.reason),
    )?;
    CaptureRepository::new(&mut tx).update(&annulled).await?;
    let score = refresh_score(&mut tx, &registration).await?;
    tx.commit().await?;

    tracing::info!(
        "Capture {} annulled, registration {} now at {} over {} fish",
        capture_id,
        registration.registration_id,
        score.total,
        score.counted_fish
    );
    Ok(annulled)
}

/// Tombstones a capture and rescores its registration. Returns the removed record.
pub async fn remove_capture(db: &Database, capture_id: Uuid) -> Result<Capture> {
    let mut tx = db.pool().begin().await?;
    let (registration, current) = lock_capture(&mut tx, capture_id).await?;
    let removed = capture::remove_capture(&current, Utc::now());
    CaptureRepository::new(&mut tx).update(&removed).await?;
    refresh_score(&mut tx, &registration).await?;
    tx.commit().await?;

    tracing::info!("Removed capture {}", capture_id);
    Ok(removed)
}

pub async fn list_captures(db: &Database, filter: &CaptureFilter) -> Result<Vec<Capture>> {
    let mut conn = db.pool().acquire().await?;
    CaptureRepository::new(&mut conn).list(filter).await
}
