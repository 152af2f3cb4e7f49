use chrono::Utc;
use engine::error::{ConflictError, EngineError};
use engine::lifecycle;
use uuid::Uuid;
use validator::Validate;

use super::checked;
use crate::Database;
use crate::dto::{
    ConfirmPaymentRequest, CreateRegistrationRequest, EliminateRequest, RegistrationFilter,
};
use crate::error::{Result, StorageError};
use crate::models::Registration;
use crate::repository::{CompetitorRepository, RegistrationRepository, StageRepository};

/// Enrolls a competitor in a stage and takes one of its slots.
///
/// The stage row stays locked from the capacity check until commit, so two
/// concurrent registrations cannot both take the last slot.
pub async fn register(db: &Database, request: CreateRegistrationRequest) -> Result<Registration> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    let stage = StageRepository::new(&mut tx).lock(request.stage_id).await?;
    let competitor = CompetitorRepository::new(&mut tx)
        .find_by_id(request.competitor_id)
        .await?;
    let already_registered = RegistrationRepository::new(&mut tx)
        .exists_for(stage.stage_id, competitor.competitor_id)
        .await?;

    let (registration, stage) = checked(
        "registration",
        lifecycle::register(&competitor, &stage, already_registered, Utc::now()),
    )?;

    RegistrationRepository::new(&mut tx)
        .insert(&registration)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                StorageError::from(EngineError::from(ConflictError::AlreadyRegistered))
            } else {
                e
            }
        })?;
    StageRepository::new(&mut tx).update_occupied(&stage).await?;
    tx.commit().await?;

    tracing::info!(
        "Registered competitor {} in stage {} ({}/{} slots)",
        registration.competitor_id,
        registration.stage_id,
        stage.occupied,
        stage.capacity
    );
    Ok(registration)
}

pub async fn confirm_payment(
    db: &Database,
    registration_id: Uuid,
    request: ConfirmPaymentRequest,
) -> Result<Registration> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    let registration = RegistrationRepository::new(&mut tx).lock(registration_id).await?;
    let paid = checked(
        "payment confirmation",
        lifecycle::confirm_payment(&registration, request.payment_receipt, Utc::now()),
    )?;
    RegistrationRepository::new(&mut tx).update(&paid).await?;
    tx.commit().await?;

    tracing::info!("Payment confirmed for registration {}", registration_id);
    Ok(paid)
}

pub async fn cancel_payment(db: &Database, registration_id: Uuid) -> Result<Registration> {
    let mut tx = db.pool().begin().await?;
    let registration = RegistrationRepository::new(&mut tx).lock(registration_id).await?;
    let cancelled = checked("payment cancellation", lifecycle::cancel_payment(&registration))?;
    RegistrationRepository::new(&mut tx).update(&cancelled).await?;
    tx.commit().await?;

    tracing::info!("Payment cancelled for registration {}", registration_id);
    Ok(cancelled)
}

pub async fn refund_payment(db: &Database, registration_id: Uuid) -> Result<Registration> {
    let mut tx = db.pool().begin().await?;
    let registration = RegistrationRepository::new(&mut tx).lock(registration_id).await?;
    let refunded = checked("refund", lifecycle::refund_payment(&registration))?;
    RegistrationRepository::new(&mut tx).update(&refunded).await?;
    tx.commit().await?;

    tracing::info!("Payment refunded for registration {}", registration_id);
    Ok(refunded)
}

pub async fn eliminate(
    db: &Database,
    registration_id: Uuid,
    request: EliminateRequest,
) -> Result<Registration> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    let registration = RegistrationRepository::new(&mut tx).lock(registration_id).await?;
    let eliminated = checked(
        "elimination",
        lifecycle::eliminate(&registration, &request.reason, Utc::now()),
    )?;
    RegistrationRepository::new(&mut tx).update(&eliminated).await?;
    tx.commit().await?;

    tracing::info!("Eliminated registration {}: {}", registration_id, request.reason);
    Ok(eliminated)
}

pub async fn list_registrations(
    db: &Database,
    filter: &RegistrationFilter,
) -> Result<Vec<Registration>> {
    let mut conn = db.pool().acquire().await?;
    RegistrationRepository::new(&mut conn).list(filter).await
}
