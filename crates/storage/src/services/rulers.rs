use std::collections::HashMap;

use chrono::Utc;
use engine::error::{ConflictError, EngineError, Entity};
use engine::rulers::{self, DrawMode, RulerAssignment};
use uuid::Uuid;
use validator::Validate;

use super::checked;
use crate::Database;
use crate::dto::{GenerateRulersRequest, RulerFilter};
use crate::error::{Result, StorageError};
use crate::models::{Registration, Ruler};
use crate::repository::{RegistrationRepository, RulerRepository, StageRepository};

pub async fn generate_rulers(
    db: &Database,
    stage_id: Uuid,
    request: GenerateRulersRequest,
) -> Result<Vec<Ruler>> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    StageRepository::new(&mut tx).lock(stage_id).await?;
    let existing = RulerRepository::new(&mut tx).list_for_stage(stage_id).await?;
    let created = checked(
        "ruler generation",
        rulers::generate_rulers(stage_id, &existing, request.count, Utc::now()),
    )?;

    for ruler in &created {
        RulerRepository::new(&mut tx).insert(ruler).await?;
    }
    tx.commit().await?;

    tracing::info!(
        "Generated {} rulers for stage {} (numbers {}..={})",
        created.len(),
        stage_id,
        created.first().map_or(0, |r| r.number),
        created.last().map_or(0, |r| r.number)
    );
    Ok(created)
}

/// Hands an available ruler to every registration of the stage still without one.
///
/// All or nothing: with fewer rulers than waiting registrations nobody gets one.
pub async fn draw_rulers(
    db: &Database,
    stage_id: Uuid,
    mode: DrawMode,
) -> Result<Vec<RulerAssignment>> {
    let mut tx = db.pool().begin().await?;
    StageRepository::new(&mut tx).lock(stage_id).await?;
    let registrations = RegistrationRepository::new(&mut tx)
        .list_for_stage(stage_id)
        .await?;
    let stage_rulers = RulerRepository::new(&mut tx).list_for_stage(stage_id).await?;

    if let DrawMode::Shuffled { seed } = mode {
        tracing::info!("Drawing rulers for stage {} with seed {}", stage_id, seed);
    }
    let assignments = checked(
        "ruler draw",
        rulers::assign_rulers(&registrations, &stage_rulers, mode),
    )?;

    let registrations: HashMap<Uuid, &Registration> = registrations
        .iter()
        .map(|registration| (registration.registration_id, registration))
        .collect();
    let stage_rulers: HashMap<Uuid, &Ruler> = stage_rulers
        .iter()
        .map(|ruler| (ruler.ruler_id, ruler))
        .collect();

    for assignment in &assignments {
        let (Some(registration), Some(ruler)) = (
            registrations.get(&assignment.registration_id),
            stage_rulers.get(&assignment.ruler_id),
        ) else {
            return Err(StorageError::NotFound(Entity::Ruler));
        };

        let (registration, ruler) = rulers::apply_assignment(registration, ruler);
        RegistrationRepository::new(&mut tx).update(&registration).await?;
        RulerRepository::new(&mut tx).update(&ruler).await?;
    }
    tx.commit().await?;

    tracing::info!("Assigned {} rulers in stage {}", assignments.len(), stage_id);
    Ok(assignments)
}

pub async fn return_ruler(db: &Database, registration_id: Uuid) -> Result<Registration> {
    let mut tx = db.pool().begin().await?;
    let registration = RegistrationRepository::new(&mut tx).lock(registration_id).await?;
    let Some(ruler_id) = registration.ruler_id else {
        tracing::warn!("ruler return rejected: registration {} holds no ruler", registration_id);
        return Err(EngineError::from(ConflictError::NoRulerAssigned).into());
    };
    let ruler = RulerRepository::new(&mut tx).find_by_id(ruler_id).await?;

    let (registration, ruler) = checked(
        "ruler return",
        rulers::return_ruler(&registration, &ruler, Utc::now()),
    )?;
    RegistrationRepository::new(&mut tx).update(&registration).await?;
    RulerRepository::new(&mut tx).update(&ruler).await?;
    tx.commit().await?;

    tracing::info!("Ruler {} returned by registration {}", ruler.number, registration_id);
    Ok(registration)
}

pub async fn list_rulers(db: &Database, stage_id: Uuid, filter: &RulerFilter) -> Result<Vec<Ruler>> {
    let mut conn = db.pool().acquire().await?;
    StageRepository::new(&mut conn).find_by_id(stage_id).await?;
    RulerRepository::new(&mut conn).list(stage_id, filter).await
}

/// Deletes a ruler that was never handed out. Returns the deleted ruler.
///
/// Runs under the stage lock so a concurrent draw cannot hand it out first.
pub async fn delete_ruler(db: &Database, ruler_id: Uuid) -> Result<Ruler> {
    let mut tx = db.pool().begin().await?;
    let ruler = RulerRepository::new(&mut tx).find_by_id(ruler_id).await?;
    StageRepository::new(&mut tx).lock(ruler.stage_id).await?;
    let ruler = RulerRepository::new(&mut tx).find_by_id(ruler_id).await?;
    let holders = RegistrationRepository::new(&mut tx)
        .list_holding_ruler(ruler_id)
        .await?;

    checked("ruler deletion", rulers::ensure_deletable(&ruler, &holders))?;
    RulerRepository::new(&mut tx).delete(ruler_id).await?;
    tx.commit().await?;

    tracing::info!("Deleted ruler {} of stage {}", ruler.number, ruler.stage_id);
    Ok(ruler)
}
