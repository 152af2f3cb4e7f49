use chrono::Utc;
use engine::lifecycle;
use uuid::Uuid;
use validator::Validate;

use super::checked;
use crate::Database;
use crate::dto::{CreateStageRequest, StageFilter};
use crate::error::Result;
use crate::models::{Stage, StageStatus};
use crate::repository::{EditionRepository, StageRepository};

pub async fn create_stage(db: &Database, request: CreateStageRequest) -> Result<Stage> {
    request.validate()?;

    let stage = request.into_stage(Utc::now());
    let mut conn = db.pool().acquire().await?;
    if let Some(edition_id) = stage.edition_id {
        EditionRepository::new(&mut conn).find_by_id(edition_id).await?;
    }
    StageRepository::new(&mut conn).insert(&stage).await?;

    tracing::info!("Created stage {} ({}) starting {}", stage.stage_id, stage.name, stage.starts_at);
    Ok(stage)
}

pub async fn transition_stage(db: &Database, stage_id: Uuid, to: StageStatus) -> Result<Stage> {
    let mut tx = db.pool().begin().await?;
    let stage = StageRepository::new(&mut tx).lock(stage_id).await?;
    let moved = checked("stage transition", lifecycle::transition_stage(&stage, to))?;
    StageRepository::new(&mut tx).update_status(&moved).await?;
    tx.commit().await?;

    tracing::info!("Stage {} moved from {} to {}", stage_id, stage.status, moved.status);
    Ok(moved)
}

pub async fn list_stages(db: &Database, filter: &StageFilter) -> Result<Vec<Stage>> {
    let mut conn = db.pool().acquire().await?;
    StageRepository::new(&mut conn).list(filter).await
}
