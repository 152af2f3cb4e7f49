use chrono::Utc;
use engine::editions;
use engine::error::Entity;
use uuid::Uuid;
use validator::Validate;

use super::checked;
use crate::Database;
use crate::dto::{CreateEditionRequest, EditionDetail, StageFilter};
use crate::error::{Result, StorageError};
use crate::models::Edition;
use crate::repository::{EditionRepository, StageRepository};

/// Persists a set of activation changes. Deactivations go first so the
/// single-active index never sees two active editions.
async fn store_activation(repo: &mut EditionRepository<'_>, mut changed: Vec<Edition>) -> Result<()> {
    changed.sort_by_key(|edition| edition.active);
    for edition in &changed {
        repo.update_active(edition).await?;
    }
    Ok(())
}

pub async fn create_edition(db: &Database, request: CreateEditionRequest) -> Result<Edition> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    let mut repo = EditionRepository::new(&mut tx);
    let existing = repo.lock_all().await?;
    let (edition, deactivated) = checked(
        "edition creation",
        editions::create_edition(request.into(), &existing, Utc::now()),
    )?;
    store_activation(&mut repo, deactivated).await?;
    repo.insert(&edition).await?;
    tx.commit().await?;

    tracing::info!(
        "Created edition {} ({}){}",
        edition.year,
        edition.edition_id,
        if edition.active { ", now active" } else { "" }
    );
    Ok(edition)
}

/// Switches the active edition. Returns the newly active edition.
pub async fn activate_edition(db: &Database, edition_id: Uuid) -> Result<Edition> {
    let mut tx = db.pool().begin().await?;
    let mut repo = EditionRepository::new(&mut tx);
    let existing = repo.lock_all().await?;
    let changed = checked(
        "edition activation",
        editions::activate_edition(&existing, edition_id),
    )?;
    store_activation(&mut repo, changed).await?;
    let activated = repo.find_by_id(edition_id).await?;
    tx.commit().await?;

    tracing::info!("Edition {} is now active", activated.year);
    Ok(activated)
}

pub async fn list_editions(db: &Database) -> Result<Vec<Edition>> {
    let mut conn = db.pool().acquire().await?;
    EditionRepository::new(&mut conn).list().await
}

/// The active edition with its stages.
pub async fn active_edition(db: &Database) -> Result<EditionDetail> {
    let mut conn = db.pool().acquire().await?;
    let all = EditionRepository::new(&mut conn).list().await?;
    let edition = editions::active_edition(&all)
        .cloned()
        .ok_or(StorageError::NotFound(Entity::Edition))?;

    let filter = StageFilter {
        edition_id: Some(edition.edition_id),
        ..Default::default()
    };
    let stages = StageRepository::new(&mut conn).list(&filter).await?;

    Ok(EditionDetail { edition, stages })
}
