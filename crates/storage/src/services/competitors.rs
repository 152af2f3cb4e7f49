use chrono::Utc;
use engine::lifecycle;
use uuid::Uuid;
use validator::Validate;

use super::checked;
use crate::Database;
use crate::dto::{
    BanCompetitorRequest, CompetitorFilter, CreateCompetitorRequest, UpdateCompetitorRequest,
};
use crate::error::Result;
use crate::models::Competitor;
use crate::repository::CompetitorRepository;

pub async fn create_competitor(db: &Database, request: CreateCompetitorRequest) -> Result<Competitor> {
    request.validate()?;

    let competitor = request.into_competitor(Utc::now());
    let mut conn = db.pool().acquire().await?;
    CompetitorRepository::new(&mut conn).insert(&competitor).await?;

    tracing::info!("Created competitor {}", competitor.competitor_id);
    Ok(competitor)
}

/// Applies a partial profile correction under the competitor's row lock.
pub async fn update_competitor(
    db: &Database,
    competitor_id: Uuid,
    request: UpdateCompetitorRequest,
) -> Result<Competitor> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    let competitor = CompetitorRepository::new(&mut tx).lock(competitor_id).await?;
    let updated = checked(
        "competitor update",
        lifecycle::update_competitor(&competitor, request.into()),
    )?;
    CompetitorRepository::new(&mut tx).update(&updated).await?;
    tx.commit().await?;

    tracing::info!("Updated competitor {}", competitor_id);
    Ok(updated)
}

pub async fn list_competitors(db: &Database, filter: &CompetitorFilter) -> Result<Vec<Competitor>> {
    let mut conn = db.pool().acquire().await?;
    CompetitorRepository::new(&mut conn).list(filter).await
}

pub async fn ban_competitor(
    db: &Database,
    competitor_id: Uuid,
    request: BanCompetitorRequest,
) -> Result<Competitor> {
    request.validate()?;

    let mut tx = db.pool().begin().await?;
    let competitor = CompetitorRepository::new(&mut tx).lock(competitor_id).await?;
    let banned = checked(
        "ban",
        lifecycle::ban(&competitor, &request.reason, Utc::now()),
    )?;
    CompetitorRepository::new(&mut tx).update(&banned).await?;
    tx.commit().await?;

    tracing::info!("Banned competitor {}: {}", competitor_id, request.reason);
    Ok(banned)
}

pub async fn unban_competitor(db: &Database, competitor_id: Uuid) -> Result<Competitor> {
    let mut tx = db.pool().begin().await?;
    let competitor = CompetitorRepository::new(&mut tx).lock(competitor_id).await?;
    let restored = checked("unban", lifecycle::unban(&competitor))?;
    CompetitorRepository::new(&mut tx).update(&restored).await?;
    tx.commit().await?;

    tracing::info!("Lifted ban on competitor {}", competitor_id);
    Ok(restored)
}

/// Tombstones the competitor. Their registrations and catches are left as they are.
pub async fn remove_competitor(db: &Database, competitor_id: Uuid) -> Result<Competitor> {
    let mut tx = db.pool().begin().await?;
    let competitor = CompetitorRepository::new(&mut tx).lock(competitor_id).await?;
    let removed = lifecycle::remove_competitor(&competitor, Utc::now());
    CompetitorRepository::new(&mut tx).update(&removed).await?;
    tx.commit().await?;

    tracing::info!("Removed competitor {}", competitor_id);
    Ok(removed)
}
