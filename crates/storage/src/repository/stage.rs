use chrono::{DateTime, Utc};
use engine::error::Entity;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::parse_column;
use crate::dto::StageFilter;
use crate::error::{Result, StorageError};
use crate::models::Stage;

const STAGE_COLUMNS: &str = r#"
    stage_id, edition_id, name, location, starts_at, entry_fee, capacity, occupied,
    status, created_at, deleted_at
"#;

#[derive(FromRow)]
struct StageRow {
    stage_id: Uuid,
    edition_id: Option<Uuid>,
    name: String,
    location: String,
    starts_at: DateTime<Utc>,
    entry_fee: Decimal,
    capacity: i32,
    occupied: i32,
    status: String,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<StageRow> for Stage {
    type Error = StorageError;

    fn try_from(row: StageRow) -> Result<Self> {
        Ok(Self {
            stage_id: row.stage_id,
            edition_id: row.edition_id,
            name: row.name,
            location: row.location,
            starts_at: row.starts_at,
            entry_fee: row.entry_fee,
            capacity: row.capacity,
            occupied: row.occupied,
            status: parse_column(&row.status)?,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        })
    }
}

pub struct StageRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> StageRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&mut self, stage_id: Uuid) -> Result<Stage> {
        let query = format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE stage_id = $1 AND deleted_at IS NULL"
        );

        sqlx::query_as::<_, StageRow>(&query)
            .bind(stage_id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or(StorageError::NotFound(Entity::Stage))?
            .try_into()
    }

    /// Loads the stage and locks its row for the rest of the transaction.
    ///
    /// Serializes slot reservation and ruler draws on the same stage.
    pub async fn lock(&mut self, stage_id: Uuid) -> Result<Stage> {
        let query = format!(
            "SELECT {STAGE_COLUMNS} FROM stages \
             WHERE stage_id = $1 AND deleted_at IS NULL \
             FOR UPDATE"
        );

        sqlx::query_as::<_, StageRow>(&query)
            .bind(stage_id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or(StorageError::NotFound(Entity::Stage))?
            .try_into()
    }

    /// Live stages matching `filter`, earliest start first.
    pub async fn list(&mut self, filter: &StageFilter) -> Result<Vec<Stage>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE deleted_at IS NULL"
        ));

        if let Some(edition_id) = filter.edition_id {
            query.push(" AND edition_id = ");
            query.push_bind(edition_id);
        }

        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status.as_str());
        }

        query.push(" ORDER BY starts_at, stage_id");

        let rows: Vec<StageRow> = query.build_query_as().fetch_all(&mut *self.conn).await?;
        rows.into_iter().map(Stage::try_from).collect()
    }

    pub async fn insert(&mut self, stage: &Stage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stages (
                stage_id, edition_id, name, location, starts_at, entry_fee, capacity,
                occupied, status, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(stage.stage_id)
        .bind(stage.edition_id)
        .bind(&stage.name)
        .bind(&stage.location)
        .bind(stage.starts_at)
        .bind(stage.entry_fee)
        .bind(stage.capacity)
        .bind(stage.occupied)
        .bind(stage.status.as_str())
        .bind(stage.created_at)
        .bind(stage.deleted_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn update_status(&mut self, stage: &Stage) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE stages
            SET status = $2
            WHERE stage_id = $1
            "#,
        )
        .bind(stage.stage_id)
        .bind(stage.status.as_str())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(Entity::Stage));
        }

        Ok(())
    }

    /// Stores a new occupied count.
    ///
    /// The guard repeats the capacity rule so a caller that skipped the row lock
    /// still cannot overfill the stage.
    pub async fn update_occupied(&mut self, stage: &Stage) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE stages
            SET occupied = $2
            WHERE stage_id = $1
              AND (capacity = 0 OR $2 <= capacity)
            "#,
        )
        .bind(stage.stage_id)
        .bind(stage.occupied)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::ConstraintViolation(
                "Stage capacity exceeded".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::StageStatus;

    fn row(status: &str) -> StageRow {
        let at = Utc.with_ymd_and_hms(2026, 5, 2, 6, 0, 0).unwrap();
        StageRow {
            stage_id: Uuid::new_v4(),
            edition_id: None,
            name: "Etapa Tapajós".to_string(),
            location: "Santarém, PA".to_string(),
            starts_at: at,
            entry_fee: Decimal::new(12000, 2),
            capacity: 30,
            occupied: 12,
            status: status.to_string(),
            created_at: at,
            deleted_at: None,
        }
    }

    #[test]
    fn test_row_converts_status() {
        let stage = Stage::try_from(row("in_progress")).unwrap();
        assert_eq!(stage.status, StageStatus::InProgress);
        assert_eq!(stage.occupied, 12);
    }

    #[test]
    fn test_row_with_unknown_status_is_invalid() {
        assert!(matches!(
            Stage::try_from(row("postponed")),
            Err(StorageError::InvalidRow(_))
        ));
    }
}
