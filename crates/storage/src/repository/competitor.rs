use chrono::{DateTime, Utc};
use engine::error::Entity;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::CompetitorFilter;
use crate::error::{Result, StorageError};
use crate::models::Competitor;

#[derive(FromRow)]
struct CompetitorRow {
    competitor_id: Uuid,
    name: String,
    email: String,
    license_number: Option<String>,
    license_expires_at: Option<DateTime<Utc>>,
    active: bool,
    banned: bool,
    ban_reason: Option<String>,
    banned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<CompetitorRow> for Competitor {
    fn from(row: CompetitorRow) -> Self {
        Self {
            competitor_id: row.competitor_id,
            name: row.name,
            email: row.email,
            license_number: row.license_number,
            license_expires_at: row.license_expires_at,
            active: row.active,
            banned: row.banned,
            ban_reason: row.ban_reason,
            banned_at: row.banned_at,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Repository for competitor records. Removed competitors are invisible.
pub struct CompetitorRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> CompetitorRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&mut self, competitor_id: Uuid) -> Result<Competitor> {
        let row = sqlx::query_as::<_, CompetitorRow>(
            r#"
            SELECT competitor_id, name, email, license_number, license_expires_at,
                   active, banned, ban_reason, banned_at, created_at, deleted_at
            FROM competitors
            WHERE competitor_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(competitor_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound(Entity::Competitor))?;

        Ok(row.into())
    }

    /// Same as [`find_by_id`](Self::find_by_id) but holds a row lock until the
    /// surrounding transaction ends.
    pub async fn lock(&mut self, competitor_id: Uuid) -> Result<Competitor> {
        let row = sqlx::query_as::<_, CompetitorRow>(
            r#"
            SELECT competitor_id, name, email, license_number, license_expires_at,
                   active, banned, ban_reason, banned_at, created_at, deleted_at
            FROM competitors
            WHERE competitor_id = $1 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(competitor_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound(Entity::Competitor))?;

        Ok(row.into())
    }

    pub async fn insert(&mut self, competitor: &Competitor) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO competitors (
                competitor_id, name, email, license_number, license_expires_at,
                active, banned, ban_reason, banned_at, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(competitor.competitor_id)
        .bind(&competitor.name)
        .bind(&competitor.email)
        .bind(&competitor.license_number)
        .bind(competitor.license_expires_at)
        .bind(competitor.active)
        .bind(competitor.banned)
        .bind(&competitor.ban_reason)
        .bind(competitor.banned_at)
        .bind(competitor.created_at)
        .bind(competitor.deleted_at)
        .execute(&mut *self.conn)
        .await
        .map_err(email_taken)?;

        Ok(())
    }

    /// Live competitors matching `filter`, by name.
    pub async fn list(&mut self, filter: &CompetitorFilter) -> Result<Vec<Competitor>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT competitor_id, name, email, license_number, license_expires_at,
                   active, banned, ban_reason, banned_at, created_at, deleted_at
            FROM competitors
            WHERE deleted_at IS NULL
            "#,
        );

        if let Some(active) = filter.active {
            query.push(" AND active = ");
            query.push_bind(active);
        }

        if let Some(banned) = filter.banned {
            query.push(" AND banned = ");
            query.push_bind(banned);
        }

        query.push(" ORDER BY name, competitor_id");

        let rows: Vec<CompetitorRow> = query.build_query_as().fetch_all(&mut *self.conn).await?;
        Ok(rows.into_iter().map(Competitor::from).collect())
    }

    /// Writes back the mutable state: profile, license, flags, ban and tombstone.
    pub async fn update(&mut self, competitor: &Competitor) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE competitors
            SET name = $2,
                email = $3,
                license_number = $4,
                license_expires_at = $5,
                active = $6,
                banned = $7,
                ban_reason = $8,
                banned_at = $9,
                deleted_at = $10
            WHERE competitor_id = $1
            "#,
        )
        .bind(competitor.competitor_id)
        .bind(&competitor.name)
        .bind(&competitor.email)
        .bind(&competitor.license_number)
        .bind(competitor.license_expires_at)
        .bind(competitor.active)
        .bind(competitor.banned)
        .bind(&competitor.ban_reason)
        .bind(competitor.banned_at)
        .bind(competitor.deleted_at)
        .execute(&mut *self.conn)
        .await
        .map_err(email_taken)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(Entity::Competitor));
        }

        Ok(())
    }
}

fn email_taken(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.code().as_deref() == Some("23505")
    {
        return StorageError::ConstraintViolation("Email already registered".to_string());
    }
    StorageError::from(e)
}
