use chrono::{DateTime, Utc};
use engine::error::Entity;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Edition;

#[derive(FromRow)]
struct EditionRow {
    edition_id: Uuid,
    year: i32,
    name: String,
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<EditionRow> for Edition {
    fn from(row: EditionRow) -> Self {
        Self {
            edition_id: row.edition_id,
            year: row.year,
            name: row.name,
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

pub struct EditionRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> EditionRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&mut self, edition_id: Uuid) -> Result<Edition> {
        let row = sqlx::query_as::<_, EditionRow>(
            r#"
            SELECT edition_id, year, name, description, active, created_at, deleted_at
            FROM editions
            WHERE edition_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(edition_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound(Entity::Edition))?;

        Ok(row.into())
    }

    /// Live editions, most recent year first.
    pub async fn list(&mut self) -> Result<Vec<Edition>> {
        let rows = sqlx::query_as::<_, EditionRow>(
            r#"
            SELECT edition_id, year, name, description, active, created_at, deleted_at
            FROM editions
            WHERE deleted_at IS NULL
            ORDER BY year DESC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Edition::from).collect())
    }

    /// Live editions under a table lock, so two activations cannot interleave.
    pub async fn lock_all(&mut self) -> Result<Vec<Edition>> {
        sqlx::query("LOCK TABLE editions IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *self.conn)
            .await?;
        self.list().await
    }

    pub async fn insert(&mut self, edition: &Edition) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO editions (
                edition_id, year, name, description, active, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(edition.edition_id)
        .bind(edition.year)
        .bind(&edition.name)
        .bind(&edition.description)
        .bind(edition.active)
        .bind(edition.created_at)
        .bind(edition.deleted_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.code().as_deref() == Some("23505")
            {
                return StorageError::ConstraintViolation(format!(
                    "An edition for {} already exists",
                    edition.year
                ));
            }
            StorageError::from(e)
        })?;

        Ok(())
    }

    pub async fn update_active(&mut self, edition: &Edition) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE editions
            SET active = $2
            WHERE edition_id = $1
            "#,
        )
        .bind(edition.edition_id)
        .bind(edition.active)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(Entity::Edition));
        }

        Ok(())
    }
}
