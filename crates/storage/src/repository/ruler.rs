use chrono::{DateTime, Utc};
use engine::error::Entity;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::RulerFilter;
use crate::error::{Result, StorageError};
use crate::models::Ruler;

#[derive(FromRow)]
struct RulerRow {
    ruler_id: Uuid,
    stage_id: Uuid,
    number: i32,
    available: bool,
    returned: bool,
    created_at: DateTime<Utc>,
}

impl From<RulerRow> for Ruler {
    fn from(row: RulerRow) -> Self {
        Self {
            ruler_id: row.ruler_id,
            stage_id: row.stage_id,
            number: row.number,
            available: row.available,
            returned: row.returned,
            created_at: row.created_at,
        }
    }
}

pub struct RulerRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RulerRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&mut self, ruler_id: Uuid) -> Result<Ruler> {
        let row = sqlx::query_as::<_, RulerRow>(
            r#"
            SELECT ruler_id, stage_id, number, available, returned, created_at
            FROM rulers
            WHERE ruler_id = $1
            "#,
        )
        .bind(ruler_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound(Entity::Ruler))?;

        Ok(row.into())
    }

    /// All rulers of a stage ordered by number.
    pub async fn list_for_stage(&mut self, stage_id: Uuid) -> Result<Vec<Ruler>> {
        self.list(stage_id, &RulerFilter::default()).await
    }

    pub async fn list(&mut self, stage_id: Uuid, filter: &RulerFilter) -> Result<Vec<Ruler>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT ruler_id, stage_id, number, available, returned, created_at
            FROM rulers
            WHERE stage_id =
            "#,
        );
        query.push_bind(stage_id);

        if let Some(available) = filter.available {
            query.push(" AND available = ");
            query.push_bind(available);
        }

        query.push(" ORDER BY number");

        let rows: Vec<RulerRow> = query.build_query_as().fetch_all(&mut *self.conn).await?;
        Ok(rows.into_iter().map(Ruler::from).collect())
    }

    pub async fn insert(&mut self, ruler: &Ruler) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rulers (ruler_id, stage_id, number, available, returned, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ruler.ruler_id)
        .bind(ruler.stage_id)
        .bind(ruler.number)
        .bind(ruler.available)
        .bind(ruler.returned)
        .bind(ruler.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn update(&mut self, ruler: &Ruler) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE rulers
            SET available = $2,
                returned = $3
            WHERE ruler_id = $1
            "#,
        )
        .bind(ruler.ruler_id)
        .bind(ruler.available)
        .bind(ruler.returned)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(Entity::Ruler));
        }

        Ok(())
    }

    pub async fn delete(&mut self, ruler_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM rulers WHERE ruler_id = $1")
            .bind(ruler_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(Entity::Ruler));
        }

        Ok(())
    }
}
