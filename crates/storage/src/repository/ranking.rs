use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::parse_column;
use crate::dto::RankingFilter;
use crate::error::{Result, StorageError};
use crate::models::{Award, RankingCategory, RankingEntry};

#[derive(FromRow)]
struct RankingRow {
    stage_id: Uuid,
    registration_id: Uuid,
    position: i32,
    total_score: Decimal,
    largest_fish: Decimal,
    counted_fish: i32,
    category: String,
    award: Option<String>,
    generated_at: DateTime<Utc>,
}

impl TryFrom<RankingRow> for RankingEntry {
    type Error = StorageError;

    fn try_from(row: RankingRow) -> Result<Self> {
        let award = row.award.as_deref().map(parse_column::<Award>).transpose()?;

        Ok(Self {
            stage_id: row.stage_id,
            registration_id: row.registration_id,
            position: row.position,
            total_score: row.total_score,
            largest_fish: row.largest_fish,
            counted_fish: row.counted_fish,
            category: parse_column(&row.category)?,
            award,
            generated_at: row.generated_at,
        })
    }
}

/// Stored ranking snapshots. A stage has at most one snapshot at a time.
pub struct RankingRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RankingRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Queues this transaction behind any other snapshot rebuild.
    ///
    /// Must run before the first query of a REPEATABLE READ transaction: a
    /// table lock does not take the snapshot, so the rebuild that waited here
    /// reads the rows the previous one committed. Readers are not blocked.
    pub async fn lock_for_rebuild(&mut self) -> Result<()> {
        sqlx::query("LOCK TABLE rankings IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    /// Drops the stage's previous snapshot and stores `entries` in its place.
    /// Run inside a transaction so readers never see a half-written snapshot.
    pub async fn replace_for_stage(
        &mut self,
        stage_id: Uuid,
        entries: &[RankingEntry],
    ) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM rankings WHERE stage_id = $1")
            .bind(stage_id)
            .execute(&mut *self.conn)
            .await?
            .rows_affected();

        tracing::debug!("Removed {} ranking rows for stage {}", removed, stage_id);

        let mut inserted = 0;
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO rankings (
                    stage_id, registration_id, position, total_score, largest_fish,
                    counted_fish, category, award, generated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(entry.stage_id)
            .bind(entry.registration_id)
            .bind(entry.position)
            .bind(entry.total_score)
            .bind(entry.largest_fish)
            .bind(entry.counted_fish)
            .bind(entry.category.as_str())
            .bind(entry.award.map(|award| award.label()))
            .bind(entry.generated_at)
            .execute(&mut *self.conn)
            .await?;

            inserted += 1;
        }

        Ok(inserted)
    }

    /// Stored entries of a stage, optionally narrowed to one category.
    pub async fn list_for_stage(
        &mut self,
        stage_id: Uuid,
        category: Option<RankingCategory>,
    ) -> Result<Vec<RankingEntry>> {
        sqlx::query_as::<_, RankingRow>(
            r#"
            SELECT stage_id, registration_id, position, total_score, largest_fish,
                   counted_fish, category, award, generated_at
            FROM rankings
            WHERE stage_id = $1
              AND ($2::VARCHAR IS NULL OR category = $2)
            ORDER BY category, position
            "#,
        )
        .bind(stage_id)
        .bind(category.map(|c| c.as_str()))
        .fetch_all(&mut *self.conn)
        .await?
        .into_iter()
        .map(RankingEntry::try_from)
        .collect()
    }

    /// Stored entries across stages, in stage start order then by category and
    /// position.
    pub async fn list(&mut self, filter: &RankingFilter) -> Result<Vec<RankingEntry>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT rk.stage_id, rk.registration_id, rk.position, rk.total_score,
                   rk.largest_fish, rk.counted_fish, rk.category, rk.award, rk.generated_at
            FROM rankings rk
            JOIN stages s ON s.stage_id = rk.stage_id
            JOIN registrations r ON r.registration_id = rk.registration_id
            WHERE s.deleted_at IS NULL
            "#,
        );

        if let Some(stage_id) = filter.stage_id {
            query.push(" AND rk.stage_id = ");
            query.push_bind(stage_id);
        }

        if let Some(edition_id) = filter.edition_id {
            query.push(" AND s.edition_id = ");
            query.push_bind(edition_id);
        }

        if let Some(competitor_id) = filter.competitor_id {
            query.push(" AND r.competitor_id = ");
            query.push_bind(competitor_id);
        }

        if let Some(category) = filter.category {
            query.push(" AND rk.category = ");
            query.push_bind(category.as_str());
        }

        query.push(" ORDER BY s.starts_at, rk.stage_id, rk.category, rk.position");

        let rows: Vec<RankingRow> = query.build_query_as().fetch_all(&mut *self.conn).await?;
        rows.into_iter().map(RankingEntry::try_from).collect()
    }
}
