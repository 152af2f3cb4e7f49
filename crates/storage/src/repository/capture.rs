use chrono::{DateTime, Utc};
use engine::error::Entity;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::parse_column;
use crate::dto::{CaptureFilter, CaptureStatus};
use crate::error::{Result, StorageError};
use crate::models::Capture;

#[derive(FromRow)]
struct CaptureRow {
    capture_id: Uuid,
    registration_id: Uuid,
    species: String,
    original_size: Decimal,
    penalty: Decimal,
    penalty_reason: Option<String>,
    final_size: Decimal,
    evidence_url: String,
    validated: bool,
    validated_by: Option<String>,
    validated_at: Option<DateTime<Utc>>,
    annulled: bool,
    annulment_reason: Option<String>,
    counts_toward_quota: bool,
    captured_at: DateTime<Utc>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<CaptureRow> for Capture {
    type Error = StorageError;

    fn try_from(row: CaptureRow) -> Result<Self> {
        Ok(Self {
            capture_id: row.capture_id,
            registration_id: row.registration_id,
            species: parse_column(&row.species)?,
            original_size: row.original_size,
            penalty: row.penalty,
            penalty_reason: row.penalty_reason,
            final_size: row.final_size,
            evidence_url: row.evidence_url,
            validated: row.validated,
            validated_by: row.validated_by,
            validated_at: row.validated_at,
            annulled: row.annulled,
            annulment_reason: row.annulment_reason,
            counts_toward_quota: row.counts_toward_quota,
            captured_at: row.captured_at,
            notes: row.notes,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        })
    }
}

pub struct CaptureRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> CaptureRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&mut self, capture_id: Uuid) -> Result<Capture> {
        sqlx::query_as::<_, CaptureRow>(
            r#"
            SELECT capture_id, registration_id, species, original_size, penalty,
                   penalty_reason, final_size, evidence_url, validated, validated_by,
                   validated_at, annulled, annulment_reason, counts_toward_quota,
                   captured_at, notes, created_at, deleted_at
            FROM captures
            WHERE capture_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(capture_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound(Entity::Capture))?
        .try_into()
    }

    /// Live captures of one registration in submission order.
    pub async fn list_for_registration(&mut self, registration_id: Uuid) -> Result<Vec<Capture>> {
        sqlx::query_as::<_, CaptureRow>(
            r#"
            SELECT capture_id, registration_id, species, original_size, penalty,
                   penalty_reason, final_size, evidence_url, validated, validated_by,
                   validated_at, annulled, annulment_reason, counts_toward_quota,
                   captured_at, notes, created_at, deleted_at
            FROM captures
            WHERE registration_id = $1 AND deleted_at IS NULL
            ORDER BY created_at, capture_id
            "#,
        )
        .bind(registration_id)
        .fetch_all(&mut *self.conn)
        .await?
        .into_iter()
        .map(Capture::try_from)
        .collect()
    }

    /// Live captures of every live registration in a stage.
    pub async fn list_for_stage(&mut self, stage_id: Uuid) -> Result<Vec<Capture>> {
        sqlx::query_as::<_, CaptureRow>(
            r#"
            SELECT c.capture_id, c.registration_id, c.species, c.original_size, c.penalty,
                   c.penalty_reason, c.final_size, c.evidence_url, c.validated, c.validated_by,
                   c.validated_at, c.annulled, c.annulment_reason, c.counts_toward_quota,
                   c.captured_at, c.notes, c.created_at, c.deleted_at
            FROM captures c
            JOIN registrations r ON r.registration_id = c.registration_id
            WHERE r.stage_id = $1
              AND r.deleted_at IS NULL
              AND c.deleted_at IS NULL
            ORDER BY c.created_at, c.capture_id
            "#,
        )
        .bind(stage_id)
        .fetch_all(&mut *self.conn)
        .await?
        .into_iter()
        .map(Capture::try_from)
        .collect()
    }

    /// Live captures of live registrations matching `filter`, latest catch first.
    pub async fn list(&mut self, filter: &CaptureFilter) -> Result<Vec<Capture>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT c.capture_id, c.registration_id, c.species, c.original_size, c.penalty,
                   c.penalty_reason, c.final_size, c.evidence_url, c.validated, c.validated_by,
                   c.validated_at, c.annulled, c.annulment_reason, c.counts_toward_quota,
                   c.captured_at, c.notes, c.created_at, c.deleted_at
            FROM captures c
            JOIN registrations r ON r.registration_id = c.registration_id
            WHERE r.deleted_at IS NULL
              AND c.deleted_at IS NULL
            "#,
        );

        if let Some(stage_id) = filter.stage_id {
            query.push(" AND r.stage_id = ");
            query.push_bind(stage_id);
        }

        if let Some(registration_id) = filter.registration_id {
            query.push(" AND c.registration_id = ");
            query.push_bind(registration_id);
        }

        if let Some(species) = filter.species {
            query.push(" AND c.species = ");
            query.push_bind(species.as_str());
        }

        match filter.status {
            Some(CaptureStatus::Pending) => {
                query.push(" AND NOT c.validated AND NOT c.annulled");
            }
            Some(CaptureStatus::Validated) => {
                query.push(" AND c.validated AND NOT c.annulled");
            }
            Some(CaptureStatus::Annulled) => {
                query.push(" AND c.annulled");
            }
            None => {}
        }

        query.push(" ORDER BY c.captured_at DESC, c.capture_id");

        let rows: Vec<CaptureRow> = query.build_query_as().fetch_all(&mut *self.conn).await?;
        rows.into_iter().map(Capture::try_from).collect()
    }

    pub async fn insert(&mut self, capture: &Capture) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO captures (
                capture_id, registration_id, species, original_size, penalty,
                penalty_reason, final_size, evidence_url, validated, validated_by,
                validated_at, annulled, annulment_reason, counts_toward_quota,
                captured_at, notes, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(capture.capture_id)
        .bind(capture.registration_id)
        .bind(capture.species.as_str())
        .bind(capture.original_size)
        .bind(capture.penalty)
        .bind(&capture.penalty_reason)
        .bind(capture.final_size)
        .bind(&capture.evidence_url)
        .bind(capture.validated)
        .bind(&capture.validated_by)
        .bind(capture.validated_at)
        .bind(capture.annulled)
        .bind(&capture.annulment_reason)
        .bind(capture.counts_toward_quota)
        .bind(capture.captured_at)
        .bind(&capture.notes)
        .bind(capture.created_at)
        .bind(capture.deleted_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn update(&mut self, capture: &Capture) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE captures
            SET penalty = $2,
                penalty_reason = $3,
                final_size = $4,
                validated = $5,
                validated_by = $6,
                validated_at = $7,
                annulled = $8,
                annulment_reason = $9,
                notes = $10,
                deleted_at = $11
            WHERE capture_id = $1
            "#,
        )
        .bind(capture.capture_id)
        .bind(capture.penalty)
        .bind(&capture.penalty_reason)
        .bind(capture.final_size)
        .bind(capture.validated)
        .bind(&capture.validated_by)
        .bind(capture.validated_at)
        .bind(capture.annulled)
        .bind(&capture.annulment_reason)
        .bind(&capture.notes)
        .bind(capture.deleted_at)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(Entity::Capture));
        }

        Ok(())
    }
}
