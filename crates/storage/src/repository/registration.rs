use chrono::{DateTime, Utc};
use engine::error::Entity;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::parse_column;
use crate::dto::RegistrationFilter;
use crate::error::{Result, StorageError};
use crate::models::Registration;

const REGISTRATION_COLUMNS: &str = r#"
    registration_id, stage_id, competitor_id, ruler_id, registered_at, amount_paid,
    payment_status, paid_at, payment_receipt, eliminated, elimination_reason,
    eliminated_at, ruler_returned, ruler_returned_at, total_score, counted_fish, deleted_at
"#;

#[derive(FromRow)]
struct RegistrationRow {
    registration_id: Uuid,
    stage_id: Uuid,
    competitor_id: Uuid,
    ruler_id: Option<Uuid>,
    registered_at: DateTime<Utc>,
    amount_paid: Decimal,
    payment_status: String,
    paid_at: Option<DateTime<Utc>>,
    payment_receipt: Option<String>,
    eliminated: bool,
    elimination_reason: Option<String>,
    eliminated_at: Option<DateTime<Utc>>,
    ruler_returned: bool,
    ruler_returned_at: Option<DateTime<Utc>>,
    total_score: Decimal,
    counted_fish: i32,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = StorageError;

    fn try_from(row: RegistrationRow) -> Result<Self> {
        Ok(Self {
            registration_id: row.registration_id,
            stage_id: row.stage_id,
            competitor_id: row.competitor_id,
            ruler_id: row.ruler_id,
            registered_at: row.registered_at,
            amount_paid: row.amount_paid,
            payment_status: parse_column(&row.payment_status)?,
            paid_at: row.paid_at,
            payment_receipt: row.payment_receipt,
            eliminated: row.eliminated,
            elimination_reason: row.elimination_reason,
            eliminated_at: row.eliminated_at,
            ruler_returned: row.ruler_returned,
            ruler_returned_at: row.ruler_returned_at,
            total_score: row.total_score,
            counted_fish: row.counted_fish,
            deleted_at: row.deleted_at,
        })
    }
}

pub struct RegistrationRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RegistrationRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Locks the registration row. Capture intake and validation serialize here.
    pub async fn lock(&mut self, registration_id: Uuid) -> Result<Registration> {
        let query = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE registration_id = $1 AND deleted_at IS NULL \
             FOR UPDATE"
        );

        sqlx::query_as::<_, RegistrationRow>(&query)
            .bind(registration_id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or(StorageError::NotFound(Entity::Registration))?
            .try_into()
    }

    pub async fn exists_for(&mut self, stage_id: Uuid, competitor_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM registrations
                WHERE stage_id = $1 AND competitor_id = $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(stage_id)
        .bind(competitor_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(exists)
    }

    /// Live registrations of a stage in enrollment order.
    pub async fn list_for_stage(&mut self, stage_id: Uuid) -> Result<Vec<Registration>> {
        let query = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE stage_id = $1 AND deleted_at IS NULL \
             ORDER BY registered_at, registration_id"
        );

        sqlx::query_as::<_, RegistrationRow>(&query)
            .bind(stage_id)
            .fetch_all(&mut *self.conn)
            .await?
            .into_iter()
            .map(Registration::try_from)
            .collect()
    }

    /// Live registrations matching `filter` in enrollment order.
    pub async fn list(&mut self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE deleted_at IS NULL"
        ));

        if let Some(stage_id) = filter.stage_id {
            query.push(" AND stage_id = ");
            query.push_bind(stage_id);
        }

        if let Some(competitor_id) = filter.competitor_id {
            query.push(" AND competitor_id = ");
            query.push_bind(competitor_id);
        }

        if let Some(status) = filter.payment_status {
            query.push(" AND payment_status = ");
            query.push_bind(status.as_str());
        }

        query.push(" ORDER BY registered_at, registration_id");

        let rows: Vec<RegistrationRow> =
            query.build_query_as().fetch_all(&mut *self.conn).await?;
        rows.into_iter().map(Registration::try_from).collect()
    }

    /// Every registration that references the ruler, removed ones included.
    pub async fn list_holding_ruler(&mut self, ruler_id: Uuid) -> Result<Vec<Registration>> {
        let query = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE ruler_id = $1");

        sqlx::query_as::<_, RegistrationRow>(&query)
            .bind(ruler_id)
            .fetch_all(&mut *self.conn)
            .await?
            .into_iter()
            .map(Registration::try_from)
            .collect()
    }

    pub async fn insert(&mut self, registration: &Registration) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO registrations (
                registration_id, stage_id, competitor_id, ruler_id, registered_at,
                amount_paid, payment_status, paid_at, payment_receipt, eliminated,
                elimination_reason, eliminated_at, ruler_returned, ruler_returned_at,
                total_score, counted_fish, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(registration.registration_id)
        .bind(registration.stage_id)
        .bind(registration.competitor_id)
        .bind(registration.ruler_id)
        .bind(registration.registered_at)
        .bind(registration.amount_paid)
        .bind(registration.payment_status.as_str())
        .bind(registration.paid_at)
        .bind(&registration.payment_receipt)
        .bind(registration.eliminated)
        .bind(&registration.elimination_reason)
        .bind(registration.eliminated_at)
        .bind(registration.ruler_returned)
        .bind(registration.ruler_returned_at)
        .bind(registration.total_score)
        .bind(registration.counted_fish)
        .bind(registration.deleted_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Writes back every mutable column. Identity and enrollment time never change.
    pub async fn update(&mut self, registration: &Registration) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET ruler_id = $2,
                amount_paid = $3,
                payment_status = $4,
                paid_at = $5,
                payment_receipt = $6,
                eliminated = $7,
                elimination_reason = $8,
                eliminated_at = $9,
                ruler_returned = $10,
                ruler_returned_at = $11,
                total_score = $12,
                counted_fish = $13,
                deleted_at = $14
            WHERE registration_id = $1
            "#,
        )
        .bind(registration.registration_id)
        .bind(registration.ruler_id)
        .bind(registration.amount_paid)
        .bind(registration.payment_status.as_str())
        .bind(registration.paid_at)
        .bind(&registration.payment_receipt)
        .bind(registration.eliminated)
        .bind(&registration.elimination_reason)
        .bind(registration.eliminated_at)
        .bind(registration.ruler_returned)
        .bind(registration.ruler_returned_at)
        .bind(registration.total_score)
        .bind(registration.counted_fish)
        .bind(registration.deleted_at)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(Entity::Registration));
        }

        Ok(())
    }
}
