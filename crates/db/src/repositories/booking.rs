use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use teetime_core::domain::booking::{Booking, BookingId};
use teetime_core::domain::course::CourseId;
use teetime_core::pipeline::{BookingStore, StoreError};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM booking")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl BookingStore for SqlBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO booking (id, course_id, booking_date, booking_time, contact_address, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.id.as_str())
        .bind(&booking.course_id.0)
        .bind(&booking.date)
        .bind(&booking.time)
        .bind(&booking.contact_address)
        .bind(booking.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                Err(StoreError::DuplicateKey(booking.id.clone()))
            }
            Err(error) => Err(RepositoryError::Database(error).into()),
        }
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query(
            "SELECT id, course_id, booking_date, booking_time, contact_address, created_at
             FROM booking WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.map(|row| booking_from_row(&row)).transpose()?)
    }
}

fn booking_from_row(row: &SqliteRow) -> Result<Booking, RepositoryError> {
    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|error| RepositoryError::Decode(format!("booking.created_at: {error}")))?
        .with_timezone(&Utc);

    Ok(Booking {
        id: BookingId(row.try_get("id")?),
        course_id: CourseId(row.try_get("course_id")?),
        date: row.try_get("booking_date")?,
        time: row.try_get("booking_time")?,
        contact_address: row.try_get("contact_address")?,
        created_at,
    })
}
