use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use soultrip_core::{
    Booking, BookingFilter, BookingPatch, BookingStore, NewBooking, StoreError, StoreResult,
};
use uuid::Uuid;

use crate::database::classify;

const BOOKING_COLUMNS: &str = "id, tour_id, participant_id, status, payment_status, created_at";

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    tour_id: Uuid,
    participant_id: Uuid,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            tour_id: row.tour_id,
            participant_id: row.participant_id,
            status: row.status.parse().map_err(|e: soultrip_core::CoreError| StoreError::Other(e.to_string()))?,
            payment_status: row
                .payment_status
                .parse()
                .map_err(|e: soultrip_core::CoreError| StoreError::Other(e.to_string()))?,
            created_at: row.created_at,
        })
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    qb.push(" WHERE TRUE");
    if let Some(id) = filter.id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(tour_id) = filter.tour_id {
        qb.push(" AND tour_id = ").push_bind(tour_id);
    }
    if let Some(participant_id) = filter.participant_id {
        qb.push(" AND participant_id = ").push_bind(participant_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(status) = filter.status_not {
        qb.push(" AND status <> ").push_bind(status.as_str());
    }
}

fn first(rows: Vec<BookingRow>) -> StoreResult<Option<Booking>> {
    rows.into_iter().next().map(Booking::try_from).transpose()
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert_booking(&self, booking: &NewBooking) -> StoreResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "INSERT INTO bookings (tour_id, participant_id, status, payment_status) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(booking.tour_id)
        .bind(booking.participant_id)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        row.try_into()
    }

    async fn update_bookings(
        &self,
        filter: &BookingFilter,
        patch: &BookingPatch,
    ) -> StoreResult<Option<Booking>> {
        let mut qb = QueryBuilder::new("UPDATE bookings SET updated_at = NOW()");
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(payment_status) = patch.payment_status {
            qb.push(", payment_status = ").push_bind(payment_status.as_str());
        }
        push_filter(&mut qb, filter);
        qb.push(" RETURNING ").push(BOOKING_COLUMNS);

        let rows = qb
            .build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        first(rows)
    }

    async fn delete_bookings(&self, filter: &BookingFilter) -> StoreResult<Option<Booking>> {
        let mut qb = QueryBuilder::new("DELETE FROM bookings");
        push_filter(&mut qb, filter);
        qb.push(" RETURNING ").push(BOOKING_COLUMNS);

        let rows = qb
            .build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        first(rows)
    }

    async fn count_bookings(&self, filter: &BookingFilter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM bookings");
        push_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;

        Ok(count.max(0) as u64)
    }

    async fn find_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM bookings", BOOKING_COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC");

        qb.build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soultrip_core::BookingStatus;

    #[test]
    fn test_filter_sql_shape() {
        let filter = BookingFilter::new()
            .id(Uuid::new_v4())
            .participant(Uuid::new_v4())
            .status_not(BookingStatus::Cancelled);
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM bookings");
        push_filter(&mut qb, &filter);

        assert_eq!(
            qb.sql(),
            "DELETE FROM bookings WHERE TRUE AND id = $1 AND participant_id = $2 AND status <> $3"
        );
    }

    #[test]
    fn test_row_with_unknown_status_is_rejected() {
        let row = BookingRow {
            id: Uuid::new_v4(),
            tour_id: Uuid::new_v4(),
            participant_id: Uuid::new_v4(),
            status: "refunded".to_string(),
            payment_status: "unpaid".to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(Booking::try_from(row), Err(StoreError::Other(_))));
    }
}
