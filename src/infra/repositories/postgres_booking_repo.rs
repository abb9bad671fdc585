use crate::domain::{models::booking::Booking, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, event_id, email, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.event_id).bind(&booking.email)
            .bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_event_and_email(&self, event_id: &str, email: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE event_id = $1 AND email = $2").bind(event_id).bind(email).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE event_id = $1 ORDER BY created_at ASC").bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
