use crate::domain::{models::event::{Event, EventSort}, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::SqlitePool;

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, title, slug, description, overview, image, venue, location,
                date, time, mode, audience, agenda, organizer, tags, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&event.id)
            .bind(&event.title)
            .bind(&event.slug)
            .bind(&event.description)
            .bind(&event.overview)
            .bind(&event.image)
            .bind(&event.venue)
            .bind(&event.location)
            .bind(&event.date)
            .bind(&event.time)
            .bind(&event.mode)
            .bind(&event.audience)
            .bind(&event.agenda)
            .bind(&event.organizer)
            .bind(&event.tags)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        let sql = match sort {
            EventSort::Newest => "SELECT * FROM events ORDER BY created_at DESC",
            EventSort::Upcoming => "SELECT * FROM events ORDER BY date ASC, time ASC",
        };
        sqlx::query_as::<_, Event>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                title=?, slug=?, description=?, overview=?, image=?, venue=?, location=?,
                date=?, time=?, mode=?, audience=?, agenda=?, organizer=?, tags=?, updated_at=?
               WHERE id=? RETURNING *"#
        )
            .bind(&event.title)
            .bind(&event.slug)
            .bind(&event.description)
            .bind(&event.overview)
            .bind(&event.image)
            .bind(&event.venue)
            .bind(&event.location)
            .bind(&event.date)
            .bind(&event.time)
            .bind(&event.mode)
            .bind(&event.audience)
            .bind(&event.agenda)
            .bind(&event.organizer)
            .bind(&event.tags)
            .bind(event.updated_at)
            .bind(&event.id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_duplicate(&self, title: &str, date: &str, time: &str, venue: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE title = ? AND date = ? AND time = ? AND venue = ? LIMIT 1",
        )
            .bind(title)
            .bind(date)
            .bind(time)
            .bind(venue)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_slugs_like(&self, base: &str, exclude_id: Option<&str>) -> Result<Vec<String>, AppError> {
        let base = base.to_lowercase();
        sqlx::query_scalar::<_, String>(
            r#"SELECT slug FROM events
               WHERE (lower(slug) = ? OR lower(slug) LIKE ? || '-%')
                 AND (? IS NULL OR id != ?)"#
        )
            .bind(&base)
            .bind(&base)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_sharing_tags(&self, tags: &[String], exclude_id: &str) -> Result<Vec<Event>, AppError> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Event>(
            r#"SELECT * FROM events
               WHERE id != ?
                 AND EXISTS (
                    SELECT 1 FROM json_each(events.tags) AS t
                    WHERE t.value IN (SELECT value FROM json_each(?))
                 )
               ORDER BY created_at DESC"#
        )
            .bind(exclude_id)
            .bind(Json(tags))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
