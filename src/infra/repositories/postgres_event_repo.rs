use crate::domain::{models::event::{Event, EventSort}, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, title, slug, description, overview, image, venue, location,
                "date", "time", mode, audience, agenda, organizer, tags, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
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
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        let sql = match sort {
            EventSort::Newest => r#"SELECT * FROM events ORDER BY created_at DESC"#,
            EventSort::Upcoming => r#"SELECT * FROM events ORDER BY "date" ASC, "time" ASC"#,
        };
        sqlx::query_as::<_, Event>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                title=$1, slug=$2, description=$3, overview=$4, image=$5, venue=$6, location=$7,
                "date"=$8, "time"=$9, mode=$10, audience=$11, agenda=$12, organizer=$13, tags=$14,
                updated_at=$15
               WHERE id=$16 RETURNING *"#
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
            r#"SELECT * FROM events WHERE title = $1 AND "date" = $2 AND "time" = $3 AND venue = $4 LIMIT 1"#,
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
        sqlx::query_scalar::<_, String>(
            r#"SELECT slug FROM events
               WHERE (lower(slug) = $1 OR lower(slug) LIKE $1 || '-%')
                 AND ($2::TEXT IS NULL OR id <> $2)"#
        )
            .bind(base.to_lowercase())
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
               WHERE id <> $1 AND tags ?| $2
               ORDER BY created_at DESC"#
        )
            .bind(exclude_id)
            .bind(tags)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
