use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::DatabaseConfig;
use crate::error::StartupError;

/// Connection pool for whichever backend `DATABASE_URL` points at.
#[derive(Clone)]
pub enum Database {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

fn is_postgres_url(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

impl Database {
    /// Connects and applies pending migrations.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, StartupError> {
        if is_postgres_url(&config.url) {
            info!("Initializing PostgreSQL connection...");

            let opts = PgConnectOptions::from_str(&config.url)?
                .log_statements(LevelFilter::Debug)
                .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout)
                .idle_timeout(config.idle_timeout)
                .connect_with(opts)
                .await?;

            sqlx::migrate!("./migrations/postgres").run(&pool).await?;
            info!("PostgreSQL migrations applied");
            Ok(Database::Postgres(pool))
        } else {
            info!("Initializing SQLite connection with WAL Mode...");

            let opts = SqliteConnectOptions::from_str(&config.url)?
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5))
                .log_statements(LevelFilter::Debug)
                .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

            let pool = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout)
                .idle_timeout(config.idle_timeout)
                .connect_with(opts)
                .await?;

            sqlx::migrate!("./migrations/sqlite").run(&pool).await?;
            info!("SQLite migrations applied");
            Ok(Database::Sqlite(pool))
        }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        match self {
            Database::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            Database::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        }
    }

    pub async fn close(&self) {
        match self {
            Database::Sqlite(pool) => pool.close().await,
            Database::Postgres(pool) => pool.close().await,
        }
        info!("Database pool closed");
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Database::Sqlite(_) => "sqlite",
            Database::Postgres(_) => "postgres",
        }
    }
}
