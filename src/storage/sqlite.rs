use crate::models::{Month, VisitRecord};
use crate::storage::Storage;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to an in-memory database opens a fresh, empty one,
        // so keep exactly one connection alive for the lifetime of the pool.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?
        };

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visitors (
                process_id TEXT NOT NULL,
                month TEXT NOT NULL,
                page TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (process_id, month, page)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn seed_months(&self, process_id: &str, page: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for month in Month::ALL {
            sqlx::query(
                r#"
                INSERT INTO visitors (process_id, month, page, count)
                VALUES (?, ?, ?, 0)
                ON CONFLICT (process_id, month, page) DO NOTHING
                "#,
            )
            .bind(process_id)
            .bind(month.as_str())
            .bind(page)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn increment_visit(&self, process_id: &str, month: Month, page: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO visitors (process_id, month, page, count)
            VALUES (?, ?, ?, 1)
            ON CONFLICT (process_id, month, page) DO UPDATE SET count = visitors.count + 1
            RETURNING count
            "#,
        )
        .bind(process_id)
        .bind(month.as_str())
        .bind(page)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn list_visits(&self, process_id: &str) -> Result<Vec<VisitRecord>> {
        let records = sqlx::query_as::<_, VisitRecord>(
            r#"
            SELECT month, page, count
            FROM visitors
            WHERE process_id = ?
            "#,
        )
        .bind(process_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records)
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(tables)
    }
}
