use crate::models::{Month, VisitRecord};
use crate::storage::Storage;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visitors (
                process_id TEXT NOT NULL,
                month TEXT NOT NULL,
                page TEXT NOT NULL,
                count BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (process_id, month, page)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn seed_months(&self, process_id: &str, page: &str) -> Result<()> {
        let months: Vec<&'static str> = Month::ALL.iter().map(Month::as_str).collect();

        sqlx::query(
            r#"
            INSERT INTO visitors (process_id, month, page, count)
            SELECT $1, month, $2, 0 FROM UNNEST($3::TEXT[]) AS month
            ON CONFLICT (process_id, month, page) DO NOTHING
            "#,
        )
        .bind(process_id)
        .bind(page)
        .bind(months)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn increment_visit(&self, process_id: &str, month: Month, page: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO visitors (process_id, month, page, count)
            VALUES ($1, $2, $3, 1)
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
            WHERE process_id = $1
            "#,
        )
        .bind(process_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records)
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(
            r#"
            SELECT table_name::TEXT
            FROM information_schema.tables
            WHERE table_schema = current_schema()
            ORDER BY table_name
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(tables)
    }
}
