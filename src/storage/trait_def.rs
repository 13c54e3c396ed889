use crate::models::{Month, VisitRecord};
use anyhow::Result;
use async_trait::async_trait;

/// Visit counter store shared by every process on a node
///
/// Rows are scoped by process id; one process never sees another's counters.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create the visitors table if absent)
    async fn init(&self) -> Result<()>;

    /// Seed every month with a zero count for `page`, leaving existing rows untouched
    async fn seed_months(&self, process_id: &str, page: &str) -> Result<()>;

    /// Add one visit to (month, page), creating the row at 1 if absent.
    /// Returns the new count.
    async fn increment_visit(&self, process_id: &str, month: Month, page: &str) -> Result<i64>;

    /// All counter rows of a process
    async fn list_visits(&self, process_id: &str) -> Result<Vec<VisitRecord>>;

    /// Names of the tables in the database
    async fn list_tables(&self) -> Result<Vec<String>>;
}
