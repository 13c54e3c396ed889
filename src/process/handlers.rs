//! Analytics handlers installed in a process by the analytics contract

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{ProcessError, ProcessResult};
use super::message::{
    Command, DeliveryResult, Message, ProcessId, ALL_COUNTS, ANALYTICS_ERROR, VISITOR_INCREMENTED,
};
use crate::models::{AggregateResult, Month};
use crate::storage::Storage;

pub struct AnalyticsHandlers {
    process_id: ProcessId,
    storage: Arc<dyn Storage>,
    default_page: String,
}

impl AnalyticsHandlers {
    pub fn new(process_id: ProcessId, storage: Arc<dyn Storage>, default_page: String) -> Self {
        Self {
            process_id,
            storage,
            default_page,
        }
    }

    /// Create the store if needed and seed zero counters for every month.
    ///
    /// Safe to run repeatedly; existing rows keep their counts.
    /// Returns the table names as the readiness signal.
    pub async fn initialize(&self) -> ProcessResult<Vec<String>> {
        self.storage.init().await?;
        self.storage
            .seed_months(self.process_id.as_str(), &self.default_page)
            .await?;

        let tables = self.storage.list_tables().await?;
        debug!(process_id = %self.process_id, ?tables, "analytics store initialized");
        Ok(tables)
    }

    /// Dispatch a message to the matching handler.
    ///
    /// Unmatched actions produce an empty result. Dry runs refuse mutating commands.
    pub async fn handle(&self, message: &Message, dry_run: bool) -> ProcessResult<DeliveryResult> {
        let command = match Command::parse(message) {
            None => {
                debug!(process_id = %self.process_id, action = %message.action, "no handler matched");
                return Ok(DeliveryResult::default());
            }
            Some(Ok(command)) => command,
            Some(Err(err)) => {
                warn!(process_id = %self.process_id, action = %message.action, error = %err, "rejected command");
                let mut result = DeliveryResult::reply(&message.from, ANALYTICS_ERROR, err.to_string());
                result.output = Some(err.to_string());
                return Ok(result);
            }
        };

        if dry_run && !command.is_read_only() {
            return Err(ProcessError::ReadOnly(command.action().to_string()));
        }

        match command {
            Command::IncrementVisitor { month, page } => {
                self.increment_visitor(&message.from, month, &page).await
            }
            Command::GetAllCounts => self.get_all_counts(&message.from).await,
        }
    }

    async fn increment_visitor(
        &self,
        from: &str,
        month: Month,
        page: &str,
    ) -> ProcessResult<DeliveryResult> {
        let count = self
            .storage
            .increment_visit(self.process_id.as_str(), month, page)
            .await?;

        info!(process_id = %self.process_id, %month, page, count, "visitor count incremented");

        Ok(DeliveryResult::reply(
            from,
            VISITOR_INCREMENTED,
            format!("Visitor count incremented for {month} on page {page}"),
        ))
    }

    async fn get_all_counts(&self, from: &str) -> ProcessResult<DeliveryResult> {
        let records = self.storage.list_visits(self.process_id.as_str()).await?;
        let aggregate = AggregateResult::from_records(&records);
        let data = serde_json::to_string(&aggregate).map_err(anyhow::Error::from)?;

        debug!(
            process_id = %self.process_id,
            rows = records.len(),
            all_time = aggregate.all_time_count,
            "computed aggregate counts"
        );

        Ok(DeliveryResult::reply(from, ALL_COUNTS, data))
    }
}
