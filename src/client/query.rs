use anyhow::{anyhow, Context, Result};
use tracing::{error, info};

use super::transport::Transport;
use crate::models::{AggregateResult, Month};
use crate::process::message::{ANALYTICS_ERROR, VISITOR_INCREMENTED};
use crate::process::{DeliveryResult, Message, ProcessId};

/// Query a process for its aggregate counts.
///
/// One attempt only. Transport and decode failures are logged and come back
/// as `None` so callers can render an empty dashboard.
pub async fn fetch_all_counts(
    transport: &dyn Transport,
    process_id: &ProcessId,
) -> Option<AggregateResult> {
    let result = transport
        .dry_run(process_id, Message::get_all_counts())
        .await
        .and_then(|delivery| decode_counts(&delivery));

    match result {
        Ok(counts) => Some(counts),
        Err(e) => {
            error!(process_id = %process_id, "Error fetching analytics data: {:#}", e);
            None
        }
    }
}

/// Decode the first reply of a `GetAllCounts` delivery
pub fn decode_counts(delivery: &DeliveryResult) -> Result<AggregateResult> {
    let reply = delivery
        .messages
        .first()
        .ok_or_else(|| anyhow!("process sent no reply"))?;

    serde_json::from_str(&reply.data).context("malformed aggregate payload")
}

/// Report one visit to `page` in `month`, returning the process's acknowledgment
pub async fn track_visit(
    transport: &dyn Transport,
    process_id: &ProcessId,
    month: Month,
    page: &str,
) -> Result<String> {
    let delivery = transport
        .send(process_id, Message::increment_visitor(month, page))
        .await?;

    let reply = delivery
        .messages
        .first()
        .ok_or_else(|| anyhow!("process sent no reply; is the analytics contract loaded?"))?;

    match reply.action.as_str() {
        VISITOR_INCREMENTED => {
            info!(process_id = %process_id, %month, page, "visit recorded");
            Ok(reply.data.clone())
        }
        ANALYTICS_ERROR => Err(anyhow!("process rejected visit: {}", reply.data)),
        other => Err(anyhow!("unexpected reply action '{other}'")),
    }
}
