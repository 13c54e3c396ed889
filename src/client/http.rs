use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::transport::Transport;
use crate::api::handlers::{EvalRequest, EvalResponse, SpawnRequest, SpawnResponse};
use crate::process::{Contract, DeliveryResult, Message, ProcessId, ProcessInfo};

/// Transport speaking to a node's HTTP API
pub struct HttpTransport {
    base_url: String,
    owner: Option<String>,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, owner: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            owner,
            http: reqwest::Client::new(),
        }
    }

    /// Processes known to the node
    pub async fn processes(&self) -> Result<Vec<ProcessInfo>> {
        let response = self
            .http
            .get(format!("{}/processes", self.base_url))
            .send()
            .await
            .context("failed to reach node")?;
        decode(response).await
    }

    async fn post_message(
        &self,
        process_id: &ProcessId,
        endpoint: &str,
        message: Message,
    ) -> Result<DeliveryResult> {
        let response = self
            .http
            .post(format!(
                "{}/processes/{}/{}",
                self.base_url, process_id, endpoint
            ))
            .json(&message.or_sender(self.owner.as_deref()))
            .send()
            .await
            .context("failed to reach node")?;
        decode(response).await
    }
}

/// Decode a JSON body, turning error statuses into errors carrying the node's message
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("node returned {status}: {body}");
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn spawn(&self, label: &str) -> Result<ProcessId> {
        let response = self
            .http
            .post(format!("{}/processes", self.base_url))
            .json(&SpawnRequest {
                label: label.to_string(),
                owner: self.owner.clone(),
            })
            .send()
            .await
            .context("failed to reach node")?;
        let spawned: SpawnResponse = decode(response).await?;
        Ok(spawned.id)
    }

    async fn eval(&self, process_id: &ProcessId, contract: &Contract) -> Result<serde_json::Value> {
        let response = self
            .http
            .post(format!("{}/processes/{}/eval", self.base_url, process_id))
            .json(&EvalRequest {
                contract: contract.clone(),
            })
            .send()
            .await
            .context("failed to reach node")?;
        let evaluated: EvalResponse = decode(response).await?;
        Ok(evaluated.output)
    }

    async fn send(&self, process_id: &ProcessId, message: Message) -> Result<DeliveryResult> {
        self.post_message(process_id, "messages", message).await
    }

    async fn dry_run(&self, process_id: &ProcessId, message: Message) -> Result<DeliveryResult> {
        self.post_message(process_id, "dryrun", message).await
    }
}
