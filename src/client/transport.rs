use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::process::{Contract, DeliveryResult, Message, ProcessId, ProcessNode};

/// Calls a client can make against a process node
#[async_trait]
pub trait Transport: Send + Sync {
    /// Spawn a process carrying a human-readable label
    async fn spawn(&self, label: &str) -> Result<ProcessId>;

    /// Evaluate a contract in a process; the output is truthy on success
    async fn eval(&self, process_id: &ProcessId, contract: &Contract) -> Result<serde_json::Value>;

    /// Deliver a message and collect the process's replies
    async fn send(&self, process_id: &ProcessId, message: Message) -> Result<DeliveryResult>;

    /// Deliver a read-only message and collect the process's replies
    async fn dry_run(&self, process_id: &ProcessId, message: Message) -> Result<DeliveryResult>;
}

/// Transport bound to a node running in the same process.
///
/// `owner` is recorded on spawned processes and as the sender of every
/// message, so replies are addressed back to this client.
pub struct LocalTransport {
    node: Arc<ProcessNode>,
    owner: Option<String>,
}

impl LocalTransport {
    pub fn new(node: Arc<ProcessNode>, owner: Option<String>) -> Self {
        Self { node, owner }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn spawn(&self, label: &str) -> Result<ProcessId> {
        Ok(self.node.spawn(label, self.owner.as_deref()))
    }

    async fn eval(&self, process_id: &ProcessId, contract: &Contract) -> Result<serde_json::Value> {
        let tables = self.node.eval(process_id, contract.clone()).await?;
        Ok(serde_json::Value::from(tables))
    }

    async fn send(&self, process_id: &ProcessId, message: Message) -> Result<DeliveryResult> {
        let message = message.or_sender(self.owner.as_deref());
        Ok(self.node.send(process_id, message).await?)
    }

    async fn dry_run(&self, process_id: &ProcessId, message: Message) -> Result<DeliveryResult> {
        let message = message.or_sender(self.owner.as_deref());
        Ok(self.node.dry_run(process_id, message).await?)
    }
}
