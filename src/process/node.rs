//! Process node: spawns processes and routes calls to their actors

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::info;

use super::actor::{ActorMessage, ProcessActor};
use super::contract::Contract;
use super::error::{ProcessError, ProcessResult};
use super::message::{DeliveryResult, Message, ProcessId};
use crate::config::ProcessConfig;
use crate::storage::Storage;

/// Public description of a spawned process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub id: ProcessId,
    pub label: String,
    pub owner: Option<String>,
    pub spawned_at: DateTime<Utc>,
}

struct ProcessHandle {
    info: ProcessInfo,
    /// Evaluations before this instant fail with `NotReady`
    ready_at: Instant,
    sender: mpsc::Sender<ActorMessage>,
}

pub struct ProcessNode {
    processes: DashMap<ProcessId, Arc<ProcessHandle>>,
    storage: Arc<dyn Storage>,
    boot_delay: Duration,
    mailbox_size: usize,
}

impl ProcessNode {
    pub fn new(storage: Arc<dyn Storage>, config: &ProcessConfig) -> Self {
        Self {
            processes: DashMap::new(),
            storage,
            boot_delay: Duration::from_millis(config.boot_delay_ms),
            mailbox_size: config.mailbox_size.max(1),
        }
    }

    /// Allocate a process and start its actor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, label: &str, owner: Option<&str>) -> ProcessId {
        let id = ProcessId::generate();
        let (sender, receiver) = mpsc::channel(self.mailbox_size);

        let actor = ProcessActor::new(id.clone(), receiver, Arc::clone(&self.storage));
        tokio::spawn(async move {
            actor.run().await;
        });

        let info = ProcessInfo {
            id: id.clone(),
            label: label.to_string(),
            owner: owner.map(str::to_string),
            spawned_at: Utc::now(),
        };

        self.processes.insert(
            id.clone(),
            Arc::new(ProcessHandle {
                info,
                ready_at: Instant::now() + self.boot_delay,
                sender,
            }),
        );

        info!(process_id = %id, label, "spawned process");
        id
    }

    /// Evaluate a contract in the process; returns the store's table names
    pub async fn eval(&self, id: &ProcessId, contract: Contract) -> ProcessResult<Vec<String>> {
        let handle = self.handle(id)?;
        if Instant::now() < handle.ready_at {
            return Err(ProcessError::NotReady(id.clone()));
        }

        contract.validate()?;

        let (reply, response) = oneshot::channel();
        handle
            .sender
            .send(ActorMessage::Eval { contract, reply })
            .await
            .map_err(|_| ProcessError::Stopped(id.clone()))?;

        response
            .await
            .map_err(|_| ProcessError::Stopped(id.clone()))?
    }

    /// Deliver a message and return what the process sent back
    pub async fn send(&self, id: &ProcessId, message: Message) -> ProcessResult<DeliveryResult> {
        self.deliver(id, message, false).await
    }

    /// Deliver a read-only message; mutating actions are refused
    pub async fn dry_run(&self, id: &ProcessId, message: Message) -> ProcessResult<DeliveryResult> {
        self.deliver(id, message, true).await
    }

    /// All spawned processes, oldest first
    pub fn processes(&self) -> Vec<ProcessInfo> {
        let mut processes: Vec<ProcessInfo> = self
            .processes
            .iter()
            .map(|entry| entry.value().info.clone())
            .collect();
        processes.sort_by(|a, b| a.spawned_at.cmp(&b.spawned_at).then_with(|| a.id.cmp(&b.id)));
        processes
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    async fn deliver(
        &self,
        id: &ProcessId,
        message: Message,
        dry_run: bool,
    ) -> ProcessResult<DeliveryResult> {
        let handle = self.handle(id)?;

        let (reply, response) = oneshot::channel();
        handle
            .sender
            .send(ActorMessage::Deliver {
                message,
                dry_run,
                reply,
            })
            .await
            .map_err(|_| ProcessError::Stopped(id.clone()))?;

        response
            .await
            .map_err(|_| ProcessError::Stopped(id.clone()))?
    }

    fn handle(&self, id: &ProcessId) -> ProcessResult<Arc<ProcessHandle>> {
        self.processes
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ProcessError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateResult, Month};
    use crate::storage::SqliteStorage;

    async fn create_test_node(boot_delay_ms: u64) -> ProcessNode {
        let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
        storage.init().await.unwrap();
        ProcessNode::new(
            Arc::new(storage),
            &ProcessConfig {
                boot_delay_ms,
                mailbox_size: 16,
            },
        )
    }

    #[tokio::test]
    async fn test_spawn_and_eval() {
        let node = create_test_node(0).await;
        let id = node.spawn("site", Some("owner"));

        let tables = node.eval(&id, Contract::analytics()).await.unwrap();
        assert!(tables.contains(&"visitors".to_string()));

        let processes = node.processes();
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].label, "site");
        assert_eq!(processes[0].owner.as_deref(), Some("owner"));
    }

    #[tokio::test]
    async fn test_unknown_process() {
        let node = create_test_node(0).await;
        let err = node
            .eval(&ProcessId::from("missing"), Contract::analytics())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_contract() {
        let node = create_test_node(0).await;
        let id = node.spawn("site", None);
        let contract = Contract {
            name: "token".to_string(),
            default_page: "/".to_string(),
        };

        let err = node.eval(&id, contract).await.unwrap_err();
        assert!(matches!(err, ProcessError::UnknownContract(name) if name == "token"));
    }

    #[tokio::test]
    async fn test_eval_before_boot_is_not_ready() {
        let node = create_test_node(200).await;
        let id = node.spawn("site", None);

        let err = node.eval(&id, Contract::analytics()).await.unwrap_err();
        assert!(matches!(err, ProcessError::NotReady(_)));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(node.eval(&id, Contract::analytics()).await.is_ok());
    }

    #[tokio::test]
    async fn test_messages_before_contract_are_ignored() {
        let node = create_test_node(0).await;
        let id = node.spawn("site", None);

        let result = node
            .send(&id, Message::increment_visitor(Month::May, "/"))
            .await
            .unwrap();
        assert!(result.messages.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_serialized() {
        let node = Arc::new(create_test_node(0).await);
        let id = node.spawn("site", None);
        node.eval(&id, Contract::analytics()).await.unwrap();

        let mut handles = vec![];
        for _ in 0..25 {
            let node = Arc::clone(&node);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                node.send(&id, Message::increment_visitor(Month::March, "/"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let result = node.dry_run(&id, Message::get_all_counts()).await.unwrap();
        let aggregate: AggregateResult = serde_json::from_str(&result.messages[0].data).unwrap();
        assert_eq!(aggregate.all_time_count, 25);
        assert_eq!(aggregate.monthly_counts["March"], 25);
    }
}
