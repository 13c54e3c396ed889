//! Per-process actor
//!
//! Each process owns a bounded mailbox drained by a single task, so messages
//! are handled one at a time in arrival order. Concurrent increments from many
//! visitors therefore never race on the same counter row.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::contract::Contract;
use super::error::ProcessResult;
use super::handlers::AnalyticsHandlers;
use super::message::{DeliveryResult, Message, ProcessId};
use crate::storage::Storage;

/// Message types for the ProcessActor
pub(crate) enum ActorMessage {
    /// Evaluate a contract, installing its handlers
    Eval {
        contract: Contract,
        reply: oneshot::Sender<ProcessResult<Vec<String>>>,
    },
    /// Deliver a message to the installed handlers
    Deliver {
        message: Message,
        dry_run: bool,
        reply: oneshot::Sender<ProcessResult<DeliveryResult>>,
    },
}

pub(crate) struct ProcessActor {
    process_id: ProcessId,
    receiver: mpsc::Receiver<ActorMessage>,
    storage: Arc<dyn Storage>,
    /// Installed by the first successful contract evaluation
    handlers: Option<AnalyticsHandlers>,
}

impl ProcessActor {
    pub(crate) fn new(
        process_id: ProcessId,
        receiver: mpsc::Receiver<ActorMessage>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            process_id,
            receiver,
            storage,
            handlers: None,
        }
    }

    pub(crate) async fn run(mut self) {
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ActorMessage::Eval { contract, reply } => {
                    let result = self.eval(contract).await;
                    if reply.send(result).is_err() {
                        debug!(process_id = %self.process_id, "eval caller went away");
                    }
                }
                ActorMessage::Deliver {
                    message,
                    dry_run,
                    reply,
                } => {
                    let result = match &self.handlers {
                        Some(handlers) => handlers.handle(&message, dry_run).await,
                        None => {
                            debug!(
                                process_id = %self.process_id,
                                action = %message.action,
                                "no contract loaded, ignoring message"
                            );
                            Ok(DeliveryResult::default())
                        }
                    };
                    if reply.send(result).is_err() {
                        debug!(process_id = %self.process_id, "delivery caller went away");
                    }
                }
            }
        }

        info!(process_id = %self.process_id, "process mailbox closed, actor stopping");
    }

    async fn eval(&mut self, contract: Contract) -> ProcessResult<Vec<String>> {
        contract.validate()?;

        let handlers = AnalyticsHandlers::new(
            self.process_id.clone(),
            Arc::clone(&self.storage),
            contract.default_page,
        );

        match handlers.initialize().await {
            Ok(tables) => {
                self.handlers = Some(handlers);
                Ok(tables)
            }
            Err(err) => {
                warn!(process_id = %self.process_id, error = %err, "contract initialization failed");
                Err(err)
            }
        }
    }
}
