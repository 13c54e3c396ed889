//! Readiness poller for freshly spawned processes
//!
//! `Idle -> Spawning -> Polling(1..=max) -> Ready | Exhausted`
//!
//! Each attempt evaluates the analytics contract in the new process. Attempts
//! run back to back with no delay, and the loop always runs to completion.
//! Exhausting the budget is not an error: the process id is still handed back.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::transport::Transport;
use crate::config::ClientConfig;
use crate::process::{Contract, ProcessId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Spawning,
    Polling { attempt: u32 },
    Ready { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Result of spawning and polling a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOutcome {
    pub process_id: ProcessId,
    /// Always `Ready` or `Exhausted`
    pub state: PollState,
}

impl SpawnOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self.state, PollState::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self.state {
            PollState::Ready { attempts } | PollState::Exhausted { attempts } => attempts,
            _ => 0,
        }
    }
}

/// JavaScript-style truthiness of an eval output
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

pub struct ReadinessPoller {
    transport: Arc<dyn Transport>,
    contract: Contract,
    max_attempts: u32,
    state: PollState,
}

impl ReadinessPoller {
    pub fn new(transport: Arc<dyn Transport>, max_attempts: u32) -> Self {
        Self {
            transport,
            contract: Contract::analytics(),
            max_attempts: max_attempts.max(1),
            state: PollState::Idle,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self::new(transport, config.max_attempts)
    }

    pub fn with_contract(mut self, contract: Contract) -> Self {
        self.contract = contract;
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Spawn a process and poll it until the contract loads or attempts run out.
    ///
    /// Only a failed spawn is an error.
    pub async fn spawn_and_initialize(&mut self, label: &str) -> Result<SpawnOutcome> {
        self.state = PollState::Spawning;
        let process_id = match self.transport.spawn(label).await {
            Ok(id) => id,
            Err(e) => {
                self.state = PollState::Idle;
                return Err(e.context("failed to spawn process"));
            }
        };
        info!(process_id = %process_id, label, "spawned process, polling for readiness");

        let state = self.poll(&process_id).await;
        Ok(SpawnOutcome { process_id, state })
    }

    /// Poll an already spawned process
    pub async fn poll(&mut self, process_id: &ProcessId) -> PollState {
        let mut attempt = 0;

        while attempt < self.max_attempts {
            attempt += 1;
            self.state = PollState::Polling { attempt };

            match self.transport.eval(process_id, &self.contract).await {
                Ok(output) if is_truthy(&output) => {
                    info!(process_id = %process_id, attempt, "process ready");
                    debug!(process_id = %process_id, %output, "contract output");
                    self.state = PollState::Ready { attempts: attempt };
                    return self.state;
                }
                Ok(_) => {
                    debug!(process_id = %process_id, attempt, "no response from process");
                }
                Err(e) => {
                    debug!(process_id = %process_id, attempt, error = %e, "eval attempt failed");
                }
            }
        }

        warn!(
            process_id = %process_id,
            attempts = self.max_attempts,
            "process never confirmed readiness, continuing anyway"
        );
        self.state = PollState::Exhausted {
            attempts: self.max_attempts,
        };
        self.state
    }
}
