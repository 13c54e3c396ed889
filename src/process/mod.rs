//! Message-driven processes hosting the analytics contract
//!
//! A process is an actor with its own mailbox. Evaluating the analytics
//! contract in it seeds the visit counters and installs the handlers for
//! `Analytics.IncrementVisitor` and `Analytics.GetAllCounts`.

mod actor;
pub mod contract;
pub mod error;
pub mod handlers;
pub mod message;
pub mod node;

pub use contract::{Contract, ANALYTICS_CONTRACT};
pub use error::{CommandError, ProcessError, ProcessResult};
pub use handlers::AnalyticsHandlers;
pub use message::{Command, DeliveryResult, Message, OutboundMessage, ProcessId};
pub use node::{ProcessInfo, ProcessNode};
