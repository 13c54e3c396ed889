//! Client side: transports, readiness polling, queries and the dashboard view

pub mod dashboard;
pub mod http;
pub mod poller;
pub mod query;
pub mod transport;

pub use dashboard::DashboardView;
pub use http::HttpTransport;
pub use poller::{PollState, ReadinessPoller, SpawnOutcome};
pub use query::{fetch_all_counts, track_visit};
pub use transport::{LocalTransport, Transport};
