pub mod month;
pub mod visit;

pub use month::{Month, UnknownMonth};
pub use visit::{AggregateResult, VisitRecord, DEFAULT_PAGE};
