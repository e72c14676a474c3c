//! Orders: placement, status workflow and read queries

pub mod coordinator;
mod error;
pub mod numbering;
pub mod query;
pub mod workflow;

pub use coordinator::{OrderCoordinator, OrderPolicy};
pub use error::OrderError;
pub use numbering::{DefaultTicketGenerator, TicketGenerator};
pub use workflow::{OrderWorkflow, can_transition};
