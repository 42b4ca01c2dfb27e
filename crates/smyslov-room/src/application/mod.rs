//! Command and query handlers plus the per-room round machinery.

pub mod barrier;
pub mod command_handlers;
pub mod context;
mod publisher;
pub mod query_handlers;
mod registry;
pub mod round_coordinator;
