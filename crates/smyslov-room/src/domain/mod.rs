//! Room aggregate, its commands and its events.

pub mod aggregates;
pub mod commands;
pub mod events;
