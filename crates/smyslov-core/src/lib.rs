//! Smyslov Core: shared domain abstractions.
//!
//! This crate defines the room and player model together with the ports
//! (clock, randomness, storage, delivery) that the bounded contexts depend
//! on. It contains no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod model;
pub mod notifier;
pub mod repository;
pub mod rng;
pub mod timer;
