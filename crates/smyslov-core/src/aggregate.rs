//! Aggregate root abstraction.

use crate::event::DomainEvent;
use crate::model::RoomCode;

/// Trait for aggregate roots that record events while handling commands.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> &RoomCode;

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Removes and returns uncommitted events after persistence.
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event>;
}
