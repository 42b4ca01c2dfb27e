//! Shared test mocks and utilities for the Smyslov party-game engine.

mod clock;
mod logging;
mod notifier;
mod repository;
mod rng;

pub use clock::{FixedClock, ManualClock};
pub use logging::init_tracing;
pub use notifier::{Delivery, RecordingNotifier};
pub use repository::{FailingRepository, InMemoryRepository};
pub use rng::{MockRng, SequenceRng};
