//! Pure domain logic: answers, cards and scoring rules.

pub mod answers;
pub mod cards;
pub mod scoring;
