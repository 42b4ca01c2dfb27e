//! Smyslov: Prompts & Scoring bounded context.
//!
//! Parses player answers and custom cards, picks the prompt for a round and
//! scores a round under its comparison rule.

pub mod application;
pub mod domain;
