//! Smyslov: Room & Round Orchestration bounded context.
//!
//! Owns the room lifecycle, drives each round through its answer window and
//! readiness barrier, scores it, and gates advancement on the host.

pub mod application;
pub mod config;
pub mod domain;
