//! Application services for the Prompts & Scoring context.

pub mod prompt_selector;
