//! Generative-model rubric evaluation

pub mod client;
pub mod prompts;
pub mod evaluator;
