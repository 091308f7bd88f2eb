//! Document scoring: embeddings, rubric score extraction, aggregation

pub mod document;
pub mod embeddings;
pub mod embedding_manager;
pub mod score_parser;
pub mod aggregator;
pub mod pipeline;
