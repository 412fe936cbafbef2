//! vectorrag Pipeline
//!
//! Sequences one retrieval-augmented query: connectivity and index checks,
//! query embedding, similarity search, answer generation and output

pub mod app;
pub mod orchestrator;

pub use app::run;
pub use orchestrator::{Orchestrator, Stage};
