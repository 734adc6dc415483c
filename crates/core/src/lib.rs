//! Core types and traits for the codeeval retrieval evaluation harness
//!
//! This crate provides the foundational abstractions shared by every other
//! crate in the workspace:
//!
//! - **Benchmark**: questions with expert-labelled ground truth
//! - **Corpus**: the source files of the codebase under evaluation
//! - **Retrieval**: the strategy interface and per-question results
//! - **Tokens**: token counting for the cost side of the comparison
//! - **Configuration**: layered system configuration
//! - **Error handling**: unified error types
//!
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod benchmark;
pub mod config;
pub mod corpus;
pub mod error;
pub mod retrieval;
pub mod tokens;

// Re-export main types for convenience
pub use benchmark::{Benchmark, Question, QuestionCategory};
pub use config::{
    AgenticConfig, Config, CorpusConfig, EmbeddingsConfig, EvaluationConfig, RagConfig,
    StorageConfig,
};
pub use corpus::{load_corpus, Corpus, CorpusEntry, PathResolver};
pub use error::{Error, Result, ResultExt};
pub use retrieval::{RetrievalResult, RetrievalStrategy, Strategy};
pub use tokens::{default_token_counter, ApproximateTokenCounter, TiktokenCounter, TokenCounter};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::benchmark::{Benchmark, Question};
    pub use crate::config::Config;
    pub use crate::corpus::{Corpus, CorpusEntry};
    pub use crate::error::{Result, ResultExt};
}
