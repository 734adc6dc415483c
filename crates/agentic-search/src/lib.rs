//! Agentic retrieval through an external code-search tool
//!
//! The tool is asked each benchmark question with a prompt requesting
//! `FILE:` lines; its free-text answer is turned into cited corpus paths by
//! the [`CitationExtractor`].
//!
//! ## Main Entry Points
//! - [`AgenticStrategy`] - the tool as a [`codeeval_core::RetrievalStrategy`]
//! - [`CommandQueryClient`] - runs the tool as a child process
//! - [`CitationExtractor`] - response text to cited paths

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod citations;
mod client;
mod config;
mod error;
mod prompts;
mod strategy;

pub use citations::{
    normalize_path, BacktickMatcher, CitationExtractor, CitationMatcher, Citations,
    FileMarkerMatcher, PathPatternMatcher,
};
pub use client::{AgenticQueryClient, CommandQueryClient};
pub use config::QueryToolConfig;
pub use error::{AgenticSearchError, Result};
pub use prompts::file_citation_prompt;
pub use strategy::AgenticStrategy;
