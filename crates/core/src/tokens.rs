//! Token counting used for the cost side of the evaluation

use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Counts model tokens in a piece of text
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    /// Short identifier recorded in result files
    fn name(&self) -> &str;
}

/// Exact counts with the `cl100k_base` encoding used by OpenAI models
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn cl100k() -> anyhow::Result<Self> {
        Ok(Self {
            bpe: tiktoken_rs::cl100k_base()?,
        })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn name(&self) -> &str {
        "cl100k_base"
    }
}

/// ~4 characters per token
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproximateTokenCounter;

impl TokenCounter for ApproximateTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.len() / 4
    }

    fn name(&self) -> &str {
        "approx_4_chars"
    }
}

/// The exact counter, falling back to the approximation if the encoding can't load
pub fn default_token_counter() -> Arc<dyn TokenCounter> {
    match TiktokenCounter::cl100k() {
        Ok(counter) => Arc::new(counter),
        Err(e) => {
            warn!("Could not load cl100k_base encoding ({e}), approximating token counts");
            Arc::new(ApproximateTokenCounter)
        }
    }
}
