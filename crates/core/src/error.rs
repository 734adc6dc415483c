use thiserror::Error;

/// Result type for codeeval operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for codeeval operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unreadable or empty codebase. Fatal for the run.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Malformed or inconsistent benchmark file
    #[error("Benchmark error: {0}")]
    Benchmark(String),

    /// Per-file embedding or upsert failure. The file is skipped.
    #[error("Indexing error for {path}: {message}")]
    Indexing { path: String, message: String },

    /// Index unreachable or empty. Fatal for the strategy's run.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Malformed citation text. Always recovered to an empty citation set.
    #[error("Extraction failure: {0}")]
    Extraction(String),

    /// Two result collections cover different question sets
    #[error(
        "Alignment error: {message} (missing from first: {missing_from_first:?}, \
         missing from second: {missing_from_second:?})"
    )]
    Alignment {
        message: String,
        missing_from_first: Vec<String>,
        missing_from_second: Vec<String>,
    },

    /// Embedding generation errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Storage related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// External agentic tool failures
    #[error("Agentic tool error: {0}")]
    AgenticTool(String),

    /// An operation exceeded its time budget
    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    /// Serialization errors for persisted artifacts
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a corpus error
    pub fn corpus(msg: impl Into<String>) -> Self {
        Self::Corpus(msg.into())
    }

    /// Creates a benchmark error
    pub fn benchmark(msg: impl Into<String>) -> Self {
        Self::Benchmark(msg.into())
    }

    /// Creates an indexing error for a single file
    pub fn indexing(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Indexing {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a retrieval error
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    /// Creates an extraction failure
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Creates an alignment error
    pub fn alignment(
        msg: impl Into<String>,
        missing_from_first: Vec<String>,
        missing_from_second: Vec<String>,
    ) -> Self {
        Self::Alignment {
            message: msg.into(),
            missing_from_first,
            missing_from_second,
        }
    }

    /// Creates an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Creates a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates an agentic tool error
    pub fn agentic_tool(msg: impl Into<String>) -> Self {
        Self::AgenticTool(msg.into())
    }

    /// Creates a timeout error
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error aborts the whole run rather than a single file or question
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Corpus(_) | Self::Alignment { .. } | Self::Config(_) | Self::Benchmark(_)
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}
