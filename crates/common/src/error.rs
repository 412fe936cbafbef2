/// vectorrag error types
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// One or more required settings are absent or empty
    #[error("Configuration error: missing required settings: {}", .missing.join(", "))]
    Configuration { missing: Vec<String> },

    /// A setting is present but malformed
    #[error("Configuration error: {0}")]
    InvalidSetting(String),

    /// Graph store unreachable or credentials rejected
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Named vector index absent from the store
    #[error(
        "Vector index '{name}' not found. Run the reset.cypher step to create it \
         (or `CREATE VECTOR INDEX {name} IF NOT EXISTS FOR (m:Movie) ON m.plotEmbedding`)."
    )]
    MissingIndex { name: String },

    /// Embedding request failed
    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// Similarity search failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Language model request failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Create configuration error listing every missing setting
    pub fn missing_settings<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Configuration {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Create invalid setting error
    pub fn invalid_setting<S: Into<String>>(msg: S) -> Self {
        Self::InvalidSetting(msg.into())
    }

    /// Create connectivity error
    pub fn connectivity<S: Into<String>>(msg: S) -> Self {
        Self::Connectivity(msg.into())
    }

    /// Create missing index error
    pub fn missing_index<S: Into<String>>(name: S) -> Self {
        Self::MissingIndex { name: name.into() }
    }

    /// Create embedding provider error
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        Self::EmbeddingProvider(msg.into())
    }

    /// Create retrieval error
    pub fn retrieval<S: Into<String>>(msg: S) -> Self {
        Self::Retrieval(msg.into())
    }

    /// Create generation error
    pub fn generation<S: Into<String>>(msg: S) -> Self {
        Self::Generation(msg.into())
    }
}

impl RagError {
    /// Taxonomy name reported at the top level
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "ConfigurationError",
            Self::InvalidSetting(_) => "ConfigurationError",
            Self::Connectivity(_) => "ConnectivityError",
            Self::MissingIndex { .. } => "MissingIndexError",
            Self::EmbeddingProvider(_) => "EmbeddingProviderError",
            Self::Retrieval(_) => "RetrievalError",
            Self::Generation(_) => "GenerationError",
            Self::Io(_) => "IoError",
            Self::Other(_) => "InternalError",
        }
    }
}
