pub mod config;
pub mod error;
pub mod logger;
pub mod record;

// Re-export commonly used types
pub use config::{AppConfig, MAX_RETRIES_LIMIT, LogSettings, OpenAiSettings, QuerySettings, StoreSettings};
pub use error::RagError;
pub use record::Record;
pub type Result<T> = std::result::Result<T, RagError>;
