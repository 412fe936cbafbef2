use crate::error::RagError;
use crate::logger::parse_log_level;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Settings that must be present and non-empty before any network activity
pub const REQUIRED_SETTINGS: [&str; 4] = [
    "NEO4J_URI",
    "NEO4J_USERNAME",
    "NEO4J_PASSWORD",
    "OPENAI_API_KEY",
];

/// Upper bound for OPENAI_MAX_RETRIES
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Sampling temperatures accepted by the chat completions API
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

const STORE_URI_SCHEMES: [&str; 6] = [
    "neo4j://",
    "neo4j+s://",
    "neo4j+ssc://",
    "bolt://",
    "bolt+s://",
    "bolt+ssc://",
];

/// Neo4j connection settings
#[derive(Clone, PartialEq)]
pub struct StoreSettings {
    /// Bolt/Neo4j URI
    pub uri: String,

    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// OpenAI-compatible API settings
#[derive(Clone, PartialEq)]
pub struct OpenAiSettings {
    /// API key (bearer token)
    pub api_key: String,

    /// API base URL, e.g. https://api.openai.com/v1
    pub base_url: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Chat model name used for answer generation
    pub llm_model: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Extra attempts after a failed request (0 = single attempt)
    pub max_retries: u32,

    /// Sampling temperature, provider default when unset
    pub temperature: Option<f32>,
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("llm_model", &self.llm_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// What to ask and how much context to retrieve
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySettings {
    /// Natural-language query
    pub text: String,

    /// Number of records to retrieve
    pub top_k: usize,

    /// Vector index to search
    pub index_name: String,

    /// Node properties projected into each record
    pub return_properties: Vec<String>,

    /// Print the retrieved records before the answer
    pub show_context: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            text: "Find me movies about war.".to_string(),
            top_k: 5,
            index_name: "moviePlots".to_string(),
            return_properties: vec!["title".to_string(), "plot".to_string()],
            show_context: false,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Optional directory for a log file; console only when unset
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl LogSettings {
    /// Load logging settings from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load logging settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            dir: get("LOG_DIR").map(PathBuf::from),
        }
    }
}

/// vectorrag application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub openai: OpenAiSettings,
    pub query: QuerySettings,
    pub logging: LogSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, RagError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Every missing required setting is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let [uri, username, password, api_key] = REQUIRED_SETTINGS.map(get);
        let missing: Vec<&str> = REQUIRED_SETTINGS
            .iter()
            .zip([&uri, &username, &password, &api_key])
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect();

        let (Some(uri), Some(username), Some(password), Some(api_key)) =
            (uri, username, password, api_key)
        else {
            return Err(RagError::missing_settings(missing));
        };

        let defaults = QuerySettings::default();

        let openai = OpenAiSettings {
            api_key,
            base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-ada-002".to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            timeout_secs: parse_setting("OPENAI_TIMEOUT_SECS", get("OPENAI_TIMEOUT_SECS"), 120)?,
            max_retries: parse_setting("OPENAI_MAX_RETRIES", get("OPENAI_MAX_RETRIES"), 0)?,
            temperature: get("LLM_TEMPERATURE")
                .map(|raw| parse_setting("LLM_TEMPERATURE", Some(raw), 0.0))
                .transpose()?,
        };

        let query = QuerySettings {
            text: get("RAG_QUERY").unwrap_or(defaults.text),
            top_k: parse_setting("RAG_TOP_K", get("RAG_TOP_K"), defaults.top_k)?,
            index_name: get("RAG_INDEX_NAME").unwrap_or(defaults.index_name),
            return_properties: get("RAG_RETURN_PROPERTIES")
                .map(|raw| split_properties(&raw))
                .unwrap_or(defaults.return_properties),
            show_context: get("RAG_SHOW_CONTEXT")
                .map(|raw| parse_flag("RAG_SHOW_CONTEXT", &raw))
                .transpose()?
                .unwrap_or(defaults.show_context),
        };

        Ok(Self {
            store: StoreSettings {
                uri,
                username,
                password,
            },
            openai,
            query,
            logging: LogSettings::from_lookup(&lookup),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), RagError> {
        if !STORE_URI_SCHEMES
            .iter()
            .any(|scheme| self.store.uri.starts_with(scheme))
        {
            return Err(RagError::invalid_setting(format!(
                "NEO4J_URI must use one of the schemes {}, got '{}'",
                STORE_URI_SCHEMES.join(", "),
                self.store.uri
            )));
        }

        if !self.openai.base_url.starts_with("http://")
            && !self.openai.base_url.starts_with("https://")
        {
            return Err(RagError::invalid_setting(
                "OPENAI_BASE_URL must start with http:// or https://",
            ));
        }

        if self.openai.max_retries > MAX_RETRIES_LIMIT {
            return Err(RagError::invalid_setting(format!(
                "OPENAI_MAX_RETRIES must be at most {}, got {}",
                MAX_RETRIES_LIMIT, self.openai.max_retries
            )));
        }

        if let Some(temperature) = self.openai.temperature {
            if !TEMPERATURE_RANGE.contains(&temperature) {
                return Err(RagError::invalid_setting(format!(
                    "LLM_TEMPERATURE must be between {} and {}, got {}",
                    TEMPERATURE_RANGE.start(),
                    TEMPERATURE_RANGE.end(),
                    temperature
                )));
            }
        }

        if self.query.text.trim().is_empty() {
            return Err(RagError::invalid_setting("Query text cannot be empty"));
        }

        if self.query.top_k == 0 {
            return Err(RagError::invalid_setting("Top-K must be at least 1"));
        }

        if self.query.index_name.trim().is_empty() {
            return Err(RagError::invalid_setting("Vector index name cannot be empty"));
        }

        if self.query.return_properties.is_empty() {
            return Err(RagError::invalid_setting(
                "At least one return property is required",
            ));
        }

        if self.query.return_properties.iter().any(|p| p.trim().is_empty()) {
            return Err(RagError::invalid_setting("Return property names cannot be blank"));
        }

        parse_log_level(&self.logging.level)?;

        Ok(())
    }
}

/// Parse a numeric setting, falling back to the default when unset
fn parse_setting<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, RagError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            RagError::invalid_setting(format!("{} has an invalid value '{}'", key, raw))
        }),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, RagError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RagError::invalid_setting(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}

/// Split a comma separated property list, ignoring blanks
pub fn split_properties(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
