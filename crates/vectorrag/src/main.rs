use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vectorrag_common::{logger, AppConfig, LogSettings, RagError};
use vectorrag_pipeline::app;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root, falling back to the working directory
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
            return;
        }
    }

    dotenv::dotenv().ok();
}

/// Error to report when logging cannot be set up.
///
/// Missing required settings outrank a bad log level or log directory.
fn startup_error<F>(log_err: RagError, lookup: F) -> RagError
where
    F: Fn(&str) -> Option<String>,
{
    match AppConfig::from_lookup(lookup) {
        Err(missing @ RagError::Configuration { .. }) => missing,
        _ => log_err,
    }
}

#[derive(Parser, Debug)]
#[command(name = "vectorrag")]
#[command(
    about = "Answer a question with retrieval-augmented generation over a Neo4j vector index",
    long_about = None
)]
struct Cli {
    /// Question to answer (overrides RAG_QUERY)
    #[arg(long, short)]
    query: Option<String>,

    /// Number of records to retrieve (overrides RAG_TOP_K)
    #[arg(long, short = 'k')]
    top_k: Option<usize>,

    /// Vector index to search (overrides RAG_INDEX_NAME)
    #[arg(long)]
    index: Option<String>,

    /// Node property to return with each match, repeatable (overrides RAG_RETURN_PROPERTIES)
    #[arg(long = "property", short = 'p')]
    properties: Vec<String>,

    /// Print the retrieved records before the answer
    #[arg(long)]
    show_context: bool,

    /// Log level (overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    /// Also write logs to <DIR>/vectorrag.log (overrides LOG_DIR)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn apply_log_overrides(&self, logging: &mut LogSettings) {
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(dir) = &self.log_dir {
            logging.dir = Some(dir.clone());
        }
    }

    /// Override configuration with CLI arguments
    fn apply(&self, config: &mut AppConfig) {
        if let Some(query) = &self.query {
            config.query.text = query.clone();
        }
        if let Some(top_k) = self.top_k {
            config.query.top_k = top_k;
        }
        if let Some(index) = &self.index {
            config.query.index_name = index.clone();
        }
        if !self.properties.is_empty() {
            config.query.return_properties = self.properties.clone();
        }
        if self.show_context {
            config.query.show_context = true;
        }
        self.apply_log_overrides(&mut config.logging);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env at project root
    load_dotenv_from_project_root();

    let mut log_settings = LogSettings::from_env();
    cli.apply_log_overrides(&mut log_settings);
    let _log_guard = match logger::setup_logging(&log_settings) {
        Ok(guard) => guard,
        Err(log_err) => {
            // No subscriber is installed yet
            let e = startup_error(log_err, |key| std::env::var(key).ok());
            eprintln!("{}: {}", e.kind(), e);
            return Err(e.into());
        }
    };

    tracing::info!("vectorrag starting...");

    let config = app::load_config(|config| cli.apply(config)).map_err(|e| {
        tracing::error!("{}: {}", e.kind(), e);
        e
    })?;

    let mut stdout = std::io::stdout().lock();
    vectorrag_pipeline::run(&config, &mut stdout)
        .await
        .map_err(|e| {
            tracing::error!("{}: {}", e.kind(), e);
            e
        })?;

    Ok(())
}
