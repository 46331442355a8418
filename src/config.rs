use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_INDEX_NAME: &str = "arogyam";
const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";
const DEFAULT_CLOUD: &str = "aws";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-mpnet-base-v2";
const DEFAULT_EMBEDDING_DIMENSION: usize = 768;
const DEFAULT_EMBEDDING_URL: &str = "https://router.huggingface.co/hf-inference";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_PDF_SOURCE_DIR: &str = "data/raw";
const DEFAULT_SERVER_PORT: u16 = 8080;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration shared by the chat server and the ingestion binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the Pinecone control and data planes.
    pub pinecone_api_key: String,
    /// Name of the Pinecone index holding document chunks.
    pub pinecone_index_name: String,
    /// Base URL of the Pinecone control plane.
    pub pinecone_controller_url: String,
    /// Cloud provider used when the serverless index has to be created.
    pub pinecone_cloud: String,
    /// Region used when the serverless index has to be created.
    pub pinecone_region: String,
    /// API key for the Gemini generative language API.
    pub gemini_api_key: String,
    /// Gemini model identifier.
    pub gemini_model: String,
    /// Base URL of the Gemini API.
    pub gemini_url: String,
    /// Operator-provided system prompt, trimmed and guaranteed non-empty.
    pub system_prompt: String,
    /// Token for the HuggingFace inference endpoint.
    pub hf_token: String,
    /// Sentence-embedding model identifier.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Base URL of the feature-extraction inference service.
    pub embedding_url: String,
    /// Directory scanned for PDFs by the ingestion binary.
    pub pdf_source_dir: PathBuf,
    /// HTTP server port.
    pub server_port: u16,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let system_prompt = load_env("SYSTEM_PROMPT")?.trim().to_string();
        if system_prompt.is_empty() {
            return Err(ConfigError::MissingVariable("SYSTEM_PROMPT".to_string()));
        }

        Ok(Self {
            pinecone_api_key: load_env("PINECONE_DB_KEY")?,
            pinecone_index_name: load_env_or("PINECONE_INDEX_NAME", DEFAULT_INDEX_NAME),
            pinecone_controller_url: load_env_or("PINECONE_CONTROLLER_URL", DEFAULT_CONTROLLER_URL),
            pinecone_cloud: load_env_or("PINECONE_CLOUD", DEFAULT_CLOUD),
            pinecone_region: load_env_or("PINECONE_REGION", DEFAULT_REGION),
            gemini_api_key: load_env("GEMINI_API_KEY")?,
            gemini_model: load_env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_url: load_env_or("GEMINI_URL", DEFAULT_GEMINI_URL),
            system_prompt,
            hf_token: load_env("HF_TOKEN")?,
            embedding_model: load_env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            embedding_dimension: load_env_optional("EMBEDDING_DIMENSION")
                .map(|value| match value.parse::<usize>() {
                    Ok(parsed) if parsed > 0 => Ok(parsed),
                    _ => Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into())),
                })
                .transpose()?
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSION),
            embedding_url: load_env_or("EMBEDDING_URL", DEFAULT_EMBEDDING_URL),
            pdf_source_dir: PathBuf::from(load_env_or("PDF_SOURCE_DIR", DEFAULT_PDF_SOURCE_DIR)),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_SERVER_PORT),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// Missing credentials or a blank `SYSTEM_PROMPT` abort the process: nothing downstream can run
/// without them.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        index = %config.pinecone_index_name,
        controller = %config.pinecone_controller_url,
        embedding_model = %config.embedding_model,
        embedding_dimension = config.embedding_dimension,
        gemini_model = %config.gemini_model,
        server_port = config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
pub(crate) fn test_config(base_url: &str) -> Config {
    Config {
        pinecone_api_key: "pc-test".into(),
        pinecone_index_name: "arogyam-test".into(),
        pinecone_controller_url: base_url.to_string(),
        pinecone_cloud: DEFAULT_CLOUD.into(),
        pinecone_region: DEFAULT_REGION.into(),
        gemini_api_key: "gm-test".into(),
        gemini_model: DEFAULT_GEMINI_MODEL.into(),
        gemini_url: base_url.to_string(),
        system_prompt: "You are a careful health assistant.".into(),
        hf_token: "hf-test".into(),
        embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
        embedding_dimension: 4,
        embedding_url: base_url.to_string(),
        pdf_source_dir: PathBuf::from(DEFAULT_PDF_SOURCE_DIR),
        server_port: DEFAULT_SERVER_PORT,
    }
}
