use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default local Ollama runtime address.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

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

/// Runtime configuration for the Legalyze services.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Provider answering chat completions (summaries, classification, entities, Q&A).
    pub llm_provider: LlmProvider,
    /// API key for the hosted OpenAI endpoints.
    pub openai_api_key: Option<String>,
    /// Root URL of the OpenAI-compatible API.
    pub openai_base_url: String,
    /// Chat model identifier.
    pub chat_model: String,
    /// Embedding provider used to vectorize document chunks.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Root URL of the Ollama runtime.
    pub ollama_url: String,
    /// SQLite connection string for document persistence.
    pub database_url: String,
    /// Backend holding document chunk vectors.
    pub vector_store: VectorStoreKind,
    /// Base URL of the Qdrant instance (required for the Qdrant backend).
    pub qdrant_url: Option<String>,
    /// Collection storing document chunks in Qdrant.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Directory receiving uploads before extraction; wiped on start.
    pub upload_dir: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Chunk size used when indexing documents for retrieval.
    pub rag_chunk_size: usize,
    /// Overlap between adjacent retrieval chunks.
    pub rag_chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub rag_top_k: usize,
    /// Unit used to measure chunk length.
    pub chunk_length_unit: ChunkLengthUnit,
    /// Whether entity extraction also asks the model for legal entities.
    pub ner_use_llm: bool,
    /// Upper bound on accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

/// Supported chat completion backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Hosted OpenAI chat completions API.
    OpenAI,
    /// Local Ollama runtime.
    Ollama,
}

/// Supported embedding backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hosted OpenAI embeddings API.
    OpenAI,
    /// Local Ollama runtime.
    Ollama,
    /// Deterministic offline hashing embedder.
    Hashing,
}

/// Supported vector store backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreKind {
    /// Exact in-process index, one per document.
    Memory,
    /// Remote Qdrant collection.
    Qdrant,
}

/// Unit used by the chunker's length function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkLengthUnit {
    /// Unicode scalar count.
    #[default]
    Chars,
    /// Tokenizer token count for the chat model.
    Tokens,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm_provider = parse_or("LLM_PROVIDER", LlmProvider::OpenAI)?;
        let embedding_provider = parse_or("EMBEDDING_PROVIDER", EmbeddingProvider::OpenAI)?;
        let openai_api_key = load_env_optional("OPENAI_API_KEY");
        let needs_openai =
            llm_provider == LlmProvider::OpenAI || embedding_provider == EmbeddingProvider::OpenAI;
        if needs_openai && openai_api_key.is_none() {
            return Err(ConfigError::MissingVariable("OPENAI_API_KEY".to_string()));
        }

        let vector_store = parse_or("VECTOR_STORE", VectorStoreKind::Memory)?;
        let qdrant_url = load_env_optional("QDRANT_URL");
        if vector_store == VectorStoreKind::Qdrant && qdrant_url.is_none() {
            return Err(ConfigError::MissingVariable("QDRANT_URL".to_string()));
        }

        let embedding_dimension: usize = parse_or("EMBEDDING_DIMENSION", 1536)?;
        if embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()));
        }
        let rag_chunk_size: usize = parse_or("RAG_CHUNK_SIZE", 1000)?;
        if rag_chunk_size == 0 {
            return Err(ConfigError::InvalidValue("RAG_CHUNK_SIZE".to_string()));
        }

        Ok(Self {
            llm_provider,
            openai_api_key,
            openai_base_url: load_env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            chat_model: load_env_or("CHAT_MODEL", "gpt-4o"),
            embedding_provider,
            embedding_model: load_env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_dimension,
            ollama_url: load_env_or("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            database_url: load_env_or("DATABASE_URL", "sqlite://legalyze.db"),
            vector_store,
            qdrant_url,
            qdrant_collection_name: load_env_or("QDRANT_COLLECTION_NAME", "legal-documents"),
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            upload_dir: load_env_or("UPLOAD_DIR", "temp"),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            rag_chunk_size,
            rag_chunk_overlap: parse_or("RAG_CHUNK_OVERLAP", 100)?,
            rag_top_k: parse_or::<usize>("RAG_TOP_K", 3)?.max(1),
            chunk_length_unit: parse_or("CHUNK_LENGTH_UNIT", ChunkLengthUnit::Chars)?,
            ner_use_llm: parse_bool_or("NER_USE_LLM", true)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn parse_bool_or(key: &str, default: bool) -> Result<bool, ConfigError> {
    match load_env_optional(key) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key.to_string())),
        },
        None => Ok(default),
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "hashing" => Ok(Self::Hashing),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for VectorStoreKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "qdrant" => Ok(Self::Qdrant),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for ChunkLengthUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chars" | "characters" => Ok(Self::Chars),
            "tokens" => Ok(Self::Tokens),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// Subsequent calls keep the first configuration.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }
    let config = Config::from_env()?;
    tracing::debug!(
        llm_provider = ?config.llm_provider,
        chat_model = %config.chat_model,
        embedding_provider = ?config.embedding_provider,
        vector_store = ?config.vector_store,
        database_url = %config.database_url,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_parse_case_insensitively() {
        assert_eq!("OpenAI".parse::<LlmProvider>(), Ok(LlmProvider::OpenAI));
        assert_eq!("ollama".parse::<LlmProvider>(), Ok(LlmProvider::Ollama));
        assert_eq!(
            "HASHING".parse::<EmbeddingProvider>(),
            Ok(EmbeddingProvider::Hashing)
        );
        assert!("faiss".parse::<VectorStoreKind>().is_err());
        assert_eq!(
            "characters".parse::<ChunkLengthUnit>(),
            Ok(ChunkLengthUnit::Chars)
        );
    }

    #[test]
    fn parse_or_falls_back_to_default_when_unset() {
        let value: usize = parse_or("LEGALYZE_TEST_UNSET_VARIABLE", 7).expect("default");
        assert_eq!(value, 7);
        assert!(parse_bool_or("LEGALYZE_TEST_UNSET_VARIABLE", true).expect("default"));
    }
}
