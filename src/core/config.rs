use std::env;

/// How extracted text is turned into retrievable chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingStrategy {
    /// The whole file is stored as one chunk (low-fidelity pipeline versions).
    FileAsChunk,
    /// One chunk per LLM-extracted fact.
    FactBased,
}

/// Pipeline behavior selected once at startup by `PIPELINE_VERSION`.
///
/// Unknown versions fall back to version 1. The record is read-only after
/// selection; every stage receives it by reference.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub version: u32,
    pub process_complex_files: bool,
    pub use_llm_for_facts: bool,
    pub chunking_strategy: ChunkingStrategy,
}

impl PipelineConfig {
    pub fn for_version(version: u32) -> Self {
        match version {
            2 => PipelineConfig {
                version: 2,
                process_complex_files: false,
                use_llm_for_facts: true,
                chunking_strategy: ChunkingStrategy::FactBased,
            },
            3 | 4 => PipelineConfig {
                version,
                process_complex_files: true,
                use_llm_for_facts: true,
                chunking_strategy: ChunkingStrategy::FactBased,
            },
            _ => PipelineConfig {
                version: 1,
                process_complex_files: false,
                use_llm_for_facts: false,
                chunking_strategy: ChunkingStrategy::FileAsChunk,
            },
        }
    }

    pub fn from_env() -> Self {
        let version = env::var("PIPELINE_VERSION")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);
        Self::for_version(version)
    }
}

/// Process-wide settings resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    /// Worker model for fact extraction and translation.
    pub worker_model: String,
    /// Model used for the final grounded answer.
    pub answer_model: String,
    pub embedding_model: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub firecrawl_api_key: Option<String>,
    pub firecrawl_base_url: String,
}

impl Settings {
    pub fn from_env() -> Self {
        let openrouter_api_key = non_empty_var("OPENROUTER_API_KEY");
        if openrouter_api_key.is_none() {
            tracing::warn!("OPENROUTER_API_KEY not found in environment variables");
        }
        let firecrawl_api_key = non_empty_var("FIRECRAWL_API_KEY");
        if firecrawl_api_key.is_none() {
            tracing::warn!("FIRECRAWL_API_KEY not found in environment variables");
        }

        Settings {
            pipeline: PipelineConfig::from_env(),
            worker_model: env::var("MODEL_NAME")
                .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string()),
            answer_model: env::var("ANSWER_MODEL")
                .unwrap_or_else(|_| "mistralai/mistral-7b-instruct:free".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            openrouter_api_key,
            openrouter_base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            firecrawl_api_key,
            firecrawl_base_url: env::var("FIRECRAWL_BASE_URL")
                .unwrap_or_else(|_| "https://api.firecrawl.dev".to_string()),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_one_is_passthrough() {
        let config = PipelineConfig::for_version(1);
        assert!(!config.use_llm_for_facts);
        assert!(!config.process_complex_files);
        assert_eq!(config.chunking_strategy, ChunkingStrategy::FileAsChunk);
    }

    #[test]
    fn later_versions_extract_facts() {
        let config = PipelineConfig::for_version(2);
        assert!(config.use_llm_for_facts);
        assert!(!config.process_complex_files);

        let config = PipelineConfig::for_version(4);
        assert!(config.use_llm_for_facts);
        assert!(config.process_complex_files);
        assert_eq!(config.chunking_strategy, ChunkingStrategy::FactBased);
    }

    #[test]
    fn unknown_version_falls_back_to_one() {
        let config = PipelineConfig::for_version(99);
        assert_eq!(config.version, 1);
        assert!(!config.use_llm_for_facts);
    }
}
