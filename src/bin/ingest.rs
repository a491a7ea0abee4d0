//! Embedding Indexer entry point: embed fact files and append them to the
//! persisted `mini_docs` collection.

use std::fs;

use minirag::core::config::Settings;
use minirag::core::logging;
use minirag::core::paths::AppPaths;
use minirag::llm::{LlmProvider, OpenRouterProvider};
use minirag::pipeline::facts::Fact;
use minirag::rag::{NewFact, SqliteVectorStore, VectorStore};

/// Inputs per embedding request, to keep request bodies bounded.
const EMBED_BATCH_SIZE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::from_env();
    tracing::info!(
        "Starting ingestion for pipeline version: {}",
        settings.pipeline.version
    );

    let provider = OpenRouterProvider::new(
        &settings.openrouter_base_url,
        settings.openrouter_api_key.as_deref(),
    )?;
    let store = SqliteVectorStore::new(&paths).await?;

    let facts = read_fact_files(&paths)?;
    if facts.is_empty() {
        tracing::warn!("No data to ingest.");
        return Ok(());
    }

    tracing::info!("Generating embeddings for {} facts...", facts.len());

    let (records, skipped) = embed_in_batches(&provider, &settings.embedding_model, facts).await;
    if skipped > 0 {
        tracing::warn!("{} facts skipped due to embedding failures", skipped);
    }
    if records.is_empty() {
        tracing::warn!("No embeddings produced, nothing to index.");
        return Ok(());
    }

    tracing::info!("Saving to {}...", paths.index_db_path.display());
    let ids = store.add(records).await?;
    tracing::info!("Indexed {} facts. Ready for deployment!", ids.len());

    Ok(())
}

/// Embed facts in bounded batches. A failed batch is dropped with an
/// error log and counted instead of aborting the run; returns the
/// records to index plus the number of facts skipped.
async fn embed_in_batches(
    provider: &dyn LlmProvider,
    model: &str,
    facts: Vec<Fact>,
) -> (Vec<NewFact>, usize) {
    let mut records = Vec::with_capacity(facts.len());
    let mut skipped = 0usize;

    for batch in facts.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|f| f.fact.clone()).collect();

        match provider.embed(&texts, model).await {
            Ok(embeddings) if embeddings.len() == batch.len() => {
                for (fact, embedding) in batch.iter().zip(embeddings) {
                    records.push(NewFact {
                        text: fact.fact.clone(),
                        embedding,
                        url: fact.source.clone(),
                    });
                }
            }
            Ok(embeddings) => {
                tracing::error!(
                    "Embedding model returned {} vectors for {} inputs, skipping batch",
                    embeddings.len(),
                    batch.len()
                );
                skipped += batch.len();
            }
            Err(e) => {
                tracing::error!("Embedding batch of {} facts failed: {}", batch.len(), e);
                skipped += batch.len();
            }
        }
    }

    (records, skipped)
}

/// Read every facts file, skipping malformed ones with a log line.
fn read_fact_files(paths: &AppPaths) -> anyhow::Result<Vec<Fact>> {
    let mut all_facts = Vec::new();

    let mut files = 0usize;
    for entry in fs::read_dir(&paths.facts_dir)?.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        files += 1;

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Error reading file {}: {}", path.display(), e);
                continue;
            }
        };

        match serde_json::from_str::<Vec<Fact>>(&raw) {
            Ok(facts) => {
                all_facts.extend(facts.into_iter().filter(|f| !f.fact.trim().is_empty()))
            }
            Err(_) => {
                tracing::warn!(
                    "File {} has wrong format, expected a list of facts.",
                    path.display()
                );
            }
        }
    }

    tracing::info!("Found {} files with facts to ingest.", files);
    Ok(all_facts)
}
