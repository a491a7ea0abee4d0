//! Fact Extractor entry point: turn page files into `<basename>_facts.json`.
//!
//! A failure in one file or one window never aborts the batch; the run
//! finishes with aggregate ok/failed counts.

use std::fs;
use std::path::Path;

use minirag::core::config::Settings;
use minirag::core::logging;
use minirag::core::paths::AppPaths;
use minirag::llm::{LlmProvider, OpenRouterProvider};
use minirag::pipeline::facts::{extract_facts, resolve_source, Fact};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::from_env();
    let mode = if settings.pipeline.use_llm_for_facts {
        "LLM extraction"
    } else {
        "Raw text passthrough"
    };
    tracing::info!(
        "Starting extraction. Version: {} | Mode: {}",
        settings.pipeline.version,
        mode
    );

    let provider = OpenRouterProvider::new(
        &settings.openrouter_base_url,
        settings.openrouter_api_key.as_deref(),
    )?;

    let mut total_facts = 0usize;
    let mut failed_windows = 0usize;

    let input_dirs = [&paths.scraped_raw_dir, &paths.processed_text_dir];
    for dir in input_dirs {
        if !dir.exists() {
            tracing::warn!("Input folder does not exist: {}", dir.display());
            continue;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Could not read {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }

            match process_file(&provider, &settings, &paths, &path).await {
                Ok(report) => {
                    total_facts += report.0;
                    failed_windows += report.1;
                }
                Err(e) => {
                    tracing::error!("Error reading file {}: {}", path.display(), e);
                }
            }
        }
    }

    tracing::info!(
        "Extraction finished: {} facts saved, {} windows failed",
        total_facts,
        failed_windows
    );

    Ok(())
}

/// Returns (facts written, windows failed) for one page file.
async fn process_file(
    provider: &dyn LlmProvider,
    settings: &Settings,
    paths: &AppPaths,
    path: &Path,
) -> anyhow::Result<(usize, usize)> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let basename = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let raw = fs::read_to_string(path)?;
    let (mut source_url, body) = resolve_source(&raw, &filename);

    // A sidecar metadata record overrides the URL; the filename fallback
    // is a deliberate unknown-source sentinel, never a guessed URL.
    let meta_path = paths.processed_text_dir.join(format!("{}.json", basename));
    if let Ok(meta_raw) = fs::read_to_string(&meta_path) {
        if let Ok(meta) = serde_json::from_str::<serde_json::Value>(&meta_raw) {
            if let Some(url) = meta.get("source_url").and_then(|v| v.as_str()) {
                source_url = url.to_string();
            }
        }
    }

    tracing::info!("Processing: {} (Source: {})", filename, source_url);

    let report = extract_facts(
        provider,
        &settings.worker_model,
        &settings.pipeline,
        &body,
        &filename,
    )
    .await;

    if report.facts.is_empty() {
        return Ok((0, report.windows_failed));
    }

    let structured: Vec<Fact> = report
        .facts
        .iter()
        .map(|fact| Fact {
            source: source_url.clone(),
            fact: fact.clone(),
        })
        .collect();

    let out_path = paths.facts_dir.join(format!("{}_facts.json", basename));
    fs::write(&out_path, serde_json::to_string_pretty(&structured)?)?;
    tracing::info!("Saved {} items to {}", structured.len(), out_path.display());

    Ok((structured.len(), report.windows_failed))
}
