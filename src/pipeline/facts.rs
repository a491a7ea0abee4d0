//! Fact Extractor stage.
//!
//! Splits a document into fixed-size character windows and asks the worker
//! model to reduce each window to a JSON array of atomic facts. A window
//! whose call or parse fails contributes zero facts; the rest of the
//! document is still processed.

use serde::{Deserialize, Serialize};

use crate::core::config::PipelineConfig;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

pub const WINDOW_SIZE: usize = 15_000;

const EXTRACTION_TEMPERATURE: f64 = 0.1;

const SYSTEM_PROMPT: &str = "\
Jesteś inteligentnym asystentem z Wydziału MiNI PW, który pomaga wyodrębniać fakty z różnych dokumentów.
Cechujesz się szczegółowością i precyzją.
Twoim zadaniem jest przetworzenie tekstu na listę faktów.
1. Ignoruj nagłówki, stopki, reklamy, menu.
2. Wyciągnij konkretne informacje: kto, co, gdzie, kiedy.
3. Każdy fakt musi być PEŁNYM zdaniem (np. \"Dziekanem Wydziału MiNI jest prof. dr hab. Grzegorz Świątek\", a nie \"Grzegorz Świątek\").
4. Odpowiedź zwróć TYLKO jako czysty JSON: [\"fakt1\", \"fakt2\"]. Bez bloków kodu markdown.
Pamiętaj, że twoim celem jest uzyskanie jak największej liczby szczegółowych faktów z dostarczonego tekstu.
Poszczególne dokumenty mogą mieć różną strukturę i styl, więc dostosuj swoje podejście odpowiednio.
W zależności od dokumentu, liczby faktów mogą się bardzo różnić.";

/// One atomic factual statement paired with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fact {
    pub source: String,
    pub fact: String,
}

/// Per-document extraction result with explicit per-window outcomes,
/// so callers can aggregate error counts instead of scraping logs.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub facts: Vec<String>,
    pub windows_ok: usize,
    pub windows_failed: usize,
}

/// Extract the fact list for one document.
///
/// With `use_llm_for_facts` disabled the whole text is a single
/// pass-through fact.
pub async fn extract_facts(
    provider: &dyn LlmProvider,
    model: &str,
    config: &PipelineConfig,
    text: &str,
    filename: &str,
) -> ExtractionReport {
    if !config.use_llm_for_facts {
        let trimmed = text.trim();
        let facts = if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
        return ExtractionReport {
            facts,
            windows_ok: 1,
            windows_failed: 0,
        };
    }

    let mut report = ExtractionReport::default();

    for window in split_windows(text, WINDOW_SIZE) {
        match extract_window(provider, model, &window).await {
            Ok(facts) => {
                report.facts.extend(facts);
                report.windows_ok += 1;
            }
            Err(e) => {
                tracing::error!("Error processing {}: {}", filename, e);
                report.windows_failed += 1;
            }
        }
    }

    report
}

async fn extract_window(
    provider: &dyn LlmProvider,
    model: &str,
    window: &str,
) -> Result<Vec<String>, ApiError> {
    let request = ChatRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("Tekst:\n{}", window)),
    ])
    .with_temperature(EXTRACTION_TEMPERATURE);

    let content = provider.chat(request, model).await?;
    let content = strip_code_fence(content.trim());

    serde_json::from_str::<Vec<String>>(&content)
        .map_err(|e| ApiError::Internal(format!("model response is not a JSON array: {}", e)))
}

/// Non-overlapping character windows in document order.
pub fn split_windows(text: &str, window_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(window_size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// The model is told not to fence its output, but some do it anyway.
fn strip_code_fence(content: &str) -> String {
    if content.starts_with("```") {
        content.replace("```json", "").replace("```", "")
    } else {
        content.to_string()
    }
}

/// Resolve a page file into its source URL and body text.
///
/// Prefers an explicit `URL: ` first-line marker; callers fall back to a
/// sidecar metadata record or finally to the bare filename. Nothing here
/// ever invents a URL.
pub fn resolve_source(raw: &str, filename: &str) -> (String, String) {
    let mut lines = raw.lines();
    if let Some(first) = lines.next() {
        if let Some(url) = first.strip_prefix("URL: ") {
            let body: String = lines.collect::<Vec<_>>().join("\n");
            return (url.trim().to_string(), body.trim().to_string());
        }
    }
    (filename.to_string(), raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::config::PipelineConfig;

    /// Provider that replays scripted chat responses.
    struct ScriptedProvider {
        responses: Mutex<Vec<Result<String, ApiError>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, ApiError>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, _request: ChatRequest, _model: &str) -> Result<String, ApiError> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Ok("[]".to_string()))
        }

        async fn embed(&self, _inputs: &[String], _model: &str) -> Result<Vec<Vec<f32>>, ApiError> {
            Err(ApiError::Internal("no embeddings in this test".to_string()))
        }
    }

    fn fact_config() -> PipelineConfig {
        PipelineConfig::for_version(2)
    }

    #[test]
    fn windows_split_on_char_boundaries() {
        let text = "ść".repeat(10);
        let windows = split_windows(&text, 7);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].chars().count(), 7);
        assert_eq!(windows.concat(), text);
    }

    #[test]
    fn url_line_wins_over_filename() {
        let raw = "URL: https://ww2.mini.pw.edu.pl/wydzial/dziekani/\n\nDziekanem jest...";
        let (source, body) = resolve_source(raw, "dziekani.txt");
        assert_eq!(source, "https://ww2.mini.pw.edu.pl/wydzial/dziekani/");
        assert_eq!(body, "Dziekanem jest...");
    }

    #[test]
    fn filename_is_the_fallback_source() {
        let (source, body) = resolve_source("just body text", "plan_zajec.txt");
        assert_eq!(source, "plan_zajec.txt");
        assert_eq!(body, "just body text");
    }

    #[tokio::test]
    async fn passthrough_mode_returns_whole_text() {
        let provider = ScriptedProvider::new(vec![]);
        let config = PipelineConfig::for_version(1);

        let report = extract_facts(&provider, "m", &config, "  cały dokument  ", "f.txt").await;
        assert_eq!(report.facts, vec!["cały dokument".to_string()]);
        assert_eq!(report.windows_failed, 0);
    }

    #[tokio::test]
    async fn facts_are_parsed_from_json_array() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"["Dziekanem Wydziału MiNI jest prof. dr hab. Grzegorz Świątek."]"#.to_string(),
        )]);

        let report = extract_facts(&provider, "m", &fact_config(), "tekst", "f.txt").await;
        assert_eq!(report.facts.len(), 1);
        assert_eq!(report.windows_ok, 1);
        assert!(report.facts[0].contains("Grzegorz Świątek"));
    }

    #[tokio::test]
    async fn fenced_responses_are_unwrapped() {
        let provider =
            ScriptedProvider::new(vec![Ok("```json\n[\"fakt pierwszy\"]\n```".to_string())]);

        let report = extract_facts(&provider, "m", &fact_config(), "tekst", "f.txt").await;
        assert_eq!(report.facts, vec!["fakt pierwszy".to_string()]);
    }

    #[tokio::test]
    async fn bad_window_does_not_block_the_rest() {
        // Two windows: the first response is not JSON, the second is fine.
        let provider = ScriptedProvider::new(vec![
            Ok("not json at all".to_string()),
            Ok(r#"["fakt z drugiego okna"]"#.to_string()),
        ]);

        let text = "a".repeat(WINDOW_SIZE + 10);
        let report = extract_facts(&provider, "m", &fact_config(), &text, "f.txt").await;

        assert_eq!(report.facts, vec!["fakt z drugiego okna".to_string()]);
        assert_eq!(report.windows_ok, 1);
        assert_eq!(report.windows_failed, 1);
    }

    #[tokio::test]
    async fn provider_failure_counts_as_failed_window() {
        let provider = ScriptedProvider::new(vec![Err(ApiError::Internal("boom".to_string()))]);

        let report = extract_facts(&provider, "m", &fact_config(), "tekst", "f.txt").await;
        assert!(report.facts.is_empty());
        assert_eq!(report.windows_failed, 1);
    }
}
