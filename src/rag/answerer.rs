//! Prompt Composer & Answerer: the query-to-answer state machine.
//!
//! Linear flow: normalize the query to Polish, retrieve, compose one
//! bounded prompt, issue one completion, translate back if needed. Every
//! external failure substitutes a safe default instead of propagating.

use std::sync::Arc;

use super::prompt::{build_prompt, ANSWER_FAILURE_MESSAGE, NO_INFO_MESSAGE};
use super::retrieval::{Retriever, DEFAULT_TOP_K};
use super::translator::{translate, Language};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const ANSWER_TEMPERATURE: f64 = 0.5;
const ANSWER_MAX_TOKENS: i32 = 500;

/// Maximum number of source URLs surfaced with an answer.
pub const MAX_SOURCES: usize = 5;

/// A grounded answer with its supporting source URLs in retrieval order.
#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

pub struct Answerer {
    provider: Arc<dyn LlmProvider>,
    retriever: Retriever,
    answer_model: String,
    worker_model: String,
}

impl Answerer {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        retriever: Retriever,
        answer_model: String,
        worker_model: String,
    ) -> Self {
        Self {
            provider,
            retriever,
            answer_model,
            worker_model,
        }
    }

    pub async fn answer(&self, query: &str, language: Language) -> ChatAnswer {
        // Polish is the canonical working language; retrieval runs on the
        // normalized query.
        let polish_query = if language != Language::Pl {
            translate(self.provider.as_ref(), &self.worker_model, query, Language::Pl).await
        } else {
            query.to_string()
        };

        let chunks = self.retriever.retrieve(&polish_query, DEFAULT_TOP_K).await;

        if chunks.is_empty() {
            let answer = self.localize(NO_INFO_MESSAGE, language).await;
            return ChatAnswer {
                answer,
                sources: Vec::new(),
            };
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text_chunk.clone()).collect();
        let prompt = build_prompt(&polish_query, &texts);

        let candidate = self.complete(&prompt).await;
        let answer = self.localize(&candidate, language).await;

        let sources = chunks
            .iter()
            .take(MAX_SOURCES)
            .map(|c| c.source_url.clone())
            .collect();

        ChatAnswer { answer, sources }
    }

    /// Exactly one completion per answered query.
    async fn complete(&self, prompt: &str) -> String {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(ANSWER_TEMPERATURE)
            .with_max_tokens(ANSWER_MAX_TOKENS);

        match self.provider.chat(request, &self.answer_model).await {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                tracing::error!("Failed to query completion model: {}", e);
                ANSWER_FAILURE_MESSAGE.to_string()
            }
        }
    }

    async fn localize(&self, text: &str, language: Language) -> String {
        if language == Language::Pl {
            text.to_string()
        } else {
            translate(self.provider.as_ref(), &self.worker_model, text, language).await
        }
    }
}

/// Presentation helper for display consumers: exact-match dedup keeping
/// first-seen order, capped at `MAX_SOURCES`. `answer` itself returns the
/// raw list; the HTTP handler applies this before responding.
pub fn dedup_sources(sources: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for source in sources {
        if !seen.contains(source) {
            seen.push(source.clone());
        }
        if seen.len() == MAX_SOURCES {
            break;
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::ApiError;
    use crate::rag::sqlite::SqliteVectorStore;
    use crate::rag::store::{NewFact, VectorStore};

    const DZIEKANI_URL: &str = "https://ww2.mini.pw.edu.pl/wydzial/dziekani/";
    const DZIEKAN_FACT: &str =
        "Dziekanem Wydziału MiNI jest prof. dr hab. Grzegorz Świątek.";

    /// Provider whose chat replays scripted responses and whose embedder
    /// maps every input to a fixed vector.
    struct FakeProvider {
        chat_responses: Mutex<VecDeque<String>>,
        chat_requests: Mutex<Vec<ChatRequest>>,
        embedding: Vec<f32>,
    }

    impl FakeProvider {
        fn new(responses: Vec<&str>, embedding: Vec<f32>) -> Self {
            Self {
                chat_responses: Mutex::new(
                    responses.into_iter().map(|s| s.to_string()).collect(),
                ),
                chat_requests: Mutex::new(Vec::new()),
                embedding,
            }
        }

        fn chat_call_count(&self) -> usize {
            self.chat_requests.lock().unwrap().len()
        }

        fn request(&self, idx: usize) -> ChatRequest {
            self.chat_requests.lock().unwrap()[idx].clone()
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn chat(&self, request: ChatRequest, _model: &str) -> Result<String, ApiError> {
            self.chat_requests.lock().unwrap().push(request);
            self.chat_responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::Internal("no scripted response left".to_string()))
        }

        async fn embed(&self, inputs: &[String], _model: &str) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|_| self.embedding.clone()).collect())
        }
    }

    async fn seeded_store(dir: &tempfile::TempDir) -> Arc<SqliteVectorStore> {
        let store = SqliteVectorStore::with_path(dir.path().join("index.db"))
            .await
            .unwrap();
        store
            .add(vec![NewFact {
                text: DZIEKAN_FACT.to_string(),
                embedding: vec![1.0, 0.0, 0.0],
                url: DZIEKANI_URL.to_string(),
            }])
            .await
            .unwrap();
        Arc::new(store)
    }

    fn answerer(provider: Arc<FakeProvider>, store: Arc<dyn VectorStore>) -> Answerer {
        let retriever = Retriever::new(provider.clone(), store, "embed-model".to_string());
        Answerer::new(
            provider,
            retriever,
            "answer-model".to_string(),
            "worker-model".to_string(),
        )
    }

    #[tokio::test]
    async fn dziekan_query_is_grounded_and_sourced() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;
        let provider = Arc::new(FakeProvider::new(
            vec![DZIEKAN_FACT],
            vec![1.0, 0.0, 0.0],
        ));

        let answerer = answerer(provider.clone(), store);
        let result = answerer.answer("Kto jest dziekanem?", Language::Pl).await;

        assert!(result.answer.contains("Grzegorz Świątek"));
        assert_eq!(result.sources, vec![DZIEKANI_URL.to_string()]);

        // One completion call, carrying the fact as the top-ranked chunk.
        assert_eq!(provider.chat_call_count(), 1);
        let prompt = &provider.request(0).messages[0].content;
        assert!(prompt.contains("[S1]"));
        assert!(prompt.contains(DZIEKAN_FACT));
        assert!(prompt.contains("Pytanie: Kto jest dziekanem?"));
    }

    #[tokio::test]
    async fn empty_retrieval_skips_the_llm() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            SqliteVectorStore::with_path(dir.path().join("index.db"))
                .await
                .unwrap(),
        );
        let provider = Arc::new(FakeProvider::new(vec![], vec![1.0, 0.0, 0.0]));

        let answerer = answerer(provider.clone(), store);
        let result = answerer.answer("Kto jest dziekanem?", Language::Pl).await;

        assert_eq!(result.answer, NO_INFO_MESSAGE);
        assert!(result.sources.is_empty());
        assert_eq!(provider.chat_call_count(), 0);
    }

    #[tokio::test]
    async fn english_query_is_normalized_and_answer_translated_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;
        // Scripted calls: query→Polish, the answer itself, answer→English.
        let provider = Arc::new(FakeProvider::new(
            vec![
                "Kto jest dziekanem?",
                DZIEKAN_FACT,
                "The dean of the MiNI faculty is prof. Grzegorz Świątek.",
            ],
            vec![1.0, 0.0, 0.0],
        ));

        let answerer = answerer(provider.clone(), store);
        let result = answerer.answer("Who is the dean?", Language::En).await;

        assert_eq!(provider.chat_call_count(), 3);
        assert!(result.answer.starts_with("The dean"));
        // Sources stay untranslated URLs.
        assert_eq!(result.sources, vec![DZIEKANI_URL.to_string()]);

        // The translation request targeted Polish and carried the query.
        let first = provider.request(0);
        assert!(first.messages[0].content.contains("Polish"));
        assert_eq!(first.messages[1].content, "Who is the dean?");

        // Retrieval and the prompt used the normalized Polish query.
        let answer_prompt = &provider.request(1).messages[0].content;
        assert!(answer_prompt.contains("Pytanie: Kto jest dziekanem?"));

        // The back-translation targeted English.
        let last = provider.request(2);
        assert!(last.messages[0].content.contains("English"));
    }

    #[tokio::test]
    async fn completion_failure_yields_apology_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;
        // No scripted responses: the completion call fails.
        let provider = Arc::new(FakeProvider::new(vec![], vec![1.0, 0.0, 0.0]));

        let answerer = answerer(provider.clone(), store);
        let result = answerer.answer("Kto jest dziekanem?", Language::Pl).await;

        assert_eq!(result.answer, ANSWER_FAILURE_MESSAGE);
        assert_ne!(result.answer, NO_INFO_MESSAGE);
        // Sources still surface even when the completion failed.
        assert_eq!(result.sources, vec![DZIEKANI_URL.to_string()]);
    }

    #[test]
    fn dedup_keeps_first_seen_order_and_caps() {
        let sources: Vec<String> = ["a", "b", "a", "c", "b", "d", "e", "f"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let deduped = dedup_sources(&sources);
        assert_eq!(deduped, vec!["a", "b", "c", "d", "e"]);
    }
}
