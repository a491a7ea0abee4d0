//! Multi-language support around the Polish-canonical pipeline.
//!
//! Translation degrades gracefully: a failed call returns the original
//! text rather than blocking the response.

use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const TRANSLATION_TEMPERATURE: f64 = 0.1;

/// Supported chat languages. Unknown codes fall back to Polish, the
/// system's canonical working language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Pl,
    En,
    Ua,
}

impl Language {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "en" => Language::En,
            "ua" => Language::Ua,
            _ => Language::Pl,
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Language::Pl => "Polish",
            Language::En => "English",
            Language::Ua => "Ukrainian",
        }
    }
}

/// Translate `text` into `target`; on failure the original text comes
/// back unchanged.
pub async fn translate(
    provider: &dyn LlmProvider,
    model: &str,
    text: &str,
    target: Language,
) -> String {
    if text.is_empty() {
        return String::new();
    }

    let system_prompt = format!(
        "You are a professional translator. Translate the following text into {}. \
         Preserve the original meaning, tone, formatting, and specific terminology \
         (e.g. university names). Return ONLY the translated text, without any \
         additional comments, introductory phrases, and explanations. Use appropriate \
         vocabulary and grammatical structures specific to the given language.",
        target.english_name()
    );

    let request = ChatRequest::new(vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(text),
    ])
    .with_temperature(TRANSLATION_TEMPERATURE);

    match provider.chat(request, model).await {
        Ok(translated) => translated.trim().to_string(),
        Err(e) => {
            tracing::error!("Translation to {} failed: {}", target.english_name(), e);
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::ApiError;

    /// Provider whose every call fails.
    struct DownProvider;

    #[async_trait]
    impl LlmProvider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        async fn chat(&self, _request: ChatRequest, _model: &str) -> Result<String, ApiError> {
            Err(ApiError::Internal("provider unavailable".to_string()))
        }

        async fn embed(&self, _inputs: &[String], _model: &str) -> Result<Vec<Vec<f32>>, ApiError> {
            Err(ApiError::Internal("provider unavailable".to_string()))
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_polish() {
        assert_eq!(Language::from_code("pl"), Language::Pl);
        assert_eq!(Language::from_code("en"), Language::En);
        assert_eq!(Language::from_code("UA"), Language::Ua);
        assert_eq!(Language::from_code("de"), Language::Pl);
        assert_eq!(Language::from_code(""), Language::Pl);
    }

    #[tokio::test]
    async fn failed_translation_returns_original_text() {
        let text = "Kto jest dziekanem Wydziału MiNI?";
        let out = translate(&DownProvider, "worker-model", text, Language::En).await;
        assert_eq!(out, text);
    }

    #[tokio::test]
    async fn empty_input_skips_the_call() {
        // DownProvider would fail any call; empty input never makes one.
        let out = translate(&DownProvider, "worker-model", "", Language::Ua).await;
        assert_eq!(out, "");
    }
}
