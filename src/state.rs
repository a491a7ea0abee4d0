use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::paths::AppPaths;
use crate::llm::{LlmProvider, OpenRouterProvider};
use crate::rag::{Answerer, Retriever, SqliteVectorStore, VectorStore};

/// Application state shared across all routes.
///
/// Every client and store is constructed exactly once here and injected
/// into the components that need it.
pub struct AppState {
    pub settings: Settings,
    pub paths: Arc<AppPaths>,
    pub provider: Arc<dyn LlmProvider>,
    pub store: Arc<dyn VectorStore>,
    pub answerer: Answerer,
}

impl AppState {
    pub async fn initialize(settings: Settings, paths: AppPaths) -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(paths);

        let provider: Arc<dyn LlmProvider> = Arc::new(OpenRouterProvider::new(
            &settings.openrouter_base_url,
            settings.openrouter_api_key.as_deref(),
        )?);

        let store: Arc<dyn VectorStore> =
            Arc::new(SqliteVectorStore::new(paths.as_ref()).await?);

        let retriever = Retriever::new(
            provider.clone(),
            store.clone(),
            settings.embedding_model.clone(),
        );
        let answerer = Answerer::new(
            provider.clone(),
            retriever,
            settings.answer_model.clone(),
            settings.worker_model.clone(),
        );

        Ok(Arc::new(AppState {
            settings,
            paths,
            provider,
            store,
            answerer,
        }))
    }
}
