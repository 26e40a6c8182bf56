use crate::completion::{ChatTransport, CompletionClient, HttpTransport};
use crate::config::AppConfig;
use crate::db::ChatStore;
use anyhow::Context;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: ChatStore,
    pub config: Arc<AppConfig>,
    pub completion: Arc<CompletionClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = ChatStore::connect(&config.database_url).await?;
        store
            .ensure_schema()
            .await
            .context("initialize database schema")?;

        let transport = Arc::new(HttpTransport::new()) as Arc<dyn ChatTransport>;
        let completion = Arc::new(CompletionClient::new(&config.openai, transport));
        if !completion.has_api_key() {
            tracing::warn!("OPENAI_API_KEY is not set; /chat requests will fail until it is");
        }

        Ok(Self {
            store,
            config,
            completion,
        })
    }

    #[cfg(test)]
    pub fn from_parts(
        store: ChatStore,
        config: Arc<AppConfig>,
        completion: Arc<CompletionClient>,
    ) -> Self {
        Self {
            store,
            config,
            completion,
        }
    }
}

impl FromRef<AppState> for ChatStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
