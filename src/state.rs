use std::sync::Arc;

use crate::analysis::{register_jieba, AnalysisRegistry};
use crate::config::AppConfig;
use crate::engine::TantivyEngine;
use crate::error::SearchError;
use crate::search::IndexRegistry;

/// Shared application state / 应用共享状态
pub struct AppState {
    pub registry: Arc<IndexRegistry>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(registry: Arc<IndexRegistry>, config: AppConfig) -> Self {
        Self { registry, config }
    }

    /// Build analyzers, engine and registry, then load indexes from disk / 启动初始化
    pub fn bootstrap(config: AppConfig) -> anyhow::Result<Self> {
        let mut analysis = AnalysisRegistry::new();
        register_jieba(&mut analysis)?;

        let engine = TantivyEngine::new(Arc::new(analysis))
            .with_writer(config.index.writer_heap_bytes, config.index.writer_threads);
        let registry = Arc::new(IndexRegistry::new(Arc::new(engine), config.get_data_dir()));

        if let Some(name) = &config.index.default_index {
            match registry.create(name, None) {
                Ok(()) | Err(SearchError::AlreadyExists(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        registry.load_all()?;
        tracing::info!("{} indexes ready", registry.len());

        Ok(Self::new(registry, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_creates_default_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.index.data_dir = dir.path().join("data").display().to_string();
        config.index.writer_heap_bytes = 20_000_000;

        let state = AppState::bootstrap(config.clone()).unwrap();
        state.registry.create("extra", None).unwrap();
        assert_eq!(state.registry.names(), vec!["default".to_string(), "extra".to_string()]);
        drop(state);

        let state = AppState::bootstrap(config).unwrap();
        assert_eq!(state.registry.names(), vec!["default".to_string(), "extra".to_string()]);
    }

    #[test]
    fn test_bootstrap_with_more_threads_than_heap_allows() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.index.data_dir = dir.path().display().to_string();
        config.index.writer_threads = 4;

        let state = AppState::bootstrap(config).unwrap();
        state
            .registry
            .add_document("default", "1", &crate::test_support::fields(r#"{"a":"b"}"#))
            .unwrap();
        assert_eq!(state.registry.resolve("default").unwrap().doc_count().unwrap(), 1);
    }
}
