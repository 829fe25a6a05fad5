pub mod analysis;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod search;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use crate::analysis::{register_jieba, AnalysisRegistry};
    use crate::config::AppConfig;
    use crate::engine::TantivyEngine;
    use crate::models::Fields;
    use crate::search::IndexRegistry;
    use crate::state::AppState;

    static ANALYSIS: Lazy<Arc<AnalysisRegistry>> = Lazy::new(|| {
        let mut analysis = AnalysisRegistry::new();
        register_jieba(&mut analysis).unwrap();
        Arc::new(analysis)
    });

    pub fn engine() -> TantivyEngine {
        TantivyEngine::new(ANALYSIS.clone()).with_writer(20_000_000, 1)
    }

    pub fn fields(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    pub fn registry_at(path: &Path) -> IndexRegistry {
        IndexRegistry::new(Arc::new(engine()), path)
    }

    pub fn registry() -> (TempDir, IndexRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_at(dir.path());
        (dir, registry)
    }

    pub fn app() -> (TempDir, axum::Router) {
        let (dir, registry) = registry();
        let mut config = AppConfig::default();
        config.index.data_dir = dir.path().display().to_string();
        let state = AppState::new(Arc::new(registry), config);
        (dir, crate::api::router(Arc::new(state)))
    }
}
