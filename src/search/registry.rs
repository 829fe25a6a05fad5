//! Index registry / 索引注册表
//!
//! Owns every live index handle, keyed by name in a sharded map. While a
//! create opens or builds an index it holds the write lock of the shard
//! its name hashes to, so lookups of other names in that shard wait for it.
//! Names in other shards are unaffected.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::{EngineError, IndexEngine, IndexHandle, IndexMapping};
use crate::error::{Result, SearchError};
use crate::models::FieldAnalyzerConfig;

static INDEX_NAME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-zA-Z_.]+$").ok());

/// Check an index name against `^[a-zA-Z_.]+$` / 校验索引名
///
/// `.` and `..` match the pattern but would escape the data root, so they
/// are rejected too.
pub fn validate_index_name(name: &str) -> Result<()> {
    let matched = INDEX_NAME.as_ref().is_some_and(|re| re.is_match(name));
    if !matched || name == "." || name == ".." {
        return Err(SearchError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub struct IndexRegistry {
    engine: Arc<dyn IndexEngine>,
    data_dir: PathBuf,
    indexes: DashMap<String, IndexHandle>,
}

impl IndexRegistry {
    pub fn new(engine: Arc<dyn IndexEngine>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            data_dir: data_dir.into(),
            indexes: DashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Open the on-disk index `name`, or create it from `config` / 打开或创建索引
    ///
    /// The existence check and the open/create run under the write lock of
    /// `name`'s shard, so two concurrent creates of one name cannot both
    /// succeed. Other names sharing the shard block until it returns.
    pub fn create(&self, name: &str, config: Option<&FieldAnalyzerConfig>) -> Result<()> {
        validate_index_name(name)?;

        match self.indexes.entry(name.to_string()) {
            Entry::Occupied(_) => Err(SearchError::AlreadyExists(name.to_string())),
            Entry::Vacant(slot) => {
                let path = self.data_dir.join(name);
                let handle = match self.engine.open(&path) {
                    Ok(handle) => {
                        if config.is_some_and(|c| !c.is_empty()) {
                            tracing::warn!(
                                "Index {} already exists on disk, field config ignored",
                                name
                            );
                        }
                        tracing::info!("Index opened: {} ({})", name, self.engine.engine_type());
                        handle
                    }
                    Err(EngineError::PathDoesNotExist(_)) => {
                        let mapping = IndexMapping::from_config(config)?;
                        let handle = self.engine.create(&path, &mapping)?;
                        tracing::info!("Index created: {} ({})", name, self.engine.engine_type());
                        handle
                    }
                    Err(e) => return Err(e.into()),
                };
                slot.insert(handle);
                Ok(())
            }
        }
    }

    /// Register every index directory under the data root / 加载全部索引
    ///
    /// Per-directory failures are logged and skipped. Returns how many
    /// indexes were newly registered.
    pub fn load_all(&self) -> Result<usize> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(EngineError::Io(e).into()),
        };

        let mut loaded = 0;
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!("Skipping non UTF-8 index directory {:?}", entry.path());
                continue;
            };
            match self.create(&name, None) {
                Ok(()) => loaded += 1,
                Err(SearchError::AlreadyExists(_)) => {
                    tracing::debug!("Index {} already registered", name);
                }
                Err(e) => tracing::warn!("Failed to load index {}: {}", name, e),
            }
        }
        tracing::info!("Loaded {} indexes from {:?}", loaded, self.data_dir);
        Ok(loaded)
    }

    pub fn resolve(&self, name: &str) -> Result<IndexHandle> {
        self.indexes
            .get(name)
            .map(|handle| handle.value().clone())
            .ok_or_else(|| SearchError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Registered names, sorted / 已注册的索引名
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalyzerKind;
    use crate::test_support::registry;

    #[test]
    fn test_valid_names_resolve() {
        let (_dir, registry) = registry();
        for name in ["books", "my_index", "a.b", "_", "ABC.def_"] {
            registry.create(name, None).unwrap();
            assert!(registry.resolve(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_names_rejected() {
        let (_dir, registry) = registry();
        for name in ["", "has space", "dash-name", "num1", "中文", "a/b", ".", ".."] {
            let err = registry.create(name, None).unwrap_err();
            assert!(matches!(err, SearchError::InvalidName(_)), "{name}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_twice() {
        let (_dir, registry) = registry();
        registry.create("books", None).unwrap();
        let err = registry.create("books", None).unwrap_err();
        assert!(matches!(err, SearchError::AlreadyExists(name) if name == "books"));
        assert_eq!(registry.names(), vec!["books".to_string()]);
    }

    #[test]
    fn test_concurrent_create_same_name() {
        let (_dir, registry) = registry();
        let successes = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry.create("race", None).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|created| *created)
                .count()
        });
        assert_eq!(successes, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_create_distinct_names() {
        let (_dir, registry) = registry();
        let names = ["alpha", "beta", "gamma", "delta", "omega", "sigma"];
        std::thread::scope(|s| {
            for name in names {
                let registry = &registry;
                s.spawn(move || {
                    registry.create(name, None).unwrap();
                    registry.resolve(name).unwrap();
                });
            }
        });
        assert_eq!(registry.len(), names.len());
    }

    #[test]
    fn test_resolve_unknown() {
        let (_dir, registry) = registry();
        assert!(matches!(registry.resolve("nope"), Err(SearchError::NotFound(_))));
    }

    #[test]
    fn test_load_all_reopens_and_skips_bad_dirs() {
        let (dir, registry) = registry();
        let mut config = FieldAnalyzerConfig::new();
        config.insert("price".into(), AnalyzerKind::Number);
        registry.create("shop", Some(&config)).unwrap();
        registry.create("blog", None).unwrap();
        drop(registry);

        // A directory with no index in it, and one with an invalid name
        std::fs::create_dir_all(dir.path().join("broken")).unwrap();
        std::fs::create_dir_all(dir.path().join("bad-name")).unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"x").unwrap();

        let registry = crate::test_support::registry_at(dir.path());
        registry.create("blog", None).unwrap();
        assert_eq!(registry.load_all().unwrap(), 1);
        assert_eq!(registry.names(), vec!["blog".to_string(), "shop".to_string()]);

        let shop = registry.resolve("shop").unwrap();
        assert_eq!(shop.field_kind("price"), Some(crate::engine::FieldKind::Number));
    }

    #[test]
    fn test_load_all_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let registry = crate::test_support::registry_at(&dir.path().join("absent"));
        assert_eq!(registry.load_all().unwrap(), 0);
    }
}
