//! Full-text engine boundary / 全文引擎接口
//!
//! The registry and the query/statistics layers only talk to an engine
//! through [`IndexEngine`] (open/create) and [`EngineIndex`] (one open
//! index). The production implementation lives in [`tantivy_engine`].

mod tantivy_engine;

pub use tantivy_engine::TantivyEngine;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::models::{AnalyzerKind, FieldAnalyzerConfig, Fields, SearchResult, SortKey};

pub const ID_FIELD: &str = "_id";
pub const SOURCE_FIELD: &str = "_source";
/// Catch-all field holding every string value / 全字段聚合字段
pub const ALL_FIELD: &str = "_all";
/// JSON field holding every field missing from the mapping / 未映射字段的动态字段
pub const DYNAMIC_FIELD: &str = "_dyn";

const RESERVED_FIELDS: [&str; 4] = [ID_FIELD, SOURCE_FIELD, ALL_FIELD, DYNAMIC_FIELD];

#[derive(Error, Debug)]
pub enum EngineError {
    /// No index directory at the given path / 索引路径不存在
    #[error("index path does not exist: {0}")]
    PathDoesNotExist(PathBuf),

    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("analyzer not registered: {0}")]
    UnknownAnalyzer(String),

    #[error("invalid field mapping: {0}")]
    InvalidMapping(String),

    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Declared mapping type of a field / 字段映射类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Keyword,
    Number,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Keyword => "keyword",
            FieldKind::Number => "number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub name: String,
    pub kind: FieldKind,
    /// Analyzer name for text fields; `None` uses the engine default
    pub analyzer: Option<String>,
}

/// Field mappings an index is created with / 索引字段映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMapping {
    pub fields: Vec<FieldMapping>,
}

impl IndexMapping {
    /// Translate a caller's analyzer config into engine field mappings / 构建映射
    ///
    /// `jieba` maps to text analyzed by the `jieba` analyzer, `keyword` to an
    /// exact-match field, `number` to a numeric field and anything else to
    /// default text. Fields left out of the config are still indexed as
    /// default text when documents bring them.
    pub fn from_config(config: Option<&FieldAnalyzerConfig>) -> Result<Self, EngineError> {
        let Some(config) = config else {
            return Ok(Self::default());
        };

        let mut fields = Vec::with_capacity(config.len());
        for (name, kind) in config {
            if name.is_empty() || RESERVED_FIELDS.contains(&name.as_str()) {
                return Err(EngineError::InvalidMapping(format!(
                    "field name {name:?} is reserved"
                )));
            }
            let (kind, analyzer) = match kind {
                AnalyzerKind::Jieba => {
                    let analyzer = crate::analysis::JIEBA_ANALYZER.to_string();
                    (FieldKind::Text, Some(analyzer))
                }
                AnalyzerKind::Keyword => (FieldKind::Keyword, None),
                AnalyzerKind::Number => (FieldKind::Number, None),
                AnalyzerKind::Default => (FieldKind::Text, None),
            };
            fields.push(FieldMapping {
                name: name.clone(),
                kind,
                analyzer,
            });
        }
        Ok(Self { fields })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineQuery {
    /// Engine query-string syntax, passed through untouched / 查询字符串
    QueryString(String),
    /// Inclusive on both ends / 闭区间数值查询
    NumericRange { field: String, start: f64, end: f64 },
    MatchAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    All,
    Only(Vec<String>),
}

impl FieldSelection {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            FieldSelection::All => true,
            FieldSelection::Only(names) => names.iter().any(|n| n == field),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub query: EngineQuery,
    pub from: usize,
    pub size: usize,
    pub sort: Option<SortKey>,
    pub fields: FieldSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub term: String,
    /// Live documents containing the term / 包含该词的文档数
    pub count: u64,
}

/// Snapshot of one field's term dictionary / 字段词典
#[derive(Debug, Clone, Default)]
pub struct FieldDict {
    entries: Vec<DictEntry>,
}

impl FieldDict {
    pub fn new(entries: Vec<DictEntry>) -> Self {
        Self { entries }
    }

    pub fn cardinality(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for FieldDict {
    type Item = DictEntry;
    type IntoIter = std::vec::IntoIter<DictEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Engine factory / 引擎工厂
pub trait IndexEngine: Send + Sync {
    fn engine_type(&self) -> &'static str;

    /// Open an existing index; a missing path yields [`EngineError::PathDoesNotExist`]
    fn open(&self, path: &Path) -> Result<IndexHandle, EngineError>;

    fn create(&self, path: &Path, mapping: &IndexMapping) -> Result<IndexHandle, EngineError>;
}

/// One open index; safe for concurrent reads and writes / 已打开的索引
pub trait EngineIndex: Send + Sync + std::fmt::Debug {
    /// Add or overwrite the document with this ID / 写入或覆盖文档
    fn index(&self, id: &str, fields: &Fields) -> Result<(), EngineError>;

    fn delete(&self, id: &str) -> Result<(), EngineError>;

    fn document(&self, id: &str) -> Result<Option<Fields>, EngineError>;

    fn search(&self, request: &EngineRequest) -> Result<SearchResult, EngineError>;

    fn doc_count(&self) -> Result<u64, EngineError>;

    /// Implementation-defined statistics / 引擎统计信息
    fn stats_map(&self) -> Result<serde_json::Value, EngineError>;

    /// `_all`, the mapped fields, then every field documents brought in
    fn fields(&self) -> Result<Vec<String>, EngineError>;

    fn field_dict(&self, field: &str) -> Result<FieldDict, EngineError>;

    fn field_kind(&self, field: &str) -> Option<FieldKind>;
}

pub type IndexHandle = Arc<dyn EngineIndex>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_from_config() {
        let mut config = FieldAnalyzerConfig::new();
        config.insert("title".into(), AnalyzerKind::Jieba);
        config.insert("tag".into(), AnalyzerKind::Keyword);
        config.insert("price".into(), AnalyzerKind::Number);
        config.insert("body".into(), AnalyzerKind::Default);

        let mapping = IndexMapping::from_config(Some(&config)).unwrap();
        let kind = |name: &str| {
            mapping
                .fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| (f.kind, f.analyzer.clone()))
                .unwrap()
        };
        assert_eq!(kind("title"), (FieldKind::Text, Some("jieba".to_string())));
        assert_eq!(kind("tag"), (FieldKind::Keyword, None));
        assert_eq!(kind("price"), (FieldKind::Number, None));
        assert_eq!(kind("body"), (FieldKind::Text, None));
    }

    #[test]
    fn test_mapping_rejects_reserved() {
        let mut config = FieldAnalyzerConfig::new();
        config.insert("_all".into(), AnalyzerKind::Default);
        assert!(matches!(
            IndexMapping::from_config(Some(&config)),
            Err(EngineError::InvalidMapping(_))
        ));

        let mut config = FieldAnalyzerConfig::new();
        config.insert(DYNAMIC_FIELD.into(), AnalyzerKind::Keyword);
        assert!(IndexMapping::from_config(Some(&config)).is_err());
        assert_eq!(IndexMapping::from_config(None).unwrap(), IndexMapping::default());
    }
}
