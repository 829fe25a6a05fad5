use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// Document field value / 文档字段值
///
/// Numbers keep their integer/float distinction so range statistics can
/// apply explicit coercion rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Coerce to f64; only integer and float values are accepted / 转换为浮点数
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            FieldValue::Int(v) => Ok(*v as f64),
            FieldValue::Float(v) => Ok(*v),
            FieldValue::Null => Err(SearchError::UnsupportedValueType("null")),
            FieldValue::Bool(_) => Err(SearchError::UnsupportedValueType("bool")),
            FieldValue::Text(_) => Err(SearchError::UnsupportedValueType("string")),
            FieldValue::List(_) => Err(SearchError::UnsupportedValueType("list")),
            FieldValue::Map(_) => Err(SearchError::UnsupportedValueType("map")),
        }
    }

    /// Textual form of a scalar; containers and null have none / 标量的文本形式
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Int(v) => Some(Cow::Owned(v.to_string())),
            FieldValue::Float(v) => Some(Cow::Owned(v.to_string())),
            FieldValue::Bool(v) => Some(Cow::Borrowed(if *v { "true" } else { "false" })),
            FieldValue::Null | FieldValue::List(_) | FieldValue::Map(_) => None,
        }
    }

    /// Flatten nested lists and maps into scalar leaves / 展开为叶子值
    pub fn leaves(&self) -> Vec<&FieldValue> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FieldValue>) {
        match self {
            FieldValue::List(items) => items.iter().for_each(|v| v.collect_leaves(out)),
            FieldValue::Map(map) => map.values().for_each(|v| v.collect_leaves(out)),
            FieldValue::Null => {}
            scalar => out.push(scalar),
        }
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Analyzer kind per field, fixed at creation / 字段分析器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    Jieba,
    Keyword,
    Number,
    #[serde(other)]
    Default,
}

pub type FieldAnalyzerConfig = BTreeMap<String, AnalyzerKind>;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub fields: Fields,
    pub score: f64,
}

/// Query result page / 查询结果
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStatistics {
    pub doc_count: u64,
    pub index_size: u64,
    pub field_count: usize,
    pub field_freq: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub range_distributions: BTreeMap<String, RangeDistribution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermFrequency {
    pub term: String,
    pub frequency: u64,
}

/// Numeric histogram over a bounded sample / 数值区间分布
#[derive(Debug, Clone, Default, Serialize)]
pub struct RangeDistribution {
    pub field_name: String,
    pub ranges: BTreeMap<String, usize>,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
    /// More documents matched than were sampled / 结果为抽样近似值
    pub approximate: bool,
}

/// Positive page/size pair / 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    size: usize,
}

impl Pagination {
    pub const DEFAULT_SIZE: usize = 10;

    /// page <= 0 becomes 1, size <= 0 becomes 10 / 规范化分页
    pub fn normalized(page: i64, size: i64) -> Self {
        let page = if page <= 0 { 1 } else { page as usize };
        let size = if size <= 0 { Self::DEFAULT_SIZE } else { size as usize };
        Self { page, size }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Zero-based offset of the first hit / 起始偏移
    pub fn from(&self) -> usize {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::normalized(1, Self::DEFAULT_SIZE as i64)
    }
}

/// Single-field sort, `-field` for descending / 单字段排序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normalized() {
        let p = Pagination::normalized(0, -3);
        assert_eq!(p.page(), 1);
        assert_eq!(p.size(), 10);
        assert_eq!(p.from(), 0);

        let p = Pagination::normalized(2, 5);
        assert_eq!(p.from(), 5);
        assert_eq!(p.size(), 5);
    }

    #[test]
    fn test_field_value_coercion() {
        assert_eq!(FieldValue::Int(3).to_f64().unwrap(), 3.0);
        assert_eq!(FieldValue::Float(2.5).to_f64().unwrap(), 2.5);
        assert!(matches!(
            FieldValue::Text("1".into()).to_f64(),
            Err(SearchError::UnsupportedValueType("string"))
        ));
    }

    #[test]
    fn test_field_value_untagged_json() {
        let fields: Fields =
            serde_json::from_str(r#"{"a":1,"b":1.5,"c":"x","d":[true,null],"e":{"f":2}}"#).unwrap();
        assert_eq!(fields["a"], FieldValue::Int(1));
        assert_eq!(fields["b"], FieldValue::Float(1.5));
        assert_eq!(fields["c"], FieldValue::Text("x".into()));
        assert_eq!(fields["d"].leaves(), vec![&FieldValue::Bool(true)]);
        assert_eq!(fields["e"].leaves(), vec![&FieldValue::Int(2)]);
    }

    #[test]
    fn test_analyzer_kind_unknown_is_default() {
        let cfg: FieldAnalyzerConfig = serde_json::from_str(
            r#"{"title":"jieba","tag":"keyword","n":"number","x":"whatever"}"#,
        )
        .unwrap();
        assert_eq!(cfg["title"], AnalyzerKind::Jieba);
        assert_eq!(cfg["tag"], AnalyzerKind::Keyword);
        assert_eq!(cfg["n"], AnalyzerKind::Number);
        assert_eq!(cfg["x"], AnalyzerKind::Default);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(
            SortKey::parse("-price"),
            Some(SortKey { field: "price".into(), descending: true })
        );
        assert_eq!(SortKey::parse("name").map(|k| k.descending), Some(false));
        assert_eq!(SortKey::parse(""), None);
        assert_eq!(SortKey::parse("-"), None);
    }
}
