//! Tantivy-backed engine / 基于 tantivy 的索引引擎
//!
//! Every document is stored several ways: its ID as a raw term, the whole
//! field map as JSON in `_source`, and every string value in `_all`.
//! Mapped fields are indexed individually on top of that. Fields the
//! mapping does not name go into the `_dyn` JSON field as default text, so
//! they stay addressable as `name:value` and show up in statistics.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, Query, QueryParser, RangeQuery, TermQuery};
use tantivy::schema::{
    Field, FieldType, IndexRecordOption, JsonObjectOptions, OwnedValue, Schema,
    TextFieldIndexing, TextOptions, Value, FAST, INDEXED, JSON_END_OF_PATH, STORED, STRING, TEXT,
};
use tantivy::{
    DocAddress, DocId, DocSet, Index, IndexReader, IndexWriter, ReloadPolicy, Score, Searcher,
    SegmentReader, TantivyDocument, Term, TERMINATED,
};
use tracing::{debug, warn};

use super::{
    DictEntry, EngineError, EngineIndex, EngineQuery, EngineRequest, FieldDict, FieldKind,
    FieldSelection, IndexEngine, IndexHandle, IndexMapping, ALL_FIELD, DYNAMIC_FIELD, ID_FIELD,
    SOURCE_FIELD,
};
use crate::analysis::AnalysisRegistry;
use crate::models::{FieldValue, Fields, SearchHit, SearchResult, SortKey};

/// Default writer memory budget (50 MB) / 默认写入内存
const WRITER_HEAP_BYTES: usize = 50_000_000;
/// Smallest arena tantivy accepts per indexing thread / 每线程最小写入内存
const WRITER_ARENA_MIN_BYTES: usize = 15_000_000;
const RAW_TOKENIZER: &str = "raw";
/// Separator tantivy puts between JSON path segments
const JSON_PATH_SEP: u8 = 1;
const STR_TYPE_CODE: u8 = b's';

/// Engine factory holding the analyzers every index gets / 引擎工厂
pub struct TantivyEngine {
    analysis: Arc<AnalysisRegistry>,
    writer_heap_bytes: usize,
    writer_threads: usize,
}

impl TantivyEngine {
    pub fn new(analysis: Arc<AnalysisRegistry>) -> Self {
        Self {
            analysis,
            writer_heap_bytes: WRITER_HEAP_BYTES,
            writer_threads: 1,
        }
    }

    /// Writer budget; threads are capped so each gets at least 15 MB / 写入参数
    pub fn with_writer(mut self, heap_bytes: usize, threads: usize) -> Self {
        let heap = heap_bytes.max(WRITER_ARENA_MIN_BYTES);
        let max_threads = heap / WRITER_ARENA_MIN_BYTES;
        let capped = threads.clamp(1, max_threads);
        if heap != heap_bytes || capped != threads {
            warn!(
                "Writer budget {} bytes / {} threads adjusted to {} bytes / {} threads",
                heap_bytes, threads, heap, capped
            );
        }
        self.writer_heap_bytes = heap;
        self.writer_threads = capped;
        self
    }

    fn build_schema(&self, mapping: &IndexMapping) -> Result<Schema, EngineError> {
        let mut builder = Schema::builder();
        builder.add_text_field(ID_FIELD, STRING | STORED);
        builder.add_text_field(SOURCE_FIELD, STORED);
        builder.add_text_field(ALL_FIELD, TEXT);
        builder.add_json_field(
            DYNAMIC_FIELD,
            JsonObjectOptions::from(TEXT).set_expand_dots_enabled(),
        );

        for field in &mapping.fields {
            match (field.kind, field.analyzer.as_deref()) {
                (FieldKind::Number, _) => {
                    builder.add_f64_field(&field.name, INDEXED | FAST);
                }
                (FieldKind::Keyword, _) => {
                    builder.add_text_field(&field.name, STRING);
                }
                (FieldKind::Text, Some(analyzer)) => {
                    if !self.analysis.contains_analyzer(analyzer) {
                        return Err(EngineError::UnknownAnalyzer(analyzer.to_string()));
                    }
                    let indexing = TextFieldIndexing::default()
                        .set_tokenizer(analyzer)
                        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
                    builder.add_text_field(
                        &field.name,
                        TextOptions::default().set_indexing_options(indexing),
                    );
                }
                (FieldKind::Text, None) => {
                    builder.add_text_field(&field.name, TEXT);
                }
            }
        }
        Ok(builder.build())
    }

    fn from_index(&self, index: Index, path: &Path) -> Result<IndexHandle, EngineError> {
        self.analysis.install(index.tokenizers());

        let schema = index.schema();
        for (_, entry) in schema.fields() {
            if let FieldType::Str(opts) = entry.field_type() {
                if let Some(indexing) = opts.get_indexing_options() {
                    if index.tokenizers().get(indexing.tokenizer()).is_none() {
                        return Err(EngineError::UnknownAnalyzer(indexing.tokenizer().to_string()));
                    }
                }
            }
        }
        let fields = SchemaFields::from_schema(&schema)?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let writer: IndexWriter =
            index.writer_with_num_threads(self.writer_threads, self.writer_heap_bytes)?;

        Ok(Arc::new(TantivyIndex {
            index,
            reader,
            writer: Mutex::new(writer),
            fields,
            path: path.to_path_buf(),
        }))
    }
}

impl IndexEngine for TantivyEngine {
    fn engine_type(&self) -> &'static str {
        "tantivy"
    }

    fn open(&self, path: &Path) -> Result<IndexHandle, EngineError> {
        if !path.exists() {
            return Err(EngineError::PathDoesNotExist(path.to_path_buf()));
        }
        let index = Index::open_in_dir(path)?;
        self.from_index(index, path)
    }

    fn create(&self, path: &Path, mapping: &IndexMapping) -> Result<IndexHandle, EngineError> {
        let schema = self.build_schema(mapping)?;
        std::fs::create_dir_all(path)?;
        let index = Index::create_in_dir(path, schema)?;
        tracing::info!("Index created at {:?} with {} mapped fields", path, mapping.fields.len());
        self.from_index(index, path)
    }
}

struct SchemaFields {
    id: Field,
    source: Field,
    all: Field,
    /// Absent on indexes written before dynamic fields existed
    dynamic: Option<Field>,
    mapped: BTreeMap<String, (Field, FieldKind)>,
}

impl SchemaFields {
    fn from_schema(schema: &Schema) -> Result<Self, EngineError> {
        let lookup = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| EngineError::InvalidMapping(format!("missing {name} field")))
        };

        let mut mapped = BTreeMap::new();
        for (field, entry) in schema.fields() {
            let name = entry.name();
            if [ID_FIELD, SOURCE_FIELD, ALL_FIELD, DYNAMIC_FIELD].contains(&name) {
                continue;
            }
            let kind = match entry.field_type() {
                FieldType::F64(_) => FieldKind::Number,
                FieldType::Str(opts) => match opts.get_indexing_options() {
                    Some(i) if i.tokenizer() == RAW_TOKENIZER => FieldKind::Keyword,
                    _ => FieldKind::Text,
                },
                other => {
                    return Err(EngineError::InvalidMapping(format!(
                        "field {name} has unsupported type {:?}",
                        other.value_type()
                    )))
                }
            };
            mapped.insert(name.to_string(), (field, kind));
        }

        Ok(Self {
            id: lookup(ID_FIELD)?,
            source: lookup(SOURCE_FIELD)?,
            all: lookup(ALL_FIELD)?,
            dynamic: schema.get_field(DYNAMIC_FIELD).ok(),
            mapped,
        })
    }
}

pub struct TantivyIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: SchemaFields,
    path: PathBuf,
}

impl std::fmt::Debug for TantivyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyIndex")
            .field("path", &self.path)
            .field("fields", &self.fields.mapped.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TantivyIndex {
    fn to_tantivy_doc(&self, id: &str, fields: &Fields) -> Result<TantivyDocument, EngineError> {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.fields.id, id);
        doc.add_text(self.fields.source, serde_json::to_string(fields)?);

        let mut dynamic = BTreeMap::new();
        for (name, value) in fields {
            let leaves = value.leaves();
            for leaf in &leaves {
                if let FieldValue::Text(text) = leaf {
                    doc.add_text(self.fields.all, text);
                }
            }

            let Some(&(field, kind)) = self.fields.mapped.get(name) else {
                dynamic.insert(name.clone(), owned_value(value));
                continue;
            };
            for leaf in leaves {
                match kind {
                    FieldKind::Number => match leaf.to_f64() {
                        Ok(v) => doc.add_f64(field, v),
                        Err(e) => debug!("Skipping value of numeric field {}: {}", name, e),
                    },
                    FieldKind::Text | FieldKind::Keyword => {
                        if let Some(text) = leaf.as_text() {
                            doc.add_text(field, text.as_ref());
                        }
                    }
                }
            }
        }

        if let Some(field) = self.fields.dynamic {
            if !dynamic.is_empty() {
                doc.add_object(field, dynamic);
            }
        }
        Ok(doc)
    }

    fn build_query(&self, query: &EngineQuery) -> Result<Box<dyn Query>, EngineError> {
        match query {
            EngineQuery::MatchAll => Ok(Box::new(AllQuery)),
            EngineQuery::QueryString(text) => {
                let mut default_fields = vec![self.fields.all];
                default_fields.extend(
                    self.fields
                        .mapped
                        .values()
                        .filter(|(_, kind)| *kind != FieldKind::Number)
                        .map(|(field, _)| *field),
                );
                let parser = QueryParser::for_index(&self.index, default_fields);
                match self.fields.dynamic {
                    Some(_) => {
                        let schema = self.index.schema();
                        let qualified =
                            qualify_dynamic_fields(text, |name| schema.find_field(name).is_some());
                        Ok(parser.parse_query(&qualified)?)
                    }
                    None => Ok(parser.parse_query(text)?),
                }
            }
            EngineQuery::NumericRange { field, start, end } => {
                match self.fields.mapped.get(field) {
                    Some((_, FieldKind::Number)) => Ok(Box::new(RangeQuery::new_f64_bounds(
                        field.clone(),
                        Bound::Included(*start),
                        Bound::Included(*end),
                    ))),
                    _ => Err(EngineError::UnknownField(field.clone())),
                }
            }
        }
    }

    fn load_hit(
        &self,
        searcher: &Searcher,
        score: f32,
        address: DocAddress,
        selection: &FieldSelection,
    ) -> Result<SearchHit, EngineError> {
        let doc: TantivyDocument = searcher.doc(address)?;
        let id = doc
            .get_first(self.fields.id)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let mut fields = match doc.get_first(self.fields.source).and_then(|v| v.as_str()) {
            Some(source) => serde_json::from_str::<Fields>(source)?,
            None => Fields::new(),
        };
        fields.retain(|name, _| selection.includes(name));
        Ok(SearchHit {
            id,
            fields,
            score: score as f64,
        })
    }

    fn sort_source(&self, field: &str) -> SortSource {
        match (field, self.fields.mapped.get(field)) {
            ("_score", _) => SortSource::Relevance,
            (_, Some((_, FieldKind::Number))) => SortSource::FastNumber(field.to_string()),
            _ => SortSource::Stored {
                id: self.fields.id,
                source: self.fields.source,
                field: field.to_string(),
            },
        }
    }

    /// Top `from + size` by sort key, then the requested page / 排序分页
    fn search_sorted(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        request: &EngineRequest,
        sort: &SortKey,
    ) -> Result<SearchResult, EngineError> {
        let source = self.sort_source(&sort.field);
        let descending = sort.descending;
        let collector = TopDocs::with_limit(request.size)
            .and_offset(request.from)
            .tweak_score(move |segment: &SegmentReader| {
                let mut value_of = source.segment_values(segment);
                move |doc: DocId, score: Score| SortScore {
                    value: value_of(doc, score),
                    descending,
                    score,
                }
            });

        let (total, top) = searcher.search(query, &(Count, collector))?;
        let hits = top
            .into_iter()
            .map(|(key, address)| self.load_hit(searcher, key.score, address, &request.fields))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SearchResult {
            total: total as u64,
            hits,
        })
    }

    fn directory_size(&self) -> u64 {
        let Ok(entries) = std::fs::read_dir(&self.path) else {
            return 0;
        };
        entries
            .flatten()
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }

    /// Visit every term of `field` with its live document count / 遍历词典
    fn walk_terms(
        &self,
        field: Field,
        mut visit: impl FnMut(&[u8], u64),
    ) -> Result<(), EngineError> {
        let searcher = self.reader.searcher();
        for segment in searcher.segment_readers() {
            let inverted = segment.inverted_index(field)?;
            let alive = segment.alive_bitset();
            let mut stream = inverted.terms().stream()?;
            while stream.advance() {
                let info = stream.value();
                let count = match alive {
                    None => info.doc_freq as u64,
                    Some(bitset) => {
                        let mut postings =
                            inverted.read_postings_from_terminfo(info, IndexRecordOption::Basic)?;
                        let mut live = 0u64;
                        let mut doc = postings.doc();
                        while doc != TERMINATED {
                            if bitset.is_alive(doc) {
                                live += 1;
                            }
                            doc = postings.advance();
                        }
                        live
                    }
                };
                if count > 0 {
                    visit(stream.key(), count);
                }
            }
        }
        Ok(())
    }

    /// Paths with at least one live value in the dynamic field / 动态字段路径
    fn dynamic_paths(&self) -> Result<BTreeSet<String>, EngineError> {
        let mut paths = BTreeSet::new();
        let Some(field) = self.fields.dynamic else {
            return Ok(paths);
        };
        self.walk_terms(field, |key, _| {
            if let Some(end) = key.iter().position(|b| *b == JSON_END_OF_PATH) {
                paths.insert(display_path(&key[..end]));
            }
        })?;
        paths.retain(|path| !self.fields.mapped.contains_key(path));
        Ok(paths)
    }

    /// String values of one dynamic path; `None` if no document has the path
    fn dynamic_dict(&self, field: Field, path: &str) -> Result<Option<FieldDict>, EngineError> {
        let mut prefix: Vec<u8> = path
            .bytes()
            .map(|b| if b == b'.' { JSON_PATH_SEP } else { b })
            .collect();
        prefix.push(JSON_END_OF_PATH);

        let mut seen = false;
        let mut merged: BTreeMap<String, u64> = BTreeMap::new();
        self.walk_terms(field, |key, count| {
            let Some(rest) = key.strip_prefix(prefix.as_slice()) else {
                return;
            };
            seen = true;
            if let Some((&STR_TYPE_CODE, text)) = rest.split_first() {
                *merged.entry(String::from_utf8_lossy(text).into_owned()).or_default() += count;
            }
        })?;
        Ok(seen.then(|| dict_from(merged)))
    }
}

fn dict_from(merged: BTreeMap<String, u64>) -> FieldDict {
    FieldDict::new(
        merged
            .into_iter()
            .map(|(term, count)| DictEntry { term, count })
            .collect(),
    )
}

fn display_path(raw: &[u8]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .map(|b| if *b == JSON_PATH_SEP { b'.' } else { *b })
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn owned_value(value: &FieldValue) -> OwnedValue {
    match value {
        FieldValue::Null => OwnedValue::Null,
        FieldValue::Bool(v) => OwnedValue::Bool(*v),
        FieldValue::Int(v) => OwnedValue::I64(*v),
        FieldValue::Float(v) => OwnedValue::F64(*v),
        FieldValue::Text(v) => OwnedValue::Str(v.clone()),
        FieldValue::List(items) => OwnedValue::Array(items.iter().map(owned_value).collect()),
        FieldValue::Map(map) => OwnedValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), owned_value(v)))
                .collect(),
        ),
    }
}

/// Prefix `name:` clauses naming no schema field with `_dyn.` / 动态字段改写
///
/// Quoted phrases are left alone.
fn qualify_dynamic_fields(query: &str, is_schema_field: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(query.len());
    let mut in_quotes = false;
    let mut prev: Option<char> = None;
    let mut rest = query;

    while let Some(c) = rest.chars().next() {
        let clause_start =
            prev.map_or(true, |p| p.is_whitespace() || matches!(p, '(' | '+' | '-'));
        if !in_quotes && clause_start {
            if let Some(name) = field_prefix(rest) {
                if !is_schema_field(name) {
                    out.push_str(DYNAMIC_FIELD);
                    out.push('.');
                }
                out.push_str(name);
                prev = name.chars().last();
                rest = &rest[name.len()..];
                continue;
            }
        }
        if c == '"' && prev != Some('\\') {
            in_quotes = !in_quotes;
        }
        out.push(c);
        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// `name` when `text` starts with `name:` / 字段名前缀
fn field_prefix(text: &str) -> Option<&str> {
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    if !(first.is_alphabetic() || first == '_') {
        return None;
    }
    for (i, c) in chars {
        if c == ':' {
            return Some(&text[..i]);
        }
        if !(c.is_alphanumeric() || c == '_' || c == '.') {
            return None;
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    fn of(value: &FieldValue) -> Option<Self> {
        match value.to_f64() {
            Ok(n) => Some(SortValue::Number(n)),
            Err(_) => value.as_text().map(|t| SortValue::Text(t.into_owned())),
        }
    }

    /// Numbers before text
    fn order(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
            (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Where a segment reads sort values from / 排序取值来源
#[derive(Clone)]
enum SortSource {
    Relevance,
    FastNumber(String),
    Stored {
        id: Field,
        source: Field,
        field: String,
    },
}

type SegmentValues = Box<dyn FnMut(DocId, Score) -> Option<SortValue>>;

impl SortSource {
    fn segment_values(&self, segment: &SegmentReader) -> SegmentValues {
        match self {
            SortSource::Relevance => {
                Box::new(|_: DocId, score: Score| Some(SortValue::Number(score as f64)))
            }
            SortSource::FastNumber(name) => match segment.fast_fields().f64(name) {
                Ok(column) => Box::new(move |doc: DocId, _: Score| {
                    column.first(doc).map(SortValue::Number)
                }),
                Err(e) => {
                    debug!("No values for {} in segment: {}", name, e);
                    Box::new(|_: DocId, _: Score| None)
                }
            },
            SortSource::Stored { id, source, field } => match segment.get_store_reader(1) {
                Ok(store) => {
                    let (id, source, field) = (*id, *source, field.clone());
                    Box::new(move |doc: DocId, _: Score| {
                        let stored: TantivyDocument = store.get(doc).ok()?;
                        stored_sort_value(&stored, id, source, &field)
                    })
                }
                Err(e) => {
                    warn!("Cannot open doc store for sorting on {}: {}", field, e);
                    Box::new(|_: DocId, _: Score| None)
                }
            },
        }
    }
}

fn stored_sort_value(
    doc: &TantivyDocument,
    id: Field,
    source: Field,
    field: &str,
) -> Option<SortValue> {
    if field == ID_FIELD {
        let id = doc.get_first(id).and_then(|v| v.as_str())?;
        return Some(SortValue::Text(id.to_string()));
    }
    let raw = doc.get_first(source).and_then(|v| v.as_str())?;
    let fields: Fields = serde_json::from_str(raw).ok()?;
    fields.get(field).and_then(SortValue::of)
}

/// Collector key for a sorted page: greater ranks first, and a missing
/// value ranks below any present one in both directions.
#[derive(Debug, Clone)]
struct SortScore {
    value: Option<SortValue>,
    descending: bool,
    score: Score,
}

impl PartialEq for SortScore {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for SortScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(match (&self.value, &other.value) {
            (Some(a), Some(b)) if self.descending => a.order(b),
            (Some(a), Some(b)) => b.order(a),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        })
    }
}

impl EngineIndex for TantivyIndex {
    fn index(&self, id: &str, fields: &Fields) -> Result<(), EngineError> {
        let doc = self.to_tantivy_doc(id, fields)?;
        let mut writer = self.writer.lock();
        writer.delete_term(Term::from_field_text(self.fields.id, id));
        writer.add_document(doc)?;
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), EngineError> {
        let mut writer = self.writer.lock();
        writer.delete_term(Term::from_field_text(self.fields.id, id));
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    fn document(&self, id: &str) -> Result<Option<Fields>, EngineError> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(self.fields.id, id),
            IndexRecordOption::Basic,
        );
        let top = searcher.search(&query, &TopDocs::with_limit(1))?;
        match top.into_iter().next() {
            Some((score, address)) => {
                let hit = self.load_hit(&searcher, score, address, &FieldSelection::All)?;
                Ok(Some(hit.fields))
            }
            None => Ok(None),
        }
    }

    fn search(&self, request: &EngineRequest) -> Result<SearchResult, EngineError> {
        let query = self.build_query(&request.query)?;
        let searcher = self.reader.searcher();

        if request.size == 0 {
            let total = searcher.search(query.as_ref(), &Count)?;
            return Ok(SearchResult {
                total: total as u64,
                hits: Vec::new(),
            });
        }

        if let Some(sort) = &request.sort {
            return self.search_sorted(&searcher, query.as_ref(), request, sort);
        }

        let (total, top) = searcher.search(
            query.as_ref(),
            &(
                Count,
                TopDocs::with_limit(request.size).and_offset(request.from),
            ),
        )?;
        let hits = top
            .into_iter()
            .map(|(score, address)| self.load_hit(&searcher, score, address, &request.fields))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SearchResult {
            total: total as u64,
            hits,
        })
    }

    fn doc_count(&self) -> Result<u64, EngineError> {
        Ok(self.reader.searcher().num_docs())
    }

    fn stats_map(&self) -> Result<serde_json::Value, EngineError> {
        let searcher = self.reader.searcher();
        Ok(serde_json::json!({
            "index": {
                "size_in_bytes": self.directory_size(),
                "num_segments": searcher.segment_readers().len(),
                "path": self.path.display().to_string(),
            }
        }))
    }

    fn fields(&self) -> Result<Vec<String>, EngineError> {
        let mut names: Vec<String> = std::iter::once(ALL_FIELD.to_string())
            .chain(self.fields.mapped.keys().cloned())
            .collect();
        names.extend(self.dynamic_paths()?);
        Ok(names)
    }

    fn field_dict(&self, name: &str) -> Result<FieldDict, EngineError> {
        let (field, kind) = match (name, self.fields.mapped.get(name)) {
            (ALL_FIELD, _) => (self.fields.all, FieldKind::Text),
            (_, Some(&mapped)) => mapped,
            (_, None) => {
                let dict = match self.fields.dynamic {
                    Some(field) => self.dynamic_dict(field, name)?,
                    None => None,
                };
                return dict.ok_or_else(|| EngineError::UnknownField(name.to_string()));
            }
        };

        let mut merged: BTreeMap<String, u64> = BTreeMap::new();
        self.walk_terms(field, |key, count| {
            *merged.entry(decode_term(key, kind)).or_default() += count;
        })?;
        Ok(dict_from(merged))
    }

    fn field_kind(&self, name: &str) -> Option<FieldKind> {
        match name {
            ALL_FIELD => Some(FieldKind::Text),
            _ => match self.fields.mapped.get(name) {
                Some((_, kind)) => Some(*kind),
                None => match self.dynamic_paths() {
                    Ok(paths) if paths.contains(name) => Some(FieldKind::Text),
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Cannot list dynamic fields: {}", e);
                        None
                    }
                },
            },
        }
    }
}

fn decode_term(bytes: &[u8], kind: FieldKind) -> String {
    match (kind, <[u8; 8]>::try_from(bytes)) {
        (FieldKind::Number, Ok(raw)) => tantivy::u64_to_f64(u64::from_be_bytes(raw)).to_string(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
