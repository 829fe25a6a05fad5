//! Index statistics / 索引统计
//!
//! Every figure is read from the live index at call time. The calls that
//! build one [`IndexStatistics`] are not isolated from concurrent writers,
//! so the numbers may disagree with each other slightly under load.

use std::collections::HashMap;

use rayon::prelude::*;

use super::IndexRegistry;
use crate::engine::{
    EngineError, EngineIndex, EngineQuery, EngineRequest, FieldDict, FieldKind, FieldSelection,
    ALL_FIELD,
};
use crate::error::{Result, SearchError};
use crate::models::{IndexStatistics, RangeDistribution, TermFrequency};

/// Hits sampled for a range distribution / 区间分布抽样上限
pub const DEFAULT_RANGE_SAMPLE: usize = 10_000;

/// Document count, size and per-field cardinality / 索引概况
pub fn index_statistics(index: &dyn EngineIndex) -> Result<IndexStatistics> {
    let doc_count = index.doc_count()?;

    // Missing or oddly shaped size is reported as zero
    let index_size = index
        .stats_map()?
        .pointer("/index/size_in_bytes")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);

    let fields = index.fields()?;
    let mut field_freq = std::collections::BTreeMap::new();
    for field in &fields {
        let dict = listed_dict(index, field)?;
        field_freq.insert(field.clone(), dict.cardinality() as u64);
    }

    Ok(IndexStatistics {
        doc_count,
        index_size,
        field_count: fields.len(),
        field_freq,
        range_distributions: Default::default(),
    })
}

/// Term counts summed across all non-numeric fields / 词频排行
///
/// The same term in two fields becomes one entry. Sorted by frequency
/// descending, then by term.
pub fn term_frequency_ranking(index: &dyn EngineIndex) -> Result<Vec<TermFrequency>> {
    let fields: Vec<String> = index
        .fields()?
        .into_iter()
        .filter(|f| f != ALL_FIELD)
        .filter(|f| index.field_kind(f) != Some(FieldKind::Number))
        .collect();

    let merged = fields
        .par_iter()
        .map(|field| -> Result<HashMap<String, u64>> {
            let mut counts = HashMap::new();
            for entry in listed_dict(index, field)? {
                *counts.entry(entry.term).or_default() += entry.count;
            }
            Ok(counts)
        })
        .try_reduce(HashMap::new, |mut acc, counts| {
            for (term, count) in counts {
                *acc.entry(term).or_default() += count;
            }
            Ok(acc)
        })?;

    let mut ranking: Vec<TermFrequency> = merged
        .into_iter()
        .map(|(term, frequency)| TermFrequency { term, frequency })
        .collect();
    ranking.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.term.cmp(&b.term)));
    Ok(ranking)
}

/// Dictionary of a field from `fields()`; one emptied by deletes since reads as empty
fn listed_dict(index: &dyn EngineIndex, field: &str) -> Result<FieldDict> {
    match index.field_dict(field) {
        Err(EngineError::UnknownField(_)) => Ok(FieldDict::default()),
        other => Ok(other?),
    }
}

fn range_label(lo: f64, hi: f64) -> String {
    format!("{lo:.2}-{hi:.2}")
}

/// Histogram of a numeric field over at most `sample_size` documents / 数值区间分布
///
/// Each value lands in the first range `[lo, hi]` containing it. Values that
/// are not numbers are left out of every aggregate.
pub fn range_distribution(
    index: &dyn EngineIndex,
    field: &str,
    ranges: &[[f64; 2]],
    sample_size: usize,
) -> Result<RangeDistribution> {
    if index.field_kind(field) != Some(FieldKind::Number) {
        return Err(SearchError::FieldMismatch {
            field: field.to_string(),
            expected: FieldKind::Number.as_str(),
        });
    }

    let result = index.search(&EngineRequest {
        query: EngineQuery::MatchAll,
        from: 0,
        size: sample_size,
        sort: None,
        fields: FieldSelection::Only(vec![field.to_string()]),
    })?;

    let mut dist = RangeDistribution {
        field_name: field.to_string(),
        ranges: ranges.iter().map(|[lo, hi]| (range_label(*lo, *hi), 0)).collect(),
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        approximate: result.total > result.hits.len() as u64,
        ..Default::default()
    };

    let mut sum = 0.0;
    for hit in &result.hits {
        let Some(raw) = hit.fields.get(field) else {
            continue;
        };
        let value = match raw.to_f64() {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Skipping {} of document {}: {}", field, hit.id, e);
                continue;
            }
        };

        dist.count += 1;
        sum += value;
        dist.min = dist.min.min(value);
        dist.max = dist.max.max(value);

        if let Some([lo, hi]) = ranges.iter().find(|[lo, hi]| *lo <= value && value <= *hi) {
            if let Some(slot) = dist.ranges.get_mut(&range_label(*lo, *hi)) {
                *slot += 1;
            }
        }
    }

    if dist.count > 0 {
        dist.avg = sum / dist.count as f64;
    } else {
        dist.min = 0.0;
        dist.max = 0.0;
    }
    Ok(dist)
}

impl IndexRegistry {
    pub fn index_statistics(&self, index: &str) -> Result<IndexStatistics> {
        let handle = self.resolve(index)?;
        index_statistics(handle.as_ref())
    }

    pub fn term_frequency_ranking(&self, index: &str) -> Result<Vec<TermFrequency>> {
        let handle = self.resolve(index)?;
        term_frequency_ranking(handle.as_ref())
    }

    pub fn range_distribution(
        &self,
        index: &str,
        field: &str,
        ranges: &[[f64; 2]],
        sample_size: usize,
    ) -> Result<RangeDistribution> {
        let handle = self.resolve(index)?;
        range_distribution(handle.as_ref(), field, ranges, sample_size)
    }
}
