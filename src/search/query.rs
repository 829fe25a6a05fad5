//! Query execution / 查询执行
//!
//! Callers hand in an already-normalized [`Pagination`]; both query shapes
//! page identically with `from = (page - 1) * size`.

use super::IndexRegistry;
use crate::engine::{EngineQuery, EngineRequest, FieldSelection};
use crate::error::Result;
use crate::models::{Pagination, SearchResult, SortKey};

impl IndexRegistry {
    /// Run a query string in the engine's own syntax / 关键词查询
    pub fn search(
        &self,
        index: &str,
        query: &str,
        page: Pagination,
        sort: Option<SortKey>,
    ) -> Result<SearchResult> {
        let handle = self.resolve(index)?;
        let request = EngineRequest {
            query: EngineQuery::QueryString(query.to_string()),
            from: page.from(),
            size: page.size(),
            sort,
            fields: FieldSelection::All,
        };
        Ok(handle.search(&request)?)
    }

    /// Match `start <= field <= end` / 数值区间查询
    pub fn range_search(
        &self,
        index: &str,
        field: &str,
        start: f64,
        end: f64,
        page: Pagination,
        sort: Option<SortKey>,
    ) -> Result<SearchResult> {
        let handle = self.resolve(index)?;
        let request = EngineRequest {
            query: EngineQuery::NumericRange {
                field: field.to_string(),
                start,
                end,
            },
            from: page.from(),
            size: page.size(),
            sort,
            fields: FieldSelection::All,
        };
        Ok(handle.search(&request)?)
    }
}
