//! Search service core / 搜索服务核心
//!
//! [`IndexRegistry`] owns the live indexes. Document writes, queries and
//! statistics are all methods on it and resolve the index by name first.
//!
//! Call direction: API → registry → engine (unidirectional) / 调用方向

mod documents;
mod query;
mod registry;
pub mod statistics;

pub use registry::{validate_index_name, IndexRegistry};
pub use statistics::DEFAULT_RANGE_SAMPLE;
