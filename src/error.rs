//! Service error taxonomy / 服务错误类型
//!
//! Every public operation of the index layer returns either a value or one
//! of these errors. Nothing here is retried internally.

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Error, Debug)]
pub enum SearchError {
    /// Index name failed the `^[a-zA-Z_.]+$` pattern / 索引名非法
    #[error("invalid index name: {0:?}")]
    InvalidName(String),

    #[error("index already exists: {0}")]
    AlreadyExists(String),

    #[error("index not found: {0}")]
    NotFound(String),

    /// Aggregation asked for a field of the wrong mapping type / 字段类型不匹配
    #[error("field {field} is not a {expected} field")]
    FieldMismatch {
        field: String,
        expected: &'static str,
    },

    /// Stored value cannot be coerced to a number / 值类型不支持
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("engine failure: {0}")]
    EngineFailure(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
