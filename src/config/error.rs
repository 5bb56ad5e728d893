use thiserror::Error;

use super::models::TrackingCategory;

/// Semantic problems detected after a config has been parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field-level constraint violations reported by `serde_valid`.
    #[error("configuration constraints violated: {0}")]
    Constraints(String),

    #[error("layout.width is `custom` but layout.customWidth is missing or zero")]
    MissingCustomWidth,

    #[error("script id '{id}' appears more than once in the {category} list")]
    DuplicateScriptId {
        category: TrackingCategory,
        id: String,
    },

    #[error("scripts '{first}' and '{second}' in the {category} list share the runtime key '{key}'")]
    CacheKeyCollision {
        category: TrackingCategory,
        first: String,
        second: String,
        key: String,
    },

    #[error("script at index {index} of the {category} list has an empty id")]
    EmptyScriptId {
        category: TrackingCategory,
        index: usize,
    },

    #[error("script '{id}' is listed under {list} but declares category {declared}")]
    CategoryMismatch {
        id: String,
        list: TrackingCategory,
        declared: TrackingCategory,
    },
}
