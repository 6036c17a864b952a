//! Study resolution errors

use thiserror::Error;

/// Errors raised while resolving a condition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// `index` is outside `[0, len)`; with an empty study every index is.
    #[error("Invalid condition_index: {index}. {}", valid_range(.len))]
    InvalidConditionIndex { index: usize, len: usize },
}

fn valid_range(len: &usize) -> String {
    match len {
        0 => "No conditions loaded; valid range is empty".to_string(),
        n => format!("Must be between 0 and {}", n - 1),
    }
}
