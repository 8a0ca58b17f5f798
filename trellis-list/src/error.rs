use thiserror::Error;

/// Errors originating from the `trellis-list` adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("item {0} is not part of the tree")]
    ItemNotFound(String),

    #[error(
        "node at depth {depth} has no child {index}; \
         the source changed without a data-changed notification"
    )]
    OutOfSync { depth: usize, index: usize },

    #[error("item {0} is reported by more than one node")]
    DuplicateItem(String),
}

impl ListError {
    pub(crate) fn not_found(item: &impl std::fmt::Debug) -> Self {
        Self::ItemNotFound(format!("{item:?}"))
    }

    pub(crate) fn duplicate(item: &impl std::fmt::Debug) -> Self {
        Self::DuplicateItem(format!("{item:?}"))
    }
}

pub type Result<T> = std::result::Result<T, ListError>;
