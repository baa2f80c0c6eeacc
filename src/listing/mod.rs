//! File listing core: paging, sorting and failure handling for one view.

pub mod controller;
pub mod error_classifier;
pub mod pager;
pub mod sorting;

pub use controller::{DeleteOutcome, FileManageController, LoadOutcome, LoadState};
pub use error_classifier::{ErrorClassifier, FailureKind, Operation};
pub use pager::{ContinuationState, Pager};
pub use sorting::{SortKey, SortOrder, SortSpec};
