//! Storage Providers Module
//!
//! The listing controller talks to remote storage only through the
//! `ListingApi` trait, so the pagination and recovery logic can run against
//! S3, an S3-compatible service, or a scripted test double.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              ListingApi Trait               │
//! │        list_files, delete_file              │
//! └─────────────────────────────────────────────┘
//!                      │
//!              ┌───────┴───────┐
//!              ▼               ▼
//!          ┌──────┐      ┌───────────┐
//!          │  S3  │      │ test mock │
//!          └──────┘      └───────────┘
//! ```

pub mod types;
pub mod s3;

pub use types::*;
pub use s3::S3Provider;

use async_trait::async_trait;

/// Paginated listing and deletion against a remote object store
#[async_trait]
pub trait ListingApi: Send + Sync {
    /// Fetch one page of the listing.
    ///
    /// `continuation_token` is `None` for the first page and the previous
    /// page's `next_continuation_token` afterwards.
    async fn list_files(&self, continuation_token: Option<&str>) -> Result<ListPage, ProviderError>;

    /// Delete the object stored under `key`
    async fn delete_file(&self, key: &str) -> Result<(), ProviderError>;

    /// Display name for this backend instance
    fn display_name(&self) -> String {
        "remote storage".to_string()
    }
}
