// FileManage - object-storage file listing core
// Paginated listing, sorted views, deletion with resync, auth-failure logout

pub mod collaborators;
pub mod config;
pub mod credential_store;
pub mod crypto;
pub mod i18n;
pub mod listing;
pub mod providers;
pub mod session;
pub mod utils;

pub use collaborators::{CredentialStore, Localizer, Navigator, Notifier, ToastLevel};
pub use listing::{
    ContinuationState, DeleteOutcome, FailureKind, FileManageController, LoadOutcome, LoadState,
    SortKey, SortOrder, SortSpec,
};
pub use providers::{ListPage, ListingApi, ProviderError, RemoteObject};
