//! Side-effect sinks the listing controller reports through.
//!
//! The controller never touches cookies, routes or toasts directly; it calls
//! these traits so a host (CLI, desktop shell, tests) can plug in its own.

use serde::{Deserialize, Serialize};

/// Credential name cleared on authentication failure
pub const PASSWORD_CREDENTIAL: &str = "PASSWORD";

/// Route the user is sent to after an authentication failure
pub const LOGIN_ROUTE: &str = "/login";

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// Toast / notification sink
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: ToastLevel);
}

/// Stored login artifacts
pub trait CredentialStore: Send + Sync {
    fn remove_credential(&self, name: &str);
}

/// Router
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: &str);
}

/// Message lookup
pub trait Localizer: Send + Sync {
    fn translate(&self, key: &str) -> String;
}
