//! Single funnel for remote-call failures.
//!
//! A 401 from any call logs the user out: toast, credential removal, redirect.
//! Everything else becomes an operation-specific toast and nothing more.

use std::sync::Arc;
use tracing::warn;

use crate::collaborators::{
    CredentialStore, Localizer, Navigator, Notifier, ToastLevel, LOGIN_ROUTE, PASSWORD_CREDENTIAL,
};
use crate::i18n;
use crate::providers::ProviderError;

const HTTP_UNAUTHORIZED: u16 = 401;

/// Remote call a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Delete,
}

impl Operation {
    /// Message key shown for a non-authentication failure
    pub fn failure_message_key(self) -> &'static str {
        match self {
            Operation::List => i18n::GENERIC_LOAD_FAILED,
            Operation::Delete => i18n::DELETE_FAILED,
        }
    }
}

/// How a failure was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Status 401; the user has been logged out
    AuthenticationFailure,
    /// Any other status, or no status at all
    TransientOrServerFailure,
}

impl FailureKind {
    pub fn of(error: &ProviderError) -> Self {
        match error.status() {
            Some(HTTP_UNAUTHORIZED) => FailureKind::AuthenticationFailure,
            _ => FailureKind::TransientOrServerFailure,
        }
    }
}

/// Side-effect handles used when reporting a failure
#[derive(Clone)]
pub struct ErrorClassifier {
    notifier: Arc<dyn Notifier>,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    localizer: Arc<dyn Localizer>,
}

impl ErrorClassifier {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            notifier,
            credentials,
            navigator,
            localizer,
        }
    }

    /// Report `error` from `operation` to the user and return its class
    pub fn handle(&self, operation: Operation, error: &ProviderError) -> FailureKind {
        let kind = FailureKind::of(error);
        warn!("{:?} failed ({:?}): {}", operation, kind, error);

        match kind {
            FailureKind::AuthenticationFailure => {
                let message = self.localizer.translate(i18n::AUTH_FAILED_CHECK_PASSWORD);
                self.notifier.notify(&message, ToastLevel::Error);
                self.credentials.remove_credential(PASSWORD_CREDENTIAL);
                self.navigator.navigate_to(LOGIN_ROUTE);
            }
            FailureKind::TransientOrServerFailure => {
                let message = self.localizer.translate(operation.failure_message_key());
                self.notifier.notify(&message, ToastLevel::Error);
            }
        }

        kind
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use crate::collaborators::{CredentialStore, Localizer, Navigator, Notifier, ToastLevel};

    /// Records every side effect; translates keys to themselves
    #[derive(Default)]
    pub struct Recorder {
        pub toasts: Mutex<Vec<(String, ToastLevel)>>,
        pub removed: Mutex<Vec<String>>,
        pub routes: Mutex<Vec<String>>,
    }

    impl Recorder {
        pub fn toasts(&self) -> Vec<(String, ToastLevel)> {
            self.toasts.lock().unwrap().clone()
        }

        pub fn removed(&self) -> Vec<String> {
            self.removed.lock().unwrap().clone()
        }

        pub fn routes(&self) -> Vec<String> {
            self.routes.lock().unwrap().clone()
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, message: &str, level: ToastLevel) {
            self.toasts.lock().unwrap().push((message.to_string(), level));
        }
    }

    impl CredentialStore for Recorder {
        fn remove_credential(&self, name: &str) {
            self.removed.lock().unwrap().push(name.to_string());
        }
    }

    impl Navigator for Recorder {
        fn navigate_to(&self, route: &str) {
            self.routes.lock().unwrap().push(route.to_string());
        }
    }

    impl Localizer for Recorder {
        fn translate(&self, key: &str) -> String {
            key.to_string()
        }
    }
}
