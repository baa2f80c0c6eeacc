//! Session wiring - builds a listing controller from config and stored credentials

use std::sync::Arc;
use tracing::info;

use crate::collaborators::{Navigator, Notifier, PASSWORD_CREDENTIAL};
use crate::config::FileManageConfig;
use crate::credential_store::{CredentialError, FileCredentialStore};
use crate::i18n::StaticLocalizer;
use crate::listing::{ErrorClassifier, FileManageController};
use crate::providers::{ListingApi, ProviderError, S3Config, S3Provider};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No PASSWORD credential stored; the user has to log in first
    #[error("Not logged in")]
    NotLoggedIn,
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Host-supplied sinks for user-visible side effects
pub struct SessionSinks {
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

/// Build a controller over `api` using the configured locale and page limit
pub fn build_controller(
    api: Arc<dyn ListingApi>,
    config: &FileManageConfig,
    credentials: Arc<FileCredentialStore>,
    sinks: SessionSinks,
) -> FileManageController {
    let classifier = ErrorClassifier::new(
        sinks.notifier,
        credentials,
        sinks.navigator,
        Arc::new(StaticLocalizer::new(config.locale)),
    );
    FileManageController::new(api, classifier).with_max_pages(config.max_pages)
}

/// Open an S3-backed controller. The secret access key is the stored
/// PASSWORD credential.
pub fn open_s3_session(
    config: &FileManageConfig,
    credentials: Arc<FileCredentialStore>,
    sinks: SessionSinks,
) -> Result<FileManageController, SessionError> {
    let secret = match credentials.get(PASSWORD_CREDENTIAL) {
        Ok(secret) => secret,
        Err(CredentialError::NotFound(_)) => return Err(SessionError::NotLoggedIn),
        Err(e) => return Err(e.into()),
    };

    let provider = S3Provider::new(S3Config::from_config(config, &secret)?)?;
    info!("Opened session for {}", provider.display_name());

    Ok(build_controller(Arc::new(provider), config, credentials, sinks))
}
