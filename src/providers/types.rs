//! Shared types for the listing transport
//!
//! This module contains the object representation returned by a listing call,
//! the page envelope, the S3 connection settings and the transport error type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FileManageConfig;

/// One stored object as reported by the listing API
///
/// Every field except `size` may be missing on malformed entries; the sorter
/// substitutes `""` for a missing key and the epoch for a missing timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Object key (full path inside the bucket)
    pub key: Option<String>,
    /// Last modification time
    pub last_modified: Option<DateTime<Utc>>,
    /// Size in bytes
    pub size: u64,
    /// Entity tag without surrounding quotes
    #[serde(default)]
    pub etag: Option<String>,
    /// Storage class (e.g. STANDARD, GLACIER)
    #[serde(default)]
    pub storage_class: Option<String>,
}

impl RemoteObject {
    /// Create an object with the given key, timestamp and size
    pub fn new(key: impl Into<String>, last_modified: Option<DateTime<Utc>>, size: u64) -> Self {
        Self {
            key: Some(key.into()),
            last_modified,
            size,
            etag: None,
            storage_class: None,
        }
    }

    /// Key used for sorting: the raw key, or empty when absent
    pub fn sort_name(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    /// Timestamp used for sorting: milliseconds since the epoch, 0 when absent
    pub fn sort_instant(&self) -> i64 {
        self.last_modified
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    }

    /// Human-readable key with percent-encoding removed
    pub fn display_name(&self) -> String {
        let raw = self.sort_name();
        urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string())
    }
}

/// One page of a listing response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    /// Objects on this page. `None` is a legal, empty contribution.
    pub objects: Option<Vec<RemoteObject>>,
    /// Whether the server holds more results after this page
    pub is_truncated: bool,
    /// Cursor for the next page, absent when the scan is complete
    pub next_continuation_token: Option<String>,
}

impl ListPage {
    /// A final page holding `objects`
    pub fn last(objects: Vec<RemoteObject>) -> Self {
        Self {
            objects: Some(objects),
            is_truncated: false,
            next_continuation_token: None,
        }
    }

    /// A truncated page followed by `token`
    pub fn truncated(objects: Vec<RemoteObject>, token: impl Into<String>) -> Self {
        Self {
            objects: Some(objects),
            is_truncated: true,
            next_continuation_token: Some(token.into()),
        }
    }

    /// The token to request next, if the server reported one
    pub fn next_token(&self) -> Option<&str> {
        if !self.is_truncated {
            return None;
        }
        self.next_continuation_token
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

/// S3-specific configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3-compatible endpoint URL (None for AWS S3)
    pub endpoint: Option<String>,
    /// AWS region (e.g., us-east-1)
    pub region: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key (SecretString for memory zeroization)
    pub secret_access_key: secrecy::SecretString,
    /// Bucket name
    pub bucket: String,
    /// Key prefix the listing is restricted to
    pub prefix: Option<String>,
    /// Use path-style addressing (for MinIO, etc.)
    pub path_style: bool,
    /// `max-keys` sent with every ListObjectsV2 request
    pub page_size: u32,
}

impl S3Config {
    pub fn from_config(config: &FileManageConfig, secret: &str) -> Result<Self, ProviderError> {
        let bucket = config.bucket.trim().to_string();
        if bucket.is_empty() {
            return Err(ProviderError::InvalidConfig("S3 bucket name is required".to_string()));
        }

        let endpoint = match config.endpoint.as_deref().map(str::trim) {
            None | Some("") | Some("s3.amazonaws.com") => None,
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                Some(host.to_string())
            }
            // Ensure endpoint has scheme
            Some(host) => Some(format!("https://{}", host)),
        };

        // Default to path style for custom endpoints
        let path_style = config.path_style.unwrap_or(endpoint.is_some());

        Ok(Self {
            endpoint,
            region: config.region.trim().to_string(),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: secrecy::SecretString::from(secret.to_string()),
            bucket,
            prefix: config.prefix.clone().filter(|p| !p.trim_matches('/').is_empty()),
            path_style,
            page_size: config.page_size.clamp(1, 1000),
        })
    }
}

/// Transport error type
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// HTTP status carried by this error, if the request reached the server
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        ProviderError::Http {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config(bucket: &str, endpoint: Option<&str>) -> FileManageConfig {
        FileManageConfig {
            bucket: bucket.to_string(),
            endpoint: endpoint.map(str::to_string),
            ..FileManageConfig::default()
        }
    }

    #[test]
    fn test_sort_fallbacks() {
        let obj = RemoteObject {
            key: None,
            last_modified: None,
            size: 12,
            etag: None,
            storage_class: None,
        };
        assert_eq!(obj.sort_name(), "");
        assert_eq!(obj.sort_instant(), 0);

        let dated = RemoteObject::new(
            "a.txt",
            Some(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 1).unwrap()),
            1,
        );
        assert_eq!(dated.sort_instant(), 1000);
    }

    #[test]
    fn test_display_name_decodes_percent_encoding() {
        let obj = RemoteObject::new("my%20report.pdf", None, 0);
        assert_eq!(obj.display_name(), "my report.pdf");
        assert_eq!(obj.sort_name(), "my%20report.pdf");
    }

    #[test]
    fn test_next_token_requires_truncation() {
        assert_eq!(ListPage::truncated(vec![], "abc").next_token(), Some("abc"));
        assert_eq!(ListPage::last(vec![]).next_token(), None);

        let inconsistent = ListPage {
            objects: None,
            is_truncated: false,
            next_continuation_token: Some("stale".to_string()),
        };
        assert_eq!(inconsistent.next_token(), None);

        let empty_token = ListPage {
            objects: None,
            is_truncated: true,
            next_continuation_token: Some(String::new()),
        };
        assert_eq!(empty_token.next_token(), None);
    }

    #[test]
    fn test_s3_config_requires_bucket() {
        let err = S3Config::from_config(&config("  ", None), "secret").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));
    }

    #[test]
    fn test_s3_config_endpoint_scheme_and_path_style() {
        let aws = S3Config::from_config(&config("files", Some("s3.amazonaws.com")), "s").unwrap();
        assert!(aws.endpoint.is_none());
        assert!(!aws.path_style);

        let minio = S3Config::from_config(&config("files", Some("minio.local:9000")), "s").unwrap();
        assert_eq!(minio.endpoint.as_deref(), Some("https://minio.local:9000"));
        assert!(minio.path_style);
    }

    #[test]
    fn test_error_status() {
        assert_eq!(ProviderError::http(401, "Unauthorized").status(), Some(401));
        assert_eq!(ProviderError::NetworkError("reset".into()).status(), None);
    }
}
