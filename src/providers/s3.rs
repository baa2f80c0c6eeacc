//! S3 Listing Provider
//!
//! Implementation of the ListingApi trait for Amazon S3 and S3-compatible storage
//! (MinIO, Backblaze B2, DigitalOcean Spaces, Cloudflare R2, Wasabi, ...).
//!
//! Each `list_files` call issues exactly one ListObjectsV2 request; walking the
//! continuation chain is the pager's job. Requests are signed with AWS Signature
//! Version 4 over reqwest instead of pulling in aws-sdk-s3.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use tracing::debug;

use super::{ListPage, ListingApi, ProviderError, RemoteObject, S3Config};

/// Longest response body excerpt carried in an error message
const ERROR_BODY_LIMIT: usize = 512;

/// S3 Listing Provider
pub struct S3Provider {
    config: S3Config,
    client: Client,
}

impl S3Provider {
    /// Create a new S3 provider with the given configuration
    pub fn new(config: S3Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the S3 endpoint URL
    fn endpoint(&self) -> String {
        if let Some(ref endpoint) = self.config.endpoint {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("https://s3.{}.amazonaws.com", self.config.region)
        }
    }

    /// Build URL for S3 operations
    fn build_url(&self, key: &str) -> String {
        let endpoint = self.endpoint();
        let key = key
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        if self.config.path_style {
            // Path-style: https://endpoint/bucket/key
            if key.is_empty() {
                format!("{}/{}", endpoint, self.config.bucket)
            } else {
                format!("{}/{}/{}", endpoint, self.config.bucket, key)
            }
        } else {
            // Virtual-hosted style: https://bucket.endpoint/key
            let endpoint_without_scheme = endpoint
                .replace("https://", "")
                .replace("http://", "");
            let scheme = if endpoint.starts_with("http://") { "http" } else { "https" };

            if key.is_empty() {
                format!("{}://{}.{}", scheme, self.config.bucket, endpoint_without_scheme)
            } else {
                format!("{}://{}.{}/{}", scheme, self.config.bucket, endpoint_without_scheme, key)
            }
        }
    }

    /// Sign a request using AWS Signature Version 4
    fn sign_request(
        &self,
        method: &str,
        url: &str,
        headers: &mut HashMap<String, String>,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ProviderError> {
        use hmac::{Hmac, Mac};
        use sha2::{Digest, Sha256};

        type HmacSha256 = Hmac<Sha256>;

        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        headers.insert("x-amz-date".to_string(), amz_date.clone());
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.to_string());

        let parsed = url::Url::parse(url)
            .map_err(|e| ProviderError::InvalidConfig(e.to_string()))?;

        let host = match (parsed.host_str(), parsed.port()) {
            (Some(h), Some(port)) => format!("{}:{}", h, port),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(ProviderError::InvalidConfig(format!("No host in {}", url))),
        };
        let path = parsed.path();
        let query = parsed.query().unwrap_or("");

        headers.insert("host".to_string(), host);

        let mut signed_headers: Vec<&str> = headers.keys().map(|s| s.as_str()).collect();
        signed_headers.sort();
        let signed_headers_str = signed_headers.join(";");

        let mut canonical_headers = String::new();
        for header in &signed_headers {
            if let Some(value) = headers.get(*header) {
                canonical_headers.push_str(&format!("{}:{}\n", header.to_lowercase(), value.trim()));
            }
        }

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, path, query, canonical_headers, signed_headers_str, payload_hash
        );

        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date, credential_scope, canonical_request_hash
        );

        fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ProviderError> {
            let mut mac = HmacSha256::new_from_slice(key)
                .map_err(|e| ProviderError::Other(e.to_string()))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }

        let k_date = hmac_sha256(
            format!("AWS4{}", self.config.secret_access_key.expose_secret()).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        let k_region = hmac_sha256(&k_date, self.config.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, b"s3")?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

        Ok(format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.config.access_key_id, credential_scope, signed_headers_str, signature
        ))
    }

    /// Make a signed request to S3
    async fn s3_request(
        &self,
        method: Method,
        key: &str,
        query_params: &[(&str, &str)],
    ) -> Result<reqwest::Response, ProviderError> {
        use sha2::{Digest, Sha256};

        let mut url = self.build_url(key);

        // SigV4 wants the canonical query sorted by parameter name
        let mut params = query_params.to_vec();
        params.sort_by(|a, b| a.0.cmp(b.0));
        let query: String = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        if !query.is_empty() {
            url = format!("{}?{}", url, query);
        }

        let payload_hash = hex::encode(Sha256::digest(b""));

        let mut headers = HashMap::new();
        let authorization =
            self.sign_request(method.as_str(), &url, &mut headers, &payload_hash, Utc::now())?;

        let mut request = self.client.request(method, &url);
        for (key, value) in headers {
            request = request.header(&key, &value);
        }
        request = request.header("Authorization", authorization);

        request
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))
    }

    /// Turn a non-success response into a status-bearing error
    async fn status_error(response: reqwest::Response, action: &str) -> ProviderError {
        let status = response.status();
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            let mut cut = ERROR_BODY_LIMIT;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        let code = extract_xml_tag(&body, "Code").unwrap_or_default();
        ProviderError::http(status.as_u16(), format!("{} failed ({}) {}", action, status, code).trim_end().to_string())
    }

    /// Parse one S3 ListObjectsV2 XML response into a page
    fn parse_list_response(xml: &str) -> Result<ListPage, ProviderError> {
        let contents_pattern = regex::Regex::new(r"(?s)<Contents>(.*?)</Contents>")
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let mut objects = Vec::new();
        for cap in contents_pattern.captures_iter(xml) {
            let Some(content) = cap.get(1) else {
                continue;
            };
            let content_str = content.as_str();

            // A block without <Key> is kept; the sorter treats it as ""
            let key = extract_xml_tag(content_str, "Key").map(|k| unescape_xml(&k));

            let size: u64 = extract_xml_tag(content_str, "Size")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);

            let last_modified = extract_xml_tag(content_str, "LastModified")
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc));

            let etag = extract_xml_tag(content_str, "ETag")
                .map(|s| unescape_xml(&s).trim_matches('"').to_string());

            let storage_class = extract_xml_tag(content_str, "StorageClass");

            objects.push(RemoteObject {
                key,
                last_modified,
                size,
                etag,
                storage_class,
            });
        }

        let is_truncated = extract_xml_tag(xml, "IsTruncated")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let next_continuation_token =
            extract_xml_tag(xml, "NextContinuationToken").map(|t| unescape_xml(&t));

        Ok(ListPage {
            objects: if objects.is_empty() { None } else { Some(objects) },
            is_truncated,
            next_continuation_token,
        })
    }
}

/// Extract content from an XML tag
fn extract_xml_tag(xml: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"<{}[^>]*>([^<]*)</{}>", tag, tag);
    let re = regex::Regex::new(&pattern).ok()?;
    let text = re.captures(xml)?.get(1)?.as_str().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Undo the five predefined XML entity escapes
fn unescape_xml(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[async_trait]
impl ListingApi for S3Provider {
    async fn list_files(&self, continuation_token: Option<&str>) -> Result<ListPage, ProviderError> {
        let page_size = self.config.page_size.to_string();
        let prefix = self
            .config
            .prefix
            .as_deref()
            .map(|p| format!("{}/", p.trim_matches('/')));

        let mut params: Vec<(&str, &str)> = vec![("list-type", "2"), ("max-keys", page_size.as_str())];
        if let Some(ref prefix) = prefix {
            params.push(("prefix", prefix.as_str()));
        }
        if let Some(token) = continuation_token {
            params.push(("continuation-token", token));
        }

        debug!(
            "ListObjectsV2 {} (continuation: {})",
            self.display_name(),
            continuation_token.is_some()
        );

        let response = self.s3_request(Method::GET, "", &params).await?;

        match response.status() {
            StatusCode::OK => {
                let xml = response
                    .text()
                    .await
                    .map_err(|e| ProviderError::ParseError(e.to_string()))?;
                Self::parse_list_response(&xml)
            }
            _ => Err(Self::status_error(response, "List").await),
        }
    }

    async fn delete_file(&self, key: &str) -> Result<(), ProviderError> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(ProviderError::Other("Refusing to delete an empty key".to_string()));
        }

        let response = self.s3_request(Method::DELETE, key, &[]).await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::ACCEPTED => Ok(()),
            _ => Err(Self::status_error(response, "Delete").await),
        }
    }

    fn display_name(&self) -> String {
        if self.config.endpoint.is_some() {
            format!("s3://{} (custom)", self.config.bucket)
        } else {
            format!("s3://{} ({})", self.config.bucket, self.config.region)
        }
    }
}
