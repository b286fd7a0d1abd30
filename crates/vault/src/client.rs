//! Primitive object operations against the remote vault bucket.
//!
//! [`VaultClient`] holds the bucket coordinates and an HTTP client; every
//! operation takes the bearer token explicitly so token lifetime stays the
//! caller's concern.  Non-success responses surface as
//! [`VaultError::Transport`] with the provider's message -- the client
//! never retries.

use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

/// Default service endpoint for the object vault.
pub const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// Listing response body; only the delimiter-collapsed child prefixes are
/// read.
#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    prefixes: Vec<String>,
}

/// Client for one vault bucket.
pub struct VaultClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl VaultClient {
    /// Create a client for `bucket` at the default service endpoint.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self::with_base_url(bucket, DEFAULT_BASE_URL)
    }

    /// Create a client against a non-default endpoint (emulators, proxies).
    pub fn with_base_url(bucket: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        }
    }

    /// Bucket name this client addresses.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    // -- URL construction ---------------------------------------------------

    /// Media-download URL for an object; the object path is one encoded
    /// path segment (slashes become `%2F`).
    fn media_url(&self, path: &str) -> Result<Url, VaultError> {
        let mut url = self.service_url(&["storage", "v1", "b", &self.bucket, "o", path])?;
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    /// Media-upload URL; the object path travels in the `name` query
    /// parameter.
    fn upload_url(&self, path: &str) -> Result<Url, VaultError> {
        let mut url = self.service_url(&["upload", "storage", "v1", "b", &self.bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", path);
        Ok(url)
    }

    /// Listing URL with prefix and `/` delimiter.
    fn list_url(&self, prefix: &str) -> Result<Url, VaultError> {
        let mut url = self.service_url(&["storage", "v1", "b", &self.bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("prefix", prefix)
            .append_pair("delimiter", "/");
        Ok(url)
    }

    fn service_url(&self, segments: &[&str]) -> Result<Url, VaultError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| VaultError::Config(format!("Invalid vault base URL: {e}")))?;
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| VaultError::Config("Vault base URL cannot be a base".into()))?;
            parts.pop_if_empty();
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url)
    }

    /// Public (unauthenticated-read) URL of an object, as returned by
    /// `put`.
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, path)
    }

    // -- Primitives ---------------------------------------------------------

    /// Fetch an object's bytes. `Ok(None)` when the object is absent.
    pub async fn get(&self, token: &str, path: &str) -> Result<Option<Vec<u8>>, VaultError> {
        let url = self.media_url(path)?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }

    /// Upload raw bytes, returning the object's public URL.
    pub async fn put(
        &self,
        token: &str,
        path: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, VaultError> {
        let url = self.upload_url(path)?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await?;

        Self::check_status(response).await?;
        tracing::debug!(bucket = %self.bucket, path, "Uploaded vault object");
        Ok(self.public_url(path))
    }

    /// List immediate child names under `prefix` using the `/` delimiter.
    ///
    /// Returned names are the raw prefixes from the provider (they still
    /// carry the listing prefix and a trailing `/`).
    pub async fn list(&self, token: &str, prefix: &str) -> Result<Vec<String>, VaultError> {
        let url = self.list_url(prefix)?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let response = Self::check_status(response).await?;
        let listing: ListResponse = response.json().await?;
        Ok(listing.prefixes)
    }

    /// Fetch bytes from an arbitrary external URL (no bearer token).
    ///
    /// Used to relay artifacts hosted outside the vault into it.
    pub async fn fetch_external(&self, url: &str) -> Result<Vec<u8>, VaultError> {
        let response = self.http.get(url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Map a non-success response to [`VaultError::Transport`] carrying
    /// the provider's message.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VaultError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(VaultError::Transport {
            status: status.as_u16(),
            message,
        })
    }
}

/// Errors raised by vault object operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The vault responded with a non-success status.
    #[error("Vault request failed with status {status}: {message}")]
    Transport { status: u16, message: String },

    /// The request failed before a response arrived.
    #[error("Vault transport error: {0}")]
    Request(#[from] reqwest::Error),

    /// A response or document body could not be (de)serialized.
    #[error("Vault document decode error: {0}")]
    Decode(String),

    /// The client itself is misconfigured.
    #[error("Vault client configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> VaultClient {
        VaultClient::new("callsheet-vault")
    }

    #[test]
    fn media_url_encodes_object_path_as_one_segment() {
        let url = client().media_url("projects/pilot/state.json").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/callsheet-vault/o/projects%2Fpilot%2Fstate.json?alt=media"
        );
    }

    #[test]
    fn upload_url_carries_path_in_name_param() {
        let url = client().upload_url("projects/pilot/state.json").unwrap();
        assert!(url
            .as_str()
            .starts_with("https://storage.googleapis.com/upload/storage/v1/b/callsheet-vault/o?"));
        assert!(url.as_str().contains("uploadType=media"));
        assert!(url.as_str().contains("name=projects%2Fpilot%2Fstate.json"));
    }

    #[test]
    fn list_url_uses_prefix_and_slash_delimiter() {
        let url = client().list_url("projects/").unwrap();
        assert!(url.as_str().contains("prefix=projects%2F"));
        assert!(url.as_str().contains("delimiter=%2F"));
    }

    #[test]
    fn media_url_encodes_spaces() {
        let url = client().media_url("library/night market/artifact.json").unwrap();
        assert!(url.as_str().contains("night%20market"));
    }

    #[test]
    fn public_url_is_plain_bucket_path() {
        assert_eq!(
            client().public_url("projects/pilot/units/s1_01/clip.mp4"),
            "https://storage.googleapis.com/callsheet-vault/projects/pilot/units/s1_01/clip.mp4"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = VaultClient::with_base_url("b", "http://localhost:4443/");
        assert_eq!(c.public_url("x"), "http://localhost:4443/b/x");
    }

    #[test]
    fn list_response_tolerates_missing_prefixes() {
        let listing: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(listing.prefixes.is_empty());

        let listing: ListResponse =
            serde_json::from_str(r#"{"prefixes": ["projects/pilot/"], "kind": "x"}"#).unwrap();
        assert_eq!(listing.prefixes, vec!["projects/pilot/"]);
    }
}
