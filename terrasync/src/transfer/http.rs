//! HTTP(S) transport over a single keep-alive client.

use super::retry::{with_retries, AttemptError, RetryPolicy};
use super::{ByteReader, Transport};
use crate::utils::errors::NetworkError;
use crate::utils::{Result, SyncError};
use crate::vpath::{VirtualPath, VirtualPathLike};
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("terrasync.rs/", env!("CARGO_PKG_VERSION"));

/// HTTP basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl FromStr for Credentials {
    type Err = String;

    /// Parse `USERNAME:PASSWORD`; the password may itself contain colons.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((username, password)) if !username.is_empty() => Ok(Self {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err("expected USERNAME:PASSWORD".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub auth: Option<Credentials>,
    pub retry: RetryPolicy,
    /// Whole-request timeout, body included
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            auth: None,
            retry: RetryPolicy::default(),
            timeout: None,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches repository paths relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
    auth: Option<Credentials>,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Only `http` and `https` base URLs are accepted.
    pub fn new(base_url: &str, options: HttpOptions) -> Result<Self> {
        let base = Url::parse(base_url.trim())
            .map_err(|e| SyncError::Config(format!("invalid server URL '{}': {}", base_url, e)))?;

        match base.scheme() {
            "http" | "https" => {}
            other => return Err(SyncError::UnsupportedScheme(other.to_string())),
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(Policy::none())
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            auth: options.auth,
            retry: options.retry,
            timeout: options.timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of a repository path: the base path without its trailing slash,
    /// then the virtual path.
    pub fn resolve(&self, path: &VirtualPath) -> Url {
        let mut url = self.base.clone();
        let joined = format!(
            "{}/{}",
            self.base.path().trim_end_matches('/'),
            path.as_relative()
        );
        url.set_path(&joined);
        url
    }

    /// One GET; anything but `200 OK` is final, redirects included.
    async fn send(&self, url: &Url) -> std::result::Result<Response, AttemptError> {
        let mut request = self.client.get(url.clone());
        if let Some(auth) = &self.auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AttemptError::Transient(Box::new(e)))?;

        if response.status() != StatusCode::OK {
            return Err(AttemptError::Fatal(
                NetworkError::Status {
                    url: url.to_string(),
                    status: response.status().as_u16(),
                }
                .into(),
            ));
        }
        Ok(response)
    }

    /// One GET with the whole body in memory; a body cut short is retried.
    async fn fetch_bytes(&self, url: &Url) -> std::result::Result<Bytes, AttemptError> {
        let response = self.send(url).await?;
        response
            .bytes()
            .await
            .map_err(|e| AttemptError::Transient(Box::new(e)))
    }

    /// Stream one response into a temporary file next to `destination` and
    /// move it into place once the body is complete.
    async fn fetch_to_file(&self, url: &Url, destination: &Path) -> std::result::Result<u64, AttemptError> {
        let response = self.send(url).await?;

        let dir = destination.parent().unwrap_or_else(|| Path::new("."));
        let temp = tempfile::NamedTempFile::new_in(dir)?;
        let mut file = tokio::fs::File::from_std(temp.reopen()?);

        let mut body = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| AttemptError::Transient(Box::new(e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        temp.persist(destination).map_err(|e| AttemptError::Fatal(SyncError::Io(e.error)))?;
        debug!("Wrote {} bytes to {}", written, destination.display());
        Ok(written)
    }
}

impl Transport for HttpTransport {
    async fn get(&mut self, path: &VirtualPath) -> Result<ByteReader> {
        let url = self.resolve(path);
        let this = &*self;
        let target = &url;

        let body = with_retries(&this.retry, url.as_str(), move || this.fetch_bytes(target)).await?;
        Ok(Box::new(Cursor::new(body)))
    }

    async fn download(&mut self, path: &VirtualPath, destination: &Path) -> Result<u64> {
        let url = self.resolve(path);
        let this = &*self;
        let target = &url;

        with_retries(&this.retry, url.as_str(), move || {
            this.fetch_to_file(target, destination)
        })
        .await
    }
}
