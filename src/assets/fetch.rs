//! Byte fetchers for image sources.

use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use log::debug;

/// Source of raw asset bytes.
///
/// Implementations must be safe to call concurrently for distinct URLs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the bytes behind `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Default fetcher.
///
/// Handles `http(s)://` through `reqwest` and inline `data:` URIs. `file://`
/// URLs are read only when enabled with [`HttpFetcher::with_local_files`];
/// every other source is a resource error.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
    local_files: bool,
}

impl HttpFetcher {
    /// Create a fetcher with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            local_files: false,
        }
    }

    /// Allow `file://` sources to be read from the local filesystem.
    pub fn with_local_files(mut self, allow: bool) -> Self {
        self.local_files = allow;
        self
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::resource(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::resource(url, format!("HTTP status {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::resource(url, e))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_file(&self, url: &str, path: &str) -> Result<Vec<u8>> {
        if !self.local_files {
            return Err(Error::resource(url, "local files are not enabled"));
        }
        tokio::fs::read(path)
            .await
            .map_err(|e| Error::resource(url, e))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();
        let data = match scheme.as_str() {
            "http" | "https" => self.fetch_http(url).await?,
            "data" => decode_data_uri(url)?,
            "file" => {
                let path = strip_prefix_ignore_case(url, "file://")
                    .ok_or_else(|| Error::resource(url, "malformed file URL"))?;
                self.fetch_file(url, path).await?
            }
            _ => return Err(Error::resource(url, "unsupported URL scheme")),
        };
        debug!("Fetched {} ({} bytes)", truncate(url), data.len());
        Ok(data)
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// Decode the payload of a `data:` URI, base64 or percent-encoded.
fn decode_data_uri(url: &str) -> Result<Vec<u8>> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| Error::resource(truncate(url), "data URI has no payload"))?;
    let is_base64 = header
        .split(';')
        .skip(1)
        .any(|param| param.eq_ignore_ascii_case("base64"));

    if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::resource(truncate(url), e))
    } else {
        percent_decode(payload)
            .ok_or_else(|| Error::resource(truncate(url), "invalid percent-encoding"))
    }
}

fn percent_decode(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}

/// Short form of a URL for messages; data URIs can be megabytes long.
fn truncate(url: &str) -> &str {
    const MAX: usize = 64;
    match url.char_indices().nth(MAX) {
        Some((end, _)) => &url[..end],
        None => url,
    }
}
