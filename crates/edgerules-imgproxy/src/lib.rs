//! Remote-image proxying through an allow-list.
//!
//! The one request-time component of this workspace: validates a target URL
//! against configured remote patterns, fetches it, and passes the image
//! through. Hostname and path patterns use `*` for exactly one segment and
//! `**` for any number of segments.
//!
//! Only `content-type` and `content-length` are copied from upstream;
//! `content-encoding` is deliberately dropped because the edge layer
//! re-encodes the body itself.
//!
//! Fetches are never retried: a failure or non-image response is a terminal
//! error response ([`ImageProxyError::status_code`] maps each variant to
//! the HTTP status the edge layer should answer with).

use std::time::Duration;

use edgerules_manifest::RemotePatternConfig;
use ureq::Agent;
use ureq::http::Uri;

/// Default upstream fetch timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Image proxy error.
#[derive(Debug, thiserror::Error)]
pub enum ImageProxyError {
    /// The URL does not parse or lacks a host.
    #[error("invalid image URL: {0}")]
    InvalidUrl(String),

    /// The URL matches no allow-list pattern.
    #[error("image URL is not allowed: {0}")]
    Disallowed(String),

    /// The URL points back at the serving host.
    #[error("self-referential image URL: {0}")]
    SelfReference(String),

    /// Upstream responded with something that is not an image.
    #[error("upstream returned non-image content type '{content_type}'")]
    NotAnImage { content_type: String },

    /// Upstream responded with an error status.
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    /// The fetch itself failed.
    #[error("failed to fetch image")]
    Fetch(#[source] Box<ureq::Error>),
}

impl ImageProxyError {
    /// HTTP status the edge layer should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUrl(_)
            | Self::Disallowed(_)
            | Self::SelfReference(_)
            | Self::NotAnImage { .. } => 400,
            Self::UpstreamStatus(_) | Self::Fetch(_) => 500,
        }
    }
}

/// One allow-list entry.
#[derive(Clone, Debug)]
pub struct RemotePattern {
    protocol: Option<String>,
    hostname: String,
    port: Option<String>,
    pathname: Option<String>,
}

impl RemotePattern {
    /// Allow a hostname pattern over any protocol, port, and path.
    #[must_use]
    pub fn host(hostname: impl Into<String>) -> Self {
        Self {
            protocol: None,
            hostname: hostname.into(),
            port: None,
            pathname: None,
        }
    }

    /// True if the URL components satisfy this pattern.
    fn matches(&self, scheme: &str, host: &str, port: Option<u16>, path: &str) -> bool {
        if let Some(protocol) = &self.protocol
            && protocol != scheme
        {
            return false;
        }
        if let Some(expected) = &self.port {
            let actual = port.map_or_else(|| default_port(scheme).to_string(), |p| p.to_string());
            if *expected != actual {
                return false;
            }
        }
        if !glob_segments_match(&self.hostname, host, '.') {
            return false;
        }
        if let Some(pathname) = &self.pathname
            && !glob_segments_match(pathname, path, '/')
        {
            return false;
        }
        true
    }
}

impl From<&RemotePatternConfig> for RemotePattern {
    fn from(config: &RemotePatternConfig) -> Self {
        Self {
            protocol: config.protocol.clone(),
            hostname: config.hostname.clone(),
            port: config.port.clone(),
            pathname: config.pathname.clone(),
        }
    }
}

/// A fetched upstream image.
#[derive(Clone, Debug)]
pub struct FetchedImage {
    /// Image bytes.
    pub body: Vec<u8>,
    /// Upstream `content-type`.
    pub content_type: String,
    /// Upstream `content-length`, when it was present.
    pub content_length: Option<u64>,
}

/// Validates and fetches remote images through the allow-list.
pub struct ImageProxy {
    allow_list: Vec<RemotePattern>,
    self_host: Option<String>,
    agent: Agent,
}

impl ImageProxy {
    /// Create a proxy with an allow-list and the serving host (for
    /// self-reference rejection).
    #[must_use]
    pub fn new(allow_list: Vec<RemotePattern>, self_host: Option<String>) -> Self {
        Self::with_timeout(allow_list, self_host, DEFAULT_TIMEOUT)
    }

    /// Create a proxy with an explicit upstream timeout.
    #[must_use]
    pub fn with_timeout(
        allow_list: Vec<RemotePattern>,
        self_host: Option<String>,
        timeout: Duration,
    ) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            allow_list,
            self_host,
            agent,
        }
    }

    /// Create a proxy from the images registry.
    #[must_use]
    pub fn from_config(patterns: &[RemotePatternConfig], self_host: Option<String>) -> Self {
        Self::new(patterns.iter().map(RemotePattern::from).collect(), self_host)
    }

    /// Validate a target URL without fetching it.
    ///
    /// # Errors
    ///
    /// Returns the same validation errors [`fetch`](Self::fetch) would.
    pub fn check_url(&self, url: &str) -> Result<(), ImageProxyError> {
        let uri: Uri = url
            .parse()
            .map_err(|_| ImageProxyError::InvalidUrl(url.to_owned()))?;

        let scheme = uri.scheme_str().unwrap_or_default();
        if scheme != "http" && scheme != "https" {
            return Err(ImageProxyError::InvalidUrl(url.to_owned()));
        }
        let host = uri
            .host()
            .ok_or_else(|| ImageProxyError::InvalidUrl(url.to_owned()))?;

        if let Some(self_host) = &self.self_host
            && host.eq_ignore_ascii_case(self_host)
        {
            return Err(ImageProxyError::SelfReference(url.to_owned()));
        }

        let allowed = self
            .allow_list
            .iter()
            .any(|pattern| pattern.matches(scheme, host, uri.port_u16(), uri.path()));
        if !allowed {
            return Err(ImageProxyError::Disallowed(url.to_owned()));
        }
        Ok(())
    }

    /// Fetch a remote image after validating its URL.
    ///
    /// # Errors
    ///
    /// Returns [`ImageProxyError`] for disallowed URLs, non-image upstream
    /// responses, or fetch failures. Nothing is retried.
    pub fn fetch(&self, url: &str) -> Result<FetchedImage, ImageProxyError> {
        self.check_url(url)?;

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| ImageProxyError::Fetch(Box::new(e)))?;

        let status = response.status().as_u16();
        if status >= 400 {
            tracing::warn!(url = %url, status, "image upstream returned error status");
            return Err(ImageProxyError::UpstreamStatus(status));
        }

        let content_type = header(&response, "content-type").unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(ImageProxyError::NotAnImage { content_type });
        }
        let content_length = header(&response, "content-length").and_then(|v| v.parse().ok());

        let body = response
            .into_body()
            .read_to_vec()
            .map_err(|e| ImageProxyError::Fetch(Box::new(e)))?;

        Ok(FetchedImage {
            body,
            content_type,
            content_length,
        })
    }
}

fn header<B>(response: &ureq::http::Response<B>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn default_port(scheme: &str) -> u16 {
    if scheme == "https" { 443 } else { 80 }
}

/// Match a `*`/`**` pattern against a value, segment-wise.
///
/// `*` matches exactly one segment, `**` any number (including none).
fn glob_segments_match(pattern: &str, value: &str, separator: char) -> bool {
    let pattern: Vec<&str> = pattern.split(separator).collect();
    let value: Vec<&str> = value.split(separator).collect();
    match_parts(&pattern, &value)
}

fn match_parts(pattern: &[&str], value: &[&str]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some((&"**", rest)) => (0..=value.len()).any(|skip| match_parts(rest, &value[skip..])),
        Some((&part, rest)) => match value.split_first() {
            Some((&segment, value_rest)) => {
                (part == "*" || part == segment) && match_parts(rest, value_rest)
            }
            None => false,
        },
    }
}
