//! Thin HTTP client over `reqwest` returning Send-safe, fully-read responses.
//!
//! Callers get the status and body bytes in one value, and transport failures
//! come back already sorted into connection problems, timeouts and everything
//! else.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    /// Returns true if the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport-level failure; no response was received in full.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("HTTP error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

/// Shared HTTP client. Cloning is cheap and reuses the connection pool.
#[derive(Debug, Clone, Default)]
pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            client: self.inner.clone(),
            url: url.into(),
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    url: String,
    headers: HashMap<String, String>,
}

impl RequestBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Send the request and read the whole body.
    pub async fn send(self) -> HttpResult<Response> {
        let mut request = self.client.get(&self.url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("GET {} -> {status} ({} bytes)", self.url, body.len());

        Ok(Response { status, body })
    }
}
