//! Directory client: the one network call this crate makes.
//!
//! `fetch_users` reports failures as raw [`FetchError`]s. It never retries and
//! never caches; classification and retry decisions belong to the store.

use std::fmt::Debug;

use async_trait::async_trait;
use log::{info, warn};

use crate::http::{Client, HttpError};
use crate::{DirectoryConfig, FetchError, User};

#[async_trait]
pub trait UserDirectoryClient: Send + Sync + Debug {
    /// Fetch the full user list in server order.
    async fn fetch_users(&self) -> Result<Vec<User>, FetchError>;
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Connect(msg) | HttpError::Timeout(msg) => Self::Connect(msg),
            HttpError::Other(msg) => Self::Unexpected(Some(msg)),
        }
    }
}

/// `reqwest`-backed client for `GET {base}/users`.
#[derive(Debug, Clone)]
pub struct HttpUserDirectoryClient {
    config: DirectoryConfig,
    http: Client,
}

impl HttpUserDirectoryClient {
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl UserDirectoryClient for HttpUserDirectoryClient {
    async fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
        let url = self.config.users_url();
        info!("Fetching users from {url}");

        let response = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .inspect_err(|err| warn!("GET {url} failed: {err}"))?;

        if !response.is_success() {
            warn!("GET {url} returned status {}", response.status);
            return Err(FetchError::Status(response.status));
        }

        let users: Vec<User> = response.json().map_err(|err| {
            warn!("GET {url} returned an undecodable body: {err}");
            FetchError::Decode(err.to_string())
        })?;

        info!("Fetched {} users", users.len());
        Ok(users)
    }
}
