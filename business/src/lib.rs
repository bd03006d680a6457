//! User directory core: the HTTP client, the user model, the error taxonomy
//! and the store that the view layer observes and drives.

mod client;
mod config;
mod error;
pub mod http;
mod store;
mod test_utils;
mod user;

pub use client::{HttpUserDirectoryClient, UserDirectoryClient};
pub use config::{DEFAULT_API_BASE_URL, DirectoryConfig};
pub use error::{FetchError, NetworkError, UNKNOWN_ERROR};
pub use store::{DirectoryState, UserDirectoryStore, classify_failure, filter_users};
pub use user::{Address, Company, Geo, User, UserId};
