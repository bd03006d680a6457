//! Store construction and load helpers shared by the commands.

use anyhow::{Result, bail};
use tracing::instrument;
use userdir_business::{DirectoryConfig, UserDirectoryStore};

pub fn build_store(base_url: &str) -> UserDirectoryStore {
    UserDirectoryStore::with_config(DirectoryConfig::new(base_url))
}

/// Start a load and wait until its result is applied.
#[instrument(skip_all, name = "load")]
pub async fn load_and_wait(store: &mut UserDirectoryStore) {
    store.load();
    store.settle().await;
}

/// Like [`load_and_wait`], but a failed load becomes an error.
pub async fn load_or_fail(store: &mut UserDirectoryStore) -> Result<()> {
    load_and_wait(store).await;
    if let Some(err) = &store.state().error {
        bail!("Could not load users: {err}");
    }
    Ok(())
}
