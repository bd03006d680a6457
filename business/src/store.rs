//! User directory store.
//!
//! The store is the only writer of [`DirectoryState`]. The view layer reads
//! the current value with [`UserDirectoryStore::state`], subscribes to changes,
//! and forwards intents:
//!
//! - `load` / `retry`: fetch the list in the background
//! - `set_search_query`: narrow the derived `filtered_users` view
//! - `delete_user` / `approve_user`: drop a user from the local list
//! - `clear_error`: dismiss the last load error
//!
//! Fetch results are applied by [`UserDirectoryStore::sync`] (or `settle`) on
//! the caller's side, never from the background task. Each load is tagged with
//! a generation; only the newest load's result is ever applied.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use flume::Receiver;
use futures::FutureExt as _;
use log::{debug, info, warn};
use userdir_states::{State, StateCtx};

use crate::error::UNKNOWN_ERROR;
use crate::{
    DirectoryConfig, FetchError, HttpUserDirectoryClient, NetworkError, User, UserDirectoryClient,
    UserId,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryState {
    /// True from the start of a load until its result is applied.
    pub is_loading: bool,
    /// Users in server order.
    pub users: Vec<User>,
    pub search_query: String,
    /// Outcome of the last failed load, until cleared or a new load starts.
    pub error: Option<NetworkError>,
    /// When the last successful load was applied.
    pub last_loaded: Option<DateTime<Utc>>,
}

impl State for DirectoryState {
    const NAME: &'static str = "directory";
}

impl DirectoryState {
    /// Users matching the current search query.
    pub fn filtered_users(&self) -> Vec<User> {
        filter_users(&self.users, &self.search_query)
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }
}

/// Order-preserving, case-insensitive name-or-email filter.
///
/// A blank query returns `users` unchanged.
pub fn filter_users(users: &[User], query: &str) -> Vec<User> {
    if query.trim().is_empty() {
        return users.to_vec();
    }
    let needle = query.to_lowercase();
    users
        .iter()
        .filter(|user| user.matches_lowercase(&needle))
        .cloned()
        .collect()
}

/// Map a raw client failure to the error shown to the user.
pub fn classify_failure(err: &FetchError) -> NetworkError {
    match err {
        FetchError::Connect(_) => NetworkError::NoInternet,
        FetchError::Status(code) => NetworkError::ServerError { code: *code },
        FetchError::Decode(_) => NetworkError::GenericError {
            message: err.to_string(),
        },
        FetchError::Unexpected(message) => NetworkError::GenericError {
            message: message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_owned()),
        },
    }
}

/// Task kind for user list loads.
struct LoadUsers;

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

/// Fetch through `client`; a panicking client counts as an unexpected failure.
async fn fetch_users_guarded(client: &dyn UserDirectoryClient) -> Result<Vec<User>, FetchError> {
    match AssertUnwindSafe(client.fetch_users()).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(FetchError::Unexpected(panic_message(payload.as_ref()))),
    }
}

#[derive(Debug)]
pub struct UserDirectoryStore {
    ctx: StateCtx<DirectoryState>,
    client: Arc<dyn UserDirectoryClient>,
}

impl UserDirectoryStore {
    pub fn new(client: Arc<dyn UserDirectoryClient>) -> Self {
        Self {
            ctx: StateCtx::default(),
            client,
        }
    }

    /// Store backed by the HTTP client.
    pub fn with_config(config: DirectoryConfig) -> Self {
        Self::new(Arc::new(HttpUserDirectoryClient::new(config)))
    }

    pub fn state(&self) -> &DirectoryState {
        self.ctx.state()
    }

    /// Snapshot after every applied change, in apply order.
    pub fn subscribe(&mut self) -> Receiver<DirectoryState> {
        self.ctx.subscribe()
    }

    /// Filtered list, re-derived after every applied change.
    pub fn subscribe_filtered(&mut self) -> Receiver<Vec<User>> {
        self.ctx.subscribe_with(DirectoryState::filtered_users)
    }

    pub fn filtered_users(&self) -> Vec<User> {
        self.state().filtered_users()
    }

    /// Look up a user in the unfiltered list.
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.state().user(id)
    }

    /// Start fetching the user list.
    ///
    /// Marks the state as loading right away. Any load still in flight is
    /// superseded and its result will be ignored. Must be called inside a
    /// Tokio runtime.
    pub fn load(&mut self) {
        self.ctx.update(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let client = Arc::clone(&self.client);
        let task = self
            .ctx
            .spawn_latest::<LoadUsers, _, _>(move |updater| async move {
                match fetch_users_guarded(client.as_ref()).await {
                    Ok(users) => {
                        let loaded_at = Utc::now();
                        updater.update(move |state| {
                            state.is_loading = false;
                            state.users = users;
                            state.error = None;
                            state.last_loaded = Some(loaded_at);
                        });
                    }
                    Err(err) => {
                        let error = classify_failure(&err);
                        warn!("Loading users failed: {err} (shown as: {error})");
                        updater.update(move |state| {
                            state.is_loading = false;
                            state.error = Some(error);
                        });
                    }
                }
            });
        info!("Load started (generation {})", task.generation());
    }

    pub fn retry(&mut self) {
        self.load();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.ctx.update(|state| state.search_query = query);
    }

    /// Remove the user with the same id from the list. Local only.
    ///
    /// Returns whether a user was removed; an unknown id is a no-op.
    pub fn delete_user(&mut self, user: &User) -> bool {
        let Some(index) = self.state().users.iter().position(|u| u.id == user.id) else {
            debug!("delete_user: id {} not in list", user.id);
            return false;
        };
        self.ctx.update(|state| {
            state.users.remove(index);
        });
        info!("Removed user {} ({})", user.id, user.name);
        true
    }

    /// Accept the user and dismiss it from the list, same as delete.
    pub fn approve_user(&mut self, user: &User) -> bool {
        self.delete_user(user)
    }

    pub fn clear_error(&mut self) {
        self.ctx.update(|state| state.error = None);
    }

    /// Apply finished loads. Returns the number of applied updates.
    pub fn sync(&mut self) -> usize {
        self.ctx.sync()
    }

    /// Wait for every in-flight load and apply its result.
    pub async fn settle(&mut self) {
        self.ctx.settle().await;
    }

    pub async fn shutdown(&mut self) {
        self.ctx.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        GatedClient, PanickingClient, QueuedClient, leanne_and_ervin, sample_user,
    };

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn store_with(users: Vec<User>) -> UserDirectoryStore {
        let mut store = UserDirectoryStore::new(Arc::new(QueuedClient::default()));
        store.ctx.update(|state| state.users = users);
        store
    }

    fn ids(users: &[User]) -> Vec<UserId> {
        users.iter().map(|u| u.id).collect()
    }

    fn people() -> Vec<User> {
        vec![
            sample_user(1, "Leanne Graham", "Sincere@april.biz"),
            sample_user(2, "Ervin Howell", "Shanna@melissa.tv"),
            sample_user(3, "Clementine Bauch", "Nathan@yesenia.net"),
            sample_user(4, "Patricia Lebsack", "Julianne.OConner@kory.org"),
            sample_user(5, "Chelsey Dietrich", "Lucio_Hettinger@annie.ca"),
        ]
    }

    #[test]
    fn test_blank_query_returns_users_unchanged() {
        let users = people();
        for query in ["", " ", "\t\n"] {
            assert_eq!(filter_users(&users, query), users);
        }
    }

    #[test]
    fn test_filter_matches_name_or_email_in_order() {
        let users = people();

        assert_eq!(ids(&filter_users(&users, "LEAN")), vec![1]);
        assert_eq!(ids(&filter_users(&users, "melissa")), vec![2]);
        // Bauch and Dietrich both contain "ch"; list order is kept.
        assert_eq!(ids(&filter_users(&users, "ch")), vec![3, 5]);
        assert_eq!(ids(&filter_users(&users, ".org")), vec![4]);
        assert!(filter_users(&users, "nobody").is_empty());
    }

    #[test]
    fn test_filter_against_reference_for_query_sequence() {
        let users = people();
        let mut store = store_with(users.clone());

        for query in ["e", "ER", "a", "@", "ie", "", "x", "Lucio_"] {
            store.set_search_query(query);
            let expected: Vec<User> = if query.trim().is_empty() {
                users.clone()
            } else {
                users
                    .iter()
                    .filter(|u| {
                        let q = query.to_lowercase();
                        u.name.to_lowercase().contains(&q) || u.email.to_lowercase().contains(&q)
                    })
                    .cloned()
                    .collect()
            };
            assert_eq!(store.filtered_users(), expected, "query {query:?}");
        }
    }

    #[test]
    fn test_set_search_query_does_not_touch_users() {
        let mut store = store_with(people());
        store.set_search_query("lean");

        assert_eq!(store.state().search_query, "lean");
        assert_eq!(store.state().users.len(), 5);
        assert_eq!(store.sync(), 0);
    }

    #[test]
    fn test_delete_removes_exactly_matching_id() {
        let mut store = store_with(people());
        let target = sample_user(3, "renamed locally", "other@example.com");

        assert!(store.delete_user(&target));
        assert_eq!(ids(&store.state().users), vec![1, 2, 4, 5]);

        assert!(!store.delete_user(&target));
        assert_eq!(ids(&store.state().users), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_delete_targets_unfiltered_list() {
        let mut store = store_with(people());
        store.set_search_query("ch");
        assert_eq!(ids(&store.filtered_users()), vec![3, 5]);

        // Not visible under the current filter, still deletable.
        let leanne = store.user(1).cloned().unwrap();
        assert!(store.delete_user(&leanne));

        assert_eq!(ids(&store.state().users), vec![2, 3, 4, 5]);
        assert_eq!(ids(&store.filtered_users()), vec![3, 5]);

        let clementine = store.user(3).cloned().unwrap();
        assert!(store.approve_user(&clementine));
        assert_eq!(ids(&store.filtered_users()), vec![5]);
    }

    #[test]
    fn test_filtered_subscription_rederives_after_each_change() {
        let mut store = store_with(people());
        let filtered = store.subscribe_filtered();

        store.set_search_query("ch");
        let chelsey = store.user(5).cloned().unwrap();
        store.delete_user(&chelsey);
        store.set_search_query("");

        let seen: Vec<Vec<UserId>> = filtered.try_iter().map(|users| ids(&users)).collect();
        assert_eq!(seen, vec![vec![3, 5], vec![3], vec![1, 2, 3, 4]]);
    }

    #[test]
    fn test_clear_error_leaves_users_and_loading() {
        let mut store = store_with(people());
        store.ctx.update(|state| {
            state.error = Some(NetworkError::NoInternet);
            state.is_loading = true;
        });

        store.clear_error();

        assert_eq!(store.state().error, None);
        assert!(store.state().is_loading);
        assert_eq!(store.state().users.len(), 5);
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            classify_failure(&FetchError::Connect("dns".to_owned())),
            NetworkError::NoInternet
        );
        assert_eq!(
            classify_failure(&FetchError::Status(404)),
            NetworkError::ServerError { code: 404 }
        );
        assert_eq!(
            classify_failure(&FetchError::Status(500)),
            NetworkError::ServerError { code: 500 }
        );
        assert_eq!(
            classify_failure(&FetchError::Decode("expected value".to_owned())),
            NetworkError::GenericError {
                message: "failed to decode users: expected value".to_owned()
            }
        );
        assert_eq!(
            classify_failure(&FetchError::Unexpected(None)),
            NetworkError::GenericError {
                message: UNKNOWN_ERROR.to_owned()
            }
        );
        assert_eq!(
            classify_failure(&FetchError::Unexpected(Some(String::new()))),
            NetworkError::GenericError {
                message: UNKNOWN_ERROR.to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_load_sets_loading_synchronously_then_lands() {
        init_logger();
        let client = Arc::new(GatedClient::default());
        let mut store = UserDirectoryStore::new(client.clone());
        let changes = store.subscribe();

        store.load();
        assert!(store.state().is_loading);
        assert_eq!(store.state().error, None);

        client.wait_for_calls(1).await;
        assert!(store.state().is_loading);
        client.answer(0, Ok(leanne_and_ervin()));
        store.settle().await;

        let state = store.state();
        assert!(!state.is_loading);
        assert_eq!(ids(&state.users), vec![1, 2]);
        assert_eq!(state.error, None);
        assert!(state.last_loaded.is_some());

        let loading: Vec<bool> = changes.try_iter().map(|s| s.is_loading).collect();
        assert_eq!(loading, vec![true, false]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_users() {
        init_logger();
        let client = Arc::new(QueuedClient::new([
            Ok(leanne_and_ervin()),
            Err(FetchError::Status(500)),
        ]));
        let mut store = UserDirectoryStore::new(client);

        store.load();
        store.settle().await;
        let first_loaded = store.state().last_loaded;

        store.retry();
        assert!(store.state().is_loading);
        assert_eq!(store.state().error, None);
        store.settle().await;

        let state = store.state();
        assert!(!state.is_loading);
        assert_eq!(state.error, Some(NetworkError::ServerError { code: 500 }));
        assert_eq!(ids(&state.users), vec![1, 2]);
        assert_eq!(state.last_loaded, first_loaded);
    }

    #[tokio::test]
    async fn test_failed_first_load_leaves_users_empty() {
        let client = Arc::new(QueuedClient::new([Err(FetchError::Connect(
            "connection refused".to_owned(),
        ))]));
        let mut store = UserDirectoryStore::new(client);

        store.load();
        store.settle().await;

        assert!(store.state().users.is_empty());
        assert_eq!(store.state().error, Some(NetworkError::NoInternet));
        assert!(!store.state().is_loading);
    }

    #[tokio::test]
    async fn test_later_load_wins_when_it_finishes_first() {
        init_logger();
        let client = Arc::new(GatedClient::default());
        let mut store = UserDirectoryStore::new(client.clone());

        store.load();
        client.wait_for_calls(1).await;
        store.load();
        client.wait_for_calls(2).await;

        let newer = vec![sample_user(9, "Newer Result", "new@example.com")];
        client.answer(1, Ok(newer.clone()));
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while store.sync() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(store.state().users, newer);
        assert!(!store.state().is_loading);

        client.answer(0, Err(FetchError::Status(503)));
        store.settle().await;

        let state = store.state();
        assert_eq!(state.users, newer);
        assert_eq!(state.error, None);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_superseded_success_does_not_clear_loading_early() {
        let client = Arc::new(GatedClient::default());
        let mut store = UserDirectoryStore::new(client.clone());

        store.load();
        client.wait_for_calls(1).await;
        store.load();
        client.wait_for_calls(2).await;

        client.answer(0, Ok(leanne_and_ervin()));
        for _ in 0..10 {
            tokio::task::yield_now().await;
            store.sync();
        }
        assert!(store.state().is_loading);
        assert!(store.state().users.is_empty());

        client.answer(1, Err(FetchError::Unexpected(None)));
        store.settle().await;

        assert!(!store.state().is_loading);
        assert!(store.state().users.is_empty());
        assert_eq!(
            store.state().error,
            Some(NetworkError::GenericError {
                message: UNKNOWN_ERROR.to_owned()
            })
        );
    }

    #[tokio::test]
    async fn test_shutdown_discards_in_flight_load() {
        let client = Arc::new(GatedClient::default());
        let mut store = UserDirectoryStore::new(client.clone());

        store.load();
        client.wait_for_calls(1).await;
        store.shutdown().await;

        assert!(store.state().users.is_empty());
        assert_eq!(store.sync(), 0);
    }

    #[tokio::test]
    async fn test_panicking_client_ends_load_with_generic_error() {
        init_logger();
        let mut store = UserDirectoryStore::new(Arc::new(PanickingClient));

        store.load();
        store.settle().await;

        let state = store.state();
        assert!(!state.is_loading);
        assert!(state.users.is_empty());
        assert_eq!(
            state.error,
            Some(NetworkError::GenericError {
                message: "directory backend exploded".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn test_panicking_client_is_applied_by_sync_alone() {
        let mut store = UserDirectoryStore::new(Arc::new(PanickingClient));

        store.load();
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while store.state().is_loading {
                tokio::task::yield_now().await;
                store.sync();
            }
        })
        .await
        .unwrap();

        assert!(store.state().error.is_some());
    }

    #[tokio::test]
    async fn test_repeated_loads_with_sync_leave_no_tasks_behind() {
        let client = Arc::new(QueuedClient::new((0..50).map(|_| Ok(leanne_and_ervin()))));
        let mut store = UserDirectoryStore::new(client);

        for _ in 0..50 {
            store.load();
            tokio::time::timeout(std::time::Duration::from_secs(5), async {
                while store.state().is_loading {
                    tokio::task::yield_now().await;
                    store.sync();
                }
            })
            .await
            .unwrap();
        }
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while store.ctx.task_count() > 0 {
                tokio::task::yield_now().await;
                store.sync();
            }
        })
        .await
        .unwrap();

        assert_eq!(store.ctx.task_count(), 0);
        assert_eq!(ids(&store.state().users), vec![1, 2]);
    }
}
