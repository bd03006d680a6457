//! Fixtures and in-process clients for store and client tests.
//!
//! - `QueuedClient` answers each `fetch_users` call immediately with the next
//!   queued reply.
//! - `GatedClient` parks every call until the test answers it, which lets a
//!   test decide the order in which overlapping loads complete.

#![cfg(test)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::{FetchError, User, UserDirectoryClient};

pub type Reply = Result<Vec<User>, FetchError>;

pub fn leanne_graham_json() -> serde_json::Value {
    serde_json::json!({
        "id": 1,
        "name": "Leanne Graham",
        "username": "Bret",
        "email": "Sincere@april.biz",
        "address": {
            "street": "Kulas Light",
            "suite": "Apt. 556",
            "city": "Gwenborough",
            "zipcode": "92998-3874",
            "geo": { "lat": "-37.3159", "lng": "81.1496" }
        },
        "phone": "1-770-736-8031 x56442",
        "website": "hildegard.org",
        "company": {
            "name": "Romaguera-Crona",
            "catchPhrase": "Multi-layered client-server neural-net",
            "bs": "harness real-time e-markets"
        }
    })
}

pub fn ervin_howell_json() -> serde_json::Value {
    serde_json::json!({
        "id": 2,
        "name": "Ervin Howell",
        "username": "Antonette",
        "email": "Shanna@melissa.tv",
        "address": {
            "street": "Victor Plains",
            "suite": "Suite 879",
            "city": "Wisokyburgh",
            "zipcode": "90566-7771",
            "geo": { "lat": "-43.9509", "lng": "-34.4618" }
        },
        "phone": "010-692-6593 x09125",
        "website": "anastasia.net",
        "company": {
            "name": "Deckow-Crist",
            "catchPhrase": "Proactive didactic contingency",
            "bs": "synergize scalable supply-chains"
        }
    })
}

pub fn users_json() -> serde_json::Value {
    serde_json::json!([leanne_graham_json(), ervin_howell_json()])
}

pub fn leanne_and_ervin() -> Vec<User> {
    serde_json::from_value(users_json()).unwrap()
}

/// A user with placeholder details; only id, name and email vary.
pub fn sample_user(id: i64, name: &str, email: &str) -> User {
    let mut value = leanne_graham_json();
    value["id"] = serde_json::json!(id);
    value["name"] = serde_json::json!(name);
    value["email"] = serde_json::json!(email);
    serde_json::from_value(value).unwrap()
}

#[derive(Debug, Default)]
pub struct QueuedClient {
    replies: Mutex<VecDeque<Reply>>,
}

impl QueuedClient {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
        }
    }
}

#[async_trait]
impl UserDirectoryClient for QueuedClient {
    async fn fetch_users(&self) -> Reply {
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(FetchError::Unexpected(Some("no scripted reply".to_owned()))))
    }
}

#[derive(Debug, Default)]
pub struct GatedClient {
    calls: Mutex<Vec<Option<oneshot::Sender<Reply>>>>,
}

impl GatedClient {
    /// Number of `fetch_users` calls started so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Yield to spawned tasks until `count` calls have started.
    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("timed out waiting for fetch calls");
    }

    /// Complete call number `call` (0-based, in start order).
    pub fn answer(&self, call: usize, reply: Reply) {
        let sender = self.calls.lock().unwrap()[call]
            .take()
            .expect("call already answered");
        let _ = sender.send(reply);
    }
}

#[async_trait]
impl UserDirectoryClient for GatedClient {
    async fn fetch_users(&self) -> Reply {
        let (send, recv) = oneshot::channel();
        self.calls.lock().unwrap().push(Some(send));
        recv.await
            .unwrap_or_else(|_| Err(FetchError::Unexpected(Some("call dropped".to_owned()))))
    }
}

/// Client whose fetch panics instead of returning.
#[derive(Debug, Default)]
pub struct PanickingClient;

#[async_trait]
impl UserDirectoryClient for PanickingClient {
    async fn fetch_users(&self) -> Reply {
        panic!("directory backend exploded")
    }
}
