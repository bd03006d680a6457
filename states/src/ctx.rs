use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use flume::{Receiver, Sender};
use log::{debug, error};
use tokio::task::{JoinError, JoinSet};

use crate::updater::Envelope;
use crate::{LatestOnlyUpdater, State, TaskId};

type Subscriber<T> = Box<dyn FnMut(&T) -> bool + Send>;

/// Single owner of a state value.
///
/// The owner mutates the value directly through [`StateCtx::update`]. Async
/// work spawned through the context never touches it; it queues patches that
/// the owner applies with [`StateCtx::sync`]. Every applied change is pushed to
/// all subscribers, in apply order, without coalescing.
pub struct StateCtx<T: State> {
    state: T,
    send: Sender<Envelope<T>>,
    recv: Receiver<Envelope<T>>,
    subscribers: Vec<Subscriber<T>>,
    // latest generation issued per task kind
    generations: HashMap<TypeId, u64>,
    tasks: JoinSet<()>,
}

impl<T: State> fmt::Debug for StateCtx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCtx")
            .field("state", &self.state)
            .field("queued_updates", &self.recv.len())
            .field("subscribers", &self.subscribers.len())
            .field("generations", &self.generations)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl<T: State + Default> Default for StateCtx<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: State> StateCtx<T> {
    pub fn new(initial: T) -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            state: initial,
            send,
            recv,
            subscribers: Vec::new(),
            generations: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Current value.
    pub fn state(&self) -> &T {
        &self.state
    }

    /// Apply a change immediately and notify subscribers.
    pub fn update(&mut self, patch: impl FnOnce(&mut T)) {
        patch(&mut self.state);
        self.notify();
    }

    /// Receive a snapshot after every applied change.
    ///
    /// The receiver only sees changes made after it subscribed; read
    /// [`StateCtx::state`] for the current value.
    pub fn subscribe(&mut self) -> Receiver<T> {
        self.subscribe_with(T::clone)
    }

    /// Receive a value derived from the state after every applied change.
    ///
    /// Subscriptions whose receiver has been dropped are removed on the next
    /// notification.
    pub fn subscribe_with<D, F>(&mut self, derive: F) -> Receiver<D>
    where
        D: Send + 'static,
        F: Fn(&T) -> D + Send + 'static,
    {
        let (send, recv) = flume::unbounded();
        self.subscribers
            .push(Box::new(move |state| send.send(derive(state)).is_ok()));
        recv
    }

    /// Spawn async work whose result may only land while it is the newest task
    /// of kind `K`.
    ///
    /// Spawning another task of the same kind supersedes this one: it keeps
    /// running, but whatever it sends through its [`LatestOnlyUpdater`] is
    /// dropped by [`StateCtx::sync`]. Must be called inside a Tokio runtime.
    pub fn spawn_latest<K, F, Fut>(&mut self, task: F) -> TaskId
    where
        K: 'static,
        F: FnOnce(LatestOnlyUpdater<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let kind = TypeId::of::<K>();
        let generation = self.generations.entry(kind).or_insert(0);
        *generation += 1;
        let id = TaskId::new(kind, *generation);

        debug!("{}: spawning task generation {}", T::NAME, id.generation());
        let updater = LatestOnlyUpdater::new(self.send.clone(), id);
        self.tasks.spawn(task(updater));
        id
    }

    /// Whether `task` is the most recently spawned task of its kind.
    fn is_latest(&self, task: TaskId) -> bool {
        self.generations.get(&task.kind()) == Some(&task.generation())
    }

    /// Apply queued updates in send order. Returns how many were applied.
    ///
    /// Updates from superseded tasks are discarded here rather than at send
    /// time, so a task superseded after sending still cannot land. Tasks that
    /// already finished are joined first.
    pub fn sync(&mut self) -> usize {
        while let Some(joined) = self.tasks.try_join_next() {
            Self::log_joined(joined);
        }

        let mut applied = 0;
        while let Ok(Envelope { task, patch }) = self.recv.try_recv() {
            if !self.is_latest(task) {
                debug!(
                    "{}: dropping result of superseded task generation {}",
                    T::NAME,
                    task.generation()
                );
                continue;
            }
            patch(&mut self.state);
            self.notify();
            applied += 1;
        }
        applied
    }

    /// Number of spawned tasks not yet joined.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Await every spawned task, syncing after each one completes.
    pub async fn settle(&mut self) {
        self.sync();
        while let Some(joined) = self.tasks.join_next().await {
            Self::log_joined(joined);
            self.sync();
        }
        self.sync();
    }

    /// Abort all spawned tasks and discard anything they queued.
    pub async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
        let discarded = self.recv.drain().count();
        if discarded > 0 {
            debug!("{}: discarded {discarded} queued update(s) on shutdown", T::NAME);
        }
    }

    fn log_joined(joined: Result<(), JoinError>) {
        if let Err(err) = joined
            && err.is_panic()
        {
            error!("{}: task panicked: {err}", T::NAME);
        }
    }

    fn notify(&mut self) {
        let state = &self.state;
        self.subscribers.retain_mut(|deliver| deliver(state));
    }
}
