//! Handle used by background work to send changes back to the owning context.
//!
//! The handle never touches the state directly. Changes are queued on a
//! `flume` channel and applied in send order when the owner calls
//! [`StateCtx::sync`](crate::StateCtx::sync).

use flume::Sender;
use log::debug;

use crate::{State, TaskId};

pub(crate) type Patch<T> = Box<dyn FnOnce(&mut T) + Send>;

/// A queued change, tagged with the task that produced it.
pub(crate) struct Envelope<T> {
    pub(crate) task: TaskId,
    pub(crate) patch: Patch<T>,
}

/// Update handle bound to one spawned task.
///
/// Changes carry the task's [`TaskId`]. When they are applied, the context
/// drops them unless the task is still the most recently spawned one of its
/// kind, so a slow superseded task can never overwrite a newer result.
pub struct LatestOnlyUpdater<T: State> {
    send: Sender<Envelope<T>>,
    task: TaskId,
}

impl<T: State> LatestOnlyUpdater<T> {
    pub(crate) fn new(send: Sender<Envelope<T>>, task: TaskId) -> Self {
        Self { send, task }
    }

    /// Patch the state in place once the owner syncs.
    pub fn update(&self, patch: impl FnOnce(&mut T) + Send + 'static) {
        let envelope = Envelope {
            task: self.task,
            patch: Box::new(patch),
        };
        // The receiver lives in the context; if it is gone the owner was torn down.
        if self.send.send(envelope).is_err() {
            debug!("{}: context dropped, discarding update", T::NAME);
        }
    }
}
