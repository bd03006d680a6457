//! Single-owner state runtime.
//!
//! A [`StateCtx`] owns one [`State`] value. The owner changes it synchronously,
//! background tasks send changes back through a [`LatestOnlyUpdater`], and
//! subscribers observe every applied snapshot in order.

mod ctx;
mod state;
mod task;
mod updater;

pub use ctx::StateCtx;
pub use state::State;
pub use task::TaskId;
pub use updater::LatestOnlyUpdater;
