use std::fmt::Debug;

/// A value owned by a [`StateCtx`](crate::StateCtx).
///
/// Subscribers receive clones of the value after every applied change, so a
/// state must be cheap enough to clone and safe to hand across threads.
pub trait State: Clone + Debug + Send + Sync + 'static {
    /// Short name used in log lines.
    const NAME: &'static str = "state";
}
