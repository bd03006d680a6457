//! Tracing setup for the CLI.
//!
//! Library crates log through `log`; the subscriber installed here also
//! captures those records. With `--timing`, spans from `#[instrument]`ed
//! commands report their duration when they close.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

fn default_level(verbose: bool, timing: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else if timing {
        // span close events are emitted at INFO
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing(verbose: bool, timing: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, timing).into())
        .from_env_lossy();

    let span_events = if timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_span_events(span_events)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
