//! Shared test scaffolding: a small Cozo-backed fixture graph, substitute collaborators that
//! count their calls, and tracing setup for tests.
pub mod fakes;
pub mod fixture;

use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a stderr subscriber for the current test binary. Later calls are no-ops.
pub fn init_test_tracing(level: tracing::Level) {
    let filter = filter::Targets::new()
        .with_target("cozo", tracing::Level::ERROR)
        .with_target("tokenizers", tracing::Level::ERROR)
        .with_target("", level);

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .without_time(),
        )
        .with(filter)
        .try_init();
}
