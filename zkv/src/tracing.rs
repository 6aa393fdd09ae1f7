use tracing::level_filters::LevelFilter;
use tracing_subscriber::{prelude::*, util::SubscriberInitExt, EnvFilter};

/// Installs a plain-text subscriber for binaries. `RUST_LOG` takes
/// precedence over `default_level`.
///
/// The library itself never installs a subscriber.
pub fn init(default_level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}
