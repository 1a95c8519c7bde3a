//! Log output for the `snowmint` binary.
//!
//! Events go to stderr so that stdout carries only IDs and decoded records.
//! The filter is read from `RUST_LOG` and defaults to `warn`, e.g.
//!
//! ```bash
//! RUST_LOG=snowmint=trace snowmint generate -n 100
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()?;
    Ok(())
}
