//! Log output for the command line.
//!
//! Logs go to stderr so that stdout carries only JSON. The level comes from
//! `RUST_LOG` (default `info`), e.g. `RUST_LOG=rab_core=debug`.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}
