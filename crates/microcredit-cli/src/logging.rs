use std::io;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Route tracing output to stderr so stdout carries only command output.
///
/// `RUST_LOG` wins when set; otherwise `-v` selects debug and `-vv` trace.
pub fn init_tracing(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "microcredit_core=debug,mcl=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}
