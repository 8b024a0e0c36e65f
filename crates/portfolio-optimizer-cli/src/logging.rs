use tracing_subscriber::EnvFilter;

/// Target of the events emitted by `TracingTimingHook`.
const TIMING_TARGET: &str = "portfolio_optimizer_core::instrumentation";

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose` and `--timing`.
pub fn init(verbose: bool, timing: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, timing)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Filter used when `RUST_LOG` is unset.
fn default_directives(verbose: bool, timing: bool) -> String {
    let base = if verbose { "debug" } else { "warn" };
    if timing && !verbose {
        format!("{},{}=info", base, TIMING_TARGET)
    } else {
        base.to_string()
    }
}
