use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. `--verbose` wins over `--quiet`, both over `RUST_LOG`.
pub fn init_logger(verbose: bool, quiet: bool) {
  let filter = if verbose {
    EnvFilter::new("esmify=debug,esmify_cli=debug")
  } else if quiet {
    EnvFilter::new("error")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("esmify=info"))
  };

  let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

  tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
