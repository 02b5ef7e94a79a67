//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber, reading the filter from
/// `RUST_LOG`. Safe to call more than once; later calls are no-ops, so
/// embedders that install their own subscriber first keep it.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
