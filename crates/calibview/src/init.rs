//! Logging setup for the calibview binary and embedding applications.

/// Installs the `env_logger` backend.
///
/// The level defaults to `info` and can be overridden with `RUST_LOG`.
/// Calling this more than once is harmless.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .try_init();
}
