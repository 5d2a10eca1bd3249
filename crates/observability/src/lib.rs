//! Process-wide tracing/logging setup.

/// Initialize tracing for the process using `EDUGATE_LOG_FORMAT` and
/// `RUST_LOG`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (format, filters).
pub mod tracing;
