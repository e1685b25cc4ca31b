//! Process-wide logging setup for the ManualHub binaries.

/// Initialize tracing with the default `info` filter.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_DIRECTIVE);
}

/// Tracing configuration (filter resolution, JSON subscriber).
pub mod tracing;
