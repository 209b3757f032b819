//!
//! Process-wide configuration threaded explicitly through the pipeline
//! instead of living in globals or environment lookups scattered across
//! the Raw Reader / Class Parser / Format Checker.
//!
use crate::u2;

/// Read-only configuration shared by the parser and the format checker.
///
/// Constructed once by the binary (or by whoever embeds `cs_parser`) and
/// passed down by reference; nothing in `cs_parser` mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Highest `major_version` the Format Checker will accept. Defaults to
    /// `cs_model::MAX_SUPPORTED_MAJOR_VERSION` (Java 11).
    pub max_major_version: u2,
    /// Lowest `major_version` the Format Checker will accept. Defaults to
    /// `cs_model::MIN_SUPPORTED_MAJOR_VERSION`.
    pub min_major_version: u2,
    /// When set, the Format Checker logs every rule it evaluates at `trace`
    /// level instead of only logging failures.
    pub trace_format_check: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_major_version: crate::MAX_SUPPORTED_MAJOR_VERSION,
            min_major_version: crate::MIN_SUPPORTED_MAJOR_VERSION,
            trace_format_check: false,
        }
    }
}
