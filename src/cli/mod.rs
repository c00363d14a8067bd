//! Command-line interface.

mod commands;

pub use commands::run;

/// True when --verbose was passed.
///
/// Scans argv directly so logging can be initialized before the parser
/// runs.
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "--verbose" || arg == "-v")
}
