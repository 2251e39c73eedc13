pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{handle_scan, init_tracing, read_pattern, run_scan, verbosity_level};
