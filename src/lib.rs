//! Book catalog service library
//!
//! Holds the books module and the process bootstrap shared by the
//! `catalog-app` binary and `catalog serve`.

pub mod app;
pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;
