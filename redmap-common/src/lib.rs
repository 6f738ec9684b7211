// redmap-common - Shared error taxonomy for the redmap workspace
//
// Both the store clients and the entry mapper speak in these error terms

pub mod error;

// Re-export for convenience
pub use error::*;
