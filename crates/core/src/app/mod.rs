pub mod commands;
pub mod queries;
pub mod sync;

// Re-exports
pub use commands::*;
pub use queries::*;
pub use sync::*;
