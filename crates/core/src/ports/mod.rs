pub mod api;
pub mod browse;
pub mod persistence;
pub mod time;
pub mod transport;

// Re-exports
pub use api::*;
pub use browse::*;
pub use persistence::*;
pub use time::*;
pub use transport::*;
