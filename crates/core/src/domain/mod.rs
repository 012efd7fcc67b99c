pub mod activity;
pub mod connection;
pub mod events;
pub mod notifications;
pub mod progress;
pub mod repo;

// Re-exports for convenience
pub use activity::*;
pub use connection::*;
pub use events::*;
pub use notifications::*;
pub use progress::*;
pub use repo::*;
