//! In-app notifications: stored rows, a live WebSocket feed, and the domain
//! events that produce them.

pub mod events;
pub mod hub;
pub mod queries;
pub mod scheduler;
pub mod types;

pub use hub::NotificationHub;
pub use types::*;
