//! WebSocket Session Management
//!
//! Real-time practice sessions over WebSockets:
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Runs one practice session per connection, from `init` to the stored record.

pub mod protocol;
pub mod session;

pub use session::ws_handler;
