//! Sketchroom Server
//!
//! Relays shape edits between the WebSocket connections in a room and
//! persists them, so a client opening the room later can load its shapes
//! over HTTP.
//!
//! ## Protocol
//!
//! Connect to `/ws?token=<jwt>`, then send JSON text frames:
//! ```json
//! { "type": "join_room", "roomId": "abc" }
//! { "type": "chat", "roomId": "abc", "message": "{\"shape\":{...}}" }
//! { "type": "chat", "roomId": "abc", "message": "{\"action\":\"erase\",\"shapeId\":\"s1\"}" }
//! ```
//! Other members of the room receive `{ "type": "chat", "message": "..." }`
//! with the `message` string unchanged.

pub mod auth;
pub mod config;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod state;
pub mod store;

pub use config::{ConfigError, ServerConfig};
pub use routes::router;
pub use state::AppState;
