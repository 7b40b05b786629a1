//! Client management
//!
//! Handles client sessions, per-client state, and the client registry.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::handle_client;
pub use registry::ClientRegistry;
pub use state::Client;
