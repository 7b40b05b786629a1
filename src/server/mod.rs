//! Server core functionality
//!
//! Contains the listener, the accept loop, and the shared state handed to
//! each client session.

pub mod core;

pub use core::Server;
