//! API Module
//!
//! This module handles the HTTP ingress through which external collaborators
//! deliver claims, confirmations and build requests.

mod server;
pub use server::Server;
