//! API Module
//!
//! REST API for host listing, host management, device inventory and
//! background tasks.

pub mod server;
pub mod rest;

pub use server::*;
pub use rest::*;
