//! Control Plane Module
//!
//! The HTTP surface of the dashboard and the adapters it runs on.

pub mod api;
pub mod backends;

pub use api::*;
pub use backends::*;
