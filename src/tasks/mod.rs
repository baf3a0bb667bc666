//! Tasks Module
//!
//! Background task execution with bounded waits and cooperative
//! cancellation.

pub mod manager;

pub use manager::*;
