//! HTTP request handlers.

pub mod resources;
pub mod system;
