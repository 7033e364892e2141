//! Middleware modules.

pub mod caller;
pub mod error;
