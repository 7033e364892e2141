//! # Commentary Core
//!
//! The domain layer of the comments backend.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the comment/content entities, the ports infrastructure must implement, and the
//! request-throttling engine built on top of those ports.

pub mod domain;
pub mod error;
pub mod ports;
pub mod throttle;

pub use error::DomainError;
