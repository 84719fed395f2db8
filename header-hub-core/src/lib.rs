//! Core domain model for Header Hub
//!
//! This crate contains the shared data structures used across the engine:
//! the configuration documents (System, Module, Policy, Header and friends),
//! their input payloads and search criteria, and the capability traits the
//! storage layer is built on.

pub mod criteria;
pub mod document;
pub mod error;
pub mod inputs;
pub mod models;
pub mod validate;

pub use criteria::*;
pub use document::{Criteria, Document, Matcher, Predicate, UniqueKey};
pub use error::ValidationError;
pub use inputs::*;
pub use models::*;
