//! Policy evaluation engine for Header Hub
//!
//! Turns "username + optional module filter" into the ordered list of
//! response headers the gateway should attach, by matching enabled policies
//! against the live directory.

pub mod error;
pub mod evaluator;

pub use error::EvaluateError;
pub use evaluator::HeaderEvaluator;
