//! Shared request-validation and response primitives for the API handlers.
//!
//! This crate owns the field validators, the closed error taxonomy with its
//! normalizer, the response envelope builder and the request/record
//! contracts. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod errors;
pub mod request;
pub mod response;
pub mod storage_keys;
pub mod validation;
