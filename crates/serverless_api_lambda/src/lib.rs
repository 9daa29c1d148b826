//! AWS-oriented adapters and handlers for the serverless API functions.
//!
//! This crate owns runtime integration details (Lambda handlers, process
//! configuration, logging and storage adapters). Validation, the error
//! taxonomy and response envelopes live in `serverless_api_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
