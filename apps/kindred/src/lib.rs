//! Kindred: volunteer opportunity listing with AI smart matching.
//!
//! The core is `matching`: request shaping, response validation, the
//! merge/sort into display order, and the match lifecycle. The remaining
//! modules host it behind an HTTP API.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod llm_client;
pub mod matching;
pub mod models;
pub mod routes;
pub mod state;
