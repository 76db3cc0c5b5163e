// Smart matching: request shaping, response validation, merge/sort, and the
// match lifecycle. All LLM calls go through llm_client via the ranker.

pub mod controller;
pub mod display;
pub mod handlers;
pub mod merger;
pub mod prompts;
pub mod ranker;
pub mod request_builder;
pub mod response;
pub mod service;
