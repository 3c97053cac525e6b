pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod service;
