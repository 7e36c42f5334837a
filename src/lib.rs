// Solace - Mental-Wellness Companion Backend
// Library exports

// Core modules
pub mod config;
pub mod crisis;
pub mod emotion;
pub mod llm;
pub mod metrics;
pub mod ratelimit;
pub mod server;
pub mod wellness;
