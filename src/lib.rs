pub mod config;
pub mod dot_core;
pub mod store;
