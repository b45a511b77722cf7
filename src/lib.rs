//! Metadata Agent - edit metadata-object JSON with natural language.

pub mod ai;
pub mod bridge;
pub mod config;
pub mod display;
pub mod store;
