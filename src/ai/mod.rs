//! Language model client used to interpret user questions.

mod client;

pub use client::*;
