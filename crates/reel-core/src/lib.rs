//! Core domain + application logic for the channel reel index.
//!
//! This crate is intentionally framework-agnostic. The Bot API client and the
//! HTTP boundary live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod media;
pub mod pipeline;
pub mod ports;
pub mod utils;

pub use errors::{Error, Result};
