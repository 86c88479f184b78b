//! # Skills Master Common Library
//!
//! Shared code for the Skills Master service including:
//! - Curriculum data model (skill rows, skills, specialist profile, curriculum result)
//! - Generation event envelope (`GenerationEvent`)
//! - Event stream encoders (NDJSON and SSE)
//! - Configuration loading
//! - Time and text helpers

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod stream;
pub mod time;

pub use error::{Error, Result};
pub use events::GenerationEvent;
