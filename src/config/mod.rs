// src/config/mod.rs
pub mod podcast;

pub use podcast::{ApiKeys, PodcastConfig, Settings};
