// src/fetch/mod.rs
pub mod client;

pub use client::{normalize_url, FetchedPage, PageFetcher};
