// src/lib.rs

//! Legacy blog migration: segments WordPress / page-builder article markup
//! into typed blocks and renders them as canonical BEM-style sections.
//!
//! ```no_run
//! use blog_migrator::{render_blocks, segment_html, RenderOptions};
//!
//! let blocks = segment_html("<div class=\"entry-content\"><p>Hello</p></div>")?;
//! let html = render_blocks(&blocks, &RenderOptions::default());
//! # Ok::<(), blog_migrator::utils::error::ExtractError>(())
//! ```

pub mod blocks;
pub mod config;
pub mod extractors;
pub mod fetch;
pub mod render;
pub mod storage;
pub mod utils;

pub use blocks::{classify, Block, BlockContent, BlockKind, ContentFragment};
pub use config::MigrationConfig;
pub use extractors::{
    process_article, segment_element, segment_html, select_block, ArticleRecord, AttributeGeometry,
    GeometryProvider, Rect,
};
pub use render::{render_block, render_blocks, Environment, EnvironmentMap, RenderOptions};
