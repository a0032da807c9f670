// src/extractors/mod.rs
pub mod accumulator;
pub mod article;
pub mod canonical;
pub mod headings;
pub mod hotspots;
pub mod primitives;
pub mod segmenter;
pub mod spatial;

// Re-export the entry points for convenience
pub use article::{process_article, ArticleRecord};
pub use segmenter::{segment_element, segment_html};
pub use spatial::{select_block, AttributeGeometry, GeometryProvider, Rect};
