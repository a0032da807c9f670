// src/blocks/mod.rs
pub mod classifier;
pub mod models;

// Re-export key block types for convenience
pub use classifier::classify;
pub use models::{
    AttachmentHint, Block, BlockContent, BlockKind, Color, ContentFragment, Heading, HotspotGroup,
    HotspotItem, ImageRef, LinkRef, ListBlock, Paragraph, Percent, VideoRef,
};
