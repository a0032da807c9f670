// src/blocks/classifier.rs
use crate::blocks::models::{AttachmentHint, BlockContent, BlockKind};

/// Maps accumulated content to one taxonomy member.
///
/// Column hints from the source layout win over raw image counts when they
/// describe a known grid; image-count inference is the fallback for flat markup.
pub fn classify(content: &BlockContent, column_hint: u8) -> BlockKind {
    let image_count = content.images.len();

    if !content.videos.is_empty() {
        return BlockKind::Video;
    }
    if !content.hotspots.is_empty() {
        return BlockKind::Hotspot;
    }
    if image_count == 0 {
        return BlockKind::RichText;
    }

    if column_hint >= 2 {
        if let Some(kind) = grid_for(column_hint, image_count) {
            return kind;
        }
    }

    if image_count == 1 {
        return classify_single_image(content, column_hint);
    }

    match image_count {
        2 => BlockKind::TwoUp,
        3 => BlockKind::ThreeUp,
        4 => BlockKind::FourUp,
        5 => BlockKind::FiveUp,
        _ => BlockKind::ThreeByTwo,
    }
}

/// Known (columns, images) grid shapes.
fn grid_for(column_hint: u8, image_count: usize) -> Option<BlockKind> {
    match (column_hint, image_count) {
        (2, 2) => Some(BlockKind::TwoUp),
        (3, 3) => Some(BlockKind::ThreeUp),
        (2, 4) => Some(BlockKind::TwoByTwo),
        (3, 6) => Some(BlockKind::ThreeByTwo),
        (4, 4) => Some(BlockKind::FourUp),
        (5, 5) => Some(BlockKind::FiveUp),
        _ => None,
    }
}

fn classify_single_image(content: &BlockContent, column_hint: u8) -> BlockKind {
    let has_heading = content.has_heading();
    let has_body = content.has_body();

    if column_hint >= 2 && (has_heading || has_body) {
        return BlockKind::OneUp;
    }

    match content.images[0].attachment {
        Some(AttachmentHint::Full) => BlockKind::FullWidth,
        Some(AttachmentHint::Medium) => BlockKind::OneUp,
        // Any accompanying text or link disqualifies full width.
        None if has_heading || has_body || !content.links.is_empty() => BlockKind::OneUp,
        None => BlockKind::FullWidth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::models::{
        ContentFragment, Heading, HotspotGroup, ImageRef, LinkRef, Paragraph, VideoRef,
    };

    fn with_images(count: usize) -> BlockContent {
        let mut content = BlockContent::default();
        for i in 0..count {
            content.images.push(ImageRef::new(format!("/img/{i}.jpg"), ""));
        }
        content
    }

    #[test]
    fn video_always_wins() {
        let mut content = with_images(3);
        content.videos.push(VideoRef { src: "https://youtu.be/x".into(), title: String::new() });
        assert_eq!(classify(&content, 3), BlockKind::Video);
    }

    #[test]
    fn hotspot_groups_classify_as_hotspot() {
        let mut content = BlockContent::default();
        content.hotspots.push(HotspotGroup { image: ImageRef::new("/a.jpg", ""), items: vec![] });
        assert_eq!(classify(&content, 0), BlockKind::Hotspot);
    }

    #[test]
    fn no_images_is_rich_text() {
        let mut content = BlockContent::default();
        content.push(ContentFragment::Paragraph(Paragraph::plain("hi", "hi")));
        assert_eq!(classify(&content, 2), BlockKind::RichText);
    }

    #[test]
    fn count_fallback_is_monotonic_without_hint() {
        let expected = [
            (2, BlockKind::TwoUp),
            (3, BlockKind::ThreeUp),
            (4, BlockKind::FourUp),
            (5, BlockKind::FiveUp),
            (6, BlockKind::ThreeByTwo),
            (9, BlockKind::ThreeByTwo),
        ];
        for (count, kind) in expected {
            assert_eq!(classify(&with_images(count), 0), kind, "{count} images");
        }
        let single = classify(&with_images(1), 0);
        assert!(matches!(single, BlockKind::FullWidth | BlockKind::OneUp));
    }

    #[test]
    fn column_hint_selects_grid_shape() {
        assert_eq!(classify(&with_images(4), 2), BlockKind::TwoByTwo);
        assert_eq!(classify(&with_images(4), 4), BlockKind::FourUp);
        assert_eq!(classify(&with_images(6), 3), BlockKind::ThreeByTwo);
        assert_eq!(classify(&with_images(5), 5), BlockKind::FiveUp);
        // Unknown shape falls back to counting.
        assert_eq!(classify(&with_images(3), 2), BlockKind::ThreeUp);
    }

    #[test]
    fn single_image_rules() {
        let mut bare = with_images(1);
        assert_eq!(classify(&bare, 0), BlockKind::FullWidth);

        bare.links.push(LinkRef { href: "/shop".into(), text: "Shop".into() });
        assert_eq!(classify(&bare, 0), BlockKind::OneUp);

        let mut full = with_images(1);
        full.images[0].attachment = Some(AttachmentHint::Full);
        full.push(ContentFragment::Paragraph(Paragraph::plain("Text", "Text")));
        assert_eq!(classify(&full, 0), BlockKind::FullWidth);
        // Multi-column layout with text overrides the attachment hint.
        assert_eq!(classify(&full, 2), BlockKind::OneUp);

        let mut medium = with_images(1);
        medium.images[0].attachment = Some(AttachmentHint::Medium);
        assert_eq!(classify(&medium, 0), BlockKind::OneUp);

        let mut headed = with_images(1);
        headed.push(ContentFragment::Heading(Heading { level: 2, text: "T".into(), html: "T".into() }));
        assert_eq!(classify(&headed, 0), BlockKind::OneUp);
    }
}
