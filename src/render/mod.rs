// src/render/mod.rs

//! Canonical HTML output for classified blocks.

pub mod environment;
pub mod links;
pub mod rich_text;
pub mod templates;

use crate::blocks::models::{Block, BlockKind};

pub use environment::{Environment, EnvironmentMap};
pub use links::LinkPolicy;
pub use rich_text::{escape_html, normalize_rich_text};
pub use templates::to_embed_url;

/// Separator placed between rendered blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub link_policy: LinkPolicy,
}

impl RenderOptions {
    pub fn with_legacy_hosts(hosts: Vec<String>) -> Self {
        Self { link_policy: LinkPolicy { legacy_hosts: hosts } }
    }
}

/// Renders one block. Deterministic: the same block always yields the same markup.
pub fn render_block(block: &Block, options: &RenderOptions) -> String {
    let policy = &options.link_policy;
    match block.kind {
        BlockKind::Divider => templates::render_divider(block),
        BlockKind::AuthorByline => templates::render_author_byline(block),
        BlockKind::Hotspot => templates::render_hotspot(block, policy),
        _ => templates::render_section(block, policy),
    }
}

pub fn render_blocks(blocks: &[Block], options: &RenderOptions) -> String {
    blocks
        .iter()
        .map(|block| render_block(block, options))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::models::{
        BlockContent, Color, ContentFragment, Heading, HotspotGroup, HotspotItem, ImageRef,
        LinkRef, ListBlock, Paragraph, Percent, VideoRef,
    };

    fn opts() -> RenderOptions {
        RenderOptions::default()
    }

    fn images(count: usize) -> Vec<ImageRef> {
        (0..count).map(|i| ImageRef::new(format!("/img/{i}.jpg"), format!("Image {i}"))).collect()
    }

    fn link(href: &str, text: &str) -> LinkRef {
        LinkRef { href: href.into(), text: text.into() }
    }

    #[test]
    fn rich_text_section_keeps_body_order() {
        let mut content = BlockContent::default();
        content.push(ContentFragment::Heading(Heading { level: 2, text: "Title & Co".into(), html: "Title &amp; Co".into() }));
        content.push(ContentFragment::Paragraph(Paragraph::plain("Intro", "<b>Intro</b>")));
        content.push(ContentFragment::Heading(Heading { level: 3, text: "Sub".into(), html: "Sub".into() }));
        content.push(ContentFragment::List(ListBlock { ordered: false, items: vec!["one".into(), "<i>two</i>".into()] }));
        let html = render_block(&Block::new(BlockKind::RichText, content), &opts());

        let expected = [
            r#"<section class="blog__rich-text">"#,
            r#"  <h2 class="blog__rich-text__heading fp-font-weight--semibold">Title &amp; Co</h2>"#,
            r#"  <div class="blog__rich-text__body">"#,
            r#"    <p><strong>Intro</strong></p>"#,
            r#"    <h3>Sub</h3>"#,
            r#"    <ul>"#,
            r#"      <li>one</li>"#,
            r#"      <li><em>two</em></li>"#,
            r#"    </ul>"#,
            r#"  </div>"#,
            r#"</section>"#,
        ]
        .join("\n");
        assert_eq!(html, expected);
    }

    #[test]
    fn full_width_has_no_cta() {
        let mut content = BlockContent::default();
        content.images = images(1);
        content.links.push(link("/shop", "Shop"));
        let html = render_block(&Block::new(BlockKind::FullWidth, content), &opts());
        assert!(html.contains(r#"<figure class="blog__full-width__figure">"#));
        assert!(html.contains(r#"<img class="blog__full-width__image" src="/img/0.jpg" alt="Image 0">"#));
        assert!(!html.contains("cta-btn"));
    }

    #[test]
    fn one_up_puts_first_cta_in_figure() {
        let mut content = BlockContent::default();
        content.images = images(1);
        content.images[0].caption = "Caption".into();
        content.links = vec![link("https://example.com/x", "Go"), link("/y", "Other")];
        let html = render_block(&Block::new(BlockKind::OneUp, content), &opts());
        assert!(html.contains(r#"<figcaption class="blog__one-up__label">Caption</figcaption>"#));
        assert!(html.contains(
            r#"<a class="blog__one-up__cta-btn fp-font-weight--semibold" href="https://example.com/x" target="_blank" rel="noopener noreferrer">Go</a>"#
        ));
        assert!(!html.contains("Other"));
    }

    #[test]
    fn grid_cta_rules() {
        // One link: a single full-width button.
        let mut content = BlockContent::default();
        content.images = images(2);
        content.links = vec![link("/shop", "Shop")];
        let html = render_block(&Block::new(BlockKind::TwoUp, content.clone()), &opts());
        assert_eq!(html.matches("cta-btn").count(), 1);
        assert!(html.contains(r#"<div class="blog__two-up__cta">"#));

        // Fewer links than images: dropped.
        content.images = images(3);
        content.links = vec![link("/a", "A"), link("/b", "B")];
        let html = render_block(&Block::new(BlockKind::ThreeUp, content.clone()), &opts());
        assert!(!html.contains("cta-btn"));

        // One per item when there are enough.
        content.links.push(link("/c", "C"));
        let html = render_block(&Block::new(BlockKind::ThreeUp, content), &opts());
        assert_eq!(html.matches(r#"<figure class="blog__three-up__item">"#).count(), 3);
        assert_eq!(html.matches("blog__three-up__cta-btn").count(), 3);
        assert!(!html.contains(r#"<div class="blog__three-up__cta">"#));
    }

    #[test]
    fn blend_images_get_modifier() {
        let mut content = BlockContent::default();
        content.images = images(2);
        content.images[1].blend = true;
        let html = render_block(&Block::new(BlockKind::TwoUp, content), &opts());
        assert!(html.contains(r#"class="blog__two-up__image blog__two-up__image--blend" src="/img/1.jpg""#));
    }

    #[test]
    fn video_uses_embed_url_and_default_title() {
        let mut content = BlockContent::default();
        content.videos.push(VideoRef { src: "https://www.youtube.com/watch?v=abc".into(), title: String::new() });
        let html = render_block(&Block::new(BlockKind::Video, content), &opts());
        assert!(html.contains(r#"src="https://www.youtube.com/embed/abc""#));
        assert!(html.contains(r#"title="Video""#));
        assert!(html.contains("allowfullscreen>"));
    }

    #[test]
    fn divider_colour() {
        assert_eq!(
            render_block(&Block::divider(None), &opts()),
            r#"<hr class="blog__divider" style="border: none; border-top: 1px solid #191c1f;">"#
        );
        assert_eq!(
            render_block(&Block::divider(Some(Color::new("#c4a484"))), &opts()),
            r#"<hr class="blog__divider" style="border: none; border-top: 1px solid #c4a484;">"#
        );
    }

    #[test]
    fn author_byline_template() {
        let block = Block::author_byline(vec!["By: Jane Doe".into(), "Staff Writer".into()]);
        let expected = [
            r#"<section class="blog__author-byline">"#,
            r#"  <p class="blog__author-byline__text"><span class="blog__author-byline__prefix">By: </span>Jane Doe</p>"#,
            r#"  <p class="blog__author-byline__title">Staff Writer</p>"#,
            r#"</section>"#,
        ]
        .join("\n");
        assert_eq!(render_block(&block, &opts()), expected);
    }

    #[test]
    fn hotspot_badges_in_marker_order() {
        let item = |href: Option<&str>, left: f64, label: &str| HotspotItem {
            href: href.map(str::to_string),
            left: Percent::clamped(left),
            top: Percent::clamped(50.0),
            marker_label: String::new(),
            tooltip_label: label.into(),
        };
        let mut content = BlockContent::default();
        content.hotspots.push(HotspotGroup {
            image: ImageRef::new("/look.jpg", "Look"),
            items: vec![item(Some("/bag"), 25.0, "Bag"), item(None, 75.5, "Shoes")],
        });
        let html = render_block(&Block::new(BlockKind::Hotspot, content), &opts());

        assert!(html.starts_with(r#"<section class="blog__hotspot blog__hotspot--2-links">"#));
        assert!(html.contains(r#"<a class="blog__hotspot__item" href="/bag" style="left: 25%; top: 50%;">"#));
        assert!(html.contains(r##"<a class="blog__hotspot__item" href="#" style="left: 75.5%; top: 50%;">"##));
        let first = html.find(r#"fp-font-weight--bold">1</span>"#).unwrap();
        let second = html.find(r#"fp-font-weight--bold">2</span>"#).unwrap();
        assert!(first < second);
        assert!(html.contains(r#"<span class="blog__hotspot__label fp-font-weight--semibold">Shoes</span>"#));
    }

    #[test]
    fn blocks_join_with_blank_line() {
        let blocks = vec![Block::divider(None), Block::divider(None)];
        let html = render_blocks(&blocks, &opts());
        assert_eq!(html.matches("\n\n").count(), 1);
        assert!(render_blocks(&[], &opts()).is_empty());
    }
}
