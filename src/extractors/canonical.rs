// src/extractors/canonical.rs

// Decodes markup this crate rendered earlier (`section.blog__*`,
// `hr.blog__divider`) back into blocks, so re-running an already migrated
// article reproduces it instead of re-segmenting its output.

use crate::blocks::models::{
    Block, BlockContent, BlockKind, ContentFragment, HotspotGroup, HotspotItem, ImageRef,
    LinkRef, ListBlock, Paragraph, Percent, VideoRef,
};
use crate::extractors::primitives::{
    class_attr, clean_text, divider_color, heading, link_ref, list_items, parse_style, tag_name,
};
use scraper::ElementRef;

const BLOCK_CLASS_PREFIX: &str = "blog__";

/// The block kind named by a canonical section's first class.
pub fn canonical_kind(el: &ElementRef<'_>) -> Option<BlockKind> {
    let name = tag_name(el);
    if name != "section" && name != "hr" {
        return None;
    }
    let first = class_attr(el).split_whitespace().next()?;
    if !first.starts_with(BLOCK_CLASS_PREFIX) {
        return None;
    }
    let kind = BlockKind::from_prefix(first)?;
    match (name, kind) {
        ("hr", BlockKind::Divider) => Some(kind),
        ("section", BlockKind::Divider) | ("hr", _) => None,
        _ => Some(kind),
    }
}

fn child_elements<'a>(el: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn canonical_image(img: &ElementRef<'_>, prefix: &str, caption: Option<String>) -> Option<ImageRef> {
    let src = img.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    let mut image = ImageRef::new(src, img.value().attr("alt").unwrap_or("").trim());
    image.blend = has_class(img, &format!("{prefix}__image--blend"));
    image.caption = caption.unwrap_or_default();
    Some(image)
}

/// Image, caption and in-figure buttons of a `__figure` / `__item` figure.
fn read_figure(figure: &ElementRef<'_>, prefix: &str, content: &mut BlockContent) {
    let caption_class = format!("{prefix}__label");
    let cta_class = format!("{prefix}__cta-btn");
    let caption = child_elements(figure)
        .find(|child| tag_name(child) == "figcaption" && has_class(child, &caption_class))
        .map(|c| clean_text(&c));

    for child in child_elements(figure) {
        match tag_name(&child) {
            "img" => {
                if let Some(image) = canonical_image(&child, prefix, caption.clone()) {
                    content.images.push(image);
                }
            }
            "a" if has_class(&child, &cta_class) => {
                if let Some(link) = link_ref(&child) {
                    content.links.push(link);
                }
            }
            _ => {}
        }
    }
}

fn read_body(body: &ElementRef<'_>, content: &mut BlockContent) {
    for child in child_elements(body) {
        match tag_name(&child) {
            "p" | "blockquote" => {
                let text = clean_text(&child);
                if text.is_empty() {
                    continue;
                }
                content.body.push(ContentFragment::Paragraph(Paragraph {
                    text,
                    html: child.inner_html().trim().to_string(),
                    blockquote: tag_name(&child) == "blockquote",
                }));
            }
            "ul" | "ol" => {
                let items = list_items(&child);
                if !items.is_empty() {
                    content.body.push(ContentFragment::List(ListBlock {
                        ordered: tag_name(&child) == "ol",
                        items,
                    }));
                }
            }
            _ => {
                if let Some(sub) = heading(&child) {
                    content.body.push(ContentFragment::Heading(sub));
                }
            }
        }
    }
}

fn read_video(wrapper: &ElementRef<'_>, content: &mut BlockContent) {
    let iframe = child_elements(wrapper).find(|child| tag_name(child) == "iframe");
    if let Some(iframe) = iframe {
        if let Some(src) = iframe.value().attr("src").map(str::trim).filter(|s| !s.is_empty()) {
            content.videos.push(VideoRef {
                src: src.to_string(),
                title: iframe.value().attr("title").unwrap_or("").trim().to_string(),
            });
        }
    }
}

fn read_hotspot_figure(figure: &ElementRef<'_>, prefix: &str) -> Option<HotspotGroup> {
    let img = child_elements(figure).find(|child| tag_name(child) == "img")?;
    let image = canonical_image(&img, prefix, None)?;
    let label_class = format!("{prefix}__label");

    let items = child_elements(figure)
        .filter(|child| tag_name(child) == "a" && has_class(child, &format!("{prefix}__item")))
        .filter_map(|anchor| {
            let declarations = parse_style(anchor.value().attr("style")?);
            let position = |name: &str| {
                declarations
                    .iter()
                    .find(|(prop, _)| prop == name)
                    .and_then(|(_, value)| Percent::parse(value))
            };
            let href = anchor
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty() && *href != "#")
                .map(str::to_string);
            let label = child_elements(&anchor)
                .find(|span| has_class(span, &label_class))
                .map(|span| clean_text(&span))
                .unwrap_or_default();
            Some(HotspotItem {
                href,
                left: position("left")?,
                top: position("top")?,
                marker_label: String::new(),
                tooltip_label: label,
            })
        })
        .collect();

    Some(HotspotGroup { image, items })
}

fn read_byline(section: &ElementRef<'_>, prefix: &str) -> Block {
    let text_class = format!("{prefix}__text");
    let title_class = format!("{prefix}__title");
    let mut lines = Vec::new();

    for child in child_elements(section).filter(|c| tag_name(c) == "p") {
        if has_class(&child, &text_class) {
            // The "By: " prefix span is presentation, not part of the name.
            let name: String = child
                .children()
                .filter(|node| {
                    ElementRef::wrap(*node).map_or(true, |el| !has_class(&el, &format!("{prefix}__prefix")))
                })
                .flat_map(|node| match ElementRef::wrap(node) {
                    Some(el) => el.text().map(str::to_string).collect::<Vec<_>>(),
                    None => node.value().as_text().map(|t| vec![t.to_string()]).unwrap_or_default(),
                })
                .collect();
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            if !name.is_empty() {
                lines.push(name);
            }
        } else if has_class(&child, &title_class) {
            let title = clean_text(&child);
            if !title.is_empty() {
                lines.push(title);
            }
        }
    }
    Block::author_byline(lines)
}

/// Rebuilds the block a canonical element was rendered from. The kind is
/// taken from the markup, not re-classified.
pub fn decode_canonical(el: &ElementRef<'_>) -> Option<Block> {
    let kind = canonical_kind(el)?;
    let prefix = kind.prefix();
    tracing::debug!("Re-importing canonical {} block", kind);

    match kind {
        BlockKind::Divider => return Some(Block::divider(Some(divider_color(el)))),
        BlockKind::AuthorByline => return Some(read_byline(el, prefix)),
        _ => {}
    }

    let mut content = BlockContent::default();
    let heading_class = format!("{prefix}__heading");
    let cta_class = format!("{prefix}__cta-btn");

    for child in child_elements(el) {
        if has_class(&child, &heading_class) {
            content.heading = heading(&child);
        } else if has_class(&child, &format!("{prefix}__body")) {
            read_body(&child, &mut content);
        } else if has_class(&child, &format!("{prefix}__figure")) {
            read_figure(&child, prefix, &mut content);
        } else if has_class(&child, &format!("{prefix}__grid")) {
            for item in child_elements(&child).filter(|c| has_class(c, &format!("{prefix}__item"))) {
                read_figure(&item, prefix, &mut content);
            }
        } else if has_class(&child, &format!("{prefix}__cta")) {
            let links: Vec<LinkRef> = child_elements(&child)
                .filter(|a| has_class(a, &cta_class))
                .filter_map(|a| link_ref(&a))
                .collect();
            content.links.extend(links);
        } else if has_class(&child, &format!("{prefix}__wrapper")) {
            read_video(&child, &mut content);
        } else if has_class(&child, &format!("{prefix}__inner")) {
            if let Some(group) = read_hotspot_figure(&child, prefix) {
                content.hotspots.push(group);
            }
        }
    }

    if content.is_empty() {
        return None;
    }
    Some(Block::new(kind, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn decode(html: &str) -> Option<Block> {
        let doc = Html::parse_fragment(html);
        let selector = Selector::parse("section, hr").unwrap();
        let el = doc.select(&selector).next().unwrap();
        decode_canonical(&el)
    }

    #[test]
    fn recognises_only_block_classes() {
        let doc = Html::parse_fragment(
            r#"<section class="blog__two-up"></section><section class="hero"></section><hr class="blog__two-up"><hr class="blog__divider">"#,
        );
        let selector = Selector::parse("section, hr").unwrap();
        let kinds: Vec<_> = doc.select(&selector).map(|el| canonical_kind(&el)).collect();
        assert_eq!(kinds, vec![Some(BlockKind::TwoUp), None, None, Some(BlockKind::Divider)]);
    }

    #[test]
    fn decodes_grid_with_ctas() {
        let block = decode(
            r#"<section class="blog__two-up">
                 <h3 class="blog__two-up__heading fp-font-weight--semibold">Pairs</h3>
                 <div class="blog__two-up__grid">
                   <figure class="blog__two-up__item"><img class="blog__two-up__image" src="/a.jpg" alt="A"><figcaption class="blog__two-up__label">First</figcaption><a class="blog__two-up__cta-btn" href="/a">Shop A</a></figure>
                   <figure class="blog__two-up__item"><img class="blog__two-up__image blog__two-up__image--blend" src="/b.jpg" alt="B"><a class="blog__two-up__cta-btn" href="/b">Shop B</a></figure>
                 </div>
               </section>"#,
        )
        .unwrap();
        assert_eq!(block.kind, BlockKind::TwoUp);
        assert_eq!(block.content.heading.as_ref().unwrap().level, 3);
        assert_eq!(block.content.images.len(), 2);
        assert_eq!(block.content.images[0].caption, "First");
        assert!(block.content.images[1].blend);
        assert_eq!(block.content.links.len(), 2);
    }

    #[test]
    fn decodes_hotspot_items() {
        let block = decode(
            r##"<section class="blog__hotspot blog__hotspot--2-links">
                 <figure class="blog__hotspot__inner">
                   <img class="blog__hotspot__image" src="/look.jpg" alt="">
                   <a class="blog__hotspot__item" href="/bag" style="left: 25%; top: 40%;"><span class="blog__hotspot__marker">1</span><span class="blog__hotspot__label">Bag</span></a>
                   <a class="blog__hotspot__item" href="#" style="left: 60%; top: 10%;"><span class="blog__hotspot__marker">2</span><span class="blog__hotspot__label">Shoes</span></a>
                 </figure>
               </section>"##,
        )
        .unwrap();
        let group = &block.content.hotspots[0];
        assert_eq!(group.items.len(), 2);
        assert_eq!(group.items[0].href.as_deref(), Some("/bag"));
        assert_eq!(group.items[1].href, None);
        assert_eq!(group.items[1].label(), "Shoes");
    }

    #[test]
    fn decodes_byline_without_prefix() {
        let block = decode(
            r#"<section class="blog__author-byline"><p class="blog__author-byline__text"><span class="blog__author-byline__prefix">By: </span>Jane Doe</p><p class="blog__author-byline__title">Editor</p></section>"#,
        )
        .unwrap();
        assert_eq!(block.kind, BlockKind::AuthorByline);
        let lines: Vec<_> = block
            .content
            .body
            .iter()
            .filter_map(|f| match f {
                ContentFragment::Paragraph(p) => Some(p.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["Jane Doe", "Editor"]);
    }

    #[test]
    fn decodes_divider_colour() {
        let block = decode(r#"<hr class="blog__divider" style="border: none; border-top: 1px solid #c4a484;">"#).unwrap();
        assert_eq!(block.divider_color.unwrap().as_str(), "#c4a484");
    }
}
