// src/extractors/primitives.rs

// Node-level readers shared by the sequential segmenter and the spatial
// selector. Every reader returns `None` or an empty collection when the
// markup does not carry what it looks for.

use crate::blocks::models::{
    AttachmentHint, Color, ContentFragment, Heading, ImageRef, LinkRef, ListBlock, Paragraph,
    VideoRef,
};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

// --- CSS Selectors (Lazy Static) ---
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("Failed to compile IMG_SELECTOR"));

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("Failed to compile ANCHOR_SELECTOR"));

static MEDIA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("iframe, video").expect("Failed to compile MEDIA_SELECTOR"));

static SOURCE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("source").expect("Failed to compile SOURCE_SELECTOR"));

static CAPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("figcaption, [class*='caption']").expect("Failed to compile CAPTION_SELECTOR")
});

// --- Regex Patterns (Lazy Static) ---
static BR_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("Failed to compile BR_SPLIT_RE"));

// One srcset candidate. URLs may carry commas (data URIs), so a candidate
// ends only at a comma after its descriptor or at the end of the value.
static SRCSET_CANDIDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S+)(?:\s+([\d.]+[wx]))?\s*(?:,|$)").expect("Failed to compile SRCSET_CANDIDATE_RE")
});

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

// Density descriptors rank above any width descriptor.
const DENSITY_RANK_SCALE: f64 = 100_000.0;

/// Lazy-load attributes consulted after `srcset`, before plain `src`.
const LAZY_SRC_ATTRS: [&str; 3] = ["data-lazy-src", "data-src", "data-original"];
const SRCSET_ATTRS: [&str; 3] = ["srcset", "data-srcset", "data-lazy-srcset"];

/// Words in an anchor's class list that signal button semantics.
const BUTTON_CLASS_HINTS: [&str; 4] = ["btn", "button", "cta", "wp-block-button"];

pub fn class_attr<'a>(el: &ElementRef<'a>) -> &'a str {
    el.value().attr("class").unwrap_or("")
}

/// Substring match on the raw class attribute, the way page-builder class
/// families (`wpb_column`, `vc_col-sm-6`, ...) are usually recognised.
pub fn class_contains(el: &ElementRef<'_>, needle: &str) -> bool {
    class_attr(el).contains(needle)
}

pub fn tag_name<'a>(el: &ElementRef<'a>) -> &'a str {
    el.value().name()
}

/// Text content with whitespace runs collapsed and trimmed.
pub fn clean_text(el: &ElementRef<'_>) -> String {
    let raw = el.text().collect::<String>();
    collapse_whitespace(&raw)
}

pub fn collapse_whitespace(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw, " ").trim().to_string()
}

pub fn is_data_uri(src: &str) -> bool {
    src.trim_start().to_ascii_lowercase().starts_with("data:")
}

fn usable_src(raw: Option<&str>) -> Option<String> {
    let src = raw?.trim();
    if src.is_empty() || is_data_uri(src) {
        return None;
    }
    Some(src.to_string())
}

/// Picks the largest candidate from a responsive `srcset` value.
pub fn largest_srcset_candidate(srcset: &str) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;

    for caps in SRCSET_CANDIDATE_RE.captures_iter(srcset) {
        let Some(url) = caps.get(1).map(|m| m.as_str().trim_end_matches(',')) else { continue };
        if url.is_empty() || is_data_uri(url) {
            continue;
        }
        let rank = match caps.get(2).map(|m| m.as_str()) {
            Some(descriptor) if descriptor.ends_with('w') => {
                descriptor.trim_end_matches('w').parse::<f64>().unwrap_or(0.0)
            }
            Some(descriptor) => {
                descriptor.trim_end_matches('x').parse::<f64>().unwrap_or(1.0) * DENSITY_RANK_SCALE
            }
            None => DENSITY_RANK_SCALE,
        };
        if best.map_or(true, |(best_rank, _)| rank > best_rank) {
            best = Some((rank, url));
        }
    }

    best.map(|(_, url)| url.to_string())
}

/// Resolves the best source URL for an `<img>`: srcset, then lazy-load
/// attributes, then `src`. Data URIs never qualify.
pub fn best_image_source(img: &ElementRef<'_>) -> Option<String> {
    let attrs = img.value();

    for attr in SRCSET_ATTRS {
        if let Some(url) = attrs.attr(attr).and_then(largest_srcset_candidate) {
            return Some(url);
        }
    }
    for attr in LAZY_SRC_ATTRS {
        if let Some(url) = usable_src(attrs.attr(attr)) {
            return Some(url);
        }
    }
    usable_src(attrs.attr("src"))
}

pub fn attachment_hint(class: &str) -> Option<AttachmentHint> {
    if class.contains("attachment-full") || class.contains("size-full") {
        Some(AttachmentHint::Full)
    } else if class.contains("attachment-medium") || class.contains("size-medium") {
        Some(AttachmentHint::Medium)
    } else {
        None
    }
}

fn blend_hint(img: &ElementRef<'_>) -> bool {
    class_contains(img, "blend")
        || style_value(img, "mix-blend-mode").map_or(false, |v| v != "normal")
}

/// Caption of the nearest figure (or page-builder single-image wrapper).
fn image_caption(img: &ElementRef<'_>) -> String {
    for ancestor in img.ancestors().filter_map(ElementRef::wrap) {
        let is_wrapper = tag_name(&ancestor) == "figure" || class_contains(&ancestor, "single_image");
        if is_wrapper {
            if let Some(caption) = ancestor.select(&CAPTION_SELECTOR).next() {
                return clean_text(&caption);
            }
            return String::new();
        }
    }
    String::new()
}

/// Full image fragment for an `<img>`, or `None` without a usable source.
pub fn image_ref(img: &ElementRef<'_>) -> Option<ImageRef> {
    let src = best_image_source(img)?;
    Some(ImageRef {
        src,
        alt: img.value().attr("alt").unwrap_or("").trim().to_string(),
        caption: image_caption(img),
        attachment: attachment_hint(class_attr(img)),
        blend: blend_hint(img),
    })
}

/// First usable image inside `container` (or the container itself).
pub fn first_image(container: &ElementRef<'_>) -> Option<ImageRef> {
    if tag_name(container) == "img" {
        return image_ref(container);
    }
    container.select(&IMG_SELECTOR).find_map(|img| image_ref(&img))
}

pub fn all_images(container: &ElementRef<'_>) -> Vec<ImageRef> {
    container.select(&IMG_SELECTOR).filter_map(|img| image_ref(&img)).collect()
}

pub fn heading_level(el: &ElementRef<'_>) -> Option<u8> {
    match tag_name(el) {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

pub fn heading_text(el: &ElementRef<'_>) -> String {
    clean_text(el)
}

pub fn heading_html(el: &ElementRef<'_>) -> String {
    el.inner_html().trim().to_string()
}

/// Heading with its original level; `None` for non-headings or empty text.
pub fn heading(el: &ElementRef<'_>) -> Option<Heading> {
    let level = heading_level(el)?;
    let text = heading_text(el);
    if text.is_empty() {
        return None;
    }
    Some(Heading { level, text, html: heading_html(el) })
}

/// Inner markup of each direct `<li>` child, inline formatting preserved.
pub fn list_items(list: &ElementRef<'_>) -> Vec<String> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| tag_name(child) == "li")
        .map(|li| li.inner_html().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub fn list_block(list: &ElementRef<'_>) -> Option<ListBlock> {
    let ordered = match tag_name(list) {
        "ol" => true,
        "ul" => false,
        _ => return None,
    };
    let items = list_items(list);
    if items.is_empty() {
        return None;
    }
    Some(ListBlock { ordered, items })
}

/// `(href, text)` of every `<li>` that carries a link, in order.
pub fn list_links(list: &ElementRef<'_>) -> Vec<LinkRef> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| tag_name(child) == "li")
        .filter_map(|li| li.select(&ANCHOR_SELECTOR).find_map(|a| link_ref(&a)))
        .collect()
}

pub fn link_ref(anchor: &ElementRef<'_>) -> Option<LinkRef> {
    let href = anchor.value().attr("href").unwrap_or("").trim();
    let text = clean_text(anchor);
    if href.is_empty() || text.is_empty() {
        return None;
    }
    Some(LinkRef { href: href.to_string(), text })
}

/// An anchor counts as a call-to-action only when its class or role says so.
pub fn is_button_link(anchor: &ElementRef<'_>) -> bool {
    let class = class_attr(anchor);
    BUTTON_CLASS_HINTS.iter().any(|hint| class.contains(hint))
        || anchor.value().attr("role") == Some("button")
}

/// Button-like links under `container`, de-duplicated on `href|text`.
pub fn button_links(container: &ElementRef<'_>) -> Vec<LinkRef> {
    let mut seen = HashSet::new();
    let anchors: Vec<ElementRef<'_>> = if tag_name(container) == "a" {
        vec![*container]
    } else {
        container.select(&ANCHOR_SELECTOR).collect()
    };

    anchors
        .into_iter()
        .filter(|a| is_button_link(a))
        .filter_map(|a| link_ref(&a))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Video reference for an `<iframe>` / `<video>` element.
pub fn video_ref(media: &ElementRef<'_>) -> Option<VideoRef> {
    let src = media
        .value()
        .attr("src")
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            media
                .select(&SOURCE_SELECTOR)
                .find_map(|source| source.value().attr("src").map(str::to_string))
        })?;
    let src = src.trim().to_string();
    if src.is_empty() {
        return None;
    }
    Some(VideoRef {
        src,
        title: media.value().attr("title").unwrap_or("").trim().to_string(),
    })
}

/// First embedded video in `container` (or the container itself).
pub fn find_video(container: &ElementRef<'_>) -> Option<VideoRef> {
    if matches!(tag_name(container), "iframe" | "video") {
        return video_ref(container);
    }
    container.select(&MEDIA_SELECTOR).find_map(|media| video_ref(&media))
}

pub fn contains_media(container: &ElementRef<'_>) -> bool {
    container.select(&MEDIA_SELECTOR).next().is_some()
}

pub fn paragraph(el: &ElementRef<'_>) -> Option<Paragraph> {
    let text = clean_text(el);
    if text.is_empty() {
        return None;
    }
    Some(Paragraph::plain(text, el.inner_html().trim()))
}

pub fn blockquote(el: &ElementRef<'_>) -> Option<Paragraph> {
    paragraph(el).map(|p| Paragraph { blockquote: true, ..p })
}

/// A paragraph whose only content is a button-styled link is a CTA, not text.
pub fn paragraph_or_cta(p: &ElementRef<'_>) -> Option<ContentFragment> {
    let text = clean_text(p);
    if let Some(anchor) = p.select(&ANCHOR_SELECTOR).next() {
        if is_button_link(&anchor) && clean_text(&anchor) == text {
            if let Some(link) = link_ref(&anchor) {
                return Some(ContentFragment::Link(link));
            }
        }
    }
    paragraph(p).map(ContentFragment::Paragraph)
}

/// Lower-cased `(property, value)` pairs of an inline style attribute.
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if prop.is_empty() || value.is_empty() {
                return None;
            }
            Some((prop, value))
        })
        .collect()
}

pub fn style_value(el: &ElementRef<'_>, property: &str) -> Option<String> {
    let style = el.value().attr("style")?;
    parse_style(style)
        .into_iter()
        .find(|(prop, _)| prop == property)
        .map(|(_, value)| value)
}

const BORDER_KEYWORDS: [&str; 12] = [
    "none", "hidden", "solid", "dashed", "dotted", "double", "groove", "ridge", "inset", "outset",
    "thin", "medium",
];

fn color_token(shorthand: &str) -> Option<String> {
    shorthand
        .split_whitespace()
        .find(|token| {
            let lower = token.to_ascii_lowercase();
            !BORDER_KEYWORDS.contains(&lower.as_str())
                && lower != "thick"
                && !lower.chars().next().map_or(false, |c| c.is_ascii_digit() || c == '.')
        })
        .map(str::to_string)
}

/// Line colour of a legacy `<hr>`, falling back to the neutral default.
pub fn divider_color(hr: &ElementRef<'_>) -> Color {
    let declarations = hr.value().attr("style").map(parse_style).unwrap_or_default();
    let lookup = |name: &str| {
        declarations
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value.clone())
    };

    let explicit = ["border-top-color", "border-color", "color", "background-color"]
        .into_iter()
        .find_map(lookup);
    let from_shorthand = || {
        ["border-top", "border", "background"]
            .into_iter()
            .filter_map(lookup)
            .find_map(|value| color_token(&value))
    };

    explicit
        .or_else(from_shorthand)
        .or_else(|| hr.value().attr("color").map(str::to_string))
        .map(Color::new)
        .unwrap_or_default()
}

/// Text lines of a byline container, split on `<br>`.
pub fn byline_lines(el: &ElementRef<'_>) -> Vec<String> {
    BR_SPLIT_RE
        .split(&el.inner_html())
        .map(|chunk| {
            let fragment = Html::parse_fragment(chunk);
            collapse_whitespace(&fragment.root_element().text().collect::<String>())
        })
        .filter(|line| !line.is_empty())
        .collect()
}
