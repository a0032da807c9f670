// src/render/rich_text.rs

//! Inline rich-text model.
//!
//! Legacy markup is parsed once into a small tree of inline spans, rewritten
//! structurally (tag variants, font-weight styles, link policy) and serialized
//! back. Serializing the result of parsing canonical output reproduces it
//! byte for byte, which keeps re-rendering stable.

use crate::extractors::primitives::parse_style;
use crate::render::links::{is_external, LinkPolicy};
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Class prefix of the font-weight utility classes.
const WEIGHT_CLASS_PREFIX: &str = "fp-font-weight--";

/// Tags kept as-is (without attributes) when found in rich text.
const PASSTHROUGH_TAGS: [&str; 15] = [
    "u", "s", "sup", "sub", "code", "mark", "small", "del", "ins", "abbr", "q", "cite", "ul", "ol",
    "li",
];

/// Tags whose content is dropped entirely.
const DROPPED_TAGS: [&str; 8] = ["script", "style", "img", "iframe", "video", "noscript", "svg", "template"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineTag {
    Strong,
    Em,
    Span,
    Link { href: String, new_tab: bool },
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Break,
    Element {
        tag: InlineTag,
        classes: Vec<String>,
        children: Vec<Inline>,
    },
}

/// Maps a CSS font-weight value onto its named utility class.
pub fn weight_class(value: &str) -> Option<String> {
    let name = match value.trim().to_ascii_lowercase().as_str() {
        "200" | "300" => "light",
        "400" | "normal" => "regular",
        "500" => "medium",
        "600" => "semibold",
        "700" | "bold" => "bold",
        _ => return None,
    };
    Some(format!("{WEIGHT_CLASS_PREFIX}{name}"))
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Parses an HTML fragment into inline spans, applying the link policy.
pub fn parse_inline(html: &str, policy: &LinkPolicy) -> Vec<Inline> {
    let fragment = Html::parse_fragment(html);
    convert_children(&fragment.root_element(), policy)
}

fn convert_children(parent: &ElementRef<'_>, policy: &LinkPolicy) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push(Inline::Text(text.to_string())),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    convert_element(&el, policy, &mut out);
                }
            }
            _ => {}
        }
    }
    out
}

fn element_classes(el: &ElementRef<'_>) -> Vec<String> {
    // Only our own utility classes survive; legacy theme classes are dropped.
    let mut classes: Vec<String> = el
        .value()
        .classes()
        .filter(|class| class.starts_with("fp-"))
        .map(str::to_string)
        .collect();

    if let Some(style) = el.value().attr("style") {
        let weight = parse_style(style)
            .into_iter()
            .find(|(prop, _)| prop == "font-weight")
            .and_then(|(_, value)| weight_class(&value));
        if let Some(class) = weight {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
    }
    classes
}

fn convert_element(el: &ElementRef<'_>, policy: &LinkPolicy, out: &mut Vec<Inline>) {
    let name = el.value().name();
    if DROPPED_TAGS.contains(&name) {
        return;
    }
    if name == "br" {
        out.push(Inline::Break);
        return;
    }

    let children = convert_children(el, policy);
    let classes = element_classes(el);

    let tag = match name {
        "b" | "strong" => InlineTag::Strong,
        "i" | "em" => InlineTag::Em,
        "span" if !classes.is_empty() => InlineTag::Span,
        "a" => match el.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) {
            Some(href) => {
                let href = policy.rewrite_href(href);
                let new_tab = is_external(&href);
                InlineTag::Link { href, new_tab }
            }
            None => {
                out.extend(children);
                return;
            }
        },
        other if PASSTHROUGH_TAGS.contains(&other) => InlineTag::Other(other.to_string()),
        // Unknown wrappers (font, div, p, classless span, ...) unwrap to their content.
        _ => {
            out.extend(children);
            return;
        }
    };

    let is_link = matches!(tag, InlineTag::Link { .. });
    if children.is_empty() && !is_link {
        return;
    }
    out.push(Inline::Element { tag, classes, children });
}

/// Serializes spans back to markup with a fixed attribute order.
pub fn serialize_inline(nodes: &[Inline]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Inline], out: &mut String) {
    for node in nodes {
        match node {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Break => out.push_str("<br>"),
            Inline::Element { tag, classes, children } => {
                let name = match tag {
                    InlineTag::Strong => "strong",
                    InlineTag::Em => "em",
                    InlineTag::Span => "span",
                    InlineTag::Link { .. } => "a",
                    InlineTag::Other(name) => name.as_str(),
                };
                out.push('<');
                out.push_str(name);
                if let InlineTag::Link { href, .. } = tag {
                    out.push_str(&format!(" href=\"{}\"", escape_html(href)));
                }
                if !classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", escape_html(&classes.join(" "))));
                }
                if let InlineTag::Link { new_tab: true, .. } = tag {
                    out.push_str(r#" target="_blank" rel="noopener noreferrer""#);
                }
                out.push('>');
                write_nodes(children, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

/// Canonical form of one rich-text run (paragraph, list item, sub-heading).
pub fn normalize_rich_text(html: &str, policy: &LinkPolicy) -> String {
    serialize_inline(&parse_inline(html, policy)).trim().to_string()
}
