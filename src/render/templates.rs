// src/render/templates.rs
use crate::blocks::models::{
    Block, BlockContent, BlockKind, ContentFragment, HotspotGroup, ImageRef, LinkRef,
    DEFAULT_DIVIDER_COLOR,
};
use crate::render::links::{new_tab_attrs, LinkPolicy};
use crate::render::rich_text::{escape_html, normalize_rich_text};
use once_cell::sync::Lazy;
use regex::Regex;

const HEADING_WEIGHT_CLASS: &str = "fp-font-weight--semibold";
const MARKER_WEIGHT_CLASS: &str = "fp-font-weight--bold";
const DEFAULT_VIDEO_TITLE: &str = "Video";
const VIDEO_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

static YOUTUBE_WATCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)youtube\.com/watch\?.*v=([\w-]+)").expect("Failed to compile YOUTUBE_WATCH_RE")
});

static YOUTUBE_SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)youtu\.be/([\w-]+)").expect("Failed to compile YOUTUBE_SHORT_RE"));

static VIMEO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)vimeo\.com/(\d+)").expect("Failed to compile VIMEO_RE"));

static BYLINE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^by:?\s+").expect("Failed to compile BYLINE_PREFIX_RE"));

/// YouTube/Vimeo page URLs to their embeddable player URL. Anything else,
/// including URLs already in embed form, passes through.
pub fn to_embed_url(url: &str) -> String {
    let url = url.trim();
    if let Some(caps) = YOUTUBE_WATCH_RE.captures(url) {
        return format!("https://www.youtube.com/embed/{}", &caps[1]);
    }
    if let Some(caps) = YOUTUBE_SHORT_RE.captures(url) {
        return format!("https://www.youtube.com/embed/{}", &caps[1]);
    }
    if !url.to_ascii_lowercase().contains("player.vimeo.com") {
        if let Some(caps) = VIMEO_RE.captures(url) {
            return format!("https://player.vimeo.com/video/{}", &caps[1]);
        }
    }
    url.to_string()
}

/// Line-oriented writer that keeps template indentation readable.
struct Lines {
    lines: Vec<String>,
}

impl Lines {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    fn push(&mut self, depth: usize, line: impl AsRef<str>) {
        self.lines.push(format!("{}{}", "  ".repeat(depth), line.as_ref()));
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}

fn heading_line(out: &mut Lines, prefix: &str, content: &BlockContent) {
    if let Some(heading) = &content.heading {
        let text = heading.text.trim();
        if !text.is_empty() {
            out.push(
                1,
                format!(
                    r#"<h{level} class="{prefix}__heading {HEADING_WEIGHT_CLASS}">{text}</h{level}>"#,
                    level = heading.level,
                    text = escape_html(text),
                ),
            );
        }
    }
}

fn body_lines(out: &mut Lines, prefix: &str, content: &BlockContent, policy: &LinkPolicy) {
    let mut inner = Lines::new();
    for fragment in &content.body {
        match fragment {
            ContentFragment::Paragraph(p) => {
                let html = normalize_rich_text(&p.html, policy);
                if html.is_empty() {
                    continue;
                }
                let tag = if p.blockquote { "blockquote" } else { "p" };
                inner.push(2, format!("<{tag}>{html}</{tag}>"));
            }
            ContentFragment::Heading(h) => {
                let html = normalize_rich_text(&h.html, policy);
                if !html.is_empty() {
                    inner.push(2, format!("<h{level}>{html}</h{level}>", level = h.level));
                }
            }
            ContentFragment::List(list) => {
                let items: Vec<String> = list
                    .items
                    .iter()
                    .map(|item| normalize_rich_text(item, policy))
                    .filter(|item| !item.is_empty())
                    .collect();
                if items.is_empty() {
                    continue;
                }
                let tag = if list.ordered { "ol" } else { "ul" };
                inner.push(2, format!("<{tag}>"));
                for item in items {
                    inner.push(3, format!("<li>{item}</li>"));
                }
                inner.push(2, format!("</{tag}>"));
            }
            _ => {}
        }
    }

    if inner.lines.is_empty() {
        return;
    }
    out.push(1, format!(r#"<div class="{prefix}__body">"#));
    out.lines.extend(inner.lines);
    out.push(1, "</div>");
}

fn image_tag(prefix: &str, image: &ImageRef) -> String {
    let class = if image.blend {
        format!("{prefix}__image {prefix}__image--blend")
    } else {
        format!("{prefix}__image")
    };
    format!(
        r#"<img class="{class}" src="{src}" alt="{alt}">"#,
        src = escape_html(&image.src),
        alt = escape_html(&image.alt),
    )
}

fn caption_line(out: &mut Lines, depth: usize, prefix: &str, image: &ImageRef) {
    let caption = image.caption.trim();
    if !caption.is_empty() {
        out.push(depth, format!(r#"<figcaption class="{prefix}__label">{}</figcaption>"#, escape_html(caption)));
    }
}

fn cta_tag(prefix: &str, link: &LinkRef, policy: &LinkPolicy) -> String {
    let href = policy.rewrite_href(&link.href);
    format!(
        r#"<a class="{prefix}__cta-btn {HEADING_WEIGHT_CLASS}" href="{href_attr}"{new_tab}>{text}</a>"#,
        href_attr = escape_html(&href),
        new_tab = new_tab_attrs(&href),
        text = escape_html(link.text.trim()),
    )
}

fn usable_links(content: &BlockContent) -> Vec<&LinkRef> {
    content
        .links
        .iter()
        .filter(|link| !link.href.trim().is_empty() && !link.text.trim().is_empty())
        .collect()
}

fn single_figure(out: &mut Lines, prefix: &str, content: &BlockContent, policy: &LinkPolicy, with_cta: bool) {
    let Some(image) = content.images.first() else { return };
    out.push(1, format!(r#"<figure class="{prefix}__figure">"#));
    out.push(2, image_tag(prefix, image));
    caption_line(out, 2, prefix, image);
    if with_cta {
        if let Some(link) = usable_links(content).first() {
            out.push(2, cta_tag(prefix, link, policy));
        }
    }
    out.push(1, "</figure>");
}

fn grid(out: &mut Lines, prefix: &str, content: &BlockContent, policy: &LinkPolicy) {
    let links = usable_links(content);
    // Per-item buttons only when every image can get its own.
    let per_item = links.len() >= 2 && links.len() >= content.images.len();

    if !content.images.is_empty() {
        out.push(1, format!(r#"<div class="{prefix}__grid">"#));
        for (i, image) in content.images.iter().enumerate() {
            out.push(2, format!(r#"<figure class="{prefix}__item">"#));
            out.push(3, image_tag(prefix, image));
            caption_line(out, 3, prefix, image);
            if per_item {
                if let Some(link) = links.get(i) {
                    out.push(3, cta_tag(prefix, link, policy));
                }
            }
            out.push(2, "</figure>");
        }
        out.push(1, "</div>");
    }

    if links.len() == 1 {
        cta_block(out, prefix, &links, policy);
    }
}

fn cta_block(out: &mut Lines, prefix: &str, links: &[&LinkRef], policy: &LinkPolicy) {
    if links.is_empty() {
        return;
    }
    out.push(1, format!(r#"<div class="{prefix}__cta">"#));
    for link in links {
        out.push(2, cta_tag(prefix, link, policy));
    }
    out.push(1, "</div>");
}

fn video(out: &mut Lines, prefix: &str, content: &BlockContent) {
    let Some(video) = content.videos.first() else { return };
    let title = match video.title.trim() {
        "" => DEFAULT_VIDEO_TITLE,
        title => title,
    };
    out.push(1, format!(r#"<div class="{prefix}__wrapper">"#));
    out.push(2, "<iframe");
    out.push(3, format!(r#"class="{prefix}__iframe""#));
    out.push(3, format!(r#"src="{}""#, escape_html(&to_embed_url(&video.src))));
    out.push(3, format!(r#"title="{}""#, escape_html(title)));
    out.push(3, r#"frameborder="0""#);
    out.push(3, format!(r#"allow="{VIDEO_ALLOW}""#));
    out.push(3, "allowfullscreen>");
    out.push(2, "</iframe>");
    out.push(1, "</div>");
}

fn hotspot_figure(out: &mut Lines, prefix: &str, group: &HotspotGroup, policy: &LinkPolicy) {
    out.push(1, format!(r#"<figure class="{prefix}__inner">"#));
    out.push(2, image_tag(prefix, &group.image));
    for (index, item) in group.items.iter().enumerate() {
        let href = item
            .href
            .as_deref()
            .map(|href| policy.rewrite_href(href))
            .unwrap_or_else(|| "#".to_string());
        out.push(
            2,
            format!(
                r#"<a class="{prefix}__item" href="{href_attr}" style="left: {left}; top: {top};"{new_tab}>"#,
                href_attr = escape_html(&href),
                left = item.left,
                top = item.top,
                new_tab = new_tab_attrs(&href),
            ),
        );
        out.push(3, format!(r#"<span class="{prefix}__marker {MARKER_WEIGHT_CLASS}">{}</span>"#, index + 1));
        out.push(
            3,
            format!(
                r#"<span class="{prefix}__label {HEADING_WEIGHT_CLASS}">{}</span>"#,
                escape_html(item.label().trim())
            ),
        );
        out.push(2, "</a>");
    }
    out.push(1, "</figure>");
}

pub(crate) fn render_hotspot(block: &Block, policy: &LinkPolicy) -> String {
    let prefix = block.kind.prefix();
    let groups: Vec<&HotspotGroup> = block.content.hotspots.iter().collect();
    let link_count: usize = groups.iter().map(|g| g.items.len()).sum();
    let plural = if link_count == 1 { "" } else { "s" };

    let mut out = Lines::new();
    out.push(0, format!(r#"<section class="{prefix} {prefix}--{link_count}-link{plural}">"#));
    heading_line(&mut out, prefix, &block.content);
    body_lines(&mut out, prefix, &block.content, policy);
    for group in groups {
        hotspot_figure(&mut out, prefix, group, policy);
    }
    out.push(0, "</section>");
    out.finish()
}

pub(crate) fn render_divider(block: &Block) -> String {
    let color = block
        .divider_color
        .as_ref()
        .map(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_DIVIDER_COLOR);
    format!(
        r#"<hr class="{prefix}" style="border: none; border-top: 1px solid {color};">"#,
        prefix = block.kind.prefix(),
        color = escape_html(color),
    )
}

/// Name without its "By:" lead-in.
pub fn byline_name(line: &str) -> String {
    BYLINE_PREFIX_RE.replace(line.trim(), "").trim().to_string()
}

pub(crate) fn render_author_byline(block: &Block) -> String {
    let prefix = block.kind.prefix();
    let lines: Vec<&str> = block
        .content
        .body
        .iter()
        .filter_map(|fragment| match fragment {
            ContentFragment::Paragraph(p) => Some(p.text.trim()),
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    let mut out = Lines::new();
    out.push(0, format!(r#"<section class="{prefix}">"#));
    if let Some((name, titles)) = lines.split_first() {
        let name = byline_name(name);
        if !name.is_empty() {
            out.push(
                1,
                format!(r#"<p class="{prefix}__text"><span class="{prefix}__prefix">By: </span>{}</p>"#, escape_html(&name)),
            );
        }
        for title in titles {
            out.push(1, format!(r#"<p class="{prefix}__title">{}</p>"#, escape_html(title)));
        }
    }
    out.push(0, "</section>");
    out.finish()
}

/// Heading, body and kind-specific parts of every content-bearing block.
pub(crate) fn render_section(block: &Block, policy: &LinkPolicy) -> String {
    let prefix = block.kind.prefix();
    let content = &block.content;

    let mut out = Lines::new();
    out.push(0, format!(r#"<section class="{prefix}">"#));
    heading_line(&mut out, prefix, content);
    body_lines(&mut out, prefix, content, policy);

    match block.kind {
        BlockKind::FullWidth => single_figure(&mut out, prefix, content, policy, false),
        BlockKind::OneUp => single_figure(&mut out, prefix, content, policy, true),
        BlockKind::TwoUp
        | BlockKind::ThreeUp
        | BlockKind::FourUp
        | BlockKind::FiveUp
        | BlockKind::TwoByTwo
        | BlockKind::ThreeByTwo => grid(&mut out, prefix, content, policy),
        BlockKind::Video => video(&mut out, prefix, content),
        BlockKind::RichText => cta_block(&mut out, prefix, &usable_links(content), policy),
        BlockKind::Hotspot | BlockKind::Divider | BlockKind::AuthorByline => {}
    }

    out.push(0, "</section>");
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_urls() {
        assert_eq!(
            to_embed_url("https://www.youtube.com/watch?v=abc_123&t=4"),
            "https://www.youtube.com/embed/abc_123"
        );
        assert_eq!(to_embed_url("https://youtu.be/XyZ-9"), "https://www.youtube.com/embed/XyZ-9");
        assert_eq!(to_embed_url("https://vimeo.com/76979871"), "https://player.vimeo.com/video/76979871");
        assert_eq!(
            to_embed_url("https://player.vimeo.com/video/76979871"),
            "https://player.vimeo.com/video/76979871"
        );
        assert_eq!(to_embed_url("/media/clip.mp4"), "/media/clip.mp4");
    }

    #[test]
    fn byline_prefix_is_stripped() {
        assert_eq!(byline_name("By: Jane Doe"), "Jane Doe");
        assert_eq!(byline_name("by Jane Doe"), "Jane Doe");
        assert_eq!(byline_name("Byron Smith"), "Byron Smith");
    }
}
