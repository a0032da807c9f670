// src/extractors/article.rs
use crate::blocks::models::{Block, BlockKind};
use crate::extractors::primitives::{best_image_source, byline_lines, clean_text, tag_name};
use crate::extractors::segmenter::{find_content_root, segment_element};
use crate::render::{render_blocks, RenderOptions};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

const UNTITLED: &str = "Untitled";
const NO_CONTENT_ROOT: &str = "No content container found";

fn selector_chain(css: &[&str]) -> Vec<Selector> {
    css.iter()
        .map(|c| Selector::parse(c).expect("Failed to compile article selector"))
        .collect()
}

// --- CSS Selectors (Lazy Static), in priority order ---
static TITLE_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| selector_chain(&[".entry-title", "h1.post-title", "article h1", "h1"]));

static AUTHOR_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selector_chain(&[
        ".author-name",
        ".entry-author",
        "[rel='author']",
        ".byline a",
        ".post-author a",
        "meta[name='author']",
    ])
});

static DATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selector_chain(&[
        "time[datetime]",
        ".entry-date",
        ".post-date",
        "meta[property='article:published_time']",
    ])
});

static SUMMARY_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selector_chain(&[
        ".entry-summary",
        ".post-excerpt",
        "meta[property='og:description']",
        "meta[name='description']",
    ])
});

static ARTICLE_SCOPE_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| selector_chain(&["article", ".post", ".hentry"]));

static FEATURED_IMAGE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selector_chain(&[
        ".post-thumbnail img",
        ".featured-image img",
        "img.wp-post-image",
        ".entry-content img:first-of-type",
    ])
});

static TAG_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        ".thb-article-tags a, .tag-links a, .post-tags a, [rel='tag'], .entry-tags a, .cat-links a, .entry-categories a",
    )
    .expect("Failed to compile TAG_SELECTOR")
});

static OG_IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[property='og:image']").expect("Failed to compile OG_IMAGE_SELECTOR")
});

static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("Failed to compile ARTICLE_SELECTOR"));

static BYLINE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".article-author").expect("Failed to compile BYLINE_SELECTOR"));

/// Everything the migration keeps about one article page.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub author: String,
    pub published_at: String,
    pub tags: Vec<String>,
    pub image_src: String,
    pub image_alt: String,
    pub summary: String,
    pub blocks: Vec<Block>,
    /// Rendered canonical markup of `blocks`.
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArticleRecord {
    /// Blank record for `url`, to be filled in by an extraction path.
    pub fn for_url(url: &str) -> Self {
        ArticleRecord {
            title: UNTITLED.to_string(),
            url: url.to_string(),
            author: String::new(),
            published_at: String::new(),
            tags: Vec::new(),
            image_src: String::new(),
            image_alt: String::new(),
            summary: String::new(),
            blocks: Vec::new(),
            html: String::new(),
            error: None,
        }
    }

    /// Record for an article that could not be processed at all.
    pub fn failed(url: &str, error: impl Into<String>) -> Self {
        ArticleRecord { error: Some(error.into()), ..Self::for_url(url) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn first_match<'a>(scope: &ElementRef<'a>, chain: &[Selector]) -> Option<ElementRef<'a>> {
    chain.iter().find_map(|selector| scope.select(selector).next())
}

/// `content` of a `<meta>`, visible text of anything else.
fn meta_or_text(el: &ElementRef<'_>) -> String {
    if tag_name(el) == "meta" {
        return el.value().attr("content").unwrap_or("").trim().to_string();
    }
    clean_text(el)
}

/// RFC 3339 stays RFC 3339, common human dates become `YYYY-MM-DD`,
/// anything else is kept verbatim.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.to_rfc3339();
    }
    ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn published_at(page: &ElementRef<'_>) -> String {
    let Some(el) = first_match(page, &DATE_SELECTORS) else { return String::new() };
    let raw = el
        .value()
        .attr("datetime")
        .map(str::to_string)
        .unwrap_or_else(|| meta_or_text(&el));
    normalize_date(&raw)
}

fn tags(page: &ElementRef<'_>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in page.select(&TAG_SELECTOR).map(|a| clean_text(&a)) {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Featured image, searched inside the article first so sidebar images are ignored.
fn featured_image(page: &ElementRef<'_>) -> (String, String) {
    let scope = first_match(page, &ARTICLE_SCOPE_SELECTORS).unwrap_or(*page);
    let found = FEATURED_IMAGE_SELECTORS.iter().find_map(|selector| {
        let img = scope.select(selector).next()?;
        let src = best_image_source(&img)?;
        Some((src, img.value().attr("alt").unwrap_or("").trim().to_string()))
    });
    found
        .or_else(|| {
            page.select(&OG_IMAGE_SELECTOR)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .map(|src| (src.trim().to_string(), String::new()))
        })
        .unwrap_or_default()
}

/// Byline rendered outside the content root, e.g. in the article footer.
fn trailing_byline(page: &ElementRef<'_>) -> Option<Block> {
    let scope = page.select(&ARTICLE_SELECTOR).next().unwrap_or(*page);
    let byline = scope.select(&BYLINE_SELECTOR).next()?;
    let lines = byline_lines(&byline);
    (!lines.is_empty()).then(|| Block::author_byline(lines))
}

/// Extracts metadata and blocks from a full article page and renders them.
/// Never fails: problems are recorded in [`ArticleRecord::error`].
pub fn process_article(html: &str, url: &str, options: &RenderOptions) -> ArticleRecord {
    if html.trim().is_empty() {
        tracing::warn!("Empty page for {}", url);
        return ArticleRecord::failed(url, "No document to process");
    }
    let document = Html::parse_document(html);
    let page = document.root_element();

    let title = first_match(&page, &TITLE_SELECTORS)
        .map(|el| clean_text(&el))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    let author = first_match(&page, &AUTHOR_SELECTORS)
        .map(|el| meta_or_text(&el))
        .unwrap_or_default();
    let summary = first_match(&page, &SUMMARY_SELECTORS)
        .map(|el| meta_or_text(&el))
        .unwrap_or_default();
    let (image_src, image_alt) = featured_image(&page);

    let mut record = ArticleRecord {
        title,
        url: url.to_string(),
        author,
        published_at: published_at(&page),
        tags: tags(&page),
        image_src,
        image_alt,
        summary,
        blocks: Vec::new(),
        html: String::new(),
        error: None,
    };

    let Some(content_root) = find_content_root(&document) else {
        tracing::warn!("{} for {}", NO_CONTENT_ROOT, url);
        record.error = Some(NO_CONTENT_ROOT.to_string());
        return record;
    };

    let mut blocks = segment_element(content_root);
    if !blocks.iter().any(|b| b.kind == BlockKind::AuthorByline) {
        if let Some(byline) = trailing_byline(&page) {
            tracing::debug!("Appending byline found outside the content root");
            blocks.push(byline);
        }
    }

    record.html = render_blocks(&blocks, options);
    record.blocks = blocks;
    tracing::info!("Processed '{}' ({} blocks)", record.title, record.blocks.len());
    record
}
