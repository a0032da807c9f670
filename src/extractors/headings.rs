// src/extractors/headings.rs
use crate::blocks::models::{Heading, Paragraph};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

static H3_H4_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3, h4").expect("Failed to compile H3_H4_SELECTOR"));

/// Which legacy heading level an article uses for its section titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleHeadingStyle {
    H3Dominant,
    H4Dominant,
}

impl ArticleHeadingStyle {
    /// Counts h3 vs h4 under `root`. A tie favours `H3Dominant`.
    pub fn detect(root: &ElementRef<'_>) -> Self {
        let (h3, h4) = root
            .select(&H3_H4_SELECTOR)
            .fold((0usize, 0usize), |(h3, h4), el| match el.value().name() {
                "h3" => (h3 + 1, h4),
                _ => (h3, h4 + 1),
            });
        tracing::debug!("Heading census: {} h3, {} h4", h3, h4);
        if h4 > h3 {
            ArticleHeadingStyle::H4Dominant
        } else {
            ArticleHeadingStyle::H3Dominant
        }
    }

    /// Output level for an original level, and whether it starts a section.
    pub fn map_level(self, level: u8) -> (u8, bool) {
        match (self, level) {
            (_, 2) => (2, true),
            (ArticleHeadingStyle::H3Dominant, 3) => (2, true),
            (ArticleHeadingStyle::H3Dominant, 4) => (3, false),
            (ArticleHeadingStyle::H4Dominant, 3) => (3, false),
            (ArticleHeadingStyle::H4Dominant, 4) => (2, true),
            (_, 5) => (4, false),
            (_, other) => (other, false),
        }
    }
}

/// Result of passing one heading through the remapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemappedHeading {
    /// The article's opening heading, demoted to bold body text.
    LeadParagraph(Paragraph),
    Heading { heading: Heading, boundary: bool },
}

/// Article-wide heading policy. Owned by one segmentation run and threaded
/// through every recursive descent so the first-heading rule stays global.
#[derive(Debug, Clone)]
pub struct HeadingRemapper {
    style: ArticleHeadingStyle,
    first_heading_seen: bool,
}

impl HeadingRemapper {
    pub fn new(style: ArticleHeadingStyle) -> Self {
        Self { style, first_heading_seen: false }
    }

    pub fn for_article(root: &ElementRef<'_>) -> Self {
        Self::new(ArticleHeadingStyle::detect(root))
    }

    pub fn style(&self) -> ArticleHeadingStyle {
        self.style
    }

    pub fn remap(&mut self, heading: Heading) -> RemappedHeading {
        if !self.first_heading_seen {
            self.first_heading_seen = true;
            tracing::debug!("Demoting opening heading '{}' to bold paragraph", heading.text);
            return RemappedHeading::LeadParagraph(Paragraph::plain(
                heading.text,
                format!("<strong>{}</strong>", heading.html),
            ));
        }

        let (level, boundary) = self.style.map_level(heading.level);
        RemappedHeading::Heading {
            heading: Heading { level, ..heading },
            boundary,
        }
    }
}
