// src/blocks/models.rs
use serde::Serialize;
use std::fmt;

/// Fallback line colour for dividers without a usable source colour.
pub const DEFAULT_DIVIDER_COLOR: &str = "#191c1f";

/// Largest image count any grid block can hold (the 3x2 grid).
pub const MAX_GRID_IMAGES: usize = 6;

/// A percentage of the source image's rendered box, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Percent(f64);

impl Percent {
    /// Builds a percentage, clamping into range. NaN collapses to zero.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Percent(0.0);
        }
        Percent(value.clamp(0.0, 100.0))
    }

    /// Parses CSS-ish values such as `"25%"`, `" 12.5 % "` or `"40"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        number.parse::<f64>().ok().map(Percent::clamped)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A CSS colour value carried on divider blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Color(String);

impl Color {
    pub fn new(raw: impl Into<String>) -> Self {
        Color(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color(DEFAULT_DIVIDER_COLOR.to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub text: String,
    pub html: String,
    /// Rendered as `<blockquote>` instead of `<p>`.
    pub blockquote: bool,
}

impl Paragraph {
    pub fn plain(text: impl Into<String>, html: impl Into<String>) -> Self {
        Paragraph { text: text.into(), html: html.into(), blockquote: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListBlock {
    pub ordered: bool,
    /// Inner markup of each `<li>`, inline formatting preserved.
    pub items: Vec<String>,
}

/// Legacy WordPress size class carried on `<img>` (`attachment-full`, `size-medium`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachmentHint {
    Full,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    pub caption: String,
    pub attachment: Option<AttachmentHint>,
    /// Product shot meant to blend into the page background.
    pub blend: bool,
}

impl ImageRef {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        ImageRef {
            src: src.into(),
            alt: alt.into(),
            caption: String::new(),
            attachment: None,
            blend: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LinkRef {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRef {
    pub src: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotspotItem {
    /// `None` until a destination is found; rendered as `#`.
    pub href: Option<String>,
    pub left: Percent,
    pub top: Percent,
    pub marker_label: String,
    pub tooltip_label: String,
}

impl HotspotItem {
    /// Text shown next to the numbered badge.
    pub fn label(&self) -> &str {
        if self.tooltip_label.is_empty() {
            &self.marker_label
        } else {
            &self.tooltip_label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotspotGroup {
    pub image: ImageRef,
    pub items: Vec<HotspotItem>,
}

/// One piece of extracted article content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentFragment {
    Heading(Heading),
    Paragraph(Paragraph),
    List(ListBlock),
    Image(ImageRef),
    Link(LinkRef),
    Video(VideoRef),
    Hotspot(HotspotGroup),
}

/// The closed block taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    FullWidth,
    OneUp,
    TwoUp,
    ThreeUp,
    FourUp,
    FiveUp,
    TwoByTwo,
    ThreeByTwo,
    Video,
    RichText,
    Hotspot,
    Divider,
    AuthorByline,
}

impl BlockKind {
    pub const ALL: [BlockKind; 13] = [
        BlockKind::FullWidth,
        BlockKind::OneUp,
        BlockKind::TwoUp,
        BlockKind::ThreeUp,
        BlockKind::FourUp,
        BlockKind::FiveUp,
        BlockKind::TwoByTwo,
        BlockKind::ThreeByTwo,
        BlockKind::Video,
        BlockKind::RichText,
        BlockKind::Hotspot,
        BlockKind::Divider,
        BlockKind::AuthorByline,
    ];

    /// BEM block name used as the class prefix of every rendered element.
    pub fn prefix(self) -> &'static str {
        match self {
            BlockKind::FullWidth => "blog__full-width",
            BlockKind::OneUp => "blog__one-up",
            BlockKind::TwoUp => "blog__two-up",
            BlockKind::ThreeUp => "blog__three-up",
            BlockKind::FourUp => "blog__four-up",
            BlockKind::FiveUp => "blog__five-up",
            BlockKind::TwoByTwo => "blog__two-by-two",
            BlockKind::ThreeByTwo => "blog__three-by-two",
            BlockKind::Video => "blog__video",
            BlockKind::RichText => "blog__rich-text",
            BlockKind::Hotspot => "blog__hotspot",
            BlockKind::Divider => "blog__divider",
            BlockKind::AuthorByline => "blog__author-byline",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        BlockKind::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }

    pub fn label(self) -> &'static str {
        match self {
            BlockKind::FullWidth => "Full Width",
            BlockKind::OneUp => "1-Up",
            BlockKind::TwoUp => "2-Up",
            BlockKind::ThreeUp => "3-Up",
            BlockKind::FourUp => "4-Up",
            BlockKind::FiveUp => "5-Up",
            BlockKind::TwoByTwo => "2 x 2",
            BlockKind::ThreeByTwo => "3 x 2",
            BlockKind::Video => "Video",
            BlockKind::RichText => "Rich Text",
            BlockKind::Hotspot => "Hotspot",
            BlockKind::Divider => "Divider",
            BlockKind::AuthorByline => "Author Byline",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of accumulated content, the payload of a finished block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockContent {
    /// Section title, rendered as the block heading.
    pub heading: Option<Heading>,
    /// Paragraphs, lists and sub-headings in document order.
    pub body: Vec<ContentFragment>,
    pub images: Vec<ImageRef>,
    pub links: Vec<LinkRef>,
    pub videos: Vec<VideoRef>,
    pub hotspots: Vec<HotspotGroup>,
}

impl BlockContent {
    pub fn is_empty(&self) -> bool {
        self.heading.is_none()
            && self.body.is_empty()
            && self.images.is_empty()
            && self.links.is_empty()
            && self.videos.is_empty()
            && self.hotspots.is_empty()
    }

    /// Routes a fragment into the matching collection. A heading becomes the
    /// section title only while no title or body text exists yet, so it can
    /// never render above text that preceded it.
    pub fn push(&mut self, fragment: ContentFragment) {
        match fragment {
            ContentFragment::Heading(heading) => {
                if self.heading.is_none() && self.body.is_empty() {
                    self.heading = Some(heading);
                } else {
                    self.push_subheading(heading);
                }
            }
            ContentFragment::Paragraph(_) | ContentFragment::List(_) => self.body.push(fragment),
            ContentFragment::Image(image) => self.images.push(image),
            ContentFragment::Link(link) => self.links.push(link),
            ContentFragment::Video(video) => self.videos.push(video),
            ContentFragment::Hotspot(group) => self.hotspots.push(group),
        }
    }

    /// Appends a heading to the body, in document order.
    pub fn push_subheading(&mut self, heading: Heading) {
        self.body.push(ContentFragment::Heading(heading));
    }

    pub fn paragraph_count(&self) -> usize {
        self.body
            .iter()
            .filter(|f| matches!(f, ContentFragment::Paragraph(_)))
            .count()
    }

    pub fn lists(&self) -> impl Iterator<Item = &ListBlock> {
        self.body.iter().filter_map(|f| match f {
            ContentFragment::List(list) => Some(list),
            _ => None,
        })
    }

    pub fn has_heading(&self) -> bool {
        self.heading.is_some() || self.body.iter().any(|f| matches!(f, ContentFragment::Heading(_)))
    }

    /// Paragraphs or lists present.
    pub fn has_body(&self) -> bool {
        self.body
            .iter()
            .any(|f| matches!(f, ContentFragment::Paragraph(_) | ContentFragment::List(_)))
    }

    /// Removes the first body list equal to `list`. Returns whether one was found.
    pub fn remove_list(&mut self, list: &ListBlock) -> bool {
        let position = self
            .body
            .iter()
            .position(|f| matches!(f, ContentFragment::List(l) if l == list));
        match position {
            Some(index) => {
                self.body.remove(index);
                true
            }
            None => false,
        }
    }
}

/// One classified, renderable unit of article content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    pub content: BlockContent,
    /// Column count inferred from the source layout, 0 when unknown.
    pub column_hint: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divider_color: Option<Color>,
}

impl Block {
    pub fn new(kind: BlockKind, content: BlockContent) -> Self {
        Block { kind, content, column_hint: 0, divider_color: None }
    }

    pub fn divider(color: Option<Color>) -> Self {
        Block {
            kind: BlockKind::Divider,
            content: BlockContent::default(),
            column_hint: 0,
            divider_color: Some(color.unwrap_or_default()),
        }
    }

    /// Byline block; each line becomes a paragraph (name first, then titles).
    pub fn author_byline(lines: Vec<String>) -> Self {
        let mut content = BlockContent::default();
        for line in lines {
            content.push(ContentFragment::Paragraph(Paragraph::plain(line.clone(), line)));
        }
        Block::new(BlockKind::AuthorByline, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_parses_and_clamps() {
        assert_eq!(Percent::parse("25%").unwrap().value(), 25.0);
        assert_eq!(Percent::parse(" 12.5 % ").unwrap().value(), 12.5);
        assert_eq!(Percent::parse("140%").unwrap().value(), 100.0);
        assert_eq!(Percent::parse("-3%").unwrap().value(), 0.0);
        assert!(Percent::parse("left").is_none());
        assert_eq!(Percent::clamped(f64::NAN).value(), 0.0);
        assert_eq!(Percent::clamped(33.5).to_string(), "33.5%");
        assert_eq!(Percent::clamped(40.0).to_string(), "40%");
    }

    #[test]
    fn prefixes_round_trip() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_prefix(kind.prefix()), Some(kind));
        }
        assert_eq!(BlockKind::from_prefix("blog__unknown"), None);
    }

    #[test]
    fn push_routes_first_heading_to_title() {
        let mut content = BlockContent::default();
        let heading = |level: u8, text: &str| Heading { level, text: text.into(), html: text.into() };
        content.push(ContentFragment::Heading(heading(2, "Title")));
        content.push(ContentFragment::Paragraph(Paragraph::plain("Body", "Body")));
        content.push(ContentFragment::Heading(heading(3, "Sub")));

        assert_eq!(content.heading.as_ref().unwrap().text, "Title");
        assert_eq!(content.body.len(), 2);
        assert!(content.has_heading());
        assert!(content.has_body());
        assert_eq!(content.paragraph_count(), 1);
    }

    #[test]
    fn heading_after_body_text_stays_in_place() {
        let mut content = BlockContent::default();
        let heading = |text: &str| Heading { level: 3, text: text.into(), html: text.into() };
        content.push(ContentFragment::Paragraph(Paragraph::plain("One", "One")));
        content.push(ContentFragment::Heading(heading("Late")));
        content.push_subheading(heading("Sub"));

        assert!(content.heading.is_none());
        assert!(matches!(&content.body[1], ContentFragment::Heading(h) if h.text == "Late"));
        assert!(matches!(&content.body[2], ContentFragment::Heading(h) if h.text == "Sub"));
        assert!(content.has_heading());
    }

    #[test]
    fn remove_list_only_removes_matching_list() {
        let mut content = BlockContent::default();
        let list = ListBlock { ordered: true, items: vec!["a".into()] };
        let other = ListBlock { ordered: false, items: vec!["b".into()] };
        content.push(ContentFragment::List(other.clone()));
        content.push(ContentFragment::List(list.clone()));

        assert!(content.remove_list(&list));
        assert!(!content.remove_list(&list));
        assert_eq!(content.lists().next(), Some(&other));
    }

    #[test]
    fn divider_defaults_colour() {
        let block = Block::divider(None);
        assert_eq!(block.divider_color.unwrap().as_str(), DEFAULT_DIVIDER_COLOR);
        assert!(block.content.is_empty());
    }
}
