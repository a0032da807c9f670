// src/extractors/segmenter.rs
use crate::blocks::classifier::classify;
use crate::blocks::models::{Block, BlockContent, BlockKind, ContentFragment, Heading, ImageRef, LinkRef, ListBlock};
use crate::extractors::accumulator::{transition, Accumulator, SegmentState, Signal};
use crate::extractors::canonical::{canonical_kind, decode_canonical};
use crate::extractors::headings::{HeadingRemapper, RemappedHeading};
use crate::extractors::hotspots::{
    associate_links, hotspot_group, is_hotspot_container, nearest_link_list, needs_links,
    ordered_link_list,
};
use crate::extractors::primitives::{
    all_images, blockquote, button_links, byline_lines, class_attr, class_contains, clean_text,
    contains_media, divider_color, find_video, heading, image_ref, is_button_link, link_ref,
    list_block, list_links, paragraph, paragraph_or_cta, tag_name, video_ref,
};
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

// --- CSS Selectors (Lazy Static) ---
static CONTENT_ROOT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [".entry-content", ".post-content", "article .content", "article"]
        .iter()
        .map(|css| Selector::parse(css).expect("Failed to compile CONTENT_ROOT_SELECTORS"))
        .collect()
});

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to compile BODY_SELECTOR"));

static WRAPPER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".wpb_wrapper").expect("Failed to compile WRAPPER_SELECTOR"));

static NESTED_LAYOUT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".wpb_row, .wpb_text_column").expect("Failed to compile NESTED_LAYOUT_SELECTOR")
});

static BYLINE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[class*='article-author']").expect("Failed to compile BYLINE_SELECTOR")
});

static HOTSPOT_SCAN_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("Failed to compile HOTSPOT_SCAN_SELECTOR"));

// --- Regex Patterns (Lazy Static) ---
static COLUMN_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:medium|vc_col-sm)-(\d+)").expect("Failed to compile COLUMN_SPAN_RE")
});

static GALLERY_COLUMNS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"columns-(\d+)").expect("Failed to compile GALLERY_COLUMNS_RE"));

const ROW_CLASSES: [&str; 3] = ["wpb_row", "vc_row", "wp-block-columns"];
const COLUMN_CLASSES: [&str; 3] = ["wpb_column", "vc_column_container", "wp-block-column"];
const FULL_SPAN_CLASSES: [&str; 2] = ["medium-12", "vc_col-sm-12"];
const BYLINE_CLASS: &str = "article-author";
const INLINE_TEXT_TAGS: [&str; 8] = ["span", "strong", "em", "b", "i", "u", "small", "font"];

fn is_row(el: &ElementRef<'_>) -> bool {
    ROW_CLASSES.iter().any(|class| class_contains(el, class))
}

fn is_column(el: &ElementRef<'_>) -> bool {
    // `wp-block-columns` is the row, not a column.
    let class = class_attr(el);
    COLUMN_CLASSES.iter().any(|needle| {
        class
            .split_whitespace()
            .any(|c| c.contains(needle) && c != "wp-block-columns")
    })
}

/// Outermost columns of `row`, skipping columns nested in other columns.
fn top_level_columns<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(is_column)
        .filter(|col| {
            !col.ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|ancestor| ancestor.id() != row.id())
                .any(|ancestor| is_column(&ancestor))
        })
        .collect()
}

/// Column count intended by the row's layout classes, 0 when unknown.
/// A fractional span (`medium-4`, `vc_col-sm-6`) wins over the literal count.
pub fn column_hint(row: &ElementRef<'_>) -> u8 {
    let columns = top_level_columns(row);
    if columns.len() <= 1 {
        return 0;
    }
    let span = COLUMN_SPAN_RE
        .captures(class_attr(&columns[0]))
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|span| (1..=12).contains(span));

    let hint = match span {
        Some(span) => (12.0 / span as f64).round() as usize,
        None => columns.len(),
    };
    hint.min(u8::MAX as usize) as u8
}

/// Inner wrapper of a single full-span column that nests further rows or
/// text columns; such rows are layout scaffolding, not content.
fn full_width_wrapper<'a>(row: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    if class_contains(row, "vc_inner") || !(class_contains(row, "wpb_row") || class_contains(row, "vc_row")) {
        return None;
    }
    let columns: Vec<ElementRef<'a>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| class_contains(child, "wpb_column") || class_contains(child, "vc_column_container"))
        .collect();
    if columns.len() != 1 {
        return None;
    }
    let column = columns[0];
    if !FULL_SPAN_CLASSES.iter().any(|class| class_contains(&column, class)) {
        return None;
    }
    column
        .select(&WRAPPER_SELECTOR)
        .next()
        .filter(|wrapper| wrapper.select(&NESTED_LAYOUT_SELECTOR).next().is_some())
}

fn gallery_columns(el: &ElementRef<'_>) -> u8 {
    GALLERY_COLUMNS_RE
        .captures(class_attr(el))
        .and_then(|caps| caps[1].parse::<u8>().ok())
        .unwrap_or(0)
}

fn is_gallery(el: &ElementRef<'_>) -> bool {
    class_contains(el, "wp-block-gallery") || class_contains(el, "gallery")
}

/// Outermost hotspot containers under (or equal to) `el`.
fn hotspot_containers<'a>(el: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    if is_hotspot_container(el) {
        return vec![*el];
    }
    let mut found: Vec<ElementRef<'a>> = Vec::new();
    for candidate in el.select(&HOTSPOT_SCAN_SELECTOR) {
        let nested = found
            .iter()
            .any(|outer| candidate.ancestors().any(|a| a.id() == outer.id()));
        if !nested && is_hotspot_container(&candidate) {
            found.push(candidate);
        }
    }
    found
}

/// Only content-bearing blocks take trailing buttons.
fn accepts_ctas(kind: BlockKind) -> bool {
    !matches!(
        kind,
        BlockKind::Divider | BlockKind::AuthorByline | BlockKind::Video | BlockKind::Hotspot
    )
}

/// One sequential segmentation pass over an article.
pub struct Segmenter<'a> {
    acc: Accumulator,
    blocks: Vec<Block>,
    remapper: HeadingRemapper,
    /// Link lists already used as hotspot destinations.
    consumed: Vec<ElementRef<'a>>,
}

impl<'a> Segmenter<'a> {
    pub fn new(remapper: HeadingRemapper) -> Self {
        Self { acc: Accumulator::new(), blocks: Vec::new(), remapper, consumed: Vec::new() }
    }

    /// Flushes what is left and returns the blocks in document order.
    pub fn finish(mut self) -> Vec<Block> {
        let t = transition(self.acc.state(), Signal::EndOfInput, self.acc.shape());
        if t.flush_first {
            self.flush();
        }
        self.blocks
    }

    fn flush(&mut self) {
        if let Some(block) = self.acc.take_block() {
            tracing::debug!("Emitting {} block #{}", block.kind, self.blocks.len() + 1);
            self.blocks.push(block);
        }
    }

    fn is_consumed(&self, el: &ElementRef<'_>) -> bool {
        self.consumed.iter().any(|list| list.id() == el.id())
    }

    /// Feeds the element children of `parent` through the boundary rules.
    pub fn feed_children(&mut self, parent: &ElementRef<'a>) {
        let siblings: Vec<ElementRef<'a>> = parent.children().filter_map(ElementRef::wrap).collect();
        for index in 0..siblings.len() {
            self.feed(&siblings, index);
        }
    }

    fn feed(&mut self, siblings: &[ElementRef<'a>], index: usize) {
        let el = siblings[index];
        if self.is_consumed(&el) {
            tracing::debug!("Skipping link list consumed by a hotspot");
            return;
        }

        if canonical_kind(&el).is_some() {
            self.emit_hard(decode_canonical(&el));
            return;
        }

        let tag = tag_name(&el);
        if tag == "hr" {
            self.emit_hard(Some(Block::divider(Some(divider_color(&el)))));
            return;
        }
        if matches!(tag, "script" | "style" | "noscript" | "template") {
            return;
        }
        let has_media = matches!(tag, "img" | "iframe" | "video")
            || contains_media(&el)
            || !all_images(&el).is_empty();
        if clean_text(&el).is_empty() && !has_media {
            return;
        }

        if class_contains(&el, BYLINE_CLASS) {
            let lines = byline_lines(&el);
            if !lines.is_empty() {
                tracing::debug!("Author byline with {} lines", lines.len());
                self.emit_hard(Some(Block::author_byline(lines)));
            }
            return;
        }

        match tag {
            "iframe" | "video" => self.emit_video(&el),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if let Some(h) = heading(&el) {
                    self.apply_heading(h);
                }
            }
            "p" => self.feed_paragraph(&el),
            "ul" | "ol" => {
                if let Some(list) = list_block(&el) {
                    self.apply_text(ContentFragment::List(list));
                }
            }
            "img" => {
                if let Some(image) = image_ref(&el) {
                    self.apply_image(image);
                }
            }
            "blockquote" => {
                if let Some(quote) = blockquote(&el) {
                    self.apply_text(ContentFragment::Paragraph(quote));
                }
            }
            "a" => {
                for image in all_images(&el) {
                    self.apply_image(image);
                }
                if let Some(link) = link_ref(&el) {
                    self.apply_text(ContentFragment::Link(link));
                }
            }
            "figure" => self.feed_figure(&el),
            t if INLINE_TEXT_TAGS.contains(&t) => {
                if let Some(p) = paragraph(&el) {
                    self.apply_text(ContentFragment::Paragraph(p));
                }
            }
            _ => self.feed_container(siblings, index),
        }
    }

    fn feed_container(&mut self, siblings: &[ElementRef<'a>], index: usize) {
        let el = siblings[index];

        if let Some(wrapper) = full_width_wrapper(&el) {
            tracing::debug!("Unwrapping full-width layout row");
            let t = transition(self.acc.state(), Signal::HardBoundary, self.acc.shape());
            if t.flush_first {
                self.flush();
            }
            self.feed_children(&wrapper);
            return;
        }
        if el.select(&BYLINE_SELECTOR).next().is_some() {
            // Bylines stand alone, so a layout holding one is walked child by child.
            tracing::debug!("Descending into layout that holds an author byline");
            self.feed_children(&el);
            return;
        }
        if !hotspot_containers(&el).is_empty() {
            self.feed_hotspot_row(siblings, index);
            return;
        }
        if is_row(&el) {
            self.feed_row(&el);
            return;
        }
        if is_gallery(&el) && !all_images(&el).is_empty() {
            self.feed_gallery(&el);
            return;
        }
        if class_contains(&el, "wp-block-buttons") || class_contains(&el, "wp-block-button") {
            let links = button_links(&el);
            if !links.is_empty() {
                self.attach_ctas(links);
            }
            return;
        }
        if class_contains(&el, "wp-block-image") {
            self.feed_figure(&el);
            return;
        }
        if class_contains(&el, "wp-block-video") || class_contains(&el, "wp-block-embed") {
            if find_video(&el).is_some() {
                self.emit_video(&el);
                return;
            }
        }
        // Generic wrapper: its children are content in their own right.
        self.feed_children(&el);
    }

    fn feed_paragraph(&mut self, p: &ElementRef<'a>) {
        let images = all_images(p);
        if images.is_empty() {
            match paragraph_or_cta(p) {
                Some(ContentFragment::Link(link)) => self.attach_ctas(vec![link]),
                Some(fragment) => self.apply_text(fragment),
                None => {}
            }
            return;
        }

        let text = clean_text(p);
        let single = images.len() == 1;
        for mut image in images {
            if single && image.caption.is_empty() && !text.is_empty() {
                image.caption = text.clone();
            }
            self.apply_image(image);
        }
    }

    fn feed_figure(&mut self, figure: &ElementRef<'a>) {
        if contains_media(figure) {
            self.emit_video(figure);
            return;
        }
        let images = all_images(figure);
        if images.is_empty() {
            self.feed_children(figure);
            return;
        }
        for image in images {
            self.apply_image(image);
        }
    }

    fn feed_gallery(&mut self, gallery: &ElementRef<'a>) {
        let images = all_images(gallery);
        if images.len() == 1 {
            for image in images {
                self.apply_image(image);
            }
            return;
        }

        tracing::debug!("Gallery with {} images", images.len());
        let t = transition(self.acc.state(), Signal::Gallery, self.acc.shape());
        if t.flush_first {
            self.flush();
        }
        for image in images {
            self.acc.push_image(image);
        }
        let hint = gallery_columns(gallery);
        if hint > 0 {
            self.acc.set_column_hint(hint);
        }
        self.acc.mark_boundary();
        self.flush();
    }

    fn feed_row(&mut self, row: &ElementRef<'a>) {
        let fragments = self.collect_fragments(row);
        if fragments.is_empty() {
            return;
        }
        let hint = column_hint(row);
        let count = |pred: fn(&ContentFragment) -> bool| fragments.iter().filter(|f| pred(f)).count();
        let images = count(|f| matches!(f, ContentFragment::Image(_)));
        let videos = count(|f| matches!(f, ContentFragment::Video(_)));
        let links = count(|f| matches!(f, ContentFragment::Link(_)));
        tracing::debug!(
            "Row: {} fragments, {} images, {} links, {} videos, column hint {}",
            fragments.len(),
            images,
            links,
            videos,
            hint
        );

        if images == 0 && videos == 0 {
            let (ctas, text): (Vec<_>, Vec<_>) =
                fragments.into_iter().partition(|f| matches!(f, ContentFragment::Link(_)));
            for fragment in text {
                self.apply_fragment(fragment);
            }
            let ctas: Vec<LinkRef> = ctas
                .into_iter()
                .filter_map(|f| match f {
                    ContentFragment::Link(link) => Some(link),
                    _ => None,
                })
                .collect();
            if !ctas.is_empty() {
                self.attach_ctas(ctas);
            }
            return;
        }

        self.emit_self_contained(fragments, hint);
    }

    /// Loads a row's content into a fresh block and emits it immediately.
    fn emit_self_contained(&mut self, fragments: Vec<ContentFragment>, hint: u8) {
        let t = transition(self.acc.state(), Signal::SelfContained, self.acc.shape());
        if t.flush_first {
            self.flush();
        }
        let mut content = BlockContent::default();
        for fragment in fragments {
            match fragment {
                ContentFragment::Heading(h) => match self.remapper.remap(h) {
                    RemappedHeading::LeadParagraph(p) => content.push(ContentFragment::Paragraph(p)),
                    RemappedHeading::Heading { heading, boundary: true } => {
                        content.push(ContentFragment::Heading(heading))
                    }
                    RemappedHeading::Heading { heading, boundary: false } => content.push_subheading(heading),
                },
                other => content.push(other),
            }
        }
        self.acc.load(content, hint);
        self.acc.mark_boundary();
        self.flush();
    }

    fn feed_hotspot_row(&mut self, siblings: &[ElementRef<'a>], index: usize) {
        let row = siblings[index];
        let mut groups = Vec::new();

        for container in hotspot_containers(&row) {
            let Some(mut group) = hotspot_group(&container) else { continue };
            if needs_links(&group) {
                // Same row first, then neighbouring rows.
                let found = ordered_link_list(&row)
                    .filter(|list| !self.is_consumed(list))
                    .map(|list| (index, list))
                    .or_else(|| {
                        nearest_link_list(siblings, index).filter(|(_, list)| !self.is_consumed(list))
                    });

                if let Some((list_index, list)) = found {
                    let links = list_links(&list);
                    let assigned = associate_links(&mut group.items, &links);
                    tracing::debug!("Associated {} hotspot links from sibling list", assigned);
                    self.consumed.push(list);
                    if list_index < index {
                        if let Some(list_block) = list_block(&list) {
                            self.retract_list(&list_block);
                        }
                    }
                }
            }
            groups.push(group);
        }

        // Text around the hotspot image stays with the surrounding content.
        for fragment in self.collect_fragments(&row) {
            self.apply_fragment(fragment);
        }

        for group in groups {
            self.emit_self_contained(vec![ContentFragment::Hotspot(group)], 0);
        }
    }

    /// Removes a list used as hotspot data from wherever it was already placed.
    fn retract_list(&mut self, list: &ListBlock) {
        if self.acc.content_mut().remove_list(list) {
            tracing::debug!("Removed consumed link list from open block");
            return;
        }
        let Some(position) = self
            .blocks
            .iter()
            .rposition(|block| block.content.lists().any(|l| l == list))
        else {
            return;
        };
        let block = &mut self.blocks[position];
        block.content.remove_list(list);
        if block.content.is_empty() {
            tracing::debug!("Retracted {} block whose only content was a hotspot link list", block.kind);
            self.blocks.remove(position);
        } else {
            block.kind = classify(&block.content, block.column_hint);
        }
    }

    /// Descendant fragments of a row in document order. Hotspot containers
    /// and consumed lists are skipped; buttons are de-duplicated.
    fn collect_fragments(&self, row: &ElementRef<'a>) -> Vec<ContentFragment> {
        let mut out = Vec::new();
        let mut seen_links = HashSet::new();
        for child in row.children().filter_map(ElementRef::wrap) {
            self.walk(&child, false, &mut out, &mut seen_links);
        }
        out
    }

    fn walk(
        &self,
        el: &ElementRef<'a>,
        inline: bool,
        out: &mut Vec<ContentFragment>,
        seen_links: &mut HashSet<LinkRef>,
    ) {
        if self.is_consumed(el) || is_hotspot_container(el) {
            return;
        }
        let tag = tag_name(el);
        match tag {
            "img" => {
                if let Some(image) = image_ref(el) {
                    out.push(ContentFragment::Image(image));
                }
                return;
            }
            "iframe" | "video" => {
                if let Some(video) = video_ref(el) {
                    out.push(ContentFragment::Video(video));
                }
                return;
            }
            "figcaption" | "script" | "style" | "noscript" | "hr" => return,
            "a" => {
                if is_button_link(el) {
                    if let Some(link) = link_ref(el) {
                        if seen_links.insert(link.clone()) {
                            out.push(ContentFragment::Link(link));
                        }
                    }
                }
            }
            "p" if !inline => {
                if let Some(ContentFragment::Paragraph(p)) = paragraph_or_cta(el) {
                    out.push(ContentFragment::Paragraph(p));
                }
            }
            "blockquote" if !inline => {
                if let Some(quote) = blockquote(el) {
                    out.push(ContentFragment::Paragraph(quote));
                }
            }
            "ul" | "ol" if !inline => {
                if let Some(list) = list_block(el) {
                    out.push(ContentFragment::List(list));
                }
            }
            _ if !inline => {
                if let Some(h) = heading(el) {
                    out.push(ContentFragment::Heading(h));
                    return;
                }
            }
            _ => {}
        }

        let inline = inline || matches!(tag, "p" | "blockquote" | "ul" | "ol" | "a");
        for child in el.children().filter_map(ElementRef::wrap) {
            self.walk(&child, inline, out, seen_links);
        }
    }

    fn apply_fragment(&mut self, fragment: ContentFragment) {
        match fragment {
            ContentFragment::Heading(h) => self.apply_heading(h),
            ContentFragment::Image(image) => self.apply_image(image),
            ContentFragment::Video(video) => {
                let mut content = BlockContent::default();
                content.videos.push(video);
                self.emit_hard(Some(Block::new(BlockKind::Video, content)));
            }
            ContentFragment::Hotspot(group) => {
                self.emit_self_contained(vec![ContentFragment::Hotspot(group)], 0)
            }
            text => self.apply_text(text),
        }
    }

    fn apply_text(&mut self, fragment: ContentFragment) {
        let t = transition(self.acc.state(), Signal::Text, self.acc.shape());
        if t.flush_first {
            self.flush();
        }
        self.acc.push(fragment);
    }

    fn apply_heading(&mut self, h: Heading) {
        match self.remapper.remap(h) {
            RemappedHeading::LeadParagraph(p) => self.apply_text(ContentFragment::Paragraph(p)),
            RemappedHeading::Heading { heading, boundary: true } => {
                let t = transition(self.acc.state(), Signal::BoundaryHeading, self.acc.shape());
                if t.flush_first {
                    self.flush();
                }
                self.acc.push(ContentFragment::Heading(heading));
            }
            RemappedHeading::Heading { heading, boundary: false } => {
                let t = transition(self.acc.state(), Signal::Text, self.acc.shape());
                if t.flush_first {
                    self.flush();
                }
                self.acc.push_subheading(heading);
            }
        }
    }

    fn apply_image(&mut self, image: ImageRef) {
        let t = transition(self.acc.state(), Signal::Image, self.acc.shape());
        if t.flush_first {
            self.flush();
        }
        self.acc.push_image(image);
        if t.next == SegmentState::BoundaryPending {
            tracing::debug!("Image cap reached, closing block");
            self.acc.mark_boundary();
        }
    }

    /// Buttons without images join the open block, or else the block they trail.
    fn attach_ctas(&mut self, links: Vec<LinkRef>) {
        let t = transition(self.acc.state(), Signal::CtaOnly, self.acc.shape());
        if t.flush_first {
            self.flush();
        }
        if t.next == SegmentState::Idle {
            if let Some(last) = self.blocks.last_mut().filter(|b| accepts_ctas(b.kind)) {
                last.content.links.extend(links);
                let kind = classify(&last.content, last.column_hint);
                tracing::debug!("Attached trailing buttons to previous {} block (now {})", last.kind, kind);
                last.kind = kind;
                return;
            }
        }
        for link in links {
            self.acc.push(ContentFragment::Link(link));
        }
    }

    fn emit_video(&mut self, el: &ElementRef<'_>) {
        let Some(video) = find_video(el) else {
            tracing::warn!("Embedded media without a usable source skipped");
            return;
        };
        let mut content = BlockContent::default();
        content.videos.push(video);
        self.emit_hard(Some(Block::new(BlockKind::Video, content)));
    }

    /// Flushes, then emits `block` on its own.
    fn emit_hard(&mut self, block: Option<Block>) {
        let t = transition(self.acc.state(), Signal::HardBoundary, self.acc.shape());
        if t.flush_first {
            self.flush();
        }
        if let Some(block) = block {
            tracing::debug!("Emitting standalone {} block", block.kind);
            self.blocks.push(block);
        }
    }
}

/// Segments the children of an already located content root.
pub fn segment_element(root: ElementRef<'_>) -> Vec<Block> {
    let remapper = HeadingRemapper::for_article(&root);
    tracing::debug!("Segmenting with {:?} section headings", remapper.style());
    let mut segmenter = Segmenter::new(remapper);
    segmenter.feed_children(&root);
    let blocks = segmenter.finish();
    tracing::info!("Segmented content into {} blocks", blocks.len());
    blocks
}

/// Content container of a parsed article page, by priority.
pub fn find_content_root(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_ROOT_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next())
}

/// Parses `html` and segments its content root (falling back to `<body>`).
pub fn segment_html(html: &str) -> Result<Vec<Block>, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::NoDocument);
    }
    let document = Html::parse_document(html);
    let root = find_content_root(&document)
        .or_else(|| document.select(&BODY_SELECTOR).next())
        .unwrap_or_else(|| document.root_element());
    Ok(segment_element(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::models::AttachmentHint;
    use crate::render::{render_blocks, RenderOptions};

    fn kinds(blocks: &[Block]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    fn segment(html: &str) -> Vec<Block> {
        segment_html(html).unwrap()
    }

    #[test]
    fn blank_input_is_an_error() {
        assert!(matches!(segment_html("  \n "), Err(ExtractError::NoDocument)));
        assert!(segment("<p></p>").is_empty());
    }

    #[test]
    fn opening_heading_then_text_then_full_image() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <h1>Welcome</h1>
                 <p>Some body text.</p>
                 <img class="attachment-full" src="/hero.jpg" alt="Hero">
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::RichText, BlockKind::FullWidth]);

        let intro = &blocks[0].content;
        assert!(intro.heading.is_none(), "opening heading never stays a heading");
        match &intro.body[0] {
            ContentFragment::Paragraph(p) => assert_eq!(p.html, "<strong>Welcome</strong>"),
            other => panic!("expected bold paragraph, got {other:?}"),
        }
        let hero = &blocks[1].content;
        assert_eq!(hero.images.len(), 1);
        assert_eq!(hero.images[0].attachment, Some(AttachmentHint::Full));
        assert!(hero.links.is_empty());
    }

    #[test]
    fn two_column_image_row_is_two_up() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <div class="vc_row wpb_row">
                   <div class="wpb_column vc_column_container medium-6"><div class="wpb_wrapper"><img src="/a.jpg"></div></div>
                   <div class="wpb_column vc_column_container medium-6"><div class="wpb_wrapper"><img src="/b.jpg"></div></div>
                 </div>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::TwoUp]);
        let content = &blocks[0].content;
        assert_eq!(content.images.len(), 2);
        assert!(content.heading.is_none());
        assert!(content.links.is_empty());
        assert_eq!(blocks[0].column_hint, 2);
    }

    #[test]
    fn hotspot_takes_links_from_following_list() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <div class="vc_row wpb_row">
                   <div class="hotspot-container">
                     <img src="/look.jpg" alt="Look">
                     <div class="hotspot" style="left: 20%; top: 30%;"><span class="hotspot-marker">1</span></div>
                     <div class="hotspot" style="left: 50%; top: 60%;"><span class="hotspot-marker">2</span></div>
                     <div class="hotspot" style="left: 80%; top: 90%;"><span class="hotspot-marker">3</span></div>
                   </div>
                 </div>
                 <ol>
                   <li><a href="/bag">Bag</a></li>
                   <li><a href="/shoes">Shoes</a></li>
                   <li><a href="/belt">Belt</a></li>
                 </ol>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::Hotspot]);
        let items = &blocks[0].content.hotspots[0].items;
        let hrefs: Vec<_> = items.iter().map(|i| i.href.as_deref().unwrap()).collect();
        assert_eq!(hrefs, vec!["/bag", "/shoes", "/belt"]);
        assert_eq!(items[1].label(), "Shoes");
    }

    #[test]
    fn hotspot_retracts_previous_list_block() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <p>Intro</p>
                 <hr>
                 <ol><li><a href="/one">One</a></li></ol>
                 <div class="hotspot-wrapper-row">
                   <div class="hot_spot_container"><img src="/look.jpg">
                     <a class="hotspot" style="left:10%;top:10%"></a>
                   </div>
                 </div>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::RichText, BlockKind::Divider, BlockKind::Hotspot]);
        assert_eq!(blocks[2].content.hotspots[0].items[0].href.as_deref(), Some("/one"));
    }

    #[test]
    fn six_images_make_one_three_by_two() {
        let html: String = (0..6).map(|i| format!(r#"<img src="/{i}.jpg">"#)).collect();
        let blocks = segment(&format!(r#"<div class="entry-content">{html}</div>"#));
        assert_eq!(kinds(&blocks), vec![BlockKind::ThreeByTwo]);
        assert_eq!(blocks[0].content.images.len(), 6);

        let html: String = (0..7).map(|i| format!(r#"<img src="/{i}.jpg">"#)).collect();
        let blocks = segment(&format!(r#"<div class="entry-content">{html}</div>"#));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content.images.len(), 6);
    }

    #[test]
    fn dividers_and_videos_are_standalone() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <h2>Lead</h2>
                 <p>Text</p>
                 <hr style="border-top: 2px dashed #aa0000">
                 <iframe src="https://youtu.be/abc" title="Clip"></iframe>
                 <p>After</p>
               </div>"#,
        );
        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::RichText, BlockKind::Divider, BlockKind::Video, BlockKind::RichText]
        );
        assert_eq!(blocks[1].divider_color.as_ref().unwrap().as_str(), "#aa0000");
        assert_eq!(blocks[2].content.videos[0].title, "Clip");
    }

    #[test]
    fn boundary_headings_split_and_subheadings_stay() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <h3>Opening</h3>
                 <p>One</p>
                 <h3>Section</h3>
                 <p>Two</p>
                 <h4>Detail</h4>
                 <p>Three</p>
               </div>"#,
        );
        assert_eq!(blocks.len(), 2);
        let section = &blocks[1].content;
        let title = section.heading.as_ref().unwrap();
        assert_eq!((title.level, title.text.as_str()), (2, "Section"));
        assert!(matches!(&section.body[1], ContentFragment::Heading(h) if h.level == 3 && h.text == "Detail"));
    }

    #[test]
    fn subheading_before_any_section_title_keeps_document_order() {
        let blocks = segment(
            r#"<div class="entry-content"><h3>Open</h3><p>One</p><h4>Detail</h4><p>Two</p></div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::RichText]);
        let content = &blocks[0].content;
        assert!(content.heading.is_none());
        assert!(matches!(&content.body[1], ContentFragment::Paragraph(p) if p.text == "One"));
        assert!(matches!(&content.body[2], ContentFragment::Heading(h) if h.level == 3 && h.text == "Detail"));

        let html = render_blocks(&blocks, &RenderOptions::default());
        let one = html.find("<p>One</p>").unwrap();
        let detail = html.find("<h3>Detail</h3>").unwrap();
        let two = html.find("<p>Two</p>").unwrap();
        assert!(one < detail && detail < two);
    }

    #[test]
    fn cta_row_attaches_to_previous_block() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <div class="wpb_row"><div class="wpb_column"><img src="/a.jpg"></div><div class="wpb_column"><img src="/b.jpg"></div></div>
                 <div class="wpb_row"><a class="vc_btn3" href="/shop-a">Shop A</a><a class="vc_btn3" href="/shop-b">Shop B</a></div>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::TwoUp]);
        assert_eq!(blocks[0].content.links.len(), 2);
    }

    #[test]
    fn text_only_rows_merge_into_open_block() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <p>Before</p>
                 <div class="vc_row"><div class="wpb_column"><p>Inside row</p><ul><li>item</li></ul></div></div>
                 <p>After</p>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::RichText]);
        assert_eq!(blocks[0].content.body.len(), 4);
    }

    #[test]
    fn full_width_wrapper_is_unwrapped() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <div class="vc_row wpb_row">
                   <div class="wpb_column vc_column_container vc_col-sm-12"><div class="vc_column-inner"><div class="wpb_wrapper">
                     <div class="wpb_text_column"><div class="wpb_wrapper"><p>Wrapped text</p></div></div>
                     <div class="vc_row wpb_row vc_inner">
                       <div class="wpb_column vc_col-sm-4"><img src="/1.jpg"></div>
                       <div class="wpb_column vc_col-sm-4"><img src="/2.jpg"></div>
                       <div class="wpb_column vc_col-sm-4"><img src="/3.jpg"></div>
                     </div>
                   </div></div></div>
                 </div>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::RichText, BlockKind::ThreeUp]);
        assert_eq!(blocks[1].column_hint, 3);
    }

    #[test]
    fn gallery_flushes_pending_images_only() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <img src="/solo.jpg">
                 <div class="wp-block-gallery columns-2"><img src="/g1.jpg"><img src="/g2.jpg"></div>
                 <div class="wp-block-gallery"><img src="/single.jpg"></div>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::FullWidth, BlockKind::TwoUp, BlockKind::FullWidth]);
        assert_eq!(blocks[1].column_hint, 2);
    }

    #[test]
    fn author_byline_is_standalone() {
        let blocks = segment(
            r#"<div class="entry-content"><p>Text</p><div class="article-author">By: Jane Doe<br>Editor</div></div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::RichText, BlockKind::AuthorByline]);
    }

    #[test]
    fn author_byline_inside_layout_row_is_standalone() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <p>Body</p>
                 <div class="vc_row wpb_row"><div class="wpb_column medium-12"><div class="article-author">By: Jane Doe<br>Editor</div></div></div>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::RichText, BlockKind::AuthorByline]);
        let lines: Vec<&str> = blocks[1]
            .content
            .body
            .iter()
            .filter_map(|f| match f {
                ContentFragment::Paragraph(p) => Some(p.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["By: Jane Doe", "Editor"]);
    }

    #[test]
    fn button_after_divider_opens_a_new_block() {
        let blocks = segment(
            r#"<div class="entry-content">
                 <p>Intro</p>
                 <hr>
                 <p><a class="btn" href="/shop">Shop now</a></p>
                 <p>More</p>
               </div>"#,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::RichText, BlockKind::Divider, BlockKind::RichText]);
        assert!(blocks[1].content.links.is_empty());
        let tail = &blocks[2].content;
        assert_eq!(tail.links.len(), 1);
        assert_eq!(tail.links[0].href, "/shop");
        assert_eq!(tail.paragraph_count(), 1);
    }

    #[test]
    fn column_hint_inference() {
        let doc = Html::parse_fragment(
            r#"<div id="a" class="wpb_row"><div class="wpb_column medium-4"></div><div class="wpb_column medium-8"></div></div>
               <div id="b" class="wp-block-columns"><div class="wp-block-column"></div><div class="wp-block-column"></div><div class="wp-block-column"></div><div class="wp-block-column"></div></div>
               <div id="c" class="wpb_row"><div class="wpb_column medium-12"></div></div>"#,
        );
        let by_id = |id: &str| doc.select(&Selector::parse(&format!("#{id}")).unwrap()).next().unwrap();
        assert_eq!(column_hint(&by_id("a")), 3);
        assert_eq!(column_hint(&by_id("b")), 4);
        assert_eq!(column_hint(&by_id("c")), 0);
    }

    #[test]
    fn render_of_segmented_output_is_a_fixed_point() {
        let legacy = r#"<div class="entry-content">
             <h1>Spring Edit</h1>
             <p>Our <b>favourite</b> picks, see <a href="https://blog.fashionphile.com/spring/">more</a>.</p>
             <h3>Bags</h3>
             <div class="vc_row wpb_row">
               <div class="wpb_column medium-6"><figure><img src="/a.jpg" alt="A"><figcaption>Tote</figcaption></figure></div>
               <div class="wpb_column medium-6"><img class="mix" style="mix-blend-mode: multiply" src="/b.jpg" alt="B"></div>
             </div>
             <div class="vc_row"><a class="btn" href="/shop/a">Shop A</a><a class="btn" href="https://example.com/b">Shop B</a></div>
             <hr style="border-top: 1px solid #c4a484">
             <p><img class="attachment-medium" src="/c.jpg"></p>
             <p><a class="button" href="/login">Sign in</a></p>
             <iframe src="https://www.youtube.com/watch?v=xyz"></iframe>
             <div class="vc_row">
               <div class="hotspot-container"><img src="/look.jpg">
                 <div class="hotspot" style="left: 12.5%; top: 40%;"><div class="hotspot-tooltip">Bag</div></div>
               </div>
             </div>
             <ol><li><a href="/bag">Bag</a></li></ol>
             <div class="article-author">By: Jane Doe<br>Editor</div>
           </div>"#;

        let options = RenderOptions::default();
        let first = render_blocks(&segment(legacy), &options);
        let second = render_blocks(&segment(&first), &options);
        assert_eq!(first, second);
        assert!(first.contains("blog__two-up"));
        assert!(first.contains("blog__hotspot--1-link"));
        assert!(first.contains(r#"href="/pages/sign-in""#));
    }
}
