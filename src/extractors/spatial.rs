// src/extractors/spatial.rs

//! Interactive extraction: collects the leaf nodes whose rendered box centre
//! falls inside a user-drawn rectangle and bundles them into one block.
//! Layout itself is out of scope; boxes come from a [`GeometryProvider`].

use crate::blocks::classifier::classify;
use crate::blocks::models::{Block, BlockContent, ContentFragment};
use crate::extractors::hotspots::{associate_links, hotspot_group, is_hotspot_container, needs_links};
use crate::extractors::primitives::{
    blockquote, find_video, first_image, heading, image_ref, link_ref, list_block, list_links,
    paragraph_or_cta, tag_name, video_ref,
};
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::str::FromStr;

static LEAF_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p, img, a, ul, ol, iframe, video, figure, blockquote")
        .expect("Failed to compile LEAF_SELECTOR")
});

const BBOX_ATTR: &str = "data-bbox";

/// Axis-aligned rectangle in the preview's scroll coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, ExtractError> {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            return Err(ExtractError::InvalidRect(format!("non-finite value in {x},{y},{width},{height}")));
        }
        if width < 0.0 || height < 0.0 {
            return Err(ExtractError::InvalidRect(format!("negative size {width}x{height}")));
        }
        Ok(Self { x, y, width, height })
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive on all edges.
    pub fn contains_point(&self, (px, py): (f64, f64)) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

impl FromStr for Rect {
    type Err = ExtractError;

    /// Parses `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ExtractError::InvalidRect(format!("'{s}': {e}")))?;
        match values.as_slice() {
            [x, y, w, h] => Rect::new(*x, *y, *w, *h),
            _ => Err(ExtractError::InvalidRect(format!("'{s}': expected x,y,width,height"))),
        }
    }
}

/// Source of rendered boxes for document nodes.
pub trait GeometryProvider {
    fn bounding_box(&self, node: &ElementRef<'_>) -> Option<Rect>;
}

impl<F> GeometryProvider for F
where
    F: Fn(&ElementRef<'_>) -> Option<Rect>,
{
    fn bounding_box(&self, node: &ElementRef<'_>) -> Option<Rect> {
        self(node)
    }
}

/// Reads boxes a layout pass stamped onto the markup as `data-bbox="x,y,w,h"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeGeometry;

impl GeometryProvider for AttributeGeometry {
    fn bounding_box(&self, node: &ElementRef<'_>) -> Option<Rect> {
        node.value().attr(BBOX_ATTR)?.parse().ok()
    }
}

fn has_ancestor_tag(el: &ElementRef<'_>, tags: &[&str]) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| tags.contains(&tag_name(&a)))
}

/// Content of every leaf whose box centre lies in `rect`, in document order.
pub fn select_content(root: &ElementRef<'_>, rect: Rect, geometry: &impl GeometryProvider) -> BlockContent {
    let mut content = BlockContent::default();
    let mut headings = Vec::new();
    let mut picked = Vec::new();
    let mut ordered_lists = Vec::new();
    let mut hotspot_hosts = Vec::new();

    for el in root.select(&LEAF_SELECTOR) {
        let Some(bbox) = geometry.bounding_box(&el) else { continue };
        if !rect.contains_point(bbox.center()) {
            continue;
        }
        let tag = tag_name(&el);

        // Nested leaves are read through their selected ancestor.
        let inside_picked = el
            .ancestors()
            .any(|a| picked.iter().any(|p: &ElementRef<'_>| p.id() == a.id()));
        let media = matches!(tag, "img" | "iframe" | "video");
        if inside_picked && !(media && !has_ancestor_tag(&el, &["figure"])) {
            continue;
        }
        if tag == "a" && has_ancestor_tag(&el, &["p", "li"]) {
            continue;
        }
        picked.push(el);

        if let Some(host) = el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|a| is_hotspot_container(a))
        {
            if !hotspot_hosts.iter().any(|h: &ElementRef<'_>| h.id() == host.id()) {
                hotspot_hosts.push(host);
            }
            if media || tag == "figure" {
                continue;
            }
        }

        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => headings.extend(heading(&el)),
            "p" => {
                if let Some(fragment) = paragraph_or_cta(&el) {
                    content.push(fragment);
                }
            }
            "blockquote" => content.body.extend(blockquote(&el).map(ContentFragment::Paragraph)),
            "ul" | "ol" => {
                if let Some(list) = list_block(&el) {
                    if list.ordered {
                        ordered_lists.push((el, list.clone()));
                    }
                    content.push(ContentFragment::List(list));
                }
            }
            "img" => content.images.extend(image_ref(&el)),
            "iframe" | "video" => content.videos.extend(video_ref(&el)),
            "figure" => match find_video(&el) {
                Some(video) => content.videos.push(video),
                None => content.images.extend(first_image(&el)),
            },
            "a" => content.links.extend(link_ref(&el)),
            _ => {}
        }
    }

    // A level-2 title is preferred, then level 1, then the first one found.
    let title_index = headings
        .iter()
        .position(|h| h.level == 2)
        .or_else(|| headings.iter().position(|h| h.level == 1))
        .unwrap_or(0);
    if title_index < headings.len() {
        content.heading = Some(headings.remove(title_index));
        let mut body: Vec<ContentFragment> = headings.into_iter().map(ContentFragment::Heading).collect();
        body.append(&mut content.body);
        content.body = body;
    }

    for host in hotspot_hosts {
        let Some(mut group) = hotspot_group(&host) else { continue };
        if needs_links(&group) {
            if let Some(position) = ordered_lists
                .iter()
                .position(|(list, _)| !list_links(list).is_empty())
            {
                let (list, block) = ordered_lists.remove(position);
                associate_links(&mut group.items, &list_links(&list));
                content.remove_list(&block);
            }
        }
        content.hotspots.push(group);
    }

    content
}

/// One classified block from the nodes under `rect`, `None` when nothing was hit.
pub fn select_block(root: &ElementRef<'_>, rect: Rect, geometry: &impl GeometryProvider) -> Option<Block> {
    let content = select_content(root, rect, geometry);
    if content.is_empty() {
        tracing::debug!("Selection {:?} matched no content", rect);
        return None;
    }
    let kind = classify(&content, 0);
    tracing::debug!("Selection {:?} classified as {}", rect, kind);
    Some(Block::new(kind, content))
}
