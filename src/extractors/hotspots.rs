// src/extractors/hotspots.rs
use crate::blocks::models::{HotspotGroup, HotspotItem, LinkRef, Percent};
use crate::extractors::primitives::{
    class_attr, clean_text, first_image, list_links, parse_style, tag_name,
};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

/// How many sibling rows on each side are searched for a link list.
pub const LIST_SEARCH_WINDOW: usize = 2;

static HOTSPOT_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)hot[_-]?spot").expect("Failed to compile HOTSPOT_CLASS_RE"));

// Nested wrappers and tooltip parts that carry the hotspot word but are not markers.
static HOTSPOT_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)hot[_-]?spots?[_-]?(?:container|wrapper|content|inner|tooltip|image|img|title|text|label|marker|pin|icon)")
        .expect("Failed to compile HOTSPOT_PART_RE")
});

static MARKER_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)marker|pin|number|icon|dot").expect("Failed to compile MARKER_PART_RE"));

static TOOLTIP_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)content|tooltip|title|label|text").expect("Failed to compile TOOLTIP_PART_RE")
});

static ALL_ELEMENTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("Failed to compile ALL_ELEMENTS"));

static ORDERED_LIST_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ol").expect("Failed to compile ORDERED_LIST_SELECTOR"));

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Failed to compile ANCHOR_SELECTOR"));

fn percent_position(el: &ElementRef<'_>) -> Option<(Percent, Percent)> {
    let style = el.value().attr("style")?;
    let declarations = parse_style(style);
    let read = |name: &str| {
        declarations
            .iter()
            .find(|(prop, value)| prop == name && value.trim_end().ends_with('%'))
            .and_then(|(_, value)| Percent::parse(value))
    };
    Some((read("left")?, read("top")?))
}

/// A marker carries explicit left/top percentages and a hotspot-item class,
/// but not the class of a nested container or tooltip part.
pub fn is_hotspot_marker(el: &ElementRef<'_>) -> bool {
    let class = class_attr(el);
    HOTSPOT_CLASS_RE.is_match(class)
        && !HOTSPOT_PART_RE.is_match(class)
        && percent_position(el).is_some()
}

fn part_text(marker: &ElementRef<'_>, pattern: &Regex) -> Option<String> {
    marker
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| pattern.is_match(class_attr(el)))
        .map(|el| clean_text(&el))
        .filter(|text| !text.is_empty())
}

fn marker_href(marker: &ElementRef<'_>) -> Option<String> {
    let own = if tag_name(marker) == "a" { marker.value().attr("href") } else { None };
    own.or_else(|| marker.value().attr("data-href"))
        .or_else(|| marker.value().attr("data-link"))
        .map(str::to_string)
        .or_else(|| {
            marker
                .select(&ANCHOR_SELECTOR)
                .find_map(|a| a.value().attr("href").map(str::to_string))
        })
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty() && href != "#")
}

/// Positioned markers under `container`, in document order.
pub fn hotspot_markers(container: &ElementRef<'_>) -> Vec<HotspotItem> {
    container
        .select(&ALL_ELEMENTS)
        .filter(is_hotspot_marker)
        .filter_map(|marker| {
            let (left, top) = percent_position(&marker)?;
            let marker_label = part_text(&marker, &MARKER_PART_RE).unwrap_or_default();
            let tooltip_label = part_text(&marker, &TOOLTIP_PART_RE)
                .or_else(|| marker.value().attr("data-title").map(str::to_string))
                .or_else(|| marker.value().attr("title").map(str::to_string))
                .unwrap_or_default();
            Some(HotspotItem {
                href: marker_href(&marker),
                left,
                top,
                marker_label,
                tooltip_label: tooltip_label.trim().to_string(),
            })
        })
        .collect()
}

/// An element with the hotspot class family that holds an image and at
/// least one positioned marker, without being a marker itself.
pub fn is_hotspot_container(el: &ElementRef<'_>) -> bool {
    HOTSPOT_CLASS_RE.is_match(class_attr(el))
        && !is_hotspot_marker(el)
        && first_image(el).is_some()
        && el.select(&ALL_ELEMENTS).any(|child| is_hotspot_marker(&child))
}

pub fn find_hotspot_container<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    if is_hotspot_container(el) {
        return Some(*el);
    }
    el.select(&ALL_ELEMENTS).find(|child| is_hotspot_container(child))
}

/// Image plus markers of a container, `None` without an image.
pub fn hotspot_group(container: &ElementRef<'_>) -> Option<HotspotGroup> {
    let image = first_image(container)?;
    let items = hotspot_markers(container);
    if items.is_empty() {
        return None;
    }
    Some(HotspotGroup { image, items })
}

/// Zips list links onto items strictly by index. Returns the number of
/// items that received a destination.
pub fn associate_links(items: &mut [HotspotItem], links: &[LinkRef]) -> usize {
    let mut assigned = 0;
    for (item, link) in items.iter_mut().zip(links) {
        item.href = Some(link.href.clone());
        if item.tooltip_label.is_empty() {
            item.tooltip_label = link.text.clone();
        }
        assigned += 1;
    }
    assigned
}

pub fn needs_links(group: &HotspotGroup) -> bool {
    group.items.iter().any(|item| item.href.is_none())
}

/// The link-bearing ordered list in `el`, if any.
pub fn ordered_link_list<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    let has_links = |list: &ElementRef<'a>| !list_links(list).is_empty();
    if tag_name(el) == "ol" {
        return Some(*el).filter(has_links);
    }
    el.select(&ORDERED_LIST_SELECTOR)
        .filter(|list| !list.ancestors().filter_map(ElementRef::wrap).any(|a| is_hotspot_container(&a)))
        .find(has_links)
}

/// Nearest link list among the siblings of `siblings[index]`, searching
/// backward first, then forward, within [`LIST_SEARCH_WINDOW`].
pub fn nearest_link_list<'a>(
    siblings: &[ElementRef<'a>],
    index: usize,
) -> Option<(usize, ElementRef<'a>)> {
    let backward = (1..=LIST_SEARCH_WINDOW)
        .filter_map(|distance| index.checked_sub(distance));
    let forward = (1..=LIST_SEARCH_WINDOW)
        .map(|distance| index + distance)
        .filter(|&i| i < siblings.len());

    backward
        .chain(forward)
        .find_map(|i| ordered_link_list(&siblings[i]).map(|list| (i, list)))
}
