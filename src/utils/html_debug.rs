// src/utils/html_debug.rs
use crate::blocks::models::{Block, BlockKind};
use crate::render::{escape_html, render_block, RenderOptions};
use crate::utils::error::AppError;
use regex::Regex;

/// Legacy markup that drives segmentation decisions, highlighted in the source view.
pub const SOURCE_PATTERNS: [(&str, &str); 6] = [
    (r#"(?i)<div[^>]*class="[^"]*(?:wpb_row|vc_row|wp-block-columns)[^"]*"[^>]*>"#, "row"),
    (r#"(?i)<[a-z]+[^>]*class="[^"]*hot[_-]?spot[^"]*"[^>]*>"#, "hotspot"),
    (r"(?i)<hr[^>]*>", "divider"),
    (r"(?i)<(?:iframe|video)[^>]*>", "video"),
    (r"(?i)<h[1-6][^>]*>", "heading"),
    (r#"(?i)<div[^>]*class="[^"]*article-author[^"]*"[^>]*>"#, "byline"),
];

fn kind_color(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::FullWidth | BlockKind::OneUp => "#90EE90",
        BlockKind::TwoUp | BlockKind::ThreeUp | BlockKind::FourUp | BlockKind::FiveUp => "#ADD8E6",
        BlockKind::TwoByTwo | BlockKind::ThreeByTwo => "#87CEFA",
        BlockKind::Video => "#FFA500",
        BlockKind::RichText => "#FFFF00",
        BlockKind::Hotspot => "#FFC0CB",
        BlockKind::Divider => "#D3D3D3",
        BlockKind::AuthorByline => "#DDA0DD",
    }
}

fn pattern_color(kind: &str) -> &'static str {
    match kind {
        "row" => "#ADD8E6",
        "hotspot" => "#FFC0CB",
        "divider" => "#D3D3D3",
        "video" => "#FFA500",
        "heading" => "#FFFF00",
        _ => "#DDA0DD",
    }
}

/// Self-contained page listing each block with its kind and rendered markup,
/// colour-coded by block family.
pub fn block_report(blocks: &[Block], options: &RenderOptions) -> String {
    let mut report = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    report.push_str(".block { margin: 1em 0; padding: 0.5em; border-left: 6px solid; }\n");
    report.push_str(".block pre { white-space: pre-wrap; }\n");
    report.push_str("</style>\n</head>\n<body>\n");
    report.push_str(&format!("<h1>{} blocks</h1>\n", blocks.len()));

    for (index, block) in blocks.iter().enumerate() {
        let color = kind_color(block.kind);
        report.push_str(&format!(
            "<div class=\"block\" style=\"border-color: {color}; background-color: {color}22;\">\n"
        ));
        report.push_str(&format!(
            "<h2>#{} {} <small>({} images, {} links, column hint {})</small></h2>\n",
            index + 1,
            block.kind.label(),
            block.content.images.len(),
            block.content.links.len(),
            block.column_hint,
        ));
        report.push_str(&format!("<pre>{}</pre>\n", escape_html(&render_block(block, options))));
        report.push_str("</div>\n");
    }

    report.push_str("</body>\n</html>");
    report
}

/// Escaped copy of the legacy source with every segmentation-relevant tag highlighted.
pub fn annotate_source(html: &str, patterns: &[(&str, &str)]) -> Result<String, AppError> {
    let mut highlights = Vec::new();
    for (pattern, kind) in patterns {
        let re = Regex::new(pattern)
            .map_err(|e| AppError::Processing(format!("Invalid regex pattern '{}': {}", pattern, e)))?;
        highlights.extend(re.find_iter(html).map(|m| (m.start(), m.end(), *kind)));
    }
    highlights.sort_by_key(|h| h.0);

    let mut annotated = String::from("<pre>\n");
    let mut last_pos = 0;
    for (start, end, kind) in highlights {
        // Overlapping matches keep the first highlight.
        if start < last_pos {
            continue;
        }
        annotated.push_str(&escape_html(&html[last_pos..start]));
        annotated.push_str(&format!(
            "<mark style=\"background-color: {}\" title=\"{}\">{}</mark>",
            pattern_color(kind),
            kind,
            escape_html(&html[start..end])
        ));
        last_pos = end;
    }
    annotated.push_str(&escape_html(&html[last_pos..]));
    annotated.push_str("\n</pre>");
    Ok(annotated)
}

/// Block report followed by the annotated legacy source.
pub fn debug_report(source_html: &str, blocks: &[Block], options: &RenderOptions) -> Result<String, AppError> {
    let mut report = block_report(blocks, options);
    let source = annotate_source(source_html, &SOURCE_PATTERNS)?;
    if let Some(pos) = report.rfind("</body>") {
        report.insert_str(pos, &format!("<h1>Source</h1>\n{source}\n"));
    }
    Ok(report)
}
