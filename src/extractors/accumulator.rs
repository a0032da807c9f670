// src/extractors/accumulator.rs
use crate::blocks::classifier::classify;
use crate::blocks::models::{Block, BlockContent, ContentFragment, Heading, ImageRef, MAX_GRID_IMAGES};

/// Where the segmenter stands between two input nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// Nothing accumulated.
    Idle,
    /// Content accumulated and still open for more.
    Accumulating,
    /// Accumulated content is complete and must be flushed before anything else.
    BoundaryPending,
}

/// What the next input node means for the open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Paragraph, list, sub-heading or link merged into the open block.
    Text,
    /// One standalone image.
    Image,
    /// A heading the remapper marks as a section boundary.
    BoundaryHeading,
    /// Divider or video: emitted on its own, never merged.
    HardBoundary,
    /// Multi-image gallery; flushes pending images only.
    Gallery,
    /// Row whose images/video make it a block of its own.
    SelfContained,
    /// Buttons with no images; attach to whatever is open.
    CtaOnly,
    EndOfInput,
}

/// Counts the transition function looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shape {
    pub images: usize,
    pub paragraphs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Flush the open block before applying the input.
    pub flush_first: bool,
    pub next: SegmentState,
}

/// Pure boundary decision for one input, given the current state and shape.
pub fn transition(state: SegmentState, signal: Signal, shape: Shape) -> Transition {
    let open = state != SegmentState::Idle;
    let pending = state == SegmentState::BoundaryPending;

    match signal {
        Signal::Text => Transition {
            flush_first: pending,
            next: SegmentState::Accumulating,
        },
        Signal::Image => {
            let flush_first = pending || shape.paragraphs > 0;
            let images_after = if flush_first { 1 } else { shape.images + 1 };
            Transition {
                flush_first,
                next: if images_after >= MAX_GRID_IMAGES {
                    SegmentState::BoundaryPending
                } else {
                    SegmentState::Accumulating
                },
            }
        }
        Signal::BoundaryHeading => Transition {
            flush_first: open,
            next: SegmentState::Accumulating,
        },
        Signal::HardBoundary | Signal::EndOfInput => Transition {
            flush_first: open,
            next: SegmentState::Idle,
        },
        Signal::Gallery => Transition {
            flush_first: pending || shape.images > 0,
            next: SegmentState::BoundaryPending,
        },
        Signal::SelfContained => Transition {
            flush_first: open,
            next: SegmentState::BoundaryPending,
        },
        Signal::CtaOnly => Transition {
            flush_first: pending,
            next: if open && !pending { SegmentState::Accumulating } else { SegmentState::Idle },
        },
    }
}

/// In-progress block content, owned by one segmentation pass.
#[derive(Debug, Default)]
pub struct Accumulator {
    content: BlockContent,
    column_hint: u8,
    pending_boundary: bool,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SegmentState {
        if self.content.is_empty() {
            SegmentState::Idle
        } else if self.pending_boundary {
            SegmentState::BoundaryPending
        } else {
            SegmentState::Accumulating
        }
    }

    pub fn shape(&self) -> Shape {
        Shape {
            images: self.content.images.len(),
            paragraphs: self.content.paragraph_count(),
        }
    }

    pub fn content_mut(&mut self) -> &mut BlockContent {
        &mut self.content
    }

    pub fn push(&mut self, fragment: ContentFragment) {
        self.content.push(fragment);
    }

    /// A heading that does not open a section stays in the body.
    pub fn push_subheading(&mut self, heading: Heading) {
        self.content.push_subheading(heading);
    }

    pub fn push_image(&mut self, image: ImageRef) {
        self.content.images.push(image);
    }

    pub fn set_column_hint(&mut self, hint: u8) {
        self.column_hint = hint;
    }

    pub fn mark_boundary(&mut self) {
        self.pending_boundary = true;
    }

    /// Loads a self-contained unit wholesale, replacing nothing already flushed.
    pub fn load(&mut self, content: BlockContent, column_hint: u8) {
        self.content = content;
        self.column_hint = column_hint;
    }

    /// Classifies and returns the accumulated block, leaving the accumulator empty.
    pub fn take_block(&mut self) -> Option<Block> {
        if self.content.is_empty() {
            self.pending_boundary = false;
            self.column_hint = 0;
            return None;
        }
        let content = std::mem::take(&mut self.content);
        let column_hint = std::mem::take(&mut self.column_hint);
        self.pending_boundary = false;

        let kind = classify(&content, column_hint);
        tracing::trace!("Flushing {} block ({} images)", kind, content.images.len());
        Some(Block { kind, content, column_hint, divider_color: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::models::{BlockKind, Paragraph};

    const EMPTY: Shape = Shape { images: 0, paragraphs: 0 };

    #[test]
    fn image_after_text_flushes_first() {
        let t = transition(SegmentState::Accumulating, Signal::Image, Shape { images: 0, paragraphs: 2 });
        assert!(t.flush_first);
        assert_eq!(t.next, SegmentState::Accumulating);
    }

    #[test]
    fn sixth_image_makes_boundary_pending() {
        let t = transition(SegmentState::Accumulating, Signal::Image, Shape { images: 5, paragraphs: 0 });
        assert!(!t.flush_first);
        assert_eq!(t.next, SegmentState::BoundaryPending);

        let t = transition(SegmentState::Accumulating, Signal::Image, Shape { images: 4, paragraphs: 0 });
        assert_eq!(t.next, SegmentState::Accumulating);
    }

    #[test]
    fn hard_boundaries_flush_only_open_blocks() {
        assert!(!transition(SegmentState::Idle, Signal::HardBoundary, EMPTY).flush_first);
        let t = transition(SegmentState::Accumulating, Signal::HardBoundary, EMPTY);
        assert!(t.flush_first);
        assert_eq!(t.next, SegmentState::Idle);
        assert!(transition(SegmentState::Accumulating, Signal::EndOfInput, EMPTY).flush_first);
    }

    #[test]
    fn gallery_flushes_pending_images_but_keeps_text() {
        let text_only = Shape { images: 0, paragraphs: 1 };
        assert!(!transition(SegmentState::Accumulating, Signal::Gallery, text_only).flush_first);
        let with_image = Shape { images: 1, paragraphs: 0 };
        assert!(transition(SegmentState::Accumulating, Signal::Gallery, with_image).flush_first);
    }

    #[test]
    fn cta_only_attaches_to_open_block() {
        let open = transition(SegmentState::Accumulating, Signal::CtaOnly, EMPTY);
        assert!(!open.flush_first);
        assert_eq!(open.next, SegmentState::Accumulating);
        assert_eq!(transition(SegmentState::Idle, Signal::CtaOnly, EMPTY).next, SegmentState::Idle);
    }

    #[test]
    fn accumulator_reports_state_and_resets() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.state(), SegmentState::Idle);
        assert!(acc.take_block().is_none());

        acc.push(ContentFragment::Paragraph(Paragraph::plain("a", "a")));
        assert_eq!(acc.state(), SegmentState::Accumulating);
        acc.mark_boundary();
        assert_eq!(acc.state(), SegmentState::BoundaryPending);

        let block = acc.take_block().unwrap();
        assert_eq!(block.kind, BlockKind::RichText);
        assert_eq!(acc.state(), SegmentState::Idle);
        assert_eq!(acc.shape(), Shape::default());
    }
}
