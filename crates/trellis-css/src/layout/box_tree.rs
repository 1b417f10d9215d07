//! The box tree.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! Boxes live in an arena owned by [`BoxTree`] and refer to each other by
//! [`BoxId`]. Every box kind shares one [`BoxDimensions`], which stays `None`
//! until layout has sized the box.

use std::sync::Arc;

use serde::Serialize;
use trellis_dom::NodeId;

use super::box_model::{BoxDimensions, Rect};
use super::font::{FontMetrics, LayoutConfig};
use super::replaced::ReplacedBox;
use super::text_box::TextBox;
use crate::paint::DisplayList;
use crate::style::{ComputedStyle, Display};

/// Index of a box in its [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BoxId(pub usize);

/// [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
#[derive(Debug, Clone)]
pub enum BoxKind {
    /// Principal box of a `display: block` element.
    Block,
    /// Principal box of a `display: inline` element.
    Inline,
    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// Wraps a run of inline-level boxes that sits next to block-level
    /// siblings. The root of every tree is one as well.
    AnonymousBlock,
    /// [§ 9.2.2.1 Anonymous inline boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous)
    ///
    /// "Any text that is directly contained inside a block container element
    /// (not inside an inline element) must be treated as an anonymous inline
    /// element."
    AnonymousInline,
    /// A run of text.
    Text(TextBox),
    /// Externally supplied content.
    Replaced(ReplacedBox),
}

impl BoxKind {
    /// Short name, used in dumps and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Inline => "inline",
            Self::AnonymousBlock => "anonymous-block",
            Self::AnonymousInline => "anonymous-inline",
            Self::Text(_) => "text",
            Self::Replaced(_) => "replaced",
        }
    }
}

/// A line of an inline formatting context.
///
/// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "The rectangular area that contains the boxes that form a line is called
/// a line box."
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBox {
    /// Line box rectangle.
    pub bounds: Rect,
    /// Baseline offset from `bounds.y`.
    pub baseline: f32,
    /// Leaf boxes on the line, in visual order.
    pub fragments: Vec<BoxId>,
}

/// One node of the box tree.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    /// What kind of box this is.
    pub kind: BoxKind,
    /// Generating DOM node; `None` for anonymous boxes.
    pub node: Option<NodeId>,
    /// Style the box is laid out and painted with.
    pub style: Arc<ComputedStyle>,
    /// Used geometry, set by layout.
    pub dimensions: Option<BoxDimensions>,
    /// Containing box in the tree.
    pub parent: Option<BoxId>,
    /// Children in document order.
    pub children: Vec<BoxId>,
    /// Lines, for block containers holding inline content.
    pub lines: Vec<LineBox>,
}

impl LayoutBox {
    /// A box with no children and no geometry yet.
    #[must_use]
    pub const fn new(kind: BoxKind, node: Option<NodeId>, style: Arc<ComputedStyle>) -> Self {
        Self {
            kind,
            node,
            style,
            dimensions: None,
            parent: None,
            children: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// [§ 9.2.1 Block-level elements and block boxes](https://www.w3.org/TR/CSS2/visuren.html#block-boxes)
    #[must_use]
    pub fn is_block_level(&self) -> bool {
        match &self.kind {
            BoxKind::Block | BoxKind::AnonymousBlock => true,
            BoxKind::Inline | BoxKind::AnonymousInline | BoxKind::Text(_) => false,
            BoxKind::Replaced(_) => self.style.display() == Display::Block,
        }
    }
}

/// Everything measurement needs from outside the box.
#[derive(Clone, Copy)]
pub struct MeasureContext<'a> {
    /// Font measurement.
    pub metrics: &'a dyn FontMetrics,
    /// Layout knobs.
    pub config: &'a LayoutConfig,
    /// Width of the containing block.
    pub containing_width: f32,
}

impl<'a> MeasureContext<'a> {
    /// A context with no containing block width yet.
    #[must_use]
    pub const fn new(metrics: &'a dyn FontMetrics, config: &'a LayoutConfig) -> Self {
        Self {
            metrics,
            config,
            containing_width: 0.0,
        }
    }

    /// The same context inside a containing block `width` wide.
    #[must_use]
    pub const fn within(self, width: f32) -> Self {
        Self {
            containing_width: width,
            ..self
        }
    }
}

/// Outer size of an inline-level leaf.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct InlineSize {
    /// Advance width.
    pub width: f32,
    /// Height of the box on the line.
    pub height: f32,
    /// Baseline offset from the top.
    pub baseline: f32,
}

/// A box whose size can be computed on its own.
pub trait Measurable {
    /// Compute (or return the cached) size.
    fn measure(&mut self, cx: &MeasureContext<'_>) -> InlineSize;
}

/// A box that can be broken across lines or bidi runs.
pub trait Splittable: Sized {
    /// Split so the head fits in `available_width`, returning the tail.
    fn try_split_at(
        &mut self,
        available_width: f32,
        allow_overflow: bool,
        cx: &MeasureContext<'_>,
    ) -> Option<Self>;

    /// Split at the end of the first bidi level run, returning the tail.
    fn try_split_at_second_bidi_level_run(&mut self) -> Option<Self>;
}

/// A box that draws its own content.
pub trait Paintable {
    /// Append drawing commands for this box's content.
    fn paint(
        &self,
        style: &ComputedStyle,
        dimensions: &BoxDimensions,
        cx: &MeasureContext<'_>,
        list: &mut DisplayList,
    );
}

/// Arena of boxes rooted at one anonymous block.
#[derive(Debug, Clone)]
pub struct BoxTree {
    boxes: Vec<LayoutBox>,
}

impl BoxTree {
    /// A tree holding only its root box.
    #[must_use]
    pub fn new(root_style: Arc<ComputedStyle>) -> Self {
        Self {
            boxes: vec![LayoutBox::new(BoxKind::AnonymousBlock, None, root_style)],
        }
    }

    /// The root box.
    #[must_use]
    pub const fn root(&self) -> BoxId {
        BoxId(0)
    }

    /// Number of boxes, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Always false; the root exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Look a box up.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.0)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut LayoutBox> {
        self.boxes.get_mut(id.0)
    }

    /// Children of `id`, empty for unknown ids.
    #[must_use]
    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map_or(&[], |b| b.children.as_slice())
    }

    /// Add `layout_box` as the last child of `parent`.
    pub fn append(&mut self, parent: BoxId, mut layout_box: LayoutBox) -> BoxId {
        let id = BoxId(self.boxes.len());
        layout_box.parent = Some(parent);
        self.boxes.push(layout_box);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Add `layout_box` right after `sibling` under the same parent.
    pub fn insert_after(&mut self, sibling: BoxId, mut layout_box: LayoutBox) -> BoxId {
        let id = BoxId(self.boxes.len());
        let parent = self.get(sibling).and_then(|b| b.parent);
        layout_box.parent = parent;
        self.boxes.push(layout_box);
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            let at = p
                .children
                .iter()
                .position(|c| *c == sibling)
                .map_or(p.children.len(), |i| i + 1);
            p.children.insert(at, id);
        }
        id
    }

    /// `id` and all its descendants, pre-order.
    #[must_use]
    pub fn descendants(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Boxes generated by DOM node `node`.
    #[must_use]
    pub fn boxes_for_node(&self, node: NodeId) -> Vec<BoxId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.get(*id).and_then(|b| b.node) == Some(node))
            .collect()
    }

    /// Text and replaced boxes under `id`, in document order.
    #[must_use]
    pub fn leaves(&self, id: BoxId) -> Vec<BoxId> {
        self.descendants(id)
            .into_iter()
            .filter(|b| {
                self.get(*b)
                    .is_some_and(|b| matches!(b.kind, BoxKind::Text(_) | BoxKind::Replaced(_)))
            })
            .collect()
    }
}

#[derive(Serialize)]
struct BoxSnapshot<'a> {
    kind: &'static str,
    node: Option<usize>,
    range: Option<(usize, usize)>,
    text: Option<&'a str>,
    dimensions: Option<BoxDimensions>,
    lines: &'a [LineBox],
    children: Vec<BoxSnapshot<'a>>,
}

impl BoxTree {
    fn snapshot(&self, id: BoxId) -> Option<BoxSnapshot<'_>> {
        let b = self.get(id)?;
        let (range, text) = match &b.kind {
            BoxKind::Text(t) => {
                let r = t.range();
                (Some((r.start, r.end)), Some(t.text()))
            }
            _ => (None, None),
        };
        Some(BoxSnapshot {
            kind: b.kind.name(),
            node: b.node.map(|n| n.0),
            range,
            text,
            dimensions: b.dimensions,
            lines: &b.lines,
            children: b.children.iter().filter_map(|c| self.snapshot(*c)).collect(),
        })
    }
}

impl Serialize for BoxTree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot(self.root()).serialize(serializer)
    }
}
