//! Block formatting contexts.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block."

use super::box_model::{BoxDimensions, EdgeSizes, Rect};
use super::box_tree::{BoxId, BoxKind, BoxTree, LayoutBox, MeasureContext};
use super::inline::layout_inline_content;
use crate::style::{AutoOr, ComputedStyle, LengthPercentageAuto, Sides};

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths. In the case of negative
/// margins, the maximum of the absolute values of the negative adjoining
/// margins is deducted from the maximum of the positive adjoining margins.
/// If there are no positive margins, the maximum of the absolute values
/// of the adjoining margins is deducted from zero."
#[must_use]
pub fn collapse_two_margins(a: f32, b: f32) -> f32 {
    if a >= 0.0 && b >= 0.0 {
        a.max(b)
    } else if a < 0.0 && b < 0.0 {
        a.min(b)
    } else {
        a + b
    }
}

/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// Used left and right margins of a box whose border box is
/// `border_box_width` wide. Shared with block-level replaced boxes.
#[must_use]
pub fn resolve_horizontal_margins(
    containing_width: f32,
    border_box_width: f32,
    margin_left: AutoOr,
    margin_right: AutoOr,
) -> (f32, f32) {
    let (mut margin_left, mut margin_right) = (margin_left, margin_right);

    // STEP 1: Over-constrained boxes treat 'auto' margins as zero.
    //
    // "If 'width' is not 'auto' and 'border-left-width' + 'padding-left' +
    // 'width' + 'padding-right' + 'border-right-width' (plus any of
    // 'margin-left' or 'margin-right' that are not 'auto') is larger than
    // the width of the containing block, then any 'auto' values for
    // 'margin-left' or 'margin-right' are, for the following rules,
    // treated as zero."
    let total = border_box_width + margin_left.to_px_or(0.0) + margin_right.to_px_or(0.0);
    if total > containing_width {
        if margin_left.is_auto() {
            margin_left = AutoOr::Length(0.0);
        }
        if margin_right.is_auto() {
            margin_right = AutoOr::Length(0.0);
        }
    }

    let remaining = containing_width - border_box_width;
    match (margin_left, margin_right) {
        // RULE B: "If both 'margin-left' and 'margin-right' are 'auto',
        // their used values are equal."
        (AutoOr::Auto, AutoOr::Auto) => (remaining / 2.0, remaining / 2.0),
        // RULE C: "If there is exactly one value specified as 'auto', its
        // used value follows from the equality."
        (AutoOr::Auto, AutoOr::Length(right)) => (remaining - right, right),
        (AutoOr::Length(left), AutoOr::Auto) => (left, remaining - left),
        // RULE D: over-constrained; 'margin-right' is ignored.
        (AutoOr::Length(left), AutoOr::Length(_)) => (left, remaining - left),
    }
}

fn resolve_edges(sides: Sides<LengthPercentageAuto>, basis: f32) -> EdgeSizes {
    EdgeSizes {
        top: sides.top.resolve(basis).to_px_or(0.0),
        right: sides.right.resolve(basis).to_px_or(0.0),
        bottom: sides.bottom.resolve(basis).to_px_or(0.0),
        left: sides.left.resolve(basis).to_px_or(0.0),
    }
}

/// Used width and edges of a block-level, non-replaced box. The content
/// rectangle is left at the origin with zero height.
#[must_use]
pub fn used_block_dimensions(style: &ComputedStyle, containing_width: f32) -> BoxDimensions {
    let padding = resolve_edges(style.padding(), containing_width);
    let border: EdgeSizes = style.border_width().into();
    let margin = style.margin();
    let margin_left = margin.left.resolve(containing_width);
    let margin_right = margin.right.resolve(containing_width);

    let (width, left, right) = match style.width().resolve(containing_width) {
        // RULE A: "If 'width' is set to 'auto', any other 'auto' values
        // become '0' and 'width' follows from the resulting equality."
        AutoOr::Auto => {
            let left = margin_left.to_px_or(0.0);
            let right = margin_right.to_px_or(0.0);
            let width = containing_width
                - left
                - right
                - padding.horizontal()
                - border.horizontal();
            (width.max(0.0), left, right)
        }
        AutoOr::Length(width) => {
            let border_box = width + padding.horizontal() + border.horizontal();
            let (left, right) =
                resolve_horizontal_margins(containing_width, border_box, margin_left, margin_right);
            (width, left, right)
        }
    };

    BoxDimensions {
        content: Rect::new(0.0, 0.0, width, 0.0),
        padding,
        border,
        margin: EdgeSizes {
            top: margin.top.resolve(containing_width).to_px_or(0.0),
            right,
            bottom: margin.bottom.resolve(containing_width).to_px_or(0.0),
            left,
        },
    }
}

/// Lay out the block-level box `id` with its margin edge at
/// `(containing.x, containing.y)` inside a containing block
/// `containing.width` wide. Returns the margin box.
pub fn layout_block_level(
    tree: &mut BoxTree,
    id: BoxId,
    containing: Rect,
    cx: &MeasureContext<'_>,
) -> Rect {
    let Some(layout_box) = tree.get_mut(id) else {
        return Rect::new(containing.x, containing.y, 0.0, 0.0);
    };

    let mut dims = match &mut layout_box.kind {
        BoxKind::Replaced(replaced) => {
            let dims = replaced
                .used_size(containing.width)
                .place_at(containing.x, containing.y);
            layout_box.dimensions = Some(dims);
            return dims.margin_box();
        }
        BoxKind::Block => used_block_dimensions(&layout_box.style, containing.width),
        BoxKind::AnonymousBlock
        | BoxKind::Inline
        | BoxKind::AnonymousInline
        | BoxKind::Text(_) => BoxDimensions {
            content: Rect::new(0.0, 0.0, containing.width, 0.0),
            ..BoxDimensions::default()
        },
    };
    let specified_height = match (&layout_box.kind, layout_box.style.height()) {
        (BoxKind::Block, LengthPercentageAuto::Px(px)) => Some(px),
        _ => None,
    };

    dims.content.x = containing.x + dims.margin.left + dims.border.left + dims.padding.left;
    dims.content.y = containing.y + dims.margin.top + dims.border.top + dims.padding.top;

    let content_height = layout_block_children(tree, id, dims.content, cx);
    dims.content.height = specified_height.unwrap_or(content_height);

    log::trace!(
        target: "layout",
        "block {id:?}: {}x{} at ({}, {})",
        dims.content.width,
        dims.content.height,
        dims.content.x,
        dims.content.y
    );
    if let Some(layout_box) = tree.get_mut(id) {
        layout_box.dimensions = Some(dims);
    }
    dims.margin_box()
}

/// Lay out the children of block container `id` inside `content`. Returns
/// the height they occupy.
///
/// A block container holds either only block-level children or only
/// inline-level ones; the box builder wraps mixed runs in anonymous blocks.
fn layout_block_children(
    tree: &mut BoxTree,
    id: BoxId,
    content: Rect,
    cx: &MeasureContext<'_>,
) -> f32 {
    let children = tree.children(id).to_vec();
    if children.is_empty() {
        return 0.0;
    }
    let block_context = children
        .iter()
        .any(|child| tree.get(*child).is_some_and(LayoutBox::is_block_level));
    if !block_context {
        return layout_inline_content(tree, id, content, &cx.within(content.width));
    }

    let mut y = content.y;
    let mut previous_margin_bottom: Option<f32> = None;
    for child in children {
        let margin_top = tree.get(child).map_or(0.0, |b| top_margin(b, content.width));

        // "Adjoining vertical margins collapse": the bottom margin of a box
        // and the top margin of its next in-flow sibling. Parent and child
        // margins are kept apart.
        if let Some(previous) = previous_margin_bottom {
            y -= previous + margin_top - collapse_two_margins(previous, margin_top);
        }

        let margin_box = layout_block_level(
            tree,
            child,
            Rect::new(content.x, y, content.width, 0.0),
            &cx.within(content.width),
        );
        y += margin_box.height;
        previous_margin_bottom = tree
            .get(child)
            .and_then(|b| b.dimensions)
            .map(|d| d.margin.bottom);
    }
    y - content.y
}

fn top_margin(layout_box: &LayoutBox, containing_width: f32) -> f32 {
    match layout_box.kind {
        BoxKind::Block | BoxKind::Replaced(_) => layout_box
            .style
            .margin()
            .top
            .resolve(containing_width)
            .to_px_or(0.0),
        _ => 0.0,
    }
}

/// Lay out the whole tree in a viewport `viewport_width` wide.
pub fn layout_root(tree: &mut BoxTree, viewport_width: f32, cx: &MeasureContext<'_>) -> Rect {
    let root = tree.root();
    log::debug!(target: "layout", "layout pass: {} boxes, viewport width {viewport_width}", tree.len());
    layout_block_level(tree, root, Rect::new(0.0, 0.0, viewport_width, 0.0), cx)
}
