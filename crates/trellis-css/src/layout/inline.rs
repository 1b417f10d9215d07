//! Inline formatting contexts.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block."
//!
//! Lines are filled in logical order. Text boxes are split where they
//! overflow, and the tail is inserted into the box tree right after the head
//! so the tree stays in document order. Once a line is complete it is
//! trimmed, aligned, placed on its baseline and reordered for bidi.

use std::collections::VecDeque;
use std::sync::Arc;

use unicode_bidi::{BidiInfo, Level};

use super::box_model::{BoxDimensions, EdgeSizes, Rect};
use super::box_tree::{
    BoxId, BoxKind, BoxTree, InlineSize, LayoutBox, LineBox, MeasureContext, Measurable,
    Splittable,
};
use super::font::{LineBoxMetrics, line_box_metrics};
use crate::style::{ComputedStyle, TextAlign};

/// Slack for float comparisons against the available width.
const FIT_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy)]
enum Item {
    Open(BoxId),
    Leaf(BoxId),
    Close(BoxId),
}

#[derive(Debug, Clone, Copy)]
struct Fragment {
    id: BoxId,
    start_edge: f32,
    size: InlineSize,
    end_edge: f32,
    level: Level,
}

impl Fragment {
    fn advance(&self) -> f32 {
        self.start_edge + self.size.width + self.end_edge
    }
}

#[derive(Debug, Default)]
struct Line {
    fragments: Vec<Fragment>,
    /// Start edges of inline boxes opened since the last fragment.
    pending_start: f32,
    width: f32,
    /// The content so far ends in a collapsible space, or nothing is on the
    /// line yet.
    ends_in_space: bool,
}

impl Line {
    fn new() -> Self {
        Self {
            ends_in_space: true,
            ..Self::default()
        }
    }

    fn has_content(&self) -> bool {
        self.fragments.iter().any(|f| f.size.width > 0.0)
    }

    /// Start the next line, carrying over edges of boxes opened at the end
    /// of this one.
    fn carry_over(&self) -> Self {
        Self {
            pending_start: self.pending_start,
            width: self.pending_start,
            ..Self::new()
        }
    }
}

/// Horizontal start and end edges (margin + border + padding) of an inline
/// box.
fn inline_edges(style: &ComputedStyle, basis: f32) -> (f32, f32) {
    let margin = style.margin();
    let padding = style.padding();
    let border = style.border_width();
    let start = margin.left.resolve(basis).to_px_or(0.0)
        + border.left
        + padding.left.resolve(basis).to_px_or(0.0);
    let end = margin.right.resolve(basis).to_px_or(0.0)
        + border.right
        + padding.right.resolve(basis).to_px_or(0.0);
    (start, end)
}

fn flatten(tree: &BoxTree, id: BoxId, out: &mut VecDeque<Item>) {
    for &child in tree.children(id) {
        let Some(child_box) = tree.get(child) else {
            continue;
        };
        match child_box.kind {
            BoxKind::Inline | BoxKind::AnonymousInline => {
                out.push_back(Item::Open(child));
                flatten(tree, child, out);
                out.push_back(Item::Close(child));
            }
            BoxKind::Text(_) | BoxKind::Replaced(_) => out.push_back(Item::Leaf(child)),
            BoxKind::Block | BoxKind::AnonymousBlock => {
                log::trace!(target: "layout", "block-level {child:?} inside inline content skipped");
            }
        }
    }
}

/// Split every text box under `container` at its bidi level run
/// boundaries so that each box has a single level.
fn split_bidi_runs(tree: &mut BoxTree, container: BoxId) {
    for leaf in tree.leaves(container) {
        let mut current = leaf;
        loop {
            let Some(layout_box) = tree.get_mut(current) else {
                break;
            };
            let tail = match &mut layout_box.kind {
                BoxKind::Text(text) => text.try_split_at_second_bidi_level_run(),
                _ => None,
            };
            let Some(tail) = tail else {
                break;
            };
            let sibling = LayoutBox::new(
                BoxKind::Text(tail),
                layout_box.node,
                Arc::clone(&layout_box.style),
            );
            current = tree.insert_after(current, sibling);
        }
    }
}

struct LineBuilder<'t, 'c> {
    tree: &'t mut BoxTree,
    cx: &'c MeasureContext<'c>,
    content: Rect,
    text_align: TextAlign,
    strut: LineBoxMetrics,
    y: f32,
    lines: Vec<LineBox>,
}

impl LineBuilder<'_, '_> {
    fn measure(&mut self, id: BoxId) -> InlineSize {
        let cx = self.cx;
        match self.tree.get_mut(id).map(|b| &mut b.kind) {
            Some(BoxKind::Text(text)) => text.measure(cx),
            Some(BoxKind::Replaced(replaced)) => replaced.measure(cx),
            _ => InlineSize::default(),
        }
    }

    fn level(&self, id: BoxId) -> Level {
        match self.tree.get(id).map(|b| &b.kind) {
            Some(BoxKind::Text(text)) => text.bidi_level(),
            Some(BoxKind::Replaced(replaced)) => replaced.bidi_level(),
            _ => Level::ltr(),
        }
    }

    fn try_split(&mut self, id: BoxId, available: f32, allow_overflow: bool) -> Option<BoxId> {
        let cx = self.cx;
        let layout_box = self.tree.get_mut(id)?;
        let tail = match &mut layout_box.kind {
            BoxKind::Text(text) => text
                .try_split_at(available, allow_overflow, cx)
                .map(BoxKind::Text),
            BoxKind::Replaced(replaced) => replaced
                .try_split_at(available, allow_overflow, cx)
                .map(BoxKind::Replaced),
            _ => None,
        }?;
        let sibling = LayoutBox::new(tail, layout_box.node, Arc::clone(&layout_box.style));
        Some(self.tree.insert_after(id, sibling))
    }

    fn push(&mut self, line: &mut Line, id: BoxId, size: InlineSize) {
        let start_edge = std::mem::take(&mut line.pending_start);
        line.width += size.width;
        line.fragments.push(Fragment {
            id,
            start_edge,
            size,
            end_edge: 0.0,
            level: self.level(id),
        });

        if let Some(BoxKind::Text(text)) = self.tree.get(id).map(|b| &b.kind) {
            if !text.is_collapsed() {
                line.ends_in_space =
                    !text.has_non_collapsible_text() || text.has_trailing_white_space();
            }
        } else {
            line.ends_in_space = false;
        }

        #[cfg(feature = "layout-trace")]
        log::trace!(
            target: "layout",
            "placed {id:?} width {} at line offset {}",
            size.width,
            line.width - size.width
        );
    }

    /// Place one leaf, splitting it if it overflows. Returns the tail that
    /// still has to be placed, and whether the line is complete.
    fn place_leaf(&mut self, line: &mut Line, id: BoxId) -> (Option<BoxId>, bool) {
        let cx = self.cx;
        let (trailing_space, forced) = match self.tree.get_mut(id).map(|b| &mut b.kind) {
            Some(BoxKind::Text(text)) => {
                text.set_should_collapse_leading_white_space(line.ends_in_space);
                text.set_should_collapse_trailing_white_space(false);
                (text.trailing_white_space_width(cx), text.triggers_line_break())
            }
            _ => (0.0, false),
        };
        let size = self.measure(id);
        let available = self.content.width;

        // Trailing space may hang past the edge.
        if line.width + size.width - trailing_space <= available + FIT_EPSILON {
            self.push(line, id, size);
            return (None, forced);
        }

        let has_content = line.has_content();
        match self.try_split(id, available - line.width, !has_content) {
            Some(tail) => {
                let head = self.measure(id);
                self.push(line, id, head);
                (Some(tail), true)
            }
            // Retry on a fresh line.
            None if has_content => (Some(id), true),
            None => {
                self.push(line, id, size);
                (None, forced)
            }
        }
    }

    fn open(line: &mut Line, edge: f32) {
        line.pending_start += edge;
        line.width += edge;
    }

    fn close(line: &mut Line, edge: f32) {
        match line.fragments.last_mut() {
            Some(last) if line.pending_start == 0.0 => last.end_edge += edge,
            _ => line.pending_start += edge,
        }
        line.width += edge;
    }

    /// Hand `extra` out evenly to the rendered spaces of the text
    /// fragments and re-measure them.
    fn spread_over_spaces(&mut self, fragments: &mut [Fragment], extra: f32) {
        let opportunities: usize = fragments
            .iter()
            .filter_map(|f| match self.tree.get(f.id).map(|b| &b.kind) {
                Some(BoxKind::Text(text)) => Some(text.justification_opportunities()),
                _ => None,
            })
            .sum();
        if opportunities == 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let per_space = extra / opportunities as f32;
        for fragment in fragments {
            if let Some(BoxKind::Text(text)) = self.tree.get_mut(fragment.id).map(|b| &mut b.kind) {
                text.set_justification(per_space);
                fragment.size = self.measure(fragment.id);
            }
        }
    }

    /// Trim, align and place `line`, then record it.
    fn finish_line(&mut self, mut line: Line, is_last: bool) {
        let cx = self.cx;

        // STEP 1: Collapse trailing white space, walking back over boxes
        // that collapse away entirely.
        for index in (0..line.fragments.len()).rev() {
            let id = line.fragments[index].id;
            let collapsed = match self.tree.get_mut(id).map(|b| &mut b.kind) {
                Some(BoxKind::Text(text)) => {
                    text.set_should_collapse_trailing_white_space(true);
                    text.is_collapsed()
                }
                _ => false,
            };
            line.fragments[index].size = self.measure(id);
            if !collapsed {
                break;
            }
        }

        // STEP 2: A line with nothing that justifies its existence is
        // treated as if it did not exist.
        let justified = line.fragments.iter().any(|f| {
            self.tree.get(f.id).is_some_and(|b| match &b.kind {
                BoxKind::Text(text) => text.justifies_line_existence(),
                BoxKind::Replaced(_) => true,
                _ => false,
            })
        });
        if !justified {
            for fragment in &line.fragments {
                if let Some(b) = self.tree.get_mut(fragment.id) {
                    b.dimensions = Some(BoxDimensions {
                        content: Rect::new(self.content.x, self.y, 0.0, 0.0),
                        ..BoxDimensions::default()
                    });
                }
            }
            return;
        }

        // STEP 3: Line height from the strut and every fragment's baseline.
        //
        // [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
        let baseline = line
            .fragments
            .iter()
            .map(|f| f.size.baseline)
            .fold(self.strut.baseline, f32::max);
        let below = line
            .fragments
            .iter()
            .map(|f| f.size.height - f.size.baseline)
            .fold(self.strut.height - self.strut.baseline, f32::max);
        let height = baseline + below;

        // STEP 4: Visual order.
        //
        // [UAX #9 § 3.4 Reordering Resolved Levels](https://www.unicode.org/reports/tr9/#Reordering_Resolved_Levels)
        let levels: Vec<Level> = line.fragments.iter().map(|f| f.level).collect();
        let mut visual: Vec<Fragment> = if levels.iter().any(|l| l.is_rtl()) {
            BidiInfo::reorder_visual(&levels)
                .into_iter()
                .filter_map(|i| line.fragments.get(i).copied())
                .collect()
        } else {
            line.fragments.clone()
        };

        // STEP 5: Alignment. Justified lines grow their spaces first and
        // fall back to spacing the fragments apart.
        //
        // [CSS Text § 7.3 Justification](https://www.w3.org/TR/css-text-3/#justify-alignment)
        let justify = self.text_align == TextAlign::Justify && !is_last;
        let mut total: f32 = visual.iter().map(Fragment::advance).sum();
        let slack = self.content.width - total;
        if justify && slack > 0.0 {
            self.spread_over_spaces(&mut visual, slack);
            total = visual.iter().map(Fragment::advance).sum();
        }
        let extra = (self.content.width - total).max(0.0);
        let (mut x, gap) = match self.text_align {
            TextAlign::Left => (0.0, 0.0),
            TextAlign::Right => (extra, 0.0),
            TextAlign::Center => (extra / 2.0, 0.0),
            #[allow(clippy::cast_precision_loss)]
            TextAlign::Justify if justify && visual.len() > 1 => {
                (0.0, extra / (visual.len() - 1) as f32)
            }
            TextAlign::Justify => (0.0, 0.0),
        };
        x += self.content.x;

        // STEP 6: Place fragments on the baseline.
        for fragment in &visual {
            x += fragment.start_edge;
            let top = self.y + baseline - fragment.size.baseline;
            if let Some(b) = self.tree.get_mut(fragment.id) {
                b.dimensions = Some(match &mut b.kind {
                    BoxKind::Replaced(replaced) => {
                        replaced.used_size(cx.containing_width).place_at(x, top)
                    }
                    _ => BoxDimensions {
                        content: Rect::new(x, top, fragment.size.width, fragment.size.height),
                        ..BoxDimensions::default()
                    },
                });
            }
            x += fragment.size.width + fragment.end_edge + gap;
        }

        self.lines.push(LineBox {
            bounds: Rect::new(self.content.x, self.y, self.content.width, height),
            baseline,
            fragments: visual.iter().map(|f| f.id).collect(),
        });
        self.y += height;
    }
}

/// Size inline and anonymous inline boxes to the union of their leaves.
fn size_inline_boxes(tree: &mut BoxTree, container: BoxId, basis: f32) {
    for id in tree.descendants(container) {
        let Some(layout_box) = tree.get(id) else {
            continue;
        };
        if !matches!(layout_box.kind, BoxKind::Inline | BoxKind::AnonymousInline) {
            continue;
        }
        let style = Arc::clone(&layout_box.style);
        let union = tree
            .leaves(id)
            .into_iter()
            .filter_map(|leaf| tree.get(leaf).and_then(|b| b.dimensions))
            .map(|d| d.content)
            .filter(|r| r.width > 0.0 || r.height > 0.0)
            .reduce(|a, b| {
                let x = a.x.min(b.x);
                let y = a.y.min(b.y);
                Rect::new(x, y, a.right().max(b.right()) - x, a.bottom().max(b.bottom()) - y)
            });
        let padding = style.padding();
        let margin = style.margin();
        let dims = BoxDimensions {
            content: union.unwrap_or_default(),
            padding: EdgeSizes {
                top: padding.top.resolve(basis).to_px_or(0.0),
                right: padding.right.resolve(basis).to_px_or(0.0),
                bottom: padding.bottom.resolve(basis).to_px_or(0.0),
                left: padding.left.resolve(basis).to_px_or(0.0),
            },
            border: style.border_width().into(),
            margin: EdgeSizes {
                left: margin.left.resolve(basis).to_px_or(0.0),
                right: margin.right.resolve(basis).to_px_or(0.0),
                ..EdgeSizes::default()
            },
        };
        if let Some(b) = tree.get_mut(id) {
            b.dimensions = Some(dims);
        }
    }
}

/// Lay out the inline-level children of `container` in lines inside
/// `content`. Returns the total height of the lines.
pub fn layout_inline_content(
    tree: &mut BoxTree,
    container: BoxId,
    content: Rect,
    cx: &MeasureContext<'_>,
) -> f32 {
    let Some(style) = tree.get(container).map(|b| Arc::clone(&b.style)) else {
        return 0.0;
    };

    // STEP 1: One bidi level per box.
    split_bidi_runs(tree, container);

    // STEP 2: Fill lines.
    let mut items = VecDeque::new();
    flatten(tree, container, &mut items);
    let mut builder = LineBuilder {
        tree,
        cx,
        content,
        text_align: style.text_align(),
        strut: line_box_metrics(style.line_height(), &style.font(), cx.metrics),
        y: content.y,
        lines: Vec::new(),
    };
    let mut line = Line::new();
    while let Some(item) = items.pop_front() {
        match item {
            Item::Open(id) => {
                let edge = builder
                    .tree
                    .get(id)
                    .map_or(0.0, |b| inline_edges(&b.style, content.width).0);
                LineBuilder::open(&mut line, edge);
            }
            Item::Close(id) => {
                let edge = builder
                    .tree
                    .get(id)
                    .map_or(0.0, |b| inline_edges(&b.style, content.width).1);
                LineBuilder::close(&mut line, edge);
            }
            Item::Leaf(id) => {
                let (rest, line_done) = builder.place_leaf(&mut line, id);
                if let Some(rest) = rest {
                    items.push_front(Item::Leaf(rest));
                }
                if line_done {
                    let next = line.carry_over();
                    let forced = rest.is_none();
                    builder.finish_line(std::mem::replace(&mut line, next), forced);
                }
            }
        }
    }
    if !line.fragments.is_empty() {
        builder.finish_line(line, true);
    }

    let height = builder.y - content.y;
    let lines = std::mem::take(&mut builder.lines);
    log::trace!(target: "layout", "inline content of {container:?}: {} lines, height {height}", lines.len());
    if let Some(b) = tree.get_mut(container) {
        b.lines = lines;
    }

    // STEP 3: Inline boxes wrap their fragments.
    size_inline_boxes(tree, container, content.width);
    height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font::{ApproximateFontMetrics, LayoutConfig};
    use crate::layout::paragraph::Paragraph;
    use crate::layout::text_box::TextBox;
    use crate::values::{Keyword, Property, Value};

    fn style_with(values: &[(Property, Value)]) -> Arc<ComputedStyle> {
        let mut map: std::collections::BTreeMap<Property, Value> =
            ComputedStyle::initial().iter().map(|(p, v)| (p, v.clone())).collect();
        // 10px font: every char is 6px wide, normal line height 12px.
        let _ = map.insert(Property::FontSize, Value::px(10.0));
        for (p, v) in values {
            let _ = map.insert(*p, v.clone());
        }
        Arc::new(ComputedStyle::from_values(map))
    }

    fn tree_with_text(text: &str, style: &Arc<ComputedStyle>) -> (BoxTree, BoxId) {
        let mut tree = BoxTree::new(Arc::clone(style));
        let root = tree.root();
        let paragraph = Arc::new(Paragraph::new(text, style.direction()));
        let end = paragraph.len();
        let text_box = TextBox::new(paragraph, 0, end, style, false);
        let id = tree.append(root, LayoutBox::new(BoxKind::Text(text_box), None, Arc::clone(style)));
        (tree, id)
    }

    fn text_of(tree: &BoxTree, id: BoxId) -> String {
        match tree.get(id).map(|b| &b.kind) {
            Some(BoxKind::Text(t)) => t.non_collapsible_text().to_string(),
            _ => String::new(),
        }
    }

    fn run(tree: &mut BoxTree, width: f32) -> f32 {
        let config = LayoutConfig::default();
        let metrics = ApproximateFontMetrics;
        let cx = MeasureContext::new(&metrics, &config).within(width);
        let root = tree.root();
        layout_inline_content(tree, root, Rect::new(0.0, 0.0, width, 0.0), &cx)
    }

    #[test]
    fn test_wraps_at_last_fitting_opportunity() {
        let style = style_with(&[]);
        let (mut tree, _) = tree_with_text("hello big world", &style);
        let height = run(&mut tree, 60.0);

        let root = tree.root();
        let lines = &tree.get(root).map(|b| b.lines.clone()).unwrap_or_default();
        assert_eq!(lines.len(), 2);
        assert_eq!(height, 24.0);
        let words: Vec<String> = lines
            .iter()
            .map(|l| text_of(&tree, l.fragments[0]))
            .collect();
        assert_eq!(words, vec!["hello big", "world"]);
        // The trailing space of the first line hangs and is collapsed.
        let first = tree.get(lines[0].fragments[0]).and_then(|b| b.dimensions);
        assert_eq!(first.map(|d| d.content.width), Some(54.0));
    }

    #[test]
    fn test_overflowing_word_placed_on_empty_line() {
        let style = style_with(&[]);
        let (mut tree, _) = tree_with_text("abcdefghij", &style);
        let _ = run(&mut tree, 20.0);
        let lines = tree.get(tree.root()).map(|b| b.lines.len());
        assert_eq!(lines, Some(1));
    }

    #[test]
    fn test_whitespace_only_line_is_discarded() {
        let style = style_with(&[]);
        let (mut tree, _) = tree_with_text(" ", &style);
        let height = run(&mut tree, 100.0);
        assert_eq!(height, 0.0);
        assert!(tree.get(tree.root()).is_some_and(|b| b.lines.is_empty()));
    }

    #[test]
    fn test_center_alignment() {
        let style = style_with(&[(Property::TextAlign, Value::Keyword(Keyword::Center))]);
        let (mut tree, id) = tree_with_text("ab", &style);
        let _ = run(&mut tree, 100.0);
        let x = tree.get(id).and_then(|b| b.dimensions).map(|d| d.content.x);
        assert_eq!(x, Some(44.0));
    }

    #[test]
    fn test_justify_stretches_spaces_inside_one_box() {
        let style = style_with(&[(Property::TextAlign, Value::Keyword(Keyword::Justify))]);
        let (mut tree, _) = tree_with_text("aaa bbb ccc ddd", &style);
        let _ = run(&mut tree, 60.0);

        let lines = tree.get(tree.root()).map(|b| b.lines.clone()).unwrap_or_default();
        assert_eq!(lines.len(), 2);
        let widths: Vec<f32> = lines
            .iter()
            .filter_map(|l| tree.get(l.fragments[0]).and_then(|b| b.dimensions))
            .map(|d| d.content.width)
            .collect();
        // The one space of "aaa bbb" takes all 18px of slack; the last line
        // keeps its natural width.
        assert_eq!(widths, vec![60.0, 42.0]);
        let spacing = match tree.get(lines[0].fragments[0]).map(|b| &b.kind) {
            Some(BoxKind::Text(text)) => text.justification(),
            _ => 0.0,
        };
        assert_eq!(spacing, 18.0);
    }

    #[test]
    fn test_rtl_run_reordered_visually() {
        let style = style_with(&[]);
        let (mut tree, first) = tree_with_text("ab \u{05D0}\u{05D1} cd", &style);
        let _ = run(&mut tree, 500.0);
        let root = tree.root();
        // Split into three single-level boxes, in document order.
        assert_eq!(tree.children(root).len(), 3);
        assert_eq!(tree.children(root)[0], first);
        let line = tree.get(root).map(|b| b.lines[0].clone());
        assert_eq!(line.map(|l| l.fragments.len()), Some(3));
    }
}
