//! Painter - generates a display list from a box tree
//!
//! [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
//!
//! The painter walks the box tree in pre-order and emits, for each box, its
//! background, its borders and then its own content.

use super::{DisplayCommand, DisplayList};
use crate::layout::box_model::{BoxDimensions, Rect};
use crate::layout::box_tree::{BoxKind, BoxTree, LayoutBox, MeasureContext, Paintable};
use crate::layout::font::{FontMetrics, LayoutConfig};
use crate::style::{ComputedStyle, Visibility};

/// Painter that generates a display list from a laid-out box tree.
pub struct Painter<'a> {
    metrics: &'a dyn FontMetrics,
    config: &'a LayoutConfig,
}

impl<'a> Painter<'a> {
    /// Create a painter measuring text with `metrics`.
    #[must_use]
    pub const fn new(metrics: &'a dyn FontMetrics, config: &'a LayoutConfig) -> Self {
        Self { metrics, config }
    }

    /// Paint a box tree and return the display list.
    ///
    /// Boxes that layout has not sized are skipped.
    #[must_use]
    pub fn paint(&self, tree: &BoxTree) -> DisplayList {
        let cx = MeasureContext::new(self.metrics, self.config);
        let mut display_list = DisplayList::new();
        for id in tree.descendants(tree.root()) {
            if let Some(layout_box) = tree.get(id) {
                Self::paint_box(layout_box, &cx, &mut display_list);
            }
        }
        log::debug!(target: "paint", "painted {} commands", display_list.len());
        display_list
    }

    /// Paint a single box, without its descendants.
    ///
    /// "visibility: hidden" suppresses only this box; its children are
    /// visited separately and follow their own style.
    fn paint_box(layout_box: &LayoutBox, cx: &MeasureContext<'_>, display_list: &mut DisplayList) {
        let Some(dims) = &layout_box.dimensions else {
            return;
        };
        let style = &layout_box.style;
        if style.visibility() == Visibility::Hidden {
            return;
        }

        match &layout_box.kind {
            // Text shares its element's style; the element's own box paints
            // the background and borders.
            BoxKind::Text(text) => text.paint(style, dims, cx, display_list),
            BoxKind::Replaced(replaced) => {
                Self::paint_background_and_borders(style, dims, display_list);
                replaced.paint(style, dims, cx, display_list);
            }
            BoxKind::Block | BoxKind::Inline | BoxKind::AnonymousBlock | BoxKind::AnonymousInline => {
                Self::paint_background_and_borders(style, dims, display_list);
            }
        }
    }

    fn paint_background_and_borders(
        style: &ComputedStyle,
        dims: &BoxDimensions,
        display_list: &mut DisplayList,
    ) {
        // [CSS 2.1 Appendix E.2 Step 2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
        // "the background color of the element"
        //
        // [CSS Backgrounds § 3.7](https://www.w3.org/TR/css-backgrounds-3/#background-painting-area)
        // "The initial value of 'background-clip' is 'border-box', meaning
        // the background is painted within the border box."
        if let Some(color) = style.background_color() {
            display_list.push(DisplayCommand::FillRect {
                rect: dims.border_box(),
                color,
            });
        }
        Self::paint_borders(style, dims, display_list);
    }

    /// Paint borders for a box.
    ///
    /// [CSS Backgrounds and Borders § 4](https://www.w3.org/TR/css-backgrounds-3/#borders)
    ///
    /// Every side is drawn as a solid rectangle outside the padding box. Top
    /// and bottom span the corners.
    fn paint_borders(style: &ComputedStyle, dims: &BoxDimensions, display_list: &mut DisplayList) {
        let color = style.border_color();
        if color.is_transparent() {
            return;
        }
        let padding = dims.padding_box();
        let border = dims.border;
        let sides = [
            Rect::new(
                padding.x - border.left,
                padding.y - border.top,
                padding.width + border.horizontal(),
                border.top,
            ),
            Rect::new(
                padding.x - border.left,
                padding.bottom(),
                padding.width + border.horizontal(),
                border.bottom,
            ),
            Rect::new(padding.x - border.left, padding.y, border.left, padding.height),
            Rect::new(padding.right(), padding.y, border.right, padding.height),
        ];
        for rect in sides {
            if rect.width > 0.0 && rect.height > 0.0 {
                display_list.push(DisplayCommand::FillRect { rect, color });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::layout::box_model::EdgeSizes;
    use crate::layout::font::ApproximateFontMetrics;
    use crate::values::{Color, Property, Value};

    fn styled(values: &[(Property, Value)]) -> Arc<ComputedStyle> {
        let mut map: std::collections::BTreeMap<Property, Value> =
            ComputedStyle::initial().iter().map(|(p, v)| (p, v.clone())).collect();
        for (p, v) in values {
            let _ = map.insert(*p, v.clone());
        }
        Arc::new(ComputedStyle::from_values(map))
    }

    #[test]
    fn test_background_then_borders() {
        let style = styled(&[
            (Property::BackgroundColor, Value::Color(Color::WHITE)),
            (Property::BorderTopWidth, Value::px(2.0)),
        ]);
        let mut tree = BoxTree::new(Arc::clone(&style));
        if let Some(root) = tree.get_mut(tree.root()) {
            root.dimensions = Some(BoxDimensions {
                content: Rect::new(0.0, 2.0, 100.0, 50.0),
                border: EdgeSizes { top: 2.0, ..EdgeSizes::default() },
                ..BoxDimensions::default()
            });
        }
        let config = LayoutConfig::default();
        let list = Painter::new(&ApproximateFontMetrics, &config).paint(&tree);
        assert_eq!(
            list.commands(),
            &[
                DisplayCommand::FillRect {
                    rect: Rect::new(0.0, 0.0, 100.0, 52.0),
                    color: Color::WHITE,
                },
                DisplayCommand::FillRect {
                    rect: Rect::new(0.0, 0.0, 100.0, 2.0),
                    color: Color::BLACK,
                },
            ]
        );
    }

    #[test]
    fn test_unsized_boxes_are_skipped() {
        let style = styled(&[(Property::BackgroundColor, Value::Color(Color::WHITE))]);
        let tree = BoxTree::new(style);
        let config = LayoutConfig::default();
        assert!(Painter::new(&ApproximateFontMetrics, &config).paint(&tree).is_empty());
    }
}
