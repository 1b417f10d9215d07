//! Leaf boxes over a byte range of a [`Paragraph`].
//!
//! [CSS Text § 4.1.1 Phase I: Collapsing and Transformation](https://www.w3.org/TR/css-text-3/#white-space-phase-1)
//! [CSS Text § 4.1.3 Phase II: Trimming and Positioning](https://www.w3.org/TR/css-text-3/#white-space-phase-2)
//!
//! A text box knows whether its text starts or ends with a collapsible
//! space. Whether that space is actually rendered is decided by the line
//! builder, which sets the `should_collapse_*` flags from what sits next to
//! the box on its line.

use std::ops::Range;
use std::sync::Arc;

use unicode_bidi::Level;

use super::box_model::BoxDimensions;
use super::box_tree::{InlineSize, MeasureContext, Measurable, Paintable, Splittable};
use super::cache::Cached;
use super::font::{FontSpec, line_box_metrics, snap};
use super::paragraph::Paragraph;
use crate::paint::{DisplayCommand, DisplayList};
use crate::style::{ComputedStyle, LineHeight, OverflowWrap, WhiteSpace};

#[derive(Debug, Clone, Copy, PartialEq)]
struct SizeInput {
    range: (usize, usize),
    leading: bool,
    trailing: bool,
    justification: f32,
    precision: f32,
}

/// A run of text from one paragraph, laid out as a single inline fragment.
#[derive(Debug, Clone)]
pub struct TextBox {
    paragraph: Arc<Paragraph>,
    start: usize,
    end: usize,
    white_space: WhiteSpace,
    overflow_wrap: OverflowWrap,
    font: FontSpec,
    line_height: LineHeight,
    text_has_leading_white_space: bool,
    text_has_trailing_white_space: bool,
    should_collapse_leading_white_space: bool,
    should_collapse_trailing_white_space: bool,
    triggers_line_break: bool,
    justification: f32,
    size: Cached<SizeInput, InlineSize>,
}

impl TextBox {
    /// A box over `paragraph[start..end]` styled by `style`.
    #[must_use]
    pub fn new(
        paragraph: Arc<Paragraph>,
        start: usize,
        end: usize,
        style: &ComputedStyle,
        triggers_line_break: bool,
    ) -> Self {
        debug_assert!(start <= end && end <= paragraph.len());
        let mut text_box = Self {
            paragraph,
            start,
            end,
            white_space: style.white_space(),
            overflow_wrap: style.overflow_wrap(),
            font: style.font(),
            line_height: style.line_height(),
            text_has_leading_white_space: false,
            text_has_trailing_white_space: false,
            should_collapse_leading_white_space: false,
            should_collapse_trailing_white_space: false,
            triggers_line_break,
            justification: 0.0,
            size: Cached::new(),
        };
        text_box.update_text_has_leading_white_space();
        text_box.update_text_has_trailing_white_space();
        text_box
    }

    /// The shared paragraph.
    #[must_use]
    pub const fn paragraph(&self) -> &Arc<Paragraph> {
        &self.paragraph
    }

    /// Byte range into the paragraph.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Everything in range, collapsible spaces included.
    #[must_use]
    pub fn text(&self) -> &str {
        self.paragraph.substring(self.start, self.end)
    }

    /// The font the box is set in.
    #[must_use]
    pub const fn font(&self) -> &FontSpec {
        &self.font
    }

    /// Computed `white-space` of the box.
    #[must_use]
    pub const fn white_space(&self) -> WhiteSpace {
        self.white_space
    }

    /// True if the box ends a line no matter how much room is left.
    #[must_use]
    pub const fn triggers_line_break(&self) -> bool {
        self.triggers_line_break
    }

    /// Resolved bidi level of the box's first character.
    #[must_use]
    pub fn bidi_level(&self) -> Level {
        self.paragraph.bidi_level(self.start)
    }

    /// Set by the line builder when the preceding content on the line
    /// already ends in collapsible space, or at the start of a line.
    pub fn set_should_collapse_leading_white_space(&mut self, collapse: bool) {
        if self.should_collapse_leading_white_space != collapse {
            self.should_collapse_leading_white_space = collapse;
            self.size.invalidate();
        }
    }

    /// Set by the line builder for the last box on a line.
    pub fn set_should_collapse_trailing_white_space(&mut self, collapse: bool) {
        if self.should_collapse_trailing_white_space != collapse {
            self.should_collapse_trailing_white_space = collapse;
            self.size.invalidate();
        }
    }

    /// The leading space is rendered.
    ///
    /// A whitespace-only box whose trailing edge collapses renders nothing,
    /// so it cannot produce a phantom space between its neighbours.
    #[must_use]
    pub fn has_leading_white_space(&self) -> bool {
        self.text_has_leading_white_space
            && !self.should_collapse_leading_white_space
            && (self.has_non_collapsible_text() || !self.should_collapse_trailing_white_space)
    }

    /// The trailing space is rendered.
    #[must_use]
    pub fn has_trailing_white_space(&self) -> bool {
        self.text_has_trailing_white_space
            && !self.should_collapse_trailing_white_space
            && (self.has_non_collapsible_text() || !self.should_collapse_leading_white_space)
    }

    /// Nothing of the box would be rendered.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        !self.has_leading_white_space()
            && !self.has_trailing_white_space()
            && !self.has_non_collapsible_text()
    }

    /// A line holding only this box must still exist.
    #[must_use]
    pub fn justifies_line_existence(&self) -> bool {
        self.has_non_collapsible_text() || self.triggers_line_break
    }

    fn non_collapsible_range(&self) -> Range<usize> {
        let start = if self.text_has_leading_white_space {
            self.start + 1
        } else {
            self.start
        };
        let end = if self.text_has_trailing_white_space {
            self.end - 1
        } else {
            self.end
        };
        start..end
    }

    /// True if anything but collapsible edge spaces is in range.
    #[must_use]
    pub fn has_non_collapsible_text(&self) -> bool {
        let range = self.non_collapsible_range();
        range.start < range.end
    }

    /// The text between the collapsible edge spaces.
    #[must_use]
    pub fn non_collapsible_text(&self) -> &str {
        let range = self.non_collapsible_range();
        if range.start < range.end {
            self.paragraph.substring(range.start, range.end)
        } else {
            ""
        }
    }

    /// [CSS Text § 7.3 Justification](https://www.w3.org/TR/css-text-3/#justify-alignment)
    ///
    /// Extra advance added to every rendered space. Set by the line builder
    /// on justified lines.
    pub fn set_justification(&mut self, extra: f32) {
        if self.justification.to_bits() != extra.to_bits() {
            self.justification = extra;
            self.size.invalidate();
        }
    }

    /// Extra advance per rendered space.
    #[must_use]
    pub const fn justification(&self) -> f32 {
        self.justification
    }

    /// Rendered spaces that can absorb justification: the word separators
    /// inside the text plus any rendered edge space.
    #[must_use]
    pub fn justification_opportunities(&self) -> usize {
        let interior = self.interior_space_count();
        let leading = usize::from(self.has_leading_white_space());
        let trailing = usize::from(self.has_trailing_white_space() && self.has_non_collapsible_text());
        interior + leading + trailing
    }

    fn interior_space_count(&self) -> usize {
        self.non_collapsible_text().chars().filter(|c| *c == ' ').count()
    }

    fn space_width(&self, cx: &MeasureContext<'_>) -> f32 {
        cx.metrics.text_width(" ", &self.font) + self.justification
    }

    /// Width of the rendered leading space, if any.
    #[must_use]
    pub fn leading_white_space_width(&self, cx: &MeasureContext<'_>) -> f32 {
        if self.has_leading_white_space() {
            self.space_width(cx)
        } else {
            0.0
        }
    }

    /// Width of the rendered trailing space. Counted only when there is
    /// text for it to follow.
    #[must_use]
    pub fn trailing_white_space_width(&self, cx: &MeasureContext<'_>) -> f32 {
        if self.has_trailing_white_space() && self.has_non_collapsible_text() {
            self.space_width(cx)
        } else {
            0.0
        }
    }

    /// The size from the last measurement, unless something invalidated it.
    #[must_use]
    pub fn cached_size(&self) -> Option<InlineSize> {
        self.size.get().copied()
    }

    /// Cut this box at `position` and return a sibling over the rest.
    ///
    /// The sibling shares the paragraph. Only this box's trailing flag is
    /// rescanned; a pending forced line break moves to the sibling.
    #[must_use]
    pub fn split_at_position(&mut self, position: usize) -> Self {
        debug_assert!(self.start <= position && position <= self.end);
        let old_end = self.end;
        self.end = position;
        self.size.invalidate();
        self.update_text_has_trailing_white_space();

        let mut sibling = Self {
            paragraph: Arc::clone(&self.paragraph),
            start: position,
            end: old_end,
            white_space: self.white_space,
            overflow_wrap: self.overflow_wrap,
            font: self.font.clone(),
            line_height: self.line_height,
            text_has_leading_white_space: false,
            text_has_trailing_white_space: false,
            should_collapse_leading_white_space: false,
            should_collapse_trailing_white_space: false,
            triggers_line_break: self.triggers_line_break,
            justification: 0.0,
            size: Cached::new(),
        };
        sibling.update_text_has_leading_white_space();
        sibling.update_text_has_trailing_white_space();
        self.triggers_line_break = false;
        #[cfg(feature = "layout-trace")]
        log::trace!(
            target: "layout",
            "split text box at {position}: [{}, {}) + [{}, {})",
            self.start,
            self.end,
            sibling.start,
            sibling.end
        );
        sibling
    }

    fn update_text_has_leading_white_space(&mut self) {
        if self.white_space.collapses() {
            self.text_has_leading_white_space =
                self.start != self.end && self.paragraph.is_space(self.start);
        }
    }

    fn update_text_has_trailing_white_space(&mut self) {
        if self.white_space.collapses() {
            self.text_has_trailing_white_space =
                self.start != self.end && self.paragraph.is_space(self.end - 1);
        }
    }
}

impl Measurable for TextBox {
    /// Width is the sum of the leading space, the text and the trailing
    /// space, each rounded to the layout grid first. Height and baseline
    /// come from `line-height`.
    fn measure(&mut self, cx: &MeasureContext<'_>) -> InlineSize {
        let input = SizeInput {
            range: (self.start, self.end),
            leading: self.has_leading_white_space(),
            trailing: self.has_trailing_white_space(),
            justification: self.justification,
            precision: cx.config.subpixel_precision,
        };
        let mut slot = std::mem::take(&mut self.size);
        let size = *slot.get_or_update(&input, |_| self.compute_size(cx));
        self.size = slot;
        size
    }
}

impl TextBox {
    fn compute_size(&self, cx: &MeasureContext<'_>) -> InlineSize {
        let precision = cx.config.subpixel_precision;
        let leading = snap(self.leading_white_space_width(cx), precision);
        #[allow(clippy::cast_precision_loss)]
        let text = if self.has_non_collapsible_text() {
            let spread = self.interior_space_count() as f32 * self.justification;
            snap(
                cx.metrics.text_width(self.non_collapsible_text(), &self.font) + spread,
                precision,
            )
        } else {
            0.0
        };
        let trailing = snap(self.trailing_white_space_width(cx), precision);
        let line = line_box_metrics(self.line_height, &self.font, cx.metrics);
        InlineSize {
            width: leading + text + trailing,
            height: line.height,
            baseline: line.baseline,
        }
    }
}

impl Splittable for TextBox {
    fn try_split_at(
        &mut self,
        available_width: f32,
        allow_overflow: bool,
        cx: &MeasureContext<'_>,
    ) -> Option<Self> {
        if !self.white_space.allows_wrapping() {
            return None;
        }
        // Never break inside the leading space; it still takes room.
        let available_width = available_width - self.leading_white_space_width(cx);
        let start = self.non_collapsible_range().start;
        let (position, _) = self.paragraph.calculate_break_position(
            &self.font,
            cx.metrics,
            start,
            self.end,
            available_width,
            allow_overflow,
            self.overflow_wrap,
        )?;
        Some(self.split_at_position(position))
    }

    fn try_split_at_second_bidi_level_run(&mut self) -> Option<Self> {
        let position = self.paragraph.next_run_position(self.start)?;
        (position < self.end).then(|| self.split_at_position(position))
    }
}

impl Paintable for TextBox {
    /// The non-collapsible text, starting after the rendered leading space
    /// and sitting on the baseline of the box's line height.
    fn paint(
        &self,
        style: &ComputedStyle,
        dimensions: &BoxDimensions,
        cx: &MeasureContext<'_>,
        list: &mut DisplayList,
    ) {
        if !self.has_non_collapsible_text() {
            return;
        }
        let baseline = line_box_metrics(self.line_height, &self.font, cx.metrics).baseline;
        list.push(DisplayCommand::DrawText {
            text: self.non_collapsible_text().to_string(),
            x: dimensions.content.x + snap(self.leading_white_space_width(cx), cx.config.subpixel_precision),
            y: dimensions.content.y + baseline,
            font: self.font.clone(),
            color: style.color(),
            bidi_level: self.bidi_level().number(),
            word_spacing: self.justification,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font::{ApproximateFontMetrics, LayoutConfig};
    use crate::style::Direction;
    use crate::values::{Keyword, Property, Value};

    fn text_box(text: &str) -> TextBox {
        let paragraph = Arc::new(Paragraph::new(text, Direction::Ltr));
        let end = paragraph.len();
        TextBox::new(paragraph, 0, end, &ComputedStyle::initial(), false)
    }

    #[test]
    fn test_single_space_collapses_to_nothing() {
        let config = LayoutConfig::default();
        let cx = MeasureContext::new(&ApproximateFontMetrics, &config);
        let mut b = text_box(" ");
        assert!(!b.has_non_collapsible_text());
        // Uncollapsed, the lone space still renders as leading space.
        assert!(b.has_leading_white_space());

        b.set_should_collapse_leading_white_space(true);
        b.set_should_collapse_trailing_white_space(true);
        assert!(b.is_collapsed());
        assert_eq!(b.measure(&cx).width, 0.0);
    }

    #[test]
    fn test_whitespace_only_box_with_collapsing_trailing_edge() {
        let mut b = text_box(" ");
        b.set_should_collapse_trailing_white_space(true);
        assert!(!b.has_leading_white_space());
        assert!(b.is_collapsed());
    }

    #[test]
    fn test_split_moves_line_break_and_shares_paragraph() {
        let paragraph = Arc::new(Paragraph::new("ab cd", Direction::Ltr));
        let mut first = TextBox::new(Arc::clone(&paragraph), 0, 5, &ComputedStyle::initial(), true);
        let second = first.split_at_position(3);
        assert_eq!(first.range(), 0..3);
        assert_eq!(second.range(), 3..5);
        assert!(!first.triggers_line_break());
        assert!(second.triggers_line_break());
        assert!(Arc::ptr_eq(first.paragraph(), second.paragraph()));
        assert_eq!(first.non_collapsible_text(), "ab");
        assert_eq!(second.non_collapsible_text(), "cd");
    }

    #[test]
    fn test_size_cache_invalidated_by_flag_change_only() {
        let config = LayoutConfig::default();
        let cx = MeasureContext::new(&ApproximateFontMetrics, &config);
        let mut b = text_box(" ab ");
        let full = b.measure(&cx).width;
        assert!(b.cached_size().is_some());

        b.set_should_collapse_leading_white_space(false);
        assert!(b.cached_size().is_some());

        b.set_should_collapse_leading_white_space(true);
        assert!(b.cached_size().is_none());
        let trimmed = b.measure(&cx).width;
        assert!((full - trimmed - 9.6).abs() < 0.02);
    }

    #[test]
    fn test_no_wrap_never_splits() {
        let config = LayoutConfig::default();
        let cx = MeasureContext::new(&ApproximateFontMetrics, &config);
        let paragraph = Arc::new(Paragraph::new("a b c", Direction::Ltr));
        let mut values: std::collections::BTreeMap<Property, Value> =
            ComputedStyle::initial().iter().map(|(p, v)| (p, v.clone())).collect();
        let _ = values.insert(Property::WhiteSpace, Value::Keyword(Keyword::Nowrap));
        let style = ComputedStyle::from_values(values);
        let mut b = TextBox::new(paragraph, 0, 5, &style, false);
        assert_eq!(b.white_space(), WhiteSpace::Nowrap);
        assert!(b.try_split_at(1.0, true, &cx).is_none());
    }
}
