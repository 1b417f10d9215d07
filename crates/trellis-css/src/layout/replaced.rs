//! Replaced elements.
//!
//! [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
//! [§ 10.6.2 Inline replaced elements, block-level replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-height)
//!
//! The content of a replaced box comes from a [`ContentProvider`]. Layout
//! only asks it for an intrinsic size; frames are fetched at paint time.
//!
//! Every replaced box is treated as having an intrinsic ratio. When the
//! provider reports none, [`FALLBACK_INTRINSIC_RATIO`] is used, so a box with
//! no intrinsic information at all comes out 300 × 150.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use unicode_bidi::Level;

use super::block::resolve_horizontal_margins;
use super::box_model::{BoxDimensions, EdgeSizes, Rect};
use super::box_tree::{InlineSize, MeasureContext, Measurable, Paintable, Splittable};
use super::cache::Cached;
use crate::paint::{DisplayCommand, DisplayList};
use crate::style::{AutoOr, ComputedStyle, Display, LengthPercentageAuto, Sides};
use crate::values::Color;

/// Ratio assumed when the content has none.
pub const FALLBACK_INTRINSIC_RATIO: f32 = 2.0;

/// Used `width` when nothing else determines it.
pub const FALLBACK_WIDTH: f32 = 300.0;

/// What the content knows about its own size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IntrinsicSize {
    /// Natural width in CSS pixels.
    pub width: Option<f32>,
    /// Natural height in CSS pixels.
    pub height: Option<f32>,
    /// Width divided by height.
    pub ratio: Option<f32>,
}

impl IntrinsicSize {
    /// Width and height known; the ratio follows from them.
    #[must_use]
    pub fn from_dimensions(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ratio: (height > 0.0).then(|| width / height),
        }
    }
}

/// A decoded frame, by reference. Pixel data stays with the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaFrame {
    /// Embedder's handle for the frame.
    pub id: u64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Supplies content for a replaced box.
pub trait ContentProvider: Send + Sync {
    /// Size information, possibly partial.
    fn intrinsic_size(&self) -> IntrinsicSize;

    /// The frame to draw right now, if one is decoded.
    fn current_frame(&self) -> Option<MediaFrame>;
}

/// Content that never produces frames; sized from markup attributes only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticContent {
    size: IntrinsicSize,
}

impl StaticContent {
    /// Content with the given intrinsic size.
    #[must_use]
    pub const fn new(size: IntrinsicSize) -> Self {
        Self { size }
    }
}

impl ContentProvider for StaticContent {
    fn intrinsic_size(&self) -> IntrinsicSize {
        self.size
    }

    fn current_frame(&self) -> Option<MediaFrame> {
        None
    }
}

/// Result of replaced sizing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsedReplacedSize {
    /// Used content width.
    pub width: f32,
    /// Used content height.
    pub height: f32,
    /// Used margins.
    pub margin: EdgeSizes,
    /// Used padding.
    pub padding: EdgeSizes,
    /// Used border widths.
    pub border: EdgeSizes,
}

impl UsedReplacedSize {
    /// Geometry with the margin box's top-left corner at `(x, y)`.
    #[must_use]
    pub fn place_at(&self, x: f32, y: f32) -> BoxDimensions {
        BoxDimensions {
            content: Rect::new(
                x + self.margin.left + self.border.left + self.padding.left,
                y + self.margin.top + self.border.top + self.padding.top,
                self.width,
                self.height,
            ),
            padding: self.padding,
            border: self.border,
            margin: self.margin,
        }
    }
}

/// A box whose content is drawn by someone else.
pub struct ReplacedBox {
    provider: Arc<dyn ContentProvider>,
    intrinsic: IntrinsicSize,
    ratio: f32,
    width: LengthPercentageAuto,
    height: LengthPercentageAuto,
    margin: Sides<LengthPercentageAuto>,
    padding: Sides<LengthPercentageAuto>,
    border: EdgeSizes,
    block_level: bool,
    bidi_level: Level,
    used: Cached<u32, UsedReplacedSize>,
}

impl ReplacedBox {
    /// Snapshot the provider's intrinsic size and the box-sizing properties
    /// of `style`.
    #[must_use]
    pub fn new(provider: Arc<dyn ContentProvider>, style: &ComputedStyle, bidi_level: Level) -> Self {
        let intrinsic = provider.intrinsic_size();
        Self {
            ratio: intrinsic
                .ratio
                .filter(|r| r.is_finite() && *r > 0.0)
                .unwrap_or(FALLBACK_INTRINSIC_RATIO),
            intrinsic,
            provider,
            width: style.width(),
            height: style.height(),
            margin: style.margin(),
            padding: style.padding(),
            border: style.border_width().into(),
            block_level: style.display() == Display::Block,
            bidi_level,
            used: Cached::new(),
        }
    }

    /// The content provider.
    #[must_use]
    pub const fn provider(&self) -> &Arc<dyn ContentProvider> {
        &self.provider
    }

    /// Intrinsic size captured when the box was built.
    #[must_use]
    pub const fn intrinsic(&self) -> IntrinsicSize {
        self.intrinsic
    }

    /// Ratio used for sizing, fallback applied.
    #[must_use]
    pub const fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Bidi level of the position the box occupies in its paragraph.
    #[must_use]
    pub const fn bidi_level(&self) -> Level {
        self.bidi_level
    }

    /// Resolve used width, height and margins inside a containing block
    /// `containing_width` wide.
    #[must_use]
    pub fn resolve_used_size(&self, containing_width: f32) -> UsedReplacedSize {
        let specified_width = self.width.resolve(containing_width);
        // A percentage height against an auto-height containing block
        // behaves as auto.
        let specified_height = match self.height {
            LengthPercentageAuto::Px(px) => AutoOr::Length(px),
            LengthPercentageAuto::Auto | LengthPercentageAuto::Percent(_) => AutoOr::Auto,
        };

        // STEP 1: Width.
        let width = match (specified_width, specified_height) {
            (AutoOr::Length(w), _) => w,
            // "If 'height' and 'width' both have computed values of 'auto'
            // and the element also has an intrinsic width, then that
            // intrinsic width is the used value of 'width'."
            (AutoOr::Auto, AutoOr::Auto) => match (self.intrinsic.width, self.intrinsic.height) {
                (Some(w), _) => w,
                (None, Some(h)) => h * self.ratio,
                (None, None) => FALLBACK_WIDTH,
            },
            // "(used height) * (intrinsic ratio)"
            (AutoOr::Auto, AutoOr::Length(h)) => h * self.ratio,
        };

        // STEP 2: Height.
        let height = match (specified_height, specified_width, self.intrinsic.height) {
            (AutoOr::Length(h), _, _) => h,
            (AutoOr::Auto, AutoOr::Auto, Some(h)) => h,
            // "(used width) / (intrinsic ratio)"
            (AutoOr::Auto, _, _) => width / self.ratio,
        };

        // STEP 3: Margins. Horizontal ones follow the rule for the box's
        // level; vertical 'auto' margins are 0.
        let padding = EdgeSizes {
            top: self.padding.top.resolve(containing_width).to_px_or(0.0),
            right: self.padding.right.resolve(containing_width).to_px_or(0.0),
            bottom: self.padding.bottom.resolve(containing_width).to_px_or(0.0),
            left: self.padding.left.resolve(containing_width).to_px_or(0.0),
        };
        let border_box_width = width + padding.horizontal() + self.border.horizontal();
        let margin_left = self.margin.left.resolve(containing_width);
        let margin_right = self.margin.right.resolve(containing_width);
        let (left, right) = if self.block_level {
            resolve_horizontal_margins(containing_width, border_box_width, margin_left, margin_right)
        } else {
            (margin_left.to_px_or(0.0), margin_right.to_px_or(0.0))
        };
        let margin = EdgeSizes {
            top: self.margin.top.resolve(containing_width).to_px_or(0.0),
            right,
            bottom: self.margin.bottom.resolve(containing_width).to_px_or(0.0),
            left,
        };

        UsedReplacedSize {
            width,
            height,
            margin,
            padding,
            border: self.border,
        }
    }

    /// [`resolve_used_size`](Self::resolve_used_size), cached per
    /// containing block width.
    pub fn used_size(&mut self, containing_width: f32) -> UsedReplacedSize {
        let mut slot = std::mem::take(&mut self.used);
        let size = *slot.get_or_update(&containing_width.to_bits(), |_| {
            self.resolve_used_size(containing_width)
        });
        self.used = slot;
        size
    }
}

impl fmt::Debug for ReplacedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplacedBox")
            .field("intrinsic", &self.intrinsic)
            .field("ratio", &self.ratio)
            .field("block_level", &self.block_level)
            .finish_non_exhaustive()
    }
}

impl Clone for ReplacedBox {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            intrinsic: self.intrinsic,
            ratio: self.ratio,
            width: self.width,
            height: self.height,
            margin: self.margin,
            padding: self.padding,
            border: self.border,
            block_level: self.block_level,
            bidi_level: self.bidi_level,
            used: self.used.clone(),
        }
    }
}

impl Measurable for ReplacedBox {
    /// The margin box; it sits on the baseline with its bottom edge.
    fn measure(&mut self, cx: &MeasureContext<'_>) -> InlineSize {
        let used = self.used_size(cx.containing_width);
        let height = used.height + used.padding.vertical() + used.border.vertical() + used.margin.vertical();
        InlineSize {
            width: used.width + used.padding.horizontal() + used.border.horizontal() + used.margin.horizontal(),
            height,
            baseline: height,
        }
    }
}

impl Splittable for ReplacedBox {
    fn try_split_at(&mut self, _: f32, _: bool, _: &MeasureContext<'_>) -> Option<Self> {
        None
    }

    fn try_split_at_second_bidi_level_run(&mut self) -> Option<Self> {
        None
    }
}

impl Paintable for ReplacedBox {
    /// Letterbox the current frame into the content box, filling the
    /// uncovered bands with black.
    fn paint(
        &self,
        _: &ComputedStyle,
        dimensions: &BoxDimensions,
        _: &MeasureContext<'_>,
        list: &mut DisplayList,
    ) {
        let Some(frame) = self.provider.current_frame() else {
            return;
        };
        let mut dest = dimensions.content;
        #[allow(clippy::cast_precision_loss)]
        let (frame_width, frame_height) = (frame.width as f32, frame.height as f32);
        if dest.height <= 0.0 {
            dest.width = frame_width;
            dest.height = frame_height;
        }
        if frame_width <= 0.0 || frame_height <= 0.0 {
            list.push(DisplayCommand::FillRect { rect: dest, color: Color::BLACK });
            return;
        }

        let scale = (dest.width / frame_width).min(dest.height / frame_height);
        let image = Rect::new(
            dest.x + (dest.width - frame_width * scale) / 2.0,
            dest.y + (dest.height - frame_height * scale) / 2.0,
            frame_width * scale,
            frame_height * scale,
        );
        for bar in letterbox_bars(dest, image) {
            list.push(DisplayCommand::FillRect { rect: bar, color: Color::BLACK });
        }
        list.push(DisplayCommand::DrawReplaced { frame, rect: image });
    }
}

/// Parts of `dest` not covered by the centered `image`.
fn letterbox_bars(dest: Rect, image: Rect) -> Vec<Rect> {
    const EPSILON: f32 = 0.01;
    let mut bars = Vec::new();
    if image.width + EPSILON < dest.width {
        let band = (dest.width - image.width) / 2.0;
        bars.push(Rect::new(dest.x, dest.y, band, dest.height));
        bars.push(Rect::new(image.right(), dest.y, band, dest.height));
    }
    if image.height + EPSILON < dest.height {
        let band = (dest.height - image.height) / 2.0;
        bars.push(Rect::new(dest.x, dest.y, dest.width, band));
        bars.push(Rect::new(dest.x, image.bottom(), dest.width, band));
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{Property, Value};

    fn replaced(size: IntrinsicSize, style: &ComputedStyle) -> ReplacedBox {
        ReplacedBox::new(Arc::new(StaticContent::new(size)), style, Level::ltr())
    }

    fn styled(values: &[(Property, Value)]) -> ComputedStyle {
        let mut map: std::collections::BTreeMap<Property, Value> =
            ComputedStyle::initial().iter().map(|(p, v)| (p, v.clone())).collect();
        for (p, v) in values {
            let _ = map.insert(*p, v.clone());
        }
        ComputedStyle::from_values(map)
    }

    #[test]
    fn test_nothing_known_is_300_by_150() {
        let used = replaced(IntrinsicSize::default(), &ComputedStyle::initial()).resolve_used_size(800.0);
        assert_eq!((used.width, used.height), (300.0, 150.0));
    }

    #[test]
    fn test_intrinsic_width_and_height_used_when_both_auto() {
        let used = replaced(IntrinsicSize::from_dimensions(64.0, 48.0), &ComputedStyle::initial())
            .resolve_used_size(800.0);
        assert_eq!((used.width, used.height), (64.0, 48.0));
    }

    #[test]
    fn test_intrinsic_height_times_ratio() {
        let size = IntrinsicSize { width: None, height: Some(50.0), ratio: Some(1.5) };
        let used = replaced(size, &ComputedStyle::initial()).resolve_used_size(800.0);
        assert_eq!((used.width, used.height), (75.0, 50.0));
    }

    #[test]
    fn test_specified_height_drives_width_through_fallback_ratio() {
        let style = styled(&[(Property::Height, Value::px(40.0))]);
        let used = replaced(IntrinsicSize::default(), &style).resolve_used_size(800.0);
        assert_eq!((used.width, used.height), (80.0, 40.0));
    }

    #[test]
    fn test_specified_width_ignores_intrinsic_height() {
        let style = styled(&[(Property::Width, Value::px(100.0))]);
        let used = replaced(IntrinsicSize::from_dimensions(64.0, 48.0), &style).resolve_used_size(800.0);
        assert_eq!(used.width, 100.0);
        assert!((used.height - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_block_level_auto_margins_center() {
        let auto = Value::Keyword(crate::values::Keyword::Auto);
        let style = styled(&[
            (Property::Display, Value::Keyword(crate::values::Keyword::Block)),
            (Property::MarginLeft, auto.clone()),
            (Property::MarginRight, auto.clone()),
            (Property::MarginTop, auto),
        ]);
        let used = replaced(IntrinsicSize::default(), &style).resolve_used_size(500.0);
        assert_eq!((used.margin.left, used.margin.right), (100.0, 100.0));
        assert_eq!(used.margin.top, 0.0);
    }

    #[test]
    fn test_letterbox_bars_for_wide_frame() {
        let bars = letterbox_bars(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(0.0, 25.0, 100.0, 50.0),
        );
        assert_eq!(
            bars,
            vec![Rect::new(0.0, 0.0, 100.0, 25.0), Rect::new(0.0, 75.0, 100.0, 25.0)]
        );
    }
}
