//! Font descriptions and the metrics interface.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."
//!
//! Shaping and glyph metrics live outside this crate. Layout only sees the
//! [`FontMetrics`] trait.

use serde::Serialize;

use crate::style::LineHeight;

/// The font a run of text is set in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSpec {
    /// Family name.
    pub family: String,
    /// Size in CSS pixels.
    pub size: f32,
    /// Numeric weight, 1 to 1000.
    pub weight: u16,
    /// Italic face.
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 16.0,
            weight: 400,
            italic: false,
        }
    }
}

/// Vertical metrics of a font at a given size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LineMetrics {
    /// Height above the baseline.
    pub ascent: f32,
    /// Depth below the baseline (positive).
    pub descent: f32,
    /// Recommended extra space between lines.
    pub line_gap: f32,
}

/// Text measurement supplied by the embedder.
pub trait FontMetrics {
    /// Total advance width of `text` set in `font`.
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;

    /// Ascent, descent and line gap of `font`.
    fn line_metrics(&self, font: &FontSpec) -> LineMetrics;
}

/// Fixed-ratio metrics used when no real font is available, and in tests.
///
/// Every character advances `0.6 × size`; ascent and descent split the em
/// box 0.8/0.2 and the line gap is `0.2 × size`, so `line-height: normal`
/// comes out at `1.2 × size`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    // Ratios are applied as exact fifths so integral sizes give exact widths.
    #[allow(clippy::cast_precision_loss)]
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * font.size * 3.0 / 5.0
    }

    fn line_metrics(&self, font: &FontSpec) -> LineMetrics {
        LineMetrics {
            ascent: font.size * 4.0 / 5.0,
            descent: font.size / 5.0,
            line_gap: font.size / 5.0,
        }
    }
}

/// Used height of one line of text and where its baseline sits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LineBoxMetrics {
    /// Used `line-height`.
    pub height: f32,
    /// Distance from the top of the line box to the baseline.
    pub baseline: f32,
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
///
/// "The difference between A+D and the used line-height is the leading.
/// Half the leading is added above A and the other half below D."
#[must_use]
pub fn line_box_metrics(
    line_height: LineHeight,
    font: &FontSpec,
    metrics: &dyn FontMetrics,
) -> LineBoxMetrics {
    let LineMetrics {
        ascent,
        descent,
        line_gap,
    } = metrics.line_metrics(font);
    let height = match line_height {
        LineHeight::Normal => ascent + descent + line_gap,
        LineHeight::Number(factor) => factor * font.size,
        LineHeight::Px(px) => px,
    };
    let half_leading = (height - (ascent + descent)) / 2.0;
    LineBoxMetrics {
        height,
        baseline: half_leading + ascent,
    }
}

/// Round to the layout grid. A non-positive `precision` leaves the value
/// as it is.
#[must_use]
pub fn snap(value: f32, precision: f32) -> f32 {
    if precision > 0.0 {
        (value / precision).round() * precision
    } else {
        value
    }
}

/// Run-time layout knobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutConfig {
    /// Font of the root element; inherited wherever no rule sets one.
    pub default_font: FontSpec,
    /// Granularity every measured width is rounded to.
    pub subpixel_precision: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_font: FontSpec::default(),
            subpixel_precision: 1.0 / 64.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_line_height_from_metrics() {
        let font = FontSpec::default();
        let m = line_box_metrics(LineHeight::Normal, &font, &ApproximateFontMetrics);
        assert!((m.height - 19.2).abs() < 1e-4);
        // half-leading 1.6 + ascent 12.8
        assert!((m.baseline - 14.4).abs() < 1e-4);
    }

    #[test]
    fn test_explicit_line_height_half_leading() {
        let font = FontSpec::default();
        let m = line_box_metrics(LineHeight::Px(30.0), &font, &ApproximateFontMetrics);
        assert_eq!(m.height, 30.0);
        assert!((m.baseline - 19.8).abs() < 1e-4);
    }

    #[test]
    fn test_snap_to_64ths() {
        assert_eq!(snap(1.0 / 128.0 + 1.0, 1.0 / 64.0), 1.0 + 1.0 / 64.0);
        assert_eq!(snap(9.6, 1.0 / 64.0), 614.0 / 64.0);
    }

    #[test]
    fn test_snap_without_grid_keeps_value() {
        assert_eq!(snap(9.6, 0.0), 9.6);
        assert_eq!(snap(9.6, -1.0), 9.6);
    }
}
