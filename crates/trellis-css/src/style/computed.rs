//! Computed style values.
//!
//! [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)
//!
//! "The computed value is the result of resolving the specified value as
//! defined in the 'Computed Value' line of the property definition table,
//! generally absolutizing it in preparation for inheritance."

use std::collections::BTreeMap;

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::layout::font::FontSpec;
use crate::values::{Color, Keyword, Property, Value};

/// [§ 2 Box layout modes](https://www.w3.org/TR/css-display-3/#the-display-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Display {
    /// Generates a block-level block container.
    Block,
    /// Generates an inline box.
    Inline,
    /// "The element and its descendants generate no boxes."
    None,
}

/// [§ 3 White Space and Wrapping](https://www.w3.org/TR/css-text-3/#white-space-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WhiteSpace {
    /// Collapse and wrap.
    Normal,
    /// Preserve and never wrap; newlines force breaks.
    Pre,
    /// Collapse but never wrap.
    Nowrap,
}

impl WhiteSpace {
    /// True if runs of spaces collapse into one.
    #[must_use]
    pub const fn collapses(self) -> bool {
        !matches!(self, Self::Pre)
    }

    /// True if lines may soft-wrap.
    #[must_use]
    pub const fn allows_wrapping(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// [§ 5.5 Overflow wrapping](https://www.w3.org/TR/css-text-3/#overflow-wrap-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverflowWrap {
    /// Break only at soft wrap opportunities.
    Normal,
    /// An unbreakable word may be broken at an arbitrary point.
    BreakWord,
}

/// [§ 2.1 Specifying Directionality](https://www.w3.org/TR/css-writing-modes-3/#direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Left to right.
    Ltr,
    /// Right to left.
    Rtl,
}

/// [§ 11.2 Visibility](https://www.w3.org/TR/CSS2/visufx.html#visibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    /// Painted.
    Visible,
    /// "The generated box is invisible (fully transparent, nothing is drawn),
    /// but still affects layout."
    Hidden,
}

/// [§ 16.2 Alignment](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TextAlign {
    /// Flush with the start edge.
    #[default]
    Left,
    /// Flush with the end edge.
    Right,
    /// Centered in the line box.
    Center,
    /// Spread to both edges; the last line is left-aligned.
    Justify,
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LineHeight {
    /// Taken from the font's metrics.
    Normal,
    /// Multiplier of the element's font size.
    Number(f32),
    /// An absolute height in CSS pixels.
    Px(f32),
}

/// A computed `<length-percentage> | auto` that still needs a basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LengthPercentageAuto {
    /// `auto`
    Auto,
    /// Pixels.
    Px(f32),
    /// Percentage of the containing block width.
    Percent(f32),
}

/// [§ 4.4 Automatic values](https://www.w3.org/TR/CSS2/cascade.html#value-def-auto)
///
/// A used value that may still be 'auto'.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AutoOr {
    /// Resolved during layout.
    #[default]
    Auto,
    /// A length in pixels.
    Length(f32),
}

impl AutoOr {
    /// Check if the value is 'auto'.
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }

    /// The length, or `default` if 'auto'.
    #[must_use]
    pub const fn to_px_or(self, default: f32) -> f32 {
        match self {
            Self::Length(v) => v,
            Self::Auto => default,
        }
    }
}

impl LengthPercentageAuto {
    /// Resolve percentages against `basis`.
    #[must_use]
    pub fn resolve(self, basis: f32) -> AutoOr {
        match self {
            Self::Auto => AutoOr::Auto,
            Self::Px(px) => AutoOr::Length(px),
            Self::Percent(pct) => AutoOr::Length(basis * pct / 100.0),
        }
    }
}

/// Four sides of something, in CSS order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Sides<T> {
    /// Top.
    pub top: T,
    /// Right.
    pub right: T,
    /// Bottom.
    pub bottom: T,
    /// Left.
    pub left: T,
}

/// A complete, immutable set of computed values for one element.
///
/// Always holds a value for every [`Property`]. Instances are shared as
/// `Arc<ComputedStyle>` and never mutated after the cascade creates them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedStyle {
    values: BTreeMap<Property, Value>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self::initial()
    }
}

impl ComputedStyle {
    /// Every property at its initial value.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            values: Property::iter().map(|p| (p, p.initial_value())).collect(),
        }
    }

    /// A copy with the font properties set from `font`. Used as the parent
    /// of the root element so the whole document inherits a default font.
    #[must_use]
    pub fn with_font(&self, font: &FontSpec) -> Self {
        let mut values = self.values.clone();
        let _ = values.insert(Property::FontFamily, Value::String(font.family.clone()));
        let _ = values.insert(Property::FontSize, Value::px(font.size));
        let _ = values.insert(Property::FontWeight, Value::Number(f32::from(font.weight)));
        let style = if font.italic {
            Keyword::Italic
        } else {
            Keyword::Normal
        };
        let _ = values.insert(Property::FontStyle, Value::Keyword(style));
        Self { values }
    }

    pub(crate) const fn from_values(values: BTreeMap<Property, Value>) -> Self {
        Self { values }
    }

    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "The properties of anonymous boxes are inherited from the enclosing
    /// non-anonymous box. Non-inherited properties have their initial
    /// value."
    #[must_use]
    pub fn anonymous_child(&self, display: Keyword) -> Self {
        let values = Property::iter()
            .map(|p| {
                let value = match p {
                    Property::Display => Value::Keyword(display),
                    p if p.is_inherited() => self.get(p).clone(),
                    p => p.initial_value(),
                };
                (p, value)
            })
            .collect();
        Self { values }
    }

    /// The computed value of `property`.
    #[must_use]
    pub fn get(&self, property: Property) -> &Value {
        // Every property is present by construction; the fallback only
        // guards hand-built maps.
        self.values.get(&property).unwrap_or(&INITIAL_AUTO)
    }

    /// Script-facing lookup by CSS property name (`getComputedStyle`-style).
    #[must_use]
    pub fn property_value(&self, name: &str) -> Option<&Value> {
        Property::from_name(name).map(|p| self.get(p))
    }

    /// Iterate `(property, value)` in property order.
    pub fn iter(&self) -> impl Iterator<Item = (Property, &Value)> {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    fn keyword(&self, property: Property) -> Option<Keyword> {
        self.get(property).as_keyword()
    }

    fn px(&self, property: Property) -> f32 {
        self.get(property).as_px().unwrap_or(0.0)
    }

    /// Computed `display`.
    #[must_use]
    pub fn display(&self) -> Display {
        match self.keyword(Property::Display) {
            Some(Keyword::Block) => Display::Block,
            Some(Keyword::None) => Display::None,
            _ => Display::Inline,
        }
    }

    /// Computed `white-space`.
    #[must_use]
    pub fn white_space(&self) -> WhiteSpace {
        match self.keyword(Property::WhiteSpace) {
            Some(Keyword::Pre) => WhiteSpace::Pre,
            Some(Keyword::Nowrap) => WhiteSpace::Nowrap,
            _ => WhiteSpace::Normal,
        }
    }

    /// Computed `overflow-wrap`.
    #[must_use]
    pub fn overflow_wrap(&self) -> OverflowWrap {
        match self.keyword(Property::OverflowWrap) {
            Some(Keyword::BreakWord) => OverflowWrap::BreakWord,
            _ => OverflowWrap::Normal,
        }
    }

    /// Computed `direction`.
    #[must_use]
    pub fn direction(&self) -> Direction {
        match self.keyword(Property::Direction) {
            Some(Keyword::Rtl) => Direction::Rtl,
            _ => Direction::Ltr,
        }
    }

    /// Computed `visibility`.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        match self.keyword(Property::Visibility) {
            Some(Keyword::Hidden) => Visibility::Hidden,
            _ => Visibility::Visible,
        }
    }

    /// Computed `text-align`.
    #[must_use]
    pub fn text_align(&self) -> TextAlign {
        match self.keyword(Property::TextAlign) {
            Some(Keyword::Right) => TextAlign::Right,
            Some(Keyword::Center) => TextAlign::Center,
            Some(Keyword::Justify) => TextAlign::Justify,
            _ => TextAlign::Left,
        }
    }

    /// Computed `line-height`.
    #[must_use]
    pub fn line_height(&self) -> LineHeight {
        match self.get(Property::LineHeight) {
            Value::Number(n) => LineHeight::Number(*n),
            value => value.as_px().map_or(LineHeight::Normal, LineHeight::Px),
        }
    }

    /// Computed `font-size` in pixels.
    #[must_use]
    pub fn font_size(&self) -> f32 {
        self.get(Property::FontSize).as_px().unwrap_or(16.0)
    }

    /// The font this element's text is set in.
    #[must_use]
    pub fn font(&self) -> FontSpec {
        let family = match self.get(Property::FontFamily) {
            Value::String(family) => family.clone(),
            _ => "sans-serif".to_string(),
        };
        let weight = match self.get(Property::FontWeight) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Value::Number(w) => w.clamp(1.0, 1000.0) as u16,
            _ => 400,
        };
        FontSpec {
            family,
            size: self.font_size(),
            weight,
            italic: self.keyword(Property::FontStyle) == Some(Keyword::Italic),
        }
    }

    /// Computed `color`.
    #[must_use]
    pub fn color(&self) -> Color {
        match self.get(Property::Color) {
            Value::Color(c) => *c,
            _ => Color::BLACK,
        }
    }

    /// Background color, or `None` if nothing would be painted.
    #[must_use]
    pub fn background_color(&self) -> Option<Color> {
        match self.get(Property::BackgroundColor) {
            Value::Color(c) if !c.is_transparent() => Some(*c),
            _ => None,
        }
    }

    /// Border color with `currentcolor` resolved.
    #[must_use]
    pub fn border_color(&self) -> Color {
        match self.get(Property::BorderColor) {
            Value::Color(c) => *c,
            Value::Keyword(Keyword::Transparent) => Color::TRANSPARENT,
            _ => self.color(),
        }
    }

    fn length_percentage_auto(&self, property: Property) -> LengthPercentageAuto {
        match self.get(property) {
            Value::Percentage(p) => LengthPercentageAuto::Percent(*p),
            value => value
                .as_px()
                .map_or(LengthPercentageAuto::Auto, LengthPercentageAuto::Px),
        }
    }

    /// Computed `width`.
    #[must_use]
    pub fn width(&self) -> LengthPercentageAuto {
        self.length_percentage_auto(Property::Width)
    }

    /// Computed `height`.
    #[must_use]
    pub fn height(&self) -> LengthPercentageAuto {
        self.length_percentage_auto(Property::Height)
    }

    /// Computed margins.
    #[must_use]
    pub fn margin(&self) -> Sides<LengthPercentageAuto> {
        Sides {
            top: self.length_percentage_auto(Property::MarginTop),
            right: self.length_percentage_auto(Property::MarginRight),
            bottom: self.length_percentage_auto(Property::MarginBottom),
            left: self.length_percentage_auto(Property::MarginLeft),
        }
    }

    /// Computed padding; `auto` is not a valid padding and reads as zero.
    #[must_use]
    pub fn padding(&self) -> Sides<LengthPercentageAuto> {
        let non_auto = |p| match self.length_percentage_auto(p) {
            LengthPercentageAuto::Auto => LengthPercentageAuto::Px(0.0),
            other => other,
        };
        Sides {
            top: non_auto(Property::PaddingTop),
            right: non_auto(Property::PaddingRight),
            bottom: non_auto(Property::PaddingBottom),
            left: non_auto(Property::PaddingLeft),
        }
    }

    /// Computed border widths in pixels.
    #[must_use]
    pub fn border_width(&self) -> Sides<f32> {
        Sides {
            top: self.px(Property::BorderTopWidth),
            right: self.px(Property::BorderRightWidth),
            bottom: self.px(Property::BorderBottomWidth),
            left: self.px(Property::BorderLeftWidth),
        }
    }
}

static INITIAL_AUTO: Value = Value::Keyword(Keyword::Auto);
