//! Property names, keywords and declared values.
//!
//! [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)
//!
//! Values arrive here already parsed by the external CSS parser. This module
//! only defines their shape and the per-property metadata the cascade needs
//! (inheritance and initial values).

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// A longhand property this engine resolves.
///
/// Names round-trip through `FromStr`/`Display` in CSS spelling
/// (`"background-color"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Property {
    /// [§ 2 Box layout modes](https://www.w3.org/TR/css-display-3/#the-display-properties)
    Display,
    /// Foreground color.
    Color,
    /// Background fill of the border box.
    BackgroundColor,
    /// Color of all four borders.
    BorderColor,
    /// Font family name.
    FontFamily,
    /// Font size.
    FontSize,
    /// Numeric font weight.
    FontWeight,
    /// `normal` or `italic`.
    FontStyle,
    /// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
    LineHeight,
    /// [§ 3 White space processing](https://www.w3.org/TR/css-text-3/#white-space-property)
    WhiteSpace,
    /// [§ 5.5 Overflow wrapping](https://www.w3.org/TR/css-text-3/#overflow-wrap-property)
    OverflowWrap,
    /// Base direction for bidi resolution.
    Direction,
    /// `visible` or `hidden`.
    Visibility,
    /// Horizontal alignment of line contents.
    TextAlign,
    /// Content width.
    Width,
    /// Content height.
    Height,
    /// Top margin.
    MarginTop,
    /// Right margin.
    MarginRight,
    /// Bottom margin.
    MarginBottom,
    /// Left margin.
    MarginLeft,
    /// Top padding.
    PaddingTop,
    /// Right padding.
    PaddingRight,
    /// Bottom padding.
    PaddingBottom,
    /// Left padding.
    PaddingLeft,
    /// Top border width.
    BorderTopWidth,
    /// Right border width.
    BorderRightWidth,
    /// Bottom border width.
    BorderBottomWidth,
    /// Left border width.
    BorderLeftWidth,
}

impl Property {
    /// Look a property up by its CSS name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }

    /// The CSS spelling of this property.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// [§ 7.2 Inherited properties](https://www.w3.org/TR/css-cascade-4/#inheriting)
    ///
    /// "Some properties are inherited properties, as defined in their property
    /// definition table."
    #[must_use]
    pub const fn is_inherited(self) -> bool {
        matches!(
            self,
            Self::Color
                | Self::FontFamily
                | Self::FontSize
                | Self::FontWeight
                | Self::FontStyle
                | Self::LineHeight
                | Self::WhiteSpace
                | Self::OverflowWrap
                | Self::Direction
                | Self::Visibility
                | Self::TextAlign
        )
    }

    /// [§ 7.1 Initial values](https://www.w3.org/TR/css-cascade-4/#initial-values)
    ///
    /// "Each property has an initial value, defined in the property's
    /// definition table."
    #[must_use]
    pub fn initial_value(self) -> Value {
        match self {
            Self::Display => Value::Keyword(Keyword::Inline),
            Self::Color => Value::Color(Color::BLACK),
            Self::BackgroundColor => Value::Keyword(Keyword::Transparent),
            Self::BorderColor => Value::Keyword(Keyword::CurrentColor),
            Self::FontFamily => Value::String("sans-serif".to_string()),
            Self::FontSize => Value::px(16.0),
            Self::FontWeight => Value::Number(400.0),
            Self::FontStyle | Self::LineHeight | Self::WhiteSpace | Self::OverflowWrap => {
                Value::Keyword(Keyword::Normal)
            }
            Self::Direction => Value::Keyword(Keyword::Ltr),
            Self::Visibility => Value::Keyword(Keyword::Visible),
            Self::TextAlign => Value::Keyword(Keyword::Left),
            Self::Width | Self::Height => Value::Keyword(Keyword::Auto),
            Self::MarginTop
            | Self::MarginRight
            | Self::MarginBottom
            | Self::MarginLeft
            | Self::PaddingTop
            | Self::PaddingRight
            | Self::PaddingBottom
            | Self::PaddingLeft
            | Self::BorderTopWidth
            | Self::BorderRightWidth
            | Self::BorderBottomWidth
            | Self::BorderLeftWidth => Value::px(0.0),
        }
    }
}

/// Identifier values understood by at least one property.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Keyword {
    /// `auto`
    Auto,
    /// `none`
    None,
    /// `block`
    Block,
    /// `inline`
    Inline,
    /// `normal`
    Normal,
    /// `pre`
    Pre,
    /// `nowrap`
    Nowrap,
    /// `break-word`
    BreakWord,
    /// `ltr`
    Ltr,
    /// `rtl`
    Rtl,
    /// `visible`
    Visible,
    /// `hidden`
    Hidden,
    /// `italic`
    Italic,
    /// `bold`
    Bold,
    /// `left`
    Left,
    /// `right`
    Right,
    /// `center`
    Center,
    /// `justify`
    Justify,
    /// `transparent`
    Transparent,
    /// `currentcolor`
    #[strum(serialize = "currentcolor")]
    #[serde(rename = "currentcolor")]
    CurrentColor,
}

/// [§ 5 Distance Units](https://www.w3.org/TR/css-values-4/#lengths)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// CSS pixels.
    Px,
    /// Relative to the element's font size.
    Em,
    /// 1% of the viewport width.
    Vw,
    /// 1% of the viewport height.
    Vh,
}

/// A dimension with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Length {
    /// Magnitude.
    pub value: f32,
    /// Unit.
    pub unit: LengthUnit,
}

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel; 255 is opaque.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };

    /// An opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// True if painting this color would have no visible effect.
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

/// A declared, specified or computed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Value {
    /// An identifier such as `auto` or `block`.
    Keyword(Keyword),
    /// A dimension.
    Length(Length),
    /// A percentage of some property-specific basis.
    Percentage(f32),
    /// A bare number (`line-height: 1.5`, `font-weight: 700`).
    Number(f32),
    /// A color.
    Color(Color),
    /// A string or family name.
    String(String),
    /// [§ 7.3 Explicit Inheritance](https://www.w3.org/TR/css-cascade-4/#inherit)
    Inherit,
    /// [§ 7.3.1 Resetting a Property](https://www.w3.org/TR/css-cascade-4/#initial)
    Initial,
}

impl Value {
    /// A length in CSS pixels.
    #[must_use]
    pub const fn px(value: f32) -> Self {
        Self::Length(Length {
            value,
            unit: LengthUnit::Px,
        })
    }

    /// A length in `em`.
    #[must_use]
    pub const fn em(value: f32) -> Self {
        Self::Length(Length {
            value,
            unit: LengthUnit::Em,
        })
    }

    /// The keyword, if this is one.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match self {
            Self::Keyword(k) => Some(*k),
            _ => None,
        }
    }

    /// The pixel magnitude, if this is an absolute length.
    #[must_use]
    pub const fn as_px(&self) -> Option<f32> {
        match self {
            Self::Length(Length {
                value,
                unit: LengthUnit::Px,
            }) => Some(*value),
            _ => None,
        }
    }
}
