//! Box geometry.
//!
//! [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)

use serde::Serialize;

use crate::style::Sides;

/// A rectangle in CSS pixels; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Rect {
    /// A rectangle from its corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Grow outward by `edges` on each side.
    #[must_use]
    pub fn expanded_by(self, edges: EdgeSizes) -> Self {
        Self {
            x: self.x - edges.left,
            y: self.y - edges.top,
            width: self.width + edges.horizontal(),
            height: self.height + edges.vertical(),
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Thickness of a padding, border or margin area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeSizes {
    /// Top.
    pub top: f32,
    /// Right.
    pub right: f32,
    /// Bottom.
    pub bottom: f32,
    /// Left.
    pub left: f32,
}

impl EdgeSizes {
    /// `left + right`.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// `top + bottom`.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl From<Sides<f32>> for EdgeSizes {
    fn from(sides: Sides<f32>) -> Self {
        Self {
            top: sides.top,
            right: sides.right,
            bottom: sides.bottom,
            left: sides.left,
        }
    }
}

/// [§ 3 The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
///
/// "Each box has a content area and optional surrounding padding, border,
/// and margin areas."
///
/// Geometry shared by every box kind. `content` is in absolute coordinates;
/// the other areas are expressed as thicknesses around it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoxDimensions {
    /// Content area.
    pub content: Rect,
    /// Padding thickness.
    pub padding: EdgeSizes,
    /// Border thickness.
    pub border: EdgeSizes,
    /// Margin thickness.
    pub margin: EdgeSizes,
}

impl BoxDimensions {
    /// "The padding box contains both the content and padding areas."
    #[must_use]
    pub fn padding_box(&self) -> Rect {
        self.content.expanded_by(self.padding)
    }

    /// "The border box contains content, padding, and border areas."
    #[must_use]
    pub fn border_box(&self) -> Rect {
        self.padding_box().expanded_by(self.border)
    }

    /// "The margin box is the outermost box, and contains all four areas."
    #[must_use]
    pub fn margin_box(&self) -> Rect {
        self.border_box().expanded_by(self.margin)
    }

    /// Horizontal space taken outside the content box.
    #[must_use]
    pub fn horizontal_extras(&self) -> f32 {
        self.padding.horizontal() + self.border.horizontal() + self.margin.horizontal()
    }

    /// Vertical space taken outside the content box.
    #[must_use]
    pub fn vertical_extras(&self) -> f32 {
        self.padding.vertical() + self.border.vertical() + self.margin.vertical()
    }

    /// Move the whole box by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.content.x += dx;
        self.content.y += dy;
    }
}
