//! Style resolution and box layout for the Trellis embedded HTML/CSS runtime.
//!
//! # Scope
//!
//! This crate takes a DOM and parsed style sheets and produces positioned
//! boxes and a display list:
//!
//! - **Selector index** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Rules bucketed by their rightmost id, class or type
//!   - Specificity calculation
//!   - Media-gated style sheets ([Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/))
//!
//! - **Cascade** ([CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/))
//!   - Importance, origin, specificity and source order
//!   - Inheritance, `inherit` and `initial`
//!   - Computed values shared as `Arc<ComputedStyle>`
//!
//! - **Box generation** ([CSS 2.1 § 9.2](https://www.w3.org/TR/CSS2/visuren.html#box-gen))
//!   - Block, inline, anonymous, text and replaced boxes
//!
//! - **Layout** ([CSS 2.1 § 10](https://www.w3.org/TR/CSS2/visudet.html))
//!   - Block width and margin resolution, sibling margin collapsing
//!   - Line building with white-space collapsing, soft wrapping and bidi
//!   - Replaced element sizing with an intrinsic ratio
//!
//! - **Paint** ([CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html))
//!   - Backgrounds, borders, text and replaced content as a display list
//!
//! # Not Implemented
//!
//! - CSS text parsing (style sheets arrive as objects)
//! - Floats, positioning, flex, grid and tables
//! - Font shaping and rasterization

/// Style resolution per [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/).
pub mod cascade;
/// Box generation and layout per [CSS 2.1 § 9-10](https://www.w3.org/TR/CSS2/visuren.html).
pub mod layout;
/// Media queries per [Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/).
pub mod media;
/// Display list and painting per [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html).
pub mod paint;
/// Selector representation, matching and the rule index.
pub mod selector;
/// Computed style representation.
pub mod style;
/// Parsed style sheet objects.
pub mod stylesheet;
/// User-agent style sheet per [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html).
pub mod ua_stylesheet;
/// Properties, keywords and values.
pub mod values;

// Re-exports for convenience
pub use cascade::{StyleEngine, StyleMap, StyleSheetId, compute_styles};
pub use layout::{
    ApproximateFontMetrics, BoxDimensions, BoxId, BoxKind, BoxTree, ContentProvider, EdgeSizes,
    FontMetrics, FontSpec, IntrinsicSize, LayoutBox, LayoutConfig, LayoutContext, LayoutMessage,
    MediaFrame, Rect, build_box_tree, layout_root,
};
pub use media::{MediaError, MediaList, MediaQuery, Viewport};
pub use paint::{DisplayCommand, DisplayList, Painter};
pub use selector::{MatchedRule, SelectorError, SelectorIndex, Specificity, parse_selector};
pub use style::ComputedStyle;
pub use stylesheet::{CssParser, Declaration, DeclarationBlock, Origin, StyleRule, StyleSheet};
pub use ua_stylesheet::ua_stylesheet;
pub use values::{Color, Keyword, Length, LengthUnit, Property, Value};
