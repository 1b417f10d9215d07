//! Box generation and layout.
//!
//! # Relevant Specifications
//!
//! - [CSS 2.1 Visual Formatting Model](https://www.w3.org/TR/CSS2/visuren.html)
//! - [CSS 2.1 Visual Formatting Model Details](https://www.w3.org/TR/CSS2/visudet.html)
//! - [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)
//! - [CSS Text Module Level 3](https://www.w3.org/TR/css-text-3/)
//! - [UAX #9 Unicode Bidirectional Algorithm](https://www.unicode.org/reports/tr9/)
//!
//! # Module Structure
//!
//! - [`box_model`] - Rectangles and edge sizes
//! - [`box_tree`] - The box arena, box kinds and their capability traits
//! - [`builder`] - DOM to box tree
//! - [`block`] - Block formatting contexts
//! - [`inline`] - Line building
//! - [`paragraph`] - Shared text with bidi and break tables
//! - [`text_box`] - Text leaves
//! - [`replaced`] - Replaced leaves and content providers
//! - [`context`] - The pass driver

pub mod block;
pub mod box_model;
pub mod box_tree;
pub mod builder;
pub mod cache;
pub mod context;
pub mod font;
pub mod inline;
pub mod paragraph;
pub mod replaced;
pub mod text_box;

// Re-exports for convenience
pub use block::layout_root;
pub use box_model::{BoxDimensions, EdgeSizes, Rect};
pub use box_tree::{
    BoxId, BoxKind, BoxTree, InlineSize, LayoutBox, LineBox, MeasureContext, Measurable,
    Paintable, Splittable,
};
pub use builder::{BoxBuilder, ProviderMap, build_box_tree};
pub use context::{LayoutContext, LayoutMessage};
pub use font::{ApproximateFontMetrics, FontMetrics, FontSpec, LayoutConfig, LineMetrics};
pub use paragraph::Paragraph;
pub use replaced::{ContentProvider, IntrinsicSize, MediaFrame, ReplacedBox, StaticContent};
pub use text_box::TextBox;
