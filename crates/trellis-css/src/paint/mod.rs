//! CSS Painting
//!
//! [CSS 2.1 Appendix E - Elaborate description of Stacking Contexts](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! Converts a laid-out box tree into a display list of drawing commands. The
//! embedder executes the list; nothing here rasterizes.
//!
//! ```text
//! Style → Boxes → Layout → Paint → (embedder renders)
//!                            ↓
//!                       DisplayList
//! ```

mod display_list;
mod painter;

pub use display_list::{DisplayCommand, DisplayList};
pub use painter::Painter;
