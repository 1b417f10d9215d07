//! Computed style representation.
//!
//! - [CSS Cascading and Inheritance Level 4](https://www.w3.org/TR/css-cascade-4/)
//! - [CSS Display Module Level 3](https://www.w3.org/TR/css-display-3/)
//! - [CSS Text Module Level 3](https://www.w3.org/TR/css-text-3/)

pub mod computed;

pub use computed::{
    AutoOr, ComputedStyle, Direction, Display, LengthPercentageAuto, LineHeight, OverflowWrap,
    Sides, TextAlign, Visibility, WhiteSpace,
};
