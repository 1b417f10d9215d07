//! Common utilities for the Trellis layout core.
//!
//! This crate provides shared infrastructure used by the style and layout crates:
//! - **Warning System** - deduplicated warnings routed through the `log` facade
//! - **Dispatch** - queue-keyed subscriber registries for handing messages
//!   from other threads into the layout context

pub mod dispatch;
pub mod warning;
