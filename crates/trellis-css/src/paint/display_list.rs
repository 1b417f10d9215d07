//! Display List - a sequence of drawing commands
//!
//! [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html)

use serde::Serialize;

use crate::layout::box_model::Rect;
use crate::layout::font::FontSpec;
use crate::layout::replaced::MediaFrame;
use crate::values::Color;

/// A single drawing command.
///
/// [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
///
/// Commands are added to the display list in painting order (back to front).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DisplayCommand {
    /// Fill a rectangle with a solid color.
    ///
    /// Used for backgrounds, borders and letterbox bars.
    FillRect {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Color,
    },

    /// Draw a run of text.
    ///
    /// Step 7: "the element's text"
    DrawText {
        /// The characters to draw, collapsible edge spaces excluded.
        text: String,
        /// X of the text origin.
        x: f32,
        /// Y of the baseline.
        y: f32,
        /// Font to draw with.
        font: FontSpec,
        /// Text color.
        color: Color,
        /// Resolved bidi level; odd levels are drawn right to left.
        bidi_level: u8,
        /// Extra advance after every space character, from justification.
        word_spacing: f32,
    },

    /// Draw a decoded frame of replaced content.
    ///
    /// Step 5: "the replaced content of replaced inline-level elements"
    DrawReplaced {
        /// The frame, by the embedder's handle.
        frame: MediaFrame,
        /// Destination rectangle, aspect ratio preserved.
        rect: Rect,
    },
}

/// A list of drawing commands in painting order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DisplayList {
    commands: Vec<DisplayCommand>,
}

impl DisplayList {
    /// Create an empty display list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Add a command to the display list.
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    /// Get the commands in painting order.
    #[must_use]
    pub fn commands(&self) -> &[DisplayCommand] {
        &self.commands
    }

    /// Get the number of commands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the display list is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
