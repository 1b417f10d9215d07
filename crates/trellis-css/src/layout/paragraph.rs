//! Immutable text shared by every box split from one logical run.
//!
//! [CSS Text § 5 Line Breaking](https://www.w3.org/TR/css-text-3/#line-breaking)
//! [UAX #9 Unicode Bidirectional Algorithm](https://www.unicode.org/reports/tr9/)
//!
//! A [`Paragraph`] owns its UTF-8 text and precomputes two tables on
//! construction: bidi level runs and soft wrap opportunities. Text boxes hold
//! an `Arc<Paragraph>` and a byte range; splitting a box never copies text.

use unicode_bidi::{BidiInfo, Level};
use unicode_linebreak::linebreaks;

use super::font::{FontMetrics, FontSpec};
use crate::style::{Direction, OverflowWrap};

/// Text plus bidi and line-break tables.
#[derive(Debug)]
pub struct Paragraph {
    text: String,
    base_level: Level,
    /// `(start byte, level)`, sorted by start, first entry at 0.
    runs: Vec<(usize, Level)>,
    /// Byte offsets where a line may start, excluding 0 and `text.len()`.
    breaks: Vec<usize>,
}

impl Paragraph {
    /// Analyze `text` with the given base direction.
    #[must_use]
    pub fn new(text: impl Into<String>, direction: Direction) -> Self {
        let text = text.into();
        let base_level = match direction {
            Direction::Ltr => Level::ltr(),
            Direction::Rtl => Level::rtl(),
        };

        let mut runs: Vec<(usize, Level)> = Vec::new();
        if !text.is_empty() {
            let info = BidiInfo::new(&text, Some(base_level));
            for (offset, level) in info.levels.iter().enumerate() {
                if !text.is_char_boundary(offset) {
                    continue;
                }
                if runs.last().is_none_or(|(_, last)| last != level) {
                    runs.push((offset, *level));
                }
            }
        }
        if runs.is_empty() {
            runs.push((0, base_level));
        }

        let breaks = linebreaks(&text)
            .map(|(offset, _)| offset)
            .filter(|&offset| offset > 0 && offset < text.len())
            .collect();

        Self {
            text,
            base_level,
            runs,
            breaks,
        }
    }

    /// The whole text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True if the paragraph holds no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// `text[start..end]`, or `""` for a range that is not on char
    /// boundaries.
    #[must_use]
    pub fn substring(&self, start: usize, end: usize) -> &str {
        self.text.get(start..end).unwrap_or_default()
    }

    /// True if the byte at `position` is a collapsible space.
    #[must_use]
    pub fn is_space(&self, position: usize) -> bool {
        self.text.as_bytes().get(position) == Some(&b' ')
    }

    /// Paragraph embedding level.
    #[must_use]
    pub const fn base_level(&self) -> Level {
        self.base_level
    }

    /// Resolved bidi level of the character starting at `position`.
    #[must_use]
    pub fn bidi_level(&self, position: usize) -> Level {
        let run = self.runs.partition_point(|(start, _)| *start <= position);
        self.runs
            .get(run.saturating_sub(1))
            .map_or(self.base_level, |(_, level)| *level)
    }

    /// Start of the first level run after `position`.
    #[must_use]
    pub fn next_run_position(&self, position: usize) -> Option<usize> {
        self.runs
            .iter()
            .map(|(start, _)| *start)
            .find(|&start| start > position)
    }

    /// Number of bidi level runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// [§ 5.2 Breaking Rules for Letters](https://www.w3.org/TR/css-text-3/#word-break-property)
    /// [§ 5.5 Overflow Wrapping](https://www.w3.org/TR/css-text-3/#overflow-wrap-property)
    ///
    /// Find where to break `[start, end)` so the prefix fits in
    /// `available_width`. Returns the break offset and the prefix width.
    ///
    /// Soft wrap opportunities are tried first, last fitting one wins.
    /// Trailing spaces of a prefix hang and are not measured. With
    /// `overflow-wrap: break-word` and no fitting soft wrap, every char
    /// boundary is a candidate. If nothing fits, `allow_overflow` takes
    /// the first candidate so the caller always makes progress.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_break_position(
        &self,
        font: &FontSpec,
        metrics: &dyn FontMetrics,
        start: usize,
        end: usize,
        available_width: f32,
        allow_overflow: bool,
        overflow_wrap: OverflowWrap,
    ) -> Option<(usize, f32)> {
        let measure = |position: usize| {
            metrics.text_width(self.substring(start, position).trim_end_matches(' '), font)
        };
        let soft: Vec<usize> = self
            .breaks
            .iter()
            .copied()
            .filter(|&b| b > start && b < end)
            .collect();

        // STEP 1: Last soft wrap opportunity that fits.
        if let Some(found) = last_fitting(&soft, measure, available_width) {
            return Some(found);
        }

        // STEP 2: Anywhere, when the style asks for it.
        let anywhere: Vec<usize> = if overflow_wrap == OverflowWrap::BreakWord {
            self.substring(start, end)
                .char_indices()
                .map(|(offset, _)| start + offset)
                .filter(|&b| b > start)
                .collect()
        } else {
            Vec::new()
        };
        if let Some(found) = last_fitting(&anywhere, measure, available_width) {
            return Some(found);
        }

        // STEP 3: Overflow rather than stall.
        if !allow_overflow {
            return None;
        }
        let first = if overflow_wrap == OverflowWrap::BreakWord {
            anywhere.first().or(soft.first())
        } else {
            soft.first()
        };
        first.map(|&position| (position, measure(position)))
    }
}

fn last_fitting(
    candidates: &[usize],
    measure: impl Fn(usize) -> f32,
    available_width: f32,
) -> Option<(usize, f32)> {
    // Prefix widths grow with the offset, so the first miss ends the scan.
    let mut best = None;
    for &position in candidates {
        let width = measure(position);
        if width > available_width {
            break;
        }
        best = Some((position, width));
    }
    best
}
