//! Media queries and per-sheet media gates.
//!
//! [Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/)
//!
//! A style sheet may carry a [`MediaList`]. Its rules take part in matching
//! only while the list evaluates true for the current [`Viewport`]. Gate
//! results are cached in [`MediaGateCache`] and recomputed only when the
//! viewport dimensions change.

use serde::Serialize;
use thiserror::Error;
use trellis_common::warning::warn_once;

use crate::stylesheet::{CssParser, StyleSheet};

/// The layout viewport, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Width of the initial containing block.
    pub width: f32,
    /// Height of the initial containing block.
    pub height: f32,
}

impl Viewport {
    /// A viewport of the given size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Media text the engine could not turn into a [`MediaQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The text did not parse as a media query.
    #[error("unrecognized media query '{0}'")]
    Unrecognized(String),
    /// A feature name this engine does not evaluate.
    #[error("unsupported media feature '{0}'")]
    UnsupportedFeature(String),
}

/// [§ 2.3 Media types](https://www.w3.org/TR/mediaqueries-4/#media-types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaType {
    /// `all`, also the implied type when only features are given.
    All,
    /// `screen`
    Screen,
    /// `print`; never matches on a screen device.
    Print,
}

/// [§ 4.1 Orientation](https://www.w3.org/TR/mediaqueries-4/#orientation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    /// "The orientation media feature is portrait when the value of the
    /// height media feature is greater than or equal to the value of the
    /// width media feature."
    Portrait,
    /// Otherwise.
    Landscape,
}

/// [§ 5.3 Display scanning process](https://www.w3.org/TR/mediaqueries-4/#scan)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scan {
    /// The output device draws every line each frame.
    Progressive,
    /// Alternate lines per frame.
    Interlace,
}

/// One `(feature: value)` test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MediaFeature {
    /// `(width: Npx)`
    Width(f32),
    /// `(min-width: Npx)`
    MinWidth(f32),
    /// `(max-width: Npx)`
    MaxWidth(f32),
    /// `(height: Npx)`
    Height(f32),
    /// `(min-height: Npx)`
    MinHeight(f32),
    /// `(max-height: Npx)`
    MaxHeight(f32),
    /// `(orientation: ...)`
    Orientation(Orientation),
    /// `(scan: ...)`
    Scan(Scan),
    /// `(grid: 0|1)`; this device is a bitmap device.
    Grid(bool),
}

impl MediaFeature {
    fn evaluate(self, viewport: Viewport) -> bool {
        match self {
            Self::Width(w) => (viewport.width - w).abs() < f32::EPSILON,
            Self::MinWidth(w) => viewport.width >= w,
            Self::MaxWidth(w) => viewport.width <= w,
            Self::Height(h) => (viewport.height - h).abs() < f32::EPSILON,
            Self::MinHeight(h) => viewport.height >= h,
            Self::MaxHeight(h) => viewport.height <= h,
            Self::Orientation(o) => {
                let actual = if viewport.height >= viewport.width {
                    Orientation::Portrait
                } else {
                    Orientation::Landscape
                };
                actual == o
            }
            Self::Scan(scan) => scan == Scan::Progressive,
            Self::Grid(grid) => !grid,
        }
    }
}

/// [§ 2 Media Queries](https://www.w3.org/TR/mediaqueries-4/#media)
///
/// `[not] <type> [and (<feature>)]*`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaQuery {
    /// Leading `not`.
    pub negated: bool,
    /// Media type.
    pub media_type: MediaType,
    /// Conjunction of feature tests.
    pub features: Vec<MediaFeature>,
}

impl MediaQuery {
    /// A query for a bare media type.
    #[must_use]
    pub const fn of_type(media_type: MediaType) -> Self {
        Self {
            negated: false,
            media_type,
            features: Vec::new(),
        }
    }

    /// Builder-style feature conjunction.
    #[must_use]
    pub fn and(mut self, feature: MediaFeature) -> Self {
        self.features.push(feature);
        self
    }

    /// Builder-style negation.
    #[must_use]
    pub const fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Evaluate against a screen viewport.
    #[must_use]
    pub fn evaluate(&self, viewport: Viewport) -> bool {
        let type_matches = !matches!(self.media_type, MediaType::Print);
        let result = type_matches && self.features.iter().all(|f| f.evaluate(viewport));
        result != self.negated
    }
}

/// [CSSOM § 4.1 The MediaList Interface](https://www.w3.org/TR/cssom-1/#the-medialist-interface)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaList {
    queries: Vec<MediaQuery>,
}

impl MediaList {
    /// An empty list, which matches everything.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queries: Vec::new(),
        }
    }

    /// "The length attribute must return the number of media queries in the
    /// collection of media queries."
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// True if the list holds no queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// "The item(index) method must return a serialization of the media query
    /// in the collection of media queries given by index, or null, if index is
    /// greater than or equal to the number of media queries in the collection."
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&MediaQuery> {
        self.queries.get(index)
    }

    /// Append an already parsed query.
    pub fn append(&mut self, query: MediaQuery) {
        if !self.queries.contains(&query) {
            self.queries.push(query);
        }
    }

    /// "The appendMedium(medium) method must run these steps:
    /// 1. Let m be the result of parsing the given value.
    /// 2. If m is null, then return.
    /// 3. If comparing m with any of the media queries in the collection of
    ///    media queries returns true, then return.
    /// 4. Append m to the collection of media queries."
    ///
    /// # Errors
    ///
    /// Returns the parser's [`MediaError`]; the list is left unchanged.
    pub fn append_medium(&mut self, text: &str, parser: &dyn CssParser) -> Result<(), MediaError> {
        match parser.parse_media_query(text) {
            Ok(query) => {
                self.append(query);
                Ok(())
            }
            Err(err) => {
                warn_once("css", &format!("ignoring medium: {err}"));
                Err(err)
            }
        }
    }

    /// True if the list is empty or any query matches.
    #[must_use]
    pub fn evaluate(&self, viewport: Viewport) -> bool {
        self.queries.is_empty() || self.queries.iter().any(|q| q.evaluate(viewport))
    }
}

/// Cached media gate results, one per style sheet.
#[derive(Debug, Clone, Default)]
pub struct MediaGateCache {
    viewport: Option<Viewport>,
    gates: Vec<bool>,
}

impl MediaGateCache {
    /// An empty cache; the first [`refresh`](Self::refresh) evaluates everything.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            viewport: None,
            gates: Vec::new(),
        }
    }

    /// Forget cached results (the sheet list changed).
    pub fn invalidate(&mut self) {
        self.viewport = None;
        self.gates.clear();
    }

    /// Re-evaluate the gates if the viewport dimensions changed since the
    /// last evaluation. Returns true if any gate result differs from before.
    pub fn refresh(&mut self, viewport: Viewport, sheets: &[StyleSheet]) -> bool {
        if self.viewport == Some(viewport) && self.gates.len() == sheets.len() {
            return false;
        }
        let gates: Vec<bool> = sheets.iter().map(|s| s.media().evaluate(viewport)).collect();
        let changed = gates != self.gates;
        if changed {
            log::debug!(target: "css", "media gates changed at {}x{}", viewport.width, viewport.height);
        }
        self.viewport = Some(viewport);
        self.gates = gates;
        changed
    }

    /// The cached gate for sheet `index`; sheets never evaluated are closed.
    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.gates.get(index).copied().unwrap_or(false)
    }
}
