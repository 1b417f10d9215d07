//! Parsed style sheet objects.
//!
//! [CSS Syntax § 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing)
//!
//! Text parsing happens outside this crate. The parser hands over
//! [`StyleSheet`]s made of [`StyleRule`]s, and implements [`CssParser`] for
//! the two places where text still reaches the core: `style` attributes and
//! [`MediaList::append_medium`](crate::media::MediaList::append_medium).

use std::sync::Arc;

use serde::Serialize;

use crate::media::{MediaError, MediaList, MediaQuery};
use crate::values::{Property, Value};

/// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// "Each style rule has a cascade origin, which determines where it enters
/// the cascade."
///
/// Declared in ascending precedence so the derived `Ord` is the cascade order
/// for normal declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Origin {
    /// The user agent's default style sheet.
    UserAgent,
    /// Style sheets supplied by the document.
    Author,
    /// The element's `style` attribute.
    Inline,
}

/// [§ 5.4 Declarations](https://www.w3.org/TR/css-syntax-3/#declaration)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property being set.
    pub property: Property,
    /// `None` when the parser could not produce a value. Such declarations
    /// are dropped by the cascade.
    pub value: Option<Value>,
    /// "If the last two non-whitespace tokens are `!important`..."
    pub important: bool,
}

impl Declaration {
    /// A normal declaration.
    #[must_use]
    pub const fn new(property: Property, value: Value) -> Self {
        Self {
            property,
            value: Some(value),
            important: false,
        }
    }

    /// An `!important` declaration.
    #[must_use]
    pub const fn important(property: Property, value: Value) -> Self {
        Self {
            property,
            value: Some(value),
            important: true,
        }
    }

    /// A declaration whose value failed to parse.
    #[must_use]
    pub const fn unparsed(property: Property) -> Self {
        Self {
            property,
            value: None,
            important: false,
        }
    }
}

/// The body of a rule; shared by every selector in the rule's selector list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarationBlock {
    declarations: Vec<Declaration>,
}

impl DeclarationBlock {
    /// An empty block.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            declarations: Vec::new(),
        }
    }

    /// Append a declaration.
    pub fn push(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, declaration: Declaration) -> Self {
        self.push(declaration);
        self
    }

    /// Declarations in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.declarations.iter()
    }

    /// Number of declarations, including unparsed ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// True if the block has no declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl<'a> IntoIterator for &'a DeclarationBlock {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.declarations.iter()
    }
}

impl FromIterator<Declaration> for DeclarationBlock {
    fn from_iter<T: IntoIterator<Item = Declaration>>(iter: T) -> Self {
        Self {
            declarations: iter.into_iter().collect(),
        }
    }
}

/// [§ 9.1 Style rules](https://www.w3.org/TR/css-syntax-3/#style-rules)
#[derive(Debug, Clone)]
pub struct StyleRule {
    /// The selector list as written (`"h1, .title > span"`).
    pub selector_text: String,
    /// Declarations shared by every selector of the list.
    pub declarations: Arc<DeclarationBlock>,
    /// Position within the owning sheet; strictly increasing.
    pub source_index: usize,
}

/// An ordered list of rules from one origin, optionally gated by media.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    origin: Origin,
    media: MediaList,
    rules: Vec<StyleRule>,
}

impl StyleSheet {
    /// An empty, ungated sheet.
    #[must_use]
    pub const fn new(origin: Origin) -> Self {
        Self {
            origin,
            media: MediaList::new(),
            rules: Vec::new(),
        }
    }

    /// Builder-style media gate.
    #[must_use]
    pub fn with_media(mut self, media: MediaList) -> Self {
        self.media = media;
        self
    }

    /// Append a rule and return its source index.
    pub fn add_rule(&mut self, selector_text: &str, declarations: DeclarationBlock) -> usize {
        let source_index = self.rules.len();
        self.rules.push(StyleRule {
            selector_text: selector_text.to_string(),
            declarations: Arc::new(declarations),
            source_index,
        });
        source_index
    }

    /// Builder-style [`add_rule`](Self::add_rule).
    #[must_use]
    pub fn with_rule(mut self, selector_text: &str, declarations: DeclarationBlock) -> Self {
        let _ = self.add_rule(selector_text, declarations);
        self
    }

    /// The sheet's origin.
    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    /// The media gate; empty means "always on".
    #[must_use]
    pub const fn media(&self) -> &MediaList {
        &self.media
    }

    /// Mutable access to the media gate.
    pub fn media_mut(&mut self) -> &mut MediaList {
        &mut self.media
    }

    /// Rules in source order.
    #[must_use]
    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }
}

/// The external CSS parser, as seen from the core.
pub trait CssParser {
    /// Parse the contents of a `style` attribute. Values the parser cannot
    /// understand come back as [`Declaration::unparsed`].
    fn parse_declarations(&self, text: &str) -> DeclarationBlock;

    /// Parse a single media query such as `screen and (min-width: 600px)`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError`] if the text is not a media query this engine
    /// can evaluate.
    fn parse_media_query(&self, text: &str) -> Result<MediaQuery, MediaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_index_increases_with_insertion() {
        let mut sheet = StyleSheet::new(Origin::Author);
        let a = sheet.add_rule("p", DeclarationBlock::new());
        let b = sheet.add_rule("div", DeclarationBlock::new());
        assert!(b > a);
        assert_eq!(sheet.rules()[1].source_index, b);
    }

    #[test]
    fn test_origin_order() {
        assert!(Origin::UserAgent < Origin::Author);
        assert!(Origin::Author < Origin::Inline);
    }
}
