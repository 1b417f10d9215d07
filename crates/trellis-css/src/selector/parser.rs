//! Selector text to [`ComplexSelector`].
//!
//! [§ 4 Selector syntax](https://www.w3.org/TR/selectors-4/#syntax)

use std::iter::Peekable;
use std::str::Chars;

use super::{
    AttributeSelector, Combinator, ComplexSelector, CompoundSelector, PseudoClass, SelectorError,
    SimpleSelector,
};

/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit()
}

/// Split a selector list on top-level commas.
///
/// Commas inside brackets, parentheses or quotes do not separate selectors.
#[must_use]
pub fn split_selector_list(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_u32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

struct Cursor<'a> {
    raw: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl Cursor<'_> {
    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.chars.next_if(char::is_ascii_whitespace).is_some() {
            skipped = true;
        }
        skipped
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.chars.next_if(|&c| is_ident_char(c)) {
            ident.push(c);
        }
        ident
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            found,
            selector: self.raw.to_string(),
        }
    }

    fn compound(&mut self) -> Result<Option<CompoundSelector>, SelectorError> {
        let mut simple_selectors = Vec::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                '*' => {
                    let _ = self.chars.next();
                    simple_selectors.push(SimpleSelector::Universal);
                }
                '.' | '#' => {
                    let _ = self.chars.next();
                    let name = self.ident();
                    if name.is_empty() {
                        return Err(self.unexpected(c));
                    }
                    simple_selectors.push(if c == '.' {
                        SimpleSelector::Class(name)
                    } else {
                        SimpleSelector::Id(name)
                    });
                }
                '[' => {
                    let _ = self.chars.next();
                    simple_selectors.push(SimpleSelector::Attribute(self.attribute()?));
                }
                ':' => {
                    let _ = self.chars.next();
                    if self.chars.next_if_eq(&':').is_some() {
                        return Err(SelectorError::UnsupportedPseudoElement(self.ident()));
                    }
                    let name = self.ident();
                    if self.chars.peek() == Some(&'(') {
                        return Err(SelectorError::UnsupportedPseudoClass(format!("{name}()")));
                    }
                    let pseudo = PseudoClass::from_name(&name)
                        .ok_or(SelectorError::UnsupportedPseudoClass(name))?;
                    simple_selectors.push(SimpleSelector::PseudoClass(pseudo));
                }
                c if is_ident_start_char(c) && simple_selectors.is_empty() => {
                    simple_selectors.push(SimpleSelector::Type(self.ident().to_ascii_lowercase()));
                }
                _ => break,
            }
        }
        Ok((!simple_selectors.is_empty()).then_some(CompoundSelector { simple_selectors }))
    }

    /// Parse the inside of `[...]`; the opening bracket is already consumed.
    fn attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        let raw = self.raw;
        let bad = || SelectorError::BadAttribute(raw.to_string());
        let _ = self.skip_whitespace();
        let name = self.ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(bad());
        }
        let _ = self.skip_whitespace();
        let operator = match self.chars.next() {
            Some(']') => return Ok(AttributeSelector::Exists(name)),
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) if self.chars.next_if_eq(&'=').is_some() => op,
            _ => return Err(bad()),
        };
        let _ = self.skip_whitespace();
        let value = match self.chars.peek().copied() {
            Some(q @ ('"' | '\'')) => {
                let _ = self.chars.next();
                let mut value = String::new();
                loop {
                    match self.chars.next() {
                        Some(c) if c == q => break,
                        Some(c) => value.push(c),
                        None => return Err(bad()),
                    }
                }
                value
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = self.chars.next_if(|&c| is_ident_char(c) || c == '.') {
                    value.push(c);
                }
                if value.is_empty() {
                    return Err(bad());
                }
                value
            }
        };
        let _ = self.skip_whitespace();
        if self.chars.next() != Some(']') {
            return Err(bad());
        }
        Ok(match operator {
            '~' => AttributeSelector::Includes(name, value),
            '|' => AttributeSelector::DashMatch(name, value),
            '^' => AttributeSelector::PrefixMatch(name, value),
            '$' => AttributeSelector::SuffixMatch(name, value),
            '*' => AttributeSelector::SubstringMatch(name, value),
            _ => AttributeSelector::Equals(name, value),
        })
    }
}

/// Parse one complex selector (no commas).
///
/// Supports type, class, id, universal, attribute and structural
/// pseudo-class selectors joined by the four combinators. Anything else is
/// reported as a [`SelectorError`] so the caller can drop the selector.
///
/// # Errors
///
/// Returns the reason the selector cannot be indexed.
pub fn parse_selector(raw: &str) -> Result<ComplexSelector, SelectorError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SelectorError::Empty);
    }
    let mut cursor = Cursor {
        raw: trimmed,
        chars: trimmed.chars().peekable(),
    };

    // Left to right: compound (combinator compound)*
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    loop {
        let Some(compound) = cursor.compound()? else {
            return match cursor.chars.peek() {
                Some(&c) if matches!(c, '>' | '+' | '~') => {
                    Err(SelectorError::DanglingCombinator(trimmed.to_string()))
                }
                Some(&c) => Err(cursor.unexpected(c)),
                None => Err(SelectorError::DanglingCombinator(trimmed.to_string())),
            };
        };
        compounds.push(compound);

        let had_space = cursor.skip_whitespace();
        let combinator = match cursor.chars.peek() {
            None => break,
            Some('>') => Combinator::Child,
            Some('+') => Combinator::NextSibling,
            Some('~') => Combinator::SubsequentSibling,
            Some(_) if had_space => Combinator::Descendant,
            Some(&c) => return Err(cursor.unexpected(c)),
        };
        if combinator != Combinator::Descendant {
            let _ = cursor.chars.next();
            let _ = cursor.skip_whitespace();
        }
        combinators.push(combinator);
    }

    // Reverse into subject-first order.
    let mut compounds = compounds.into_iter().rev();
    let Some(subject) = compounds.next() else {
        return Err(SelectorError::Empty);
    };
    Ok(ComplexSelector {
        subject,
        combinators: combinators.into_iter().rev().zip(compounds).collect(),
    })
}
