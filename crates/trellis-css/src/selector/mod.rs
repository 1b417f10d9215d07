//! Selector representation, specificity and per-element matching.
//!
//! Selectors are parsed from text by [`parse_selector`] and indexed by
//! [`SelectorIndex`] for fast lookup during the cascade.
//!
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/)

mod index;
mod parser;

pub use index::{MatchedRule, SelectorIndex};
pub use parser::{parse_selector, split_selector_list};

use serde::Serialize;
use thiserror::Error;
use trellis_dom::{DomTree, ElementData, NodeId, NodeType};

/// Why a selector was left out of the index.
///
/// These are never surfaced to callers as failures: the selector is logged
/// and simply never matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector text was empty (e.g. `a, , b`).
    #[error("empty selector")]
    Empty,
    /// A combinator had nothing on one of its sides.
    #[error("dangling combinator in '{0}'")]
    DanglingCombinator(String),
    /// A pseudo-class this engine does not evaluate (`:hover`, `:nth-child()`...).
    #[error("unsupported pseudo-class ':{0}'")]
    UnsupportedPseudoClass(String),
    /// Pseudo-elements generate no principal boxes here.
    #[error("unsupported pseudo-element '::{0}'")]
    UnsupportedPseudoElement(String),
    /// Malformed attribute selector.
    #[error("malformed attribute selector in '{0}'")]
    BadAttribute(String),
    /// Any other character the grammar does not accept.
    #[error("unexpected '{found}' in '{selector}'")]
    Unexpected {
        /// The offending character.
        found: char,
        /// The whole selector text.
        selector: String,
    },
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors), stored lowercase.
    Type(String),
    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),
    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),
    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,
    /// Structural pseudo-class evaluated against the tree.
    PseudoClass(PseudoClass),
    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),
}

/// Structural pseudo-classes that need only the document tree to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    /// `:root`
    Root,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:empty`
    Empty,
}

/// Attribute selectors per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeSelector {
    /// `[attr]`
    Exists(String),
    /// `[attr=value]`
    Equals(String, String),
    /// `[attr~=value]`
    Includes(String, String),
    /// `[attr|=value]`
    DashMatch(String, String),
    /// `[attr^=value]`
    PrefixMatch(String, String),
    /// `[attr$=value]`
    SuffixMatch(String, String),
    /// `[attr*=value]`
    SubstringMatch(String, String),
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundSelector {
    /// The simple selectors, in source order.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Combinator {
    /// `A B`: B is an arbitrary descendant of A.
    Descendant,
    /// `A > B`: B is a direct child of A.
    Child,
    /// `A + B`: B immediately follows A.
    NextSibling,
    /// `A ~ B`: B follows A, not necessarily immediately.
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Stored right to left. For `A > B C`:
/// - `subject`: C
/// - `combinators`: `[(Descendant, B), (Child, A)]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComplexSelector {
    /// The rightmost compound selector.
    pub subject: CompoundSelector,
    /// `(combinator, compound)` pairs walking left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
///
/// "count the number of ID selectors in the selector (= A) ... class
/// selectors, attributes selectors, and pseudo-classes (= B) ... type
/// selectors and pseudo-elements (= C)"
///
/// Compared lexicographically, which the derived `Ord` does field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Create a specificity from its (A, B, C) components.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self(a, b, c)
    }
}

impl std::ops::Add for Specificity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

impl CompoundSelector {
    /// Specificity contributed by this compound alone.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.simple_selectors
            .iter()
            .fold(Specificity::default(), |spec, simple| match simple {
                SimpleSelector::Id(_) => spec + Specificity(1, 0, 0),
                SimpleSelector::Class(_)
                | SimpleSelector::PseudoClass(_)
                | SimpleSelector::Attribute(_) => spec + Specificity(0, 1, 0),
                SimpleSelector::Type(_) => spec + Specificity(0, 0, 1),
                // "ignore the universal selector"
                SimpleSelector::Universal => spec,
            })
    }

    /// Does every simple selector hold for `node`?
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.as_element(node) else {
            return false;
        };
        self.simple_selectors
            .iter()
            .all(|simple| simple.matches(tree, node, element))
    }
}

impl ComplexSelector {
    /// Sum of the specificities of every compound in the chain.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.combinators
            .iter()
            .fold(self.subject.specificity(), |spec, (_, compound)| {
                spec + compound.specificity()
            })
    }

    /// Match against `node` by walking the tree directly, without an index.
    ///
    /// Descendant and subsequent-sibling steps backtrack: if the nearest
    /// candidate fails further left in the chain, farther candidates are tried.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.subject.matches(tree, node) && match_chain(&self.combinators, tree, node)
    }
}

fn match_chain(chain: &[(Combinator, CompoundSelector)], tree: &DomTree, node: NodeId) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_first() else {
        return true;
    };
    relatives(*combinator, tree, node)
        .into_iter()
        .any(|candidate| compound.matches(tree, candidate) && match_chain(rest, tree, candidate))
}

/// Elements reachable from `node` through `combinator`, nearest first.
pub(crate) fn relatives(combinator: Combinator, tree: &DomTree, node: NodeId) -> Vec<NodeId> {
    match combinator {
        Combinator::Descendant => tree
            .ancestors(node)
            .filter(|&a| tree.as_element(a).is_some())
            .collect(),
        Combinator::Child => tree
            .parent(node)
            .filter(|&p| tree.as_element(p).is_some())
            .into_iter()
            .collect(),
        Combinator::NextSibling => tree.prev_element_sibling(node).into_iter().collect(),
        Combinator::SubsequentSibling => tree
            .preceding_siblings(node)
            .filter(|&s| tree.as_element(s).is_some())
            .collect(),
    }
}

impl SimpleSelector {
    /// Check this simple selector against one element.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId, element: &ElementData) -> bool {
        match self {
            Self::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
            Self::Class(class) => element.has_class(class),
            Self::Id(id) => element.id() == Some(id.as_str()),
            Self::Universal => true,
            Self::PseudoClass(pc) => pc.matches(tree, node, element),
            Self::Attribute(attr) => attr.matches(element),
        }
    }
}

impl PseudoClass {
    /// Look up a supported pseudo-class by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "root" => Self::Root,
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            "only-child" => Self::OnlyChild,
            "first-of-type" => Self::FirstOfType,
            "last-of-type" => Self::LastOfType,
            "empty" => Self::Empty,
            _ => return None,
        })
    }

    fn matches(self, tree: &DomTree, node: NodeId, element: &ElementData) -> bool {
        let element_siblings = || {
            tree.parent(node)
                .map(|p| tree.children(p))
                .unwrap_or_default()
                .iter()
                .copied()
                .filter(|&c| tree.as_element(c).is_some())
        };
        let same_type = |c: &NodeId| {
            tree.as_element(*c)
                .is_some_and(|e| e.tag_name == element.tag_name)
        };
        match self {
            // [§ 4.4 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
            Self::Root => tree.document_element() == Some(node),
            Self::FirstChild => element_siblings().next() == Some(node),
            Self::LastChild => element_siblings().next_back() == Some(node),
            Self::OnlyChild => {
                let mut siblings = element_siblings();
                siblings.next() == Some(node) && siblings.next().is_none()
            }
            Self::FirstOfType => element_siblings().find(same_type) == Some(node),
            Self::LastOfType => element_siblings().filter(same_type).next_back() == Some(node),
            // [§ 4.5 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
            // "represents an element that has no children except, optionally,
            // document white space characters."
            Self::Empty => tree.children(node).iter().all(|&c| {
                match tree.get(c).map(|n| &n.node_type) {
                    Some(NodeType::Text(t)) => t.trim().is_empty(),
                    Some(NodeType::Comment(_)) => true,
                    _ => false,
                }
            }),
        }
    }
}

impl AttributeSelector {
    fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Exists(name) => element.attr(name).is_some(),
            Self::Equals(name, val) => element.attr(name) == Some(val.as_str()),
            Self::Includes(name, val) => element
                .attr(name)
                .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == val)),
            Self::DashMatch(name, val) => element.attr(name).is_some_and(|v| {
                v == val || v.strip_prefix(val.as_str()).is_some_and(|rest| rest.starts_with('-'))
            }),
            Self::PrefixMatch(name, val) => element
                .attr(name)
                .is_some_and(|v| !val.is_empty() && v.starts_with(val.as_str())),
            Self::SuffixMatch(name, val) => element
                .attr(name)
                .is_some_and(|v| !val.is_empty() && v.ends_with(val.as_str())),
            Self::SubstringMatch(name, val) => element
                .attr(name)
                .is_some_and(|v| !val.is_empty() && v.contains(val.as_str())),
        }
    }
}
