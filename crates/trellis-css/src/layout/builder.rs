//! Box generation.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! The DOM is first turned into an owned tree of boxes, which is then fixed
//! up for block-in-inline content and anonymous block wrapping before being
//! moved into the [`BoxTree`] arena.

use std::collections::HashMap;
use std::sync::Arc;

use trellis_dom::{DomTree, NodeId, NodeType};
use unicode_bidi::Level;

use super::box_tree::{BoxId, BoxKind, BoxTree, LayoutBox};
use super::paragraph::Paragraph;
use super::replaced::{ContentProvider, IntrinsicSize, ReplacedBox, StaticContent};
use super::text_box::TextBox;
use crate::cascade::StyleMap;
use crate::style::{ComputedStyle, Direction, Display};
use crate::values::Keyword;

/// Tags whose content comes from outside the document.
const REPLACED_TAGS: &[&str] = &["img", "video", "canvas", "iframe", "embed", "object"];

/// Content providers registered per element.
pub type ProviderMap = HashMap<NodeId, Arc<dyn ContentProvider>>;

/// A box before it is moved into the arena.
struct ProtoBox {
    kind: BoxKind,
    node: Option<NodeId>,
    style: Arc<ComputedStyle>,
    children: Vec<ProtoBox>,
}

impl ProtoBox {
    const fn new(kind: BoxKind, node: Option<NodeId>, style: Arc<ComputedStyle>) -> Self {
        Self {
            kind,
            node,
            style,
            children: Vec::new(),
        }
    }

    fn is_block_level(&self) -> bool {
        match self.kind {
            BoxKind::Block | BoxKind::AnonymousBlock => true,
            BoxKind::Replaced(_) => self.style.display() == Display::Block,
            BoxKind::Inline | BoxKind::AnonymousInline | BoxKind::Text(_) => false,
        }
    }

    fn has_block_descendant(&self) -> bool {
        self.children
            .iter()
            .any(|c| c.is_block_level() || c.has_block_descendant())
    }

    /// Nothing but collapsible white space below this box.
    fn is_collapsible_white_space(&self) -> bool {
        match &self.kind {
            BoxKind::Text(text) => {
                text.white_space().collapses() && !text.has_non_collapsible_text()
            }
            BoxKind::Inline | BoxKind::AnonymousInline => {
                self.children.iter().all(Self::is_collapsible_white_space)
            }
            BoxKind::Block | BoxKind::AnonymousBlock | BoxKind::Replaced(_) => false,
        }
    }

    /// A copy of this inline box with no children, for the pieces it is
    /// split into around block-level descendants.
    fn empty_clone(&self) -> Self {
        Self::new(self.kind.clone(), self.node, Arc::clone(&self.style))
    }
}

/// [§ 4.1.1 Phase I: Collapsing and Transformation](https://www.w3.org/TR/css-text-3/#white-space-phase-1)
///
/// Every run of white space becomes a single space.
fn collapse_white_space(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn base_level(direction: Direction) -> Level {
    match direction {
        Direction::Ltr => Level::ltr(),
        Direction::Rtl => Level::rtl(),
    }
}

fn attribute_size(dom: &DomTree, node: NodeId) -> IntrinsicSize {
    let parse = |name: &str| {
        dom.as_element(node)
            .and_then(|e| e.attr(name))
            .and_then(|v| v.trim().trim_end_matches("px").parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
    };
    match (parse("width"), parse("height")) {
        (Some(width), Some(height)) => IntrinsicSize::from_dimensions(width, height),
        (width, height) => IntrinsicSize {
            width,
            height,
            ratio: None,
        },
    }
}

/// Turns a styled DOM into a box tree.
pub struct BoxBuilder<'a> {
    dom: &'a DomTree,
    styles: &'a StyleMap,
    providers: &'a ProviderMap,
}

impl<'a> BoxBuilder<'a> {
    /// A builder over `dom` styled by `styles`.
    #[must_use]
    pub const fn new(dom: &'a DomTree, styles: &'a StyleMap, providers: &'a ProviderMap) -> Self {
        Self {
            dom,
            styles,
            providers,
        }
    }

    /// Build the box tree for the whole document.
    ///
    /// The root of the result is an anonymous block standing in for the
    /// initial containing block.
    #[must_use]
    pub fn build(&self) -> BoxTree {
        let root_style = Arc::new(ComputedStyle::initial().anonymous_child(Keyword::Block));
        let children = self.build_children(NodeId::ROOT, &root_style, true);
        let children = fix_up_block_container(children, &root_style);

        let mut tree = BoxTree::new(root_style);
        let root = tree.root();
        for child in children {
            let _ = insert(&mut tree, root, child);
        }
        log::debug!(target: "layout", "built box tree with {} boxes", tree.len());
        tree
    }

    fn style_of(&self, node: NodeId) -> Option<Arc<ComputedStyle>> {
        self.styles.get(node).map(Arc::clone)
    }

    fn build_children(
        &self,
        node: NodeId,
        parent_style: &Arc<ComputedStyle>,
        block_container: bool,
    ) -> Vec<ProtoBox> {
        let mut out = Vec::new();
        for &child in self.dom.children(node) {
            let boxes = self.build_node(child, parent_style);
            if block_container && self.dom.as_text(child).is_some() && !boxes.is_empty() {
                // "Any text that is directly contained inside a block
                // container element (not inside an inline element) must be
                // treated as an anonymous inline element."
                let style = Arc::new(parent_style.anonymous_child(Keyword::Inline));
                let mut wrapper = ProtoBox::new(BoxKind::AnonymousInline, None, style);
                wrapper.children = boxes;
                out.push(wrapper);
            } else {
                out.extend(boxes);
            }
        }
        out
    }

    fn build_node(&self, node: NodeId, parent_style: &Arc<ComputedStyle>) -> Vec<ProtoBox> {
        let Some(dom_node) = self.dom.get(node) else {
            return Vec::new();
        };
        match &dom_node.node_type {
            NodeType::Document => self.build_children(node, parent_style, true),
            NodeType::Comment(_) => Vec::new(),
            NodeType::Text(text) => {
                let style = self.style_of(node).unwrap_or_else(|| Arc::clone(parent_style));
                Self::build_text(text, node, &style, parent_style.direction())
            }
            NodeType::Element(element) => {
                let Some(style) = self.style_of(node) else {
                    log::trace!(target: "layout", "no computed style for {node:?}, skipped");
                    return Vec::new();
                };
                let display = style.display();
                if display == Display::None {
                    return Vec::new();
                }

                let provider = self.providers.get(&node).map(Arc::clone).or_else(|| {
                    REPLACED_TAGS.contains(&element.tag_name.as_str()).then(|| {
                        Arc::new(StaticContent::new(attribute_size(self.dom, node)))
                            as Arc<dyn ContentProvider>
                    })
                });
                if let Some(provider) = provider {
                    let level = base_level(parent_style.direction());
                    let replaced = ReplacedBox::new(provider, &style, level);
                    return vec![ProtoBox::new(BoxKind::Replaced(replaced), Some(node), style)];
                }

                let block = display == Display::Block;
                let children = self.build_children(node, &style, block);
                if block {
                    let mut principal = ProtoBox::new(BoxKind::Block, Some(node), Arc::clone(&style));
                    principal.children = fix_up_block_container(children, &style);
                    vec![principal]
                } else {
                    let mut principal = ProtoBox::new(BoxKind::Inline, Some(node), style);
                    principal.children = children;
                    split_inline_around_blocks(principal)
                }
            }
        }
    }

    /// One text box over the (collapsed) text, or under `white-space: pre`
    /// one box per source line, each ending in a forced break.
    fn build_text(
        text: &str,
        node: NodeId,
        style: &Arc<ComputedStyle>,
        direction: Direction,
    ) -> Vec<ProtoBox> {
        let white_space = style.white_space();
        let content = if white_space.collapses() {
            collapse_white_space(text)
        } else {
            text.to_string()
        };
        if content.is_empty() {
            return Vec::new();
        }
        let paragraph = Arc::new(Paragraph::new(content, direction));
        let leaf = |start, end, triggers| {
            let text_box = TextBox::new(Arc::clone(&paragraph), start, end, style, triggers);
            ProtoBox::new(BoxKind::Text(text_box), Some(node), Arc::clone(style))
        };

        if white_space.collapses() {
            return vec![leaf(0, paragraph.len(), false)];
        }
        let mut boxes = Vec::new();
        let mut start = 0;
        for (offset, _) in paragraph.text().match_indices('\n') {
            boxes.push(leaf(start, offset, true));
            start = offset + 1;
        }
        if start < paragraph.len() {
            boxes.push(leaf(start, paragraph.len(), false));
        }
        boxes
    }
}

/// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
///
/// "When an inline box contains an in-flow block-level box, the inline box
/// (and its inline ancestors within the same line box) are broken around
/// the block-level box [...], splitting the inline box into two boxes (even
/// if either side is empty), one on each side of the block-level box(es)."
///
/// The first piece is always kept; later pieces only when they hold
/// something.
fn split_inline_around_blocks(inline: ProtoBox) -> Vec<ProtoBox> {
    if !inline.has_block_descendant() {
        return vec![inline];
    }
    let mut pieces = Vec::new();
    let mut current = inline.empty_clone();
    let mut first = true;
    for child in inline.children {
        let child_pieces = if matches!(child.kind, BoxKind::Inline) {
            split_inline_around_blocks(child)
        } else {
            vec![child]
        };
        for piece in child_pieces {
            if piece.is_block_level() {
                let next = current.empty_clone();
                let done = std::mem::replace(&mut current, next);
                if first || !done.children.is_empty() {
                    pieces.push(done);
                }
                first = false;
                pieces.push(piece);
            } else {
                current.children.push(piece);
            }
        }
    }
    if !current.children.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Ensure a block container holds only block-level or only inline-level
/// children, wrapping inline runs next to blocks in anonymous blocks.
fn fix_up_block_container(children: Vec<ProtoBox>, style: &Arc<ComputedStyle>) -> Vec<ProtoBox> {
    let has_block = children.iter().any(ProtoBox::is_block_level);
    let has_inline = children.iter().any(|c| !c.is_block_level());
    if !(has_block && has_inline) {
        return children;
    }

    let mut out = Vec::new();
    let mut run: Vec<ProtoBox> = Vec::new();
    let flush = |run: &mut Vec<ProtoBox>, out: &mut Vec<ProtoBox>| {
        if run.is_empty() {
            return;
        }
        if run.iter().all(ProtoBox::is_collapsible_white_space) {
            run.clear();
            return;
        }
        let anonymous = Arc::new(style.anonymous_child(Keyword::Block));
        let mut block = ProtoBox::new(BoxKind::AnonymousBlock, None, anonymous);
        block.children = std::mem::take(run);
        out.push(block);
    };
    for child in children {
        if child.is_block_level() {
            flush(&mut run, &mut out);
            out.push(child);
        } else {
            run.push(child);
        }
    }
    flush(&mut run, &mut out);
    out
}

fn insert(tree: &mut BoxTree, parent: BoxId, proto: ProtoBox) -> BoxId {
    let ProtoBox {
        kind,
        node,
        style,
        children,
    } = proto;
    let id = tree.append(parent, LayoutBox::new(kind, node, style));
    for child in children {
        let _ = insert(tree, id, child);
    }
    id
}

/// Build the box tree for `dom`.
#[must_use]
pub fn build_box_tree(dom: &DomTree, styles: &StyleMap, providers: &ProviderMap) -> BoxTree {
    BoxBuilder::new(dom, styles, providers).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_white_space() {
        assert_eq!(collapse_white_space("  a \n\t b  "), " a b ");
        assert_eq!(collapse_white_space(""), "");
    }

    #[test]
    fn test_pre_text_splits_on_newlines() {
        let mut map: std::collections::BTreeMap<_, _> = ComputedStyle::initial()
            .iter()
            .map(|(p, v)| (p, v.clone()))
            .collect();
        let _ = map.insert(
            crate::values::Property::WhiteSpace,
            crate::values::Value::Keyword(Keyword::Pre),
        );
        let style = Arc::new(ComputedStyle::from_values(map));
        let boxes = BoxBuilder::build_text("a\n\nb", NodeId(1), &style, Direction::Ltr);
        let summary: Vec<(String, bool)> = boxes
            .iter()
            .filter_map(|b| match &b.kind {
                BoxKind::Text(t) => Some((t.text().to_string(), t.triggers_line_break())),
                _ => None,
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a".to_string(), true),
                (String::new(), true),
                ("b".to_string(), false)
            ]
        );
    }
}
