//! The style pass: sheets, media gates, selector index and computed styles.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use trellis_dom::{DomTree, NodeId, NodeType};

use super::{cascade_declarations, compute_style};
use crate::layout::FontSpec;
use crate::media::{MediaGateCache, Viewport};
use crate::selector::SelectorIndex;
use crate::style::ComputedStyle;
use crate::stylesheet::{CssParser, DeclarationBlock, StyleSheet};
use crate::ua_stylesheet::ua_stylesheet;

/// Computed styles keyed by DOM node.
///
/// Elements get their own style; text nodes share their parent's `Arc`.
/// Comments and nodes under no element have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap {
    styles: BTreeMap<NodeId, Arc<ComputedStyle>>,
}

impl StyleMap {
    /// The style of `node`, if it has one.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&Arc<ComputedStyle>> {
        self.styles.get(&node)
    }

    /// Number of styled nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True if nothing has been styled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterate in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Arc<ComputedStyle>)> {
        self.styles.iter().map(|(id, style)| (*id, style))
    }

    fn insert(&mut self, node: NodeId, style: Arc<ComputedStyle>) {
        let _ = self.styles.insert(node, style);
    }
}

impl Serialize for StyleMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.styles.len()))?;
        for (node, style) in &self.styles {
            map.serialize_entry(&node.0, style.as_ref())?;
        }
        map.end()
    }
}

/// Stable handle to a sheet added with [`StyleEngine::add_style_sheet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleSheetId(u64);

/// Owns everything the style pass needs between runs.
///
/// The selector index is rebuilt only when the sheet list changes or a
/// media gate flips. Styles equal to the previous run keep their `Arc`.
pub struct StyleEngine {
    sheets: Vec<StyleSheet>,
    sheet_ids: Vec<StyleSheetId>,
    next_sheet_id: u64,
    viewport: Viewport,
    default_font: FontSpec,
    gates: MediaGateCache,
    index: Option<SelectorIndex>,
    index_generation: u64,
    inline_styles: HashMap<NodeId, DeclarationBlock>,
    parser: Option<Box<dyn CssParser>>,
    styles: StyleMap,
}

impl StyleEngine {
    /// An engine holding only the user-agent sheet.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        let mut engine = Self {
            sheets: Vec::new(),
            sheet_ids: Vec::new(),
            next_sheet_id: 0,
            viewport,
            default_font: FontSpec::default(),
            gates: MediaGateCache::new(),
            index: None,
            index_generation: 0,
            inline_styles: HashMap::new(),
            parser: None,
            styles: StyleMap::default(),
        };
        let _ = engine.add_style_sheet(ua_stylesheet());
        engine
    }

    /// Parser used for `style` attributes not overridden with
    /// [`set_inline_style`](Self::set_inline_style).
    pub fn set_parser(&mut self, parser: Box<dyn CssParser>) {
        self.parser = Some(parser);
    }

    /// Append a sheet after every existing one.
    pub fn add_style_sheet(&mut self, sheet: StyleSheet) -> StyleSheetId {
        let id = StyleSheetId(self.next_sheet_id);
        self.next_sheet_id += 1;
        self.sheets.push(sheet);
        self.sheet_ids.push(id);
        self.invalidate_sheets();
        id
    }

    /// Remove a sheet; later sheets keep their relative order.
    pub fn remove_style_sheet(&mut self, id: StyleSheetId) -> Option<StyleSheet> {
        let position = self.sheet_ids.iter().position(|s| *s == id)?;
        let _ = self.sheet_ids.remove(position);
        let sheet = self.sheets.remove(position);
        self.invalidate_sheets();
        Some(sheet)
    }

    fn invalidate_sheets(&mut self) {
        self.gates.invalidate();
        self.index = None;
    }

    /// Number of sheets, the user-agent sheet included.
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Change the viewport. Media gates are re-evaluated on the next
    /// [`compute`](Self::compute).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// The current viewport.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Font the root element inherits. Takes effect on the next
    /// [`compute`](Self::compute).
    pub fn set_default_font(&mut self, font: FontSpec) {
        self.default_font = font;
    }

    /// The font the root element inherits.
    #[must_use]
    pub const fn default_font(&self) -> &FontSpec {
        &self.default_font
    }

    /// Attach inline declarations to `node`, replacing its `style`
    /// attribute for cascade purposes.
    pub fn set_inline_style(&mut self, node: NodeId, declarations: DeclarationBlock) {
        let _ = self.inline_styles.insert(node, declarations);
    }

    /// Undo [`set_inline_style`](Self::set_inline_style).
    pub fn clear_inline_style(&mut self, node: NodeId) {
        let _ = self.inline_styles.remove(&node);
    }

    /// Incremented every time the selector index is rebuilt.
    #[must_use]
    pub const fn index_generation(&self) -> u64 {
        self.index_generation
    }

    /// Styles from the last [`compute`](Self::compute).
    #[must_use]
    pub const fn styles(&self) -> &StyleMap {
        &self.styles
    }

    /// [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
    ///
    /// Run the style pass over `dom` and return the resulting map.
    pub fn compute(&mut self, dom: &DomTree) -> &StyleMap {
        // STEP 1: Media gates. A flipped gate changes which rules exist.
        if self.gates.refresh(self.viewport, &self.sheets) {
            self.index = None;
        }

        // STEP 2: Selector index over the sheets whose gate is open.
        let index = match self.index.take() {
            Some(index) => index,
            None => {
                self.index_generation += 1;
                let gates = &self.gates;
                SelectorIndex::build(
                    self.sheets
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| gates.is_active(*i)),
                )
            }
        };

        // STEP 3: Cascade every element, parents before children.
        let previous = std::mem::take(&mut self.styles);
        let mut pass = StylePass {
            dom,
            index: &index,
            inline_styles: &self.inline_styles,
            parser: self.parser.as_deref(),
            viewport: self.viewport,
            previous: &previous,
            styles: StyleMap::default(),
        };
        let root = Arc::new(ComputedStyle::initial().with_font(&self.default_font));
        pass.visit(NodeId::ROOT, &root);
        let styles = pass.styles;

        log::debug!(
            target: "css",
            "style pass: {} nodes styled, index generation {}",
            styles.len(),
            self.index_generation
        );
        self.index = Some(index);
        self.styles = styles;
        &self.styles
    }
}

impl std::fmt::Debug for StyleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleEngine")
            .field("sheets", &self.sheets.len())
            .field("viewport", &self.viewport)
            .field("index_generation", &self.index_generation)
            .field("styles", &self.styles.len())
            .finish_non_exhaustive()
    }
}

struct StylePass<'a> {
    dom: &'a DomTree,
    index: &'a SelectorIndex,
    inline_styles: &'a HashMap<NodeId, DeclarationBlock>,
    parser: Option<&'a dyn CssParser>,
    viewport: Viewport,
    previous: &'a StyleMap,
    styles: StyleMap,
}

impl StylePass<'_> {
    fn visit(&mut self, node: NodeId, parent_style: &Arc<ComputedStyle>) {
        let Some(dom_node) = self.dom.get(node) else {
            return;
        };
        match &dom_node.node_type {
            NodeType::Document => {
                for &child in self.dom.children(node) {
                    self.visit(child, parent_style);
                }
            }
            NodeType::Element(element) => {
                let matched = self.index.match_element(self.dom, node);
                let parsed;
                let inline = match self.inline_styles.get(&node) {
                    Some(block) => Some(block),
                    None => match (element.attr("style"), self.parser) {
                        (Some(text), Some(parser)) => {
                            parsed = parser.parse_declarations(text);
                            Some(&parsed)
                        }
                        _ => None,
                    },
                };
                let winners = cascade_declarations(&matched, inline);
                let computed = compute_style(&winners, parent_style, self.viewport);
                let style = match self.previous.get(node) {
                    Some(old) if **old == computed => Arc::clone(old),
                    _ => Arc::new(computed),
                };
                self.styles.insert(node, Arc::clone(&style));
                for &child in self.dom.children(node) {
                    self.visit(child, &style);
                }
            }
            NodeType::Text(_) => self.styles.insert(node, Arc::clone(parent_style)),
            NodeType::Comment(_) => {}
        }
    }
}

/// One-shot style pass with the user-agent sheet followed by `sheets`.
#[must_use]
pub fn compute_styles(dom: &DomTree, sheets: &[StyleSheet], viewport: Viewport) -> StyleMap {
    let mut engine = StyleEngine::new(viewport);
    for sheet in sheets {
        let _ = engine.add_style_sheet(sheet.clone());
    }
    let _ = engine.compute(dom);
    engine.styles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaFeature, MediaList, MediaQuery, MediaType};
    use crate::stylesheet::{Declaration, Origin};
    use crate::values::{Property, Value};
    use trellis_dom::ElementData;

    fn red() -> DeclarationBlock {
        DeclarationBlock::new().with(Declaration::new(
            Property::Color,
            Value::Color(crate::values::Color::rgb(255, 0, 0)),
        ))
    }

    #[test]
    fn test_text_shares_parent_arc() {
        let mut dom = DomTree::new();
        let p = dom.append_element(NodeId::ROOT, ElementData::new("p"));
        let t = dom.append_text(p, "hi");
        let styles = compute_styles(&dom, &[], Viewport::default());
        let (Some(ps), Some(ts)) = (styles.get(p), styles.get(t)) else {
            panic!("missing styles");
        };
        assert!(Arc::ptr_eq(ps, ts));
        assert_eq!(ps.display(), crate::style::Display::Block);
    }

    #[test]
    fn test_unchanged_styles_keep_their_arc() {
        let mut dom = DomTree::new();
        let a = dom.append_element(NodeId::ROOT, ElementData::new("div"));
        let b = dom.append_element(NodeId::ROOT, ElementData::new("span"));
        let mut engine = StyleEngine::new(Viewport::default());
        let first = engine.compute(&dom).clone();

        engine.set_inline_style(b, red());
        let second = engine.compute(&dom).clone();
        assert!(Arc::ptr_eq(
            first.get(a).expect("styled"),
            second.get(a).expect("styled")
        ));
        assert!(!Arc::ptr_eq(
            first.get(b).expect("styled"),
            second.get(b).expect("styled")
        ));
    }

    #[test]
    fn test_index_rebuilt_only_on_sheet_or_gate_change() {
        let dom = DomTree::new();
        let mut engine = StyleEngine::new(Viewport::new(400.0, 300.0));
        let mut media = MediaList::new();
        media.append(MediaQuery::of_type(MediaType::Screen).and(MediaFeature::MaxWidth(500.0)));
        let narrow = engine.add_style_sheet(
            StyleSheet::new(Origin::Author)
                .with_media(media)
                .with_rule("p", red()),
        );

        let _ = engine.compute(&dom);
        assert_eq!(engine.index_generation(), 1);
        let _ = engine.compute(&dom);
        assert_eq!(engine.index_generation(), 1);

        engine.set_viewport(Viewport::new(450.0, 300.0));
        let _ = engine.compute(&dom);
        assert_eq!(engine.index_generation(), 1);

        engine.set_viewport(Viewport::new(900.0, 300.0));
        let _ = engine.compute(&dom);
        assert_eq!(engine.index_generation(), 2);

        assert!(engine.remove_style_sheet(narrow).is_some());
        assert!(engine.remove_style_sheet(narrow).is_none());
        let _ = engine.compute(&dom);
        assert_eq!(engine.index_generation(), 3);
    }

    #[test]
    fn test_default_font_is_inherited_from_the_root() {
        let mut dom = DomTree::new();
        let div = dom.append_element(NodeId::ROOT, ElementData::new("div"));
        let h1 = dom.append_element(div, ElementData::new("h1"));
        let mut engine = StyleEngine::new(Viewport::default());
        engine.set_default_font(FontSpec {
            family: "serif".to_string(),
            size: 20.0,
            ..FontSpec::default()
        });
        let styles = engine.compute(&dom);

        let div_font = styles.get(div).map(|s| s.font());
        assert_eq!(div_font.as_ref().map(|f| f.family.as_str()), Some("serif"));
        assert_eq!(div_font.map(|f| f.size), Some(20.0));
        // The user-agent 2em heading size resolves against the default.
        assert_eq!(styles.get(h1).map(|s| s.font_size()), Some(40.0));
    }
}
