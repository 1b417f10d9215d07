//! Rule index keyed on subject compounds.
//!
//! Every selector is stored right to left: its subject compound is a root
//! of the selector tree, and each compound further left hangs off the
//! previous one through a combinator-typed edge. Selectors sharing a suffix
//! (`nav a`, `footer a`) share the `a` root. A rule is attached to the node
//! where its chain ends.
//!
//! Roots are bucketed by their highest-ranked simple selector (id, then
//! class, then type, else universal), so matching an element only visits
//! roots that could possibly hold for it.
//!
//! The index is immutable: a style sheet or media gate change builds a new
//! one.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use trellis_common::warning::warn_once;
use trellis_dom::{DomTree, NodeId};

use super::{
    Combinator, CompoundSelector, SimpleSelector, Specificity, parse_selector, relatives,
    split_selector_list,
};
use crate::stylesheet::{DeclarationBlock, Origin, StyleSheet};

/// One rule (per selector of its selector list) that matched an element.
#[derive(Debug, Clone)]
pub struct MatchedRule {
    /// Origin of the owning sheet.
    pub origin: Origin,
    /// Specificity of the selector that matched.
    pub specificity: Specificity,
    /// Position of the owning sheet in the engine's sheet list.
    pub sheet_index: usize,
    /// Position of the rule in its sheet.
    pub source_index: usize,
    /// The rule's declarations.
    pub declarations: Arc<DeclarationBlock>,
}

#[derive(Debug)]
struct SelectorTreeNode {
    compound: CompoundSelector,
    /// Entries in `SelectorIndex::rules` whose chain ends here.
    rules: Vec<usize>,
    /// Edges toward compounds further left.
    children: Vec<(Combinator, usize)>,
}

#[derive(Debug, Default)]
struct RootBuckets {
    by_id: HashMap<String, Vec<usize>>,
    by_class: HashMap<String, Vec<usize>>,
    by_type: HashMap<String, Vec<usize>>,
    universal: Vec<usize>,
}

/// Immutable selector tree over the active style sheets.
#[derive(Debug, Default)]
pub struct SelectorIndex {
    nodes: Vec<SelectorTreeNode>,
    roots: HashMap<CompoundSelector, usize>,
    edges: HashMap<(usize, Combinator, CompoundSelector), usize>,
    buckets: RootBuckets,
    rules: Vec<MatchedRule>,
    rejected: usize,
}

impl SelectorIndex {
    /// Build an index over `sheets`, given as `(sheet_index, sheet)` pairs.
    ///
    /// Selectors that fail to parse are logged once and left out.
    #[must_use]
    pub fn build<'a, I>(sheets: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a StyleSheet)>,
    {
        let mut index = Self::default();
        for (sheet_index, sheet) in sheets {
            for rule in sheet.rules() {
                for text in split_selector_list(&rule.selector_text) {
                    match parse_selector(text) {
                        Ok(selector) => {
                            let entry = index.rules.len();
                            index.rules.push(MatchedRule {
                                origin: sheet.origin(),
                                specificity: selector.specificity(),
                                sheet_index,
                                source_index: rule.source_index,
                                declarations: Arc::clone(&rule.declarations),
                            });
                            let mut node = index.root_for(selector.subject);
                            for (combinator, compound) in selector.combinators {
                                node = index.child_for(node, combinator, compound);
                            }
                            index.nodes[node].rules.push(entry);
                        }
                        Err(err) => {
                            index.rejected += 1;
                            warn_once("css", &format!("dropping selector '{text}': {err}"));
                        }
                    }
                }
            }
        }
        log::debug!(
            target: "css",
            "selector index built: {} selectors, {} nodes, {} rejected",
            index.rules.len(),
            index.nodes.len(),
            index.rejected
        );
        index
    }

    fn alloc(&mut self, compound: CompoundSelector) -> usize {
        self.nodes.push(SelectorTreeNode {
            compound,
            rules: Vec::new(),
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn root_for(&mut self, subject: CompoundSelector) -> usize {
        if let Some(&node) = self.roots.get(&subject) {
            return node;
        }
        let node = self.alloc(subject.clone());
        let bucket = bucket_key(&subject);
        let _ = self.roots.insert(subject, node);
        match bucket {
            BucketKey::Id(id) => self.buckets.by_id.entry(id).or_default().push(node),
            BucketKey::Class(class) => self.buckets.by_class.entry(class).or_default().push(node),
            BucketKey::Type(tag) => self.buckets.by_type.entry(tag).or_default().push(node),
            BucketKey::Universal => self.buckets.universal.push(node),
        }
        node
    }

    fn child_for(&mut self, parent: usize, combinator: Combinator, compound: CompoundSelector) -> usize {
        let key = (parent, combinator, compound);
        if let Some(&node) = self.edges.get(&key) {
            return node;
        }
        let node = self.alloc(key.2.clone());
        self.nodes[parent].children.push((combinator, node));
        let _ = self.edges.insert(key, node);
        node
    }

    /// Number of indexed selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of selectors left out at build time.
    #[must_use]
    pub const fn rejected(&self) -> usize {
        self.rejected
    }

    /// Number of nodes in the selector tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every indexed selector that matches `node`, each with its own
    /// specificity, in index order (sheet order, then rule order, then
    /// position in the selector list).
    #[must_use]
    pub fn match_element(&self, tree: &DomTree, node: NodeId) -> Vec<MatchedRule> {
        let Some(element) = tree.as_element(node) else {
            return Vec::new();
        };

        // STEP 1: Candidate roots from the buckets this element can hit.
        let mut candidates: BTreeSet<usize> = self.buckets.universal.iter().copied().collect();
        let mut extend = |roots: Option<&Vec<usize>>| {
            candidates.extend(roots.into_iter().flatten().copied());
        };
        if let Some(id) = element.id() {
            extend(self.buckets.by_id.get(id));
        }
        for class in element.classes() {
            extend(self.buckets.by_class.get(class));
        }
        extend(self.buckets.by_type.get(&element.tag_name));

        // STEP 2: Walk each matching root toward ancestors and siblings.
        let mut hits = BTreeSet::new();
        let mut visited = HashSet::new();
        for root in candidates {
            if self.nodes[root].compound.matches(tree, node) {
                self.collect(root, tree, node, &mut hits, &mut visited);
            }
        }

        hits.into_iter().map(|entry| self.rules[entry].clone()).collect()
    }

    /// `tree_node` is already known to match `element`. Record its rules and
    /// try every edge. A `(tree_node, element)` pair is explored once: the
    /// rules reachable from it do not depend on how it was reached.
    fn collect(
        &self,
        tree_node: usize,
        tree: &DomTree,
        element: NodeId,
        hits: &mut BTreeSet<usize>,
        visited: &mut HashSet<(usize, NodeId)>,
    ) {
        if !visited.insert((tree_node, element)) {
            return;
        }
        let node = &self.nodes[tree_node];
        hits.extend(node.rules.iter().copied());
        for &(combinator, child) in &node.children {
            let compound = &self.nodes[child].compound;
            for candidate in relatives(combinator, tree, element) {
                if compound.matches(tree, candidate) {
                    self.collect(child, tree, candidate, hits, visited);
                }
            }
        }
    }
}

enum BucketKey {
    Id(String),
    Class(String),
    Type(String),
    Universal,
}

fn bucket_key(compound: &CompoundSelector) -> BucketKey {
    let simple = &compound.simple_selectors;
    if let Some(id) = simple.iter().find_map(|s| match s {
        SimpleSelector::Id(id) => Some(id),
        _ => None,
    }) {
        return BucketKey::Id(id.clone());
    }
    if let Some(class) = simple.iter().find_map(|s| match s {
        SimpleSelector::Class(class) => Some(class),
        _ => None,
    }) {
        return BucketKey::Class(class.clone());
    }
    if let Some(tag) = simple.iter().find_map(|s| match s {
        SimpleSelector::Type(tag) => Some(tag),
        _ => None,
    }) {
        return BucketKey::Type(tag.clone());
    }
    BucketKey::Universal
}
