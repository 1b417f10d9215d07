//! Integration tests for the selector index.

use trellis_css::{DeclarationBlock, Origin, SelectorIndex, Specificity, StyleSheet};
use trellis_dom::{DomTree, ElementData, NodeId};

fn sheet(selectors: &[&str]) -> StyleSheet {
    selectors
        .iter()
        .fold(StyleSheet::new(Origin::Author), |sheet, sel| {
            sheet.with_rule(sel, DeclarationBlock::new())
        })
}

/// ```text
/// body
/// ├── nav
/// │   └── a#home.x
/// ├── h1
/// ├── "\n"
/// ├── p.first
/// └── p.second
/// ```
struct Page {
    tree: DomTree,
    link: NodeId,
    h1: NodeId,
    first: NodeId,
    second: NodeId,
}

fn page() -> Page {
    let mut tree = DomTree::new();
    let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
    let nav = tree.append_element(body, ElementData::new("nav"));
    let link = tree.append_element(
        nav,
        ElementData::new("a").with_attr("id", "home").with_attr("class", "x"),
    );
    let h1 = tree.append_element(body, ElementData::new("h1"));
    let _ = tree.append_text(body, "\n");
    let first = tree.append_element(body, ElementData::new("p").with_attr("class", "first"));
    let second = tree.append_element(body, ElementData::new("p").with_attr("class", "second"));
    Page {
        tree,
        link,
        h1,
        first,
        second,
    }
}

fn source_indices(index: &SelectorIndex, tree: &DomTree, node: NodeId) -> Vec<usize> {
    index
        .match_element(tree, node)
        .iter()
        .map(|m| m.source_index)
        .collect()
}

#[test]
fn test_matches_report_their_own_specificity() {
    let page = page();
    let sheet = sheet(&["a", "nav a", "a.x", "#home", "footer a", "body > nav > a#home.x"]);
    let index = SelectorIndex::build([(0, &sheet)]);

    let matched = index.match_element(&page.tree, page.link);
    let found: Vec<(usize, Specificity)> = matched
        .iter()
        .map(|m| (m.source_index, m.specificity))
        .collect();
    assert_eq!(
        found,
        vec![
            (0, Specificity(0, 0, 1)),
            (1, Specificity(0, 0, 2)),
            (2, Specificity(0, 1, 1)),
            (3, Specificity(1, 0, 0)),
            (5, Specificity(1, 1, 3)),
        ]
    );
}

#[test]
fn test_sibling_combinators() {
    let page = page();
    let sheet = sheet(&["h1 + p", "h1 ~ p", "p + p", "nav + h1"]);
    let index = SelectorIndex::build([(0, &sheet)]);

    // The text node between h1 and p.first is not an element sibling.
    assert_eq!(source_indices(&index, &page.tree, page.first), vec![0, 1]);
    assert_eq!(source_indices(&index, &page.tree, page.second), vec![1, 2]);
    assert_eq!(source_indices(&index, &page.tree, page.h1), vec![3]);
}

#[test]
fn test_structural_pseudo_classes_and_attributes() {
    let page = page();
    let sheet = sheet(&[
        "p:first-of-type",
        "p:last-child",
        "[class^=sec]",
        "a[id]",
        ":root",
        "h1:empty",
    ]);
    let index = SelectorIndex::build([(0, &sheet)]);

    assert_eq!(source_indices(&index, &page.tree, page.first), vec![0]);
    assert_eq!(source_indices(&index, &page.tree, page.second), vec![1, 2]);
    assert_eq!(source_indices(&index, &page.tree, page.link), vec![3]);
    assert_eq!(source_indices(&index, &page.tree, page.h1), vec![5]);
}

#[test]
fn test_bad_selectors_leave_the_rest_of_the_list_intact() {
    let page = page();
    let sheet = sheet(&["a:hover, a.x", "p::before", "p >", "h1"]);
    let index = SelectorIndex::build([(0, &sheet)]);

    assert_eq!(index.len(), 2);
    assert_eq!(index.rejected(), 3);
    assert_eq!(source_indices(&index, &page.tree, page.link), vec![0]);
    assert_eq!(source_indices(&index, &page.tree, page.h1), vec![3]);
    assert!(index.match_element(&page.tree, page.first).is_empty());
}

#[test]
fn test_rules_from_several_sheets_keep_sheet_order() {
    let page = page();
    let ua = StyleSheet::new(Origin::UserAgent).with_rule("p", DeclarationBlock::new());
    let author = sheet(&["p.first"]);
    let index = SelectorIndex::build([(0, &ua), (1, &author)]);

    let matched = index.match_element(&page.tree, page.first);
    let sheets: Vec<(usize, Origin)> = matched.iter().map(|m| (m.sheet_index, m.origin)).collect();
    assert_eq!(sheets, vec![(0, Origin::UserAgent), (1, Origin::Author)]);
}
