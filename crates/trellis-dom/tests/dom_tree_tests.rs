//! Tests for DOM tree construction and traversal.

use trellis_dom::{DomTree, ElementData, NodeId};

fn make_element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    tree.append_element(parent, ElementData::new(tag))
}

#[test]
fn test_append_builds_parent_links() {
    let mut tree = DomTree::new();
    let html = make_element(&mut tree, NodeId::ROOT, "HTML");
    let body = make_element(&mut tree, html, "body");
    let text = tree.append_text(body, "hello");

    assert_eq!(tree.document_element(), Some(html));
    assert_eq!(tree.as_element(html).map(|e| e.tag_name.as_str()), Some("html"));
    assert_eq!(tree.parent(text), Some(body));
    assert_eq!(tree.children(body), &[text]);
    assert_eq!(tree.as_text(text), Some("hello"));
}

#[test]
fn test_sibling_navigation() {
    let mut tree = DomTree::new();
    let parent = make_element(&mut tree, NodeId::ROOT, "div");
    let a = make_element(&mut tree, parent, "a");
    let gap = tree.append_text(parent, " ");
    let b = make_element(&mut tree, parent, "b");

    assert_eq!(tree.prev_sibling(b), Some(gap));
    assert_eq!(tree.prev_element_sibling(b), Some(a));
    assert_eq!(tree.next_sibling(a), Some(gap));
    assert_eq!(tree.prev_sibling(a), None);
    assert_eq!(tree.preceding_siblings(b).collect::<Vec<_>>(), vec![gap, a]);
}

#[test]
fn test_ancestors_walk_to_document() {
    let mut tree = DomTree::new();
    let html = make_element(&mut tree, NodeId::ROOT, "html");
    let body = make_element(&mut tree, html, "body");
    let p = make_element(&mut tree, body, "p");

    assert_eq!(tree.ancestors(p).collect::<Vec<_>>(), vec![body, html, NodeId::ROOT]);
}

#[test]
fn test_descendants_are_pre_order() {
    let mut tree = DomTree::new();
    let root = make_element(&mut tree, NodeId::ROOT, "div");
    let a = make_element(&mut tree, root, "a");
    let a1 = tree.append_text(a, "x");
    let b = make_element(&mut tree, root, "b");

    assert_eq!(tree.descendants(root), vec![root, a, a1, b]);
}

#[test]
fn test_remove_and_reappend_moves_node() {
    let mut tree = DomTree::new();
    let left = make_element(&mut tree, NodeId::ROOT, "div");
    let right = make_element(&mut tree, NodeId::ROOT, "div");
    let child = make_element(&mut tree, left, "span");

    tree.append_child(right, child);
    assert!(tree.children(left).is_empty());
    assert_eq!(tree.parent(child), Some(right));

    tree.remove_child(right, child);
    assert_eq!(tree.parent(child), None);
    assert!(tree.children(right).is_empty());
}

#[test]
fn test_attributes_id_and_classes() {
    let mut tree = DomTree::new();
    let el = tree.append_element(
        NodeId::ROOT,
        ElementData::new("p").with_attr("ID", "intro").with_attr("class", "  lead  wide "),
    );
    let data = tree.as_element(el).unwrap();
    assert_eq!(data.id(), Some("intro"));
    assert_eq!(data.classes().collect::<Vec<_>>(), vec!["lead", "wide"]);
    assert!(data.has_class("wide"));
    assert!(!data.has_class("lea"));

    tree.set_attribute(el, "class", "other");
    assert!(tree.as_element(el).unwrap().has_class("other"));
}

#[test]
fn test_set_text_replaces_data() {
    let mut tree = DomTree::new();
    let t = tree.append_text(NodeId::ROOT, "before");
    tree.set_text(t, "after");
    assert_eq!(tree.as_text(t), Some("after"));
}
