//! Integration tests for box generation and layout, from DOM to positioned
//! boxes.

use trellis_css::layout::{MeasureContext, ProviderMap};
use trellis_css::{
    ApproximateFontMetrics, BoxKind, BoxTree, Declaration, DeclarationBlock, Keyword,
    LayoutConfig, Origin, Property, Rect, StyleSheet, Value, Viewport, build_box_tree,
    compute_styles, layout_root,
};
use trellis_dom::{DomTree, ElementData, NodeId};

const VIEWPORT_WIDTH: f32 = 800.0;

fn declarations(values: &[(Property, Value)]) -> DeclarationBlock {
    values
        .iter()
        .map(|(p, v)| Declaration::new(*p, v.clone()))
        .collect()
}

/// `html > body`; returns the tree and the body.
fn document() -> (DomTree, NodeId) {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    (tree, body)
}

fn lay_out(dom: &DomTree, sheet: StyleSheet) -> BoxTree {
    let styles = compute_styles(dom, &[sheet], Viewport::new(VIEWPORT_WIDTH, 600.0));
    let mut tree = build_box_tree(dom, &styles, &ProviderMap::new());
    let metrics = ApproximateFontMetrics;
    let config = LayoutConfig::default();
    let cx = MeasureContext::new(&metrics, &config).within(VIEWPORT_WIDTH);
    let _ = layout_root(&mut tree, VIEWPORT_WIDTH, &cx);
    tree
}

fn content_of(tree: &BoxTree, node: NodeId) -> Option<Rect> {
    let id = *tree.boxes_for_node(node).first()?;
    tree.get(id)?.dimensions.map(|d| d.content)
}

#[test]
fn test_fixed_width_block_is_centered_by_auto_margins() {
    let (mut dom, body) = document();
    let div = dom.append_element(body, ElementData::new("div"));
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        "div",
        declarations(&[
            (Property::Width, Value::px(100.0)),
            (Property::Height, Value::px(50.0)),
            (Property::MarginLeft, Value::Keyword(Keyword::Auto)),
            (Property::MarginRight, Value::Keyword(Keyword::Auto)),
        ]),
    );
    let tree = lay_out(&dom, sheet);

    // body has the user-agent 8px margin on every side.
    assert_eq!(content_of(&tree, body), Some(Rect::new(8.0, 8.0, 784.0, 50.0)));
    assert_eq!(content_of(&tree, div), Some(Rect::new(350.0, 8.0, 100.0, 50.0)));
    let margin = tree
        .boxes_for_node(div)
        .first()
        .and_then(|id| tree.get(*id))
        .and_then(|b| b.dimensions)
        .map(|d| (d.margin.left, d.margin.right));
    assert_eq!(margin, Some((342.0, 342.0)));
}

#[test]
fn test_adjoining_sibling_margins_collapse() {
    let (mut dom, body) = document();
    let first = dom.append_element(body, ElementData::new("div"));
    let second = dom.append_element(body, ElementData::new("div"));
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        "div",
        declarations(&[
            (Property::Height, Value::px(10.0)),
            (Property::MarginTop, Value::px(20.0)),
            (Property::MarginBottom, Value::px(30.0)),
        ]),
    );
    let tree = lay_out(&dom, sheet);

    // Parent and first child margins stay apart.
    assert_eq!(content_of(&tree, first).map(|r| r.y), Some(28.0));
    // 30 and 20 collapse to 30.
    assert_eq!(content_of(&tree, second).map(|r| r.y), Some(68.0));
    assert_eq!(content_of(&tree, body).map(|r| r.height), Some(100.0));
}

#[test]
fn test_text_wraps_inside_a_narrow_block() {
    let (mut dom, body) = document();
    let div = dom.append_element(body, ElementData::new("div"));
    let _ = dom.append_text(div, "hello   big\nworld");
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        "div",
        declarations(&[
            (Property::Width, Value::px(60.0)),
            (Property::FontSize, Value::px(10.0)),
        ]),
    );
    let tree = lay_out(&dom, sheet);

    let div_box = tree.boxes_for_node(div)[0];
    let lines = tree.get(div_box).map(|b| b.lines.clone()).unwrap_or_default();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].bounds.y, lines[0].bounds.y + 12.0);
    assert_eq!(content_of(&tree, div).map(|r| r.height), Some(24.0));

    let words: Vec<String> = lines
        .iter()
        .flat_map(|line| line.fragments.iter())
        .filter_map(|id| match tree.get(*id).map(|b| &b.kind) {
            Some(BoxKind::Text(text)) => Some(text.non_collapsible_text().to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(words, vec!["hello big", "world"]);
}

#[test]
fn test_preformatted_text_breaks_at_newlines_only() {
    let (mut dom, body) = document();
    let pre = dom.append_element(body, ElementData::new("pre"));
    let _ = dom.append_text(pre, "one two\nthree");
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        "pre",
        declarations(&[
            (Property::Width, Value::px(10.0)),
            (Property::FontSize, Value::px(10.0)),
        ]),
    );
    let tree = lay_out(&dom, sheet);

    let pre_box = tree.boxes_for_node(pre)[0];
    let line_count = tree.get(pre_box).map(|b| b.lines.len());
    assert_eq!(line_count, Some(2));
}

#[test]
fn test_display_none_generates_no_boxes() {
    let (mut dom, body) = document();
    let hidden = dom.append_element(body, ElementData::new("div").with_attr("class", "gone"));
    let child = dom.append_element(hidden, ElementData::new("p"));
    let _ = dom.append_text(child, "invisible");
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        ".gone",
        declarations(&[(Property::Display, Value::Keyword(Keyword::None))]),
    );
    let tree = lay_out(&dom, sheet);

    assert!(tree.boxes_for_node(hidden).is_empty());
    assert!(tree.boxes_for_node(child).is_empty());
    assert_eq!(content_of(&tree, body).map(|r| r.height), Some(0.0));
}

#[test]
fn test_block_inside_inline_splits_the_inline() {
    let (mut dom, body) = document();
    let span = dom.append_element(body, ElementData::new("span"));
    let _ = dom.append_text(span, "before");
    let div = dom.append_element(span, ElementData::new("div"));
    let _ = dom.append_text(div, "middle");
    let _ = dom.append_text(span, "after");
    let tree = lay_out(&dom, StyleSheet::new(Origin::Author));

    assert_eq!(tree.boxes_for_node(span).len(), 2);
    let body_box = tree.boxes_for_node(body)[0];
    let kinds: Vec<&str> = tree
        .children(body_box)
        .iter()
        .filter_map(|id| tree.get(*id).map(|b| b.kind.name()))
        .collect();
    assert_eq!(kinds, vec!["anonymous-block", "block", "anonymous-block"]);

    // Three lines of 16px text, one per block, stacked.
    let ys: Vec<f32> = tree
        .children(body_box)
        .iter()
        .filter_map(|id| tree.get(*id).and_then(|b| b.dimensions))
        .map(|d| d.content.y)
        .collect();
    assert_eq!(ys.len(), 3);
    assert!(ys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_inline_replaced_element_sizes() {
    let (mut dom, body) = document();
    let plain = dom.append_element(body, ElementData::new("img"));
    let sized = dom.append_element(
        body,
        ElementData::new("img")
            .with_attr("width", "80")
            .with_attr("height", "40"),
    );
    let tree = lay_out(&dom, StyleSheet::new(Origin::Author));

    // Nothing known: 300 x 150, sitting on the baseline at the line start.
    assert_eq!(content_of(&tree, plain), Some(Rect::new(8.0, 8.0, 300.0, 150.0)));
    assert_eq!(content_of(&tree, sized).map(|r| (r.x, r.width, r.height)), Some((308.0, 80.0, 40.0)));
}

#[test]
fn test_block_replaced_element_uses_ratio_and_auto_margins() {
    let (mut dom, body) = document();
    let img = dom.append_element(body, ElementData::new("img"));
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        "img",
        declarations(&[
            (Property::Display, Value::Keyword(Keyword::Block)),
            (Property::Width, Value::px(100.0)),
            (Property::MarginLeft, Value::Keyword(Keyword::Auto)),
            (Property::MarginRight, Value::Keyword(Keyword::Auto)),
        ]),
    );
    let tree = lay_out(&dom, sheet);

    assert_eq!(content_of(&tree, img), Some(Rect::new(350.0, 8.0, 100.0, 50.0)));
    assert_eq!(content_of(&tree, body).map(|r| r.height), Some(50.0));
}

#[test]
fn test_box_tree_snapshot_is_serializable() {
    let (mut dom, body) = document();
    let _ = dom.append_text(body, "hi");
    let tree = lay_out(&dom, StyleSheet::new(Origin::Author));

    let json = serde_json::to_value(&tree).expect("box tree serializes");
    assert_eq!(json["kind"], "anonymous-block");
    assert_eq!(json["children"][0]["kind"], "block");
    let text = &json["children"][0]["children"][0]["children"][0]["children"][0];
    assert_eq!(text["kind"], "text");
    assert_eq!(text["text"], "hi");
}
