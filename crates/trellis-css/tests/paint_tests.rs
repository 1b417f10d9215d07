//! Integration tests for the full pipeline: style, layout and display list
//! emission through a [`LayoutContext`].

use std::sync::{Arc, Mutex};

use trellis_css::{
    ApproximateFontMetrics, Color, ContentProvider, Declaration, DeclarationBlock, DisplayCommand,
    FontSpec, IntrinsicSize, Keyword, LayoutContext, LayoutMessage, MediaFrame, Origin, Property,
    Rect, StyleSheet, Value, Viewport,
};
use trellis_dom::{DomTree, ElementData, NodeId};

const BLUE: Color = Color::rgb(0, 0, 255);

fn declarations(values: &[(Property, Value)]) -> DeclarationBlock {
    values
        .iter()
        .map(|(p, v)| Declaration::new(*p, v.clone()))
        .collect()
}

fn context_with(sheet: StyleSheet) -> LayoutContext {
    let mut cx = LayoutContext::new(Viewport::new(800.0, 600.0), Box::new(ApproximateFontMetrics));
    let _ = cx.engine_mut().add_style_sheet(sheet);
    cx
}

fn document() -> (DomTree, NodeId) {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    (tree, body)
}

/// A video element whose decoder has not produced a frame yet.
struct Decoder {
    size: IntrinsicSize,
    frame: Mutex<Option<MediaFrame>>,
}

impl Decoder {
    fn new(width: u32, height: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let size = IntrinsicSize::from_dimensions(width as f32, height as f32);
        Self {
            size,
            frame: Mutex::new(None),
        }
    }

    fn decode(&self, frame: MediaFrame) {
        *self.frame.lock().expect("decoder lock") = Some(frame);
    }
}

impl ContentProvider for Decoder {
    fn intrinsic_size(&self) -> IntrinsicSize {
        self.size
    }

    fn current_frame(&self) -> Option<MediaFrame> {
        *self.frame.lock().expect("decoder lock")
    }
}

fn video_page() -> (DomTree, NodeId, StyleSheet) {
    let (mut dom, body) = document();
    let video = dom.append_element(body, ElementData::new("video"));
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        "video",
        declarations(&[
            (Property::Display, Value::Keyword(Keyword::Block)),
            (Property::Width, Value::px(100.0)),
            (Property::Height, Value::px(100.0)),
        ]),
    );
    (dom, video, sheet)
}

#[test]
fn test_wide_frame_is_letterboxed() {
    let (dom, video, sheet) = video_page();
    let decoder = Arc::new(Decoder::new(200, 50));
    let frame = MediaFrame {
        id: 7,
        width: 200,
        height: 50,
    };
    decoder.decode(frame);

    let mut cx = context_with(sheet);
    cx.register_provider(video, decoder);
    let _ = cx.update(&dom);
    let list = cx.paint();

    assert_eq!(
        list.commands(),
        &[
            DisplayCommand::FillRect {
                rect: Rect::new(8.0, 8.0, 100.0, 37.5),
                color: Color::BLACK,
            },
            DisplayCommand::FillRect {
                rect: Rect::new(8.0, 70.5, 100.0, 37.5),
                color: Color::BLACK,
            },
            DisplayCommand::DrawReplaced {
                frame,
                rect: Rect::new(8.0, 45.5, 100.0, 25.0),
            },
        ]
    );
}

#[test]
fn test_frame_arriving_later_is_painted() {
    let (dom, video, sheet) = video_page();
    let decoder = Arc::new(Decoder::new(100, 100));
    let mut cx = context_with(sheet);
    cx.register_provider(video, Arc::clone(&decoder) as Arc<dyn ContentProvider>);
    let _ = cx.update(&dom);
    assert!(cx.paint().is_empty());

    decoder.decode(MediaFrame {
        id: 1,
        width: 100,
        height: 100,
    });
    if let Some(sender) = cx.sender() {
        assert!(sender.send(LayoutMessage::MediaReady(video)).is_ok());
    }
    let _ = cx.update(&dom);
    assert_eq!(cx.passes(), 2);

    let list = cx.paint();
    assert_eq!(list.len(), 1);
    assert!(matches!(
        list.commands()[0],
        DisplayCommand::DrawReplaced { rect, .. } if rect == Rect::new(8.0, 8.0, 100.0, 100.0)
    ));
}

#[test]
fn test_text_is_drawn_on_its_baseline() {
    let (mut dom, body) = document();
    let div = dom.append_element(body, ElementData::new("div"));
    let _ = dom.append_text(div, "  hi  ");
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        "div",
        declarations(&[(Property::Color, Value::Color(BLUE))]),
    );
    let mut cx = context_with(sheet);
    let _ = cx.update(&dom);
    let list = cx.paint();

    assert_eq!(list.len(), 1);
    let DisplayCommand::DrawText {
        text,
        x,
        y,
        font,
        color,
        bidi_level,
        word_spacing,
    } = &list.commands()[0]
    else {
        panic!("expected text, got {:?}", list.commands());
    };
    assert_eq!(text, "hi");
    assert_eq!(*x, 8.0);
    // 16px font, normal line height 19.2px: half-leading 1.6 + ascent 12.8.
    assert!((*y - 22.4).abs() < 1e-3, "baseline at {y}");
    assert_eq!(font, &FontSpec::default());
    assert_eq!(*color, BLUE);
    assert_eq!(*bidi_level, 0);
    assert_eq!(*word_spacing, 0.0);
}

#[test]
fn test_hidden_box_skipped_but_visible_child_painted() {
    let (mut dom, body) = document();
    let outer = dom.append_element(body, ElementData::new("div").with_attr("class", "outer"));
    let _ = dom.append_element(outer, ElementData::new("div").with_attr("class", "inner"));
    let sheet = StyleSheet::new(Origin::Author)
        .with_rule(
            ".outer",
            declarations(&[
                (Property::Visibility, Value::Keyword(Keyword::Hidden)),
                (Property::BackgroundColor, Value::Color(Color::WHITE)),
                (Property::Height, Value::px(10.0)),
            ]),
        )
        .with_rule(
            ".inner",
            declarations(&[
                (Property::Visibility, Value::Keyword(Keyword::Visible)),
                (Property::BackgroundColor, Value::Color(BLUE)),
                (Property::Height, Value::px(5.0)),
            ]),
        );
    let mut cx = context_with(sheet);
    let _ = cx.update(&dom);

    assert_eq!(
        cx.paint().commands(),
        &[DisplayCommand::FillRect {
            rect: Rect::new(8.0, 8.0, 784.0, 5.0),
            color: BLUE,
        }]
    );
}

#[test]
fn test_borders_follow_background() {
    let (mut dom, body) = document();
    let _ = dom.append_element(body, ElementData::new("div"));
    let sheet = StyleSheet::new(Origin::Author).with_rule(
        "div",
        declarations(&[
            (Property::Height, Value::px(20.0)),
            (Property::BackgroundColor, Value::Color(Color::WHITE)),
            (Property::BorderColor, Value::Color(BLUE)),
            (Property::BorderLeftWidth, Value::px(4.0)),
        ]),
    );
    let mut cx = context_with(sheet);
    let _ = cx.update(&dom);

    assert_eq!(
        cx.paint().commands(),
        &[
            DisplayCommand::FillRect {
                rect: Rect::new(8.0, 8.0, 784.0, 20.0),
                color: Color::WHITE,
            },
            DisplayCommand::FillRect {
                rect: Rect::new(8.0, 8.0, 4.0, 20.0),
                color: BLUE,
            },
        ]
    );
}

#[test]
fn test_display_list_serialization_is_deterministic() {
    let build = || {
        let (mut dom, body) = document();
        let div = dom.append_element(body, ElementData::new("div"));
        let _ = dom.append_text(div, "same every time");
        let sheet = StyleSheet::new(Origin::Author).with_rule(
            "div",
            declarations(&[(Property::BackgroundColor, Value::Color(BLUE))]),
        );
        let mut cx = context_with(sheet);
        let _ = cx.update(&dom);
        serde_json::to_string(&cx.paint()).expect("display list serializes")
    };

    let first = build();
    assert_eq!(first, build());

    let json: serde_json::Value = serde_json::from_str(&first).expect("valid json");
    assert_eq!(json[0]["command"], "fill_rect");
    assert_eq!(json[0]["color"]["b"], 255);
    assert_eq!(json[1]["command"], "draw_text");
    assert_eq!(json[1]["text"], "same every time");
}
