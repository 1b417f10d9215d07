//! User-Agent style sheet.
//!
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html)
//!
//! "User agents are expected to have a default style sheet that presents
//! elements of HTML documents in ways consistent with general user
//! expectations."
//!
//! Parsing is external to this crate, so the defaults are built directly as
//! rule objects.

use crate::stylesheet::{Declaration, DeclarationBlock, Origin, StyleSheet};
use crate::values::{Keyword, Property, Value};

fn block(declarations: &[(Property, Value)]) -> DeclarationBlock {
    declarations
        .iter()
        .map(|(p, v)| Declaration::new(*p, v.clone()))
        .collect()
}

fn vertical_margins(em: f32) -> [(Property, Value); 2] {
    [
        (Property::MarginTop, Value::em(em)),
        (Property::MarginBottom, Value::em(em)),
    ]
}

fn heading(size_em: Option<f32>, margin_em: f32) -> DeclarationBlock {
    let mut declarations = vec![(Property::FontWeight, Value::Keyword(Keyword::Bold))];
    if let Some(size) = size_em {
        declarations.push((Property::FontSize, Value::em(size)));
    }
    declarations.extend(vertical_margins(margin_em));
    block(&declarations)
}

/// A fresh copy of the default style sheet, with [`Origin::UserAgent`].
#[must_use]
pub fn ua_stylesheet() -> StyleSheet {
    let display = |k| [(Property::Display, Value::Keyword(k))];
    StyleSheet::new(Origin::UserAgent)
        // [§ 15.3.1 Hidden elements](https://html.spec.whatwg.org/multipage/rendering.html#hidden-elements)
        .with_rule(
            "area, base, basefont, datalist, head, link, meta, noembed, \
             noframes, param, rp, script, style, template, title",
            block(&display(Keyword::None)),
        )
        // [§ 15.3.3 Flow content](https://html.spec.whatwg.org/multipage/rendering.html#flow-content-3)
        .with_rule(
            "address, article, aside, blockquote, body, center, dd, details, \
             dialog, dir, div, dl, dt, fieldset, figcaption, figure, footer, \
             form, h1, h2, h3, h4, h5, h6, header, hgroup, hr, html, legend, \
             li, listing, main, menu, nav, ol, p, plaintext, pre, search, \
             section, summary, ul, xmp",
            block(&display(Keyword::Block)),
        )
        // [§ 15.3.6 Sections and headings](https://html.spec.whatwg.org/multipage/rendering.html#sections-and-headings)
        .with_rule("h1", heading(Some(2.0), 0.67))
        .with_rule("h2", heading(Some(1.5), 0.83))
        .with_rule("h3", heading(Some(1.17), 1.0))
        .with_rule("h4", heading(None, 1.33))
        .with_rule("h5", heading(Some(0.83), 1.67))
        .with_rule("h6", heading(Some(0.67), 2.33))
        // [§ 15.3.5 Grouping content](https://html.spec.whatwg.org/multipage/rendering.html#grouping-content)
        .with_rule(
            "p, blockquote, figure, listing, plaintext, pre, xmp, ol, ul, menu",
            block(&vertical_margins(1.0)),
        )
        .with_rule(
            "blockquote, figure",
            block(&[
                (Property::MarginLeft, Value::px(40.0)),
                (Property::MarginRight, Value::px(40.0)),
            ]),
        )
        .with_rule("ol, ul, menu", block(&[(Property::PaddingLeft, Value::px(40.0))]))
        .with_rule(
            "listing, plaintext, pre, xmp",
            block(&[
                (Property::WhiteSpace, Value::Keyword(Keyword::Pre)),
                (Property::FontFamily, Value::String("monospace".to_string())),
            ]),
        )
        // [§ 15.3.4 The page](https://html.spec.whatwg.org/multipage/rendering.html#the-page)
        .with_rule(
            "body",
            block(&[
                (Property::MarginTop, Value::px(8.0)),
                (Property::MarginRight, Value::px(8.0)),
                (Property::MarginBottom, Value::px(8.0)),
                (Property::MarginLeft, Value::px(8.0)),
            ]),
        )
        // [§ 15.3.8 Text-level semantics](https://html.spec.whatwg.org/multipage/rendering.html#text-level-semantics)
        .with_rule("b, strong, th", block(&[(Property::FontWeight, Value::Keyword(Keyword::Bold))]))
        .with_rule(
            "em, i, cite, dfn, var",
            block(&[(Property::FontStyle, Value::Keyword(Keyword::Italic))]),
        )
        .with_rule(
            "[dir=rtl]",
            block(&[(Property::Direction, Value::Keyword(Keyword::Rtl))]),
        )
        .with_rule(
            "[dir=ltr]",
            block(&[(Property::Direction, Value::Keyword(Keyword::Ltr))]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorIndex;

    #[test]
    fn test_every_ua_selector_is_indexable() {
        let sheet = ua_stylesheet();
        let index = SelectorIndex::build([(0, &sheet)]);
        assert_eq!(index.rejected(), 0);
        assert!(index.len() > 60);
        assert!(sheet.rules().iter().all(|r| !r.declarations.is_empty()));
    }
}
