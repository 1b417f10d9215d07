//! CSS Cascading and Style Computation
//!
//! This module implements style computation per
//! [CSS Cascading and Inheritance Level 4](https://www.w3.org/TR/css-cascade-4/).

mod engine;

pub use engine::{StyleEngine, StyleMap, StyleSheetId, compute_styles};

use std::collections::BTreeMap;

use strum::IntoEnumIterator;
use trellis_common::warning::warn_once;

use crate::media::Viewport;
use crate::selector::{MatchedRule, Specificity};
use crate::style::ComputedStyle;
use crate::stylesheet::{DeclarationBlock, Origin};
use crate::values::{Keyword, Length, LengthUnit, Property, Value};

/// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// Sort key of one declaration. The derived `Ord` compares fields in
/// declaration order, so the greatest key wins:
///
/// 1. importance (important beats normal regardless of origin)
/// 2. origin (`UserAgent < Author < Inline`)
/// 3. specificity
/// 4. order of appearance: sheet, rule, then position in the block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CascadePriority {
    /// `!important`
    pub important: bool,
    /// Origin of the declaring sheet.
    pub origin: Origin,
    /// Specificity of the matching selector.
    pub specificity: Specificity,
    /// Position of the owning sheet.
    pub sheet_index: usize,
    /// Source index of the rule in its sheet.
    pub source_index: usize,
    /// Position of the declaration inside its block.
    pub declaration_index: usize,
}

/// Pick, per property, the winning declared value among `matched` rules and
/// the element's inline declarations.
///
/// Declarations without a value, or with a value the property cannot
/// take, are skipped.
#[must_use]
pub fn cascade_declarations<'a>(
    matched: &'a [MatchedRule],
    inline: Option<&'a DeclarationBlock>,
) -> BTreeMap<Property, (CascadePriority, &'a Value)> {
    let mut winners = BTreeMap::new();
    for rule in matched {
        offer(&mut winners, &rule.declarations, |declaration_index, important| {
            CascadePriority {
                important,
                origin: rule.origin,
                specificity: rule.specificity,
                sheet_index: rule.sheet_index,
                source_index: rule.source_index,
                declaration_index,
            }
        });
    }
    if let Some(block) = inline {
        offer(&mut winners, block, |declaration_index, important| CascadePriority {
            important,
            origin: Origin::Inline,
            specificity: Specificity::default(),
            sheet_index: usize::MAX,
            source_index: 0,
            declaration_index,
        });
    }
    winners
}

fn offer<'a>(
    winners: &mut BTreeMap<Property, (CascadePriority, &'a Value)>,
    block: &'a DeclarationBlock,
    priority_of: impl Fn(usize, bool) -> CascadePriority,
) {
    for (position, declaration) in block.iter().enumerate() {
        let Some(value) = declaration.value.as_ref() else {
            continue;
        };
        if !accepts(declaration.property, value) {
            warn_once(
                "css",
                &format!("invalid value {value:?} for '{}'", declaration.property),
            );
            continue;
        }
        let priority = priority_of(position, declaration.important);
        match winners.get(&declaration.property) {
            Some((current, _)) if *current >= priority => {}
            _ => {
                let _ = winners.insert(declaration.property, (priority, value));
            }
        }
    }
}

/// Does `property` accept `value` at all?
fn accepts(property: Property, value: &Value) -> bool {
    use Keyword as K;
    let keyword = value.as_keyword();
    let is_length = matches!(value, Value::Length(_));
    let is_length_percentage = is_length || matches!(value, Value::Percentage(_));
    match value {
        Value::Inherit | Value::Initial => return true,
        Value::Length(l) if l.value < 0.0 && !allows_negative(property) => return false,
        Value::Percentage(p) if *p < 0.0 && !allows_negative(property) => return false,
        _ => {}
    }
    match property {
        Property::Display => matches!(keyword, Some(K::Block | K::Inline | K::None)),
        Property::Color => matches!(value, Value::Color(_)) || keyword == Some(K::CurrentColor),
        Property::BackgroundColor => {
            matches!(value, Value::Color(_)) || keyword == Some(K::Transparent)
        }
        Property::BorderColor => {
            matches!(value, Value::Color(_))
                || matches!(keyword, Some(K::Transparent | K::CurrentColor))
        }
        Property::FontFamily => matches!(value, Value::String(_)),
        Property::FontSize => is_length_percentage,
        Property::FontWeight => {
            matches!(value, Value::Number(_)) || matches!(keyword, Some(K::Normal | K::Bold))
        }
        Property::FontStyle => matches!(keyword, Some(K::Normal | K::Italic)),
        Property::LineHeight => {
            is_length_percentage || matches!(value, Value::Number(_)) || keyword == Some(K::Normal)
        }
        Property::WhiteSpace => matches!(keyword, Some(K::Normal | K::Pre | K::Nowrap)),
        Property::OverflowWrap => matches!(keyword, Some(K::Normal | K::BreakWord)),
        Property::Direction => matches!(keyword, Some(K::Ltr | K::Rtl)),
        Property::Visibility => matches!(keyword, Some(K::Visible | K::Hidden)),
        Property::TextAlign => {
            matches!(keyword, Some(K::Left | K::Right | K::Center | K::Justify))
        }
        Property::Width
        | Property::Height
        | Property::MarginTop
        | Property::MarginRight
        | Property::MarginBottom
        | Property::MarginLeft => is_length_percentage || keyword == Some(K::Auto),
        Property::PaddingTop
        | Property::PaddingRight
        | Property::PaddingBottom
        | Property::PaddingLeft => is_length_percentage,
        Property::BorderTopWidth
        | Property::BorderRightWidth
        | Property::BorderBottomWidth
        | Property::BorderLeftWidth => is_length,
    }
}

const fn allows_negative(property: Property) -> bool {
    matches!(
        property,
        Property::MarginTop | Property::MarginRight | Property::MarginBottom | Property::MarginLeft
    )
}

/// [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)
///
/// Turn the cascade winners into a complete computed style.
///
/// `font-size` is resolved first because `em` lengths in every other
/// property depend on it.
#[must_use]
pub fn compute_style(
    winners: &BTreeMap<Property, (CascadePriority, &Value)>,
    parent: &ComputedStyle,
    viewport: Viewport,
) -> ComputedStyle {
    // [§ 7 Defaulting](https://www.w3.org/TR/css-cascade-4/#defaulting)
    //
    // "If the cascaded value of a property is the inherit keyword, the
    // property's specified and computed values are the inherited value."
    let specified = |property: Property| -> Value {
        match winners.get(&property).map(|(_, value)| *value) {
            Some(Value::Inherit) => parent.get(property).clone(),
            Some(Value::Initial) => property.initial_value(),
            Some(value) => value.clone(),
            None if property.is_inherited() => parent.get(property).clone(),
            None => property.initial_value(),
        }
    };

    let parent_font_size = parent.font_size();
    let font_size = match specified(Property::FontSize) {
        Value::Percentage(pct) => parent_font_size * pct / 100.0,
        Value::Length(length) => to_px(length, parent_font_size, viewport),
        _ => parent_font_size,
    };

    let mut values = BTreeMap::new();
    for property in Property::iter() {
        let value = match (property, specified(property)) {
            (Property::FontSize, _) => Value::px(font_size),
            // [§ 3.2 font-weight](https://www.w3.org/TR/css-fonts-4/#font-weight-prop)
            // "normal: Same as 400. bold: Same as 700."
            (Property::FontWeight, Value::Keyword(Keyword::Bold)) => Value::Number(700.0),
            (Property::FontWeight, Value::Keyword(_)) => Value::Number(400.0),
            // [§ 4.4 currentcolor](https://www.w3.org/TR/css-color-4/#currentcolor-color)
            // "If currentcolor is the specified value of the color property,
            // it is treated as if the specified value was inherit."
            (Property::Color, Value::Keyword(Keyword::CurrentColor)) => {
                Value::Color(parent.color())
            }
            (Property::LineHeight, Value::Percentage(pct)) => Value::px(font_size * pct / 100.0),
            (_, Value::Length(length)) => Value::px(to_px(length, font_size, viewport)),
            (_, value) => value,
        };
        let _ = values.insert(property, value);
    }
    ComputedStyle::from_values(values)
}

/// [§ 5.1.1 Font-relative lengths](https://www.w3.org/TR/css-values-4/#font-relative-lengths)
/// [§ 5.1.2 Viewport-percentage lengths](https://www.w3.org/TR/css-values-4/#viewport-relative-lengths)
fn to_px(length: Length, font_size: f32, viewport: Viewport) -> f32 {
    match length.unit {
        LengthUnit::Px => length.value,
        LengthUnit::Em => length.value * font_size,
        LengthUnit::Vw => length.value * viewport.width / 100.0,
        LengthUnit::Vh => length.value * viewport.height / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stylesheet::Declaration;
    use crate::values::Color;
    use std::sync::Arc;

    fn matched(origin: Origin, spec: Specificity, source_index: usize, block: DeclarationBlock) -> MatchedRule {
        MatchedRule {
            origin,
            specificity: spec,
            sheet_index: 0,
            source_index,
            declarations: Arc::new(block),
        }
    }

    fn winner(rules: &[MatchedRule], inline: Option<&DeclarationBlock>, p: Property) -> Option<Value> {
        cascade_declarations(rules, inline).get(&p).map(|(_, v)| (*v).clone())
    }

    #[test]
    fn test_later_source_index_wins_tie() {
        let rules = [
            matched(Origin::Author, Specificity(0, 1, 0), 0, DeclarationBlock::new().with(Declaration::new(Property::Color, Value::Color(Color::rgb(255, 0, 0))))),
            matched(Origin::Author, Specificity(0, 1, 0), 1, DeclarationBlock::new().with(Declaration::new(Property::Color, Value::Color(Color::rgb(0, 0, 255))))),
        ];
        assert_eq!(winner(&rules, None, Property::Color), Some(Value::Color(Color::rgb(0, 0, 255))));
        // Order of the match list does not matter.
        let reversed = [rules[1].clone(), rules[0].clone()];
        assert_eq!(winner(&reversed, None, Property::Color), Some(Value::Color(Color::rgb(0, 0, 255))));
    }

    #[test]
    fn test_unparsed_declaration_never_wins() {
        let rules = [
            matched(Origin::Author, Specificity(0, 0, 1), 0, DeclarationBlock::new().with(Declaration::new(Property::Width, Value::px(10.0)))),
            matched(Origin::Author, Specificity(1, 0, 0), 1, DeclarationBlock::new().with(Declaration::unparsed(Property::Width))),
        ];
        assert_eq!(winner(&rules, None, Property::Width), Some(Value::px(10.0)));
    }

    #[test]
    fn test_wrong_type_is_dropped() {
        let rules = [matched(
            Origin::Author,
            Specificity(0, 0, 1),
            0,
            DeclarationBlock::new()
                .with(Declaration::new(Property::Display, Value::px(3.0)))
                .with(Declaration::new(Property::PaddingLeft, Value::px(-2.0))),
        )];
        assert_eq!(winner(&rules, None, Property::Display), None);
        assert_eq!(winner(&rules, None, Property::PaddingLeft), None);
    }

    #[test]
    fn test_em_and_viewport_units_compute_to_px() {
        let rules = [matched(
            Origin::Author,
            Specificity(0, 0, 1),
            0,
            DeclarationBlock::new()
                .with(Declaration::new(Property::FontSize, Value::em(2.0)))
                .with(Declaration::new(Property::MarginLeft, Value::em(1.0)))
                .with(Declaration::new(
                    Property::Width,
                    Value::Length(Length { value: 50.0, unit: LengthUnit::Vw }),
                ))
                .with(Declaration::new(Property::LineHeight, Value::Percentage(150.0))),
        )];
        let winners = cascade_declarations(&rules, None);
        let style = compute_style(&winners, &ComputedStyle::initial(), Viewport::new(800.0, 600.0));
        assert_eq!(style.font_size(), 32.0);
        assert_eq!(style.get(Property::MarginLeft), &Value::px(32.0));
        assert_eq!(style.get(Property::Width), &Value::px(400.0));
        assert_eq!(style.get(Property::LineHeight), &Value::px(48.0));
    }

    #[test]
    fn test_inherit_and_initial_keywords() {
        let parent = compute_style(
            &cascade_declarations(
                &[matched(
                    Origin::Author,
                    Specificity(0, 0, 1),
                    0,
                    DeclarationBlock::new()
                        .with(Declaration::new(Property::Color, Value::Color(Color::rgb(1, 2, 3))))
                        .with(Declaration::new(Property::Width, Value::px(120.0))),
                )],
                None,
            ),
            &ComputedStyle::initial(),
            Viewport::default(),
        );
        let rules = [matched(
            Origin::Author,
            Specificity(0, 0, 1),
            0,
            DeclarationBlock::new()
                .with(Declaration::new(Property::Width, Value::Inherit))
                .with(Declaration::new(Property::Color, Value::Initial)),
        )];
        let child = compute_style(&cascade_declarations(&rules, None), &parent, Viewport::default());
        assert_eq!(child.get(Property::Width), &Value::px(120.0));
        assert_eq!(child.color(), Color::BLACK);
    }
}
