//! Built-in operator sub-parsers (spec §4.3.3): scopes, past/future
//! markers, and reflected-operator verb construction. Charge parsing lives
//! in `charge_parse.rs`. Grounded on `original_source/Code.cpp`/`GASM.cpp`.

use super::Parser;
use crate::construct::Construct;
use crate::error::ParseError;
use crate::flow_trait::Trait;
use crate::many::{Element, Many, ManyState, Meta, MetaKind, Scalar};
use crate::verb::Verb;

/// Spec §4.3.3 Charge sub-parser precondition: the charge sub-parser only
/// engages right after a term that can carry a charge — a data-type meta,
/// a `Construct` instance, or a `Verb` instance (SPEC_FULL.md Open
/// Question (a) resolution).
pub(super) fn can_carry_charge(many: &Many) -> bool {
    match many.elements().last() {
        Some(Element::Scalar(Scalar::Meta(m))) => matches!(m.kind, MetaKind::Data | MetaKind::Verb),
        Some(Element::Verb(_)) | Some(Element::Construct(_)) => true,
        _ => false,
    }
}

/// `?` with no lhs becomes a fresh, unfiltered past-missing placeholder
/// (spec scenario 2). `?` right after a data-type meta filters the
/// placeholder by that type, mirroring the future-marker rule below.
pub(super) fn apply_past(many: &mut Many) {
    match many.pop() {
        Some(Element::Scalar(Scalar::Meta(m))) if m.kind == MetaKind::Data => {
            many.push(Element::PastPlaceholder(vec![m]));
        }
        Some(other) => {
            many.push(other);
            many.push(Element::PastPlaceholder(Vec::new()));
        }
        None => {
            many.push(Element::PastPlaceholder(Vec::new()));
        }
    }
}

/// `??` with no lhs becomes a fresh, unfiltered future-missing placeholder
/// (spec scenario 2). `A::Text??` filters the placeholder by `A::Text`
/// (spec scenario 4).
pub(super) fn apply_future(many: &mut Many) {
    match many.pop() {
        Some(Element::Scalar(Scalar::Meta(m))) if m.kind == MetaKind::Data => {
            many.push(Element::FuturePlaceholder(vec![m]));
        }
        Some(other) => {
            many.push(other);
            many.push(Element::FuturePlaceholder(Vec::new()));
        }
        None => {
            many.push(Element::FuturePlaceholder(Vec::new()));
        }
    }
}

/// Resolves a `Keyword` token against the reflection registry (spec
/// §4.3.2 step 3) and pushes the resolved meta as a pending element.
pub(super) fn parse_keyword(parser: &mut Parser, many: &mut Many) -> Result<(), ParseError> {
    let token = match parser.peek() {
        crate::token::TokenKind::Keyword(s) => s.clone(),
        _ => unreachable!("parse_keyword called without a Keyword lookahead"),
    };
    parser.bump();
    match parser.registry().disambiguate_meta(&token) {
        Some(meta) => {
            many.push(Element::Scalar(Scalar::Meta(meta)));
            Ok(())
        }
        None => Err(parser.error(format!("unresolved token '{}'", token))),
    }
}

/// `(` *expr* `)` — parses the body at the lowest precedence, then
/// inserts it into `many` per the insertion-rule table (spec §4.3.3).
pub(super) fn parse_scope(parser: &mut Parser, many: &mut Many) -> Result<(), ParseError> {
    parser.bump(); // consume '('
    let content = parser.parse_sequence(0, true)?;
    match parser.peek() {
        crate::token::TokenKind::RParen => {
            parser.bump();
        }
        _ => return Err(parser.error("expected ')'")),
    }
    insert_content(parser, many, content)
}

fn insert_content(parser: &mut Parser, many: &mut Many, content: Many) -> Result<(), ParseError> {
    if many.is_empty() {
        // Preserve the outer container's flag bits (or/past/future/const)
        // but never its EMPTY bit — the content we're splicing in is, by
        // construction, non-empty.
        let outer_state = many.state().without(ManyState::EMPTY);
        *many = content;
        many.or_state(outer_state);
        return Ok(());
    }

    let last = many.pop().expect("checked non-empty above");
    match last {
        Element::Scalar(Scalar::Meta(meta)) => match meta.kind {
            MetaKind::Data => {
                if parser.registry().is_verb_base(meta) {
                    many.push(Element::Verb(Box::new(verb_from_positional_content(meta, content))));
                } else {
                    many.push(Element::Construct(Box::new(construct_from_content(parser, meta, content))));
                }
                Ok(())
            }
            MetaKind::Trait => {
                many.push(Element::Trait(Box::new(Trait::new(meta, content))));
                Ok(())
            }
            MetaKind::Verb => {
                many.push(Element::Verb(Box::new(Verb::new(meta).with_argument(content))));
                Ok(())
            }
            MetaKind::Constant | MetaKind::Operator => {
                many.push(Element::Scalar(Scalar::Meta(meta)));
                Err(parser.error("a scope cannot attach to a constant or operator token"))
            }
        },
        Element::Verb(mut v) => {
            v.argument = v.argument.catenate(&content);
            many.push(Element::Verb(v));
            Ok(())
        }
        Element::Construct(mut c) => {
            c.descriptor = c.descriptor.catenate(&content);
            many.push(Element::Construct(c));
            Ok(())
        }
        other => {
            many.push(other);
            Err(parser.error("a scope has no attachable left-hand side here"))
        }
    }
}

/// Generic `Verb(...)` syntax (the keyword resolved to the verb base type
/// itself, spec §4.3.3 "or, if the type is the verb base, `Verb(content)`"):
/// the first top-level element of the parenthesised content is the verb's
/// source, the second its argument — the shape spec scenario 2's
/// `Verb(?, ??)` exercises.
fn verb_from_positional_content(verb_base: Meta, content: Many) -> Verb {
    let mut elements = content.elements().iter().cloned();
    let source = elements.next().map(Many::from_element).unwrap_or_else(Many::empty);
    let argument = elements.next().map(Many::from_element).unwrap_or_else(Many::empty);
    Verb::new(verb_base).with_source(source).with_argument(argument)
}

fn construct_from_content(parser: &mut Parser, type_meta: Meta, content: Many) -> Construct {
    let construct = Construct::new(type_meta);
    if content.is_empty() {
        if let Some(ctor) = parser.registry().default_constructor(type_meta) {
            if construct.is_statically_creatable(parser.registry()) {
                return construct.with_descriptor(Many::from_meta(ctor));
            }
        }
    }
    construct.with_descriptor(content)
}

/// Reflected operator / reflected verb sub-parser (spec §4.3.3): combines
/// the whole of `many` accumulated so far as `source`, with `rhs` as
/// `argument`. If `is_reverse`, mass is set to -1 (the `-`/`+` pair).
pub(super) fn apply_binary_operator(many: &mut Many, verb_meta: Meta, rhs: Many, is_reverse: bool) {
    let source = std::mem::replace(many, Many::empty());
    let mut verb = Verb::new(verb_meta).with_source(source).with_argument(rhs);
    if is_reverse {
        verb = verb.mass(-1.0);
    }
    many.push(Element::Verb(Box::new(verb)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::DefaultRegistry;

    #[test]
    fn standalone_past_marker_with_no_lhs_is_empty_filter() {
        let mut many = Many::empty();
        apply_past(&mut many);
        assert_eq!(many.get(0), Some(&Element::PastPlaceholder(Vec::new())));
    }

    #[test]
    fn future_marker_after_data_meta_filters_by_that_type() {
        let registry = DefaultRegistry::new();
        let meta = registry.get_meta_data("A::Text").unwrap();
        let mut many = Many::empty();
        many.push(Element::Scalar(Scalar::Meta(meta)));
        apply_future(&mut many);
        assert_eq!(many.len(), 1);
        assert_eq!(many.get(0), Some(&Element::FuturePlaceholder(vec![meta])));
    }

    #[test]
    fn can_carry_charge_true_for_data_meta_verb_and_construct() {
        let registry = DefaultRegistry::new();
        let meta = registry.get_meta_data("Thing").unwrap();
        let mut many = Many::empty();
        many.push(Element::Scalar(Scalar::Meta(meta)));
        assert!(can_carry_charge(&many));

        let mut many2 = Many::empty();
        many2.push(Element::Scalar(Scalar::Real(2.0)));
        assert!(!can_carry_charge(&many2));
    }
}
