//! Charge sub-parser (spec §4.3.3 "Charge"): a run of `Mass`/`Rate`/`Time`/
//! `Priority` suffixes, each followed by a signed numeric value, applied to
//! the chargeable term already on top of `many`. Only entered when
//! `operators::can_carry_charge` already holds (SPEC_FULL.md Open Question
//! (a)). Grounded on `original_source/Code.cpp`'s charge-suffix handling.

use super::Parser;
use crate::charge::Charge;
use crate::construct::Construct;
use crate::error::ParseError;
use crate::many::{Element, Many, MetaKind, Scalar};
use crate::token::TokenKind;
use crate::verb::Verb;

pub(super) fn parse_charge(parser: &mut Parser, many: &mut Many) -> Result<(), ParseError> {
    let mut charge = Charge::default();
    let mut touched = false;
    loop {
        let setter: fn(Charge, f64) -> Charge = match parser.peek() {
            TokenKind::Mass => |c, v| c.with_mass(v),
            TokenKind::Rate => |c, v| c.with_rate(v),
            TokenKind::Time => |c, v| c.with_time(v),
            TokenKind::Priority => |c, v| c.with_priority(v),
            _ => break,
        };
        parser.bump();
        let value = parse_charge_value(parser)?;
        charge = setter(charge, value);
        touched = true;
    }
    if !touched {
        return Ok(());
    }
    apply_charge(many, charge);
    Ok(())
}

/// A charge value is an optionally-negated number; the `-` here is the
/// literal's own sign and never reaches the main loop as a reverse
/// operator token.
fn parse_charge_value(parser: &mut Parser) -> Result<f64, ParseError> {
    let negative = matches!(parser.peek(), TokenKind::Operator(op) if op == "-");
    if negative {
        parser.bump();
    }
    match parser.peek() {
        TokenKind::Number(n) => {
            let n = *n;
            parser.bump();
            Ok(if negative { -n } else { n })
        }
        _ => Err(parser.error("expected a numeric charge value")),
    }
}

fn apply_charge(many: &mut Many, charge: Charge) {
    match many.pop() {
        Some(Element::Verb(mut v)) => {
            v.charge = combine(v.charge, charge);
            many.push(Element::Verb(v));
        }
        Some(Element::Construct(mut c)) => {
            c.charge = combine(c.charge, charge);
            many.push(Element::Construct(c));
        }
        Some(Element::Scalar(Scalar::Meta(m))) if m.kind == MetaKind::Data => {
            let construct = Construct::new(m).with_charge(charge);
            many.push(Element::Construct(Box::new(construct)));
        }
        // A bare verb token (e.g. `Create!-1`) gets its own `Verb` instance
        // up front; its source/argument are filled in later if a `(...)`
        // follows, via the paren-scope insertion rule's `Element::Verb` arm.
        Some(Element::Scalar(Scalar::Meta(m))) if m.kind == MetaKind::Verb => {
            let verb = Verb::new(m).with_charge(charge);
            many.push(Element::Verb(Box::new(verb)));
        }
        Some(other) => many.push(other),
        None => {}
    }
}

/// Composes a fresh charge suffix onto an existing one, field by field —
/// `*2^3` after an already-charged term sets mass and rate, leaving time
/// and priority untouched.
fn combine(base: Charge, update: Charge) -> Charge {
    let default = Charge::default();
    Charge::new(
        if update.mass != default.mass { update.mass } else { base.mass },
        if update.rate != default.rate { update.rate } else { base.rate },
        if update.time != default.time { update.time } else { base.time },
        if update.priority != default.priority { update.priority } else { base.priority },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::DefaultRegistry;

    #[test]
    fn bare_data_meta_is_promoted_to_a_charged_construct() {
        let registry = DefaultRegistry::new();
        let source = "Thing*5";
        let (result, _) = crate::parser::parse_code(source, &registry, false).unwrap();
        match result.get(0) {
            Some(Element::Construct(c)) => assert_eq!(c.charge.mass, 5.0),
            other => panic!("expected a charged construct, got {:?}", other),
        }
    }

    #[test]
    fn multiple_charge_suffixes_compose() {
        let registry = DefaultRegistry::new();
        let source = "Thing*2^3";
        let (result, _) = crate::parser::parse_code(source, &registry, false).unwrap();
        match result.get(0) {
            Some(Element::Construct(c)) => {
                assert_eq!(c.charge.mass, 2.0);
                assert_eq!(c.charge.rate, 3.0);
            }
            other => panic!("expected a charged construct, got {:?}", other),
        }
    }

    #[test]
    fn bare_verb_token_charge_survives_into_its_eventual_call() {
        let registry = DefaultRegistry::new();
        let source = "Create!-1(Thing)";
        let (result, _) = crate::parser::parse_code(source, &registry, false).unwrap();
        match result.get(0) {
            Some(Element::Verb(v)) => {
                assert_eq!(v.charge.priority, -1.0);
                assert_eq!(v.argument.len(), 1);
            }
            other => panic!("expected a charged verb, got {:?}", other),
        }
    }
}
