//! Default abilities (spec §4.4.4): the built-in behaviors a verb falls
//! back to once Phase 1 (custom) and Phase 2 (reflected) dispatch both
//! declined. `DefaultRegistry` never implements a custom/reflected ability
//! of its own (`reflect.rs`'s `dispatch_custom`/`dispatch_reflected` always
//! return `None`), so every verb executed against it bottoms out here.
//!
//! Grounded on the per-verb files under `original_source/verbs/` and
//! `original_source/source/verbs/` (`Do.hpp`, `Associate.cpp`,
//! `Create.cpp`, `Interpret.cpp`, `Select.cpp`, `Conjunct.cpp`) — translated
//! from per-type C++ overloads into one Rust match over the verb token,
//! operating on this crate's own `Many`/`Scalar` representation rather than
//! a reflected type catalogue.

use crate::construct::Construct;
use crate::error::FlowError;
use crate::many::{Element, Many, MetaKind, Scalar};
use crate::reflect::Reflection;
use crate::verb::Verb;

/// Phase 3 dispatch: tries the built-in ability matching `verb.verb_meta`.
/// Returns `false` (verb stays not-done) if no default exists for this verb
/// or its operands didn't fit the ability's shape.
pub fn dispatch_default(context: &Many, verb: &mut Verb, registry: &dyn Reflection) -> Result<bool, FlowError> {
    let name = registry.resolve(verb.verb_meta.token);
    let ok = match name.as_str() {
        "Do" | "Undo" => default_do(context, verb),
        "Interpret" => default_interpret(verb, registry),
        "Associate" => default_associate(verb)?,
        "Disassociate" => default_disassociate(verb),
        "Select" => default_select(verb, registry),
        "Deselect" => default_deselect(verb, registry),
        "Create" => default_create(verb, registry),
        "Destroy" => default_destroy(verb),
        "Catenate" => default_catenate(verb),
        "Split" => default_split(verb),
        "Conjunct" => default_conjunct(verb),
        "Disjunct" => default_disjunct(verb),
        "Add" => default_add(verb),
        "Multiply" => default_arithmetic(verb, |s, a, _| s * a),
        "Divide" => default_arithmetic(verb, |s, a, _| s / a),
        "Modulate" => default_arithmetic(verb, |s, a, _| s % a),
        "Exponent" => default_arithmetic(verb, |s, a, _| s.powf(a)),
        "Root" => default_arithmetic(verb, |s, a, _| s.powf(1.0 / a)),
        "Equal" => default_comparison(verb, |s, a| s == a),
        "Lower" => default_comparison(verb, |s, a| s < a),
        "Greater" => default_comparison(verb, |s, a| s > a),
        "LowerOrEqual" => default_comparison(verb, |s, a| s <= a),
        "Compare" => default_compare(verb),
        _ => false,
    };
    Ok(ok)
}

fn default_do(context: &Many, verb: &mut Verb) -> bool {
    verb.output = context.clone();
    true
}

fn first_real(many: &Many) -> Option<f64> {
    many.elements().iter().find_map(|e| match e {
        Element::Scalar(s) => s.as_real(),
        _ => None,
    })
}

fn first_text(many: &Many) -> Option<std::rc::Rc<str>> {
    many.elements().iter().find_map(|e| match e {
        Element::Scalar(Scalar::Text(t)) => Some(t.clone()),
        _ => None,
    })
}

/// `source*argument`, `source/argument`, and so on (spec §4.4.4 arithmetic
/// defaults). Fails if either side has no numeric scalar.
fn default_arithmetic(verb: &mut Verb, op: impl Fn(f64, f64, f64) -> f64) -> bool {
    let (Some(s), Some(a)) = (first_real(&verb.source), first_real(&verb.argument)) else {
        return false;
    };
    verb.output = Many::from_scalar(Scalar::Real(op(s, a, verb.charge.mass)));
    true
}

/// `source + mass*argument`, with an empty source treated as the additive
/// identity: the parser wraps a leading unary minus as an `Add` with no
/// source and `mass == -1.0` (spec scenario 3 `-(...)`), which otherwise
/// has no numeric source scalar to find.
fn default_add(verb: &mut Verb) -> bool {
    let Some(a) = first_real(&verb.argument) else {
        return false;
    };
    let s = first_real(&verb.source).unwrap_or(0.0);
    verb.output = Many::from_scalar(Scalar::Real(s + verb.charge.mass * a));
    true
}

fn default_comparison(verb: &mut Verb, op: impl Fn(f64, f64) -> bool) -> bool {
    let (Some(s), Some(a)) = (first_real(&verb.source), first_real(&verb.argument)) else {
        return false;
    };
    verb.output = Many::from_scalar(Scalar::Bool(op(s, a)));
    true
}

fn default_compare(verb: &mut Verb) -> bool {
    let (Some(s), Some(a)) = (first_real(&verb.source), first_real(&verb.argument)) else {
        return false;
    };
    let ordering = if s < a {
        -1.0
    } else if s > a {
        1.0
    } else {
        0.0
    };
    verb.output = Many::from_scalar(Scalar::Real(ordering));
    true
}

/// Converts a scalar between text and numeric form (spec §4.4.4
/// `Interpret`), the only conversion this crate's default registry needs
/// (spec §8 scenarios use `A::Text` as an `Interpret` target).
fn default_interpret(verb: &mut Verb, registry: &dyn Reflection) -> bool {
    let wants_text = verb
        .argument
        .elements()
        .iter()
        .any(|e| matches!(e, Element::Scalar(Scalar::Meta(m)) if m.kind == MetaKind::Data && registry.casts_to(*m, registry.get_meta_data("Text").unwrap_or(*m))));

    if wants_text {
        if let Some(n) = first_real(&verb.source) {
            verb.output = Many::from_scalar(Scalar::Text(std::rc::Rc::from(n.to_string().as_str())));
            return true;
        }
    } else if let Some(t) = first_text(&verb.source) {
        if let Ok(n) = t.parse::<f64>() {
            verb.output = Many::from_scalar(Scalar::Real(n));
            return true;
        }
    }
    false
}

/// Merges argument's elements into source (spec §4.4.4 `Associate`):
/// structural copy, failing with `FlowError::BadCopy` on a constant target.
fn default_associate(verb: &mut Verb) -> Result<bool, FlowError> {
    let mut merged = verb.source.clone();
    match verb.argument.copy_to(&mut merged) {
        Ok(_) => {
            verb.output = merged;
            Ok(true)
        }
        Err(()) => Err(FlowError::BadCopy),
    }
}

/// Removes any of source's elements that equal one of argument's.
fn default_disassociate(verb: &mut Verb) -> bool {
    let mut kept = Many::empty();
    for element in verb.source.elements() {
        if !verb.argument.elements().contains(element) {
            kept.push(element.clone());
        }
    }
    verb.output = kept;
    true
}

/// Keeps only source elements whose meta casts to one of argument's meta
/// filters (spec §4.4.4 `Select`).
fn default_select(verb: &mut Verb, registry: &dyn Reflection) -> bool {
    let filter = meta_filter(&verb.argument);
    verb.output = verb.source.gather_scalars(|s| matches!(s, Scalar::Meta(m) if filter.iter().any(|f| *m == *f || registry.casts_to(*m, *f))));
    true
}

fn default_deselect(verb: &mut Verb, registry: &dyn Reflection) -> bool {
    let filter = meta_filter(&verb.argument);
    verb.output = verb.source.gather_scalars(|s| match s {
        Scalar::Meta(m) => !filter.iter().any(|f| *m == *f || registry.casts_to(*m, *f)),
        _ => true,
    });
    true
}

fn meta_filter(many: &Many) -> Vec<crate::many::Meta> {
    many.elements()
        .iter()
        .filter_map(|e| match e {
            Element::Scalar(Scalar::Meta(m)) => Some(*m),
            Element::Construct(c) => Some(c.type_meta),
            _ => None,
        })
        .collect()
}

/// Resolves a construct descriptor into its created form (spec §4.4.4
/// `Create`). This crate is a symbolic runtime with no concrete instance
/// representation beyond `Construct` itself, so "creating" means merging
/// whichever side (source or argument) doesn't carry the type indicator
/// into the construct's descriptor and outputting the resolved construct —
/// the same shape the parser already produces for `Thing(...)`. Either side
/// may carry the type: a plain `Create(Thing(...))` call puts the parsed
/// construct in `argument` (`insert_content`'s verb-meta branch leaves
/// `source` empty), while a hand-built verb may put it in `source` instead.
fn default_create(verb: &mut Verb, registry: &dyn Reflection) -> bool {
    let (type_meta, base_descriptor, extra) = if let Some(c) = find_construct(&verb.source) {
        (c.type_meta, c.descriptor, verb.argument.clone())
    } else if let Some(c) = find_construct(&verb.argument) {
        (c.type_meta, c.descriptor, verb.source.clone())
    } else if let Some(m) = find_data_meta(&verb.source) {
        (m, Many::empty(), verb.argument.clone())
    } else if let Some(m) = find_data_meta(&verb.argument) {
        (m, Many::empty(), verb.source.clone())
    } else {
        return false;
    };
    if registry.is_abstract(type_meta) {
        return false;
    }
    let descriptor = base_descriptor.catenate(&extra);
    let construct = Construct::new(type_meta).with_descriptor(descriptor).with_charge(verb.charge);
    verb.output = Many::from_element(Element::Construct(Box::new(construct)));
    true
}

fn find_construct(many: &Many) -> Option<Construct> {
    many.elements().iter().find_map(|e| match e {
        Element::Construct(c) => Some((**c).clone()),
        _ => None,
    })
}

fn find_data_meta(many: &Many) -> Option<crate::many::Meta> {
    many.elements().iter().find_map(|e| match e {
        Element::Scalar(Scalar::Meta(m)) if m.kind == MetaKind::Data => Some(*m),
        _ => None,
    })
}

fn default_destroy(verb: &mut Verb) -> bool {
    verb.output = Many::empty();
    true
}

fn default_catenate(verb: &mut Verb) -> bool {
    verb.output = verb.source.catenate(&verb.argument);
    true
}

/// Splits source at the index named by argument's first numeric scalar
/// (or the midpoint if none given), keeping the first half.
fn default_split(verb: &mut Verb) -> bool {
    let at = first_real(&verb.argument).map(|n| n as usize).unwrap_or(verb.source.len() / 2).min(verb.source.len());
    let mut kept = Many::empty();
    for element in verb.source.elements().iter().take(at) {
        kept.push(element.clone());
    }
    verb.output = kept;
    true
}

fn default_conjunct(verb: &mut Verb) -> bool {
    verb.output = verb.source.catenate(&verb.argument).make_and();
    true
}

fn default_disjunct(verb: &mut Verb) -> bool {
    verb.output = verb.source.catenate(&verb.argument).make_or();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::DefaultRegistry;

    fn verb(registry: &DefaultRegistry, token: &str, source: Many, argument: Many) -> Verb {
        Verb::new(registry.get_meta_verb(token).unwrap()).with_source(source).with_argument(argument)
    }

    #[test]
    fn add_applies_mass_as_argument_sign() {
        let registry = DefaultRegistry::new();
        let mut v = verb(&registry, "Add", Many::from_scalar(Scalar::Real(5.0)), Many::from_scalar(Scalar::Real(2.0)));
        v.charge.mass = -1.0;
        assert!(dispatch_default(&Many::empty(), &mut v, &registry).unwrap());
        assert_eq!(v.output.get(0), Some(&Element::Scalar(Scalar::Real(3.0))));
    }

    #[test]
    fn multiply_ignores_mass() {
        let registry = DefaultRegistry::new();
        let mut v = verb(&registry, "Multiply", Many::from_scalar(Scalar::Real(6.0)), Many::from_scalar(Scalar::Real(7.0)));
        assert!(dispatch_default(&Many::empty(), &mut v, &registry).unwrap());
        assert_eq!(v.output.get(0), Some(&Element::Scalar(Scalar::Real(42.0))));
    }

    #[test]
    fn equal_compares_numerically() {
        let registry = DefaultRegistry::new();
        let mut v = verb(&registry, "Equal", Many::from_scalar(Scalar::Real(3.0)), Many::from_scalar(Scalar::Real(3.0)));
        assert!(dispatch_default(&Many::empty(), &mut v, &registry).unwrap());
        assert_eq!(v.output.get(0), Some(&Element::Scalar(Scalar::Bool(true))));
    }

    #[test]
    fn interpret_number_to_text() {
        let registry = DefaultRegistry::new();
        let text_meta = registry.get_meta_data("Text").unwrap();
        let mut v = verb(
            &registry,
            "Interpret",
            Many::from_scalar(Scalar::Real(42.0)),
            Many::from_scalar(Scalar::Meta(text_meta)),
        );
        assert!(dispatch_default(&Many::empty(), &mut v, &registry).unwrap());
        assert_eq!(v.output.get(0), Some(&Element::Scalar(Scalar::Text(std::rc::Rc::from("42")))));
    }

    #[test]
    fn associate_merges_argument_into_source() {
        let registry = DefaultRegistry::new();
        let mut v = verb(&registry, "Associate", Many::from_scalar(Scalar::Real(1.0)), Many::from_scalar(Scalar::Real(2.0)));
        assert!(dispatch_default(&Many::empty(), &mut v, &registry).unwrap());
        assert_eq!(v.output.len(), 2);
    }

    #[test]
    fn create_resolves_a_non_abstract_construct() {
        let registry = DefaultRegistry::new();
        let thing_meta = registry.get_meta_data("Thing").unwrap();
        let mut source = Many::empty();
        source.push(Element::Construct(Box::new(Construct::new(thing_meta))));
        let mut v = verb(&registry, "Create", source, Many::empty());
        assert!(dispatch_default(&Many::empty(), &mut v, &registry).unwrap());
        assert!(matches!(v.output.get(0), Some(Element::Construct(_))));
    }

    #[test]
    fn create_resolves_a_construct_carried_in_the_argument() {
        // the shape `insert_content`'s verb-meta branch actually produces
        // for a plain `Create(Thing(User))` call: source stays empty, the
        // parsed construct lands in argument.
        let registry = DefaultRegistry::new();
        let thing_meta = registry.get_meta_data("Thing").unwrap();
        let user_meta = registry.get_meta_data("User").unwrap();
        let mut argument = Many::empty();
        let mut descriptor = Many::empty();
        descriptor.push_scalar(Scalar::Meta(user_meta));
        argument.push(Element::Construct(Box::new(Construct::new(thing_meta).with_descriptor(descriptor))));
        let mut v = verb(&registry, "Create", Many::empty(), argument);
        assert!(dispatch_default(&Many::empty(), &mut v, &registry).unwrap());
        match v.output.get(0) {
            Some(Element::Construct(c)) => {
                assert_eq!(c.type_meta, thing_meta);
                assert_eq!(c.descriptor.get(0), Some(&Element::Scalar(Scalar::Meta(user_meta))));
            }
            other => panic!("expected a resolved Thing construct, got {:?}", other),
        }
    }

    #[test]
    fn create_refuses_an_abstract_type() {
        let registry = DefaultRegistry::new();
        let number_meta = registry.get_meta_data("Number").unwrap();
        let mut source = Many::empty();
        source.push_scalar(Scalar::Meta(number_meta));
        let mut v = verb(&registry, "Create", source, Many::empty());
        assert!(!dispatch_default(&Many::empty(), &mut v, &registry).unwrap());
    }
}
