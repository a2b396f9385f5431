use super::parse_code;
use crate::many::{Element, MetaKind, Scalar};
use crate::reflect::{DefaultRegistry, Reflection};

#[test]
fn arithmetic_precedence_builds_add_over_multiply() {
    let registry = DefaultRegistry::new();
    let (many, warning) = parse_code("2*8.75+14^2", &registry, false).unwrap();
    assert!(warning.is_none());
    assert_eq!(many.len(), 1);
    match many.get(0) {
        Some(Element::Verb(v)) => {
            assert_eq!(v.verb_meta, registry.get_meta_verb("Add").unwrap());
            match v.source.get(0) {
                Some(Element::Verb(inner)) => assert_eq!(inner.verb_meta, registry.get_meta_verb("Multiply").unwrap()),
                other => panic!("expected Multiply on the lhs, got {:?}", other),
            }
            match v.argument.get(0) {
                Some(Element::Verb(inner)) => assert_eq!(inner.verb_meta, registry.get_meta_verb("Exponent").unwrap()),
                other => panic!("expected Exponent on the rhs, got {:?}", other),
            }
        }
        other => panic!("expected a top-level Add verb, got {:?}", other),
    }
}

#[test]
fn minus_sets_mass_to_negative_one() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code("5-2", &registry, false).unwrap();
    match many.get(0) {
        Some(Element::Verb(v)) => {
            assert_eq!(v.verb_meta, registry.get_meta_verb("Add").unwrap());
            assert_eq!(v.charge.mass, -1.0);
        }
        other => panic!("expected an Add verb with mass -1, got {:?}", other),
    }
}

#[test]
fn parenthesised_content_becomes_a_construct_descriptor() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code("Thing(1, 2)", &registry, false).unwrap();
    match many.get(0) {
        Some(Element::Construct(c)) => {
            assert_eq!(c.type_meta, registry.get_meta_data("Thing").unwrap());
            assert_eq!(c.descriptor.len(), 2);
        }
        other => panic!("expected a Thing construct, got {:?}", other),
    }
}

#[test]
fn trait_keyword_with_scope_builds_a_trait() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code(r#"Name("Alice")"#, &registry, false).unwrap();
    match many.get(0) {
        Some(Element::Trait(t)) => {
            assert_eq!(t.trait_meta, registry.get_meta_trait("Name").unwrap());
            assert_eq!(t.content.len(), 1);
        }
        other => panic!("expected a Name trait, got {:?}", other),
    }
}

#[test]
fn standalone_past_and_future_markers_are_independent_placeholders() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code("?, ??", &registry, false).unwrap();
    assert_eq!(many.len(), 2);
    assert!(matches!(many.get(0), Some(Element::PastPlaceholder(_))));
    assert!(matches!(many.get(1), Some(Element::FuturePlaceholder(_))));
}

#[test]
fn const_keyword_marks_the_whole_parsed_sequence_constant() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code("const 1, 2", &registry, false).unwrap();
    assert!(many.is_constant());
}

#[test]
fn same_precedence_comparison_operators_chain_left_associatively() {
    let registry = DefaultRegistry::new();
    let (many, warning) = parse_code("1=2=3", &registry, false).unwrap();
    assert!(warning.is_none());
    match many.get(0) {
        Some(Element::Verb(outer)) => {
            assert_eq!(outer.verb_meta, registry.get_meta_verb("Equal").unwrap());
            assert_eq!(outer.argument.get(0), Some(&Element::Scalar(Scalar::Real(3.0))));
            match outer.source.get(0) {
                Some(Element::Verb(inner)) => assert_eq!(inner.verb_meta, registry.get_meta_verb("Equal").unwrap()),
                other => panic!("expected a nested Equal on the lhs, got {:?}", other),
            }
        }
        other => panic!("expected a left-associative Equal chain, got {:?}", other),
    }
}

#[test]
fn unmatched_closing_paren_is_a_parse_error() {
    let registry = DefaultRegistry::new();
    assert!(parse_code("1)", &registry, false).is_err());
}

#[test]
fn string_literal_applies_escapes() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code(r#""a\nb""#, &registry, false).unwrap();
    match many.get(0) {
        Some(Element::Scalar(Scalar::Text(t))) => assert_eq!(&**t, "a\nb"),
        other => panic!("expected an escaped text scalar, got {:?}", other),
    }
}

#[test]
fn generic_verb_call_with_verb_base_keyword_is_positional() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code("Verb(?, ??)", &registry, false).unwrap();
    match many.get(0) {
        Some(Element::Verb(v)) => {
            assert!(matches!(v.source.get(0), Some(Element::PastPlaceholder(_))));
            assert!(matches!(v.argument.get(0), Some(Element::FuturePlaceholder(_))));
        }
        other => panic!("expected a positional Verb(source, argument), got {:?}", other),
    }
}

#[test]
fn leading_unary_minus_wraps_the_parenthesised_term() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code("-(2*8.75-14^2)", &registry, false).unwrap();
    assert_eq!(many.len(), 1);
    match many.get(0) {
        Some(Element::Verb(v)) => {
            assert_eq!(v.verb_meta, registry.get_meta_verb("Add").unwrap());
            assert_eq!(v.charge.mass, -1.0);
            assert!(v.source.is_empty());
            assert_eq!(v.argument.len(), 1);
        }
        other => panic!("expected a mass-negated Add wrapping the parenthesised term, got {:?}", other),
    }
}

#[test]
fn lowercase_word_operator_builds_an_infix_verb() {
    let registry = DefaultRegistry::new();
    let (many, warning) = parse_code("`plural` associate index::many", &registry, false).unwrap();
    assert!(warning.is_none());
    match many.get(0) {
        Some(Element::Verb(v)) => {
            assert_eq!(v.verb_meta, registry.get_meta_verb("Associate").unwrap());
            assert_eq!(v.source.get(0), Some(&Element::Scalar(Scalar::Text(std::rc::Rc::from("plural")))));
            let index_many = registry.get_meta_constant("index::many").unwrap();
            assert_eq!(v.argument.get(0), Some(&Element::Scalar(Scalar::Meta(index_many))));
        }
        other => panic!("expected an Associate verb, got {:?}", other),
    }
}

#[test]
fn word_operator_does_not_engage_without_a_preceding_lhs() {
    let registry = DefaultRegistry::new();
    let (many, _) = parse_code("Create!-1(Thing)", &registry, false).unwrap();
    match many.get(0) {
        Some(Element::Verb(v)) => assert_eq!(v.verb_meta, registry.get_meta_verb("Create").unwrap()),
        other => panic!("expected the capitalised Create keyword path, got {:?}", other),
    }
}

#[test]
fn unknown_meta_kind_still_resolves_constant_token() {
    let registry = DefaultRegistry::new();
    let meta = registry.get_meta_constant("index::many").unwrap();
    assert_eq!(meta.kind, MetaKind::Constant);
    let (many, _) = parse_code("index::many", &registry, false).unwrap();
    assert_eq!(many.get(0), Some(&Element::Scalar(Scalar::Meta(meta))));
}
