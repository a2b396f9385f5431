//! Pretty-printing a `Temporal` for inspection (spec §4.5.3 `dump()`).
//!
//! Grounded on `original_source/source/Temporal-Logging.cpp`'s
//! `Dump`/`DumpInner`/`DumpSeparator`/`DumpVerb`/`DumpConstruct`/
//! `DumpMissing`, reduced from the original's colorized `Logger` output to
//! plain text (this crate's dependency stack carries no terminal-color
//! crate) joined with `, `/` or ` the way the original's separator rule
//! does.

use crate::many::{Element, Many, MetaKind, Scalar};
use crate::missing::{MissingId, MissingKind};
use crate::reflect::Reflection;
use crate::temporal::Temporal;
use std::fmt::Write as _;

pub fn dump_temporal(flow: &Temporal, registry: &dyn Reflection) -> String {
    let mut out = String::new();
    dump_into(&mut out, flow, registry, 0);
    out
}

fn dump_into(out: &mut String, flow: &Temporal, registry: &dyn Reflection, depth: usize) {
    let pad = "  ".repeat(depth);
    if !flow.priority_stack.is_empty() {
        let _ = writeln!(out, "{pad}{}", dump_many(&flow.priority_stack, flow, registry));
    }
    for (at, child) in &flow.time_stack {
        let _ = writeln!(out, "{pad}at time {at}:");
        dump_into(out, child, registry, depth + 1);
    }
    for (period, child) in &flow.frequency_stack {
        let _ = writeln!(out, "{pad}at rate {period}:");
        dump_into(out, child, registry, depth + 1);
    }
}

/// Inner nested dumper (`DumpInner`): an `or` scope wraps its children in
/// parentheses and joins them with `or`; an `and` scope (the default) joins
/// with `, `.
fn dump_many(data: &Many, flow: &Temporal, registry: &dyn Reflection) -> String {
    let separator = if data.is_or() { " or " } else { ", " };
    data.elements().iter().map(|e| dump_element(e, flow, registry)).collect::<Vec<_>>().join(separator)
}

fn dump_element(element: &Element, flow: &Temporal, registry: &dyn Reflection) -> String {
    match element {
        Element::Scalar(s) => dump_scalar(s, registry),
        Element::Verb(v) => dump_verb(v, flow, registry),
        Element::Construct(c) => dump_construct(c, flow, registry),
        Element::Trait(t) => format!("{}({})", registry.resolve(t.trait_meta.token), dump_many(&t.content, flow, registry)),
        Element::Scope(inner) => format!("({})", dump_many(inner, flow, registry)),
        Element::PastPlaceholder(_) => "?".to_string(),
        Element::FuturePlaceholder(_) => "??".to_string(),
        Element::MissingPastRef(id) => dump_missing(*id, flow, registry),
        Element::MissingFutureRef(id) => dump_missing(*id, flow, registry),
    }
}

fn dump_scalar(scalar: &Scalar, registry: &dyn Reflection) -> String {
    match scalar {
        Scalar::Real(r) => r.to_string(),
        Scalar::Byte(b) => b.to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Text(t) => format!("`{t}`"),
        Scalar::Meta(m) => {
            let name = registry.resolve(m.token);
            match m.kind {
                MetaKind::Trait => format!("trait {name}"),
                MetaKind::Constant => format!("const {name}"),
                MetaKind::Verb => format!("verb {name}"),
                _ => name,
            }
        }
    }
}

fn dump_verb(verb: &crate::verb::Verb, flow: &Temporal, registry: &dyn Reflection) -> String {
    let name = registry.resolve(verb.verb_meta.token);
    let mut s = String::new();
    if !verb.source.is_empty() {
        let _ = write!(s, "{}.", dump_many(&verb.source, flow, registry));
    }
    let _ = write!(s, "{name}");
    if !verb.argument.is_empty() {
        let _ = write!(s, "({})", dump_many(&verb.argument, flow, registry));
    }
    s
}

fn dump_construct(construct: &crate::construct::Construct, flow: &Temporal, registry: &dyn Reflection) -> String {
    let name = registry.resolve(construct.type_meta.token);
    if construct.descriptor.is_empty() {
        name
    } else {
        format!("{name}({})", dump_many(&construct.descriptor, flow, registry))
    }
}

/// A suspended point dumps only its accumulated content (`DumpInner`'s
/// "if suspended, dump content and return" branch); otherwise it dumps as
/// an open `?`/`??` marker, with any already-filled content alongside it.
fn dump_missing(id: MissingId, flow: &Temporal, registry: &dyn Reflection) -> String {
    let missing = flow.missing.get(id);
    let marker = match missing.kind {
        MissingKind::Past => "?",
        MissingKind::Future => "??",
    };
    if missing.content.is_empty() {
        marker.to_string()
    } else if missing.suspended {
        dump_many(&missing.content, flow, registry)
    } else {
        format!("{}{marker}", dump_many(&missing.content, flow, registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::DefaultRegistry;

    #[test]
    fn dump_renders_a_pushed_scalar() {
        let registry = DefaultRegistry::new();
        let mut flow = Temporal::new(Many::empty());
        flow.push(Many::from_scalar(Scalar::Real(42.0)), &registry).unwrap();
        let text = flow.dump(&registry);
        assert!(text.contains("42"));
    }

    #[test]
    fn dump_of_a_fresh_flow_shows_the_open_future_point() {
        let registry = DefaultRegistry::new();
        let flow = Temporal::new(Many::empty());
        let text = flow.dump(&registry);
        assert!(text.contains("??"));
    }
}
