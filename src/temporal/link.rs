//! The push-to-futures linking algorithm (spec §4.5.2), grounded on
//! `original_source/source/Temporal.cpp`'s `PushInner`/`Compile`/`Link` and
//! `original_source/source/inner/Missing.hpp`. Three passes: `compile`
//! promotes bare `?`/`??` placeholders produced by the parser into
//! arena-backed missing points; `link` fills any of the compiled scope's own
//! past points from whatever the flow's environment already holds, then
//! walks the flow's priority stack back-to-front for the first unsuspended,
//! accepting future point and inserts the scope there, wiring `above`/
//! `below` as it goes; a final pass re-derives every future point's
//! `suspended` flag from its `below` list.

use crate::error::FlowError;
use crate::many::{Element, Many};
use crate::missing::{Missing, MissingArena, MissingId, MissingKind};
use crate::reflect::Reflection;
use crate::temporal::{link_error, Temporal};

/// Promotes every `PastPlaceholder`/`FuturePlaceholder` reachable from
/// `scope` (descending into nested scopes, traits, constructs and verb
/// source/argument) into an arena-backed reference (spec §4.5.2 step 1).
pub fn compile(scope: Many, missing: &mut MissingArena, priority: f64) -> Many {
    let mut out = Many::from_state(&scope);
    for element in scope.elements() {
        let promoted = match element.clone() {
            Element::PastPlaceholder(filter) => {
                let id = missing.alloc(Missing::new(MissingKind::Past, filter, priority));
                Element::MissingPastRef(id)
            }
            Element::FuturePlaceholder(filter) => {
                let id = missing.alloc(Missing::new(MissingKind::Future, filter, priority));
                Element::MissingFutureRef(id)
            }
            Element::Scope(inner) => Element::Scope(Box::new(compile(*inner, missing, priority))),
            Element::Trait(t) => {
                let mut t = *t;
                t.content = compile(t.content, missing, priority);
                Element::Trait(Box::new(t))
            }
            Element::Construct(c) => {
                let mut c = *c;
                c.descriptor = compile(c.descriptor, missing, priority.max(c.charge.priority));
                Element::Construct(Box::new(c))
            }
            Element::Verb(v) => {
                let mut v = *v;
                let verb_priority = priority.max(v.charge.priority);
                v.source = compile(v.source, missing, verb_priority);
                v.argument = compile(v.argument, missing, verb_priority);
                Element::Verb(Box::new(v))
            }
            other => other,
        };
        out.push(promoted);
    }
    out
}

/// Seeds the always-present open future point (spec §4.5.1 invariant).
pub fn seed_open_future(scope: &mut Many, missing: &mut MissingArena) {
    let id = missing.alloc(Missing::new(MissingKind::Future, Vec::new(), 0.0));
    scope.push(Element::MissingFutureRef(id));
}

/// Links `compiled` into `flow`'s priority stack (spec §4.5.2 steps 2-4):
/// fills any of `compiled`'s own past points from the flow's environment,
/// then walks the priority stack back-to-front — descending into traits,
/// constructs' descriptors and verbs' source/argument — for the first
/// unsuspended future point whose priority and filter accept it (step 3).
/// If `filled` is itself a single unsatisfied past point, it is satisfied
/// directly from that future point's accumulated content rather than
/// appended as new content — the "nearest containing future point" fallback
/// step 3 describes; walking the whole stack in one pass finds that point
/// directly; there is no separate `above`-chain traversal to perform, since
/// the containing point IS the one the walk just found. If no future point
/// anywhere in the stack accepts `filled`, it is appended directly and the
/// open-future invariant is reseeded. Either way, every affected future
/// point's `suspended` flag is re-derived afterward (step 4).
pub fn link(flow: &mut Temporal, compiled: Many, registry: &dyn Reflection) -> Result<Many, FlowError> {
    let filled = fill_past_points(compiled, &mut flow.missing, &flow.environment.clone(), registry);

    // `push` always compiles at priority 0.0 (see `Temporal::push`); nothing
    // in this crate's public API lets a caller push at a higher priority, so
    // the base-priority comparison step 3 calls for collapses to 0.0 here.
    let priority = 0.0;

    match search_future_slot(&flow.priority_stack, &flow.missing, priority, &filled, registry) {
        Some(id) => insert_into_future(&mut flow.missing, id, &filled, registry),
        None => {
            flow.priority_stack = flow.priority_stack.catenate(&filled);
            seed_open_future(&mut flow.priority_stack, &mut flow.missing);
        }
    }

    remap_suspension(&mut flow.missing, registry);

    if filled.is_empty() {
        return Err(link_error("no future point accepted the pushed material"));
    }
    Ok(filled)
}

/// Walks `scope` back-to-front, descending into nested scopes, traits,
/// constructs' descriptors and verbs' argument/source, for the first
/// `MissingFuture` point that isn't suspended, whose priority is at least
/// `priority`, and that accepts `material`. A point that fails either check
/// is not a dead end: its own content is searched in turn, since a point
/// deeper inside it may be the better (or only) fit — this is also how a
/// suspended point's unsuspended descendants stay reachable.
fn search_future_slot(scope: &Many, missing: &MissingArena, priority: f64, material: &Many, registry: &dyn Reflection) -> Option<MissingId> {
    for element in scope.elements().iter().rev() {
        let found = match element {
            Element::MissingFutureRef(id) => {
                let point = missing.get(*id);
                if !point.suspended && priority <= point.priority && point.accepts(material, registry) {
                    Some(*id)
                } else {
                    search_future_slot(&point.content, missing, priority, material, registry)
                }
            }
            Element::Scope(inner) => search_future_slot(inner, missing, priority, material, registry),
            Element::Trait(t) => search_future_slot(&t.content, missing, priority, material, registry),
            Element::Construct(c) => search_future_slot(&c.descriptor, missing, priority, material, registry),
            Element::Verb(v) => search_future_slot(&v.argument, missing, priority, material, registry)
                .or_else(|| search_future_slot(&v.source, missing, priority, material, registry)),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Inserts `filled` into future point `target`. If `filled` is a single
/// still-open past point, that past point is satisfied from `target`'s own
/// content instead of being appended — pushing a bare `?` asks "what does
/// the nearest enclosing future point already hold?" rather than adding new
/// content. Otherwise `filled` is appended as new content, and every future/
/// past point reachable at its own top level is wired to `target` via
/// `above`/`below` (spec §3 "Missing point" back-pointers).
fn insert_into_future(missing: &mut MissingArena, target: MissingId, filled: &Many, registry: &dyn Reflection) {
    if filled.len() == 1 {
        if let Some(Element::MissingPastRef(past_id)) = filled.get(0) {
            if !missing.get(*past_id).is_satisfied(registry) {
                let content = missing.get(target).content.clone();
                missing.get_mut(*past_id).content.smart_push(content);
                wire(missing, target, *past_id);
                return;
            }
        }
    }

    for element in filled.elements() {
        if let Element::MissingFutureRef(id) | Element::MissingPastRef(id) = element {
            wire(missing, target, *id);
        }
    }
    missing.get_mut(target).content.smart_push(filled.clone());
}

fn wire(missing: &mut MissingArena, above: MissingId, below: MissingId) {
    missing.get_mut(below).above = Some(above);
    missing.get_mut(above).below.push(below);
}

/// Step 4: "re-map the below list" — a future point is suspended iff one of
/// the future points nested directly inside its own content (its `below`
/// list) shares its priority and is not yet satisfied.
fn remap_suspension(missing: &mut MissingArena, registry: &dyn Reflection) {
    let future_ids: Vec<MissingId> = missing.iter().filter(|(_, m)| m.kind == MissingKind::Future).map(|(id, _)| id).collect();
    for id in future_ids {
        let priority = missing.get(id).priority;
        let below = missing.get(id).below.clone();
        let suspended = below.iter().any(|b| {
            let point = missing.get(*b);
            point.kind == MissingKind::Future && point.priority == priority && !point.is_satisfied(registry)
        });
        missing.get_mut(id).suspended = suspended;
    }
}

/// Substitutes every satisfied missing point reachable from `scope` with
/// its accumulated content (spec §4.5.3 "Update" reads the flow through its
/// missing points), descending into nested scopes, traits, constructs and
/// verb source/argument the same way `compile` does. An unsatisfied point is
/// left as a ref so it keeps accepting pushes on a later call. `scope`
/// itself (and the arena) are untouched — this builds a throwaway copy to
/// execute, not a structural rewrite.
pub fn resolve(scope: &Many, missing: &MissingArena, registry: &dyn Reflection) -> Many {
    let mut out = Many::from_state(scope);
    for element in scope.elements() {
        match element {
            Element::MissingPastRef(id) | Element::MissingFutureRef(id) => {
                let point = missing.get(*id);
                if point.is_satisfied(registry) {
                    out = out.catenate(&resolve(&point.content, missing, registry));
                } else {
                    out.push(element.clone());
                }
            }
            Element::Scope(inner) => out.push(Element::Scope(Box::new(resolve(inner, missing, registry)))),
            Element::Trait(t) => {
                let mut t = (**t).clone();
                t.content = resolve(&t.content, missing, registry);
                out.push(Element::Trait(Box::new(t)));
            }
            Element::Construct(c) => {
                let mut c = (**c).clone();
                c.descriptor = resolve(&c.descriptor, missing, registry);
                out.push(Element::Construct(Box::new(c)));
            }
            Element::Verb(v) => {
                let mut v = (**v).clone();
                v.source = resolve(&v.source, missing, registry);
                v.argument = resolve(&v.argument, missing, registry);
                out.push(Element::Verb(Box::new(v)));
            }
            other => out.push(other.clone()),
        }
    }
    out
}

/// Fills any top-level `MissingPastRef` reachable from `scope` with
/// whatever `available` already holds (spec §4.5.2 step 2), honouring each
/// point's filter.
fn fill_past_points(scope: Many, missing: &mut MissingArena, available: &Many, registry: &dyn Reflection) -> Many {
    let mut out = Many::from_state(&scope);
    for element in scope.elements() {
        match element {
            Element::MissingPastRef(id) => {
                if missing.get(*id).accepts(available, registry) {
                    missing.get_mut(*id).content = available.clone();
                }
                out.push(Element::MissingPastRef(*id));
            }
            Element::Scope(inner) => out.push(Element::Scope(Box::new(fill_past_points((**inner).clone(), missing, available, registry)))),
            other => out.push(other.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::many::Scalar;
    use crate::reflect::DefaultRegistry;

    #[test]
    fn compile_promotes_bare_placeholders() {
        let mut arena = MissingArena::new();
        let mut scope = Many::empty();
        scope.push(Element::FuturePlaceholder(Vec::new()));
        let compiled = compile(scope, &mut arena, 0.0);
        assert_eq!(arena.len(), 1);
        assert!(matches!(compiled.get(0), Some(Element::MissingFutureRef(_))));
    }

    #[test]
    fn link_inserts_into_the_open_future_point() {
        let registry = DefaultRegistry::new();
        let mut flow = Temporal::new(Many::empty());
        let compiled = compile(Many::from_scalar(Scalar::Real(1.0)), &mut flow.missing, 0.0);
        let result = link(&mut flow, compiled, &registry);
        assert!(result.is_ok());
    }
}
