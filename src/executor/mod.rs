//! Scope execution (C4, spec §4.4): AND/OR semantics over a `Many` used as
//! an executable sequence, three-phase verb dispatch, and the default
//! abilities a bare `DefaultRegistry` falls back to.
//!
//! Grounded on `original_source/source/Scope.cpp` (`Scope::Execute`,
//! `ExecuteAND`, `ExecuteOR`, `IntegrateVerb`, `ExecuteVerb`) and
//! `original_source/Block/Doing.cpp` (`DispatchDeep`/`DispatchFlat`). Two
//! deliberate departures from the C++ original, recorded in DESIGN.md:
//! the top-level `ok` an OR scope reports is the actual any-succeeded
//! result (the C++ wrapper discards it); and an OR scope's own short-circuit
//! only suppresses its *own* subsequent verb children, since the original's
//! sibling-skip guard in `ExecuteScopeOR` is never actually armed. Each
//! `execute_or` call mints its own entangled flag (`Verb::entangled`, spec
//! §4.5.4) shared by that scope's own verb children; it is not yet threaded
//! across separate `push`es landing in different time/frequency stacks,
//! since this crate has no operation that duplicates a branch across
//! stacks in the first place (DESIGN.md).

pub mod defaults;

use crate::construct::Construct;
use crate::error::FlowError;
use crate::flow_trait::Trait;
use crate::many::{Element, Many};
use crate::reflect::Reflection;
use crate::scope::is_or_scope;
use crate::verb::Verb;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Executes `scope` against `env` (spec §6 `execute(scope, env) -> (ok, output)`).
pub fn execute(scope: &Many, env: &mut Many, registry: &dyn Reflection) -> Result<(bool, Many), FlowError> {
    let mut skip_verbs = false;
    execute_inner(scope, env, &mut skip_verbs, registry)
}

fn execute_inner(scope: &Many, env: &mut Many, skip_verbs: &mut bool, registry: &dyn Reflection) -> Result<(bool, Many), FlowError> {
    let mut output = Many::from_state(scope);
    if scope.is_empty() {
        return Ok((true, output));
    }
    let ok = if is_or_scope(scope) {
        execute_or(scope, env, &mut output, skip_verbs, registry)?
    } else {
        execute_and(scope, env, &mut output, skip_verbs, registry)?
    };
    if ok {
        output.optimize(registry);
        Ok((true, output))
    } else {
        Ok((false, Many::from_state(scope)))
    }
}

/// AND-scope execution (spec §4.4.2): every child must succeed, in order.
/// A child that is itself a nested OR scope may set `skip_verbs`; once that
/// happens, the remaining loop breaks entirely on the next `Verb` element —
/// not just that element — mirroring `ExecuteAND`'s `Flow::Break` semantics.
pub fn execute_and(scope: &Many, env: &mut Many, output: &mut Many, skip_verbs: &mut bool, registry: &dyn Reflection) -> Result<bool, FlowError> {
    for element in scope.elements() {
        if *skip_verbs && matches!(element, Element::Verb(_)) {
            break;
        }
        match element {
            Element::Scope(inner) => {
                let (ok, local) = execute_inner(inner, env, skip_verbs, registry)?;
                if !ok {
                    return Ok(false);
                }
                output.smart_push(local);
            }
            Element::Trait(t) => {
                let (ok, local) = execute_inner(&t.content, env, skip_verbs, registry)?;
                if !ok {
                    return Ok(false);
                }
                output.push(Element::Trait(Box::new(Trait::new(t.trait_meta, local))));
            }
            Element::Construct(c) => {
                let (ok, local) = execute_inner(&c.descriptor, env, skip_verbs, registry)?;
                if !ok {
                    return Ok(false);
                }
                let resolved = Construct::new(c.type_meta).with_descriptor(local).with_charge(c.charge);
                output.push(Element::Construct(Box::new(resolved)));
            }
            Element::Verb(v) => {
                let mut verb = (**v).clone();
                if !execute_verb(env, &mut verb, registry)? {
                    return Ok(false);
                }
                if !verb.output.is_empty() {
                    output.smart_push(verb.output.clone());
                }
            }
            other => output.push(other.clone()),
        }
    }
    Ok(true)
}

/// OR-scope execution (spec §4.4.2): every child runs against its own copy
/// of `env`; the scope succeeds iff at least one child did, and its output
/// is the merged output of the successful children. Once one child
/// succeeds, subsequent `Verb` children of *this same scope* are skipped
/// (not attempted, not counted) while non-verb children still accumulate;
/// the scope's own success is then propagated to the caller's `skip_verbs`
/// so an enclosing AND sequence skips its own remaining verbs too.
pub fn execute_or(scope: &Many, env: &mut Many, output: &mut Many, skip_verbs: &mut bool, registry: &dyn Reflection) -> Result<bool, FlowError> {
    let mut executed = false;
    let mut own_skip = false;
    let mut substitution: Option<Many> = None;
    let entangled = Arc::new(AtomicBool::new(false));

    for element in scope.elements() {
        if own_skip && matches!(element, Element::Verb(_)) {
            continue;
        }
        let mut local_env = env.clone();
        let mut local_skip = false;
        let (ok, local_output) = match element {
            Element::Scope(inner) => execute_inner(inner, &mut local_env, &mut local_skip, registry)?,
            Element::Trait(t) => {
                let (ok, local) = execute_inner(&t.content, &mut local_env, &mut local_skip, registry)?;
                (ok, Many::from_element(Element::Trait(Box::new(Trait::new(t.trait_meta, local)))))
            }
            Element::Construct(c) => {
                let (ok, local) = execute_inner(&c.descriptor, &mut local_env, &mut local_skip, registry)?;
                let resolved = Construct::new(c.type_meta).with_descriptor(local).with_charge(c.charge);
                (ok, Many::from_element(Element::Construct(Box::new(resolved))))
            }
            Element::Verb(v) => {
                let mut verb = (**v).clone().with_entangled(entangled.clone());
                let ok = execute_verb(&local_env, &mut verb, registry)?;
                (ok, verb.output.clone())
            }
            other => (true, Many::from_element(other.clone())),
        };

        if ok {
            executed = true;
            own_skip = true;
            if !local_output.is_empty() {
                output.smart_push(local_output);
            }
            if local_env != *env {
                substitution = Some(local_env);
            }
        }
    }

    if let Some(new_env) = substitution {
        *env = new_env;
    }
    *skip_verbs = *skip_verbs || own_skip;
    Ok(executed)
}

/// Integrates a verb's source and argument against `env` (spec §4.4.3
/// `Scope::IntegrateVerb`): a monocast verb with an empty source inherits
/// `env` directly; otherwise source is executed against `env` (falling back
/// to `env` if the result is empty), then argument is executed against the
/// resolved source.
fn integrate_verb(env: &Many, verb: &mut Verb, registry: &dyn Reflection) -> Result<bool, FlowError> {
    if verb.state.is_monocast() && verb.source.is_empty() {
        verb.source = env.clone();
    } else {
        let mut local_source = env.clone();
        let (ok, resolved_source) = execute(&verb.source.clone(), &mut local_source, registry)?;
        if !ok {
            return Ok(false);
        }
        verb.source = if resolved_source.is_empty() { local_source } else { resolved_source };
    }

    let mut local_argument_ctx = verb.source.clone();
    let (ok, resolved_argument) = execute(&verb.argument.clone(), &mut local_argument_ctx, registry)?;
    if !ok {
        return Ok(false);
    }
    verb.argument = resolved_argument;
    Ok(true)
}

/// Executes a single verb, including its subverbs (spec §4.4.3
/// `Scope::ExecuteVerb`). A verb whose entangled flag (spec §4.5.4) was
/// already flipped by a sibling branch is inert: it never integrates or
/// dispatches, and its own `done` stays false. Otherwise, `Do`/`Undo`
/// short-circuit after integration, since their subverbs already ran
/// during integration; every other verb is dispatched deep against its
/// (now integrated) source.
pub fn execute_verb(env: &Many, verb: &mut Verb, registry: &dyn Reflection) -> Result<bool, FlowError> {
    if verb.is_entangled_done() {
        verb.output = Many::empty();
        verb.done = false;
        return Ok(false);
    }

    if !integrate_verb(env, verb, registry)? {
        return Ok(false);
    }

    if Some(verb.verb_meta) == registry.get_meta_verb("Do") {
        if verb.output.is_empty() {
            verb.output = if !verb.argument.is_empty() { verb.argument.clone() } else { verb.source.clone() };
        }
        verb.record_success();
        return Ok(true);
    }

    let source = verb.source.clone();
    let done = dispatch_deep(&source, verb, registry)?;
    Ok(done)
}

/// Dispatches `verb` against every flat element reachable from `context`
/// (spec §4.4.1, `Verb::DispatchDeep`). Nests once per `Scope` element,
/// accumulating success counts and outputs; a single non-deep element
/// dispatches directly via `dispatch_flat`.
pub fn dispatch_deep(context: &Many, verb: &mut Verb, registry: &dyn Reflection) -> Result<bool, FlowError> {
    if context.is_empty() {
        return dispatch_flat(None, verb, registry);
    }
    if context.len() == 1 && !context.is_deep() {
        return dispatch_flat(context.get(0), verb, registry);
    }

    let mut success_count = 0u32;
    let mut output = Many::from_state(context);
    for element in context.elements() {
        let hit = match element {
            Element::Scope(inner) => dispatch_deep(inner, verb, registry)?,
            other => dispatch_flat(Some(other), verb, registry)?,
        };
        if hit {
            success_count += 1;
            if !verb.output.is_empty() {
                output.smart_push(verb.output.clone());
            }
        }
    }

    verb.successes = success_count;
    verb.done = success_count > 0;
    if verb.done {
        output.optimize(registry);
        verb.output = output;
    } else {
        verb.output = Many::empty();
    }
    Ok(verb.done)
}

/// Three-phase dispatch contract (spec §4.4.1) for one flat element: Custom
/// (Phase 1, `Reflection::dispatch_custom`), Reflected (Phase 2, walking
/// `Reflection::bases`), then Default (Phase 3, `crate::executor::defaults`).
/// `element = None` dispatches against an empty context (only default
/// abilities run, mirroring `Verb::DispatchEmpty`).
pub fn dispatch_flat(element: Option<&Element>, verb: &mut Verb, registry: &dyn Reflection) -> Result<bool, FlowError> {
    verb.output = Many::empty();
    verb.done = false;

    let mut context = match element {
        Some(e) => Many::from_element(e.clone()),
        None => Many::empty(),
    };

    if let Some(type_meta) = element_type_meta(element) {
        if let Some(ok) = registry.dispatch_custom(type_meta, verb, &mut context) {
            verb.done = ok;
        }
        if !verb.done {
            for base in registry.bases(type_meta) {
                if let Some(ok) = registry.dispatch_reflected(base, verb, &mut context) {
                    verb.done = ok;
                    if verb.done {
                        break;
                    }
                }
            }
        }
    }

    if !verb.done {
        verb.done = defaults::dispatch_default(&context, verb, registry)?;
    }

    if verb.done {
        verb.record_success();
    }
    Ok(verb.done)
}

fn element_type_meta(element: Option<&Element>) -> Option<crate::many::Meta> {
    use crate::many::{MetaKind, Scalar};
    match element {
        Some(Element::Construct(c)) => Some(c.type_meta),
        Some(Element::Scalar(Scalar::Meta(m))) if m.kind == MetaKind::Data => Some(*m),
        _ => None,
    }
}
