//! `Many` (C2): the heterogeneous, stateful, typed container that is both
//! the parser's output and the executor's universal value (spec §3, §6).
//!
//! Per DESIGN NOTES §9 this is represented as a tagged sum
//! (`Empty | Typed | Deep`) rather than imported wholesale from an external
//! crate — `Many` is unavoidably part of this crate's own surface. Elements
//! are reference-counted (`Rc`) and mutation goes through `Rc::make_mut` for
//! clone-on-write sharing of literals, per spec §3 "Ownership and cycles".

pub mod hash;
pub mod state;

pub use state::ManyState;

use crate::construct::Construct;
use crate::flow_trait::Trait;
use crate::intern::Symbol;
use crate::missing::MissingId;
use crate::reflect::Reflection;
use crate::verb::Verb;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// The kind of registry entry a token resolves to (spec §6 per-type meta
/// kinds: `DMeta`, `TMeta`, `CMeta`, `VMeta`, plus operator tokens).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaKind {
    Data,
    Trait,
    Verb,
    Constant,
    Operator,
}

/// A resolved meta-token handle: which kind of registry entry, and which
/// interned name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meta {
    pub kind: MetaKind,
    pub token: Symbol,
}

impl Meta {
    pub fn new(kind: MetaKind, token: Symbol) -> Self {
        Meta { kind, token }
    }
}

/// A scalar leaf value inside a dense `Many` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Real(f64),
    Byte(u8),
    Bool(bool),
    Text(Rc<str>),
    Meta(Meta),
}

impl Scalar {
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Scalar::Real(r) => Some(*r),
            Scalar::Byte(b) => Some(*b as f64),
            _ => None,
        }
    }

    /// Numeric cast eligibility used by the `Interpret` default ability.
    pub fn is_number(&self) -> bool {
        matches!(self, Scalar::Real(_) | Scalar::Byte(_))
    }
}

/// One element of a `Many`'s content. Graph nodes (`Verb`/`Construct`/
/// `Trait`) are owned (`Box`); missing points are referenced by arena index
/// (`MissingId`, non-owning, see `crate::missing`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Element {
    Scalar(Scalar),
    Verb(Box<Verb>),
    Construct(Box<Construct>),
    Trait(Box<Trait>),
    /// Pre-link placeholder produced directly by the parser for `?` (spec
    /// §4.3.3); promoted to a `MissingPastRef` during `Temporal::push`'s
    /// compile step (spec §4.5.2 step 1).
    PastPlaceholder(Vec<Meta>),
    /// Pre-link placeholder for `??`.
    FuturePlaceholder(Vec<Meta>),
    MissingPastRef(MissingId),
    MissingFutureRef(MissingId),
    /// A nested scope/sub-container.
    Scope(Box<Many>),
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Element::Scalar(a), Element::Scalar(b)) => a == b,
            (Element::Verb(a), Element::Verb(b)) => a == b,
            (Element::Construct(a), Element::Construct(b)) => a == b,
            (Element::Trait(a), Element::Trait(b)) => a == b,
            (Element::PastPlaceholder(a), Element::PastPlaceholder(b)) => a == b,
            (Element::FuturePlaceholder(a), Element::FuturePlaceholder(b)) => a == b,
            (Element::MissingPastRef(a), Element::MissingPastRef(b)) => a == b,
            (Element::MissingFutureRef(a), Element::MissingFutureRef(b)) => a == b,
            (Element::Scope(a), Element::Scope(b)) => a == b,
            _ => false,
        }
    }
}

/// Recursion depth guard for structural comparison/hashing (DESIGN NOTES
/// §9 "Deep-equality recursion").
pub const MAX_RECURSION_DEPTH: usize = 256;

/// The heterogeneous container. Cheap to `Clone` (an `Rc` bump); mutating
/// methods copy-on-write via `Rc::make_mut`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Many {
    elements: Rc<Vec<Element>>,
    state: ManyState,
    /// The dominant element type, set by `from_meta` and by constructors
    /// that know their intended type ahead of any content (spec §6
    /// `Many::from_meta(DMeta)`).
    type_meta: Option<Meta>,
}

impl Default for Many {
    fn default() -> Self {
        Many::empty()
    }
}

impl Many {
    pub fn empty() -> Self {
        Many { elements: Rc::new(Vec::new()), state: ManyState::none().with(ManyState::EMPTY), type_meta: None }
    }

    pub fn from_meta(meta: Meta) -> Self {
        Many { elements: Rc::new(Vec::new()), state: ManyState::none().with(ManyState::EMPTY), type_meta: Some(meta) }
    }

    /// Copies state bits (not data) from another `Many` — used when a new
    /// container should inherit or/past/future/const flags without content.
    pub fn from_state(other: &Many) -> Self {
        Many { elements: Rc::new(Vec::new()), state: other.state.with(ManyState::EMPTY), type_meta: other.type_meta }
    }

    pub fn from_scalar(scalar: Scalar) -> Self {
        let mut m = Many::empty();
        m.push_scalar(scalar);
        m
    }

    pub fn from_element(element: Element) -> Self {
        let mut m = Many::empty();
        m.push(element);
        m
    }

    pub fn state(&self) -> ManyState {
        self.state
    }

    pub fn type_meta(&self) -> Option<Meta> {
        self.type_meta
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    // ---- state predicates / setters (spec §6 "State") ----

    pub fn is_or(&self) -> bool {
        self.state.is_or()
    }

    pub fn is_and(&self) -> bool {
        self.state.is_and()
    }

    pub fn make_or(mut self) -> Self {
        self.state = self.state.make_or();
        self
    }

    pub fn make_and(mut self) -> Self {
        self.state = self.state.make_and();
        self
    }

    pub fn make_past(mut self) -> Self {
        self.state = self.state.make_past();
        self
    }

    pub fn make_future(mut self) -> Self {
        self.state = self.state.make_future();
        self
    }

    pub fn make_missing(mut self) -> Self {
        self.state = self.state.make_missing();
        self
    }

    pub fn make_const(mut self) -> Self {
        self.state = self.state.make_const();
        self
    }

    pub fn is_deep(&self) -> bool {
        self.elements.iter().any(|e| matches!(e, Element::Scope(_)))
    }

    pub fn is_sparse(&self) -> bool {
        self.state.is_sparse()
    }

    pub fn is_dense(&self) -> bool {
        self.state.is_dense()
    }

    pub fn is_constant(&self) -> bool {
        self.state.is_constant()
    }

    /// "Statically creatable" for this container's content: no missing
    /// points and no flow-dependent charge anywhere (used by the parser's
    /// compile-time arithmetic folding, spec scenario 3).
    pub fn is_static(&self) -> bool {
        if self.state.is_missing() {
            return false;
        }
        self.elements.iter().all(|e| match e {
            Element::PastPlaceholder(_) | Element::FuturePlaceholder(_) => false,
            Element::MissingPastRef(_) | Element::MissingFutureRef(_) => false,
            Element::Verb(v) => !v.charge.is_flow_dependent() && v.source.is_static() && v.argument.is_static(),
            Element::Scope(inner) => inner.is_static(),
            _ => true,
        })
    }

    pub fn is_abstract(&self, registry: &dyn Reflection) -> bool {
        match self.type_meta {
            Some(meta) if meta.kind == MetaKind::Data => registry.is_abstract(meta),
            _ => false,
        }
    }

    pub fn casts_to_meta(&self, target: Meta, registry: &dyn Reflection) -> bool {
        match self.type_meta {
            Some(mine) => mine == target || registry.casts_to(mine, target),
            None => true,
        }
    }

    /// Do any of this container's elements' types cast to any element of
    /// `filter`? Empty filter always matches non-empty content.
    pub fn any_element_casts_to(&self, filter: &[Meta], registry: &dyn Reflection) -> bool {
        if filter.is_empty() {
            return !self.is_empty();
        }
        self.elements.iter().any(|e| element_meta(e).map_or(false, |m| filter.iter().any(|f| m == *f || registry.casts_to(m, *f))))
    }

    pub fn hash(&self) -> u64 {
        hash::hash_many(self, 0)
    }

    // ---- mutation (spec §6 "Mutation") ----

    fn elements_mut(&mut self) -> &mut Vec<Element> {
        Rc::make_mut(&mut self.elements)
    }

    pub fn push(&mut self, element: Element) {
        self.state = self.state.without(ManyState::EMPTY);
        self.elements_mut().push(element);
    }

    pub fn push_scalar(&mut self, scalar: Scalar) {
        self.push(Element::Scalar(scalar));
    }

    pub fn push_scope(&mut self, scope: Many) {
        self.push(Element::Scope(Box::new(scope)));
    }

    /// Auto-wraps `value` for compatibility with `side`'s existing content
    /// before pushing (spec §6 `smart_push`). Scalars are pushed directly;
    /// anything already shaped as a `Many` is pushed as a nested scope
    /// unless `side` is itself empty, in which case its elements replace
    /// `side`'s directly (flattening one level).
    pub fn smart_push(&mut self, value: Many) {
        if self.is_empty() && !self.state.is_missing() {
            *self = value.with_state_bits(self.state);
            return;
        }
        if value.len() == 1 && !value.is_deep() {
            if let Some(element) = value.elements.first().cloned() {
                self.push(element);
                return;
            }
        }
        self.push_scope(value);
    }

    fn with_state_bits(mut self, extra: ManyState) -> Self {
        self.state = self.state.with(extra);
        self
    }

    pub fn insert_block(&mut self, index: usize, block: Many) {
        let element = Element::Scope(Box::new(block));
        let vec = self.elements_mut();
        let index = index.min(vec.len());
        vec.insert(index, element);
    }

    pub fn remove_index(&mut self, index: usize) -> Option<Element> {
        let vec = self.elements_mut();
        if index < vec.len() {
            Some(vec.remove(index))
        } else {
            None
        }
    }

    pub fn pop(&mut self) -> Option<Element> {
        self.elements_mut().pop()
    }

    /// Ors extra state bits into this container without touching content
    /// (the parser's paren-scope insertion rule preserves an empty lhs's
    /// state bits when the scope's content replaces it wholesale).
    pub fn or_state(&mut self, extra: ManyState) {
        self.state = self.state.with(extra);
    }

    /// Returns this container to its pre-execution state: clears verb
    /// `done`/`output` recursively (spec §4.2 "Reset"), leaves structure
    /// otherwise untouched.
    pub fn reset(&mut self) {
        for element in self.elements_mut() {
            match element {
                Element::Verb(v) => v.reset(),
                Element::Scope(s) => s.reset(),
                Element::Construct(_) | Element::Trait(_) => {}
                _ => {}
            }
        }
    }

    /// Compile-time folding of fully static scalar sub-trees (spec §6
    /// `optimize`, spec scenario 3): a verb whose entire source/argument is
    /// `is_static` (no missing points, no flow-dependent charge anywhere)
    /// is executed once against an empty environment and, if it collapses
    /// to a single scalar, replaced by that scalar in place. Non-verb
    /// containers (`Scope`/`Construct`/`Trait`) recurse into their nested
    /// content instead, since they carry no foldable identity of their own.
    pub fn optimize(&mut self, registry: &dyn Reflection) {
        let folded: Vec<Element> = self.elements.iter().cloned().map(|e| fold_element(e, registry)).collect();
        self.elements = Rc::new(folded);
        if self.len() == 1 {
            if let Some(Element::Scope(inner)) = self.elements.first() {
                let inner = (**inner).clone();
                *self = inner;
            }
        }
    }

    /// Attempts a structural copy into `target`. Fails with `false` (caller
    /// maps this to `FlowError::BadCopy`) if `target` is constant.
    pub fn copy_to(&self, target: &mut Many) -> Result<usize, ()> {
        if target.is_constant() {
            return Err(());
        }
        let mut count = 0;
        for element in self.elements.iter() {
            target.push(element.clone());
            count += 1;
        }
        Ok(count)
    }

    pub fn for_each(&self, mut f: impl FnMut(&Element)) {
        for element in self.elements.iter() {
            f(element);
        }
    }

    pub fn for_each_deep(&self, f: &mut impl FnMut(&Element)) {
        for element in self.elements.iter() {
            f(element);
            if let Element::Scope(inner) = element {
                inner.for_each_deep(f);
            }
        }
    }

    /// Extracts all scalar elements of the type matching `predicate` into a
    /// fresh `Many` (spec §6 `gather<T>()`).
    pub fn gather_scalars(&self, predicate: impl Fn(&Scalar) -> bool) -> Many {
        let mut out = Many::empty();
        for element in self.elements.iter() {
            if let Element::Scalar(s) = element {
                if predicate(s) {
                    out.push_scalar(s.clone());
                }
            }
        }
        out
    }

    pub fn catenate(&self, other: &Many) -> Many {
        let mut out = self.clone();
        for element in other.elements.iter() {
            out.push(element.clone());
        }
        out
    }
}

impl PartialEq for Many {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.type_meta == other.type_meta && *self.elements == *other.elements
    }
}

fn element_meta(element: &Element) -> Option<Meta> {
    match element {
        Element::Scalar(Scalar::Meta(m)) => Some(*m),
        Element::Construct(c) => Some(c.type_meta),
        _ => None,
    }
}

fn fold_element(element: Element, registry: &dyn Reflection) -> Element {
    match element {
        Element::Verb(mut v) => {
            if !v.charge.is_flow_dependent() && v.source.is_static() && v.argument.is_static() {
                if let Some(folded) = fold_verb(&v, registry) {
                    return folded;
                }
            }
            v.source.optimize(registry);
            v.argument.optimize(registry);
            Element::Verb(v)
        }
        Element::Scope(mut inner) => {
            inner.optimize(registry);
            Element::Scope(inner)
        }
        Element::Construct(mut c) => {
            c.descriptor.optimize(registry);
            Element::Construct(c)
        }
        Element::Trait(mut t) => {
            t.content.optimize(registry);
            Element::Trait(t)
        }
        other => other,
    }
}

/// Runs a fully static verb against an empty environment (spec scenario 3);
/// the existing execution machinery already recurses through nested verbs
/// via `integrate_verb`/`dispatch_deep`, so one `execute_verb` call folds
/// the whole subtree in a single pass.
fn fold_verb(verb: &Verb, registry: &dyn Reflection) -> Option<Element> {
    let mut verb = verb.clone();
    let env = Many::empty();
    let done = crate::executor::execute_verb(&env, &mut verb, registry).ok()?;
    if !done {
        return None;
    }
    match (verb.output.len(), verb.output.get(0)) {
        (1, Some(Element::Scalar(s))) => Some(Element::Scalar(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_many_is_empty() {
        let m = Many::empty();
        assert!(m.is_empty());
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn push_clears_empty_flag() {
        let mut m = Many::empty();
        m.push_scalar(Scalar::Real(1.0));
        assert!(!m.is_empty());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn clone_is_cheap_and_shares_until_mutated() {
        let mut a = Many::empty();
        a.push_scalar(Scalar::Real(1.0));
        let b = a.clone();
        assert_eq!(a, b);
        a.push_scalar(Scalar::Real(2.0));
        assert_ne!(a, b);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn default_state_is_and_short_and_multicast() {
        let m = Many::empty();
        assert!(m.is_and());
        assert!(!m.is_constant());
    }

    #[test]
    fn make_past_and_future_set_missing() {
        let past = Many::empty().make_past();
        assert!(past.state().is_past());
        assert!(past.state().is_missing());
        let future = Many::empty().make_future();
        assert!(future.state().is_future());
    }

    #[test]
    fn catenate_concatenates_elements() {
        let mut a = Many::empty();
        a.push_scalar(Scalar::Real(1.0));
        let mut b = Many::empty();
        b.push_scalar(Scalar::Real(2.0));
        let c = a.catenate(&b);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn copy_to_fails_on_constant_target() {
        let mut src = Many::empty();
        src.push_scalar(Scalar::Real(1.0));
        let mut target = Many::empty().make_const();
        assert!(src.copy_to(&mut target).is_err());
    }

    #[test]
    fn copy_to_appends_and_counts() {
        let mut src = Many::empty();
        src.push_scalar(Scalar::Real(1.0));
        src.push_scalar(Scalar::Real(2.0));
        let mut target = Many::empty();
        let count = src.copy_to(&mut target).unwrap();
        assert_eq!(count, 2);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn is_static_false_with_missing_placeholder() {
        let mut m = Many::empty();
        m.push(Element::PastPlaceholder(Vec::new()));
        assert!(!m.is_static());
    }

    #[test]
    fn is_static_true_for_plain_scalars() {
        let mut m = Many::empty();
        m.push_scalar(Scalar::Real(2.0));
        m.push_scalar(Scalar::Real(8.75));
        assert!(m.is_static());
    }

    #[test]
    fn for_each_deep_descends_into_scopes() {
        let mut inner = Many::empty();
        inner.push_scalar(Scalar::Real(42.0));
        let mut outer = Many::empty();
        outer.push_scope(inner);
        let mut seen = 0;
        outer.for_each_deep(&mut |_| seen += 1);
        assert_eq!(seen, 2); // the Scope element itself, then the Real inside it
    }
}
