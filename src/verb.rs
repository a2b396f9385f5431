//! `Verb` (C2): a named operation carrying source, argument, output and a
//! charge (spec §3 "Verb", §4.2). Grounded on
//! `original_source/source/Verb.hpp`/`.cpp`.

use crate::charge::{Charge, VerbState};
use crate::many::{Many, Meta};
use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verb {
    pub verb_meta: Meta,
    pub source: Many,
    pub argument: Many,
    pub output: Many,
    pub charge: Charge,
    pub state: VerbState,
    pub successes: u32,
    pub done: bool,
    /// Spec §4.5.4/DESIGN NOTES §9: the one piece of cross-branch shared
    /// mutable state in the core. Branches produced by an OR push share this
    /// flag across whichever stacks they end up in; the first to complete
    /// flips it, the others stay inert. `Rc`-based `Many` can't cross this
    /// boundary, hence the one `Arc` in an otherwise single-threaded crate.
    #[serde(skip)]
    pub entangled: Option<Arc<AtomicBool>>,
}

impl Verb {
    pub fn new(verb_meta: Meta) -> Self {
        Verb {
            verb_meta,
            source: Many::empty(),
            argument: Many::empty(),
            output: Many::empty(),
            charge: Charge::default(),
            state: VerbState::default(),
            successes: 0,
            done: false,
            entangled: None,
        }
    }

    pub fn with_source(mut self, source: Many) -> Self {
        self.source = source;
        self.clear_execution_state();
        self
    }

    pub fn with_argument(mut self, argument: Many) -> Self {
        self.argument = argument;
        self.clear_execution_state();
        self
    }

    pub fn with_charge(mut self, charge: Charge) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_state(mut self, state: VerbState) -> Self {
        self.state = state;
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.charge = self.charge.with_mass(mass);
        self
    }

    pub fn rate(mut self, rate: f64) -> Self {
        self.charge = self.charge.with_rate(rate);
        self
    }

    pub fn time(mut self, time: f64) -> Self {
        self.charge = self.charge.with_time(time);
        self
    }

    pub fn priority(mut self, priority: f64) -> Self {
        self.charge = self.charge.with_priority(priority);
        self
    }

    /// Wires this verb into an entangled-branch group (spec §4.5.4): whoever
    /// else holds the same `Arc` is a sibling branch sharing one done flag.
    pub fn with_entangled(mut self, flag: Arc<AtomicBool>) -> Self {
        self.entangled = Some(flag);
        self
    }

    /// True once a sibling sharing this verb's entangled flag has completed.
    /// An entangled-done verb contributes nothing further (spec §4.5.4
    /// "the others become inert").
    pub fn is_entangled_done(&self) -> bool {
        self.entangled.as_ref().map(|flag| flag.load(Ordering::SeqCst)).unwrap_or(false)
    }

    /// Setting source/argument clears any cached `done`/`output` (spec
    /// §4.2 invariant).
    fn clear_execution_state(&mut self) {
        self.output = Many::empty();
        self.done = false;
        self.successes = 0;
    }

    /// Returns this verb to its pre-execution state: clears `output`,
    /// `done`, `successes`, and descends recursively into source/argument
    /// (spec §4.2 "Reset").
    pub fn reset(&mut self) {
        self.output = Many::empty();
        self.done = false;
        self.successes = 0;
        if let Some(flag) = &self.entangled {
            flag.store(false, Ordering::SeqCst);
        }
        self.source.reset();
        self.argument.reset();
    }

    pub fn record_success(&mut self) {
        self.successes += 1;
        self.done = true;
        if let Some(flag) = &self.entangled {
            flag.store(true, Ordering::SeqCst);
        }
    }

    pub fn succeeded(&self) -> bool {
        self.successes > 0
    }

    /// `hash(verb_meta) ⊕ hash(source) ⊕ hash(argument) ⊕ hash(output)`
    /// (spec §3 "Identity hash").
    pub fn hash(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        self.verb_meta.hash(&mut hasher);
        let meta_hash = hasher.finish();
        meta_hash ^ self.source.hash() ^ self.argument.hash() ^ self.output.hash()
    }

    /// Invariant check: `successes==0 ⇔ not done` (spec §3, testable P4-adjacent).
    pub fn invariant_holds(&self) -> bool {
        (self.successes == 0) == (!self.done)
    }
}

impl PartialEq for Verb {
    fn eq(&self, other: &Self) -> bool {
        self.verb_meta == other.verb_meta
            && self.source == other.source
            && self.argument == other.argument
            && self.output == other.output
            && self.charge == other.charge
            && self.state == other.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::many::{MetaKind, Scalar};
    use crate::intern::Interner;

    fn meta(interner: &mut Interner, kind: MetaKind, name: &str) -> Meta {
        Meta::new(kind, interner.intern(name))
    }

    #[test]
    fn new_verb_is_not_done_and_has_zero_successes() {
        let mut interner = Interner::new();
        let v = Verb::new(meta(&mut interner, MetaKind::Verb, "Associate"));
        assert!(v.invariant_holds());
        assert!(!v.done);
        assert_eq!(v.successes, 0);
    }

    #[test]
    fn setting_argument_clears_output_and_done() {
        let mut interner = Interner::new();
        let mut v = Verb::new(meta(&mut interner, MetaKind::Verb, "Associate"));
        v.output.push_scalar(Scalar::Real(1.0));
        v.done = true;
        v.successes = 1;
        let v = v.with_argument(Many::empty());
        assert!(v.output.is_empty());
        assert!(!v.done);
        assert_eq!(v.successes, 0);
    }

    #[test]
    fn reset_descends_into_source_and_argument() {
        let mut interner = Interner::new();
        let inner = Verb::new(meta(&mut interner, MetaKind::Verb, "Add"));
        let mut outer = Verb::new(meta(&mut interner, MetaKind::Verb, "Do"));
        let mut inner_scope = Many::empty();
        inner_scope.push(crate::many::Element::Verb(Box::new(inner)));
        outer.source = inner_scope;
        outer.done = true;
        outer.successes = 1;
        outer.reset();
        assert!(!outer.done);
        if let Some(crate::many::Element::Verb(v)) = outer.source.get(0) {
            assert!(!v.done);
        } else {
            panic!("expected nested verb element");
        }
    }

    #[test]
    fn hash_is_pure_function_of_parts() {
        let mut interner = Interner::new();
        let v1 = Verb::new(meta(&mut interner, MetaKind::Verb, "Add"));
        let v2 = Verb::new(meta(&mut interner, MetaKind::Verb, "Add"));
        assert_eq!(v1.hash(), v2.hash());
        let v3 = Verb::new(meta(&mut interner, MetaKind::Verb, "Subtract"));
        assert_ne!(v1.hash(), v3.hash());
    }

    #[test]
    fn record_success_sets_done() {
        let mut interner = Interner::new();
        let mut v = Verb::new(meta(&mut interner, MetaKind::Verb, "Add"));
        v.record_success();
        assert!(v.done);
        assert_eq!(v.successes, 1);
        assert!(v.invariant_holds());
    }
}
