//! `Temporal` (C5, spec §4.5): the time-based linker that turns a pushed
//! scope into a running flow — a priority stack executed immediately, plus
//! time/frequency stacks of sub-flows executed on `update`.
//!
//! Grounded on `original_source/source/Temporal.hpp`/`.cpp`. Two
//! simplifications from the C++ original, recorded in DESIGN.md: the time
//! and frequency stacks are flat `Vec<(f64, Temporal)>`s linearly scanned
//! rather than the original's sorted tree maps (this crate has no ordered-
//! float dependency in the teacher's stack), and `Link`'s branch/fork
//! machinery (`inner/Fork.hpp`) is reduced to the single-assignment rule
//! spec §4.5.2 actually names: first unsuspended, accepting future point,
//! in priority order.

pub mod dump;
pub mod link;

use crate::error::{FlowError, LinkError};
use crate::executor;
use crate::many::Many;
use crate::missing::MissingArena;
use crate::reflect::Reflection;

/// One temporal flow. Cheaply nested: time/frequency entries own a child
/// `Temporal` that shares nothing with its parent except by `merge`.
pub struct Temporal {
    environment: Many,
    priority_stack: Many,
    missing: MissingArena,
    time_stack: Vec<(f64, Temporal)>,
    frequency_stack: Vec<(f64, Temporal)>,
    start: f64,
    now: f64,
}

impl Temporal {
    /// A fresh flow always carries one open future missing point at the
    /// back of its priority stack (spec §4.5.1 invariant "always at least
    /// one such point").
    pub fn new(environment: Many) -> Self {
        let mut missing = MissingArena::new();
        let mut priority_stack = Many::empty();
        link::seed_open_future(&mut priority_stack, &mut missing);
        Temporal { environment, priority_stack, missing, time_stack: Vec::new(), frequency_stack: Vec::new(), start: 0.0, now: 0.0 }
    }

    pub fn child(environment: Many) -> Self {
        Temporal::new(environment)
    }

    pub fn environment(&self) -> &Many {
        &self.environment
    }

    pub fn priority_stack(&self) -> &Many {
        &self.priority_stack
    }

    pub fn missing(&self) -> &MissingArena {
        &self.missing
    }

    /// Spec §6 `is_valid()`: true iff any stack carries content.
    pub fn is_valid(&self) -> bool {
        !self.priority_stack.is_empty() || !self.time_stack.is_empty() || !self.frequency_stack.is_empty()
    }

    /// Pushes `input` into the flow (spec §4.5.1/§6 `push(input) -> Many`):
    /// compiles it (promoting bare `?`/`??` placeholders into arena-backed
    /// missing points and splitting off charged sub-scopes into the time/
    /// frequency stacks), links it against the available stacks, then runs
    /// the same zero-duration step `update` takes at time zero and returns
    /// the side effects that step produced (`original_source/source/
    /// Temporal.cpp`'s `PushInner` calls `Update({}, sideeffects)` and
    /// returns `sideeffects` rather than the linked material itself).
    pub fn push(&mut self, input: Many, registry: &dyn Reflection) -> Result<Many, FlowError> {
        let compiled = link::compile(input, &mut self.missing, 0.0);
        link::link(self, compiled, registry)?;
        let (_, side_effects) = self.update(0.0, registry)?;
        Ok(side_effects)
    }

    /// Executes the priority stack (spec §4.5.3 "executes immediately on
    /// push/at time zero"), then advances `dt` through the time/frequency
    /// stacks (spec §4.5.3 "Update(dt)").
    pub fn update(&mut self, dt: f64, registry: &dyn Reflection) -> Result<(bool, Many), FlowError> {
        let mut side_effects = Many::empty();
        if self.start == self.now {
            let mut env = self.environment.clone();
            let resolved = link::resolve(&self.priority_stack, &self.missing, registry);
            let (ok, output) = executor::execute(&resolved, &mut env, registry)?;
            self.environment = env;
            if ok {
                side_effects.smart_push(output);
            }
        }

        if dt == 0.0 {
            return Ok((true, side_effects));
        }
        self.now += dt;

        for (period, child) in &mut self.frequency_stack {
            let mut ticks = (child.now - child.start) / *period;
            while ticks >= 1.0 {
                child.reset();
                let (_, out) = child.update(0.0, registry)?;
                side_effects.smart_push(out);
                ticks -= 1.0;
            }
        }

        for (at, child) in &mut self.time_stack {
            if self.now < *at {
                continue;
            }
            let (_, out) = child.update(dt, registry)?;
            side_effects.smart_push(out);
        }

        Ok((true, side_effects))
    }

    /// Resets progress throughout the flow (spec §4.5.3 "Reset"): clears
    /// every verb's `done`/`output` recursively and the arena's runtime
    /// state, without touching the graph shape.
    pub fn reset(&mut self) {
        self.start = 0.0;
        self.now = 0.0;
        self.priority_stack.reset();
        self.missing.reset_runtime_state();
        for (_, child) in &mut self.time_stack {
            child.reset();
        }
        for (_, child) in &mut self.frequency_stack {
            child.reset();
        }
    }

    /// Concatenates `other`'s priority stack into this flow's and recurses
    /// into matching time/frequency entries, inserting new ones where
    /// `other` has a point this flow lacks (spec §4.5.3 `merge`).
    pub fn merge(&mut self, other: &Temporal) {
        self.priority_stack = self.priority_stack.catenate(&other.priority_stack);

        for (at, other_child) in &other.time_stack {
            match self.time_stack.iter_mut().find(|(k, _)| k == at) {
                Some((_, mine)) => mine.merge(other_child),
                None => self.time_stack.push((*at, clone_shallow(other_child))),
            }
        }
        for (period, other_child) in &other.frequency_stack {
            match self.frequency_stack.iter_mut().find(|(k, _)| k == period) {
                Some((_, mine)) => mine.merge(other_child),
                None => self.frequency_stack.push((*period, clone_shallow(other_child))),
            }
        }
    }

    /// A rendered, human-readable snapshot of every non-empty stack (spec
    /// §4.5.3 `dump()`), via `crate::temporal::dump`.
    pub fn dump(&self, registry: &dyn Reflection) -> String {
        dump::dump_temporal(self, registry)
    }
}

/// `Temporal` owns no resources a bit-copy would corrupt (its `MissingArena`
/// is self-contained, spec §3 "Ownership and cycles"), so `merge`'s
/// insert-on-miss path can afford a structural clone rather than a move.
fn clone_shallow(other: &Temporal) -> Temporal {
    Temporal {
        environment: other.environment.clone(),
        priority_stack: other.priority_stack.clone(),
        missing: other.missing.clone(),
        time_stack: other.time_stack.iter().map(|(k, v)| (*k, clone_shallow(v))).collect(),
        frequency_stack: other.frequency_stack.iter().map(|(k, v)| (*k, clone_shallow(v))).collect(),
        start: other.start,
        now: other.now,
    }
}

pub(crate) fn link_error(message: impl Into<String>) -> FlowError {
    FlowError::Link(LinkError::new(message))
}
