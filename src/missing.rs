//! Missing points (C2): placeholders waiting to be filled from past (`?`)
//! or future (`??`) context (spec §3 "Missing point", §4.5).
//!
//! Per DESIGN NOTES §9, a missing point's `above`/`below` links must never
//! own the pointed-to point, so they are never `Rc`/`Box` — they are
//! indices into a `MissingArena` that the owning `Temporal` (or a bare
//! parse, before any flow exists) holds. Grounded on
//! `original_source/source/inner/Missing.hpp`/`.cpp` and
//! `source/inner/Entangled.hpp`.

use crate::many::{Many, Meta};
use crate::reflect::Reflection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissingId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingKind {
    Past,
    Future,
}

/// A single missing point. `above` observes (does not own) its enclosing
/// future point; `below` lists (observes) the future points nested inside
/// its own content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Missing {
    pub kind: MissingKind,
    pub filter: Vec<Meta>,
    pub content: Many,
    pub priority: f64,
    pub above: Option<MissingId>,
    pub below: Vec<MissingId>,
    pub suspended: bool,
}

impl Missing {
    pub fn new(kind: MissingKind, filter: Vec<Meta>, priority: f64) -> Self {
        Missing {
            kind,
            filter,
            content: Many::empty(),
            priority,
            above: None,
            below: Vec::new(),
            suspended: false,
        }
    }

    /// A missing point is satisfied iff its content contains at least one
    /// element whose type matches the filter (or the filter is empty).
    pub fn is_satisfied(&self, registry: &dyn Reflection) -> bool {
        if self.filter.is_empty() {
            return !self.content.is_empty();
        }
        self.content.any_element_casts_to(&self.filter, registry)
    }

    /// Would this missing point accept `value`? Per spec P5, a
    /// `MissingFuture` with a non-empty filter never accepts material
    /// whose runtime type fails `casts_to_meta` for *every* filter element.
    pub fn accepts(&self, value: &Many, registry: &dyn Reflection) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        self.filter.iter().any(|m| value.casts_to_meta(*m, registry))
    }
}

/// Arena owning all `Missing` points produced by a compile/link pass.
/// `Temporal` owns one per flow; a bare `Code::parse` that encounters `?`/
/// `??` before any flow exists never allocates into an arena at all — see
/// `crate::many::Element::PastPlaceholder`/`FuturePlaceholder`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissingArena {
    slots: Vec<Missing>,
}

impl MissingArena {
    pub fn new() -> Self {
        MissingArena { slots: Vec::new() }
    }

    pub fn alloc(&mut self, missing: Missing) -> MissingId {
        let id = MissingId(self.slots.len() as u32);
        self.slots.push(missing);
        id
    }

    pub fn get(&self, id: MissingId) -> &Missing {
        &self.slots[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: MissingId) -> &mut Missing {
        &mut self.slots[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MissingId, &Missing)> {
        self.slots.iter().enumerate().map(|(i, m)| (MissingId(i as u32), m))
    }

    /// Reset every point's runtime-mutable fields without touching the
    /// graph shape (used by `Temporal::reset`, spec P3's "for every verb in
    /// every stack" extends analogously to missing points).
    pub fn reset_runtime_state(&mut self) {
        for slot in &mut self.slots {
            slot.suspended = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::many::Scalar;

    #[test]
    fn empty_filter_is_satisfied_by_any_nonempty_content() {
        let mut m = Missing::new(MissingKind::Future, Vec::new(), 0.0);
        let registry = crate::reflect::DefaultRegistry::new();
        assert!(!m.is_satisfied(&registry));
        m.content.push_scalar(Scalar::Real(1.0));
        assert!(m.is_satisfied(&registry));
    }

    #[test]
    fn arena_alloc_and_get_roundtrip() {
        let mut arena = MissingArena::new();
        let id = arena.alloc(Missing::new(MissingKind::Past, Vec::new(), 0.0));
        assert_eq!(arena.get(id).kind, MissingKind::Past);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn above_below_are_plain_indices_not_owning() {
        let mut arena = MissingArena::new();
        let parent = arena.alloc(Missing::new(MissingKind::Future, Vec::new(), 1.0));
        let child = arena.alloc(Missing::new(MissingKind::Future, Vec::new(), 2.0));
        arena.get_mut(child).above = Some(parent);
        arena.get_mut(parent).below.push(child);
        assert_eq!(arena.get(child).above, Some(parent));
        assert_eq!(arena.get(parent).below, vec![child]);
    }
}
