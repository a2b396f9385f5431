//! `Construct` (C2): "a request to build an instance of `type_meta`
//! parameterised by `descriptor`" (spec §3). Grounded on
//! `original_source/Construct.hpp`/`.cpp` and `source/Construct.hpp`.

use crate::charge::Charge;
use crate::many::{Many, Meta};
use crate::reflect::Reflection;
use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Construct {
    pub type_meta: Meta,
    pub descriptor: Many,
    pub charge: Charge,
}

impl Construct {
    pub fn new(type_meta: Meta) -> Self {
        Construct { type_meta, descriptor: Many::empty(), charge: Charge::default() }
    }

    pub fn with_descriptor(mut self, descriptor: Many) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Setting charge never changes the descriptor's hash (spec §4.2
    /// invariant) — charge and descriptor are hashed independently here.
    pub fn with_charge(mut self, charge: Charge) -> Self {
        self.charge = charge;
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.charge = self.charge.with_mass(mass);
        self
    }

    pub fn priority(mut self, priority: f64) -> Self {
        self.charge = self.charge.with_priority(priority);
        self
    }

    /// A construct is statically creatable iff its type has no producer
    /// requirement (spec §3).
    pub fn is_statically_creatable(&self, registry: &dyn Reflection) -> bool {
        registry.producer(self.type_meta).is_none()
    }

    pub fn descriptor_hash(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        self.descriptor.hash().hash(&mut hasher);
        hasher.finish()
    }

    pub fn hash(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        self.type_meta.hash(&mut hasher);
        let type_hash = hasher.finish();
        type_hash ^ self.descriptor.hash()
    }
}

impl PartialEq for Construct {
    fn eq(&self, other: &Self) -> bool {
        self.type_meta == other.type_meta && self.descriptor == other.descriptor && self.charge == other.charge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;
    use crate::many::MetaKind;

    #[test]
    fn charge_change_does_not_change_descriptor_hash() {
        let mut interner = Interner::new();
        let meta = Meta::new(MetaKind::Data, interner.intern("Thing"));
        let c1 = Construct::new(meta);
        let before = c1.descriptor_hash();
        let c2 = c1.mass(5.0);
        assert_eq!(before, c2.descriptor_hash());
    }

    #[test]
    fn equal_constructs_hash_equal() {
        let mut interner = Interner::new();
        let meta = Meta::new(MetaKind::Data, interner.intern("Thing"));
        let a = Construct::new(meta);
        let b = Construct::new(meta);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a, b);
    }
}
