//! Structural hashing for `Many` and friends, guarded against pathological
//! recursion depth (DESIGN NOTES §9).

use super::{Element, Many, Scalar};
use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

pub fn hash_many(many: &Many, depth: usize) -> u64 {
    let mut hasher = FnvHasher::default();
    hash_many_into(many, depth, &mut hasher);
    hasher.finish()
}

pub fn hash_many_into(many: &Many, depth: usize, hasher: &mut FnvHasher) {
    if depth >= super::MAX_RECURSION_DEPTH {
        "depth-guard".hash(hasher);
        return;
    }
    many.state().hash(hasher);
    many.type_meta().hash(hasher);
    for element in many.elements() {
        hash_element_into(element, depth + 1, hasher);
    }
}

fn hash_element_into(element: &Element, depth: usize, hasher: &mut FnvHasher) {
    if depth >= super::MAX_RECURSION_DEPTH {
        "depth-guard".hash(hasher);
        return;
    }
    match element {
        Element::Scalar(s) => hash_scalar_into(s, hasher),
        Element::Verb(v) => v.hash().hash(hasher),
        Element::Construct(c) => c.hash().hash(hasher),
        Element::Trait(t) => t.hash().hash(hasher),
        Element::PastPlaceholder(f) | Element::FuturePlaceholder(f) => f.hash(hasher),
        Element::MissingPastRef(id) => id.hash(hasher),
        Element::MissingFutureRef(id) => id.hash(hasher),
        Element::Scope(inner) => hash_many_into(inner, depth, hasher),
    }
}

fn hash_scalar_into(scalar: &Scalar, hasher: &mut FnvHasher) {
    match scalar {
        Scalar::Real(r) => r.to_bits().hash(hasher),
        Scalar::Byte(b) => b.hash(hasher),
        Scalar::Bool(b) => b.hash(hasher),
        Scalar::Text(t) => t.as_ref().hash(hasher),
        Scalar::Meta(m) => m.hash(hasher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::many::Scalar;

    #[test]
    fn equal_content_hashes_equal() {
        let mut a = Many::empty();
        a.push_scalar(Scalar::Real(1.0));
        let mut b = Many::empty();
        b.push_scalar(Scalar::Real(1.0));
        assert_eq!(hash_many(&a, 0), hash_many(&b, 0));
    }

    #[test]
    fn different_content_hashes_differ() {
        let mut a = Many::empty();
        a.push_scalar(Scalar::Real(1.0));
        let mut b = Many::empty();
        b.push_scalar(Scalar::Real(2.0));
        assert_ne!(hash_many(&a, 0), hash_many(&b, 0));
    }
}
