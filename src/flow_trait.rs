//! `Trait` (C2): a named container whose identity is the pair
//! (trait_meta, content), distinct from its content's own identity (spec §3
//! "Trait"). Grounded on `original_source/source/Trait.hpp`/`.cpp`.

use crate::many::Meta;
use crate::many::Many;
use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trait {
    pub trait_meta: Meta,
    pub content: Many,
}

impl Trait {
    pub fn new(trait_meta: Meta, content: Many) -> Self {
        Trait { trait_meta, content }
    }

    /// `hash(trait_meta) ⊕ hash(content)` — a trait with the same name but
    /// different content hashes differently, and vice versa.
    pub fn hash(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        self.trait_meta.hash(&mut hasher);
        let meta_hash = hasher.finish();
        meta_hash ^ self.content.hash()
    }
}

impl PartialEq for Trait {
    fn eq(&self, other: &Self) -> bool {
        self.trait_meta == other.trait_meta && self.content == other.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;
    use crate::many::{MetaKind, Scalar};

    #[test]
    fn same_name_different_content_hashes_differ() {
        let mut interner = Interner::new();
        let meta = Meta::new(MetaKind::Trait, interner.intern("Name"));
        let mut c1 = Many::empty();
        c1.push_scalar(Scalar::Real(1.0));
        let mut c2 = Many::empty();
        c2.push_scalar(Scalar::Real(2.0));
        let t1 = Trait::new(meta, c1);
        let t2 = Trait::new(meta, c2);
        assert_ne!(t1.hash(), t2.hash());
        assert_ne!(t1, t2);
    }

    #[test]
    fn identical_traits_are_equal() {
        let mut interner = Interner::new();
        let meta = Meta::new(MetaKind::Trait, interner.intern("Name"));
        let mut content = Many::empty();
        content.push_scalar(Scalar::Text(std::rc::Rc::from("Alice")));
        let t1 = Trait::new(meta, content.clone());
        let t2 = Trait::new(meta, content);
        assert_eq!(t1, t2);
        assert_eq!(t1.hash(), t2.hash());
    }
}
