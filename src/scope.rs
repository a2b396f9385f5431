//! Scope semantics (spec §3 "Scope", §4.4.2): a `Many` used as an
//! executable sequence is *AND* by default, *OR* if its or-branching bit
//! is set. This module holds the semantic predicates the executor
//! consumes; the raw bit manipulation lives on `ManyState`/`Many` itself
//! (`is_or`/`is_and`/`make_or`/`make_and`). Grounded on
//! `original_source/Scope.cpp`/`.hpp` and `source/Scope.cpp`.

use crate::many::Many;

/// Spec §4.4.2: "If `s.is_or` and `|s| > 1`: OR. Otherwise: AND." A
/// single-element or-branching container still executes as AND — there is
/// nothing to branch over.
pub fn is_or_scope(scope: &Many) -> bool {
    scope.is_or() && scope.len() > 1
}

pub fn is_and_scope(scope: &Many) -> bool {
    !is_or_scope(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::many::Scalar;

    #[test]
    fn single_element_or_branching_container_is_still_and() {
        let mut m = Many::empty().make_or();
        m.push_scalar(Scalar::Real(1.0));
        assert!(is_and_scope(&m));
        assert!(!is_or_scope(&m));
    }

    #[test]
    fn multi_element_or_branching_container_is_or() {
        let mut m = Many::empty().make_or();
        m.push_scalar(Scalar::Real(1.0));
        m.push_scalar(Scalar::Real(2.0));
        assert!(is_or_scope(&m));
        assert!(!is_and_scope(&m));
    }

    #[test]
    fn default_container_is_and() {
        let mut m = Many::empty();
        m.push_scalar(Scalar::Real(1.0));
        m.push_scalar(Scalar::Real(2.0));
        assert!(is_and_scope(&m));
    }
}
