//! The reflection registry (spec §6 "Reflection registry (consumed)").
//!
//! The core treats this as an external collaborator: a read-only, process-
//! wide catalogue of types, traits, verbs, operators and their abilities.
//! `Reflection` is the trait the parser/executor/linker consume;
//! `DefaultRegistry` is this crate's own concrete instance, pre-populated
//! with the default abilities (spec §4.4.4) and the meta tokens exercised
//! by the test scenarios (spec §8). Grounded on
//! `original_source/source/reflection/`, adapted to the teacher's
//! `registry.rs` (a `HashMap`-keyed lookup table with a startup
//! registration phase rather than C++ virtual dispatch, per DESIGN NOTES §9
//! "Reflected dispatch").

use crate::intern::{Interner, Symbol};
use crate::many::{Many, Meta, MetaKind};
use crate::verb::Verb;
use std::cell::RefCell;
use std::collections::HashMap;

/// Everything the parser/executor/linker need to read from a type/trait/
/// verb/operator catalogue. A custom registry (e.g. one backed by a real
/// application's type system) need only implement this trait.
pub trait Reflection {
    fn get_meta_data(&self, token: &str) -> Option<Meta>;
    fn get_meta_trait(&self, token: &str) -> Option<Meta>;
    fn get_meta_constant(&self, token: &str) -> Option<Meta>;
    fn get_meta_verb(&self, token: &str) -> Option<Meta>;
    fn get_operator(&self, token: &str) -> Option<Meta>;

    /// `(verb meta, precedence, is_reverse_token)` for a reflected operator
    /// spelling (spec §4.3.3 "look up precedence from reflection"; "if the
    /// operator matched the reverse token, set mass = -1").
    fn operator_info(&self, token: &str) -> Option<(Meta, u32, bool)>;

    /// Longest-unique-prefix disambiguation among every registered token,
    /// across all four meta kinds (spec §4.3.2 step 3).
    fn disambiguate_meta(&self, token: &str) -> Option<Meta>;

    fn casts_to(&self, from: Meta, to: Meta) -> bool;
    fn is_abstract(&self, meta: Meta) -> bool;
    fn bases(&self, meta: Meta) -> Vec<Meta>;
    fn default_constructor(&self, meta: Meta) -> Option<Meta>;
    fn producer(&self, meta: Meta) -> Option<Meta>;
    fn precedence(&self, meta: Meta) -> u32;

    /// True iff `meta` names the verb base type (the insertion-rule table's
    /// "is the verb base" case, spec §4.3.3).
    fn is_verb_base(&self, meta: Meta) -> bool;

    /// Phase 1 dispatch (spec §4.4.1): `Some(success)` if a user-provided
    /// dispatcher claimed this verb for this type, `None` to fall through.
    fn dispatch_custom(&self, type_meta: Meta, verb: &mut Verb, context: &mut Many) -> Option<bool>;

    /// Phase 2 dispatch: a reflected ability matching `verb.verb_meta` on
    /// `type_meta` or one of its bases.
    fn dispatch_reflected(&self, type_meta: Meta, verb: &mut Verb, context: &mut Many) -> Option<bool>;

    /// Intern a raw token string into this registry's symbol table so
    /// callers (the lexer/parser) can build `Meta` values comparable with
    /// this registry's own.
    fn intern(&self, token: &str) -> Symbol;

    fn resolve(&self, symbol: Symbol) -> String;
}

#[derive(Debug, Clone, Default)]
struct TypeInfo {
    abstract_: bool,
    bases: Vec<Meta>,
    producer: Option<Meta>,
    default_constructor: Option<Meta>,
}

/// This crate's own registry: no custom/reflected abilities are registered
/// (every verb falls through to the default abilities in
/// `crate::executor::defaults`), but the full set of types, traits, verb
/// tokens and operator precedences the test scenarios (spec §8) exercise
/// are pre-populated.
pub struct DefaultRegistry {
    interner: RefCell<Interner>,
    data: RefCell<HashMap<Symbol, TypeInfo>>,
    traits: RefCell<HashMap<Symbol, ()>>,
    constants: RefCell<HashMap<Symbol, ()>>,
    verbs: RefCell<HashMap<Symbol, u32>>,
    operators: RefCell<HashMap<String, (Symbol, u32, bool)>>, // token -> (verb symbol, precedence, is_reverse)
    verb_base: RefCell<Option<Symbol>>,
}

impl DefaultRegistry {
    pub fn new() -> Self {
        let registry = DefaultRegistry {
            interner: RefCell::new(Interner::new()),
            data: RefCell::new(HashMap::new()),
            traits: RefCell::new(HashMap::new()),
            constants: RefCell::new(HashMap::new()),
            verbs: RefCell::new(HashMap::new()),
            operators: RefCell::new(HashMap::new()),
            verb_base: RefCell::new(None),
        };
        registry.register_defaults();
        registry
    }

    fn register_data(&self, token: &str, abstract_: bool, bases: &[&str]) -> Symbol {
        let sym = self.interner.borrow_mut().intern(token);
        let base_syms = bases.iter().map(|b| self.interner.borrow_mut().intern(b)).collect::<Vec<_>>();
        let base_metas = base_syms.into_iter().map(|s| Meta::new(MetaKind::Data, s)).collect();
        self.data.borrow_mut().insert(sym, TypeInfo { abstract_, bases: base_metas, producer: None, default_constructor: None });
        sym
    }

    fn register_trait(&self, token: &str) -> Symbol {
        let sym = self.interner.borrow_mut().intern(token);
        self.traits.borrow_mut().insert(sym, ());
        sym
    }

    fn register_constant(&self, token: &str) -> Symbol {
        let sym = self.interner.borrow_mut().intern(token);
        self.constants.borrow_mut().insert(sym, ());
        sym
    }

    fn register_verb(&self, token: &str, precedence: u32) -> Symbol {
        let sym = self.interner.borrow_mut().intern(token);
        self.verbs.borrow_mut().insert(sym, precedence);
        sym
    }

    fn register_operator(&self, operator_token: &str, verb_token: &str, precedence: u32, is_reverse: bool) {
        let verb_sym = self.interner.borrow_mut().intern(verb_token);
        self.operators.borrow_mut().insert(operator_token.to_string(), (verb_sym, precedence, is_reverse));
    }

    /// Pre-registration of: the verb base type; default verb tokens and
    /// their reflected-operator spellings (spec §4.4.4, Exponent highest,
    /// then Multiply/Divide/Modulate, then Add/Subtract, comparisons
    /// loosest); and the concrete types/traits/constants the scenarios in
    /// spec §8 reference (`index::many`, `Name`, `A::Text`, `Thing`,
    /// `User`, `Universe`).
    fn register_defaults(&self) {
        let verb_base = self.register_data("Verb", true, &[]);
        *self.verb_base.borrow_mut() = Some(verb_base);

        self.register_data("Number", true, &[]);
        self.register_data("Text", true, &[]);
        self.register_data("A::Text", false, &["Text"]);
        self.register_data("Thing", false, &[]);
        self.register_data("User", false, &[]);
        self.register_data("Universe", false, &[]);
        self.register_trait("Name");
        self.register_constant("index::many");

        self.register_verb("Do", 0);
        self.register_verb("Undo", 0);
        self.register_verb("Interpret", 0);
        self.register_verb("Associate", 0);
        self.register_verb("Disassociate", 0);
        self.register_verb("Select", 0);
        self.register_verb("Deselect", 0);
        self.register_verb("Create", 0);
        self.register_verb("Destroy", 0);
        self.register_verb("Catenate", 0);
        self.register_verb("Split", 0);
        self.register_verb("Conjunct", 0);
        self.register_verb("Disjunct", 0);
        self.register_verb("Add", 1);
        self.register_verb("Multiply", 2);
        self.register_verb("Divide", 2);
        self.register_verb("Modulate", 2);
        self.register_verb("Exponent", 3);
        self.register_verb("Root", 3);
        self.register_verb("Compare", 0);
        self.register_verb("Equal", 0);
        self.register_verb("Lower", 0);
        self.register_verb("Greater", 0);
        self.register_verb("LowerOrEqual", 0);

        // Reflected operator spellings. `-` is the reverse token of `+`:
        // both resolve to `Add`, but `-` additionally flips mass to -1
        // (spec §4.3.3 "if the operator matched the reverse token").
        self.register_operator("+", "Add", 1, false);
        self.register_operator("-", "Add", 1, true);
        self.register_operator("*", "Multiply", 2, false);
        self.register_operator("/", "Divide", 2, false);
        self.register_operator("%", "Modulate", 2, false);
        self.register_operator("^", "Exponent", 3, false);
        self.register_operator("=", "Equal", 0, false);
        self.register_operator("<", "Lower", 0, false);
        self.register_operator(">", "Greater", 0, false);
        self.register_operator("<=", "LowerOrEqual", 0, false);
        self.register_operator("associate", "Associate", 0, false);
        self.register_operator("create", "Create", 0, false);
    }
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        DefaultRegistry::new()
    }
}

impl Reflection for DefaultRegistry {
    fn get_meta_data(&self, token: &str) -> Option<Meta> {
        let sym = self.interner.borrow().lookup(token)?;
        if self.data.borrow().contains_key(&sym) {
            Some(Meta::new(MetaKind::Data, sym))
        } else {
            None
        }
    }

    fn get_meta_trait(&self, token: &str) -> Option<Meta> {
        let sym = self.interner.borrow().lookup(token)?;
        if self.traits.borrow().contains_key(&sym) {
            Some(Meta::new(MetaKind::Trait, sym))
        } else {
            None
        }
    }

    fn get_meta_constant(&self, token: &str) -> Option<Meta> {
        let sym = self.interner.borrow().lookup(token)?;
        if self.constants.borrow().contains_key(&sym) {
            Some(Meta::new(MetaKind::Constant, sym))
        } else {
            None
        }
    }

    fn get_meta_verb(&self, token: &str) -> Option<Meta> {
        let sym = self.interner.borrow().lookup(token)?;
        if self.verbs.borrow().contains_key(&sym) {
            Some(Meta::new(MetaKind::Verb, sym))
        } else {
            None
        }
    }

    fn get_operator(&self, token: &str) -> Option<Meta> {
        let (verb_sym, _, _) = *self.operators.borrow().get(token)?;
        Some(Meta::new(MetaKind::Verb, verb_sym))
    }

    fn operator_info(&self, token: &str) -> Option<(Meta, u32, bool)> {
        let (verb_sym, precedence, is_reverse) = *self.operators.borrow().get(token)?;
        Some((Meta::new(MetaKind::Verb, verb_sym), precedence, is_reverse))
    }

    fn disambiguate_meta(&self, token: &str) -> Option<Meta> {
        if let Some(m) = self.get_meta_data(token) {
            return Some(m);
        }
        if let Some(m) = self.get_meta_trait(token) {
            return Some(m);
        }
        if let Some(m) = self.get_meta_constant(token) {
            return Some(m);
        }
        if let Some(m) = self.get_meta_verb(token) {
            return Some(m);
        }
        // No exact match: fall back to the longest-unique-prefix rule
        // (spec §4.3.2 step 3). Fails (returns None) on zero or multiple
        // matches.
        let mut found: Option<Meta> = None;
        for (sym, kind) in self
            .data
            .borrow()
            .keys()
            .map(|s| (*s, MetaKind::Data))
            .chain(self.traits.borrow().keys().map(|s| (*s, MetaKind::Trait)))
            .chain(self.constants.borrow().keys().map(|s| (*s, MetaKind::Constant)))
            .chain(self.verbs.borrow().keys().map(|s| (*s, MetaKind::Verb)))
        {
            let name = self.interner.borrow().resolve(sym).to_string();
            if name.starts_with(token) {
                if found.is_some() {
                    return None;
                }
                found = Some(Meta::new(kind, sym));
            }
        }
        found
    }

    fn casts_to(&self, from: Meta, to: Meta) -> bool {
        if from == to {
            return true;
        }
        if from.kind != MetaKind::Data || to.kind != MetaKind::Data {
            return false;
        }
        let mut frontier = vec![from.token];
        let mut seen = std::collections::HashSet::new();
        let mut depth = 0;
        while let Some(sym) = frontier.pop() {
            depth += 1;
            if depth > crate::many::MAX_RECURSION_DEPTH {
                return false;
            }
            if !seen.insert(sym) {
                continue;
            }
            if sym == to.token {
                return true;
            }
            if let Some(info) = self.data.borrow().get(&sym) {
                frontier.extend(info.bases.iter().map(|b| b.token));
            }
        }
        false
    }

    fn is_abstract(&self, meta: Meta) -> bool {
        self.data.borrow().get(&meta.token).map_or(false, |info| info.abstract_)
    }

    fn bases(&self, meta: Meta) -> Vec<Meta> {
        self.data.borrow().get(&meta.token).map(|info| info.bases.clone()).unwrap_or_default()
    }

    fn default_constructor(&self, meta: Meta) -> Option<Meta> {
        self.data.borrow().get(&meta.token).and_then(|info| info.default_constructor)
    }

    fn producer(&self, meta: Meta) -> Option<Meta> {
        self.data.borrow().get(&meta.token).and_then(|info| info.producer)
    }

    fn precedence(&self, meta: Meta) -> u32 {
        self.verbs.borrow().get(&meta.token).copied().unwrap_or(0)
    }

    fn is_verb_base(&self, meta: Meta) -> bool {
        *self.verb_base.borrow() == Some(meta.token)
    }

    fn dispatch_custom(&self, _type_meta: Meta, _verb: &mut Verb, _context: &mut Many) -> Option<bool> {
        None
    }

    fn dispatch_reflected(&self, _type_meta: Meta, _verb: &mut Verb, _context: &mut Many) -> Option<bool> {
        None
    }

    fn intern(&self, token: &str) -> Symbol {
        self.interner.borrow_mut().intern(token)
    }

    fn resolve(&self, symbol: Symbol) -> String {
        self.interner.borrow().resolve(symbol).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_base_is_recognised() {
        let registry = DefaultRegistry::new();
        let verb_meta = registry.get_meta_data("Verb").unwrap();
        assert!(registry.is_verb_base(verb_meta));
        let thing_meta = registry.get_meta_data("Thing").unwrap();
        assert!(!registry.is_verb_base(thing_meta));
    }

    #[test]
    fn a_text_casts_to_text_base() {
        let registry = DefaultRegistry::new();
        let a_text = registry.get_meta_data("A::Text").unwrap();
        let text = registry.get_meta_data("Text").unwrap();
        assert!(registry.casts_to(a_text, text));
        assert!(registry.is_abstract(text));
        assert!(!registry.is_abstract(a_text));
    }

    #[test]
    fn reflected_minus_is_reverse_of_plus() {
        let registry = DefaultRegistry::new();
        let (plus_meta, _, plus_reverse) = registry.operator_info("+").unwrap();
        let (minus_meta, _, minus_reverse) = registry.operator_info("-").unwrap();
        assert_eq!(plus_meta, minus_meta);
        assert!(!plus_reverse);
        assert!(minus_reverse);
    }

    #[test]
    fn exponent_binds_tighter_than_multiply_binds_tighter_than_add() {
        let registry = DefaultRegistry::new();
        let (_, add_prec, _) = registry.operator_info("-").unwrap();
        let (_, mul_prec, _) = registry.operator_info("*").unwrap();
        let (_, pow_prec, _) = registry.operator_info("^").unwrap();
        assert!(pow_prec > mul_prec);
        assert!(mul_prec > add_prec);
    }

    #[test]
    fn scenario_tokens_resolve() {
        let registry = DefaultRegistry::new();
        assert!(registry.get_meta_constant("index::many").is_some());
        assert!(registry.get_meta_trait("Name").is_some());
        assert!(registry.get_meta_data("A::Text").is_some());
        assert!(registry.get_meta_data("Thing").is_some());
        assert!(registry.get_meta_data("User").is_some());
        assert!(registry.get_meta_data("Universe").is_some());
        assert!(registry.get_meta_verb("Associate").is_some());
        assert!(registry.get_meta_verb("Create").is_some());
    }

    #[test]
    fn disambiguate_meta_finds_exact_token_across_kinds() {
        let registry = DefaultRegistry::new();
        let direct = registry.get_meta_data("Thing").unwrap();
        let disambiguated = registry.disambiguate_meta("Thing").unwrap();
        assert_eq!(direct, disambiguated);
    }
}
