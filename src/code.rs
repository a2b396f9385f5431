//! `Code`: a text wrapper around Code-language source (spec §6 "Public API
//! of the core"), plus the handful of classification predicates the
//! teacher's `Code.hpp` exposes as `StartsWith*`/`EndsWith*`/`RightOf`/
//! `LeftOf`. Parsing itself is delegated to `parser::parse_code`; this
//! module is the thin, cheaply-cloneable handle callers actually hold.

use crate::error::{ParseError, ParseWarning};
use crate::many::Many;
use crate::reflect::Reflection;
use std::rc::Rc;

/// Code-language source text. Cloning is `Rc::clone` (spec §3 "Ownership
/// and cycles" applies equally to `Text`-like values).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Code(Rc<str>);

impl Code {
    pub fn new(text: impl Into<Rc<str>>) -> Self {
        Code(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses this text against `registry` (spec §4.3, `Code::Parse`).
    /// `optimize` folds fully-static scalar sub-trees (spec scenario 3).
    /// Unconsumed trailing input is reported as a warning, not an error
    /// (spec §4.3.5) — the returned `Vec` holds zero or one entries.
    pub fn parse(&self, registry: &dyn Reflection, optimize: bool) -> Result<(Many, Vec<ParseWarning>), ParseError> {
        let (many, warning) = crate::parser::parse_code(&self.0, registry, optimize)?;
        if let Some(ref w) = warning {
            log::warn!(target: "verbflow::parser", "{} (byte {})", w.message, w.position);
        }
        Ok((many, warning.into_iter().collect()))
    }

    /// Everything from byte offset `n` onward.
    pub fn right_of(&self, n: usize) -> Code {
        Code(Rc::from(&self.0[n.min(self.0.len())..]))
    }

    /// Everything before byte offset `n`.
    pub fn left_of(&self, n: usize) -> Code {
        Code(Rc::from(&self.0[..n.min(self.0.len())]))
    }

    fn first_byte(&self) -> Option<u8> {
        self.0.as_bytes().first().copied()
    }

    fn last_byte(&self) -> Option<u8> {
        self.0.as_bytes().last().copied()
    }

    /// One of the built-in operator/delimiter spellings (spec §4.3.1's
    /// closed operator set): scopes, literal delimiters, past/future/const
    /// markers, and the four charge operators.
    pub fn starts_with_special(&self) -> bool {
        matches!(
            self.first_byte(),
            Some(b'(' | b')' | b'[' | b']' | b'|' | b'"' | b'`' | b'\'' | b'?' | b'*' | b'^' | b'@' | b'!')
        )
    }

    pub fn starts_with_skippable(&self) -> bool {
        matches!(self.first_byte(), Some(b) if b.is_ascii_whitespace())
    }

    pub fn ends_with_skippable(&self) -> bool {
        matches!(self.last_byte(), Some(b) if b.is_ascii_whitespace())
    }

    pub fn starts_with_letter(&self) -> bool {
        matches!(self.first_byte(), Some(b) if b.is_ascii_alphabetic() || b == b'_')
    }

    pub fn ends_with_letter(&self) -> bool {
        matches!(self.last_byte(), Some(b) if b.is_ascii_alphabetic() || b == b'_')
    }

    pub fn starts_with_digit(&self) -> bool {
        matches!(self.first_byte(), Some(b) if b.is_ascii_digit())
    }

    pub fn ends_with_digit(&self) -> bool {
        matches!(self.last_byte(), Some(b) if b.is_ascii_digit())
    }

    /// Whether a reflected operator spelling starts at byte offset `n`
    /// (used by callers probing for an operator before committing to a
    /// sub-parse, mirroring the teacher's `Code::StartsWithOperator`).
    pub fn starts_with_operator(&self, n: usize) -> bool {
        self.0[n.min(self.0.len())..]
            .as_bytes()
            .first()
            .is_some_and(|&b| !b.is_ascii_whitespace() && !b.is_ascii_alphanumeric())
    }
}

impl From<&str> for Code {
    fn from(s: &str) -> Self {
        Code(Rc::from(s))
    }
}

impl From<String> for Code {
    fn from(s: String) -> Self {
        Code(Rc::from(s.as_str()))
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::many::Element;
    use crate::reflect::DefaultRegistry;

    #[test]
    fn parse_delegates_to_the_parser_module() {
        let registry = DefaultRegistry::new();
        let code = Code::from("2*8.75+14^2");
        let (many, warnings) = code.parse(&registry, false).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(many.len(), 1);
        assert!(matches!(many.get(0), Some(Element::Verb(_))));
    }

    #[test]
    fn left_and_right_of_split_on_byte_offset() {
        let code = Code::from("Create!-1(Thing)");
        assert_eq!(code.left_of(9).as_str(), "Create!-1");
        assert_eq!(code.right_of(9).as_str(), "(Thing)");
    }

    #[test]
    fn starts_with_predicates_classify_the_first_byte() {
        assert!(Code::from("(Thing)").starts_with_special());
        assert!(Code::from("  x").starts_with_skippable());
        assert!(Code::from("Thing").starts_with_letter());
        assert!(Code::from("42").starts_with_digit());
        assert!(!Code::from("").starts_with_special());
    }

    #[test]
    fn ends_with_predicates_classify_the_last_byte() {
        assert!(Code::from("Thing ").ends_with_skippable());
        assert!(Code::from("Thing").ends_with_letter());
        assert!(Code::from("Thing1").ends_with_digit());
    }
}
