//! Recursive-descent, shunting-yard-by-precedence parser for Code text
//! (C3, spec §4.3). Grounded on `original_source/Code.cpp`/`GASM.cpp` for
//! the grammar; the checkpoint/restore idiom (`ParserGuard`) is carried
//! near-verbatim from the teacher's `src/parser/mod.rs`.

mod charge_parse;
mod operators;

#[cfg(test)]
mod tests;

use crate::error::{ParseError, ParseWarning};
use crate::lexer::Lexer;
use crate::many::{Many, Scalar};
use crate::reflect::Reflection;
use crate::token::{Token, TokenKind};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Recursion guard shared with `Many`'s own structural-recursion limit
/// (DESIGN NOTES §9 "Deep-equality recursion").
const MAX_PARSE_DEPTH: usize = crate::many::MAX_RECURSION_DEPTH;

#[derive(Clone, Copy)]
struct ParserCheckpoint {
    pos: usize,
    pending_const: bool,
}

pub(super) struct ParserGuard<'p, 'a> {
    parser: &'p mut Parser<'a>,
    checkpoint: ParserCheckpoint,
    committed: bool,
}

impl<'p, 'a> ParserGuard<'p, 'a> {
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl<'p, 'a> Drop for ParserGuard<'p, 'a> {
    fn drop(&mut self) {
        if !self.committed {
            self.parser.restore(self.checkpoint);
        }
    }
}

impl<'p, 'a> Deref for ParserGuard<'p, 'a> {
    type Target = Parser<'a>;
    fn deref(&self) -> &Self::Target {
        self.parser
    }
}

impl<'p, 'a> DerefMut for ParserGuard<'p, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.parser
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    source: &'a str,
    registry: &'a dyn Reflection,
    lookahead: Token,
    pending_const: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, registry: &'a dyn Reflection) -> Self {
        let mut lexer = Lexer::new(source);
        let lookahead = lexer.next_token();
        Parser { lexer, source, registry, lookahead, pending_const: false, depth: 0 }
    }

    pub(super) fn registry(&self) -> &'a dyn Reflection {
        self.registry
    }

    pub(super) fn peek(&self) -> &TokenKind {
        &self.lookahead.kind
    }

    pub(super) fn peek_start(&self) -> usize {
        self.lookahead.span.start
    }

    /// Returns the current lookahead and refills it from the token stream.
    pub(super) fn bump(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.lookahead, next)
    }

    /// Re-synchronises the lookahead after a literal sub-parser has driven
    /// the lexer directly (string/char/code bodies, spec §4.3.3).
    pub(super) fn resync(&mut self) {
        self.lookahead = self.lexer.next_token();
    }

    pub(super) fn lexer_mut(&mut self) -> &mut Lexer<'a> {
        &mut self.lexer
    }

    pub(super) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.peek_start(), message, self.source)
    }

    fn checkpoint(&self) -> ParserCheckpoint {
        ParserCheckpoint { pos: self.lookahead.span.start, pending_const: self.pending_const }
    }

    fn restore(&mut self, checkpoint: ParserCheckpoint) {
        self.lexer.set_position(checkpoint.pos);
        self.lookahead = self.lexer.next_token();
        self.pending_const = checkpoint.pending_const;
    }

    #[allow(dead_code)]
    pub(super) fn guard(&mut self) -> ParserGuard<'_, 'a> {
        let checkpoint = self.checkpoint();
        ParserGuard { parser: self, checkpoint, committed: false }
    }

    /// The grammar's core loop (spec §4.3.2): dispatches on the lookahead
    /// token's class until EOF (or, inside a scope, the matching `)`), or
    /// until a strictly-lower-precedence operator tells the caller to
    /// finish first (spec §4.3.4, standard precedence climbing: the
    /// recursive rhs call raises `min_precedence` to `precedence + 1`, so
    /// same-precedence operators chain left-associatively instead of
    /// stalling).
    pub(super) fn parse_sequence(&mut self, min_precedence: u32, stop_at_rparen: bool) -> Result<Many, ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            self.depth -= 1;
            return Err(self.error("recursion limit exceeded"));
        }
        let result = self.parse_sequence_inner(min_precedence, stop_at_rparen);
        self.depth -= 1;
        result
    }

    /// Shared by the `Mass`/`Rate` fallback arms: resolves `token` as a
    /// reflected binary operator, honouring precedence like the general
    /// `Operator` arm. Returns `Ok(false)` (no token consumed) when the
    /// caller should stop and let the enclosing, tighter-precedence call
    /// finish first.
    fn dispatch_reflected_charge_token(
        &mut self,
        token: &str,
        min_precedence: u32,
        stop_at_rparen: bool,
        many: &mut Many,
    ) -> Result<bool, ParseError> {
        let (verb_meta, precedence, is_reverse) =
            self.registry.operator_info(token).ok_or_else(|| self.error(format!("no reflected operator for '{}'", token)))?;
        if precedence < min_precedence && !many.is_empty() {
            return Ok(false);
        }
        self.bump();
        let rhs = self.parse_sequence(precedence + 1, stop_at_rparen)?;
        operators::apply_binary_operator(many, verb_meta, rhs, is_reverse);
        Ok(true)
    }

    fn parse_sequence_inner(&mut self, min_precedence: u32, stop_at_rparen: bool) -> Result<Many, ParseError> {
        let mut many = Many::empty();
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::RParen if stop_at_rparen => break,
                TokenKind::Operator(op) if op == "," => {
                    self.bump();
                }
                TokenKind::LParen => {
                    operators::parse_scope(self, &mut many)?;
                }
                TokenKind::ConstKw => {
                    self.bump();
                    self.pending_const = true;
                }
                TokenKind::PastMarker => {
                    self.bump();
                    operators::apply_past(&mut many);
                }
                TokenKind::FutureMarker => {
                    self.bump();
                    operators::apply_future(&mut many);
                }
                TokenKind::Mass | TokenKind::Rate | TokenKind::Time | TokenKind::Priority
                    if operators::can_carry_charge(&many) =>
                {
                    charge_parse::parse_charge(self, &mut many)?;
                }
                // `*`/`^` double as the Multiply/Exponent reflected operators
                // when there is no chargeable lhs to attach to (SPEC_FULL.md
                // Open Question (a)); `@`/`!` have no such dual role.
                TokenKind::Mass => {
                    if !self.dispatch_reflected_charge_token("*", min_precedence, stop_at_rparen, &mut many)? {
                        break;
                    }
                }
                TokenKind::Rate => {
                    if !self.dispatch_reflected_charge_token("^", min_precedence, stop_at_rparen, &mut many)? {
                        break;
                    }
                }
                TokenKind::Time | TokenKind::Priority => {
                    return Err(self.error("charge operator without a preceding chargeable term"));
                }
                // A lowercase word-operator spelling (`associate`, `create`,
                // spec scenario 1) only engages once a lhs is already
                // accumulated; a bare keyword at the start of a sequence is
                // always a type/trait/constant/verb token instead (e.g. the
                // capitalised `Create` in `Create!-1(...)`).
                TokenKind::Keyword(word) if !many.is_empty() && self.registry.operator_info(word).is_some() => {
                    let word = word.clone();
                    let (verb_meta, precedence, is_reverse) = self.registry.operator_info(&word).unwrap();
                    if precedence < min_precedence {
                        break;
                    }
                    self.bump();
                    let rhs = self.parse_sequence(precedence + 1, stop_at_rparen)?;
                    operators::apply_binary_operator(&mut many, verb_meta, rhs, is_reverse);
                }
                TokenKind::Keyword(_) => {
                    operators::parse_keyword(self, &mut many)?;
                }
                TokenKind::Number(n) => {
                    let n = *n;
                    self.bump();
                    many.push_scalar(Scalar::Real(n));
                }
                TokenKind::DQuote => {
                    self.bump();
                    let text = self.lexer_mut().scan_delimited_body(b'"');
                    self.resync();
                    many.push_scalar(Scalar::Text(Rc::from(text.as_str())));
                }
                TokenKind::Backtick => {
                    self.bump();
                    let text = self.lexer_mut().scan_delimited_body(b'`');
                    self.resync();
                    many.push_scalar(Scalar::Text(Rc::from(text.as_str())));
                }
                TokenKind::SQuote => {
                    self.bump();
                    let text = self.lexer_mut().scan_delimited_body(b'\'');
                    self.resync();
                    many.push_scalar(Scalar::Text(Rc::from(text.as_str())));
                }
                TokenKind::LBracket => {
                    self.bump();
                    let code = self.lexer_mut().scan_bracketed_body();
                    self.resync();
                    many.push_scalar(Scalar::Text(Rc::from(code.as_str())));
                }
                TokenKind::ByteLiteral(bytes) => {
                    let bytes = bytes.clone();
                    self.bump();
                    for b in bytes {
                        many.push_scalar(Scalar::Byte(b));
                    }
                }
                TokenKind::Operator(op) => {
                    let op = op.clone();
                    match self.registry.operator_info(&op) {
                        Some((verb_meta, precedence, is_reverse)) => {
                            if precedence < min_precedence && !many.is_empty() {
                                break;
                            }
                            self.bump();
                            let rhs = self.parse_sequence(precedence + 1, stop_at_rparen)?;
                            operators::apply_binary_operator(&mut many, verb_meta, rhs, is_reverse);
                        }
                        None => return Err(self.error(format!("unknown operator token '{}'", op))),
                    }
                }
                other => {
                    let message = format!("unexpected token {:?}", other);
                    return Err(self.error(message));
                }
            }
        }
        if self.pending_const {
            many = many.make_const();
            self.pending_const = false;
        }
        Ok(many)
    }
}

/// Parses `source` as Code (spec §6 `Code::parse`). When `optimize` is
/// true, fully-static scalar sub-trees are folded (spec scenario 3).
/// Returns a trailing warning if unconsumed characters remain after a
/// successful parse (spec §4.3.5).
pub fn parse_code(source: &str, registry: &dyn Reflection, optimize: bool) -> Result<(Many, Option<ParseWarning>), ParseError> {
    let mut parser = Parser::new(source, registry);
    let mut many = parser.parse_sequence(0, false)?;
    let warning = match parser.peek() {
        TokenKind::Eof => None,
        _ => Some(ParseWarning {
            position: parser.peek_start(),
            message: "unconsumed characters remain after parse".to_string(),
        }),
    };
    if optimize {
        many.optimize(registry);
    }
    Ok((many, warning))
}
