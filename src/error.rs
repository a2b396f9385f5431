//! The three error families observed by callers (spec §7), plus the two
//! executor-level failure markers `BadCopy`/`Mutate` (spec §6).
//!
//! Positional context (`position`, `left_context`, `right_context`) is kept
//! on `ParseError` per spec §7.1; rendering goes through `annotate-snippets`
//! rather than the teacher's hand-rolled ANSI underliner.

use annotate_snippets::display_list::DisplayList;
use annotate_snippets::snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation};
use thiserror::Error;

/// A `Parse { position, message }` failure (spec §6/§7.1).
///
/// Carries the context needed to render `left_of(p)`/`right_of(p)` style
/// diagnostics without re-scanning the source.
#[derive(Debug, Clone, Error)]
#[error("parse error at byte {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
    pub left_context: String,
    pub right_context: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>, source: &str) -> Self {
        let message = message.into();
        let left_context = source[..position.min(source.len())].to_string();
        let right_context = source[position.min(source.len())..].to_string();
        ParseError { position, message, left_context, right_context }
    }

    /// Render with source context via `annotate-snippets`.
    pub fn display_with_source(&self, source: &str) -> String {
        let (line_num, line_start, line_content) = find_line(source, self.position);
        let col = self.position.saturating_sub(line_start);
        let len = 1usize.max(1);
        let snippet = Snippet {
            title: Some(Annotation {
                label: Some(&self.message),
                id: None,
                annotation_type: AnnotationType::Error,
            }),
            footer: vec![],
            slices: vec![Slice {
                source: line_content,
                line_start: line_num,
                origin: None,
                fold: false,
                annotations: vec![SourceAnnotation {
                    label: "here",
                    annotation_type: AnnotationType::Error,
                    range: (col, col + len),
                }],
            }],
            opt: Default::default(),
        };
        DisplayList::from(snippet).to_string()
    }
}

fn find_line(source: &str, position: usize) -> (usize, usize, &str) {
    let mut line_num = 1;
    let mut line_start = 0;
    for (i, c) in source.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }
    let line_end = source[line_start..]
        .find('\n')
        .map(|off| line_start + off)
        .unwrap_or(source.len());
    (line_num, line_start, &source[line_start..line_end])
}

/// A warning emitted after an otherwise-successful parse (spec §4.3.5):
/// unconsumed characters remained at the end of input.
#[derive(Debug, Clone)]
pub struct ParseWarning {
    pub position: usize,
    pub message: String,
}

/// `Link { message }` — a `push` could not be satisfied (spec §4.5.2/§7.2).
#[derive(Debug, Clone, Error)]
#[error("link error: {message}")]
pub struct LinkError {
    pub message: String,
}

impl LinkError {
    pub fn new(message: impl Into<String>) -> Self {
        LinkError { message: message.into() }
    }
}

/// `Construct { message }` — structural misuse during a default ability
/// (constant context, abstract context, wrong arity; spec §7.3).
#[derive(Debug, Clone, Error)]
#[error("construct error: {message}")]
pub struct ConstructError {
    pub message: String,
}

impl ConstructError {
    pub fn new(message: impl Into<String>) -> Self {
        ConstructError { message: message.into() }
    }
}

/// Top-level error enum unifying the four families plus `BadCopy`/`Mutate`
/// (spec §6 "Error types (observed by callers)").
#[derive(Debug, Clone, Error)]
pub enum FlowError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Construct(#[from] ConstructError),
    #[error("copy_to failed: container state incompatible")]
    BadCopy,
    #[error("mutate error: {0}")]
    Mutate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_splits_left_and_right_context() {
        let source = "Create!-1(Verb(?, ??))";
        let err = ParseError::new(10, "expected verb meta", source);
        assert_eq!(err.left_context, "Create!-1(");
        assert_eq!(err.right_context, "Verb(?, ??))");
    }

    #[test]
    fn display_with_source_contains_message_and_line() {
        let source = "Create!-1(Verb(?, ??))";
        let err = ParseError::new(10, "expected verb meta", source);
        let rendered = err.display_with_source(source);
        assert!(rendered.contains("expected verb meta"));
    }

    #[test]
    fn flow_error_wraps_parse_error() {
        let source = "x";
        let err = ParseError::new(0, "bad", source);
        let flow: FlowError = err.into();
        assert!(matches!(flow, FlowError::Parse(_)));
    }

    #[test]
    fn link_and_construct_errors_carry_message() {
        let link = LinkError::new("no future point accepted material");
        assert_eq!(link.message, "no future point accepted material");
        let construct = ConstructError::new("context is constant");
        assert_eq!(construct.message, "context is constant");
    }
}
