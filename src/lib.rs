//! `verbflow`: a symbolic flow runtime.
//!
//! Code text compiles into `Many`, a heterogeneous typed container of
//! scalars, verbs, constructs and traits; an executor runs a `Many` as a
//! scope with AND/OR branching semantics and three-phase verb dispatch; a
//! `Temporal` linker threads pushed scopes through priority/time/frequency
//! stacks against a reflection registry supplied by the embedding
//! application. See `DESIGN.md` for the module-by-module grounding.

pub mod charge;
pub mod code;
pub mod construct;
pub mod error;
pub mod executor;
pub mod flow_trait;
pub mod intern;
pub mod lexer;
pub mod many;
pub mod missing;
mod parser;
pub mod reflect;
pub mod scope;
pub mod temporal;
pub mod token;
pub mod verb;

pub use code::Code;
pub use construct::Construct;
pub use error::{ConstructError, FlowError, LinkError, ParseError, ParseWarning};
pub use flow_trait::Trait;
pub use many::{Element, Many, Meta, MetaKind, Scalar};
pub use missing::{Missing, MissingArena, MissingId, MissingKind};
pub use reflect::{DefaultRegistry, Reflection};
pub use temporal::Temporal;
pub use verb::Verb;
