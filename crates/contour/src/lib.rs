//! contour: a composable schema algebra.
//!
//! Build a value describing a data shape once, then derive artifacts
//! from it: a validating decoder, its inverse encoder, a structural
//! guard, a pretty-printer, and a random-value generator. Schemas
//! support fallible transformations, annotated refinements, and
//! recursive definitions.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Schema`] and the combinator factories in [`schema`]
//!   (`string`, `number`, `struct_`, `tuple`, `array`, `union`,
//!   `filter` via [`Schema::filter`], `transform`, `lazy`, ...)
//! - [`Value`], [`ObjectMap`], [`PropertyKey`], [`Symbol`] -- the
//!   host-native dynamic values decoders consume and produce
//! - [`ParseOptions`], [`ParseIssue`], [`ParseFailure`] -- the parse
//!   result model
//! - [`Parser`], [`Guard`], [`Pretty`], [`Arbitrary`] -- compiled
//!   interpreters
//! - [`Annotations`] and [`AnnotationKey`] -- per-node metadata
//!
//! # Example
//!
//! ```
//! use contour::schema::{self, optional, required};
//! use contour::Value;
//!
//! let user = schema::struct_(vec![
//!     ("name", required(schema::string())),
//!     ("age", optional(schema::number())),
//! ])
//! .unwrap();
//!
//! let input = Value::from_json(&serde_json::json!({ "name": "ada" })).unwrap();
//! assert!(user.is(&input));
//! assert!(user.decode_or_err(&input).is_ok());
//! ```

pub mod algebra;
pub mod annotations;
pub mod arbitrary;
pub mod ast;
pub mod format;
pub mod guard;
pub mod parser;
pub mod pretty;
pub mod result;
pub mod schema;
pub mod value;

// ── Convenience re-exports: key types ────────────────────────────────

pub use annotations::{AnnotationKey, AnnotationValue, Annotations};
pub use arbitrary::{Arbitrary, ArbitraryError};
pub use ast::{Ast, AstError, AstKind, LiteralValue};
pub use guard::Guard;
pub use parser::Parser;
pub use pretty::Pretty;
pub use result::{
    ExcessProperty, ParseFailure, ParseIssue, ParseOptions, ParseResult, ParseSuccess,
    SchemaViolation,
};
pub use schema::Schema;
pub use value::{ObjectMap, PropertyKey, Symbol, Value, ValueError};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use format::{describe, format_failure};
pub use pretty::render_value;
