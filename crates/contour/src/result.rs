//! Parse results: the success/failure sum returned by decode and encode.
//!
//! All decode-time and encode-time problems are values in a failure tree
//! with path context; the interpreter itself never panics and never uses
//! the error channel for user-data problems.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::ast::Ast;
use crate::value::{PropertyKey, Value};

// ──────────────────────────────────────────────
// Options
// ──────────────────────────────────────────────

/// What to do with an own key that matches neither a property signature
/// nor an index signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcessProperty {
    /// Drop the key from the output.
    #[default]
    Ignore,
    /// Fail the decode with an `Unexpected` issue.
    Error,
}

/// Options controlling failure aggregation and excess-key policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Accumulate failures across compound nodes instead of stopping at
    /// the first one.
    pub all_errors: bool,
    /// Suppress the warning normally recorded when an excess key is
    /// silently dropped.
    pub is_unexpected_allowed: bool,
    pub on_excess_property: ExcessProperty,
}

impl ParseOptions {
    pub fn all_errors() -> Self {
        ParseOptions {
            all_errors: true,
            ..ParseOptions::default()
        }
    }

    pub fn with_excess_property(mut self, policy: ExcessProperty) -> Self {
        self.on_excess_property = policy;
        self
    }
}

// ──────────────────────────────────────────────
// Failure tree
// ──────────────────────────────────────────────

/// Which side of a refinement failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementKind {
    /// The underlying schema rejected the input.
    From,
    /// The predicate returned false.
    Predicate,
}

/// Which stage of a transform failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    From,
    To,
    /// The user-supplied mapping itself failed.
    Transformation,
}

/// One node of the failure tree.
#[derive(Debug, Clone)]
pub enum ParseIssue {
    /// The input is not in the expected type's domain.
    Type { expected: Arc<Ast>, actual: Value },
    Refinement {
        ast: Arc<Ast>,
        actual: Value,
        kind: RefinementKind,
        errors: Vec<ParseIssue>,
    },
    Transform {
        ast: Arc<Ast>,
        actual: Value,
        kind: TransformKind,
        errors: Vec<ParseIssue>,
    },
    /// Path fragment for a property.
    Key {
        key: PropertyKey,
        errors: Vec<ParseIssue>,
    },
    /// Path fragment for a tuple element.
    Index {
        index: usize,
        errors: Vec<ParseIssue>,
    },
    /// One union branch's failures.
    Member { errors: Vec<ParseIssue> },
    /// Grouping of all branch failures for a union.
    UnionMember { errors: Vec<ParseIssue> },
    /// A required property or element is absent.
    Missing,
    /// An excess property or element the options demand be rejected.
    Unexpected { actual: Value },
}

/// A successful parse: the freshly constructed value plus any warnings
/// accumulated along the way (for example, silently dropped excess keys).
#[derive(Debug, Clone)]
pub struct ParseSuccess {
    pub value: Value,
    pub warnings: Vec<ParseIssue>,
}

impl ParseSuccess {
    pub fn new(value: Value) -> Self {
        ParseSuccess {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: Value, warnings: Vec<ParseIssue>) -> Self {
        ParseSuccess { value, warnings }
    }
}

/// A failed parse: a nonempty ordered list of failure nodes.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    errors: Vec<ParseIssue>,
}

impl ParseFailure {
    pub fn single(issue: ParseIssue) -> Self {
        ParseFailure {
            errors: vec![issue],
        }
    }

    /// Build from an already-collected list. Callers guarantee the list
    /// is nonempty; an empty list is a bug in the interpreter.
    pub fn many(errors: Vec<ParseIssue>) -> Self {
        debug_assert!(!errors.is_empty(), "ParseFailure requires at least one issue");
        ParseFailure { errors }
    }

    pub fn errors(&self) -> &[ParseIssue] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseIssue> {
        self.errors
    }
}

/// The sole output of decode and encode.
pub type ParseResult = Result<ParseSuccess, ParseFailure>;

/// Convenience success constructor for transform bodies.
pub fn success(value: Value) -> ParseResult {
    Ok(ParseSuccess::new(value))
}

/// Convenience failure constructor for transform bodies.
pub fn failure(issue: ParseIssue) -> ParseResult {
    Err(ParseFailure::single(issue))
}

// ──────────────────────────────────────────────
// Violation (the thrown form)
// ──────────────────────────────────────────────

/// The error form of a parse failure, carrying the formatted rendering of
/// the failure tree. Returned by the `*_or_err` helpers and `asserts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    message: String,
}

impl SchemaViolation {
    pub(crate) fn new(message: String) -> Self {
        SchemaViolation { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SchemaViolation {}
