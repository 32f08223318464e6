//! Failure-tree rendering and message resolution.
//!
//! Failures stay structured until someone needs text. Rendering walks
//! the tree depth-first; at each leaf the failing node's `Message`
//! annotation wins over the synthesized default
//! `Expected <identifier-or-rendering>, actual <value>`.

use crate::ast::{Ast, AstKind};
use crate::pretty::render_value;
use crate::result::{ParseFailure, ParseIssue, RefinementKind, SchemaViolation, TransformKind};
use crate::value::Value;

/// Render a failure tree as indented text. A single leaf failure renders
/// as its bare message with no decoration.
pub fn format_failure(failure: &ParseFailure) -> String {
    let mut out = String::new();
    for issue in failure.errors() {
        format_issue(issue, 0, &mut out);
    }
    out.truncate(out.trim_end().len());
    out
}

/// The error form of a failure: its formatted rendering.
pub fn violation(failure: &ParseFailure) -> SchemaViolation {
    SchemaViolation::new(format_failure(failure))
}

fn format_issue(issue: &ParseIssue, indent: usize, out: &mut String) {
    match issue {
        ParseIssue::Type { expected, actual } => {
            push_line(out, indent, &site_message(expected, actual));
        }
        ParseIssue::Refinement {
            ast,
            actual,
            kind,
            errors,
        } => {
            // This node's message takes the whole subtree unless a
            // deeper site already resolved one.
            if ast.annotations.message().is_some() && !failure_mentions_message(errors) {
                push_line(out, indent, &site_message(ast, actual));
                return;
            }
            match kind {
                RefinementKind::Predicate => push_line(out, indent, &site_message(ast, actual)),
                // The base schema rejected the input; its own failures
                // carry the detail.
                RefinementKind::From => {
                    for inner in errors {
                        format_issue(inner, indent, out);
                    }
                }
            }
        }
        ParseIssue::Transform {
            ast,
            actual,
            kind,
            errors,
        } => {
            if ast.annotations.message().is_some() && !failure_mentions_message(errors) {
                push_line(out, indent, &site_message(ast, actual));
                return;
            }
            match kind {
                TransformKind::Transformation => {
                    if errors.is_empty() {
                        push_line(out, indent, &site_message(ast, actual));
                    } else {
                        for inner in errors {
                            format_issue(inner, indent, out);
                        }
                    }
                }
                TransformKind::From | TransformKind::To => {
                    for inner in errors {
                        format_issue(inner, indent, out);
                    }
                }
            }
        }
        ParseIssue::Key { key, errors } => {
            push_line(out, indent, &format!("[{}]", key));
            for inner in errors {
                format_issue(inner, indent + 1, out);
            }
        }
        ParseIssue::Index { index, errors } => {
            push_line(out, indent, &format!("[{}]", index));
            for inner in errors {
                format_issue(inner, indent + 1, out);
            }
        }
        ParseIssue::Member { errors } => {
            push_line(out, indent, "union member");
            for inner in errors {
                format_issue(inner, indent + 1, out);
            }
        }
        ParseIssue::UnionMember { errors } => {
            push_line(out, indent, "no union member matched");
            for inner in errors {
                format_issue(inner, indent + 1, out);
            }
        }
        ParseIssue::Missing => push_line(out, indent, "is missing"),
        ParseIssue::Unexpected { actual } => {
            push_line(out, indent, &format!("is unexpected: {}", render_value(actual)));
        }
    }
}

fn push_line(out: &mut String, indent: usize, text: &str) {
    for _ in 0..indent {
        out.push_str("  ");
    }
    out.push_str(text);
    out.push('\n');
}

/// The message for one failing site: the node's `Message` annotation if
/// present, else the synthesized default.
fn site_message(ast: &Ast, actual: &Value) -> String {
    match ast.annotations.message() {
        Some(message) => message(actual),
        None => format!(
            "Expected {}, actual {}",
            describe(ast),
            render_value(actual)
        ),
    }
}

/// Whether any issue in the tree is already anchored at a node carrying
/// a `Message` annotation. The parser uses this so the nearest annotated
/// ancestor wins and outer annotations do not clobber deeper ones.
pub(crate) fn failure_mentions_message(errors: &[ParseIssue]) -> bool {
    errors.iter().any(|issue| match issue {
        ParseIssue::Type { expected, .. } => expected.annotations.message().is_some(),
        ParseIssue::Refinement { ast, errors, .. }
        | ParseIssue::Transform { ast, errors, .. } => {
            ast.annotations.message().is_some() || failure_mentions_message(errors)
        }
        ParseIssue::Key { errors, .. }
        | ParseIssue::Index { errors, .. }
        | ParseIssue::Member { errors }
        | ParseIssue::UnionMember { errors } => failure_mentions_message(errors),
        ParseIssue::Missing | ParseIssue::Unexpected { .. } => false,
    })
}

// ──────────────────────────────────────────────
// Schema rendering
// ──────────────────────────────────────────────

/// A compact rendering of a schema: the `Identifier` annotation when
/// present, else a structural sketch.
pub fn describe(ast: &Ast) -> String {
    if let Some(identifier) = ast.annotations.identifier() {
        return identifier.to_owned();
    }
    match &ast.kind {
        AstKind::Never
        | AstKind::Unknown
        | AstKind::Any
        | AstKind::Void
        | AstKind::Undefined
        | AstKind::StringKeyword
        | AstKind::NumberKeyword
        | AstKind::BooleanKeyword
        | AstKind::BigIntKeyword
        | AstKind::SymbolKeyword
        | AstKind::ObjectKeyword => ast.kind.kind_name().to_owned(),
        AstKind::Literal(literal) => literal.to_string(),
        AstKind::UniqueSymbol(symbol) => symbol.to_string(),
        AstKind::TemplateLiteral(template) => {
            let mut rendered = String::from("`");
            rendered.push_str(&template.head);
            for span in &template.spans {
                rendered.push_str("${");
                rendered.push_str(span.ty.kind.kind_name());
                rendered.push('}');
                rendered.push_str(&span.literal);
            }
            rendered.push('`');
            rendered
        }
        AstKind::Enums(members) => {
            let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
            format!("enum({})", names.join(" | "))
        }
        AstKind::Tuple(tuple) => {
            let mut parts: Vec<String> = tuple
                .elements
                .iter()
                .map(|e| {
                    if e.optional {
                        format!("{}?", describe(&e.ty))
                    } else {
                        describe(&e.ty)
                    }
                })
                .collect();
            if let Some(rest) = &tuple.rest {
                parts.push(format!("...{}[]", describe(&rest[0])));
                for trailing in &rest[1..] {
                    parts.push(describe(trailing));
                }
            }
            let body = format!("[{}]", parts.join(", "));
            if tuple.readonly {
                format!("readonly {}", body)
            } else {
                body
            }
        }
        AstKind::TypeLiteral(literal) => {
            let mut parts: Vec<String> = literal
                .properties
                .iter()
                .map(|p| {
                    let marker = if p.optional { "?" } else { "" };
                    format!("{}{}: {}", p.name, marker, describe(&p.ty))
                })
                .collect();
            for signature in &literal.index_signatures {
                parts.push(format!(
                    "[{}]: {}",
                    describe(&signature.parameter),
                    describe(&signature.ty)
                ));
            }
            if parts.is_empty() {
                "{}".to_owned()
            } else {
                format!("{{ {} }}", parts.join("; "))
            }
        }
        AstKind::Union(members) => {
            let parts: Vec<String> = members.iter().map(|m| describe(m)).collect();
            parts.join(" | ")
        }
        AstKind::Refinement(refinement) => format!("refinement of {}", describe(&refinement.from)),
        AstKind::Transform(transform) => format!(
            "{} -> {}",
            describe(&transform.from),
            describe(&transform.to)
        ),
        AstKind::Lazy(_) => "<suspended>".to_owned(),
        AstKind::TypeAlias(alias) => describe(&alias.ty),
    }
}
