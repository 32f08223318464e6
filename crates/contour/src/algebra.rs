//! Structural operations on the AST: `keyof`, `pick`, `omit`, `partial`,
//! and `extend`.
//!
//! Every operation produces a new AST without mutating its input, sees
//! through refinements, transforms, aliases, and lazy nodes to the
//! underlying structural type, and distributes over unions.

use std::sync::Arc;

use crate::ast::{
    merge_annotations, Ast, AstError, AstKind, IndexSignature, LiteralValue, PropertySignature,
    structurally_equal, TupleElement,
};
use crate::guard;
use crate::value::PropertyKey;

/// Resolve a node to its structural carrier: through `Refinement` (the
/// refined base), `Transform` (the decoded side), `TypeAlias`, and
/// `Lazy` (forcing the thunk).
fn resolve_structural(ast: &Arc<Ast>) -> Arc<Ast> {
    match &ast.kind {
        AstKind::Refinement(r) => resolve_structural(&r.from),
        AstKind::Transform(t) => resolve_structural(&t.to),
        AstKind::TypeAlias(a) => resolve_structural(&a.ty),
        AstKind::Lazy(l) => resolve_structural(&(l.thunk)()),
        _ => ast.clone(),
    }
}

// ──────────────────────────────────────────────
// keyof
// ──────────────────────────────────────────────

/// The ordered set of property names a node is known to carry. For
/// unions this is the intersection of member key sets, in first-member
/// order.
fn key_set(ast: &Arc<Ast>) -> Result<Vec<PropertyKey>, AstError> {
    let resolved = resolve_structural(ast);
    match &resolved.kind {
        AstKind::TypeLiteral(t) => Ok(t.properties.iter().map(|p| p.name.clone()).collect()),
        AstKind::Union(members) => {
            let mut iter = members.iter();
            let mut keys = match iter.next() {
                Some(first) => key_set(first)?,
                None => Vec::new(),
            };
            for member in iter {
                let member_keys = key_set(member)?;
                keys.retain(|k| member_keys.contains(k));
            }
            Ok(keys)
        }
        other => Err(AstError::UnsupportedOperation {
            operation: "keyof",
            found: other.kind_name().to_owned(),
        }),
    }
}

/// `keyof`: a union of literal string / unique symbol member names.
pub fn keyof(ast: &Arc<Ast>) -> Result<Arc<Ast>, AstError> {
    let keys = key_set(ast)?;
    Ok(Ast::union(
        keys.into_iter()
            .map(|key| match key {
                PropertyKey::String(s) => Ast::literal(LiteralValue::String(s)),
                PropertyKey::Symbol(s) => Ast::unique_symbol(s),
            })
            .collect(),
    ))
}

// ──────────────────────────────────────────────
// pick / omit
// ──────────────────────────────────────────────

/// `pick`: keep only the named keys. Index signatures survive only when
/// every requested key satisfies their parameter; a requested key that
/// is neither a property nor covered by a surviving index signature is
/// an error.
pub fn pick(ast: &Arc<Ast>, keys: &[PropertyKey]) -> Result<Arc<Ast>, AstError> {
    let resolved = resolve_structural(ast);
    match &resolved.kind {
        AstKind::TypeLiteral(t) => {
            let picked: Vec<PropertySignature> = t
                .properties
                .iter()
                .filter(|p| keys.contains(&p.name))
                .cloned()
                .collect();
            let kept_signatures: Vec<IndexSignature> = t
                .index_signatures
                .iter()
                .filter(|sig| {
                    keys.iter()
                        .all(|k| guard::check(&sig.parameter, &k.to_value()))
                })
                .cloned()
                .collect();
            for key in keys {
                let covered = picked.iter().any(|p| &p.name == key)
                    || kept_signatures
                        .iter()
                        .any(|sig| guard::check(&sig.parameter, &key.to_value()));
                if !covered {
                    return Err(AstError::UnknownKey { key: key.clone() });
                }
            }
            let node = Ast::type_literal(picked, kept_signatures)?;
            Ok(merge_annotations(&node, &resolved.annotations))
        }
        AstKind::Union(members) => {
            let mut picked_members = Vec::with_capacity(members.len());
            for member in members {
                picked_members.push(pick(member, keys)?);
            }
            Ok(merge_annotations(
                &Ast::union(picked_members),
                &resolved.annotations,
            ))
        }
        other => Err(AstError::UnsupportedOperation {
            operation: "pick",
            found: other.kind_name().to_owned(),
        }),
    }
}

/// `omit`: drop the named keys; the dual of `pick`. Keys the subject
/// never had are ignored. Index signatures are untouched.
pub fn omit(ast: &Arc<Ast>, keys: &[PropertyKey]) -> Result<Arc<Ast>, AstError> {
    let resolved = resolve_structural(ast);
    match &resolved.kind {
        AstKind::TypeLiteral(t) => {
            let remaining: Vec<PropertySignature> = t
                .properties
                .iter()
                .filter(|p| !keys.contains(&p.name))
                .cloned()
                .collect();
            let node = Ast::type_literal(remaining, t.index_signatures.clone())?;
            Ok(merge_annotations(&node, &resolved.annotations))
        }
        AstKind::Union(members) => {
            let mut omitted = Vec::with_capacity(members.len());
            for member in members {
                omitted.push(omit(member, keys)?);
            }
            Ok(merge_annotations(
                &Ast::union(omitted),
                &resolved.annotations,
            ))
        }
        other => Err(AstError::UnsupportedOperation {
            operation: "omit",
            found: other.kind_name().to_owned(),
        }),
    }
}

// ──────────────────────────────────────────────
// partial
// ──────────────────────────────────────────────

/// `partial`: every property (or tuple element) becomes optional. For a
/// tuple with a rest segment, `undefined` joins each rest member.
pub fn partial(ast: &Arc<Ast>) -> Result<Arc<Ast>, AstError> {
    let resolved = resolve_structural(ast);
    match &resolved.kind {
        AstKind::TypeLiteral(t) => {
            let properties = t
                .properties
                .iter()
                .map(|p| {
                    let mut p = p.clone();
                    p.optional = true;
                    p
                })
                .collect();
            let node = Ast::type_literal(properties, t.index_signatures.clone())?;
            Ok(merge_annotations(&node, &resolved.annotations))
        }
        AstKind::Tuple(t) => {
            let elements = t
                .elements
                .iter()
                .map(|e| TupleElement {
                    ty: e.ty.clone(),
                    optional: true,
                })
                .collect();
            let rest = t.rest.as_ref().map(|members| {
                members
                    .iter()
                    .map(|m| Ast::union(vec![m.clone(), Ast::undefined()]))
                    .collect()
            });
            let node = Ast::tuple(elements, rest, t.readonly)?;
            Ok(merge_annotations(&node, &resolved.annotations))
        }
        AstKind::Union(members) => {
            let mut partials = Vec::with_capacity(members.len());
            for member in members {
                partials.push(partial(member)?);
            }
            Ok(merge_annotations(
                &Ast::union(partials),
                &resolved.annotations,
            ))
        }
        other => Err(AstError::UnsupportedOperation {
            operation: "partial",
            found: other.kind_name().to_owned(),
        }),
    }
}

// ──────────────────────────────────────────────
// extend
// ──────────────────────────────────────────────

/// `extend`: merge the property and index signatures of two struct-like
/// nodes. A key collision is an error unless the two signatures are
/// structurally identical. Distributes over unions on either side.
pub fn extend(a: &Arc<Ast>, b: &Arc<Ast>) -> Result<Arc<Ast>, AstError> {
    let left = resolve_structural(a);
    let right = resolve_structural(b);
    match (&left.kind, &right.kind) {
        (AstKind::Union(members), _) => {
            let mut extended = Vec::with_capacity(members.len());
            for member in members {
                extended.push(extend(member, &right)?);
            }
            Ok(Ast::union(extended))
        }
        (_, AstKind::Union(members)) => {
            let mut extended = Vec::with_capacity(members.len());
            for member in members {
                extended.push(extend(&left, member)?);
            }
            Ok(Ast::union(extended))
        }
        (AstKind::TypeLiteral(x), AstKind::TypeLiteral(y)) => {
            let mut properties = x.properties.clone();
            for incoming in &y.properties {
                match properties.iter().find(|p| p.name == incoming.name) {
                    Some(existing) => {
                        let identical = existing.optional == incoming.optional
                            && existing.readonly == incoming.readonly
                            && structurally_equal(&existing.ty, &incoming.ty);
                        if !identical {
                            return Err(AstError::ExtendConflict {
                                key: incoming.name.clone(),
                            });
                        }
                    }
                    None => properties.push(incoming.clone()),
                }
            }
            let mut index_signatures = x.index_signatures.clone();
            index_signatures.extend(y.index_signatures.iter().cloned());
            let node = Ast::type_literal(properties, index_signatures)?;
            Ok(merge_annotations(
                &node,
                &left.annotations.merge(&right.annotations),
            ))
        }
        (other, AstKind::TypeLiteral(_)) | (_, other) => Err(AstError::UnsupportedOperation {
            operation: "extend",
            found: other.kind_name().to_owned(),
        }),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
