//! The arbitrary interpreter: derive a random-value generator from a
//! schema.
//!
//! Refinements filter with a bounded retry budget, transforms generate
//! on the raw side and decode through the mapping, and lazy recursion is
//! depth-bounded so recursive schemas terminate. Generation is
//! deterministic for a given seeded RNG.

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

use crate::ast::{span_base, Ast, AstKind, SpanBase};
use crate::format;
use crate::result::ParseOptions;
use crate::value::{ObjectMap, PropertyKey, Symbol, Value};

const DEFAULT_MAX_DEPTH: usize = 8;
const DEFAULT_FILTER_ATTEMPTS: usize = 64;

/// Errors from generation. These are schema problems, not RNG problems:
/// an unsatisfiable schema, a filter too narrow to hit by retrying, or a
/// transform that rejected its own generated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbitraryError {
    Unsatisfiable { schema: String },
    FilterExhausted { attempts: usize, schema: String },
    TransformFailed { message: String },
    DepthExceeded,
}

impl fmt::Display for ArbitraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbitraryError::Unsatisfiable { schema } => {
                write!(f, "cannot generate a value for {}", schema)
            }
            ArbitraryError::FilterExhausted { attempts, schema } => write!(
                f,
                "no generated value satisfied the refinement on {} after {} attempts",
                schema, attempts
            ),
            ArbitraryError::TransformFailed { message } => {
                write!(f, "transform rejected a generated value: {}", message)
            }
            ArbitraryError::DepthExceeded => {
                write!(f, "recursion depth limit reached during generation")
            }
        }
    }
}

impl std::error::Error for ArbitraryError {}

/// A compiled generator for one schema.
pub struct Arbitrary {
    ast: Arc<Ast>,
    max_depth: usize,
    filter_attempts: usize,
}

impl Arbitrary {
    pub fn new(ast: Arc<Ast>) -> Self {
        Arbitrary {
            ast,
            max_depth: DEFAULT_MAX_DEPTH,
            filter_attempts: DEFAULT_FILTER_ATTEMPTS,
        }
    }

    /// Bound how deep lazy recursion may unfold before the generator
    /// backs off to another union branch.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Value, ArbitraryError> {
        self.go(&self.ast, rng, 0)
    }

    fn go<R: Rng + ?Sized>(
        &self,
        ast: &Arc<Ast>,
        rng: &mut R,
        depth: usize,
    ) -> Result<Value, ArbitraryError> {
        match &ast.kind {
            AstKind::Never => Err(ArbitraryError::Unsatisfiable {
                schema: format::describe(ast),
            }),
            AstKind::Unknown | AstKind::Any => Ok(match rng.gen_range(0..4u8) {
                0 => Value::Null,
                1 => Value::Boolean(rng.gen()),
                2 => random_number(rng),
                _ => random_string(rng),
            }),
            AstKind::Void | AstKind::Undefined => Ok(Value::Undefined),
            AstKind::StringKeyword => Ok(random_string(rng)),
            AstKind::NumberKeyword => Ok(random_number(rng)),
            AstKind::BooleanKeyword => Ok(Value::Boolean(rng.gen())),
            AstKind::BigIntKeyword => Ok(Value::BigInt(rng.gen_range(-1_000_000i128..1_000_000))),
            AstKind::SymbolKeyword => Ok(Value::Symbol(Symbol::new("generated"))),
            AstKind::ObjectKeyword => Ok(Value::Object(ObjectMap::new())),
            AstKind::Literal(literal) => Ok(literal.to_value()),
            AstKind::UniqueSymbol(symbol) => Ok(Value::Symbol(symbol.clone())),
            AstKind::TemplateLiteral(template) => {
                let mut text = template.head.clone();
                for span in &template.spans {
                    match span_base(&span.ty) {
                        Some(SpanBase::Number) => {
                            text.push_str(&rng.gen_range(-999i32..1000).to_string())
                        }
                        _ => match random_string(rng) {
                            Value::String(s) => text.push_str(&s),
                            _ => {}
                        },
                    }
                    text.push_str(&span.literal);
                }
                Ok(Value::String(text))
            }
            AstKind::Enums(members) => members
                .choose(rng)
                .map(|m| m.value.to_value())
                .ok_or_else(|| ArbitraryError::Unsatisfiable {
                    schema: format::describe(ast),
                }),
            AstKind::Tuple(tuple) => {
                let mut out = Vec::new();
                for element in &tuple.elements {
                    if element.optional && rng.gen_bool(0.5) {
                        break;
                    }
                    out.push(self.go(&element.ty, rng, depth + 1)?);
                }
                if let Some(rest) = &tuple.rest {
                    let head_count = if depth >= self.max_depth {
                        0
                    } else {
                        rng.gen_range(0..=3)
                    };
                    for _ in 0..head_count {
                        out.push(self.go(&rest[0], rng, depth + 1)?);
                    }
                    for trailing in &rest[1..] {
                        out.push(self.go(trailing, rng, depth + 1)?);
                    }
                }
                Ok(Value::Array(out))
            }
            AstKind::TypeLiteral(literal) => {
                let mut out = ObjectMap::new();
                for property in &literal.properties {
                    if property.optional && rng.gen_bool(0.5) {
                        continue;
                    }
                    let value = self.go(&property.ty, rng, depth + 1)?;
                    out.insert(property.name.clone(), value);
                }
                for signature in &literal.index_signatures {
                    let extra = rng.gen_range(0..=2);
                    for _ in 0..extra {
                        let key = match self.go(&signature.parameter, rng, depth + 1)? {
                            Value::String(s) => PropertyKey::String(s),
                            Value::Symbol(s) => PropertyKey::Symbol(s),
                            _ => continue,
                        };
                        if out.contains_key(&key) {
                            continue;
                        }
                        let value = self.go(&signature.ty, rng, depth + 1)?;
                        out.insert(key, value);
                    }
                }
                Ok(Value::Object(out))
            }
            AstKind::Union(members) => {
                // Random branch first; a branch that cannot generate
                // (depth limit, never) falls back to the others, which is
                // what terminates recursive nullable-style unions.
                let mut order: Vec<usize> = (0..members.len()).collect();
                order.shuffle(rng);
                let mut last = ArbitraryError::Unsatisfiable {
                    schema: format::describe(ast),
                };
                for index in order {
                    match self.go(&members[index], rng, depth + 1) {
                        Ok(value) => return Ok(value),
                        Err(err) => last = err,
                    }
                }
                Err(last)
            }
            AstKind::Refinement(refinement) => {
                for _ in 0..self.filter_attempts {
                    let candidate = self.go(&refinement.from, rng, depth + 1)?;
                    if (refinement.predicate)(&candidate) {
                        return Ok(candidate);
                    }
                }
                Err(ArbitraryError::FilterExhausted {
                    attempts: self.filter_attempts,
                    schema: format::describe(ast),
                })
            }
            AstKind::Transform(transform) => {
                let raw = self.go(&transform.from, rng, depth + 1)?;
                match (transform.decode)(&raw, &ParseOptions::default()) {
                    Ok(parsed) => Ok(parsed.value),
                    Err(failure) => Err(ArbitraryError::TransformFailed {
                        message: format::format_failure(&failure),
                    }),
                }
            }
            AstKind::Lazy(lazy) => {
                if depth >= self.max_depth {
                    return Err(ArbitraryError::DepthExceeded);
                }
                let forced = (lazy.thunk)();
                self.go(&forced, rng, depth + 1)
            }
            AstKind::TypeAlias(alias) => self.go(&alias.ty, rng, depth),
        }
    }
}

fn random_string<R: Rng + ?Sized>(rng: &mut R) -> Value {
    let len = rng.gen_range(0..12);
    let s: String = (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect();
    Value::String(s)
}

fn random_number<R: Rng + ?Sized>(rng: &mut R) -> Value {
    Value::Number(Decimal::new(rng.gen_range(-100_000i64..100_000), rng.gen_range(0..3)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{LiteralValue, PropertySignature, TupleElement};
    use crate::guard;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Generated values land inside the schema's accepted set.
    #[test]
    fn generated_values_pass_the_guard() {
        let schema = Ast::type_literal(
            vec![
                PropertySignature::new("name", Ast::string()),
                PropertySignature::new("age", Ast::number()).optional(),
                PropertySignature::new("dir", Ast::union(vec![
                    Ast::literal("up"),
                    Ast::literal("down"),
                ])),
            ],
            vec![],
        )
        .unwrap();
        let generator = Arbitrary::new(schema.clone());
        let mut rng = rng();
        for _ in 0..50 {
            let value = generator.generate(&mut rng).unwrap();
            assert!(guard::check(&schema, &value), "guard rejected {:?}", value);
        }
    }

    #[test]
    fn refinement_filters_generated_values() {
        let positive = Ast::refinement(
            Ast::number(),
            Arc::new(|v| matches!(v, Value::Number(n) if *n > Decimal::ZERO)),
        );
        let generator = Arbitrary::new(positive.clone());
        let mut rng = rng();
        for _ in 0..20 {
            let value = generator.generate(&mut rng).unwrap();
            assert!(guard::check(&positive, &value));
        }
    }

    #[test]
    fn impossible_refinement_reports_exhaustion() {
        let impossible = Ast::refinement(Ast::number(), Arc::new(|_| false));
        let err = Arbitrary::new(impossible).generate(&mut rng()).unwrap_err();
        assert!(matches!(err, ArbitraryError::FilterExhausted { .. }));
    }

    #[test]
    fn never_is_unsatisfiable() {
        let err = Arbitrary::new(Ast::never()).generate(&mut rng()).unwrap_err();
        assert!(matches!(err, ArbitraryError::Unsatisfiable { .. }));
    }

    #[test]
    fn template_literal_generates_matching_strings() {
        let schema = Ast::template_literal(
            "item-",
            vec![crate::ast::TemplateSpan {
                ty: Ast::number(),
                literal: String::new(),
            }],
        )
        .unwrap();
        let generator = Arbitrary::new(schema.clone());
        let mut rng = rng();
        for _ in 0..20 {
            let value = generator.generate(&mut rng).unwrap();
            assert!(guard::check(&schema, &value), "guard rejected {:?}", value);
        }
    }

    #[test]
    fn recursive_union_terminates_via_depth_bound() {
        fn tree() -> Arc<Ast> {
            Ast::lazy(Arc::new(|| {
                Ast::type_literal(
                    vec![
                        PropertySignature::new("v", Ast::number()),
                        PropertySignature::new(
                            "next",
                            Ast::union(vec![Ast::literal(LiteralValue::Null), tree()]),
                        ),
                    ],
                    vec![],
                )
                .unwrap_or_else(|_| Ast::never())
            }))
        }
        let generator = Arbitrary::new(tree()).with_max_depth(6);
        let mut rng = rng();
        for _ in 0..10 {
            let value = generator.generate(&mut rng).unwrap();
            assert!(guard::check(&tree(), &value));
        }
    }

    #[test]
    fn tuple_rest_lengths_vary_but_stay_valid() {
        let schema = Ast::tuple(
            vec![TupleElement {
                ty: Ast::boolean(),
                optional: false,
            }],
            Some(vec![Ast::number()]),
            false,
        )
        .unwrap();
        let generator = Arbitrary::new(schema.clone());
        let mut rng = rng();
        for _ in 0..20 {
            let value = generator.generate(&mut rng).unwrap();
            assert!(guard::check(&schema, &value));
        }
    }

    #[test]
    fn transform_generates_on_from_then_decodes() {
        use crate::result::success;
        let schema = Ast::transform(
            Ast::string(),
            Ast::number(),
            Arc::new(|v: &Value, _: &ParseOptions| match v {
                Value::String(s) => success(Value::from(s.len() as i64)),
                other => success(other.clone()),
            }),
            Arc::new(|v: &Value, _: &ParseOptions| success(v.clone())),
        );
        let value = Arbitrary::new(schema).generate(&mut rng()).unwrap();
        assert!(matches!(value, Value::Number(_)));
    }
}
