//! The user-facing combinator surface.
//!
//! A `Schema` wraps an AST node; every combinator here is a thin shell
//! over the AST constructors and the algebra. Interpreters hang off the
//! schema as methods (`decode`, `encode`, `is`, `asserts`) or as
//! compiled artifacts (`parser()`, `guard()`, `pretty()`, `arbitrary()`).

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::algebra;
use crate::annotations::{AnnotationKey, AnnotationValue, Annotations};
use crate::arbitrary::Arbitrary;
use crate::ast::{
    merge_annotations, Ast, AstError, AstKind, EnumMember, IndexSignature, LiteralValue,
    PropertySignature, TemplateSpan, TupleElement,
};
use crate::format;
use crate::guard::{self, Guard};
use crate::parser::Parser;
use crate::pretty::Pretty;
use crate::result::{success, ParseOptions, ParseResult, SchemaViolation};
use crate::value::{PropertyKey, Symbol, Value};

/// A schema: a value describing a data shape, built from combinators and
/// consumed by interpreters.
#[derive(Clone)]
pub struct Schema {
    ast: Arc<Ast>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({})", format::describe(&self.ast))
    }
}

impl Schema {
    pub fn from_ast(ast: Arc<Ast>) -> Self {
        Schema { ast }
    }

    pub fn ast(&self) -> &Arc<Ast> {
        &self.ast
    }

    pub fn into_ast(self) -> Arc<Ast> {
        self.ast
    }

    // ── Interpreters ─────────────────────────────────────────────────

    /// Compile a parser carrying its own memo tables.
    pub fn parser(&self) -> Parser {
        Parser::new(self.ast.clone())
    }

    pub fn guard(&self) -> Guard {
        Guard::new(self.ast.clone())
    }

    pub fn pretty(&self) -> Pretty {
        Pretty::new(self.ast.clone())
    }

    pub fn arbitrary(&self) -> Arbitrary {
        Arbitrary::new(self.ast.clone())
    }

    /// Validate and decode `input`.
    pub fn decode(&self, input: &Value, options: &ParseOptions) -> ParseResult {
        self.parser().decode(input, options)
    }

    /// Map a decoded value back to the input domain.
    pub fn encode(&self, input: &Value, options: &ParseOptions) -> ParseResult {
        self.parser().encode(input, options)
    }

    /// Structural membership test; never allocates failure context.
    pub fn is(&self, input: &Value) -> bool {
        guard::check(&self.ast, input)
    }

    /// Decode under default options, surfacing failure as an error whose
    /// message is the formatted failure tree.
    pub fn asserts(&self, input: &Value) -> Result<(), SchemaViolation> {
        self.decode_or_err(input).map(|_| ())
    }

    pub fn decode_or_err(&self, input: &Value) -> Result<Value, SchemaViolation> {
        match self.decode(input, &ParseOptions::default()) {
            Ok(parsed) => Ok(parsed.value),
            Err(failure) => {
                let violation = format::violation(&failure);
                debug!(schema = ?self.ast, message = violation.message(), "decode failed");
                Err(violation)
            }
        }
    }

    pub fn encode_or_err(&self, input: &Value) -> Result<Value, SchemaViolation> {
        match self.encode(input, &ParseOptions::default()) {
            Ok(parsed) => Ok(parsed.value),
            Err(failure) => {
                let violation = format::violation(&failure);
                debug!(schema = ?self.ast, message = violation.message(), "encode failed");
                Err(violation)
            }
        }
    }

    // ── Algebra ──────────────────────────────────────────────────────

    pub fn pick(&self, keys: &[PropertyKey]) -> Result<Schema, AstError> {
        algebra::pick(&self.ast, keys).map(Schema::from_ast)
    }

    pub fn omit(&self, keys: &[PropertyKey]) -> Result<Schema, AstError> {
        algebra::omit(&self.ast, keys).map(Schema::from_ast)
    }

    pub fn partial(&self) -> Result<Schema, AstError> {
        algebra::partial(&self.ast).map(Schema::from_ast)
    }

    pub fn extend(&self, other: &Schema) -> Result<Schema, AstError> {
        algebra::extend(&self.ast, &other.ast).map(Schema::from_ast)
    }

    pub fn keyof(&self) -> Result<Schema, AstError> {
        algebra::keyof(&self.ast).map(Schema::from_ast)
    }

    // ── Wrapping combinators ─────────────────────────────────────────

    /// Refine with a boolean predicate. The decoded type is unchanged;
    /// the domain narrows.
    pub fn filter<F>(&self, predicate: F) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Schema::from_ast(Ast::refinement(self.ast.clone(), Arc::new(predicate)))
    }

    /// `null | self`.
    pub fn nullable(&self) -> Schema {
        Schema::from_ast(Ast::union(vec![
            Ast::literal(LiteralValue::Null),
            self.ast.clone(),
        ]))
    }

    /// Attach a rest segment to a tuple schema: the first member repeats,
    /// any following members are trailing fixed elements.
    pub fn rest(&self, members: Vec<Schema>) -> Result<Schema, AstError> {
        match &self.ast.kind {
            AstKind::Tuple(tuple) if tuple.rest.is_none() => {
                let node = Ast::tuple(
                    tuple.elements.clone(),
                    Some(members.into_iter().map(Schema::into_ast).collect()),
                    tuple.readonly,
                )?;
                Ok(Schema::from_ast(merge_annotations(
                    &node,
                    &self.ast.annotations,
                )))
            }
            other => Err(AstError::UnsupportedOperation {
                operation: "rest",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    // ── Annotations ──────────────────────────────────────────────────

    pub fn annotate(&self, key: AnnotationKey, value: AnnotationValue) -> Schema {
        Schema::from_ast(merge_annotations(
            &self.ast,
            &Annotations::new().with(key, value),
        ))
    }

    pub fn identifier(&self, identifier: impl Into<String>) -> Schema {
        self.annotate(
            AnnotationKey::Identifier,
            AnnotationValue::Text(identifier.into()),
        )
    }

    pub fn title(&self, title: impl Into<String>) -> Schema {
        self.annotate(AnnotationKey::Title, AnnotationValue::Text(title.into()))
    }

    pub fn description(&self, description: impl Into<String>) -> Schema {
        self.annotate(
            AnnotationKey::Description,
            AnnotationValue::Text(description.into()),
        )
    }

    pub fn documentation(&self, documentation: impl Into<String>) -> Schema {
        self.annotate(
            AnnotationKey::Documentation,
            AnnotationValue::Text(documentation.into()),
        )
    }

    pub fn examples(&self, examples: Vec<Value>) -> Schema {
        self.annotate(AnnotationKey::Examples, AnnotationValue::Examples(examples))
    }

    /// Override the failure message at this site.
    pub fn message<F>(&self, message: F) -> Schema
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.annotate(AnnotationKey::Message, AnnotationValue::Message(Arc::new(message)))
    }

    /// Supply a printer for the pretty interpreter.
    pub fn pretty_printer<F>(&self, printer: F) -> Schema
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.annotate(AnnotationKey::Pretty, AnnotationValue::Pretty(Arc::new(printer)))
    }
}

// ──────────────────────────────────────────────
// Keyword factories
// ──────────────────────────────────────────────

pub fn never() -> Schema {
    Schema::from_ast(Ast::never())
}

pub fn unknown() -> Schema {
    Schema::from_ast(Ast::unknown())
}

pub fn any() -> Schema {
    Schema::from_ast(Ast::any())
}

pub fn void_() -> Schema {
    Schema::from_ast(Ast::void())
}

pub fn undefined() -> Schema {
    Schema::from_ast(Ast::undefined())
}

pub fn string() -> Schema {
    Schema::from_ast(Ast::string())
}

pub fn number() -> Schema {
    Schema::from_ast(Ast::number())
}

pub fn boolean() -> Schema {
    Schema::from_ast(Ast::boolean())
}

pub fn bigint() -> Schema {
    Schema::from_ast(Ast::bigint())
}

pub fn symbol() -> Schema {
    Schema::from_ast(Ast::symbol())
}

pub fn object() -> Schema {
    Schema::from_ast(Ast::object())
}

// ──────────────────────────────────────────────
// Leaf factories
// ──────────────────────────────────────────────

pub fn literal(value: impl Into<LiteralValue>) -> Schema {
    Schema::from_ast(Ast::literal(value))
}

/// A union of literal constants.
pub fn literals(values: Vec<LiteralValue>) -> Schema {
    Schema::from_ast(Ast::union(values.into_iter().map(Ast::literal).collect()))
}

pub fn unique_symbol(symbol: Symbol) -> Schema {
    Schema::from_ast(Ast::unique_symbol(symbol))
}

/// `` `head${span}lit…` ``: spans pair a string/number schema with the
/// literal text that follows it.
pub fn template_literal(
    head: impl Into<String>,
    spans: Vec<(Schema, String)>,
) -> Result<Schema, AstError> {
    let spans = spans
        .into_iter()
        .map(|(schema, literal)| TemplateSpan {
            ty: schema.into_ast(),
            literal,
        })
        .collect();
    Ast::template_literal(head, spans).map(Schema::from_ast)
}

/// Ordered `(name, value)` pairs.
pub fn enums(members: Vec<(&str, LiteralValue)>) -> Schema {
    Schema::from_ast(Ast::enums(
        members
            .into_iter()
            .map(|(name, value)| EnumMember {
                name: name.to_owned(),
                value,
            })
            .collect(),
    ))
}

// ──────────────────────────────────────────────
// Structs
// ──────────────────────────────────────────────

/// A field descriptor inside `struct_`: a schema plus optionality and
/// readonly markers.
#[derive(Clone)]
pub struct Field {
    schema: Schema,
    optional: bool,
    readonly: bool,
}

impl Field {
    pub fn required(schema: Schema) -> Field {
        Field {
            schema,
            optional: false,
            readonly: false,
        }
    }

    pub fn optional(schema: Schema) -> Field {
        Field {
            schema,
            optional: true,
            readonly: false,
        }
    }

    pub fn readonly(mut self) -> Field {
        self.readonly = true;
        self
    }
}

impl From<Schema> for Field {
    fn from(schema: Schema) -> Field {
        Field::required(schema)
    }
}

/// A required field.
pub fn required(schema: Schema) -> Field {
    Field::required(schema)
}

/// An optional field: the key may be absent.
pub fn optional(schema: Schema) -> Field {
    Field::optional(schema)
}

/// A struct with the given property signatures, in declaration order.
pub fn struct_<K>(fields: Vec<(K, Field)>) -> Result<Schema, AstError>
where
    K: Into<PropertyKey>,
{
    let properties = fields
        .into_iter()
        .map(|(name, field)| PropertySignature {
            name: name.into(),
            ty: field.schema.into_ast(),
            optional: field.optional,
            readonly: field.readonly,
        })
        .collect();
    Ast::type_literal(properties, vec![]).map(Schema::from_ast)
}

/// A record with an index signature only: keys match `key`'s schema,
/// values decode against `value`.
pub fn record(key: Schema, value: Schema) -> Result<Schema, AstError> {
    Ast::type_literal(
        vec![],
        vec![IndexSignature {
            parameter: key.into_ast(),
            ty: value.into_ast(),
            readonly: false,
        }],
    )
    .map(Schema::from_ast)
}

// ──────────────────────────────────────────────
// Tuples and arrays
// ──────────────────────────────────────────────

/// One fixed tuple slot.
#[derive(Clone)]
pub struct TupleItem {
    schema: Schema,
    optional: bool,
}

/// A required tuple element.
pub fn element(schema: Schema) -> TupleItem {
    TupleItem {
        schema,
        optional: false,
    }
}

/// An optional tuple element; only valid after all required ones.
pub fn optional_element(schema: Schema) -> TupleItem {
    TupleItem {
        schema,
        optional: true,
    }
}

pub fn tuple(items: Vec<TupleItem>) -> Result<Schema, AstError> {
    let elements = items
        .into_iter()
        .map(|item| TupleElement {
            ty: item.schema.into_ast(),
            optional: item.optional,
        })
        .collect();
    Ast::tuple(elements, None, false).map(Schema::from_ast)
}

/// `item[]`: a tuple with no fixed elements and a single-member rest.
pub fn array(item: Schema) -> Schema {
    Schema::from_ast(Ast::tuple_unchecked(
        vec![],
        Some(vec![item.into_ast()]),
        false,
    ))
}

/// An array refined to hold at least one element.
pub fn non_empty_array(item: Schema) -> Schema {
    array(item)
        .filter(|v| matches!(v, Value::Array(items) if !items.is_empty()))
        .message(|v| {
            format!(
                "Expected a nonempty array, actual {}",
                crate::pretty::render_value(v)
            )
        })
}

// ──────────────────────────────────────────────
// Unions, recursion, transforms
// ──────────────────────────────────────────────

pub fn union(members: Vec<Schema>) -> Schema {
    Schema::from_ast(Ast::union(
        members.into_iter().map(Schema::into_ast).collect(),
    ))
}

pub fn nullable(schema: Schema) -> Schema {
    schema.nullable()
}

/// A deferred, memoized schema enabling recursion: the thunk is forced
/// at most once per interpreter.
pub fn lazy<F>(thunk: F) -> Schema
where
    F: Fn() -> Schema + Send + Sync + 'static,
{
    Schema::from_ast(Ast::lazy(Arc::new(move || thunk().into_ast())))
}

/// A transform whose mappings cannot fail.
pub fn transform<D, E>(from: Schema, to: Schema, decode: D, encode: E) -> Schema
where
    D: Fn(&Value) -> Value + Send + Sync + 'static,
    E: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Schema::from_ast(Ast::transform(
        from.into_ast(),
        to.into_ast(),
        Arc::new(move |value: &Value, _: &ParseOptions| success(decode(value))),
        Arc::new(move |value: &Value, _: &ParseOptions| success(encode(value))),
    ))
}

/// A transform whose mappings return parse results and may fail in
/// either direction.
pub fn transform_or_fail<D, E>(from: Schema, to: Schema, decode: D, encode: E) -> Schema
where
    D: Fn(&Value, &ParseOptions) -> ParseResult + Send + Sync + 'static,
    E: Fn(&Value, &ParseOptions) -> ParseResult + Send + Sync + 'static,
{
    Schema::from_ast(Ast::transform(
        from.into_ast(),
        to.into_ast(),
        Arc::new(decode),
        Arc::new(encode),
    ))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{failure, ParseIssue};
    use crate::value::ObjectMap;

    fn obj(entries: Vec<(&str, Value)>) -> Value {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (PropertyKey::from(k), v))
                .collect(),
        )
    }

    #[test]
    fn struct_with_optional_field() {
        let schema = struct_(vec![
            ("a", required(string())),
            ("b", optional(number())),
        ])
        .unwrap();
        assert_eq!(
            schema.decode_or_err(&obj(vec![("a", "x".into())])).unwrap(),
            obj(vec![("a", "x".into())])
        );
        assert!(schema
            .decode_or_err(&obj(vec![("a", "x".into()), ("b", 1.into())]))
            .is_ok());
        assert!(schema.decode_or_err(&obj(vec![("a", 1.into())])).is_err());
    }

    #[test]
    fn tuple_then_rest_pipeline() {
        let schema = tuple(vec![element(string())])
            .unwrap()
            .rest(vec![number()])
            .unwrap();
        assert!(schema
            .decode_or_err(&Value::Array(vec!["a".into(), 1.into(), 2.into()]))
            .is_ok());
        assert!(schema
            .decode_or_err(&Value::Array(vec!["a".into(), "b".into()]))
            .is_err());
    }

    #[test]
    fn literals_build_a_union() {
        let schema = literals(vec!["a".into(), "b".into()]);
        assert!(schema.is(&"a".into()));
        assert!(schema.is(&"b".into()));
        assert!(!schema.is(&"c".into()));
    }

    #[test]
    fn nullable_wraps_in_a_null_union() {
        let schema = string().nullable();
        assert!(schema.is(&Value::Null));
        assert!(schema.is(&"x".into()));
        assert!(!schema.is(&1.into()));
    }

    #[test]
    fn record_decodes_homogeneous_maps() {
        let schema = record(string(), number()).unwrap();
        let decoded = schema
            .decode_or_err(&obj(vec![("a", 1.into()), ("b", 2.into())]))
            .unwrap();
        assert_eq!(decoded, obj(vec![("a", 1.into()), ("b", 2.into())]));
        assert!(schema.decode_or_err(&obj(vec![("a", "x".into())])).is_err());
    }

    #[test]
    fn filter_message_formats_with_offending_value() {
        let schema = number()
            .filter(|v| matches!(v, Value::Number(n) if n.is_sign_positive() && !n.is_zero()))
            .message(|v| format!("{} must be positive", crate::pretty::render_value(v)));
        let err = schema.decode_or_err(&Value::from(-1)).unwrap_err();
        assert_eq!(err.message(), "-1 must be positive");
    }

    #[test]
    fn asserts_round_trips_success_and_failure() {
        let schema = string();
        assert!(schema.asserts(&"ok".into()).is_ok());
        let err = schema.asserts(&Value::from(3)).unwrap_err();
        assert_eq!(err.message(), "Expected string, actual 3");
    }

    #[test]
    fn decode_then_encode_is_identity_without_transforms() {
        let schema = struct_(vec![
            ("id", required(string())),
            ("tags", required(array(string()))),
        ])
        .unwrap();
        let input = obj(vec![
            ("id", "k1".into()),
            ("tags", Value::Array(vec!["a".into(), "b".into()])),
        ]);
        let decoded = schema.decode_or_err(&input).unwrap();
        let encoded = schema.encode_or_err(&decoded).unwrap();
        assert_eq!(encoded, input);
    }

    #[test]
    fn transform_or_fail_round_trips() {
        // string <-> number via decimal parsing.
        let schema = transform_or_fail(
            string(),
            number(),
            |v: &Value, _: &ParseOptions| match v {
                Value::String(s) => match s.parse::<rust_decimal::Decimal>() {
                    Ok(d) => success(Value::Number(d)),
                    Err(_) => failure(ParseIssue::Unexpected { actual: v.clone() }),
                },
                other => success(other.clone()),
            },
            |v: &Value, _: &ParseOptions| match v {
                Value::Number(d) => success(Value::String(d.normalize().to_string())),
                other => success(other.clone()),
            },
        );
        let decoded = schema.decode_or_err(&"10.25".into()).unwrap();
        assert_eq!(decoded, Value::Number("10.25".parse().unwrap()));
        let encoded = schema.encode_or_err(&decoded).unwrap();
        assert_eq!(encoded, Value::from("10.25"));
        assert!(schema.decode_or_err(&"not-a-number".into()).is_err());
    }

    #[test]
    fn recursive_schema_via_lazy() {
        fn node() -> Schema {
            lazy(|| {
                struct_(vec![
                    ("v", required(number())),
                    ("next", required(node().nullable())),
                ])
                .unwrap_or_else(|_| never())
            })
        }
        let input = obj(vec![
            ("v", 1.into()),
            ("next", obj(vec![("v", 2.into()), ("next", Value::Null)])),
        ]);
        assert!(node().decode_or_err(&input).is_ok());
        assert!(node().is(&input));
    }

    #[test]
    fn pick_partial_pipeline_over_the_surface() {
        let schema = struct_(vec![
            ("a", required(string())),
            ("b", required(number())),
        ])
        .unwrap();
        let partial = schema.partial().unwrap();
        assert!(partial.decode_or_err(&obj(vec![])).is_ok());
        let picked = schema.pick(&["a".into()]).unwrap();
        assert!(picked.decode_or_err(&obj(vec![("a", "x".into())])).is_ok());
        assert!(picked.decode_or_err(&obj(vec![])).is_err());
    }

    #[test]
    fn keyof_over_the_surface() {
        let schema = struct_(vec![
            ("a", required(string())),
            ("b", required(number())),
        ])
        .unwrap();
        let keys = schema.keyof().unwrap();
        assert!(keys.is(&"a".into()));
        assert!(keys.is(&"b".into()));
        assert!(!keys.is(&"c".into()));
    }

    #[test]
    fn non_empty_array_requires_one_element() {
        let schema = non_empty_array(number());
        assert!(schema.is(&Value::Array(vec![1.into()])));
        let err = schema.decode_or_err(&Value::Array(vec![])).unwrap_err();
        assert_eq!(err.message(), "Expected a nonempty array, actual []");
    }

    #[test]
    fn annotations_compose_with_latest_winning() {
        let schema = string().identifier("First").identifier("Second").title("T");
        assert_eq!(schema.ast().annotations.identifier(), Some("Second"));
        assert_eq!(schema.ast().annotations.title(), Some("T"));
    }

    #[test]
    fn symbol_keyed_struct_fields() {
        let key = Symbol::new("meta");
        let schema = struct_(vec![
            (PropertyKey::from("name"), required(string())),
            (PropertyKey::from(key.clone()), required(number())),
        ])
        .unwrap();
        let input: ObjectMap = [
            (PropertyKey::from("name"), Value::from("x")),
            (PropertyKey::from(key), Value::from(1)),
        ]
        .into_iter()
        .collect();
        assert!(schema.decode_or_err(&Value::Object(input)).is_ok());
    }

    #[test]
    fn enums_surface() {
        let schema = enums(vec![("Up", 0.into()), ("Down", 1.into())]);
        assert!(schema.is(&0.into()));
        assert!(!schema.is(&2.into()));
    }

    #[test]
    fn template_literal_surface() {
        let schema = template_literal("user-", vec![(number(), String::new())]).unwrap();
        assert!(schema.is(&"user-17".into()));
        assert!(!schema.is(&"user-abc".into()));
    }
}
