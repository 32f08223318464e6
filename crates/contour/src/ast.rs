//! The schema AST: a closed tagged sum describing every schema form.
//!
//! Nodes are immutable value objects behind `Arc`; structural rewrites
//! build new nodes and never mutate inputs. Constructors enforce the
//! structural invariants eagerly, so an invalid shape is a build-time
//! `AstError`, never a decode-time surprise.

use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::annotations::Annotations;
use crate::result::{ParseOptions, ParseResult};
use crate::value::{PropertyKey, Symbol, Value};

/// A refinement predicate over decoded values.
pub type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// One direction of a transform; may fail with parse issues of its own.
pub type TransformFn = Arc<dyn Fn(&Value, &ParseOptions) -> ParseResult + Send + Sync>;

/// A deferred schema, forced on demand and memoized by node identity.
pub type ThunkFn = Arc<dyn Fn() -> Arc<Ast> + Send + Sync>;

static NEXT_LAZY_ID: AtomicU64 = AtomicU64::new(1);

// ──────────────────────────────────────────────
// Node model
// ──────────────────────────────────────────────

/// A schema AST node: a variant plus its annotation map.
#[derive(Clone)]
pub struct Ast {
    pub kind: AstKind,
    pub annotations: Annotations,
}

/// The closed variant set.
#[derive(Clone)]
pub enum AstKind {
    // Keyword leaves
    Never,
    Unknown,
    Any,
    Void,
    Undefined,
    StringKeyword,
    NumberKeyword,
    BooleanKeyword,
    BigIntKeyword,
    SymbolKeyword,
    ObjectKeyword,

    /// A primitive constant.
    Literal(LiteralValue),
    /// A specific symbol identity.
    UniqueSymbol(Symbol),
    /// A regex-shaped string domain.
    TemplateLiteral(TemplateLiteral),
    /// Ordered (name, value) pairs.
    Enums(Vec<EnumMember>),
    Tuple(TupleType),
    TypeLiteral(TypeLiteralType),
    /// ≥2 members after normalization.
    Union(Vec<Arc<Ast>>),
    Refinement(RefinementType),
    Transform(TransformType),
    Lazy(LazyType),
    TypeAlias(TypeAliasType),
}

/// A primitive constant: string, number, boolean, null, or bigint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(String),
    Number(Decimal),
    Boolean(bool),
    Null,
    BigInt(i128),
}

impl LiteralValue {
    pub fn to_value(&self) -> Value {
        match self {
            LiteralValue::String(s) => Value::String(s.clone()),
            LiteralValue::Number(d) => Value::Number(*d),
            LiteralValue::Boolean(b) => Value::Boolean(*b),
            LiteralValue::Null => Value::Null,
            LiteralValue::BigInt(i) => Value::BigInt(*i),
        }
    }

    /// Strict equality against a dynamic value.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (LiteralValue::String(a), Value::String(b)) => a == b,
            (LiteralValue::Number(a), Value::Number(b)) => a == b,
            (LiteralValue::Boolean(a), Value::Boolean(b)) => a == b,
            (LiteralValue::Null, Value::Null) => true,
            (LiteralValue::BigInt(a), Value::BigInt(b)) => a == b,
            _ => false,
        }
    }

    /// The literal form of a primitive value, when it has one.
    pub fn from_value(value: &Value) -> Option<LiteralValue> {
        match value {
            Value::String(s) => Some(LiteralValue::String(s.clone())),
            Value::Number(d) => Some(LiteralValue::Number(*d)),
            Value::Boolean(b) => Some(LiteralValue::Boolean(*b)),
            Value::Null => Some(LiteralValue::Null),
            Value::BigInt(i) => Some(LiteralValue::BigInt(*i)),
            _ => None,
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_owned())
    }
}

impl From<i64> for LiteralValue {
    fn from(i: i64) -> Self {
        LiteralValue::Number(Decimal::from(i))
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => write!(f, "{:?}", s),
            LiteralValue::Number(d) => write!(f, "{}", d),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::Null => write!(f, "null"),
            LiteralValue::BigInt(i) => write!(f, "{}n", i),
        }
    }
}

/// A template literal: a head string and ordered spans.
#[derive(Clone)]
pub struct TemplateLiteral {
    pub head: String,
    pub spans: Vec<TemplateSpan>,
}

/// One `(type, literal)` span. The type must resolve to the string or
/// number keyword, possibly under refinement.
#[derive(Clone)]
pub struct TemplateSpan {
    pub ty: Arc<Ast>,
    pub literal: String,
}

/// The alphabet a template span draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanBase {
    String,
    Number,
}

impl TemplateLiteral {
    /// The anchored regex source recognizing exactly this template's
    /// language: `^head(span)lit…$` with `.*` for string spans and
    /// `-?\d+(\.\d+)?` for number spans.
    pub fn regex_source(&self) -> String {
        let mut source = String::from("^");
        source.push_str(&regex::escape(&self.head));
        for span in &self.spans {
            match span_base(&span.ty) {
                Some(SpanBase::Number) => source.push_str(r"-?\d+(?:\.\d+)?"),
                _ => source.push_str(".*"),
            }
            source.push_str(&regex::escape(&span.literal));
        }
        source.push('$');
        source
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: LiteralValue,
}

#[derive(Clone)]
pub struct TupleElement {
    pub ty: Arc<Ast>,
    pub optional: bool,
}

/// Ordered fixed elements, an optional rest segment (head type repeated,
/// then trailing fixed elements), and a readonly flag.
#[derive(Clone)]
pub struct TupleType {
    pub elements: Vec<TupleElement>,
    pub rest: Option<Vec<Arc<Ast>>>,
    pub readonly: bool,
}

#[derive(Clone)]
pub struct PropertySignature {
    pub name: PropertyKey,
    pub ty: Arc<Ast>,
    pub optional: bool,
    pub readonly: bool,
}

impl PropertySignature {
    pub fn new(name: impl Into<PropertyKey>, ty: Arc<Ast>) -> Self {
        PropertySignature {
            name: name.into(),
            ty,
            optional: false,
            readonly: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// Matches keys by parameter type: `string`, `symbol`, a template
/// literal, or a refinement thereof.
#[derive(Clone)]
pub struct IndexSignature {
    pub parameter: Arc<Ast>,
    pub ty: Arc<Ast>,
    pub readonly: bool,
}

#[derive(Clone, Default)]
pub struct TypeLiteralType {
    pub properties: Vec<PropertySignature>,
    pub index_signatures: Vec<IndexSignature>,
}

#[derive(Clone)]
pub struct RefinementType {
    pub from: Arc<Ast>,
    pub predicate: PredicateFn,
}

#[derive(Clone)]
pub struct TransformType {
    pub from: Arc<Ast>,
    pub to: Arc<Ast>,
    pub decode: TransformFn,
    pub encode: TransformFn,
}

#[derive(Clone)]
pub struct LazyType {
    /// Process-unique identity; interpreters memoize the forced thunk
    /// per interpretation context keyed by this id.
    pub id: u64,
    pub thunk: ThunkFn,
}

#[derive(Clone)]
pub struct TypeAliasType {
    pub type_parameters: Vec<Arc<Ast>>,
    pub ty: Arc<Ast>,
}

// ──────────────────────────────────────────────
// Constructors
// ──────────────────────────────────────────────

impl Ast {
    fn make(kind: AstKind) -> Arc<Ast> {
        Arc::new(Ast {
            kind,
            annotations: Annotations::new(),
        })
    }

    pub fn never() -> Arc<Ast> {
        Ast::make(AstKind::Never)
    }

    pub fn unknown() -> Arc<Ast> {
        Ast::make(AstKind::Unknown)
    }

    pub fn any() -> Arc<Ast> {
        Ast::make(AstKind::Any)
    }

    pub fn void() -> Arc<Ast> {
        Ast::make(AstKind::Void)
    }

    pub fn undefined() -> Arc<Ast> {
        Ast::make(AstKind::Undefined)
    }

    pub fn string() -> Arc<Ast> {
        Ast::make(AstKind::StringKeyword)
    }

    pub fn number() -> Arc<Ast> {
        Ast::make(AstKind::NumberKeyword)
    }

    pub fn boolean() -> Arc<Ast> {
        Ast::make(AstKind::BooleanKeyword)
    }

    pub fn bigint() -> Arc<Ast> {
        Ast::make(AstKind::BigIntKeyword)
    }

    pub fn symbol() -> Arc<Ast> {
        Ast::make(AstKind::SymbolKeyword)
    }

    pub fn object() -> Arc<Ast> {
        Ast::make(AstKind::ObjectKeyword)
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Arc<Ast> {
        Ast::make(AstKind::Literal(value.into()))
    }

    pub fn unique_symbol(symbol: Symbol) -> Arc<Ast> {
        Ast::make(AstKind::UniqueSymbol(symbol))
    }

    /// Build a template literal node; every span type must resolve to the
    /// string or number keyword, possibly under refinement.
    pub fn template_literal(
        head: impl Into<String>,
        spans: Vec<TemplateSpan>,
    ) -> Result<Arc<Ast>, AstError> {
        for span in &spans {
            if span_base(&span.ty).is_none() {
                return Err(AstError::InvalidTemplateSpan {
                    found: span.ty.kind.kind_name().to_owned(),
                });
            }
        }
        Ok(Ast::make(AstKind::TemplateLiteral(TemplateLiteral {
            head: head.into(),
            spans,
        })))
    }

    pub fn enums(members: Vec<EnumMember>) -> Arc<Ast> {
        Ast::make(AstKind::Enums(members))
    }

    /// Build a tuple node, enforcing the rest discipline: a rest segment
    /// is nonempty, and optional fixed elements follow required ones.
    pub fn tuple(
        elements: Vec<TupleElement>,
        rest: Option<Vec<Arc<Ast>>>,
        readonly: bool,
    ) -> Result<Arc<Ast>, AstError> {
        let mut seen_optional = false;
        for (index, element) in elements.iter().enumerate() {
            if element.optional {
                seen_optional = true;
            } else if seen_optional {
                return Err(AstError::RequiredAfterOptional { index });
            }
        }
        if let Some(rest) = &rest {
            if rest.is_empty() {
                return Err(AstError::EmptyRest);
            }
            // Trailing fixed elements after the rest segment are ambiguous
            // when combined with optional holes before it.
            if rest.len() > 1 && seen_optional {
                return Err(AstError::OptionalWithTrailingRest);
            }
        }
        Ok(Ast::make(AstKind::Tuple(TupleType {
            elements,
            rest,
            readonly,
        })))
    }

    /// Build a struct/record node, enforcing key uniqueness and index
    /// parameter typing.
    pub fn type_literal(
        properties: Vec<PropertySignature>,
        index_signatures: Vec<IndexSignature>,
    ) -> Result<Arc<Ast>, AstError> {
        for (i, prop) in properties.iter().enumerate() {
            if properties[..i].iter().any(|p| p.name == prop.name) {
                return Err(AstError::DuplicateProperty {
                    key: prop.name.clone(),
                });
            }
        }
        for sig in &index_signatures {
            if !is_valid_index_parameter(&sig.parameter) {
                return Err(AstError::InvalidIndexParameter {
                    found: sig.parameter.kind.kind_name().to_owned(),
                });
            }
        }
        Ok(Ast::make(AstKind::TypeLiteral(TypeLiteralType {
            properties,
            index_signatures,
        })))
    }

    /// Build a union, applying the normalization invariant: nested unions
    /// are flattened, `never` members dropped, `unknown`/`any` collapse
    /// the union, and structural duplicates are removed. Zero members
    /// yield `never`; a single member is returned as-is.
    pub fn union(members: Vec<Arc<Ast>>) -> Arc<Ast> {
        let mut flat: Vec<Arc<Ast>> = Vec::with_capacity(members.len());
        for member in members {
            match &member.kind {
                AstKind::Union(inner) => flat.extend(inner.iter().cloned()),
                AstKind::Never => {}
                _ => flat.push(member),
            }
        }
        if let Some(absorbing) = flat
            .iter()
            .find(|m| matches!(m.kind, AstKind::Unknown | AstKind::Any))
        {
            return absorbing.clone();
        }
        let mut unique: Vec<Arc<Ast>> = Vec::with_capacity(flat.len());
        for member in flat {
            if !unique.iter().any(|m| structurally_equal(m, &member)) {
                unique.push(member);
            }
        }
        match unique.len() {
            0 => Ast::never(),
            1 => unique.into_iter().next().unwrap_or_else(Ast::never),
            _ => Ast::make(AstKind::Union(unique)),
        }
    }

    /// Tuple constructor for shapes the caller has already proven valid
    /// (for example `array`, which is always `([], rest [item])`).
    pub(crate) fn tuple_unchecked(
        elements: Vec<TupleElement>,
        rest: Option<Vec<Arc<Ast>>>,
        readonly: bool,
    ) -> Arc<Ast> {
        Ast::make(AstKind::Tuple(TupleType {
            elements,
            rest,
            readonly,
        }))
    }

    pub fn refinement(from: Arc<Ast>, predicate: PredicateFn) -> Arc<Ast> {
        Ast::make(AstKind::Refinement(RefinementType { from, predicate }))
    }

    pub fn transform(
        from: Arc<Ast>,
        to: Arc<Ast>,
        decode: TransformFn,
        encode: TransformFn,
    ) -> Arc<Ast> {
        Ast::make(AstKind::Transform(TransformType {
            from,
            to,
            decode,
            encode,
        }))
    }

    /// Build a lazy node with a fresh identity. The thunk is evaluated on
    /// demand; interpreters force it at most once per context.
    pub fn lazy(thunk: ThunkFn) -> Arc<Ast> {
        Ast::make(AstKind::Lazy(LazyType {
            id: NEXT_LAZY_ID.fetch_add(1, Ordering::Relaxed),
            thunk,
        }))
    }

    pub fn type_alias(type_parameters: Vec<Arc<Ast>>, ty: Arc<Ast>) -> Arc<Ast> {
        Ast::make(AstKind::TypeAlias(TypeAliasType {
            type_parameters,
            ty,
        }))
    }
}

/// Return a new node of the same variant with `overlay` merged onto the
/// existing annotations; newer keys win.
pub fn merge_annotations(ast: &Arc<Ast>, overlay: &Annotations) -> Arc<Ast> {
    Arc::new(Ast {
        kind: ast.kind.clone(),
        annotations: ast.annotations.merge(overlay),
    })
}

// ──────────────────────────────────────────────
// Structural predicates
// ──────────────────────────────────────────────

impl Ast {
    pub fn is_never(&self) -> bool {
        matches!(self.kind, AstKind::Never)
    }

    pub fn is_string_keyword(&self) -> bool {
        matches!(self.kind, AstKind::StringKeyword)
    }

    pub fn is_number_keyword(&self) -> bool {
        matches!(self.kind, AstKind::NumberKeyword)
    }

    pub fn is_refinement(&self) -> bool {
        matches!(self.kind, AstKind::Refinement(_))
    }

    pub fn is_transform(&self) -> bool {
        matches!(self.kind, AstKind::Transform(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, AstKind::Union(_))
    }

    pub fn is_type_literal(&self) -> bool {
        matches!(self.kind, AstKind::TypeLiteral(_))
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self.kind, AstKind::Tuple(_))
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.kind, AstKind::Lazy(_))
    }

    pub fn as_type_literal(&self) -> Option<&TypeLiteralType> {
        match &self.kind {
            AstKind::TypeLiteral(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&[Arc<Ast>]> {
        match &self.kind {
            AstKind::Union(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleType> {
        match &self.kind {
            AstKind::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match &self.kind {
            AstKind::Literal(l) => Some(l),
            _ => None,
        }
    }
}

impl AstKind {
    /// The variant name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AstKind::Never => "never",
            AstKind::Unknown => "unknown",
            AstKind::Any => "any",
            AstKind::Void => "void",
            AstKind::Undefined => "undefined",
            AstKind::StringKeyword => "string",
            AstKind::NumberKeyword => "number",
            AstKind::BooleanKeyword => "boolean",
            AstKind::BigIntKeyword => "bigint",
            AstKind::SymbolKeyword => "symbol",
            AstKind::ObjectKeyword => "object",
            AstKind::Literal(_) => "literal",
            AstKind::UniqueSymbol(_) => "unique symbol",
            AstKind::TemplateLiteral(_) => "template literal",
            AstKind::Enums(_) => "enums",
            AstKind::Tuple(_) => "tuple",
            AstKind::TypeLiteral(_) => "type literal",
            AstKind::Union(_) => "union",
            AstKind::Refinement(_) => "refinement",
            AstKind::Transform(_) => "transform",
            AstKind::Lazy(_) => "lazy",
            AstKind::TypeAlias(_) => "type alias",
        }
    }
}

/// An index-signature parameter must be `string`, `symbol`, a template
/// literal, or a refinement of one of those.
pub fn is_valid_index_parameter(ast: &Ast) -> bool {
    match &ast.kind {
        AstKind::StringKeyword | AstKind::SymbolKeyword | AstKind::TemplateLiteral(_) => true,
        AstKind::Refinement(r) => is_valid_index_parameter(&r.from),
        _ => false,
    }
}

/// Resolve a template span type to its alphabet, looking through
/// refinements. `None` means the span type is invalid.
pub fn span_base(ast: &Ast) -> Option<SpanBase> {
    match &ast.kind {
        AstKind::StringKeyword => Some(SpanBase::String),
        AstKind::NumberKeyword => Some(SpanBase::Number),
        AstKind::Refinement(r) => span_base(&r.from),
        _ => None,
    }
}

// ──────────────────────────────────────────────
// Structural equality
// ──────────────────────────────────────────────

/// Structural equality over nodes. Closures (predicates, transform
/// directions, thunks) compare by identity; `Lazy` compares by node id.
/// Annotations do not participate.
pub fn structurally_equal(a: &Arc<Ast>, b: &Arc<Ast>) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    match (&a.kind, &b.kind) {
        (AstKind::Never, AstKind::Never)
        | (AstKind::Unknown, AstKind::Unknown)
        | (AstKind::Any, AstKind::Any)
        | (AstKind::Void, AstKind::Void)
        | (AstKind::Undefined, AstKind::Undefined)
        | (AstKind::StringKeyword, AstKind::StringKeyword)
        | (AstKind::NumberKeyword, AstKind::NumberKeyword)
        | (AstKind::BooleanKeyword, AstKind::BooleanKeyword)
        | (AstKind::BigIntKeyword, AstKind::BigIntKeyword)
        | (AstKind::SymbolKeyword, AstKind::SymbolKeyword)
        | (AstKind::ObjectKeyword, AstKind::ObjectKeyword) => true,
        (AstKind::Literal(x), AstKind::Literal(y)) => x == y,
        (AstKind::UniqueSymbol(x), AstKind::UniqueSymbol(y)) => x == y,
        (AstKind::TemplateLiteral(x), AstKind::TemplateLiteral(y)) => {
            x.head == y.head
                && x.spans.len() == y.spans.len()
                && x.spans.iter().zip(&y.spans).all(|(sx, sy)| {
                    sx.literal == sy.literal && structurally_equal(&sx.ty, &sy.ty)
                })
        }
        (AstKind::Enums(x), AstKind::Enums(y)) => x == y,
        (AstKind::Tuple(x), AstKind::Tuple(y)) => {
            x.readonly == y.readonly
                && x.elements.len() == y.elements.len()
                && x.elements.iter().zip(&y.elements).all(|(ex, ey)| {
                    ex.optional == ey.optional && structurally_equal(&ex.ty, &ey.ty)
                })
                && match (&x.rest, &y.rest) {
                    (None, None) => true,
                    (Some(rx), Some(ry)) => {
                        rx.len() == ry.len()
                            && rx.iter().zip(ry).all(|(tx, ty)| structurally_equal(tx, ty))
                    }
                    _ => false,
                }
        }
        (AstKind::TypeLiteral(x), AstKind::TypeLiteral(y)) => {
            x.properties.len() == y.properties.len()
                && x.index_signatures.len() == y.index_signatures.len()
                && x.properties.iter().zip(&y.properties).all(|(px, py)| {
                    px.name == py.name
                        && px.optional == py.optional
                        && px.readonly == py.readonly
                        && structurally_equal(&px.ty, &py.ty)
                })
                && x.index_signatures
                    .iter()
                    .zip(&y.index_signatures)
                    .all(|(sx, sy)| {
                        sx.readonly == sy.readonly
                            && structurally_equal(&sx.parameter, &sy.parameter)
                            && structurally_equal(&sx.ty, &sy.ty)
                    })
        }
        (AstKind::Union(x), AstKind::Union(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(mx, my)| structurally_equal(mx, my))
        }
        (AstKind::Refinement(x), AstKind::Refinement(y)) => {
            Arc::ptr_eq(&x.predicate, &y.predicate) && structurally_equal(&x.from, &y.from)
        }
        (AstKind::Transform(x), AstKind::Transform(y)) => {
            Arc::ptr_eq(&x.decode, &y.decode)
                && Arc::ptr_eq(&x.encode, &y.encode)
                && structurally_equal(&x.from, &y.from)
                && structurally_equal(&x.to, &y.to)
        }
        (AstKind::Lazy(x), AstKind::Lazy(y)) => x.id == y.id,
        (AstKind::TypeAlias(x), AstKind::TypeAlias(y)) => {
            x.type_parameters.len() == y.type_parameters.len()
                && x.type_parameters
                    .iter()
                    .zip(&y.type_parameters)
                    .all(|(px, py)| structurally_equal(px, py))
                && structurally_equal(&x.ty, &y.ty)
        }
        _ => false,
    }
}

// ──────────────────────────────────────────────
// Debug
// ──────────────────────────────────────────────

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.annotations.identifier() {
            Some(id) => write!(f, "Ast({}, {:?})", self.kind.kind_name(), id),
            None => write!(f, "Ast({})", self.kind.kind_name()),
        }
    }
}

// ──────────────────────────────────────────────
// Construction errors
// ──────────────────────────────────────────────

/// An invalid AST construction. These are programmer errors surfaced at
/// build time, not user-data errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    /// Two property signatures share a name.
    DuplicateProperty { key: PropertyKey },
    /// A rest segment was declared with no member types.
    EmptyRest,
    /// A required fixed tuple element follows an optional one.
    RequiredAfterOptional { index: usize },
    /// Optional fixed elements combined with trailing elements after a
    /// rest segment make index assignment ambiguous.
    OptionalWithTrailingRest,
    /// An index-signature parameter is not string/symbol/template-literal.
    InvalidIndexParameter { found: String },
    /// A template-literal span type is not string/number.
    InvalidTemplateSpan { found: String },
    /// `extend` found the same key with structurally different types.
    ExtendConflict { key: PropertyKey },
    /// `pick` named a key the subject cannot produce.
    UnknownKey { key: PropertyKey },
    /// An algebra operation was applied to an unsupported variant.
    UnsupportedOperation {
        operation: &'static str,
        found: String,
    },
}

impl fmt::Display for AstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstError::DuplicateProperty { key } => {
                write!(f, "duplicate property signature for key {}", key)
            }
            AstError::EmptyRest => write!(f, "tuple rest segment must not be empty"),
            AstError::RequiredAfterOptional { index } => write!(
                f,
                "required tuple element at index {} follows an optional element",
                index
            ),
            AstError::OptionalWithTrailingRest => write!(
                f,
                "optional tuple elements cannot be combined with trailing elements after a rest segment"
            ),
            AstError::InvalidIndexParameter { found } => write!(
                f,
                "index signature parameter must be string, symbol, or a template literal, got {}",
                found
            ),
            AstError::InvalidTemplateSpan { found } => write!(
                f,
                "template literal span type must be string or number, got {}",
                found
            ),
            AstError::ExtendConflict { key } => write!(
                f,
                "cannot extend: key {} exists on both sides with different types",
                key
            ),
            AstError::UnknownKey { key } => {
                write!(f, "key {} does not exist on this schema", key)
            }
            AstError::UnsupportedOperation { operation, found } => {
                write!(f, "{} is not supported on {}", operation, found)
            }
        }
    }
}

impl std::error::Error for AstError {}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
