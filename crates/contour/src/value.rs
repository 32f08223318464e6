//! Host-native dynamic values consumed and produced by the interpreters.
//!
//! Decoders accept a `Value` and produce a `Value`; no wire format is
//! implied. All numbers use `rust_decimal::Decimal` -- never `f64` -- so
//! values are exactly comparable and structural equality is total.

use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ──────────────────────────────────────────────
// Symbols
// ──────────────────────────────────────────────

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique symbol identity with an optional description.
///
/// Two symbols are equal only if they are the same symbol (same id);
/// the description is display metadata and never participates in
/// identity on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    id: u64,
    description: Option<String>,
}

impl Symbol {
    /// Mint a fresh symbol with a description.
    pub fn new(description: impl Into<String>) -> Self {
        Symbol {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: Some(description.into()),
        }
    }

    /// Mint a fresh symbol without a description.
    pub fn anonymous() -> Self {
        Symbol {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(d) => write!(f, "Symbol({})", d),
            None => write!(f, "Symbol()"),
        }
    }
}

// ──────────────────────────────────────────────
// Property keys
// ──────────────────────────────────────────────

/// An object property name: string and symbol keys coexist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    String(String),
    Symbol(Symbol),
}

impl PropertyKey {
    /// View the key as a value, for matching against index-signature
    /// parameter schemas.
    pub fn to_value(&self) -> Value {
        match self {
            PropertyKey::String(s) => Value::String(s.clone()),
            PropertyKey::Symbol(s) => Value::Symbol(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(s.to_owned())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::String(s)
    }
}

impl From<Symbol> for PropertyKey {
    fn from(s: Symbol) -> Self {
        PropertyKey::Symbol(s)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{:?}", s),
            PropertyKey::Symbol(s) => write!(f, "{}", s),
        }
    }
}

// ──────────────────────────────────────────────
// Objects
// ──────────────────────────────────────────────

/// An insertion-ordered property map.
///
/// Ordering is part of the decode contract: declared properties come out
/// in declaration order, accepted index keys in encounter order, so the
/// backing store must preserve insertion order rather than sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectMap {
    entries: Vec<(PropertyKey, Value)>,
}

impl ObjectMap {
    pub fn new() -> Self {
        ObjectMap {
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &PropertyKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert a property, replacing in place if the key already exists.
    pub fn insert(&mut self, key: PropertyKey, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(PropertyKey, Value)> for ObjectMap {
    fn from_iter<I: IntoIterator<Item = (PropertyKey, Value)>>(iter: I) -> Self {
        let mut map = ObjectMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

/// A host-native dynamic value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(Decimal),
    BigInt(i128),
    String(String),
    Symbol(Symbol),
    Array(Vec<Value>),
    Object(ObjectMap),
}

impl Value {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert from a JSON value.
    ///
    /// Fails only when a JSON number does not fit `Decimal` (about
    /// twenty-nine significant digits).
    pub fn from_json(json: &serde_json::Value) -> Result<Value, ValueError> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
            serde_json::Value::Number(n) => {
                let parsed = n
                    .to_string()
                    .parse::<Decimal>()
                    .map_err(|_| ValueError::NumberOutOfRange {
                        number: n.to_string(),
                    })?;
                Ok(Value::Number(parsed))
            }
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(Value::from_json(item)?);
                }
                Ok(Value::Array(out))
            }
            serde_json::Value::Object(fields) => {
                let mut map = ObjectMap::new();
                for (k, v) in fields {
                    map.insert(PropertyKey::String(k.clone()), Value::from_json(v)?);
                }
                Ok(Value::Object(map))
            }
        }
    }

    /// Convert to a JSON value.
    ///
    /// `Undefined`, symbols, symbol-keyed properties, and bigints outside
    /// the JSON-safe range have no JSON representation and are rejected.
    pub fn to_json(&self) -> Result<serde_json::Value, ValueError> {
        match self {
            Value::Undefined => Err(ValueError::UnrepresentableUndefined),
            Value::Null => Ok(serde_json::Value::Null),
            Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Number(d) => {
                let text = d.normalize().to_string();
                serde_json::from_str::<serde_json::Number>(&text)
                    .map(serde_json::Value::Number)
                    .map_err(|_| ValueError::NumberOutOfRange { number: text })
            }
            Value::BigInt(i) => {
                let as_i64 =
                    i64::try_from(*i).map_err(|_| ValueError::BigIntOutOfRange { value: *i })?;
                Ok(serde_json::Value::Number(serde_json::Number::from(as_i64)))
            }
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            Value::Symbol(s) => Err(ValueError::UnrepresentableSymbol { symbol: s.clone() }),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_json()?);
                }
                Ok(serde_json::Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map.iter() {
                    match k {
                        PropertyKey::String(name) => {
                            out.insert(name.clone(), v.to_json()?);
                        }
                        PropertyKey::Symbol(sym) => {
                            return Err(ValueError::UnrepresentableSymbol {
                                symbol: sym.clone(),
                            });
                        }
                    }
                }
                Ok(serde_json::Value::Object(out))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Decimal::from(i))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Number(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from value conversions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// `undefined` has no JSON representation.
    UnrepresentableUndefined,
    /// Symbols (as values or keys) have no JSON representation.
    UnrepresentableSymbol { symbol: Symbol },
    /// A bigint outside the i64 range cannot become a JSON number.
    BigIntOutOfRange { value: i128 },
    /// A number outside the Decimal range.
    NumberOutOfRange { number: String },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::UnrepresentableUndefined => {
                write!(f, "undefined has no JSON representation")
            }
            ValueError::UnrepresentableSymbol { symbol } => {
                write!(f, "{} has no JSON representation", symbol)
            }
            ValueError::BigIntOutOfRange { value } => {
                write!(f, "bigint {} does not fit in a JSON number", value)
            }
            ValueError::NumberOutOfRange { number } => {
                write!(f, "number {} is outside the representable range", number)
            }
        }
    }
}

impl std::error::Error for ValueError {}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn symbols_are_identity() {
        let a = Symbol::new("tag");
        let b = Symbol::new("tag");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.description(), Some("tag"));
    }

    #[test]
    fn object_map_preserves_insertion_order() {
        let mut map = ObjectMap::new();
        map.insert("b".into(), Value::from(1));
        map.insert("a".into(), Value::from(2));
        map.insert("b".into(), Value::from(3));
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![PropertyKey::from("b"), PropertyKey::from("a")]);
        assert_eq!(map.get(&"b".into()), Some(&Value::from(3)));
    }

    #[test]
    fn from_json_round_trips_plain_data() {
        let json = json!({ "name": "ada", "age": 36, "tags": ["x", "y"], "extra": null });
        let value = Value::from_json(&json).unwrap();
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn from_json_preserves_decimal_text() {
        let json = json!({ "amount": 10.25 });
        let value = Value::from_json(&json).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(
            obj.get(&"amount".into()),
            Some(&Value::Number("10.25".parse().unwrap()))
        );
    }

    #[test]
    fn to_json_rejects_symbols_and_undefined() {
        assert!(Value::Undefined.to_json().is_err());
        assert!(Value::Symbol(Symbol::anonymous()).to_json().is_err());
        let mut map = ObjectMap::new();
        map.insert(Symbol::new("k").into(), Value::Null);
        assert!(Value::Object(map).to_json().is_err());
    }

    #[test]
    fn type_names_match_variants() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Array(vec![]).type_name(), "array");
    }
}
