//! Annotation keys and the per-node annotation map.
//!
//! Every AST node carries an `Annotations` map from symbolic key to
//! opaque value. A fixed set of keys has defined semantics; unknown keys
//! are preserved and passed through untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// A failure-message override. Called with the offending value at the
/// failure site; must be side-effect-free.
pub type MessageFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// An annotation-supplied printer used by the pretty interpreter.
pub type PrettyFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

// ──────────────────────────────────────────────
// Keys
// ──────────────────────────────────────────────

/// Well-known annotation keys, plus `Custom` for user extensions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationKey {
    /// A stable name for the schema, used in failure rendering.
    Identifier,
    Title,
    Description,
    /// Free-text documentation.
    Documentation,
    /// Ordered sample values.
    Examples,
    /// Failure-message override at this site.
    Message,
    /// Opaque object injected by a JSON Schema interpreter.
    JsonSchema,
    /// Printer override for the pretty interpreter.
    Pretty,
    /// User extension; the string names the extension.
    Custom(String),
}

/// An annotation payload.
#[derive(Clone)]
pub enum AnnotationValue {
    Text(String),
    Examples(Vec<Value>),
    Message(MessageFn),
    Json(serde_json::Value),
    Pretty(PrettyFn),
    Custom(Value),
}

impl fmt::Debug for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Text(s) => write!(f, "Text({:?})", s),
            AnnotationValue::Examples(vs) => write!(f, "Examples({} values)", vs.len()),
            AnnotationValue::Message(_) => write!(f, "Message(..)"),
            AnnotationValue::Json(j) => write!(f, "Json({})", j),
            AnnotationValue::Pretty(_) => write!(f, "Pretty(..)"),
            AnnotationValue::Custom(v) => write!(f, "Custom({:?})", v),
        }
    }
}

// ──────────────────────────────────────────────
// Map
// ──────────────────────────────────────────────

/// The annotation map attached to every AST node. Immutable once the node
/// is built; overlays produce a new map.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    entries: BTreeMap<AnnotationKey, AnnotationValue>,
}

impl Annotations {
    pub fn new() -> Self {
        Annotations {
            entries: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &AnnotationKey) -> Option<&AnnotationValue> {
        self.entries.get(key)
    }

    /// Builder-style single-key set.
    pub fn with(mut self, key: AnnotationKey, value: AnnotationValue) -> Self {
        self.entries.insert(key, value);
        self
    }

    /// Overlay `other` onto `self`; keys in `other` win.
    pub fn merge(&self, other: &Annotations) -> Annotations {
        let mut merged = self.entries.clone();
        for (k, v) in &other.entries {
            merged.insert(k.clone(), v.clone());
        }
        Annotations { entries: merged }
    }

    pub fn keys(&self) -> impl Iterator<Item = &AnnotationKey> {
        self.entries.keys()
    }

    // ── Typed accessors for the well-known keys ──────────────────────

    pub fn identifier(&self) -> Option<&str> {
        self.text(&AnnotationKey::Identifier)
    }

    pub fn title(&self) -> Option<&str> {
        self.text(&AnnotationKey::Title)
    }

    pub fn description(&self) -> Option<&str> {
        self.text(&AnnotationKey::Description)
    }

    pub fn documentation(&self) -> Option<&str> {
        self.text(&AnnotationKey::Documentation)
    }

    pub fn examples(&self) -> Option<&[Value]> {
        match self.entries.get(&AnnotationKey::Examples) {
            Some(AnnotationValue::Examples(vs)) => Some(vs),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&MessageFn> {
        match self.entries.get(&AnnotationKey::Message) {
            Some(AnnotationValue::Message(m)) => Some(m),
            _ => None,
        }
    }

    pub fn json_schema(&self) -> Option<&serde_json::Value> {
        match self.entries.get(&AnnotationKey::JsonSchema) {
            Some(AnnotationValue::Json(j)) => Some(j),
            _ => None,
        }
    }

    pub fn pretty(&self) -> Option<&PrettyFn> {
        match self.entries.get(&AnnotationKey::Pretty) {
            Some(AnnotationValue::Pretty(p)) => Some(p),
            _ => None,
        }
    }

    fn text(&self, key: &AnnotationKey) -> Option<&str> {
        match self.entries.get(key) {
            Some(AnnotationValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}
