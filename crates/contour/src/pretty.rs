//! The pretty interpreter: schema-directed value rendering.
//!
//! `render_value` is the schema-free default used everywhere a value
//! appears in a message. `Pretty` walks the AST alongside the value and
//! defers to a `Pretty` annotation wherever one is present.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{Ast, AstKind};
use crate::guard;
use crate::value::Value;

/// Render a value without a schema: JSON-like, with the host-only forms
/// (`undefined`, symbols, bigints) spelled out.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_owned(),
        Value::Null => "null".to_owned(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(d) => d.normalize().to_string(),
        Value::BigInt(i) => format!("{}n", i),
        Value::String(s) => format!("{:?}", s),
        Value::Symbol(s) => s.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            if map.is_empty() {
                return "{}".to_owned();
            }
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, render_value(v)))
                .collect();
            format!("{{ {} }}", parts.join(", "))
        }
    }
}

/// A compiled printer for one schema.
pub struct Pretty {
    ast: Arc<Ast>,
    lazy_memo: RefCell<HashMap<u64, Arc<Ast>>>,
}

impl Pretty {
    pub fn new(ast: Arc<Ast>) -> Self {
        Pretty {
            ast,
            lazy_memo: RefCell::new(HashMap::new()),
        }
    }

    pub fn print(&self, value: &Value) -> String {
        self.go(&self.ast, value)
    }

    fn go(&self, ast: &Arc<Ast>, value: &Value) -> String {
        if let Some(printer) = ast.annotations.pretty() {
            return printer(value);
        }
        match &ast.kind {
            AstKind::Tuple(tuple) => match value {
                Value::Array(items) => {
                    let parts: Vec<String> = items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| match self.tuple_element_type(tuple, i, items.len()) {
                            Some(ty) => self.go(&ty, item),
                            None => render_value(item),
                        })
                        .collect();
                    format!("[{}]", parts.join(", "))
                }
                other => render_value(other),
            },
            AstKind::TypeLiteral(literal) => match value {
                Value::Object(map) => {
                    let parts: Vec<String> = map
                        .iter()
                        .map(|(key, v)| {
                            let ty = literal
                                .properties
                                .iter()
                                .find(|p| &p.name == key)
                                .map(|p| p.ty.clone())
                                .or_else(|| {
                                    literal
                                        .index_signatures
                                        .iter()
                                        .find(|sig| guard::check(&sig.parameter, &key.to_value()))
                                        .map(|sig| sig.ty.clone())
                                });
                            let rendered = match ty {
                                Some(ty) => self.go(&ty, v),
                                None => render_value(v),
                            };
                            format!("{}: {}", key, rendered)
                        })
                        .collect();
                    if parts.is_empty() {
                        "{}".to_owned()
                    } else {
                        format!("{{ {} }}", parts.join(", "))
                    }
                }
                other => render_value(other),
            },
            AstKind::Union(members) => {
                match members.iter().find(|m| guard::check(m, value)) {
                    Some(member) => self.go(member, value),
                    None => render_value(value),
                }
            }
            AstKind::Refinement(refinement) => self.go(&refinement.from, value),
            AstKind::Transform(transform) => self.go(&transform.to, value),
            AstKind::Lazy(lazy) => {
                let forced = {
                    let memo = self.lazy_memo.borrow();
                    memo.get(&lazy.id).cloned()
                };
                let forced = match forced {
                    Some(ast) => ast,
                    None => {
                        let fresh = (lazy.thunk)();
                        self.lazy_memo.borrow_mut().insert(lazy.id, fresh.clone());
                        fresh
                    }
                };
                self.go(&forced, value)
            }
            AstKind::TypeAlias(alias) => self.go(&alias.ty, value),
            _ => render_value(value),
        }
    }

    fn tuple_element_type(
        &self,
        tuple: &crate::ast::TupleType,
        index: usize,
        length: usize,
    ) -> Option<Arc<Ast>> {
        if let Some(element) = tuple.elements.get(index) {
            return Some(element.ty.clone());
        }
        let rest = tuple.rest.as_ref()?;
        let trailing = rest.len() - 1;
        let extra = length.saturating_sub(tuple.elements.len());
        let head_count = extra.saturating_sub(trailing);
        let offset = index - tuple.elements.len();
        if offset < head_count {
            Some(rest[0].clone())
        } else {
            rest.get(1 + (offset - head_count)).cloned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{AnnotationKey, AnnotationValue, Annotations};
    use crate::ast::{merge_annotations, PropertySignature};
    use crate::value::{ObjectMap, PropertyKey, Symbol};

    #[test]
    fn render_value_covers_host_only_forms() {
        assert_eq!(render_value(&Value::Undefined), "undefined");
        assert_eq!(render_value(&Value::BigInt(7)), "7n");
        assert_eq!(render_value(&Value::from("hi")), "\"hi\"");
        assert_eq!(
            render_value(&Value::Array(vec![1.into(), Value::Null])),
            "[1, null]"
        );
        assert_eq!(
            render_value(&Value::Symbol(Symbol::new("tag"))),
            "Symbol(tag)"
        );
    }

    #[test]
    fn render_value_normalizes_number_scale() {
        assert_eq!(
            render_value(&Value::Number("1.50".parse().unwrap())),
            "1.5"
        );
    }

    #[test]
    fn pretty_defers_to_annotation_printer() {
        let schema = merge_annotations(
            &Ast::number(),
            &Annotations::new().with(
                AnnotationKey::Pretty,
                AnnotationValue::Pretty(Arc::new(|v: &Value| {
                    format!("#{}", render_value(v))
                })),
            ),
        );
        let printer = Pretty::new(schema);
        assert_eq!(printer.print(&Value::from(4)), "#4");
    }

    #[test]
    fn pretty_walks_structs_with_per_property_printers() {
        let cents = merge_annotations(
            &Ast::number(),
            &Annotations::new().with(
                AnnotationKey::Pretty,
                AnnotationValue::Pretty(Arc::new(|v: &Value| match v {
                    Value::Number(d) => format!("{}¢", d),
                    other => render_value(other),
                })),
            ),
        );
        let schema = Ast::type_literal(
            vec![
                PropertySignature::new("name", Ast::string()),
                PropertySignature::new("price", cents),
            ],
            vec![],
        )
        .unwrap();
        let input: ObjectMap = [
            (PropertyKey::from("name"), Value::from("tea")),
            (PropertyKey::from("price"), Value::from(250)),
        ]
        .into_iter()
        .collect();
        let printer = Pretty::new(schema);
        assert_eq!(
            printer.print(&Value::Object(input)),
            "{ \"name\": \"tea\", \"price\": 250¢ }"
        );
    }
}
