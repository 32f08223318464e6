//! The guard interpreter: a boolean mirror of the parser.
//!
//! Used where only the predicate matters. Agrees with decode on the
//! accepted set for schemas without transforms; on a `Transform` node
//! the guard checks the `from` side, the raw input domain.

use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{Ast, AstKind, LazyType, TemplateLiteral, TupleType, TypeLiteralType};
use crate::value::Value;

/// A compiled structural predicate over one schema. Carries the lazy
/// memo table and template-literal regex cache for this interpretation
/// context.
pub struct Guard {
    ast: Arc<Ast>,
    lazy_memo: RefCell<HashMap<u64, Arc<Ast>>>,
    regex_memo: RefCell<HashMap<usize, Regex>>,
}

impl Guard {
    pub fn new(ast: Arc<Ast>) -> Self {
        Guard {
            ast,
            lazy_memo: RefCell::new(HashMap::new()),
            regex_memo: RefCell::new(HashMap::new()),
        }
    }

    pub fn check(&self, value: &Value) -> bool {
        self.go(&self.ast, value)
    }

    fn go(&self, ast: &Arc<Ast>, value: &Value) -> bool {
        match &ast.kind {
            AstKind::Never => false,
            AstKind::Unknown | AstKind::Any => true,
            AstKind::Void | AstKind::Undefined => matches!(value, Value::Undefined),
            AstKind::StringKeyword => matches!(value, Value::String(_)),
            AstKind::NumberKeyword => matches!(value, Value::Number(_)),
            AstKind::BooleanKeyword => matches!(value, Value::Boolean(_)),
            AstKind::BigIntKeyword => matches!(value, Value::BigInt(_)),
            AstKind::SymbolKeyword => matches!(value, Value::Symbol(_)),
            AstKind::ObjectKeyword => matches!(value, Value::Object(_) | Value::Array(_)),
            AstKind::Literal(literal) => literal.matches(value),
            AstKind::UniqueSymbol(symbol) => {
                matches!(value, Value::Symbol(s) if s == symbol)
            }
            AstKind::TemplateLiteral(template) => match value {
                Value::String(s) => self.template_matches(ast, template, s),
                _ => false,
            },
            AstKind::Enums(members) => members.iter().any(|m| m.value.matches(value)),
            AstKind::Tuple(tuple) => self.check_tuple(tuple, value),
            AstKind::TypeLiteral(literal) => self.check_type_literal(literal, value),
            AstKind::Union(members) => members.iter().any(|m| self.go(m, value)),
            AstKind::Refinement(r) => self.go(&r.from, value) && (r.predicate)(value),
            AstKind::Transform(t) => self.go(&t.from, value),
            AstKind::Lazy(lazy) => {
                let forced = self.force(lazy);
                self.go(&forced, value)
            }
            AstKind::TypeAlias(alias) => self.go(&alias.ty, value),
        }
    }

    fn check_tuple(&self, tuple: &TupleType, value: &Value) -> bool {
        let items = match value {
            Value::Array(items) => items,
            _ => return false,
        };
        let required = tuple.elements.iter().filter(|e| !e.optional).count();
        let trailing = tuple.rest.as_ref().map(|r| r.len() - 1).unwrap_or(0);
        if items.len() < required + trailing {
            return false;
        }
        if tuple.rest.is_none() && items.len() > tuple.elements.len() {
            return false;
        }
        for (i, element) in tuple.elements.iter().enumerate() {
            match items.get(i) {
                Some(item) => {
                    if !self.go(&element.ty, item) {
                        return false;
                    }
                }
                None => {
                    if !element.optional {
                        return false;
                    }
                }
            }
        }
        if let Some(rest) = &tuple.rest {
            let extra = &items[tuple.elements.len().min(items.len())..];
            let head_count = extra.len().saturating_sub(rest.len() - 1);
            let (head_items, trailing_items) = extra.split_at(head_count);
            if trailing_items.len() < rest.len() - 1 {
                return false;
            }
            if !head_items.iter().all(|item| self.go(&rest[0], item)) {
                return false;
            }
            for (item, ty) in trailing_items.iter().zip(&rest[1..]) {
                if !self.go(ty, item) {
                    return false;
                }
            }
        }
        true
    }

    fn check_type_literal(&self, literal: &TypeLiteralType, value: &Value) -> bool {
        let object = match value {
            Value::Object(map) => map,
            _ => return false,
        };
        for property in &literal.properties {
            match object.get(&property.name) {
                Some(v) => {
                    if !self.go(&property.ty, v) {
                        return false;
                    }
                }
                None => {
                    if !property.optional {
                        return false;
                    }
                }
            }
        }
        // Unrecognized keys must satisfy the first index signature whose
        // parameter admits them; keys no signature claims are ignored,
        // matching decode under the default excess-property policy.
        for (key, v) in object.iter() {
            if literal.properties.iter().any(|p| &p.name == key) {
                continue;
            }
            let key_value = key.to_value();
            if let Some(signature) = literal
                .index_signatures
                .iter()
                .find(|sig| self.go(&sig.parameter, &key_value))
            {
                if !self.go(&signature.ty, v) {
                    return false;
                }
            }
        }
        true
    }

    fn template_matches(&self, ast: &Arc<Ast>, template: &TemplateLiteral, text: &str) -> bool {
        let key = Arc::as_ptr(ast) as usize;
        if let Some(re) = self.regex_memo.borrow().get(&key) {
            return re.is_match(text);
        }
        let re = match Regex::new(&template.regex_source()) {
            Ok(re) => re,
            Err(_) => return false,
        };
        let matched = re.is_match(text);
        self.regex_memo.borrow_mut().insert(key, re);
        matched
    }

    fn force(&self, lazy: &LazyType) -> Arc<Ast> {
        if let Some(forced) = self.lazy_memo.borrow().get(&lazy.id) {
            return forced.clone();
        }
        let forced = (lazy.thunk)();
        self.lazy_memo
            .borrow_mut()
            .insert(lazy.id, forced.clone());
        forced
    }
}

/// One-shot structural check against a schema AST.
pub fn check(ast: &Arc<Ast>, value: &Value) -> bool {
    Guard::new(ast.clone()).check(value)
}
