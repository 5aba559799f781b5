// ABOUTME: Environment module for managing variable bindings and scopes

use crate::error::InterpError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent. The CSE machine calls
    /// this once per closure application (rule 3); the parent link is set
    /// once here and never mutated, so the environment tree can't cycle.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope (doesn't walk the parent chain).
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up a name in this scope, then parent scopes recursively.
    /// Unlike a REPL environment, RPAL has no assignment, so there is no
    /// `set`; every failed lookup is a genuine unbound identifier.
    pub fn lookup(&self, name: &str) -> Result<Value, InterpError> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }
        if let Some(ref parent) = self.parent {
            return parent.lookup(name);
        }
        Err(InterpError::UnboundIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Int(42));
        match env.lookup("x") {
            Ok(Value::Int(n)) => assert_eq!(n, 42),
            other => panic!("expected Int(42), got {:?}", other),
        }
    }

    #[test]
    fn undefined_identifier_is_an_error() {
        let env = Environment::new();
        let err = env.lookup("undefined").unwrap_err();
        assert!(matches!(err, InterpError::UnboundIdentifier(name) if name == "undefined"));
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Int(42));

        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Int(100));

        match child.lookup("x") {
            Ok(Value::Int(n)) => assert_eq!(n, 100),
            other => panic!("expected Int(100), got {:?}", other),
        }
    }

    #[test]
    fn child_sees_parent_binding() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Int(42));

        let child = Environment::with_parent(parent);

        match child.lookup("x") {
            Ok(Value::Int(n)) => assert_eq!(n, 42),
            other => panic!("expected Int(42), got {:?}", other),
        }
    }

    #[test]
    fn lookup_walks_multiple_levels() {
        let grandparent = Environment::new();
        grandparent.define("a".to_string(), Value::Int(1));

        let parent = Environment::with_parent(grandparent);
        parent.define("b".to_string(), Value::Int(2));

        let child = Environment::with_parent(parent);
        child.define("c".to_string(), Value::Int(3));

        assert!(matches!(child.lookup("a"), Ok(Value::Int(1))));
        assert!(matches!(child.lookup("b"), Ok(Value::Int(2))));
        assert!(matches!(child.lookup("c"), Ok(Value::Int(3))));
    }
}
