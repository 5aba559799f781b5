// ABOUTME: Tuple builtins: Order, Null

use crate::env::Environment;
use crate::error::InterpError;
use crate::value::Value;
use std::rc::Rc;

/// Number of elements in a tuple.
fn builtin_order(args: &[Value]) -> Result<Value, InterpError> {
    let items = args[0].as_tuple("Order")?;
    Ok(Value::Int(items.len() as i64))
}

/// True for the empty tuple or `nil`.
fn builtin_null(args: &[Value]) -> Result<Value, InterpError> {
    match &args[0] {
        Value::Nil => Ok(Value::Bool(true)),
        Value::Tuple(items) => Ok(Value::Bool(items.is_empty())),
        other => Err(InterpError::TypeError {
            op: "Null".to_string(),
            expected: "tuple",
            got: other.type_name(),
        }),
    }
}

pub fn register(env: &Rc<Environment>) {
    env.define(
        "Order".to_string(),
        Value::BuiltIn { name: "Order", func: builtin_order },
    );
    env.define(
        "Null".to_string(),
        Value::BuiltIn { name: "Null", func: builtin_null },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_counts_elements() {
        let t = Value::Tuple(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(matches!(builtin_order(&[t]).unwrap(), Value::Int(3)));
    }

    #[test]
    fn null_true_for_empty_tuple_and_nil() {
        assert!(matches!(builtin_null(&[Value::Tuple(vec![])]).unwrap(), Value::Bool(true)));
        assert!(matches!(builtin_null(&[Value::Nil]).unwrap(), Value::Bool(true)));
        let nonempty = Value::Tuple(vec![Value::Int(1)]);
        assert!(matches!(builtin_null(&[nonempty]).unwrap(), Value::Bool(false)));
    }
}
