// ABOUTME: Type-test builtins: Isinteger, Istruthvalue, Isstring, Istuple, Isfunction, Isdummy

use crate::env::Environment;
use crate::error::InterpError;
use crate::value::Value;
use std::rc::Rc;

fn builtin_isinteger(args: &[Value]) -> Result<Value, InterpError> {
    Ok(Value::Bool(matches!(args[0], Value::Int(_))))
}

fn builtin_istruthvalue(args: &[Value]) -> Result<Value, InterpError> {
    Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
}

fn builtin_isstring(args: &[Value]) -> Result<Value, InterpError> {
    Ok(Value::Bool(matches!(args[0], Value::Str(_))))
}

fn builtin_istuple(args: &[Value]) -> Result<Value, InterpError> {
    Ok(Value::Bool(matches!(args[0], Value::Tuple(_))))
}

fn builtin_isfunction(args: &[Value]) -> Result<Value, InterpError> {
    Ok(Value::Bool(args[0].is_function()))
}

fn builtin_isdummy(args: &[Value]) -> Result<Value, InterpError> {
    Ok(Value::Bool(matches!(args[0], Value::Dummy)))
}

pub fn register(env: &Rc<Environment>) {
    env.define(
        "Isinteger".to_string(),
        Value::BuiltIn { name: "Isinteger", func: builtin_isinteger },
    );
    env.define(
        "Istruthvalue".to_string(),
        Value::BuiltIn { name: "Istruthvalue", func: builtin_istruthvalue },
    );
    env.define(
        "Isstring".to_string(),
        Value::BuiltIn { name: "Isstring", func: builtin_isstring },
    );
    env.define(
        "Istuple".to_string(),
        Value::BuiltIn { name: "Istuple", func: builtin_istuple },
    );
    env.define(
        "Isfunction".to_string(),
        Value::BuiltIn { name: "Isfunction", func: builtin_isfunction },
    );
    env.define(
        "Isdummy".to_string(),
        Value::BuiltIn { name: "Isdummy", func: builtin_isdummy },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_discriminate_by_variant() {
        assert!(matches!(builtin_isinteger(&[Value::Int(1)]).unwrap(), Value::Bool(true)));
        assert!(matches!(builtin_isinteger(&[Value::Str("x".into())]).unwrap(), Value::Bool(false)));
        assert!(matches!(builtin_istuple(&[Value::Tuple(vec![])]).unwrap(), Value::Bool(true)));
        assert!(matches!(builtin_isdummy(&[Value::Dummy]).unwrap(), Value::Bool(true)));
        assert!(matches!(builtin_istruthvalue(&[Value::Bool(false)]).unwrap(), Value::Bool(true)));
    }

    #[test]
    fn isfunction_true_for_ystar() {
        assert!(matches!(builtin_isfunction(&[Value::YStar]).unwrap(), Value::Bool(true)));
    }
}
