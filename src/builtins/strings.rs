// ABOUTME: String builtins: Stem, Stern, Conc, ItoS

use crate::env::Environment;
use crate::error::InterpError;
use crate::value::Value;
use std::rc::Rc;

/// First character of a string.
fn builtin_stem(args: &[Value]) -> Result<Value, InterpError> {
    let s = args[0].as_str("Stem")?;
    let first = s.chars().next().map(|c| c.to_string()).unwrap_or_default();
    Ok(Value::Str(first))
}

/// A string with its first character removed.
fn builtin_stern(args: &[Value]) -> Result<Value, InterpError> {
    let s = args[0].as_str("Stern")?;
    let rest: String = s.chars().skip(1).collect();
    Ok(Value::Str(rest))
}

/// Concatenates two strings. Curried at the machine level (see
/// `Value::Partial`); this function always receives both arguments.
fn builtin_conc(args: &[Value]) -> Result<Value, InterpError> {
    let a = args[0].as_str("Conc")?;
    let b = args[1].as_str("Conc")?;
    Ok(Value::Str(format!("{}{}", a, b)))
}

/// Converts an integer to its decimal string representation.
fn builtin_itos(args: &[Value]) -> Result<Value, InterpError> {
    let n = args[0].as_int("ItoS")?;
    Ok(Value::Str(n.to_string()))
}

pub fn register(env: &Rc<Environment>) {
    env.define(
        "Stem".to_string(),
        Value::BuiltIn { name: "Stem", func: builtin_stem },
    );
    env.define(
        "Stern".to_string(),
        Value::BuiltIn { name: "Stern", func: builtin_stern },
    );
    env.define(
        "Conc".to_string(),
        Value::BuiltIn { name: "Conc", func: builtin_conc },
    );
    env.define(
        "ItoS".to_string(),
        Value::BuiltIn { name: "ItoS", func: builtin_itos },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_and_stern() {
        assert_eq!(builtin_stem(&[Value::Str("cat".into())]).unwrap().to_string(), "c");
        assert_eq!(builtin_stern(&[Value::Str("cat".into())]).unwrap().to_string(), "at");
    }

    #[test]
    fn conc_joins_two_strings() {
        let result = builtin_conc(&[Value::Str("foo".into()), Value::Str("bar".into())]).unwrap();
        assert_eq!(result.to_string(), "foobar");
    }

    #[test]
    fn itos_converts_integer() {
        let result = builtin_itos(&[Value::Int(42)]).unwrap();
        assert_eq!(result.to_string(), "42");
    }

    #[test]
    fn stem_on_empty_string_is_empty() {
        let result = builtin_stem(&[Value::Str(String::new())]).unwrap();
        assert_eq!(result.to_string(), "");
    }
}
