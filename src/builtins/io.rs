// ABOUTME: Print builtin; actual output goes through the machine's injected writer

use crate::env::Environment;
use crate::error::InterpError;
use crate::value::Value;
use std::rc::Rc;

/// Never invoked directly: the machine special-cases applications of a
/// builtin named `"Print"` so output goes through its injected writer
/// instead of stdout, which is what makes `Print` testable without capturing
/// process-level stdout.
fn builtin_print(_args: &[Value]) -> Result<Value, InterpError> {
    Ok(Value::Dummy)
}

pub fn register(env: &Rc<Environment>) {
    env.define(
        "Print".to_string(),
        Value::BuiltIn { name: "Print", func: builtin_print },
    );
}
