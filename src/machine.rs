// ABOUTME: The control-stack-environment machine that evaluates control structures

use crate::ast::AstNodeType;
use crate::control::{ControlItem, Delta, EnvId};
use crate::env::Environment;
use crate::error::InterpError;
use crate::value::Value;
use std::io::Write;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum StackItem {
    Value(Value),
    EnvMarker(EnvId),
}

/// Evaluates a program's delta 0 against the builtin environment, writing
/// any `Print` output through `out`. Returns the single value left on the
/// stack once control is exhausted.
pub struct Machine<'a> {
    control: Vec<ControlItem>,
    stack: Vec<StackItem>,
    env_stack: Vec<Rc<Environment>>,
    out: &'a mut dyn Write,
}

impl<'a> Machine<'a> {
    pub fn new(root_env: Rc<Environment>, out: &'a mut dyn Write) -> Self {
        Machine {
            control: Vec::new(),
            stack: Vec::new(),
            env_stack: vec![root_env],
            out,
        }
    }

    pub fn run(mut self, delta0: Rc<Delta>) -> Result<Value, InterpError> {
        self.load_body(&delta0);
        while let Some(item) = self.control.pop() {
            self.step(item)?;
        }
        match self.stack.pop() {
            Some(StackItem::Value(v)) => Ok(v),
            Some(StackItem::EnvMarker(_)) | None => Err(InterpError::MalformedTree(
                "machine halted with no result value on the stack".to_string(),
            )),
        }
    }

    fn current_env(&self) -> Rc<Environment> {
        self.env_stack
            .last()
            .expect("environment stack must never be empty")
            .clone()
    }

    /// Pushes a delta's body onto control in an order such that popping
    /// replays it front to back.
    fn load_body(&mut self, delta: &Rc<Delta>) {
        for item in delta.body().iter().rev() {
            self.control.push(item.clone());
        }
    }

    fn step(&mut self, item: ControlItem) -> Result<(), InterpError> {
        match item {
            ControlItem::Node(node) => self.step_node(node),
            ControlItem::Lambda(delta) => {
                let env = self.current_env();
                if delta.defining_env.borrow().is_none() {
                    *delta.defining_env.borrow_mut() = Some(env.clone());
                }
                self.stack.push(StackItem::Value(Value::Closure { delta, env }));
                Ok(())
            }
            ControlItem::Beta { then_delta, else_delta } => self.step_beta(then_delta, else_delta),
            ControlItem::EnvMarker(id) => self.step_env_marker(id),
            ControlItem::Tau(n) => self.step_tau(n),
            ControlItem::PushValue(v) => {
                self.stack.push(StackItem::Value(v));
                Ok(())
            }
        }
    }

    fn step_node(&mut self, node: crate::ast::AstNode) -> Result<(), InterpError> {
        use AstNodeType::*;
        match node.kind {
            Identifier => {
                let name = node.name().expect("identifier node missing name");
                let value = self.current_env().lookup(name)?;
                self.stack.push(StackItem::Value(value));
                Ok(())
            }
            Integer => {
                let text = node.name().expect("integer node missing literal");
                let n: i64 = text
                    .parse()
                    .map_err(|_| InterpError::MalformedTree(format!("invalid integer literal: {}", text)))?;
                self.stack.push(StackItem::Value(Value::Int(n)));
                Ok(())
            }
            StringLit => {
                let text = node.name().expect("string node missing literal").to_string();
                self.stack.push(StackItem::Value(Value::Str(text)));
                Ok(())
            }
            True => {
                self.stack.push(StackItem::Value(Value::Bool(true)));
                Ok(())
            }
            False => {
                self.stack.push(StackItem::Value(Value::Bool(false)));
                Ok(())
            }
            Nil => {
                self.stack.push(StackItem::Value(Value::Nil));
                Ok(())
            }
            Dummy => {
                self.stack.push(StackItem::Value(Value::Dummy));
                Ok(())
            }
            YStar => {
                self.stack.push(StackItem::Value(Value::YStar));
                Ok(())
            }
            Gamma => self.step_apply(),
            Plus | Minus | Mult | Div | Exp | Gr | Ge | Ls | Le | Eq | Ne | Or | And | Aug => {
                self.step_binary(node.kind)
            }
            Not | Neg => self.step_unary(node.kind),
            other => Err(InterpError::MalformedTree(format!(
                "control item of kind {:?} cannot be evaluated directly",
                other
            ))),
        }
    }

    fn pop_value(&mut self) -> Result<Value, InterpError> {
        match self.stack.pop() {
            Some(StackItem::Value(v)) => Ok(v),
            Some(StackItem::EnvMarker(_)) | None => Err(InterpError::MalformedTree(
                "expected a value on the stack".to_string(),
            )),
        }
    }

    fn step_binary(&mut self, kind: AstNodeType) -> Result<(), InterpError> {
        use AstNodeType::*;
        let right = self.pop_value()?;
        let left = self.pop_value()?;
        let result = match kind {
            Plus => Value::Int(left.as_int("+")?.checked_add(right.as_int("+")?).ok_or_else(|| {
                InterpError::TypeError { op: "+".to_string(), expected: "integer", got: "overflow" }
            })?),
            Minus => Value::Int(left.as_int("-")? - right.as_int("-")?),
            Mult => Value::Int(left.as_int("*")? * right.as_int("*")?),
            Div => {
                let denom = right.as_int("/")?;
                if denom == 0 {
                    return Err(InterpError::DivisionByZero);
                }
                Value::Int(left.as_int("/")? / denom)
            }
            Exp => {
                let base = left.as_int("**")?;
                let exp = right.as_int("**")?;
                if exp < 0 {
                    return Err(InterpError::TypeError {
                        op: "**".to_string(),
                        expected: "non-negative integer",
                        got: "negative integer",
                    });
                }
                Value::Int(base.pow(exp as u32))
            }
            Gr => Value::Bool(left.as_int("gr")? > right.as_int("gr")?),
            Ge => Value::Bool(left.as_int("ge")? >= right.as_int("ge")?),
            Ls => Value::Bool(left.as_int("ls")? < right.as_int("ls")?),
            Le => Value::Bool(left.as_int("le")? <= right.as_int("le")?),
            Eq => Value::Bool(values_equal(&left, &right)?),
            Ne => Value::Bool(!values_equal(&left, &right)?),
            Or => Value::Bool(left.as_bool("or")? || right.as_bool("or")?),
            And => Value::Bool(left.as_bool("and")? && right.as_bool("and")?),
            Aug => match left {
                Value::Nil => Value::Tuple(vec![right]),
                Value::Tuple(mut items) => {
                    items.push(right);
                    Value::Tuple(items)
                }
                other => {
                    return Err(InterpError::TypeError {
                        op: "aug".to_string(),
                        expected: "tuple",
                        got: other.type_name(),
                    })
                }
            },
            other => {
                return Err(InterpError::MalformedTree(format!(
                    "{:?} is not a binary operator",
                    other
                )))
            }
        };
        self.stack.push(StackItem::Value(result));
        Ok(())
    }

    fn step_unary(&mut self, kind: AstNodeType) -> Result<(), InterpError> {
        use AstNodeType::*;
        let operand = self.pop_value()?;
        let result = match kind {
            Not => Value::Bool(!operand.as_bool("not")?),
            Neg => Value::Int(-operand.as_int("neg")?),
            other => {
                return Err(InterpError::MalformedTree(format!(
                    "{:?} is not a unary operator",
                    other
                )))
            }
        };
        self.stack.push(StackItem::Value(result));
        Ok(())
    }

    fn step_tau(&mut self, n: usize) -> Result<(), InterpError> {
        let mut items = Vec::with_capacity(n);
        for _ in 0..n {
            items.push(self.pop_value()?);
        }
        items.reverse();
        self.stack.push(StackItem::Value(Value::Tuple(items)));
        Ok(())
    }

    fn step_beta(&mut self, then_delta: Rc<Delta>, else_delta: Rc<Delta>) -> Result<(), InterpError> {
        let cond = self.pop_value()?.as_bool("->")?;
        let chosen = if cond { then_delta } else { else_delta };
        self.load_body(&chosen);
        Ok(())
    }

    fn step_env_marker(&mut self, id: EnvId) -> Result<(), InterpError> {
        let result = self.pop_value()?;
        match self.stack.pop() {
            Some(StackItem::EnvMarker(found)) if found == id => {}
            other => {
                return Err(InterpError::MalformedTree(format!(
                    "environment marker mismatch, found {:?}",
                    other
                )))
            }
        }
        self.env_stack.pop();
        self.stack.push(StackItem::Value(result));
        Ok(())
    }

    /// CSE rule 3 (apply closure), rule 4 (apply builtin), rule 10 (tuple
    /// selection), rule 11 (tuple-pattern destructuring), and rule 12
    /// (apply YSTAR) all funnel through a `GAMMA` control item; rule 13
    /// (apply eta-closure) is a continuation scheduled by this function.
    fn step_apply(&mut self) -> Result<(), InterpError> {
        let rand = self.pop_value()?;
        let rator = self.pop_value()?;
        match rator {
            Value::Closure { delta, env } => self.apply_closure(delta, env, rand),
            Value::EtaClosure { delta, env } => self.apply_eta(delta, env, rand),
            Value::YStar => match rand {
                Value::Closure { delta, env } => {
                    self.stack.push(StackItem::Value(Value::EtaClosure { delta, env }));
                    Ok(())
                }
                other => Err(InterpError::TypeError {
                    op: "YSTAR".to_string(),
                    expected: "function",
                    got: other.type_name(),
                }),
            },
            Value::BuiltIn { name, func } => self.apply_builtin(name, func, rand),
            Value::Partial { func, arg, .. } => {
                let result = func(&[*arg, rand])?;
                self.stack.push(StackItem::Value(result));
                Ok(())
            }
            Value::Tuple(items) => {
                let index = rand.as_int("tuple selection")?;
                if index < 1 || index as usize > items.len() {
                    return Err(InterpError::TupleIndexOutOfRange {
                        index,
                        len: items.len(),
                    });
                }
                self.stack.push(StackItem::Value(items[index as usize - 1].clone()));
                Ok(())
            }
            other => Err(InterpError::TypeError {
                op: "apply".to_string(),
                expected: "function",
                got: other.type_name(),
            }),
        }
    }

    fn bind_params(env: &Rc<Environment>, bound_vars: &[String], rand: Value) -> Result<(), InterpError> {
        if bound_vars.len() == 1 {
            env.define(bound_vars[0].clone(), rand);
            return Ok(());
        }
        let items = rand.as_tuple("function application")?;
        if items.len() != bound_vars.len() {
            return Err(InterpError::ArityMismatch {
                expected: bound_vars.len(),
                got: items.len(),
            });
        }
        for (name, value) in bound_vars.iter().zip(items.iter()) {
            env.define(name.clone(), value.clone());
        }
        Ok(())
    }

    fn apply_closure(&mut self, delta: Rc<Delta>, env: Rc<Environment>, rand: Value) -> Result<(), InterpError> {
        let new_env = Environment::with_parent(env);
        Self::bind_params(&new_env, &delta.bound_vars, rand)?;
        let id = EnvId::fresh();
        self.control.push(ControlItem::EnvMarker(id));
        self.load_body(&delta);
        self.stack.push(StackItem::EnvMarker(id));
        self.env_stack.push(new_env);
        Ok(())
    }

    /// Rule 13: realize the recursive closure by binding its own name to
    /// itself, then schedule a plain apply of the realized value to `rand`.
    fn apply_eta(&mut self, delta: Rc<Delta>, env: Rc<Environment>, rand: Value) -> Result<(), InterpError> {
        if delta.bound_vars.len() != 1 {
            return Err(InterpError::MalformedTree(
                "recursive binding must have exactly one name".to_string(),
            ));
        }
        let new_env = Environment::with_parent(env.clone());
        new_env.define(
            delta.bound_vars[0].clone(),
            Value::EtaClosure { delta: delta.clone(), env },
        );
        let id = EnvId::fresh();
        self.control.push(ControlItem::Node(crate::ast::AstNode::new(AstNodeType::Gamma)));
        self.control.push(ControlItem::PushValue(rand));
        self.control.push(ControlItem::EnvMarker(id));
        self.load_body(&delta);
        self.stack.push(StackItem::EnvMarker(id));
        self.env_stack.push(new_env);
        Ok(())
    }

    fn apply_builtin(
        &mut self,
        name: &'static str,
        func: crate::value::BuiltinFn,
        rand: Value,
    ) -> Result<(), InterpError> {
        if name == "Print" {
            write!(self.out, "{}", rand).map_err(|_| {
                InterpError::MalformedTree("failed to write to output".to_string())
            })?;
            self.stack.push(StackItem::Value(Value::Dummy));
            return Ok(());
        }
        if name == "Conc" {
            // Conc takes two strings curried; capture the first here.
            self.stack.push(StackItem::Value(Value::Partial {
                name,
                func,
                arg: Box::new(rand),
            }));
            return Ok(());
        }
        let result = func(&[rand])?;
        self.stack.push(StackItem::Value(result));
        Ok(())
    }
}

fn values_equal(left: &Value, right: &Value) -> Result<bool, InterpError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Dummy, Value::Dummy) => Ok(true),
        (a, b) => Err(InterpError::TypeError {
            op: "eq".to_string(),
            expected: a.type_name(),
            got: b.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::control::ControlBuilder;
    use crate::parser::Parser;
    use crate::scanner::scan;
    use crate::standardize::standardize;

    fn run_program(src: &str) -> (Value, String) {
        let ast = Parser::new(scan(src).unwrap()).parse().unwrap();
        let standardized = standardize(ast).unwrap();
        let delta0 = ControlBuilder::new().build(standardized);
        let root_env = Environment::new();
        builtins::register_all(&root_env);
        let mut out = Vec::new();
        let value = {
            let machine = Machine::new(root_env, &mut out);
            machine.run(delta0).unwrap()
        };
        (value, String::from_utf8(out).unwrap())
    }

    #[test]
    fn evaluates_arithmetic() {
        let (value, _) = run_program("3 + 4 * 2");
        assert!(matches!(value, Value::Int(11)));
    }

    #[test]
    fn let_binding_is_visible_in_body() {
        let (value, _) = run_program("let x = 5 in x * x");
        assert!(matches!(value, Value::Int(25)));
    }

    #[test]
    fn conditional_selects_correct_arm() {
        let (value, _) = run_program("1 eq 1 -> 10 | 20");
        assert!(matches!(value, Value::Int(10)));
    }

    #[test]
    fn tuple_formation_and_selection() {
        let (value, _) = run_program("(2, 3, 4) 2");
        assert!(matches!(value, Value::Int(3)));
    }

    #[test]
    fn tuple_destructuring_in_let() {
        let (value, _) = run_program("let x, y = 2, 3 in x + y");
        assert!(matches!(value, Value::Int(5)));
    }

    #[test]
    fn multi_param_function_application() {
        let (value, _) = run_program("let f x y = x + y in f 2 3");
        assert!(matches!(value, Value::Int(5)));
    }

    #[test]
    fn recursive_factorial_via_rec() {
        let (value, _) = run_program(
            "let rec fact n = n eq 0 -> 1 | n * fact (n - 1) in fact 5",
        );
        assert!(matches!(value, Value::Int(120)));
    }

    #[test]
    fn print_writes_through_injected_output() {
        let (value, out) = run_program("Print 42");
        assert!(matches!(value, Value::Dummy));
        assert_eq!(out, "42");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let ast = Parser::new(scan("1 / 0").unwrap()).parse().unwrap();
        let standardized = standardize(ast).unwrap();
        let delta0 = ControlBuilder::new().build(standardized);
        let root_env = Environment::new();
        builtins::register_all(&root_env);
        let mut out = Vec::new();
        let machine = Machine::new(root_env, &mut out);
        let err = machine.run(delta0).unwrap_err();
        assert!(matches!(err, InterpError::DivisionByZero));
    }
}
