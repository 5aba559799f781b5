//! Built-in functions available to every RPAL program, organized by the
//! kind of value they operate on.
//!
//! - [strings]: `Stem`, `Stern`, `Conc`, `ItoS`
//! - [tuples]: `Order`, `Null`
//! - [predicates]: `Isinteger`, `Istruthvalue`, `Isstring`, `Istuple`,
//!   `Isfunction`, `Isdummy`
//! - [io]: `Print`

pub mod io;
pub mod predicates;
pub mod strings;
pub mod tuples;

use crate::env::Environment;
use std::rc::Rc;

/// Registers every builtin in the global environment. Called once, before
/// delta 0 runs.
pub fn register_all(env: &Rc<Environment>) {
    strings::register(env);
    tuples::register(env);
    predicates::register(env);
    io::register(env);
}
