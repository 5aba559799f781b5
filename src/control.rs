// ABOUTME: Control structures compiled from the standardized AST

use crate::ast::{AstNode, AstNodeType};
use crate::env::Environment;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ENV_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity shared between a `ControlItem::EnvMarker` and the
/// `StackItem::EnvMarker` it's paired with, so CSE rule 5 can recognize a
/// matching pair by simple equality instead of cross-referencing two
/// separate type hierarchies (spec.md §9 design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(pub usize);

impl EnvId {
    pub fn fresh() -> Self {
        EnvId(NEXT_ENV_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One linearized control item. The control builder flattens a standardized
/// AST subtree into a pre-order sequence of these.
#[derive(Debug, Clone)]
pub enum ControlItem {
    /// A leaf or operator node carried over unchanged from the standardized
    /// tree (identifier, literal, or n-ary operator).
    Node(AstNode),
    /// A lambda occurrence: pushes a closure over `delta` bound to the
    /// current environment (CSE rule 2).
    Lambda(Rc<Delta>),
    /// A conditional, lowered from `CONDITIONAL` into the two arm deltas
    /// plus a runtime marker telling the machine which arm ran (CSE rule 8).
    Beta { then_delta: Rc<Delta>, else_delta: Rc<Delta> },
    /// Marks where an applied closure's environment ends; paired with a
    /// `StackItem::EnvMarker` carrying the same id (CSE rule 5).
    EnvMarker(EnvId),
    /// A tuple-formation marker recording how many stack values to collect
    /// (CSE rule 9).
    Tau(usize),
    /// Re-pushes an already-computed runtime value. Used only by the
    /// eta-closure application rule (CSE rule 13), which needs to replay a
    /// previously evaluated argument after the eta-delta's body has run.
    PushValue(Value),
}

/// A compiled control block. Numbered in creation order; delta 0 is the
/// whole program's entry point.
#[derive(Debug)]
pub struct Delta {
    pub index: usize,
    /// Filled in once, after the whole control tree has been discovered.
    /// `RefCell` because other deltas' bodies may already hold an `Rc`
    /// clone of this delta (as a `ControlItem::Lambda`/`Beta` payload)
    /// before its own body is linearized.
    body: RefCell<Vec<ControlItem>>,
    pub bound_vars: Vec<String>,
    /// Populated the first time this delta is turned into a closure, purely
    /// for introspection (`-st` output). The environment actually used for
    /// variable lookup lives on the `Value::Closure`/`Value::EtaClosure`
    /// that wraps this delta, not here.
    pub defining_env: RefCell<Option<Rc<Environment>>>,
}

impl Delta {
    fn new(index: usize, bound_vars: Vec<String>) -> Self {
        Delta {
            index,
            body: RefCell::new(Vec::new()),
            bound_vars,
            defining_env: RefCell::new(None),
        }
    }

    pub fn body(&self) -> std::cell::Ref<'_, Vec<ControlItem>> {
        self.body.borrow()
    }

    pub fn body_len(&self) -> usize {
        self.body.borrow().len()
    }
}

/// Flattens a standardized AST into a numbered set of control structures.
/// Deltas are discovered by walking pre-order and pushing every lambda/
/// conditional body onto a worklist (spec.md §4 permits either FIFO or LIFO
/// discovery order; this builder uses a LIFO stack).
pub struct ControlBuilder {
    deltas: Vec<Rc<Delta>>,
    pending: Vec<(usize, Vec<String>, AstNode)>,
}

impl ControlBuilder {
    pub fn new() -> Self {
        ControlBuilder {
            deltas: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Builds control structures for `root` and returns delta 0.
    pub fn build(mut self, root: AstNode) -> Rc<Delta> {
        let idx = self.allocate(Vec::new());
        self.pending.push((idx, Vec::new(), root));
        while let Some((idx, _bound_vars, node)) = self.pending.pop() {
            let body = self.linearize(node);
            *self.deltas[idx].body.borrow_mut() = body;
        }
        self.deltas[0].clone()
    }

    fn allocate(&mut self, bound_vars: Vec<String>) -> usize {
        let idx = self.deltas.len();
        self.deltas.push(Rc::new(Delta::new(idx, bound_vars)));
        idx
    }

    /// Flattens one delta body in pre-order, spawning new pending deltas for
    /// every lambda and conditional encountered.
    fn linearize(&mut self, node: AstNode) -> Vec<ControlItem> {
        let mut out = Vec::new();
        self.linearize_into(node, &mut out);
        out
    }

    fn linearize_into(&mut self, node: AstNode, out: &mut Vec<ControlItem>) {
        match node.kind {
            AstNodeType::Lambda => {
                let mut children = node.children.into_iter();
                let params_node = children.next().expect("lambda missing params");
                let body = children.next().expect("lambda missing body");
                let bound_vars = Self::collect_lambda_params(&params_node);
                let idx = self.allocate(bound_vars.clone());
                self.pending.push((idx, bound_vars, body));
                out.push(ControlItem::Lambda(self.deltas[idx].clone()));
            }
            AstNodeType::Conditional => {
                let mut children = node.children.into_iter();
                let cond = children.next().expect("conditional missing condition");
                let then_branch = children.next().expect("conditional missing then branch");
                let else_branch = children.next().expect("conditional missing else branch");

                let then_idx = self.allocate(Vec::new());
                self.pending.push((then_idx, Vec::new(), then_branch));
                let else_idx = self.allocate(Vec::new());
                self.pending.push((else_idx, Vec::new(), else_branch));

                self.linearize_into(cond, out);
                out.push(ControlItem::Beta {
                    then_delta: self.deltas[then_idx].clone(),
                    else_delta: self.deltas[else_idx].clone(),
                });
            }
            AstNodeType::Tau => {
                let count = node.children.len();
                for child in node.children {
                    self.linearize_into(child, out);
                }
                out.push(ControlItem::Tau(count));
            }
            AstNodeType::Gamma => {
                for child in node.children {
                    self.linearize_into(child, out);
                }
                out.push(ControlItem::Node(AstNode::new(AstNodeType::Gamma)));
            }
            _ if node.children.is_empty() => out.push(ControlItem::Node(node)),
            _ => {
                // n-ary operator: evaluate operands left to right, then
                // the operator itself.
                let kind = node.kind;
                for child in node.children {
                    self.linearize_into(child, out);
                }
                out.push(ControlItem::Node(AstNode::new(kind)));
            }
        }
    }

    fn collect_lambda_params(params_node: &AstNode) -> Vec<String> {
        match params_node.kind {
            AstNodeType::Identifier => vec![params_node
                .name()
                .expect("identifier missing name")
                .to_string()],
            AstNodeType::Comma => params_node
                .children
                .iter()
                .map(|c| c.name().expect("param missing name").to_string())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Default for ControlBuilder {
    fn default() -> Self {
        Self::new()
    }
}
