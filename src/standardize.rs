// ABOUTME: Rewrites the surface AST into the canonical standardized form

use crate::ast::{AstNode, AstNodeType};
use crate::error::InterpError;

/// Standardizes a surface-AST expression into the canonical form consumed
/// by the control builder: only `LAMBDA`, `GAMMA`, `EQUAL` (transient),
/// `COMMA`, `TAU`, `YSTAR`, literals, operators, and `CONDITIONAL` survive.
/// Rewriting is post-order: every child is standardized before its parent's
/// rule is applied, so a surface node's children are always already
/// canonical by the time the parent rule runs.
pub fn standardize(node: AstNode) -> Result<AstNode, InterpError> {
    let AstNode {
        kind,
        value,
        children,
    } = node;

    let children: Vec<AstNode> = children
        .into_iter()
        .map(standardize)
        .collect::<Result<_, _>>()?;

    match kind {
        AstNodeType::Let => standardize_let(children),
        AstNodeType::Where => standardize_where(children),
        AstNodeType::FcnForm => standardize_fcn_form(children),
        AstNodeType::At => standardize_at(children),
        AstNodeType::Within => standardize_within(children),
        AstNodeType::SimultDef => standardize_simultdef(children),
        AstNodeType::Rec => standardize_rec(children),
        _ => Ok(AstNode {
            kind,
            value,
            children,
        }),
    }
}

fn expect_equal(node: AstNode) -> Result<(AstNode, AstNode), InterpError> {
    if node.kind != AstNodeType::Equal {
        return Err(InterpError::MalformedTree(format!(
            "expected a definition, found {:?}",
            node.kind
        )));
    }
    let mut it = node.children.into_iter();
    let lhs = it.next().ok_or_else(|| {
        InterpError::MalformedTree("definition missing left-hand side".to_string())
    })?;
    let rhs = it
        .next()
        .ok_or_else(|| InterpError::MalformedTree("definition missing right-hand side".to_string()))?;
    Ok((lhs, rhs))
}

fn lambda(param: AstNode, body: AstNode) -> AstNode {
    AstNode::with_children(AstNodeType::Lambda, vec![param, body])
}

fn gamma(rator: AstNode, rand: AstNode) -> AstNode {
    AstNode::with_children(AstNodeType::Gamma, vec![rator, rand])
}

/// `let X = E in P` => `gamma(lambda X . P, E)`
fn standardize_let(children: Vec<AstNode>) -> Result<AstNode, InterpError> {
    let mut it = children.into_iter();
    let def = it
        .next()
        .ok_or_else(|| InterpError::MalformedTree("let missing definition".to_string()))?;
    let body = it
        .next()
        .ok_or_else(|| InterpError::MalformedTree("let missing body".to_string()))?;
    let (name, expr) = expect_equal(def)?;
    Ok(gamma(lambda(name, body), expr))
}

/// `P where X = E` => `let X = E in P` => `gamma(lambda X . P, E)`
fn standardize_where(children: Vec<AstNode>) -> Result<AstNode, InterpError> {
    let mut it = children.into_iter();
    let body = it
        .next()
        .ok_or_else(|| InterpError::MalformedTree("where missing body".to_string()))?;
    let def = it
        .next()
        .ok_or_else(|| InterpError::MalformedTree("where missing definition".to_string()))?;
    let (name, expr) = expect_equal(def)?;
    Ok(gamma(lambda(name, body), expr))
}

/// `NAME V1 ... Vn = E` => `NAME = lambda V1 . lambda V2 . ... . lambda Vn . E`
fn standardize_fcn_form(children: Vec<AstNode>) -> Result<AstNode, InterpError> {
    let mut parts = children;
    if parts.len() < 3 {
        return Err(InterpError::MalformedTree(
            "fcn_form needs a name, at least one parameter, and a body".to_string(),
        ));
    }
    let body = parts.pop().unwrap();
    let name = parts.remove(0);
    let chain = parts
        .into_iter()
        .rev()
        .fold(body, |acc, param| lambda(param, acc));
    Ok(AstNode::with_children(
        AstNodeType::Equal,
        vec![name, chain],
    ))
}

/// `E1 @ N E2` => `gamma(gamma(N, E1), E2)`
fn standardize_at(children: Vec<AstNode>) -> Result<AstNode, InterpError> {
    let mut it = children.into_iter();
    let e1 = it.next().ok_or_else(|| InterpError::MalformedTree("at missing operand".to_string()))?;
    let n = it.next().ok_or_else(|| InterpError::MalformedTree("at missing operator name".to_string()))?;
    let e2 = it.next().ok_or_else(|| InterpError::MalformedTree("at missing operand".to_string()))?;
    Ok(gamma(gamma(n, e1), e2))
}

/// `(X1 = E1) within (X2 = E2)` => `X2 = gamma(lambda X1 . E2, E1)`
fn standardize_within(children: Vec<AstNode>) -> Result<AstNode, InterpError> {
    let mut it = children.into_iter();
    let outer = it
        .next()
        .ok_or_else(|| InterpError::MalformedTree("within missing outer definition".to_string()))?;
    let inner = it
        .next()
        .ok_or_else(|| InterpError::MalformedTree("within missing inner definition".to_string()))?;
    let (name1, expr1) = expect_equal(outer)?;
    let (name2, expr2) = expect_equal(inner)?;
    Ok(AstNode::with_children(
        AstNodeType::Equal,
        vec![name2, gamma(lambda(name1, expr2), expr1)],
    ))
}

/// `(X1=E1) and (X2=E2) ...` => `(X1,X2,...) = (E1,E2,...)`
fn standardize_simultdef(children: Vec<AstNode>) -> Result<AstNode, InterpError> {
    let mut names = Vec::with_capacity(children.len());
    let mut exprs = Vec::with_capacity(children.len());
    for def in children {
        let (name, expr) = expect_equal(def)?;
        names.push(name);
        exprs.push(expr);
    }
    Ok(AstNode::with_children(
        AstNodeType::Equal,
        vec![
            AstNode::with_children(AstNodeType::Comma, names),
            AstNode::with_children(AstNodeType::Tau, exprs),
        ],
    ))
}

/// `rec X = E` => `X = gamma(YSTAR, lambda X . E)`
fn standardize_rec(children: Vec<AstNode>) -> Result<AstNode, InterpError> {
    let mut it = children.into_iter();
    let def = it
        .next()
        .ok_or_else(|| InterpError::MalformedTree("rec missing definition".to_string()))?;
    let (name, expr) = expect_equal(def)?;
    Ok(AstNode::with_children(
        AstNodeType::Equal,
        vec![
            name.clone(),
            gamma(AstNode::new(AstNodeType::YStar), lambda(name, expr)),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::scan;

    fn standardize_src(src: &str) -> AstNode {
        let ast = Parser::new(scan(src).unwrap()).parse().unwrap();
        standardize(ast).unwrap()
    }

    #[test]
    fn no_surface_nodes_survive_standardization() {
        fn assert_canonical(node: &AstNode) {
            assert!(!node.kind.is_surface_only(), "surface node survived: {:?}", node.kind);
            for child in &node.children {
                assert_canonical(child);
            }
        }
        let ast = standardize_src("let x = 5 in x + 1 where f = 2 within rec g = g");
        assert_canonical(&ast);
    }

    #[test]
    fn let_becomes_gamma_of_lambda() {
        let ast = standardize_src("let x = 5 in x");
        assert_eq!(ast.kind, AstNodeType::Gamma);
        assert_eq!(ast.children[0].kind, AstNodeType::Lambda);
        assert_eq!(ast.children[1].kind, AstNodeType::Integer);
    }

    #[test]
    fn where_becomes_gamma_of_lambda() {
        let ast = standardize_src("x + 1 where x = 5");
        assert_eq!(ast.kind, AstNodeType::Gamma);
        assert_eq!(ast.children[0].kind, AstNodeType::Lambda);
    }

    #[test]
    fn fcn_form_becomes_equal_of_lambda_chain() {
        let ast = standardize_src("let f x y = x + y in f 2 3");
        // let rewrites to gamma(lambda f . body, fcn_form's standardized rhs)
        assert_eq!(ast.kind, AstNodeType::Gamma);
        let bound_expr = &ast.children[1];
        assert_eq!(bound_expr.kind, AstNodeType::Lambda);
        assert_eq!(bound_expr.children[0].name(), Some("x"));
        let inner = &bound_expr.children[1];
        assert_eq!(inner.kind, AstNodeType::Lambda);
        assert_eq!(inner.children[0].name(), Some("y"));
    }

    #[test]
    fn rec_wraps_with_ystar() {
        let ast = standardize_src("let fact = rec f = fn n . n in fact 5");
        // the let-bound expr is the standardized rec definition's rhs
        let expr = &ast.children[1];
        assert_eq!(expr.kind, AstNodeType::Gamma);
        assert_eq!(expr.children[0].kind, AstNodeType::YStar);
    }

    #[test]
    fn simultdef_builds_comma_and_tau() {
        let ast = standardize_src("let a = 1 and b = 2 in a");
        let expr = &ast.children[1];
        assert_eq!(expr.kind, AstNodeType::Tau);
        assert_eq!(expr.children.len(), 2);
    }

    #[test]
    fn within_rewrites_to_nested_equal() {
        let ast = standardize_src("let y = x + 1 within x = 5 in 1");
        // top-level let binds y now (since within produces `y = ...`)
        assert_eq!(ast.kind, AstNodeType::Gamma);
        assert_eq!(ast.children[0].kind, AstNodeType::Lambda);
    }
}
