// ABOUTME: Recursive-descent parser building the surface AST from tokens

use crate::ast::{AstNode, AstNodeType};
use crate::error::ParseError;
use crate::scanner::{Token, TokenKind};

/// Parses a full token stream into a single surface-AST expression,
/// following RPAL's standard grammar (E / Ew / T / Ta / Tc / B / Bt / Bs /
/// Bp / A / At / Af / Ap / R / Rn for expressions, D / Da / Dr / Db / Vb /
/// Vl for definitions).
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> PResult<AstNode> {
        let expr = self.parse_e()?;
        if self.pos != self.tokens.len() {
            return Err(ParseError::UnexpectedToken {
                found: self.tokens[self.pos].text.clone(),
                expected: "end of input".to_string(),
            });
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_text(&self) -> Option<&str> {
        self.peek().map(|t| t.text.as_str())
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, text: &str) -> bool {
        self.peek_text() == Some(text)
    }

    fn expect(&mut self, text: &str) -> PResult<()> {
        if self.at(text) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(text))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError::UnexpectedToken {
                found: tok.text.clone(),
                expected: expected.to_string(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    fn expect_identifier(&mut self) -> PResult<String> {
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Identifier => {
                let name = tok.text.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    // E -> 'let' D 'in' E | 'fn' Vb+ '.' E | Ew
    fn parse_e(&mut self) -> PResult<AstNode> {
        if self.at("let") {
            self.pos += 1;
            let def = self.parse_d()?;
            self.expect("in")?;
            let body = self.parse_e()?;
            return Ok(AstNode::with_children(AstNodeType::Let, vec![def, body]));
        }
        if self.at("fn") {
            self.pos += 1;
            let mut params = Vec::new();
            params.push(self.parse_vb()?);
            while !self.at(".") {
                params.push(self.parse_vb()?);
            }
            self.expect(".")?;
            let body = self.parse_e()?;
            // Build a right-nested chain of single-param lambdas from the
            // accumulated vb list, innermost body last.
            let mut node = body;
            for param in params.into_iter().rev() {
                node = AstNode::with_children(AstNodeType::Lambda, vec![param, node]);
            }
            return Ok(node);
        }
        self.parse_ew()
    }

    // Ew -> T 'where' Dr | T
    fn parse_ew(&mut self) -> PResult<AstNode> {
        let t = self.parse_t()?;
        if self.at("where") {
            self.pos += 1;
            let dr = self.parse_dr()?;
            return Ok(AstNode::with_children(AstNodeType::Where, vec![t, dr]));
        }
        Ok(t)
    }

    // T -> Ta (',' Ta)+ | Ta
    fn parse_t(&mut self) -> PResult<AstNode> {
        let first = self.parse_ta()?;
        if self.at(",") {
            let mut items = vec![first];
            while self.at(",") {
                self.pos += 1;
                items.push(self.parse_ta()?);
            }
            return Ok(AstNode::with_children(AstNodeType::Tau, items));
        }
        Ok(first)
    }

    // Ta -> Ta 'aug' Tc | Tc
    fn parse_ta(&mut self) -> PResult<AstNode> {
        let mut left = self.parse_tc()?;
        while self.at("aug") {
            self.pos += 1;
            let right = self.parse_tc()?;
            left = AstNode::with_children(AstNodeType::Aug, vec![left, right]);
        }
        Ok(left)
    }

    // Tc -> B '->' Tc '|' Tc | B
    fn parse_tc(&mut self) -> PResult<AstNode> {
        let cond = self.parse_b()?;
        if self.at("->") {
            self.pos += 1;
            let then_branch = self.parse_tc()?;
            self.expect("|")?;
            let else_branch = self.parse_tc()?;
            return Ok(AstNode::with_children(
                AstNodeType::Conditional,
                vec![cond, then_branch, else_branch],
            ));
        }
        Ok(cond)
    }

    // B -> B 'or' Bt | Bt
    fn parse_b(&mut self) -> PResult<AstNode> {
        let mut left = self.parse_bt()?;
        while self.at("or") {
            self.pos += 1;
            let right = self.parse_bt()?;
            left = AstNode::with_children(AstNodeType::Or, vec![left, right]);
        }
        Ok(left)
    }

    // Bt -> Bt '&' Bs | Bs
    fn parse_bt(&mut self) -> PResult<AstNode> {
        let mut left = self.parse_bs()?;
        while self.at("&") {
            self.pos += 1;
            let right = self.parse_bs()?;
            left = AstNode::with_children(AstNodeType::And, vec![left, right]);
        }
        Ok(left)
    }

    // Bs -> 'not' Bp | Bp
    fn parse_bs(&mut self) -> PResult<AstNode> {
        if self.at("not") {
            self.pos += 1;
            let operand = self.parse_bp()?;
            return Ok(AstNode::with_children(AstNodeType::Not, vec![operand]));
        }
        self.parse_bp()
    }

    // Bp -> A (comparator) A | A
    fn parse_bp(&mut self) -> PResult<AstNode> {
        let left = self.parse_a()?;
        let kind = match self.peek_text() {
            Some("gr") | Some(">") => Some(AstNodeType::Gr),
            Some("ge") | Some(">=") => Some(AstNodeType::Ge),
            Some("ls") | Some("<") => Some(AstNodeType::Ls),
            Some("le") | Some("<=") => Some(AstNodeType::Le),
            Some("eq") => Some(AstNodeType::Eq),
            Some("ne") | Some("!=") => Some(AstNodeType::Ne),
            _ => None,
        };
        if let Some(kind) = kind {
            self.pos += 1;
            let right = self.parse_a()?;
            return Ok(AstNode::with_children(kind, vec![left, right]));
        }
        Ok(left)
    }

    // A -> A '+' At | A '-' At | '+' At | '-' At | At
    fn parse_a(&mut self) -> PResult<AstNode> {
        let mut left = if self.at("+") {
            self.pos += 1;
            self.parse_at()?
        } else if self.at("-") {
            self.pos += 1;
            let operand = self.parse_at()?;
            AstNode::with_children(AstNodeType::Neg, vec![operand])
        } else {
            self.parse_at()?
        };
        loop {
            if self.at("+") {
                self.pos += 1;
                let right = self.parse_at()?;
                left = AstNode::with_children(AstNodeType::Plus, vec![left, right]);
            } else if self.at("-") {
                self.pos += 1;
                let right = self.parse_at()?;
                left = AstNode::with_children(AstNodeType::Minus, vec![left, right]);
            } else {
                break;
            }
        }
        Ok(left)
    }

    // At -> At '*' Af | At '/' Af | Af
    fn parse_at(&mut self) -> PResult<AstNode> {
        let mut left = self.parse_af()?;
        loop {
            if self.at("*") {
                self.pos += 1;
                let right = self.parse_af()?;
                left = AstNode::with_children(AstNodeType::Mult, vec![left, right]);
            } else if self.at("/") {
                self.pos += 1;
                let right = self.parse_af()?;
                left = AstNode::with_children(AstNodeType::Div, vec![left, right]);
            } else {
                break;
            }
        }
        Ok(left)
    }

    // Af -> Ap '**' Af | Ap   (right-associative)
    fn parse_af(&mut self) -> PResult<AstNode> {
        let base = self.parse_ap()?;
        if self.at("**") {
            self.pos += 1;
            let exp = self.parse_af()?;
            return Ok(AstNode::with_children(AstNodeType::Exp, vec![base, exp]));
        }
        Ok(base)
    }

    // Ap -> Ap '@' '<IDENTIFIER>' R | R
    fn parse_ap(&mut self) -> PResult<AstNode> {
        let mut left = self.parse_r()?;
        while self.at("@") {
            self.pos += 1;
            let op_name = self.expect_identifier()?;
            let right = self.parse_r()?;
            left = AstNode::with_children(
                AstNodeType::At,
                vec![left, AstNode::identifier(op_name), right],
            );
        }
        Ok(left)
    }

    // R -> R Rn | Rn   (left-associative function application)
    fn parse_r(&mut self) -> PResult<AstNode> {
        let mut left = self.parse_rn()?;
        while self.starts_rn() {
            let arg = self.parse_rn()?;
            left = AstNode::with_children(AstNodeType::Gamma, vec![left, arg]);
        }
        Ok(left)
    }

    fn starts_rn(&self) -> bool {
        match self.peek() {
            Some(tok) => match tok.kind {
                TokenKind::Identifier | TokenKind::Integer | TokenKind::StringLit => true,
                TokenKind::Keyword => matches!(tok.text.as_str(), "true" | "false" | "nil" | "dummy"),
                TokenKind::Punct => tok.text == "(",
                _ => false,
            },
            None => false,
        }
    }

    // Rn -> '<IDENTIFIER>' | '<INTEGER>' | '<STRING>' | 'true' | 'false' | 'nil' | 'dummy' | '(' E ')'
    fn parse_rn(&mut self) -> PResult<AstNode> {
        let tok = self.advance().ok_or_else(|| ParseError::UnexpectedEof {
            expected: "expression".to_string(),
        })?;
        match (tok.kind, tok.text.as_str()) {
            (TokenKind::Identifier, _) => Ok(AstNode::identifier(tok.text)),
            (TokenKind::Integer, _) => Ok(AstNode::leaf(AstNodeType::Integer, tok.text)),
            (TokenKind::StringLit, _) => Ok(AstNode::leaf(AstNodeType::StringLit, tok.text)),
            (TokenKind::Keyword, "true") => Ok(AstNode::new(AstNodeType::True)),
            (TokenKind::Keyword, "false") => Ok(AstNode::new(AstNodeType::False)),
            (TokenKind::Keyword, "nil") => Ok(AstNode::new(AstNodeType::Nil)),
            (TokenKind::Keyword, "dummy") => Ok(AstNode::new(AstNodeType::Dummy)),
            (TokenKind::Punct, "(") => {
                let inner = self.parse_e()?;
                self.expect(")")?;
                Ok(inner)
            }
            _ => Err(ParseError::UnexpectedToken {
                found: tok.text,
                expected: "expression".to_string(),
            }),
        }
    }

    // D -> Da 'within' D | Da
    fn parse_d(&mut self) -> PResult<AstNode> {
        let da = self.parse_da()?;
        if self.at("within") {
            self.pos += 1;
            let d = self.parse_d()?;
            return Ok(AstNode::with_children(AstNodeType::Within, vec![da, d]));
        }
        Ok(da)
    }

    // Da -> Dr ('and' Dr)+ | Dr
    fn parse_da(&mut self) -> PResult<AstNode> {
        let first = self.parse_dr()?;
        if self.at("and") {
            let mut items = vec![first];
            while self.at("and") {
                self.pos += 1;
                items.push(self.parse_dr()?);
            }
            return Ok(AstNode::with_children(AstNodeType::SimultDef, items));
        }
        Ok(first)
    }

    // Dr -> 'rec' Db | Db
    fn parse_dr(&mut self) -> PResult<AstNode> {
        if self.at("rec") {
            self.pos += 1;
            let db = self.parse_db()?;
            return Ok(AstNode::with_children(AstNodeType::Rec, vec![db]));
        }
        self.parse_db()
    }

    // Db -> '(' D ')' | <IDENTIFIER> Vb+ '=' E => fcn_form | Vl '=' E
    fn parse_db(&mut self) -> PResult<AstNode> {
        if self.at("(") {
            self.pos += 1;
            let d = self.parse_d()?;
            self.expect(")")?;
            return Ok(d);
        }

        // Both alternatives start with an identifier; disambiguate by
        // lookahead for a following Vb (identifier or '(').
        let name = self.expect_identifier()?;
        if self.starts_vb() {
            let mut params = vec![AstNode::identifier(name)];
            while self.starts_vb() {
                params.push(self.parse_vb()?);
            }
            self.expect("=")?;
            let body = self.parse_e()?;
            let mut children = params;
            children.push(body);
            return Ok(AstNode::with_children(AstNodeType::FcnForm, children));
        }

        // Vl -> <IDENTIFIER> (',' <IDENTIFIER>)*
        let mut names = vec![AstNode::identifier(name)];
        while self.at(",") {
            self.pos += 1;
            names.push(AstNode::identifier(self.expect_identifier()?));
        }
        self.expect("=")?;
        let body = self.parse_e()?;
        let lhs = if names.len() == 1 {
            names.into_iter().next().unwrap()
        } else {
            AstNode::with_children(AstNodeType::Comma, names)
        };
        Ok(AstNode::with_children(AstNodeType::Equal, vec![lhs, body]))
    }

    fn starts_vb(&self) -> bool {
        matches!(self.peek(), Some(tok) if tok.kind == TokenKind::Identifier) || self.at("(")
    }

    // Vb -> <IDENTIFIER> | '(' Vl ')' | '(' ')'
    fn parse_vb(&mut self) -> PResult<AstNode> {
        if self.at("(") {
            self.pos += 1;
            if self.at(")") {
                self.pos += 1;
                return Ok(AstNode::new(AstNodeType::Nil));
            }
            let first = self.expect_identifier()?;
            let mut names = vec![AstNode::identifier(first)];
            while self.at(",") {
                self.pos += 1;
                names.push(AstNode::identifier(self.expect_identifier()?));
            }
            self.expect(")")?;
            if names.len() == 1 {
                return Ok(names.into_iter().next().unwrap());
            }
            return Ok(AstNode::with_children(AstNodeType::Comma, names));
        }
        Ok(AstNode::identifier(self.expect_identifier()?))
    }
}

/// Convenience entry point: scan then parse a complete RPAL program.
pub fn parse_program(source: &str) -> Result<AstNode, crate::error::InterpError> {
    let tokens = crate::scanner::scan(source)?;
    let ast = Parser::new(tokens).parse()?;
    Ok(ast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn parse(src: &str) -> AstNode {
        Parser::new(scan(src).unwrap()).parse().unwrap()
    }

    #[test]
    fn parses_integer_literal() {
        let ast = parse("42");
        assert_eq!(ast.kind, AstNodeType::Integer);
        assert_eq!(ast.name(), Some("42"));
    }

    #[test]
    fn parses_let_in() {
        let ast = parse("let x = 5 in x");
        assert_eq!(ast.kind, AstNodeType::Let);
        assert_eq!(ast.children.len(), 2);
        assert_eq!(ast.children[0].kind, AstNodeType::Equal);
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let ast = parse("1 + 2 * 3");
        assert_eq!(ast.kind, AstNodeType::Plus);
        assert_eq!(ast.children[1].kind, AstNodeType::Mult);
    }

    #[test]
    fn parses_function_application_as_gamma() {
        let ast = parse("Print 7");
        assert_eq!(ast.kind, AstNodeType::Gamma);
        assert_eq!(ast.children[0].name(), Some("Print"));
    }

    #[test]
    fn parses_lambda() {
        let ast = parse("fn x . x + 1");
        assert_eq!(ast.kind, AstNodeType::Lambda);
        assert_eq!(ast.children[0].name(), Some("x"));
    }

    #[test]
    fn parses_tuple_formation() {
        let ast = parse("2, 3");
        assert_eq!(ast.kind, AstNodeType::Tau);
        assert_eq!(ast.children.len(), 2);
    }

    #[test]
    fn parses_conditional() {
        let ast = parse("1 eq 1 -> 2 | 3");
        assert_eq!(ast.kind, AstNodeType::Conditional);
        assert_eq!(ast.children[0].kind, AstNodeType::Eq);
    }

    #[test]
    fn parses_where_clause() {
        let ast = parse("x + 1 where x = 5");
        assert_eq!(ast.kind, AstNodeType::Where);
    }

    #[test]
    fn parses_fcn_form_definition() {
        let ast = parse("let f x y = x + y in f 2 3");
        assert_eq!(ast.kind, AstNodeType::Let);
        assert_eq!(ast.children[0].kind, AstNodeType::FcnForm);
        // f, x, y params plus body => 4 children
        assert_eq!(ast.children[0].children.len(), 4);
    }

    #[test]
    fn rejects_dangling_let() {
        let err = Parser::new(scan("let x = 5").unwrap()).parse().unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }
}
