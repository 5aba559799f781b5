// ABOUTME: Character-level tokenizer for RPAL source text

use crate::error::LexError;
use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, tag, take_while, take_while1};
use nom::character::complete::{char, digit1, none_of, one_of};
use nom::combinator::{map, recognize, value};
use nom::sequence::delimited;
use nom::IResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    StringLit,
    Operator,
    Punct,
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }
}

const KEYWORDS: &[&str] = &[
    "let", "in", "fn", "where", "aug", "or", "not", "gr", "ge", "ls", "le", "eq", "ne", "true",
    "false", "nil", "dummy", "within", "and", "rec",
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn identifier_or_keyword(input: &str) -> IResult<&str, Token> {
    let (rest, whole) = recognize(nom::sequence::pair(
        take_while1(is_ident_start),
        take_while(is_ident_continue),
    ))(input)?;
    let kind = if KEYWORDS.contains(&whole) {
        TokenKind::Keyword
    } else {
        TokenKind::Identifier
    };
    Ok((rest, Token::new(kind, whole)))
}

fn integer(input: &str) -> IResult<&str, Token> {
    map(digit1, |s: &str| Token::new(TokenKind::Integer, s))(input)
}

fn string_lit(input: &str) -> IResult<&str, Token> {
    let escaped = alt((
        map(
            escaped_transform(
                none_of("\\'"),
                '\\',
                alt((
                    value("\\", char('\\')),
                    value("'", char('\'')),
                    value("\n", char('n')),
                    value("\t", char('t')),
                )),
            ),
            |s: String| s,
        ),
        value(String::new(), nom::combinator::peek(char('\''))),
    ));
    let (rest, s) = delimited(char('\''), escaped, char('\''))(input)?;
    Ok((rest, Token::new(TokenKind::StringLit, s)))
}

const OPERATOR_CHARS: &str = "+-*/<>&.@:=~|$!#%^_?";

fn operator(input: &str) -> IResult<&str, Token> {
    map(take_while1(|c| OPERATOR_CHARS.contains(c)), |s: &str| {
        Token::new(TokenKind::Operator, s)
    })(input)
}

fn punct(input: &str) -> IResult<&str, Token> {
    map(one_of("();,"), |c: char| {
        Token::new(TokenKind::Punct, c.to_string())
    })(input)
}

fn comment(input: &str) -> IResult<&str, ()> {
    value(
        (),
        nom::sequence::pair(tag("//"), take_while(|c| c != '\n')),
    )(input)
}

fn whitespace(input: &str) -> IResult<&str, ()> {
    value((), take_while1(|c: char| c.is_whitespace()))(input)
}

fn skip_trivia(mut input: &str) -> &str {
    loop {
        if let Ok((rest, _)) = whitespace(input) {
            input = rest;
            continue;
        }
        if let Ok((rest, _)) = comment(input) {
            input = rest;
            continue;
        }
        break;
    }
    input
}

fn next_token(input: &str) -> Result<Option<(&str, Token)>, LexError> {
    let input = skip_trivia(input);
    if input.is_empty() {
        return Ok(None);
    }
    if input.starts_with('\'') {
        return match string_lit(input) {
            Ok((rest, tok)) => Ok(Some((rest, tok))),
            Err(_) => Err(LexError::UnterminatedString),
        };
    }
    if let Ok((rest, tok)) = identifier_or_keyword(input) {
        return Ok(Some((rest, tok)));
    }
    if let Ok((rest, tok)) = integer(input) {
        return Ok(Some((rest, tok)));
    }
    if let Ok((rest, tok)) = punct(input) {
        return Ok(Some((rest, tok)));
    }
    if let Ok((rest, tok)) = operator(input) {
        return Ok(Some((rest, tok)));
    }
    let illegal = input.chars().next().unwrap();
    Err(LexError::IllegalCharacter(illegal))
}

/// Tokenize a full RPAL source string, skipping whitespace and `//` comments.
pub fn scan(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    while let Some((next_rest, tok)) = next_token(rest)? {
        tokens.push(tok);
        rest = next_rest;
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_identifiers_and_keywords() {
        let toks = scan("let x = 5 in x").unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| (t.kind.clone(), t.text.clone())).collect();
        assert_eq!(kinds[0], (TokenKind::Keyword, "let".to_string()));
        assert_eq!(kinds[1], (TokenKind::Identifier, "x".to_string()));
        assert_eq!(kinds[2], (TokenKind::Operator, "=".to_string()));
        assert_eq!(kinds[3], (TokenKind::Integer, "5".to_string()));
        assert_eq!(kinds[4], (TokenKind::Keyword, "in".to_string()));
        assert_eq!(kinds[5], (TokenKind::Identifier, "x".to_string()));
    }

    #[test]
    fn scans_string_literal_with_escapes() {
        let toks = scan(r"'hi\n'").unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::StringLit);
        assert_eq!(toks[0].text, "hi\n");
    }

    #[test]
    fn scans_string_literal_with_escaped_quote() {
        let toks = scan(r"'it\'s'").unwrap();
        assert_eq!(toks[0].text, "it's");
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = scan("'abc").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString);
    }

    #[test]
    fn rejects_illegal_character() {
        let err = scan("let x = `5").unwrap_err();
        assert_eq!(err, LexError::IllegalCharacter('`'));
    }

    #[test]
    fn skips_comments() {
        let toks = scan("x // this is a comment\n+ y").unwrap();
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[1].text, "+");
    }

    #[test]
    fn scans_parens_and_commas() {
        let toks = scan("(x, y)").unwrap();
        let texts: Vec<_> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["(", "x", ",", "y", ")"]);
    }
}
