//! Tokenizer shared by the parser and the token-level substitution.
//!
//! Every token keeps the byte span it was read from, so rewriting passes can
//! copy untouched source text (including whitespace) verbatim.

use std::fmt;
use std::ops::Range;

use crate::error::{ExprError, Result};

/// Kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    True,
    False,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Ident(name) => write!(f, "{name}"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::Not => write!(f, "!"),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::Ne => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Ge => write!(f, ">="),
        }
    }
}

/// A token together with its byte span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    /// The identifier name, if this is an identifier token.
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// Split expression text into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        if c.is_ascii_digit() || (c == '.' && peek_digit(bytes, pos + 1)) {
            pos = scan_number(bytes, pos);
            let text = &source[start..pos];
            let value = text
                .parse::<f64>()
                .map_err(|_| ExprError::MalformedNumber {
                    text: text.to_string(),
                    offset: start,
                })?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                span: start..pos,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            let kind = match &source[start..pos] {
                "true" => TokenKind::True,
                "false" => TokenKind::False,
                name => TokenKind::Ident(name.to_string()),
            };
            tokens.push(Token {
                kind,
                span: start..pos,
            });
            continue;
        }

        let next = bytes.get(pos + 1).map(|b| *b as char);
        let (kind, width) = match (c, next) {
            ('&', Some('&')) => (TokenKind::And, 2),
            ('|', Some('|')) => (TokenKind::Or, 2),
            ('=', Some('=')) => (TokenKind::Eq, 2),
            ('!', Some('=')) => (TokenKind::Ne, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('&', _) => (TokenKind::And, 1),
            ('|', _) => (TokenKind::Or, 1),
            ('!', _) => (TokenKind::Not, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('^', _) => (TokenKind::Caret, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            _ => {
                let ch = source[pos..].chars().next().unwrap_or(c);
                return Err(ExprError::UnexpectedChar { ch, offset: pos });
            }
        };
        pos += width;
        tokens.push(Token {
            kind,
            span: start..pos,
        });
    }

    Ok(tokens)
}

fn peek_digit(bytes: &[u8], pos: usize) -> bool {
    bytes.get(pos).is_some_and(|b| b.is_ascii_digit())
}

/// Scan `digits [. digits] [e|E [+|-] digits]` starting at `pos`.
fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        // Only an exponent if digits follow; otherwise `e` starts an identifier.
        if peek_digit(bytes, exp) {
            pos = exp;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn arithmetic_tokens() {
        assert_eq!(
            kinds("0.95*D + (1-p)"),
            vec![
                TokenKind::Number(0.95),
                TokenKind::Star,
                TokenKind::Ident("D".into()),
                TokenKind::Plus,
                TokenKind::LParen,
                TokenKind::Number(1.0),
                TokenKind::Minus,
                TokenKind::Ident("p".into()),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn boolean_tokens() {
        assert_eq!(
            kinds("A && !B || true"),
            vec![
                TokenKind::Ident("A".into()),
                TokenKind::And,
                TokenKind::Not,
                TokenKind::Ident("B".into()),
                TokenKind::Or,
                TokenKind::True,
            ]
        );
        assert_eq!(kinds("a<=b"), kinds("a <= b"));
        assert_eq!(kinds("A & B"), kinds("A && B"));
    }

    #[test]
    fn exponent_numbers() {
        assert_eq!(kinds("1e-3"), vec![TokenKind::Number(0.001)]);
        assert_eq!(kinds("2.5E2"), vec![TokenKind::Number(250.0)]);
        // `2e` followed by a letter is a number then an identifier
        assert_eq!(
            kinds("2*e"),
            vec![
                TokenKind::Number(2.0),
                TokenKind::Star,
                TokenKind::Ident("e".into())
            ]
        );
    }

    #[test]
    fn spans_cover_source() {
        let source = "Sqlite_1 * 0.5";
        let tokens = tokenize(source).unwrap();
        assert_eq!(&source[tokens[0].span.clone()], "Sqlite_1");
        assert_eq!(&source[tokens[2].span.clone()], "0.5");
        assert_eq!(tokens[0].ident(), Some("Sqlite_1"));
        assert_eq!(tokens[1].ident(), None);
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("A $ B").unwrap_err();
        assert_eq!(err, ExprError::UnexpectedChar { ch: '$', offset: 2 });
    }
}
