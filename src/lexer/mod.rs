//! Lexer for the action-trace format.
//!
//! A trace has one parser action per line: the action name followed by its
//! arguments (identifiers, literals or operator symbols). `#` starts a
//! comment that runs to the end of the line.

use logos::Logos;

use crate::error::{QuadraResult, SourceLocation, lexer_error};

fn unescape_char(slice: &str) -> Option<char> {
    let inner = &slice[1..slice.len() - 1];
    let mut chars = inner.chars();
    match (chars.next()?, chars.next()) {
        ('\\', Some(escaped)) => match escaped {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '0' => Some('\0'),
            '\\' | '\'' | '"' => Some(escaped),
            _ => None,
        },
        (c, None) => Some(c),
        _ => None,
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntegerLiteral(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r#""[^"\n]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    StringLiteral(String),

    #[regex(r"'([^'\\\n]|\\.)'", |lex| unescape_char(lex.slice()))]
    CharLiteral(char),

    // Operator symbols; `(` pushes the fake bottom.
    #[regex(r"&&|\|\||<=|>=|==|!=|[-+*/<>=(]", |lex| lex.slice().to_string())]
    Symbol(String),

    #[regex(r"\r?\n")]
    Newline,
}

#[derive(Debug, Clone)]
pub struct TokenWithLocation {
    pub token: Token,
    pub loc: SourceLocation,
}

pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            line: 1,
            line_start: 0,
        }
    }

    /// Tokenizes the whole trace. Newlines are consumed; each token keeps
    /// the line it came from.
    pub fn tokenize(&mut self) -> QuadraResult<Vec<TokenWithLocation>> {
        let mut tokens = Vec::new();

        while let Some(token_result) = self.inner.next() {
            let span = self.inner.span();
            let loc = SourceLocation {
                line: self.line,
                column: span.start - self.line_start + 1,
            };
            match token_result {
                Ok(Token::Newline) => {
                    self.line += 1;
                    self.line_start = span.end;
                }
                Ok(token) => tokens.push(TokenWithLocation { token, loc }),
                Err(_) => {
                    let error_text = &self.source[span];
                    return Err(lexer_error(
                        loc.line,
                        loc.column,
                        format!("Unexpected input: '{}'", error_text),
                    ));
                }
            }
        }

        Ok(tokens)
    }
}

pub fn lex(source: &str) -> QuadraResult<Vec<TokenWithLocation>> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuadraError;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn literals_and_symbols() {
        assert_eq!(
            kinds(r#"push_operand -3 2.5 'a' "hi" true <= ("#),
            vec![
                Token::Identifier("push_operand".into()),
                Token::IntegerLiteral(-3),
                Token::FloatLiteral(2.5),
                Token::CharLiteral('a'),
                Token::StringLiteral("hi".into()),
                Token::True,
                Token::Symbol("<=".into()),
                Token::Symbol("(".into()),
            ]
        );
    }

    #[test]
    fn comments_and_lines() {
        let tokens = lex("# header\ndeclare_type int # trailing\n\n  assign x\n").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.loc.line).collect();
        assert_eq!(lines, vec![2, 2, 4, 4]);
        assert_eq!(tokens[2].loc.column, 3);
    }

    #[test]
    fn escaped_char() {
        assert_eq!(kinds(r"'\n'"), vec![Token::CharLiteral('\n')]);
    }

    #[test]
    fn unexpected_input_reports_position() {
        let err = lex("assign x\nwrite @").unwrap_err();
        assert!(matches!(err, QuadraError::Lexer { line: 2, column: 7, .. }));
    }
}
