use super::parser::ParseError;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Assign,
    Bar,
    Lt,
    Gt,
    Id,
    String,
    QuotedString,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Assign => "ASSIGN",
            TokenKind::Bar => "BAR",
            TokenKind::Lt => "LT",
            TokenKind::Gt => "GT",
            TokenKind::Id => "ID",
            TokenKind::String => "STRING",
            TokenKind::QuotedString => "QUOTED_STRING",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// A lexeme of the BNF notation together with where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Text of the token; for quoted strings this is the unescaped content
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// Whether this token can start an element of an expression.
    pub fn is_text(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Id | TokenKind::String | TokenKind::QuotedString
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::QuotedString => write!(f, "{} '{}'", self.kind, self.value),
            _ => write!(f, "{} `{}`", self.kind, self.value),
        }
    }
}

pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Whether `name` lexes as a single ID token, the only form a non-terminal
/// name can take inside `<...>`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_id_start) && chars.all(is_id_char)
}

fn is_string_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && !matches!(c, '<' | '>' | '|' | '\'')
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn token(&self, kind: TokenKind, value: impl Into<String>, line: usize, column: usize) -> Token {
        Token {
            kind,
            value: value.into(),
            line,
            column,
        }
    }

    /// Reads the next token. Returns an `Eof` token once the input is drained,
    /// and keeps returning it on further calls.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }

        let (line, column) = (self.line, self.column);
        let Some(&c) = self.chars.peek() else {
            return Ok(self.token(TokenKind::Eof, "", line, column));
        };

        match c {
            '<' => {
                self.bump();
                Ok(self.token(TokenKind::Lt, "<", line, column))
            }
            '>' => {
                self.bump();
                Ok(self.token(TokenKind::Gt, ">", line, column))
            }
            '|' => {
                self.bump();
                Ok(self.token(TokenKind::Bar, "|", line, column))
            }
            '\'' => self.quoted(line, column),
            ':' if self.at_assign() => {
                self.bump();
                self.bump();
                self.bump();
                Ok(self.token(TokenKind::Assign, "::=", line, column))
            }
            c if is_id_start(c) => {
                let mut value = String::new();
                while let Some(&c) = self.chars.peek().filter(|&&c| is_id_char(c)) {
                    value.push(c);
                    self.bump();
                }
                Ok(self.token(TokenKind::Id, value, line, column))
            }
            c if is_string_char(c) => {
                let mut value = String::new();
                while let Some(&c) = self.chars.peek().filter(|&&c| is_string_char(c)) {
                    if c == ':' && self.at_assign() {
                        break;
                    }
                    value.push(c);
                    self.bump();
                }
                Ok(self.token(TokenKind::String, value, line, column))
            }
            c => Err(ParseError::InvalidCharacter {
                character: c,
                line,
                column,
            }),
        }
    }

    fn at_assign(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next() == Some(':') && ahead.next() == Some(':') && ahead.next() == Some('=')
    }

    fn quoted(&mut self, line: usize, column: usize) -> Result<Token, ParseError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\'') => return Ok(self.token(TokenKind::QuotedString, value, line, column)),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(ParseError::UnterminatedQuote { line, column }),
                },
                Some(c) => value.push(c),
                None => return Err(ParseError::UnterminatedQuote { line, column }),
            }
        }
    }
}

/// Convenience for tests and tooling: tokenizes the whole input, `Eof` included.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
