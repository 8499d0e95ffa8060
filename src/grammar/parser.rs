//! Recursive-descent parser for the BNF notation.
//!
//! ```text
//! rulelist     := rule+ EOF
//! rule         := nonterminal ASSIGN alternatives
//! alternatives := expression (BAR expression)*
//! expression   := element+
//! element      := nonterminal | text
//! nonterminal  := '<' ID '>'
//! text         := STRING | QUOTED_STRING | ID
//! ```
//!
//! Rules are not separated by anything but their own head, so telling a
//! trailing `<name>` element apart from the start of the next rule needs four
//! tokens of lookahead (`< name > ::=`).

use super::tokenizer::{Token, TokenKind, Tokenizer};
use super::{Cfg, Expression, GrammarError, NonTerminal, Rule, Symbol, Terminal};
use log::info;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

const LOOKAHEAD: usize = 4;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Expected {} but found {found} at line {line}, column {column}", format_kinds(.expected))]
    UnexpectedToken {
        expected: Vec<TokenKind>,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("Unterminated quoted text starting at line {line}, column {column}")]
    UnterminatedQuote { line: usize, column: usize },
    #[error("Empty terminal text at line {line}, column {column}")]
    EmptyTerminal { line: usize, column: usize },
    #[error("Invalid character {character:?} at line {line}, column {column}")]
    InvalidCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("Invalid grammar: {0}")]
    Grammar(#[from] GrammarError),
    #[error("Failed to read grammar file: {0}")]
    FileReadError(#[from] std::io::Error),
}

impl PartialEq for ParseError {
    fn eq(&self, other: &Self) -> bool {
        use ParseError::*;
        match (self, other) {
            (
                UnexpectedToken {
                    expected: a,
                    found: b,
                    line: c,
                    column: d,
                },
                UnexpectedToken {
                    expected: w,
                    found: x,
                    line: y,
                    column: z,
                },
            ) => a == w && b == x && c == y && d == z,
            (
                UnterminatedQuote { line: a, column: b },
                UnterminatedQuote { line: c, column: d },
            )
            | (EmptyTerminal { line: a, column: b }, EmptyTerminal { line: c, column: d }) => {
                a == c && b == d
            }
            (
                InvalidCharacter {
                    character: a,
                    line: b,
                    column: c,
                },
                InvalidCharacter {
                    character: x,
                    line: y,
                    column: z,
                },
            ) => a == x && b == y && c == z,
            (Grammar(a), Grammar(b)) => a == b,
            (FileReadError(a), FileReadError(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

fn format_kinds(kinds: &[TokenKind]) -> String {
    match kinds {
        [single] => single.to_string(),
        _ => {
            let names: Vec<String> = kinds.iter().map(TokenKind::to_string).collect();
            format!("one of [{}]", names.join(", "))
        }
    }
}

/// Parses a grammar in BNF notation.
///
/// Rules for the same non-terminal are merged, and the first rule's head
/// becomes the start symbol. Terminal values are the terminal texts.
///
/// # Arguments
/// * `text` - The BNF source
///
/// # Returns
/// * `Result<Cfg<String>, ParseError>` - The grammar, or the first error encountered
pub fn parse(text: &str) -> Result<Cfg<String>, ParseError> {
    let rules = Parser::new(text).rule_list()?;
    Ok(Cfg::of(rules)?)
}

/// Reads and parses a `.bnf` file.
pub fn parse_file(path: &Path) -> Result<Cfg<String>, ParseError> {
    let content = fs::read_to_string(path)?;
    let cfg = parse(&content)?;
    info!(
        "Parsed grammar '{}' with {} rules, start symbol {}",
        path.display(),
        cfg.rules().len(),
        cfg.start()
    );
    Ok(cfg)
}

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    buffer: VecDeque<Token>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokenizer: Tokenizer::new(text),
            buffer: VecDeque::with_capacity(LOOKAHEAD),
        }
    }

    /// Peeks at the `k`-th upcoming token, 1-based.
    fn la(&mut self, k: usize) -> Result<&Token, ParseError> {
        debug_assert!((1..=LOOKAHEAD).contains(&k));
        while self.buffer.len() < k {
            let token = self.tokenizer.next_token()?;
            self.buffer.push_back(token);
        }
        Ok(&self.buffer[k - 1])
    }

    fn kind(&mut self, k: usize) -> Result<TokenKind, ParseError> {
        Ok(self.la(k)?.kind)
    }

    fn consume(&mut self) -> Result<Token, ParseError> {
        match self.buffer.pop_front() {
            Some(token) => Ok(token),
            None => self.tokenizer.next_token(),
        }
    }

    fn unexpected(&mut self, expected: Vec<TokenKind>) -> ParseError {
        match self.la(1) {
            Ok(token) => ParseError::UnexpectedToken {
                expected,
                found: token.to_string(),
                line: token.line,
                column: token.column,
            },
            Err(e) => e,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.kind(1)? == kind {
            self.consume()
        } else {
            Err(self.unexpected(vec![kind]))
        }
    }

    fn rule_list(&mut self) -> Result<Vec<Rule<String>>, ParseError> {
        let mut rules = vec![self.rule()?];
        while self.kind(1)? != TokenKind::Eof {
            rules.push(self.rule()?);
        }
        Ok(rules)
    }

    fn rule(&mut self) -> Result<Rule<String>, ParseError> {
        let start = self.non_terminal()?;
        self.expect(TokenKind::Assign)?;
        let alternatives = self.alternatives()?;
        Ok(Rule::new(start, alternatives)?)
    }

    fn alternatives(&mut self) -> Result<Vec<Expression<String>>, ParseError> {
        let mut alternatives = vec![self.expression()?];
        while self.kind(1)? == TokenKind::Bar {
            self.consume()?;
            alternatives.push(self.expression()?);
        }
        Ok(alternatives)
    }

    fn expression(&mut self) -> Result<Expression<String>, ParseError> {
        let mut symbols = Vec::new();
        while self.at_element()? {
            symbols.push(self.element()?);
        }
        if symbols.is_empty() {
            return Err(self.unexpected(vec![
                TokenKind::Lt,
                TokenKind::Id,
                TokenKind::String,
                TokenKind::QuotedString,
            ]));
        }
        Ok(Expression::new(symbols)?)
    }

    /// An element starts with text, or with `<` unless that `<` opens the
    /// head of the next rule.
    fn at_element(&mut self) -> Result<bool, ParseError> {
        if self.la(1)?.is_text() {
            return Ok(true);
        }
        Ok(self.kind(1)? == TokenKind::Lt && self.kind(4)? != TokenKind::Assign)
    }

    fn element(&mut self) -> Result<Symbol<String>, ParseError> {
        if self.kind(1)? == TokenKind::Lt {
            return Ok(Symbol::NonTerminal(self.non_terminal()?));
        }
        let token = self.consume()?;
        if token.value.is_empty() {
            return Err(ParseError::EmptyTerminal {
                line: token.line,
                column: token.column,
            });
        }
        Ok(Symbol::Terminal(Terminal::of(token.value)?))
    }

    fn non_terminal(&mut self) -> Result<NonTerminal, ParseError> {
        self.expect(TokenKind::Lt)?;
        let name = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::Gt)?;
        Ok(NonTerminal::new(name.value)?)
    }
}
