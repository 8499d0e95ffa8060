//! Immutable, validated model of a context-free grammar.
//!
//! A `Cfg` is built either from a plain list of rules (`Cfg::of`), in which case
//! rules sharing a start symbol are merged, or from the fully decomposed
//! four-tuple (`Cfg::new`). Both paths run the same validation pass, so a `Cfg`
//! value in hand is always closed over its symbols and has a start rule.

pub mod formatter;
pub mod parser;
pub mod tokenizer;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::num::NonZeroUsize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("Grammar must contain at least one rule")]
    EmptyRules,
    #[error("Found duplicate rule for non-terminal '<{0}>'")]
    DuplicateRule(String),
    #[error("Start symbol '<{0}>' has no rule")]
    MissingStartRule(String),
    #[error("Undefined symbol '{symbol}' referenced in rule '<{rule}>'")]
    UndefinedSymbol { symbol: String, rule: String },
    #[error("Symbol '{0}' is declared both as terminal and as non-terminal")]
    AmbiguousSymbol(String),
    #[error("Terminal '{0}' is declared with conflicting values")]
    ConflictingTerminal(String),
    #[error("Symbol name must not be empty")]
    EmptyName,
    #[error("Non-terminal name '{0}' must start with a letter and contain only letters, digits and '-'")]
    InvalidName(String),
    #[error("Expression must contain at least one symbol")]
    EmptyExpression,
    #[error("Rule '<{0}>' must have at least one alternative")]
    EmptyAlternatives(String),
}

/// A symbol which is rewritten by a rule. Identity is by name, and the name
/// is a BNF identifier so that every grammar can be written out as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonTerminal {
    name: String,
}

impl NonTerminal {
    pub fn new(name: impl Into<String>) -> Result<Self, GrammarError> {
        let name = name.into();
        if name.is_empty() {
            return Err(GrammarError::EmptyName);
        }
        if !tokenizer::is_identifier(&name) {
            return Err(GrammarError::InvalidName(name));
        }
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A leaf symbol of the grammar. The `value` is the semantic payload and is
/// independent of the display `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Terminal<T> {
    name: String,
    value: T,
}

impl<T> Terminal<T> {
    pub fn new(name: impl Into<String>, value: T) -> Result<Self, GrammarError> {
        let name = name.into();
        if name.is_empty() {
            return Err(GrammarError::EmptyName);
        }
        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl Terminal<String> {
    /// Creates a terminal whose value is its own name.
    pub fn of(name: impl Into<String>) -> Result<Self, GrammarError> {
        let name = name.into();
        let value = name.clone();
        Self::new(name, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol<T> {
    NonTerminal(NonTerminal),
    Terminal(Terminal<T>),
}

impl<T> Symbol<T> {
    /// Shorthand for a non-terminal symbol.
    pub fn non_terminal(name: impl Into<String>) -> Result<Self, GrammarError> {
        NonTerminal::new(name).map(Symbol::NonTerminal)
    }

    /// Shorthand for a terminal symbol carrying an explicit value.
    pub fn terminal(name: impl Into<String>, value: T) -> Result<Self, GrammarError> {
        Terminal::new(name, value).map(Symbol::Terminal)
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::NonTerminal(nt) => nt.name(),
            Symbol::Terminal(t) => t.name(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_terminal(&self) -> Option<&Terminal<T>> {
        match self {
            Symbol::Terminal(t) => Some(t),
            Symbol::NonTerminal(_) => None,
        }
    }

    pub fn as_non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(nt) => Some(nt),
            Symbol::Terminal(_) => None,
        }
    }
}

impl Symbol<String> {
    /// Shorthand for a terminal symbol whose value is its name.
    pub fn text(name: impl Into<String>) -> Result<Self, GrammarError> {
        Terminal::of(name).map(Symbol::Terminal)
    }
}

/// One right-hand-side alternative of a rule: a non-empty symbol sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression<T> {
    symbols: Vec<Symbol<T>>,
}

impl<T> Expression<T> {
    pub fn new(symbols: Vec<Symbol<T>>) -> Result<Self, GrammarError> {
        if symbols.is_empty() {
            return Err(GrammarError::EmptyExpression);
        }
        Ok(Self { symbols })
    }

    pub fn symbols(&self) -> &[Symbol<T>] {
        &self.symbols
    }
}

/// A non-terminal together with its ordered, non-empty list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule<T> {
    start: NonTerminal,
    alternatives: Vec<Expression<T>>,
}

impl<T> Rule<T> {
    pub fn new(start: NonTerminal, alternatives: Vec<Expression<T>>) -> Result<Self, GrammarError> {
        if alternatives.is_empty() {
            return Err(GrammarError::EmptyAlternatives(start.name));
        }
        Ok(Self {
            start,
            alternatives,
        })
    }

    /// Creates a rule from the name of its start symbol.
    pub fn of(name: impl Into<String>, alternatives: Vec<Expression<T>>) -> Result<Self, GrammarError> {
        Self::new(NonTerminal::new(name)?, alternatives)
    }

    pub fn start(&self) -> &NonTerminal {
        &self.start
    }

    pub fn alternatives(&self) -> &[Expression<T>] {
        &self.alternatives
    }

    /// Number of alternatives, the upper bound handed to a `SymbolIndex`.
    pub fn alternative_count(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.alternatives.len()).unwrap_or(NonZeroUsize::MIN)
    }
}

/// Represents a validated context-free grammar.
///
/// The grammar is immutable once built and can be read concurrently by any
/// number of generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cfg<T> {
    non_terminals: Vec<NonTerminal>,
    terminals: Vec<Terminal<T>>,
    rules: Vec<Rule<T>>,
    start: NonTerminal,
}

impl<T: Clone + PartialEq> Cfg<T> {
    /// Creates a grammar from its decomposed parts.
    ///
    /// Symbol lists are deduplicated by name, keeping the first occurrence.
    /// Unlike [`Cfg::of`], two rules for the same non-terminal are an error here.
    ///
    /// # Arguments
    /// * `non_terminals` - Every non-terminal the rules may reference
    /// * `terminals` - Every terminal the rules may reference
    /// * `rules` - The production rules, at most one per non-terminal
    /// * `start` - The start symbol, which must have a rule
    ///
    /// # Returns
    /// * `Result<Self, GrammarError>` - The validated grammar, or the first violated invariant
    pub fn new(
        non_terminals: Vec<NonTerminal>,
        terminals: Vec<Terminal<T>>,
        rules: Vec<Rule<T>>,
        start: NonTerminal,
    ) -> Result<Self, GrammarError> {
        if rules.is_empty() {
            return Err(GrammarError::EmptyRules);
        }

        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.start.name()) {
                return Err(GrammarError::DuplicateRule(rule.start.name.clone()));
            }
        }
        if !seen.contains(start.name()) {
            return Err(GrammarError::MissingStartRule(start.name));
        }

        let non_terminals = distinct_non_terminals(non_terminals);
        let terminals = distinct_terminals(terminals)?;

        let nt_names: HashSet<&str> = non_terminals.iter().map(NonTerminal::name).collect();
        if let Some(t) = terminals.iter().find(|t| nt_names.contains(t.name())) {
            return Err(GrammarError::AmbiguousSymbol(t.name.clone()));
        }
        let terminals_by_name: HashMap<&str, &Terminal<T>> =
            terminals.iter().map(|t| (t.name(), t)).collect();

        for rule in &rules {
            if !nt_names.contains(rule.start.name()) {
                return Err(GrammarError::UndefinedSymbol {
                    symbol: rule.start.name.clone(),
                    rule: rule.start.name.clone(),
                });
            }
            for symbol in rule.alternatives.iter().flat_map(|e| e.symbols.iter()) {
                let defined = match symbol {
                    Symbol::NonTerminal(nt) => nt_names.contains(nt.name()),
                    Symbol::Terminal(t) => match terminals_by_name.get(t.name()) {
                        Some(declared) if declared.value != t.value => {
                            return Err(GrammarError::ConflictingTerminal(t.name.clone()));
                        }
                        Some(_) => true,
                        None => false,
                    },
                };
                if !defined {
                    return Err(GrammarError::UndefinedSymbol {
                        symbol: symbol.name().to_string(),
                        rule: rule.start.name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            non_terminals,
            terminals,
            rules,
            start,
        })
    }

    /// Creates a grammar from a list of rules.
    ///
    /// Rules with the same start symbol are merged, their alternatives
    /// concatenated in source order. The start symbol of the first rule
    /// becomes the grammar's start symbol, and the symbol lists are collected
    /// from the rules themselves.
    pub fn of(rules: Vec<Rule<T>>) -> Result<Self, GrammarError> {
        let start = rules.first().ok_or(GrammarError::EmptyRules)?.start.clone();
        let rules = merge_rules(rules);

        let mut non_terminals = Vec::new();
        let mut terminals = Vec::new();
        for rule in &rules {
            non_terminals.push(rule.start.clone());
            for symbol in rule.alternatives.iter().flat_map(|e| e.symbols.iter()) {
                match symbol {
                    Symbol::NonTerminal(nt) => non_terminals.push(nt.clone()),
                    Symbol::Terminal(t) => terminals.push(t.clone()),
                }
            }
        }

        Self::new(non_terminals, terminals, rules, start)
    }
}

impl<T> Cfg<T> {
    pub fn start(&self) -> &NonTerminal {
        &self.start
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminals
    }

    pub fn terminals(&self) -> &[Terminal<T>] {
        &self.terminals
    }

    /// Looks up the rule rewriting the given non-terminal.
    pub fn rule(&self, non_terminal: &NonTerminal) -> Option<&Rule<T>> {
        self.rule_by_name(non_terminal.name())
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&Rule<T>> {
        self.rules.iter().find(|r| r.start.name() == name)
    }

    /// Rewrites every terminal value while keeping the grammar's shape.
    ///
    /// `mapper` is invoked once per distinct terminal; every occurrence of that
    /// terminal in the rules shares the mapped value.
    ///
    /// # Arguments
    /// * `mapper` - Function from a source terminal to its new payload
    ///
    /// # Returns
    /// * `Cfg<A>` - A grammar with identical symbols and rules but mapped terminal values
    pub fn map<A, F>(&self, mut mapper: F) -> Cfg<A>
    where
        A: Clone,
        F: FnMut(&Terminal<T>) -> A,
    {
        let mut memo: HashMap<String, A> = HashMap::with_capacity(self.terminals.len());
        let mut convert = |t: &Terminal<T>| Terminal {
            name: t.name.clone(),
            value: memo
                .entry(t.name.clone())
                .or_insert_with(|| mapper(t))
                .clone(),
        };

        let terminals = self.terminals.iter().map(&mut convert).collect();
        let rules = self
            .rules
            .iter()
            .map(|rule| Rule {
                start: rule.start.clone(),
                alternatives: rule
                    .alternatives
                    .iter()
                    .map(|e| Expression {
                        symbols: e
                            .symbols
                            .iter()
                            .map(|s| match s {
                                Symbol::NonTerminal(nt) => Symbol::NonTerminal(nt.clone()),
                                Symbol::Terminal(t) => Symbol::Terminal(convert(t)),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Cfg {
            non_terminals: self.non_terminals.clone(),
            terminals,
            rules,
            start: self.start.clone(),
        }
    }
}

fn merge_rules<T>(rules: Vec<Rule<T>>) -> Vec<Rule<T>> {
    let mut merged: Vec<Rule<T>> = Vec::with_capacity(rules.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    for rule in rules {
        match positions.get(rule.start.name()) {
            Some(&i) => merged[i].alternatives.extend(rule.alternatives),
            None => {
                positions.insert(rule.start.name.clone(), merged.len());
                merged.push(rule);
            }
        }
    }
    merged
}

fn distinct_non_terminals(symbols: Vec<NonTerminal>) -> Vec<NonTerminal> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|nt| seen.insert(nt.name.clone()))
        .collect()
}

fn distinct_terminals<T: PartialEq>(symbols: Vec<Terminal<T>>) -> Result<Vec<Terminal<T>>, GrammarError> {
    let mut result: Vec<Terminal<T>> = Vec::with_capacity(symbols.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    for t in symbols {
        match positions.get(t.name()) {
            Some(&i) if result[i].value != t.value => {
                return Err(GrammarError::ConflictingTerminal(t.name));
            }
            Some(_) => {}
            None => {
                positions.insert(t.name.clone(), result.len());
                result.push(t);
            }
        }
    }
    Ok(result)
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

impl<T> fmt::Display for Terminal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&formatter::quote(&self.name))
    }
}

impl<T> fmt::Display for Symbol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::NonTerminal(nt) => write!(f, "{}", nt),
            Symbol::Terminal(t) => write!(f, "{}", t),
        }
    }
}

impl<T> fmt::Display for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, symbol) in self.symbols.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

impl<T> fmt::Display for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&formatter::format_rule(self))
    }
}

impl<T> fmt::Display for Cfg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&formatter::format(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn nt(name: &str) -> Symbol<String> {
        Symbol::non_terminal(name).unwrap()
    }

    fn t(name: &str) -> Symbol<String> {
        Symbol::text(name).unwrap()
    }

    fn expr(symbols: Vec<Symbol<String>>) -> Expression<String> {
        Expression::new(symbols).unwrap()
    }

    fn rule(name: &str, alternatives: Vec<Expression<String>>) -> Rule<String> {
        Rule::of(name, alternatives).unwrap()
    }

    fn get_test_grammar() -> Cfg<String> {
        Cfg::of(vec![
            rule(
                "expr",
                vec![
                    expr(vec![nt("num")]),
                    expr(vec![t("("), nt("expr"), nt("op"), nt("expr"), t(")")]),
                ],
            ),
            rule("op", vec![expr(vec![t("+")]), expr(vec![t("-")])]),
            rule("num", vec![expr(vec![t("0")]), expr(vec![t("1")])]),
        ])
        .unwrap()
    }

    #[test]
    fn test_of_collects_symbols_in_order() {
        let cfg = get_test_grammar();

        assert_eq!(cfg.start().name(), "expr");
        assert_eq!(cfg.rules().len(), 3);
        let nts: Vec<&str> = cfg.non_terminals().iter().map(NonTerminal::name).collect();
        assert_eq!(nts, vec!["expr", "num", "op"]);
        let ts: Vec<&str> = cfg.terminals().iter().map(Terminal::name).collect();
        assert_eq!(ts, vec!["(", ")", "+", "-", "0", "1"]);
    }

    #[test]
    fn test_of_merges_rules_with_same_start() {
        let cfg = Cfg::of(vec![
            rule("a", vec![expr(vec![t("x")])]),
            rule("b", vec![expr(vec![t("y")])]),
            rule("a", vec![expr(vec![nt("b")]), expr(vec![t("z")])]),
        ])
        .unwrap();

        assert_eq!(cfg.rules().len(), 2);
        let a = cfg.rule_by_name("a").unwrap();
        let names: Vec<String> = a.alternatives().iter().map(|e| e.to_string()).collect();
        assert_eq!(names, vec!["'x'", "<b>", "'z'"]);
        assert_eq!(a.alternative_count().get(), 3);
    }

    #[test]
    fn test_empty_rules_rejected() {
        let result: Result<Cfg<String>, _> = Cfg::of(vec![]);
        assert_eq!(result.unwrap_err(), GrammarError::EmptyRules);
    }

    #[test]
    fn test_new_rejects_duplicate_rules() {
        let a = NonTerminal::new("a").unwrap();
        let result = Cfg::new(
            vec![a.clone()],
            vec![Terminal::of("x").unwrap()],
            vec![
                rule("a", vec![expr(vec![t("x")])]),
                rule("a", vec![expr(vec![t("x")])]),
            ],
            a,
        );
        assert_eq!(result.unwrap_err(), GrammarError::DuplicateRule("a".to_string()));
    }

    #[test]
    fn test_new_rejects_missing_start_rule() {
        let result = Cfg::new(
            vec![NonTerminal::new("a").unwrap(), NonTerminal::new("s").unwrap()],
            vec![Terminal::of("x").unwrap()],
            vec![rule("a", vec![expr(vec![t("x")])])],
            NonTerminal::new("s").unwrap(),
        );
        assert_eq!(result.unwrap_err(), GrammarError::MissingStartRule("s".to_string()));
    }

    #[test]
    fn test_new_rejects_dangling_reference() {
        let a = NonTerminal::new("a").unwrap();
        let result = Cfg::new(
            vec![a.clone()],
            vec![],
            vec![rule("a", vec![expr(vec![t("x")])])],
            a,
        );
        assert!(matches!(
            result,
            Err(GrammarError::UndefinedSymbol { symbol, rule }) if symbol == "x" && rule == "a"
        ));
    }

    #[test]
    fn test_ambiguous_symbol_rejected() {
        let result = Cfg::of(vec![
            rule("a", vec![expr(vec![t("b")])]),
            rule("b", vec![expr(vec![t("x")])]),
        ]);
        assert_eq!(result.unwrap_err(), GrammarError::AmbiguousSymbol("b".to_string()));
    }

    #[test]
    fn test_conflicting_terminal_values_rejected() {
        let result: Result<Cfg<i32>, _> = Cfg::of(vec![Rule::of(
            "a",
            vec![
                Expression::new(vec![Symbol::terminal("one", 1).unwrap()]).unwrap(),
                Expression::new(vec![Symbol::terminal("one", 2).unwrap()]).unwrap(),
            ],
        )
        .unwrap()]);
        assert_eq!(result.unwrap_err(), GrammarError::ConflictingTerminal("one".to_string()));
    }

    #[test]
    fn test_empty_parts_rejected() {
        assert_eq!(NonTerminal::new("").unwrap_err(), GrammarError::EmptyName);
        assert_eq!(Terminal::of("").unwrap_err(), GrammarError::EmptyName);
        assert_eq!(
            Expression::<String>::new(vec![]).unwrap_err(),
            GrammarError::EmptyExpression
        );
        assert_eq!(
            Rule::<String>::of("a", vec![]).unwrap_err(),
            GrammarError::EmptyAlternatives("a".to_string())
        );
    }

    #[test]
    fn test_non_terminal_names_are_identifiers() {
        assert!(NonTerminal::new("expr-2").is_ok());
        for bad in ["my_rule", "2nd", "-x", "a b", "<a>"] {
            assert_eq!(
                NonTerminal::new(bad).unwrap_err(),
                GrammarError::InvalidName(bad.to_string())
            );
        }
        assert_eq!(
            Rule::<String>::of("my_rule", vec![expr(vec![t("x")])]).unwrap_err(),
            GrammarError::InvalidName("my_rule".to_string())
        );
    }

    #[test]
    fn test_non_terminal_without_rule_is_allowed() {
        let cfg = Cfg::of(vec![rule("a", vec![expr(vec![nt("b"), t("x")])])]).unwrap();
        assert!(cfg.rule_by_name("b").is_none());
        assert_eq!(cfg.non_terminals().len(), 2);
    }

    #[test]
    fn test_map_rewrites_values_once_per_terminal() {
        let cfg = Cfg::of(vec![
            rule("a", vec![expr(vec![t("1"), nt("b"), t("1")])]),
            rule("b", vec![expr(vec![t("2")]), expr(vec![t("1")])]),
        ])
        .unwrap();
        let calls = Cell::new(0);

        let mapped: Cfg<i64> = cfg.map(|t| {
            calls.set(calls.get() + 1);
            t.value().parse::<i64>().unwrap() * 10
        });

        assert_eq!(calls.get(), 2);
        assert_eq!(mapped.start().name(), "a");
        let a = mapped.rule_by_name("a").unwrap();
        let values: Vec<i64> = a.alternatives()[0]
            .symbols()
            .iter()
            .filter_map(|s| s.as_terminal().map(|t| *t.value()))
            .collect();
        assert_eq!(values, vec![10, 10]);
        let b = mapped.rule_by_name("b").unwrap();
        assert_eq!(b.alternatives()[0].symbols()[0].as_terminal().unwrap().value(), &20);
        assert_eq!(b.alternatives()[0].symbols()[0].name(), "2");
    }

    #[test]
    fn test_rule_lookup() {
        let cfg = get_test_grammar();
        let op = NonTerminal::new("op").unwrap();
        assert_eq!(cfg.rule(&op).unwrap().alternatives().len(), 2);
        assert!(cfg.rule(&NonTerminal::new("missing").unwrap()).is_none());
    }
}
