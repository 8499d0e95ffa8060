//! Renders a grammar back into BNF text.
//!
//! Non-terminals print as `<name>`, terminals always print quoted so that any
//! terminal name, including ones made of BNF punctuation, parses back to the
//! same terminal. Alternatives after the first go on their own line, with the
//! `|` lined up under the `=` of `::=`.

use super::{Cfg, Rule};

/// Quotes a terminal name, escaping `\` and `'`.
pub fn quote(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('\'');
    for c in name.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Formats one rule, e.g. `<op> ::= '+'` followed by `| '-'` lines.
pub fn format_rule<T>(rule: &Rule<T>) -> String {
    let head = format!("{} ::= ", rule.start());
    let indent = " ".repeat(head.len() - 2);

    let mut text = head;
    for (i, alternative) in rule.alternatives().iter().enumerate() {
        if i > 0 {
            text.push('\n');
            text.push_str(&indent);
            text.push_str("| ");
        }
        text.push_str(&alternative.to_string());
    }
    text
}

/// Formats a whole grammar, one rule after the other.
///
/// The start rule always comes first, since the parser takes the first rule
/// as the start symbol. The other rules follow in grammar order.
pub fn format<T>(cfg: &Cfg<T>) -> String {
    let start = cfg.rule(cfg.start());
    start
        .into_iter()
        .chain(cfg.rules().iter().filter(|r| r.start() != cfg.start()))
        .map(format_rule)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parser::parse;
    use crate::grammar::{Expression, NonTerminal, Symbol, Terminal};
    use crate::test_grammars::EXPR_GRAMMAR;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("x"), "'x'");
        assert_eq!(quote("it's"), r"'it\'s'");
        assert_eq!(quote(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn test_format_rule_layout() {
        let cfg = parse("<op> ::= + | - | <x>\n<x> ::= y").unwrap();
        assert_eq!(
            format(&cfg),
            "<op> ::= '+'\n       | '-'\n       | <x>\n<x> ::= 'y'"
        );
    }

    #[test]
    fn test_format_then_parse_round_trip() {
        let cfg = parse(EXPR_GRAMMAR).unwrap();
        let reparsed = parse(&format(&cfg)).unwrap();

        assert_eq!(reparsed, cfg);
        assert_eq!(reparsed.rules().len(), 4);
        for (a, b) in cfg.rules().iter().zip(reparsed.rules()) {
            assert_eq!(a.alternatives().len(), b.alternatives().len());
        }
    }

    #[test]
    fn test_round_trip_of_awkward_terminals() {
        let awkward = ["'", "\\", "<tag>", "a | b", "::=", " spaced "];
        let alternatives = awkward
            .iter()
            .map(|name| Expression::new(vec![Symbol::text(*name).unwrap()]).unwrap())
            .collect();
        let cfg = Cfg::of(vec![Rule::of("s", alternatives).unwrap()]).unwrap();

        let reparsed = parse(&format(&cfg)).unwrap();
        assert_eq!(reparsed, cfg);
    }

    #[test]
    fn test_round_trip_keeps_start_symbol() {
        let a = NonTerminal::new("a").unwrap();
        let b = NonTerminal::new("b").unwrap();
        let cfg = Cfg::new(
            vec![a.clone(), b.clone()],
            vec![Terminal::of("x").unwrap()],
            vec![
                Rule::of("a", vec![Expression::new(vec![Symbol::text("x").unwrap()]).unwrap()]).unwrap(),
                Rule::of("b", vec![Expression::new(vec![Symbol::NonTerminal(a)]).unwrap()]).unwrap(),
            ],
            b,
        )
        .unwrap();

        let text = format(&cfg);
        assert_eq!(text, "<b> ::= <a>\n<a> ::= 'x'");

        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed.start(), cfg.start());
        assert_eq!(reparsed.rules().len(), cfg.rules().len());
        for rule in cfg.rules() {
            assert_eq!(reparsed.rule(rule.start()), Some(rule));
        }
    }

    #[test]
    fn test_display_matches_format() {
        let cfg = parse(EXPR_GRAMMAR).unwrap();
        assert_eq!(cfg.to_string(), format(&cfg));
    }
}
