//! Generation algorithms over a grammar and a [`SymbolIndex`].
//!
//! Every generator is bounded by a limit. Running past it is not an error:
//! the derivation and AST generators return the empty tree and the sentence
//! generator returns the empty sentence.

pub mod ast;
pub mod derivation;
pub mod sentence;

pub use ast::AstGenerator;
pub use derivation::DerivationTreeGenerator;
pub use sentence::{Expansion, SentenceGenerator};

use crate::evolution::codons::SymbolIndex;
use crate::grammar::{Cfg, Expression, NonTerminal};

/// Produces an object from a grammar.
pub trait Generator<T> {
    type Output;

    fn generate(&self, cfg: &Cfg<T>) -> Self::Output;
}

/// Picks the alternative `non_terminal` expands to.
///
/// # Arguments
/// * `non_terminal` - The symbol being expanded
/// * `cfg` - The grammar holding its rule
/// * `index` - Decides which alternative to use
///
/// # Returns
/// * `Option<&Expression<T>>` - The chosen alternative, `None` if the grammar has no rule for the symbol
pub fn select<'c, T, I>(non_terminal: &NonTerminal, cfg: &'c Cfg<T>, index: &I) -> Option<&'c Expression<T>>
where
    I: SymbolIndex<T> + ?Sized,
{
    let rule = cfg.rule(non_terminal)?;
    let bound = rule.alternative_count();
    // an index ignoring its bound wraps instead of panicking
    let choice = index.next(rule, bound) % bound.get();
    rule.alternatives().get(choice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parser::parse;
    use crate::grammar::Rule;
    use std::num::NonZeroUsize;

    #[test]
    fn test_select_uses_index() {
        let cfg = parse("<a> ::= x | y | z").unwrap();
        let second = |_: &Rule<String>, _: NonZeroUsize| 1;
        let a = cfg.start().clone();

        assert_eq!(select(&a, &cfg, &second).unwrap().to_string(), "'y'");
    }

    #[test]
    fn test_select_wraps_out_of_range_choice() {
        let cfg = parse("<a> ::= x | y | z").unwrap();
        let wild = |_: &Rule<String>, _: NonZeroUsize| 7;
        let a = cfg.start().clone();

        assert_eq!(select(&a, &cfg, &wild).unwrap().to_string(), "'y'");
    }

    #[test]
    fn test_select_without_rule() {
        let cfg = parse("<a> ::= x | <b>").unwrap();
        let first = |_: &Rule<String>, _: NonZeroUsize| 0;
        let b = NonTerminal::new("b").unwrap();

        assert!(select(&b, &cfg, &first).is_none());
    }
}
