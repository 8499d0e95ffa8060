use super::{select, Generator};
use crate::evolution::codons::SymbolIndex;
use crate::grammar::{Cfg, NonTerminal, Symbol, Terminal};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Order in which the sentence generator rewrites non-terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expansion {
    /// Always rewrite the leftmost non-terminal of the whole sentence.
    Leftmost,
    /// Sweep the sentence left to right, rewriting every non-terminal met.
    /// Symbols inserted during a sweep are not revisited until the next one.
    LeftToRight,
}

/// Expands the start symbol into a sequence of terminals.
///
/// Returns the empty sentence when the working sequence grows beyond `limit`
/// symbols, or when it reaches a non-terminal the grammar has no rule for.
#[derive(Debug)]
pub struct SentenceGenerator<I> {
    index: I,
    expansion: Expansion,
    limit: usize,
}

impl<I> SentenceGenerator<I> {
    pub fn new(index: I, expansion: Expansion, limit: usize) -> Self {
        Self {
            index,
            expansion,
            limit,
        }
    }

    pub fn expansion(&self) -> Expansion {
        self.expansion
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

enum Step {
    Expanded(usize),
    Stuck,
    Overflow,
}

impl<I> SentenceGenerator<I> {
    /// Replaces the non-terminal at `position` with one of its alternatives.
    fn expand<T>(&self, cfg: &Cfg<T>, symbols: &mut Vec<Symbol<T>>, position: usize, non_terminal: &NonTerminal) -> Step
    where
        T: Clone,
        I: SymbolIndex<T>,
    {
        let Some(alternative) = select(non_terminal, cfg, &self.index) else {
            warn!("No rule for {}, sentence cannot be completed", non_terminal);
            return Step::Stuck;
        };
        let inserted = alternative.symbols().len();
        symbols.splice(position..=position, alternative.symbols().iter().cloned());
        if symbols.len() > self.limit {
            debug!("Sentence exceeded {} symbols", self.limit);
            return Step::Overflow;
        }
        Step::Expanded(inserted)
    }

    fn leftmost<T>(&self, cfg: &Cfg<T>, symbols: &mut Vec<Symbol<T>>) -> bool
    where
        T: Clone,
        I: SymbolIndex<T>,
    {
        loop {
            let next = symbols
                .iter()
                .enumerate()
                .find_map(|(i, s)| s.as_non_terminal().map(|nt| (i, nt.clone())));
            let Some((position, non_terminal)) = next else {
                return true;
            };
            match self.expand(cfg, symbols, position, &non_terminal) {
                Step::Expanded(_) => {}
                Step::Stuck | Step::Overflow => return false,
            }
        }
    }

    fn left_to_right<T>(&self, cfg: &Cfg<T>, symbols: &mut Vec<Symbol<T>>) -> bool
    where
        T: Clone,
        I: SymbolIndex<T>,
    {
        loop {
            let mut expanded = false;
            let mut position = 0;
            while position < symbols.len() {
                let Some(non_terminal) = symbols[position].as_non_terminal().cloned() else {
                    position += 1;
                    continue;
                };
                match self.expand(cfg, symbols, position, &non_terminal) {
                    Step::Expanded(inserted) => {
                        position += inserted;
                        expanded = true;
                    }
                    Step::Stuck | Step::Overflow => return false,
                }
            }
            if !expanded {
                return true;
            }
        }
    }
}

impl<T, I> Generator<T> for SentenceGenerator<I>
where
    T: Clone,
    I: SymbolIndex<T>,
{
    type Output = Vec<Terminal<T>>;

    fn generate(&self, cfg: &Cfg<T>) -> Vec<Terminal<T>> {
        let mut symbols = vec![Symbol::NonTerminal(cfg.start().clone())];
        if symbols.len() > self.limit {
            return Vec::new();
        }

        let complete = match self.expansion {
            Expansion::Leftmost => self.leftmost(cfg, &mut symbols),
            Expansion::LeftToRight => self.left_to_right(cfg, &mut symbols),
        };
        if !complete {
            return Vec::new();
        }

        symbols
            .into_iter()
            .filter_map(|symbol| match symbol {
                Symbol::Terminal(terminal) => Some(terminal),
                Symbol::NonTerminal(_) => None,
            })
            .collect()
    }
}
