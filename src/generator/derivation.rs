use super::{select, Generator};
use crate::evolution::codons::SymbolIndex;
use crate::grammar::{Cfg, NonTerminal, Symbol};
use crate::tree::{NodeId, Tree};
use log::debug;

/// Builds a derivation tree by repeatedly expanding its leftmost expandable
/// leaf.
///
/// The tree starts as a single node holding the start symbol. Non-terminals
/// the grammar has no rule for stay unexpanded leaves. If the tree would grow
/// beyond `limit` nodes, the empty tree is returned instead.
#[derive(Debug)]
pub struct DerivationTreeGenerator<I> {
    index: I,
    limit: usize,
}

impl<I> DerivationTreeGenerator<I> {
    pub fn new(index: I, limit: usize) -> Self {
        Self { index, limit }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

fn next_expandable<T>(tree: &Tree<Symbol<T>>, cfg: &Cfg<T>) -> Option<(NodeId, NonTerminal)> {
    tree.leaves().into_iter().find_map(|id| {
        let non_terminal = tree.value(id)?.as_non_terminal()?;
        cfg.rule(non_terminal).map(|_| (id, non_terminal.clone()))
    })
}

impl<T, I> Generator<T> for DerivationTreeGenerator<I>
where
    T: Clone,
    I: SymbolIndex<T>,
{
    type Output = Tree<Symbol<T>>;

    fn generate(&self, cfg: &Cfg<T>) -> Tree<Symbol<T>> {
        let mut tree = Tree::new(Symbol::NonTerminal(cfg.start().clone()));
        if tree.len() > self.limit {
            return Tree::empty();
        }

        while let Some((leaf, non_terminal)) = next_expandable(&tree, cfg) {
            let Some(alternative) = select(&non_terminal, cfg, &self.index) else {
                break;
            };
            for symbol in alternative.symbols() {
                tree.attach(leaf, Some(symbol.clone()));
            }
            if tree.len() > self.limit {
                debug!(
                    "Derivation tree exceeded {} nodes while expanding {}",
                    self.limit, non_terminal
                );
                return Tree::empty();
            }
        }
        tree
    }
}
