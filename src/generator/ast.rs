use super::derivation::DerivationTreeGenerator;
use super::Generator;
use crate::evolution::codons::SymbolIndex;
use crate::grammar::{Cfg, Symbol};
use crate::tree::{NodeId, Tree};

/// Generates a derivation tree and prunes it into an abstract syntax tree.
#[derive(Debug)]
pub struct AstGenerator<I> {
    derivation: DerivationTreeGenerator<I>,
}

impl<I> AstGenerator<I> {
    pub fn new(index: I, limit: usize) -> Self {
        Self {
            derivation: DerivationTreeGenerator::new(index, limit),
        }
    }

    pub fn limit(&self) -> usize {
        self.derivation.limit()
    }
}

impl<T, I> Generator<T> for AstGenerator<I>
where
    T: Clone,
    I: SymbolIndex<T>,
{
    type Output = Tree<Symbol<T>>;

    fn generate(&self, cfg: &Cfg<T>) -> Tree<Symbol<T>> {
        prune(&self.derivation.generate(cfg))
    }
}

struct Frame {
    source: NodeId,
    target: NodeId,
    next_child: usize,
}

/// Collapses a derivation tree into an AST.
///
/// Non-terminal nodes disappear. The first terminal found below a node is
/// lifted into that node's position and the terminals after it become its
/// children, so `'(' <expr> <op> <expr> ')'` turns into a `'('` node with the
/// operands, the operator and `')'` below it. The empty tree prunes to the
/// empty tree.
pub fn prune<T: Clone>(tree: &Tree<Symbol<T>>) -> Tree<Symbol<T>> {
    let Some(root) = tree.root() else {
        return Tree::empty();
    };

    let mut ast = Tree::unoccupied();
    let Some(ast_root) = ast.root() else {
        return Tree::empty();
    };
    let mut stack = vec![visit(tree, &mut ast, root, ast_root)];

    while let Some(frame) = stack.last_mut() {
        let Some(&child) = tree.children(frame.source).get(frame.next_child) else {
            stack.pop();
            continue;
        };
        frame.next_child += 1;
        let parent = frame.target;

        let target = if ast.is_occupied(parent) {
            ast.attach(parent, None)
        } else {
            parent
        };
        stack.push(visit(tree, &mut ast, child, target));
    }
    ast
}

fn visit<T: Clone>(tree: &Tree<Symbol<T>>, ast: &mut Tree<Symbol<T>>, source: NodeId, target: NodeId) -> Frame {
    if let Some(symbol) = tree.value(source).filter(|s| s.is_terminal()) {
        ast.set_value(target, symbol.clone());
    }
    Frame {
        source,
        target,
        next_child: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::codons::RandomIndex;
    use crate::grammar::parser::parse;
    use crate::grammar::Rule;
    use crate::test_grammars::EXPR_GRAMMAR;
    use std::cell::Cell;
    use std::num::NonZeroUsize;

    /// Replays `choices`, then keeps answering 0.
    fn scripted(choices: &[usize]) -> impl Fn(&Rule<String>, NonZeroUsize) -> usize + '_ {
        let position = Cell::new(0);
        move |_: &Rule<String>, _: NonZeroUsize| {
            let i = position.get();
            position.set(i + 1);
            choices.get(i).copied().unwrap_or(0)
        }
    }

    #[test]
    fn test_single_terminal_ast() {
        let cfg = parse(EXPR_GRAMMAR).unwrap();
        let ast = AstGenerator::new(scripted(&[]), 100).generate(&cfg);
        assert_eq!(ast.to_string(), "'0'");
        assert_eq!(ast.len(), 1);
    }

    #[test]
    fn test_parenthesised_expression() {
        let cfg = parse(EXPR_GRAMMAR).unwrap();
        // (3 + x)
        let index = scripted(&[2, 0, 3, 0, 1, 0]);

        let derivation = DerivationTreeGenerator::new(&index, 100).generate(&cfg);
        assert_eq!(
            derivation.to_string(),
            "<expr>('(' <expr>(<num>('3')) <op>('+') <expr>(<var>('x')) ')')"
        );

        let ast = prune(&derivation);
        assert_eq!(ast.to_string(), "'('('3' '+' 'x' ')')");
        assert_eq!(ast.len(), 5);
    }

    #[test]
    fn test_empty_derivation_gives_empty_ast() {
        let cfg = parse(EXPR_GRAMMAR).unwrap();
        let ast = AstGenerator::new(scripted(&[]), 1).generate(&cfg);
        assert!(ast.is_empty());
        assert!(prune::<String>(&Tree::empty()).is_empty());
    }

    #[test]
    fn test_random_asts_keep_the_terminals() {
        let cfg = parse(EXPR_GRAMMAR).unwrap();

        for seed in 0..100 {
            let derivation = DerivationTreeGenerator::new(RandomIndex::seeded(seed), 80).generate(&cfg);
            let ast = prune(&derivation);

            let expected: Vec<&str> = derivation.terminals().into_iter().map(|t| t.name()).collect();
            let mut found: Vec<&str> = ast.terminals().into_iter().map(|t| t.name()).collect();
            let mut expected_sorted = expected.clone();
            expected_sorted.sort_unstable();
            found.sort_unstable();
            assert_eq!(found, expected_sorted);
            assert_eq!(ast.len(), expected.len());
        }
    }
}
