pub mod config;
pub mod evolution;
pub mod export;
pub mod generator;
pub mod grammar;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_grammars {
    /// Small arithmetic-expression grammar shared by the unit tests.
    pub const EXPR_GRAMMAR: &str = "
        <expr> ::= <num> | <var> | '(' <expr> <op> <expr> ')'
        <op>   ::= + | - | * | /
        <var>  ::= x | y
        <num>  ::= 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9
    ";
}
