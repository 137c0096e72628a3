use nanoc_util::{Stage, Symbol};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TacError {
    #[error("{stage} 'break' outside of a loop", stage = Stage::Semantic)]
    BreakOutsideLoop,

    #[error("{stage} 'continue' outside of a loop", stage = Stage::Semantic)]
    ContinueOutsideLoop,

    #[error("{stage} undeclared variable \"{name}\"", stage = Stage::Semantic)]
    UndeclaredVariable { name: Symbol },

    #[error("{stage} undeclared function \"{name}\"", stage = Stage::Semantic)]
    UndeclaredFunction { name: Symbol },

    #[error("{stage} function \"{name}\" is already defined", stage = Stage::Semantic)]
    FunctionRedefinition { name: Symbol },

    #[error("{stage} variable \"{name}\" is already declared", stage = Stage::Semantic)]
    VariableRedefinition { name: Symbol },

    #[error(
        "{stage} \"{name}\" expects {expected} argument(s), found {found}",
        stage = Stage::Semantic
    )]
    WrongArgumentCount {
        name: Symbol,
        expected: usize,
        found: usize,
    },

    #[error("{stage} initializer for \"{name}\" is not a constant expression", stage = Stage::Semantic)]
    NonConstantInitializer { name: Symbol },
}

pub type TacResult<T> = Result<T, TacError>;
