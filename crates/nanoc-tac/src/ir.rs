//! The three-address IR: a flat, function-local instruction list per
//! function plus an ordered list of file-scope globals.

use indexmap::IndexMap;
use nanoc_par::ast::CType;
use nanoc_util::Symbol;

/// TAC reuses the AST's four-member type system verbatim; there is no
/// separate IR-level type lattice to keep in sync with it.
pub type Type = CType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Constant(i64, Type),
    Var(Symbol, Type),
}

impl Value {
    pub fn ty(self) -> Type {
        match self {
            Value::Constant(_, ty) => ty,
            Value::Var(_, ty) => ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Complement,
    LogicalNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    DivideU,
    Remainder,
    RemainderU,
    ShiftLeft,
    ShiftRight,
    ShiftRightU,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Equal,
    NotEqual,
    LessThan,
    LessThanU,
    LessThanOrEqual,
    LessThanOrEqualU,
    GreaterThan,
    GreaterThanU,
    GreaterThanOrEqual,
    GreaterThanOrEqualU,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Return(Value),
    Unary {
        op: UnaryOp,
        src: Value,
        dest: Value,
    },
    Binary {
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        dest: Value,
    },
    /// Widens or narrows `src` into `dest` when their types differ, a plain
    /// move otherwise. The assembly generator, not this IR, decides between
    /// a bare `mov` and a `movsx`/`movzx`.
    Copy {
        src: Value,
        dest: Value,
    },
    Jump(Symbol),
    JumpIfZero(Value, Symbol),
    JumpIfNotZero(Value, Symbol),
    Label(Symbol),
    Call {
        name: Symbol,
        args: Vec<Value>,
        dest: Value,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: Symbol,
    pub ty: Type,
    pub init: Option<i64>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    /// Every local, parameter, and temporary this function's body refers
    /// to, mapped to its TAC type. Insertion-ordered so `--print-tacky`
    /// dumps are stable across runs.
    pub var_types: IndexMap<Symbol, Type>,
    pub instructions: Vec<Instruction>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

/// Truncate a folded 64-bit constant to the bit width of `ty`, the
/// two's-complement semantics global initializers are defined with.
pub fn truncate_to_type(value: i64, ty: Type) -> i64 {
    match ty {
        Type::Int | Type::UInt => (value as i32) as i64,
        Type::Long | Type::ULong => value,
    }
}
