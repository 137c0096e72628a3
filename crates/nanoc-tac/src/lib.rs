//! nanoc-tac — three-address IR generation.
//!
//! Lowers an AST into TAC while performing name resolution, loop-context
//! checking, constant folding of static initializers, and the C integer
//! promotions. Semantic validation and IR construction happen in the same
//! pass: there is no separate type-checked HIR stage.

mod const_eval;
mod error;
mod expr;
mod generator;
pub mod ir;
mod stmt;

pub use error::{TacError, TacResult};
pub use generator::Generator;

/// Lower a complete program to TAC.
pub fn generate(program: &nanoc_par::ast::Program) -> TacResult<ir::Program> {
    Generator::new().generate(program)
}
