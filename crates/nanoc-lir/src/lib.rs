//! nanoc-lir — the legalized x86-64 assembly IR.
//!
//! Lowers TAC to assembly in three passes: template expansion over
//! pseudo-registers (`lower`), pseudo-register-to-stack-offset assignment
//! (`stack_frame`), and prologue/epilogue insertion plus operand-class
//! legalization (`legalize`). The result is an IR `nanoc-gen` can print
//! without making any further decisions of its own.

use std::collections::HashSet;

pub mod calling_convention;
mod legalize;
pub mod lir;
mod lower;
mod stack_frame;

pub use lir::{
    BinOp, Condition, Function, Global, Instruction, Operand, PhysicalRegister, Program, ShiftOp,
    Width,
};

/// Run all three passes over a complete TAC program.
pub fn generate(tac_program: &nanoc_tac::ir::Program) -> Program {
    let globals: HashSet<_> = tac_program.globals.iter().map(|g| g.name).collect();

    let functions = tac_program
        .functions
        .iter()
        .map(|f| {
            let mut instructions = lower::lower_function(f, &globals);
            let raw_stack_size = stack_frame::assign_offsets(&mut instructions, &f.var_types);
            legalize::finish_function(f.name, instructions, raw_stack_size, f.is_static)
        })
        .collect();

    Program { globals: tac_program.globals.clone(), functions }
}
