//! Pass B — pseudo-register to stack-offset assignment. Every
//! `Operand::Pseudo` in a function's instruction stream is replaced by an
//! `Operand::Stack` offset sized for its TAC type; `Operand::Data` and
//! physical registers pass through untouched.

use std::collections::HashMap;

use indexmap::IndexMap;
use nanoc_tac::ir::Type;
use nanoc_util::Symbol;

use crate::lir::{Instruction, Operand};

/// Walks every operand of every instruction, assigning each distinct
/// pseudo-register a stack slot the first time it's seen. Returns the
/// total bytes of locals the frame needs (not yet rounded to 16 — Pass C
/// does that once the prologue is known to need no further slots).
pub fn assign_offsets(instructions: &mut [Instruction], var_types: &IndexMap<Symbol, Type>) -> u32 {
    let mut offsets: HashMap<Symbol, i32> = HashMap::new();
    let mut next_offset: i32 = 0;

    let mut slot_for = |name: Symbol| -> i32 {
        if let Some(&offset) = offsets.get(&name) {
            return offset;
        }
        let ty = *var_types
            .get(&name)
            .unwrap_or_else(|| panic!("pseudo-register `{name}` has no registered type"));
        next_offset -= ty.size() as i32;
        offsets.insert(name, next_offset);
        next_offset
    };

    for instr in instructions.iter_mut() {
        for_each_operand(instr, |operand| {
            if let Operand::Pseudo(name) = operand {
                *operand = Operand::Stack(slot_for(*name));
            }
        });
    }

    (-next_offset) as u32
}

/// Visits every operand slot of `instr`, in place.
fn for_each_operand(instr: &mut Instruction, mut f: impl FnMut(&mut Operand)) {
    match instr {
        Instruction::Mov { src, dest, .. }
        | Instruction::SignExtend { src, dest }
        | Instruction::ZeroExtend { src, dest }
        | Instruction::Binary { src, dest, .. }
        | Instruction::Imul { src, dest, .. }
        | Instruction::Cmp { src, dest, .. } => {
            f(src);
            f(dest);
        }
        Instruction::Shift { amount, dest, .. } => {
            f(amount);
            f(dest);
        }
        Instruction::Neg { dest, .. } | Instruction::Not { dest, .. } | Instruction::SetCc { dest, .. } => {
            f(dest);
        }
        Instruction::Idiv { divisor, .. } | Instruction::Div { divisor, .. } => {
            f(divisor);
        }
        Instruction::Push(operand) => f(operand),
        Instruction::ConvertToWide { .. }
        | Instruction::Jmp(_)
        | Instruction::JmpCc { .. }
        | Instruction::Label(_)
        | Instruction::Pop(_)
        | Instruction::Call(_)
        | Instruction::Ret => {}
    }
}
