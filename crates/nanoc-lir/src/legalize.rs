//! Pass C — prologue/epilogue insertion and operand-class legalization.
//! Walks the instruction stream and rewrites every instruction whose
//! operand combination the x86-64 encoding forbids, routing the offending
//! operand through a scratch register (`%r10`/`%r11`). Mirrors the
//! rewrite-in-place shape of a peephole optimizer, but every rewrite here
//! is mandatory rather than a size/speed improvement.

use nanoc_util::Symbol;

use crate::lir::{BinOp, Function as AsmFunction, Instruction, Operand, PhysicalRegister, Width};

const STACK_ALIGNMENT: u32 = 16;

fn round_up(size: u32, alignment: u32) -> u32 {
    (size + alignment - 1) / alignment * alignment
}

fn is_memory(operand: &Operand) -> bool {
    matches!(operand, Operand::Stack(_) | Operand::Data(_))
}

/// Whether `value` fits the signed-32-bit immediate encoding every
/// instruction but a 64-bit `movq`/`imulq` accepts directly.
fn is_signed_32(value: i64) -> bool {
    i32::try_from(value).is_ok()
}

/// Runs Pass C over one function's Pass-A/B output: legalizes every
/// instruction, then wraps the result in the prologue/epilogue.
pub fn finish_function(
    name: Symbol,
    mut instructions: Vec<Instruction>,
    raw_stack_size: u32,
    is_static: bool,
) -> AsmFunction {
    legalize(&mut instructions);
    let stack_size = round_up(raw_stack_size, STACK_ALIGNMENT);

    let mut body = Vec::with_capacity(instructions.len() + 4);
    body.push(Instruction::Push(Operand::Reg(PhysicalRegister::Rbp)));
    body.push(Instruction::Mov {
        width: Width::W64,
        src: Operand::Reg(PhysicalRegister::Rsp),
        dest: Operand::Reg(PhysicalRegister::Rbp),
    });
    if stack_size > 0 {
        body.push(Instruction::Binary {
            op: BinOp::Sub,
            width: Width::W64,
            src: Operand::Imm(stack_size as i64),
            dest: Operand::Reg(PhysicalRegister::Rsp),
        });
    }

    for instr in instructions {
        if matches!(instr, Instruction::Ret) {
            body.push(Instruction::Mov {
                width: Width::W64,
                src: Operand::Reg(PhysicalRegister::Rbp),
                dest: Operand::Reg(PhysicalRegister::Rsp),
            });
            body.push(Instruction::Pop(PhysicalRegister::Rbp));
            body.push(Instruction::Ret);
        } else {
            body.push(instr);
        }
    }

    AsmFunction { name, instructions: body, stack_size, is_static }
}

fn legalize(instructions: &mut Vec<Instruction>) {
    let mut out = Vec::with_capacity(instructions.len());
    for instr in instructions.drain(..) {
        legalize_one(instr, &mut out);
    }
    *instructions = out;
}

fn legalize_one(instr: Instruction, out: &mut Vec<Instruction>) {
    match instr {
        Instruction::Mov { width, src, dest } => legalize_mov(width, src, dest, out),

        // `movslq` can read a 32-bit memory source directly but can never
        // write a memory destination; the real instruction always targets
        // a scratch register, then a plain 64-bit `mov` stores the result.
        Instruction::SignExtend { src, dest } => {
            out.push(Instruction::SignExtend { src, dest: Operand::Reg(PhysicalRegister::SCRATCH_A) });
            out.push(store_scratch_a(Width::W64, dest));
        }

        // There's no dedicated zero-extend mnemonic this ISA subset needs:
        // a plain `movl` into a register already zeroes its upper 32 bits,
        // so the only work is routing that through a scratch register when
        // the final destination is memory.
        Instruction::ZeroExtend { src, dest } => {
            out.push(load_scratch_a(Width::W32, src));
            out.push(store_scratch_a(Width::W64, dest));
        }

        Instruction::Binary { op, width, src, dest } => legalize_binary(op, width, src, dest, out),

        Instruction::Imul { width, src, dest } => legalize_imul(width, src, dest, out),

        Instruction::Idiv { width, divisor } => legalize_division(width, divisor, out, |width, divisor| {
            Instruction::Idiv { width, divisor }
        }),
        Instruction::Div { width, divisor } => legalize_division(width, divisor, out, |width, divisor| {
            Instruction::Div { width, divisor }
        }),

        Instruction::Cmp { width, src, dest } => legalize_cmp(width, src, dest, out),

        other => out.push(other),
    }
}

fn legalize_mov(width: Width, src: Operand, dest: Operand, out: &mut Vec<Instruction>) {
    if is_memory(&src) && is_memory(&dest) {
        out.push(load_scratch_a(width, src));
        out.push(Instruction::Mov { width, src: Operand::Reg(PhysicalRegister::SCRATCH_A), dest });
        return;
    }
    if let Operand::Imm(value) = src {
        if width == Width::W64 && !is_signed_32(value) && is_memory(&dest) {
            out.push(load_scratch_a_imm(value));
            out.push(Instruction::Mov { width, src: Operand::Reg(PhysicalRegister::SCRATCH_A), dest });
            return;
        }
    }
    out.push(Instruction::Mov { width, src, dest });
}

fn legalize_binary(op: BinOp, width: Width, src: Operand, dest: Operand, out: &mut Vec<Instruction>) {
    if is_memory(&src) && is_memory(&dest) {
        out.push(load_scratch_a(width, src));
        out.push(Instruction::Binary { op, width, src: Operand::Reg(PhysicalRegister::SCRATCH_A), dest });
        return;
    }
    if let Operand::Imm(value) = src {
        if width == Width::W64 && !is_signed_32(value) {
            out.push(load_scratch_a_imm(value));
            out.push(Instruction::Binary { op, width, src: Operand::Reg(PhysicalRegister::SCRATCH_A), dest });
            return;
        }
    }
    out.push(Instruction::Binary { op, width, src, dest });
}

fn legalize_imul(width: Width, src: Operand, dest: Operand, out: &mut Vec<Instruction>) {
    let src = if let Operand::Imm(value) = src {
        if width == Width::W64 && !is_signed_32(value) {
            out.push(load_scratch_b_imm(value));
            Operand::Reg(PhysicalRegister::SCRATCH_B)
        } else {
            Operand::Imm(value)
        }
    } else {
        src
    };

    if is_memory(&dest) {
        // `imul` never writes a memory destination: multiply into the
        // scratch register that already holds `dest`, then store back.
        out.push(load_scratch_a(width, dest.clone()));
        out.push(Instruction::Imul { width, src, dest: Operand::Reg(PhysicalRegister::SCRATCH_A) });
        out.push(store_scratch_a(width, dest));
    } else {
        out.push(Instruction::Imul { width, src, dest });
    }
}

fn legalize_division(
    width: Width,
    divisor: Operand,
    out: &mut Vec<Instruction>,
    make: impl FnOnce(Width, Operand) -> Instruction,
) {
    if let Operand::Imm(value) = divisor {
        // `idiv`/`div` never accept an immediate operand at all.
        out.push(load_scratch_a_for_width(width, value));
        out.push(make(width, Operand::Reg(PhysicalRegister::SCRATCH_A)));
    } else {
        out.push(make(width, divisor));
    }
}

fn legalize_cmp(width: Width, src: Operand, dest: Operand, out: &mut Vec<Instruction>) {
    if is_memory(&src) && is_memory(&dest) {
        out.push(load_scratch_a(width, src));
        out.push(Instruction::Cmp { width, src: Operand::Reg(PhysicalRegister::SCRATCH_A), dest });
        return;
    }
    if let Operand::Imm(value) = dest {
        // `cmp` can never write an immediate destination operand; load it
        // into a scratch register and compare against that instead.
        out.push(load_scratch_a_imm(value));
        out.push(Instruction::Cmp { width, src, dest: Operand::Reg(PhysicalRegister::SCRATCH_A) });
        return;
    }
    if let Operand::Imm(value) = src {
        if width == Width::W64 && !is_signed_32(value) {
            out.push(load_scratch_a_imm(value));
            out.push(Instruction::Cmp { width, src: Operand::Reg(PhysicalRegister::SCRATCH_A), dest });
            return;
        }
    }
    out.push(Instruction::Cmp { width, src, dest });
}

fn load_scratch_a(width: Width, src: Operand) -> Instruction {
    Instruction::Mov { width, src, dest: Operand::Reg(PhysicalRegister::SCRATCH_A) }
}

fn load_scratch_a_imm(value: i64) -> Instruction {
    Instruction::Mov { width: Width::W64, src: Operand::Imm(value), dest: Operand::Reg(PhysicalRegister::SCRATCH_A) }
}

fn load_scratch_b_imm(value: i64) -> Instruction {
    Instruction::Mov { width: Width::W64, src: Operand::Imm(value), dest: Operand::Reg(PhysicalRegister::SCRATCH_B) }
}

fn load_scratch_a_for_width(width: Width, value: i64) -> Instruction {
    Instruction::Mov { width, src: Operand::Imm(value), dest: Operand::Reg(PhysicalRegister::SCRATCH_A) }
}

fn store_scratch_a(width: Width, dest: Operand) -> Instruction {
    Instruction::Mov { width, src: Operand::Reg(PhysicalRegister::SCRATCH_A), dest }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prologue_allocates_a_16_byte_multiple_and_epilogue_mirrors_it() {
        let name = Symbol::intern("f");
        let func = finish_function(name, vec![Instruction::Ret], 12, false);
        assert_eq!(func.stack_size, 16);
        assert!(matches!(func.instructions[0], Instruction::Push(Operand::Reg(PhysicalRegister::Rbp))));
        assert!(func.instructions.iter().any(|i| matches!(
            i,
            Instruction::Binary { op: BinOp::Sub, dest: Operand::Reg(PhysicalRegister::Rsp), .. }
        )));
        let ret_index = func.instructions.iter().position(|i| matches!(i, Instruction::Ret)).unwrap();
        assert!(matches!(func.instructions[ret_index - 1], Instruction::Pop(PhysicalRegister::Rbp)));
    }

    #[test]
    fn memory_to_memory_mov_is_routed_through_a_scratch_register() {
        let mut instrs = vec![Instruction::Mov {
            width: Width::W32,
            src: Operand::Stack(-4),
            dest: Operand::Data(Symbol::intern("g")),
        }];
        legalize(&mut instrs);
        assert_eq!(instrs.len(), 2);
        assert!(matches!(instrs[0], Instruction::Mov { dest: Operand::Reg(PhysicalRegister::R10), .. }));
        assert!(matches!(instrs[1], Instruction::Mov { src: Operand::Reg(PhysicalRegister::R10), .. }));
    }

    #[test]
    fn cmp_never_writes_an_immediate_destination() {
        let mut instrs = vec![Instruction::Cmp { width: Width::W32, src: Operand::Stack(-4), dest: Operand::Imm(0) }];
        legalize(&mut instrs);
        assert!(instrs.iter().all(|i| !matches!(i, Instruction::Cmp { dest: Operand::Imm(_), .. })));
    }

    #[test]
    fn idiv_never_takes_an_immediate_divisor() {
        let mut instrs = vec![Instruction::Idiv { width: Width::W32, divisor: Operand::Imm(2) }];
        legalize(&mut instrs);
        assert!(instrs.iter().all(|i| !matches!(i, Instruction::Idiv { divisor: Operand::Imm(_), .. })));
    }

    #[test]
    fn imul_with_a_memory_destination_round_trips_through_scratch() {
        let mut instrs = vec![Instruction::Imul { width: Width::W32, src: Operand::Imm(3), dest: Operand::Stack(-4) }];
        legalize(&mut instrs);
        assert!(instrs.iter().all(|i| !matches!(i, Instruction::Imul { dest: Operand::Stack(_), .. })));
    }

    #[test]
    fn out_of_range_64_bit_immediate_loads_through_scratch_first() {
        let mut instrs = vec![Instruction::Mov { width: Width::W64, src: Operand::Imm(1 << 40), dest: Operand::Stack(-8) }];
        legalize(&mut instrs);
        assert_eq!(instrs.len(), 2);
        assert!(matches!(instrs[0], Instruction::Mov { src: Operand::Imm(v), .. } if v == 1 << 40));
    }
}
