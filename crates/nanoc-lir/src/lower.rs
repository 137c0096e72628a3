//! Pass A — template expansion. Walks each TAC function once and emits the
//! x86-64 instruction sequence for every TAC instruction (the mnemonic
//! table in the assembly generator's contract). Operands are either
//! immediates, not-yet-assigned pseudo-registers, or RIP-relative globals;
//! Pass B (`stack_frame`) replaces every pseudo with a concrete stack slot
//! before Pass C (`legalize`) runs.

use std::collections::HashSet;

use nanoc_tac::ir as tac;
use nanoc_util::Symbol;

use crate::calling_convention::SystemVAbi;
use crate::lir::{BinOp, Condition, Instruction, Operand, PhysicalRegister, ShiftOp, Width};

fn width_of(ty: tac::Type) -> Width {
    Width::from_size(ty.size())
}

fn operand(value: tac::Value, globals: &HashSet<Symbol>) -> Operand {
    match value {
        tac::Value::Constant(n, _) => Operand::Imm(n),
        tac::Value::Var(name, _) if globals.contains(&name) => Operand::Data(name),
        tac::Value::Var(name, _) => Operand::Pseudo(name),
    }
}

pub fn lower_function(f: &tac::Function, globals: &HashSet<Symbol>) -> Vec<Instruction> {
    let mut out = Vec::new();
    emit_param_moves(f, &mut out);
    for instr in &f.instructions {
        lower_instruction(instr, globals, &mut out);
    }
    out
}

fn emit_param_moves(f: &tac::Function, out: &mut Vec<Instruction>) {
    for (i, &name) in f.params.iter().enumerate() {
        let ty = *f
            .var_types
            .get(&name)
            .expect("every parameter is registered in its function's var-type table");
        let width = width_of(ty);
        let dest = Operand::Pseudo(name);
        let src = match SystemVAbi::arg_register(i) {
            Some(reg) => Operand::Reg(reg),
            None => Operand::Stack(SystemVAbi::stack_arg_offset(i - SystemVAbi::REGISTER_ARGS)),
        };
        out.push(Instruction::Mov { width, src, dest });
    }
}

fn lower_instruction(instr: &tac::Instruction, globals: &HashSet<Symbol>, out: &mut Vec<Instruction>) {
    match instr {
        tac::Instruction::Return(v) => {
            let width = width_of(v.ty());
            out.push(Instruction::Mov {
                width,
                src: operand(*v, globals),
                dest: Operand::Reg(PhysicalRegister::RETURN_REG),
            });
            out.push(Instruction::Ret);
        }
        tac::Instruction::Unary { op, src, dest } => lower_unary(*op, *src, *dest, globals, out),
        tac::Instruction::Binary { op, lhs, rhs, dest } => {
            lower_binary(*op, *lhs, *rhs, *dest, globals, out)
        }
        tac::Instruction::Copy { src, dest } => lower_copy(*src, *dest, globals, out),
        tac::Instruction::Jump(label) => out.push(Instruction::Jmp(*label)),
        tac::Instruction::JumpIfZero(v, label) => {
            let width = width_of(v.ty());
            out.push(Instruction::Cmp {
                width,
                src: Operand::Imm(0),
                dest: operand(*v, globals),
            });
            out.push(Instruction::JmpCc {
                cond: Condition::Equal,
                target: *label,
            });
        }
        tac::Instruction::JumpIfNotZero(v, label) => {
            let width = width_of(v.ty());
            out.push(Instruction::Cmp {
                width,
                src: Operand::Imm(0),
                dest: operand(*v, globals),
            });
            out.push(Instruction::JmpCc {
                cond: Condition::NotEqual,
                target: *label,
            });
        }
        tac::Instruction::Label(name) => out.push(Instruction::Label(*name)),
        tac::Instruction::Call { name, args, dest } => lower_call(*name, args, *dest, globals, out),
    }
}

fn lower_unary(
    op: tac::UnaryOp,
    src: tac::Value,
    dest: tac::Value,
    globals: &HashSet<Symbol>,
    out: &mut Vec<Instruction>,
) {
    let width = width_of(dest.ty());
    let src_op = operand(src, globals);
    let dest_op = operand(dest, globals);
    match op {
        tac::UnaryOp::Negate => {
            out.push(Instruction::Mov { width, src: src_op, dest: dest_op.clone() });
            out.push(Instruction::Neg { width, dest: dest_op });
        }
        tac::UnaryOp::Complement => {
            out.push(Instruction::Mov { width, src: src_op, dest: dest_op.clone() });
            out.push(Instruction::Not { width, dest: dest_op });
        }
        tac::UnaryOp::LogicalNot => {
            let src_width = width_of(src.ty());
            out.push(Instruction::Cmp { width: src_width, src: Operand::Imm(0), dest: src_op });
            out.push(Instruction::Mov { width, src: Operand::Imm(0), dest: dest_op.clone() });
            out.push(Instruction::SetCc { cond: Condition::Equal, dest: dest_op });
        }
    }
}

fn condition_for(op: tac::BinaryOp) -> Condition {
    use tac::BinaryOp::*;
    match op {
        Equal => Condition::Equal,
        NotEqual => Condition::NotEqual,
        LessThan => Condition::Less,
        LessThanU => Condition::Below,
        LessThanOrEqual => Condition::LessOrEqual,
        LessThanOrEqualU => Condition::BelowOrEqual,
        GreaterThan => Condition::Greater,
        GreaterThanU => Condition::Above,
        GreaterThanOrEqual => Condition::GreaterOrEqual,
        GreaterThanOrEqualU => Condition::AboveOrEqual,
        _ => unreachable!("{op:?} is not a comparison operator"),
    }
}

fn lower_binary(
    op: tac::BinaryOp,
    lhs: tac::Value,
    rhs: tac::Value,
    dest: tac::Value,
    globals: &HashSet<Symbol>,
    out: &mut Vec<Instruction>,
) {
    use tac::BinaryOp::*;

    let width = width_of(dest.ty());
    let operand_width = width_of(lhs.ty());
    let lhs_op = operand(lhs, globals);
    let rhs_op = operand(rhs, globals);
    let dest_op = operand(dest, globals);

    match op {
        Add | Subtract | Multiply | BitwiseAnd | BitwiseOr | BitwiseXor => {
            out.push(Instruction::Mov { width, src: lhs_op, dest: dest_op.clone() });
            match op {
                Add => out.push(Instruction::Binary { op: BinOp::Add, width, src: rhs_op, dest: dest_op }),
                Subtract => out.push(Instruction::Binary { op: BinOp::Sub, width, src: rhs_op, dest: dest_op }),
                Multiply => out.push(Instruction::Imul { width, src: rhs_op, dest: dest_op }),
                BitwiseAnd => out.push(Instruction::Binary { op: BinOp::And, width, src: rhs_op, dest: dest_op }),
                BitwiseOr => out.push(Instruction::Binary { op: BinOp::Or, width, src: rhs_op, dest: dest_op }),
                BitwiseXor => out.push(Instruction::Binary { op: BinOp::Xor, width, src: rhs_op, dest: dest_op }),
                _ => unreachable!(),
            }
        }

        Divide | DivideU | Remainder | RemainderU => {
            lower_division(op, width, lhs_op, rhs_op, dest_op, out)
        }

        ShiftLeft | ShiftRight | ShiftRightU => {
            let shift_op = match op {
                ShiftLeft => ShiftOp::Left,
                ShiftRight => ShiftOp::ArithmeticRight,
                ShiftRightU => ShiftOp::LogicalRight,
                _ => unreachable!(),
            };
            out.push(Instruction::Mov { width, src: lhs_op, dest: dest_op.clone() });
            let amount = match rhs_op {
                imm @ Operand::Imm(_) => imm,
                other => {
                    out.push(Instruction::Mov {
                        width: width_of(rhs.ty()),
                        src: other,
                        dest: Operand::Reg(PhysicalRegister::SHIFT_COUNT),
                    });
                    Operand::Reg(PhysicalRegister::SHIFT_COUNT)
                }
            };
            out.push(Instruction::Shift { op: shift_op, width, amount, dest: dest_op });
        }

        Equal | NotEqual | LessThan | LessThanU | LessThanOrEqual | LessThanOrEqualU
        | GreaterThan | GreaterThanU | GreaterThanOrEqual | GreaterThanOrEqualU => {
            let cond = condition_for(op);
            out.push(Instruction::Cmp { width: operand_width, src: rhs_op, dest: lhs_op });
            out.push(Instruction::Mov { width, src: Operand::Imm(0), dest: dest_op.clone() });
            out.push(Instruction::SetCc { cond, dest: dest_op });
        }
    }
}

fn lower_division(
    op: tac::BinaryOp,
    width: Width,
    lhs: Operand,
    rhs: Operand,
    dest: Operand,
    out: &mut Vec<Instruction>,
) {
    use tac::BinaryOp::*;

    let signed = matches!(op, Divide | Remainder);
    out.push(Instruction::Mov { width, src: lhs, dest: Operand::Reg(PhysicalRegister::RETURN_REG) });
    if signed {
        out.push(Instruction::ConvertToWide { width });
        out.push(Instruction::Idiv { width, divisor: rhs });
    } else {
        out.push(Instruction::Mov {
            width,
            src: Operand::Imm(0),
            dest: Operand::Reg(PhysicalRegister::DIVIDEND_HIGH),
        });
        out.push(Instruction::Div { width, divisor: rhs });
    }
    let result_reg = match op {
        Divide | DivideU => PhysicalRegister::RETURN_REG,
        Remainder | RemainderU => PhysicalRegister::DIVIDEND_HIGH,
        _ => unreachable!(),
    };
    out.push(Instruction::Mov { width, src: Operand::Reg(result_reg), dest });
}

fn lower_copy(src: tac::Value, dest: tac::Value, globals: &HashSet<Symbol>, out: &mut Vec<Instruction>) {
    let src_ty = src.ty();
    let dest_ty = dest.ty();
    let src_op = operand(src, globals);
    let dest_op = operand(dest, globals);

    if src_ty.size() == dest_ty.size() {
        out.push(Instruction::Mov { width: width_of(dest_ty), src: src_op, dest: dest_op });
    } else if dest_ty.size() > src_ty.size() {
        // An immediate already carries its widened value as a 64-bit
        // constant (the TAC constant folder sign/zero-extends it at fold
        // time) — `movslq`/an implicit zero-extend both require a register
        // or memory source, so widening a literal is just a wide `mov`.
        if matches!(src_op, Operand::Imm(_)) {
            out.push(Instruction::Mov { width: width_of(dest_ty), src: src_op, dest: dest_op });
        } else if src_ty.is_signed() {
            out.push(Instruction::SignExtend { src: src_op, dest: dest_op });
        } else {
            out.push(Instruction::ZeroExtend { src: src_op, dest: dest_op });
        }
    } else {
        // Narrowing just reads the low bytes of `src` at `dest`'s width;
        // no dedicated instruction needed.
        out.push(Instruction::Mov { width: width_of(dest_ty), src: src_op, dest: dest_op });
    }
}

fn lower_call(
    name: Symbol,
    args: &[tac::Value],
    dest: tac::Value,
    globals: &HashSet<Symbol>,
    out: &mut Vec<Instruction>,
) {
    let register_args = args.len().min(SystemVAbi::REGISTER_ARGS);
    let stack_args = &args[register_args..];
    let pad = SystemVAbi::needs_alignment_padding(stack_args.len());

    if pad {
        out.push(Instruction::Binary {
            op: BinOp::Sub,
            width: Width::W64,
            src: Operand::Imm(8),
            dest: Operand::Reg(PhysicalRegister::Rsp),
        });
    }

    for arg in stack_args.iter().rev() {
        let width = width_of(arg.ty());
        let arg_op = operand(*arg, globals);
        match width {
            Width::W64 => out.push(Instruction::Push(arg_op)),
            Width::W32 => {
                out.push(Instruction::Mov {
                    width,
                    src: arg_op,
                    dest: Operand::Reg(PhysicalRegister::RETURN_REG),
                });
                out.push(Instruction::Push(Operand::Reg(PhysicalRegister::RETURN_REG)));
            }
        }
    }

    for (i, arg) in args.iter().take(register_args).enumerate() {
        let width = width_of(arg.ty());
        let arg_op = operand(*arg, globals);
        let reg = SystemVAbi::arg_register(i).expect("register arg index is within range");
        out.push(Instruction::Mov { width, src: arg_op, dest: Operand::Reg(reg) });
    }

    out.push(Instruction::Call(name));

    let cleanup = 8 * stack_args.len() as i64 + if pad { 8 } else { 0 };
    if cleanup > 0 {
        out.push(Instruction::Binary {
            op: BinOp::Add,
            width: Width::W64,
            src: Operand::Imm(cleanup),
            dest: Operand::Reg(PhysicalRegister::Rsp),
        });
    }

    let dest_width = width_of(dest.ty());
    out.push(Instruction::Mov {
        width: dest_width,
        src: Operand::Reg(PhysicalRegister::RETURN_REG),
        dest: operand(dest, globals),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(src: &str) -> tac::Program {
        let tokens = nanoc_lex::Lexer::tokenize(src).expect("lex should succeed");
        let program = nanoc_par::parse(tokens).expect("parse should succeed");
        nanoc_tac::generate(&program).expect("tac generation should succeed")
    }

    fn global_names(program: &tac::Program) -> HashSet<Symbol> {
        program.globals.iter().map(|g| g.name).collect()
    }

    #[test]
    fn return_constant_moves_into_rax_and_rets() {
        let program = lower("int main(void) { return 2; }");
        let globals = global_names(&program);
        let instrs = lower_function(&program.functions[0], &globals);
        assert!(matches!(instrs.last(), Some(Instruction::Ret)));
        assert!(matches!(
            instrs[instrs.len() - 2],
            Instruction::Mov { dest: Operand::Reg(PhysicalRegister::Rax), .. }
        ));
    }

    #[test]
    fn signed_division_uses_cdq_and_idiv() {
        let program = lower("int main(void) { int a = 7; int b = 2; return a / b; }");
        let globals = global_names(&program);
        let instrs = lower_function(&program.functions[0], &globals);
        assert!(instrs.iter().any(|i| matches!(i, Instruction::ConvertToWide { .. })));
        assert!(instrs.iter().any(|i| matches!(i, Instruction::Idiv { .. })));
    }

    #[test]
    fn unsigned_division_zeroes_the_high_half_instead_of_cdq() {
        let program = lower("unsigned int f(unsigned int a, unsigned int b) { return a / b; }");
        let globals = global_names(&program);
        let instrs = lower_function(&program.functions[0], &globals);
        assert!(!instrs.iter().any(|i| matches!(i, Instruction::ConvertToWide { .. })));
        assert!(instrs.iter().any(|i| matches!(i, Instruction::Div { .. })));
    }

    #[test]
    fn seventh_parameter_is_loaded_from_the_incoming_stack() {
        let src = "int f(int a, int b, int c, int d, int e, int f, int g) { return g; }";
        let program = lower(src);
        let globals = global_names(&program);
        let instrs = lower_function(&program.functions[0], &globals);
        assert!(instrs.iter().any(|i| matches!(i, Instruction::Mov { src: Operand::Stack(16), .. })));
    }

    #[test]
    fn widening_copy_of_a_signed_source_sign_extends() {
        let program = lower("long f(int a) { return a; }");
        let globals = global_names(&program);
        let instrs = lower_function(&program.functions[0], &globals);
        assert!(instrs.iter().any(|i| matches!(i, Instruction::SignExtend { .. })));
    }

    #[test]
    fn widening_copy_of_an_immediate_constant_is_a_plain_mov_not_a_sign_extend() {
        let program = lower("long f(void) { long x = 5; return x; }");
        let globals = global_names(&program);
        let instrs = lower_function(&program.functions[0], &globals);
        assert!(
            !instrs.iter().any(|i| matches!(i, Instruction::SignExtend { .. } | Instruction::ZeroExtend { .. })),
            "an immediate source is already widened, so it never needs SignExtend/ZeroExtend"
        );
    }

    #[test]
    fn call_with_seven_arguments_pads_the_stack_for_alignment() {
        let src = "int g(int a, int b, int c, int d, int e, int f, int h) { return a; } \
                   int main(void) { return g(1, 2, 3, 4, 5, 6, 7); }";
        let program = lower(src);
        let globals = global_names(&program);
        let main = program.functions.iter().find(|f| f.name.as_str() == "main").unwrap();
        let instrs = lower_function(main, &globals);
        let sub_rsp = instrs.iter().any(|i| {
            matches!(i, Instruction::Binary { op: BinOp::Sub, dest: Operand::Reg(PhysicalRegister::Rsp), .. })
        });
        assert!(sub_rsp, "a single odd stack argument needs 8 bytes of alignment padding");
    }
}
