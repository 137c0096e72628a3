//! A straightforward text formatter over the legalized assembly IR. Every
//! decision about what to print was already made by `nanoc-lir`'s three
//! passes; this module performs no analysis of its own and cannot fail.

use nanoc_lir::{Condition, Function, Instruction, Operand, Program, Width};

use crate::target::Target;

pub struct Emitter {
    target: Target,
    output: String,
}

impl Emitter {
    pub fn new(target: Target) -> Self {
        Self { target, output: String::new() }
    }

    pub fn emit_program(mut self, program: &Program) -> String {
        for global in &program.globals {
            self.emit_global(global);
        }
        for function in &program.functions {
            self.emit_function(function);
        }
        if let Some(trailing) = self.target.trailing_directive() {
            self.output.push_str(trailing);
            self.output.push('\n');
        }
        self.output
    }

    fn emit_global(&mut self, global: &nanoc_lir::Global) {
        let symbol = self.target.symbol(global.name.as_str());
        if !global.is_static {
            self.line(&format!(".globl {symbol}"));
        }
        self.line(self.target.data_section());
        self.line(&self.target.align_directive(global.ty.size()));
        self.label(&symbol);
        let directive = if global.ty.size() == 8 { ".quad" } else { ".long" };
        self.line(&format!("\t{directive} {}", global.init.unwrap_or(0)));
    }

    fn emit_function(&mut self, function: &Function) {
        let symbol = self.target.symbol(function.name.as_str());
        if !function.is_static {
            self.line(&format!(".globl {symbol}"));
        }
        self.line(self.target.text_section());
        self.label(&symbol);
        for instr in &function.instructions {
            self.emit_instruction(instr);
        }
    }

    fn emit_instruction(&mut self, instr: &Instruction) {
        match instr {
            Instruction::Mov { width, src, dest } => {
                self.op2(&format!("mov{}", suffix(*width)), src, dest, *width)
            }
            Instruction::SignExtend { src, dest } => {
                self.op2("movslq", src, dest, Width::W64)
            }
            Instruction::ZeroExtend { .. } => {
                unreachable!("ZeroExtend never survives legalization as its own instruction")
            }

            Instruction::Binary { op, width, src, dest } => {
                self.op2(&format!("{}{}", op.mnemonic(), suffix(*width)), src, dest, *width)
            }
            Instruction::Imul { width, src, dest } => {
                self.op2(&format!("imul{}", suffix(*width)), src, dest, *width)
            }
            Instruction::Shift { op, width, amount, dest } => {
                let amount_text = match amount {
                    Operand::Imm(n) => format!("${n}"),
                    Operand::Reg(reg) => reg.byte_name().to_string(),
                    other => unreachable!("shift amount is never {other:?} after legalization"),
                };
                let dest_text = self.operand(dest, *width);
                self.line(&format!("\t{}{} {amount_text}, {dest_text}", op.mnemonic(), suffix(*width)));
            }
            Instruction::Neg { width, dest } => self.op1(&format!("neg{}", suffix(*width)), dest, *width),
            Instruction::Not { width, dest } => self.op1(&format!("not{}", suffix(*width)), dest, *width),

            Instruction::ConvertToWide { width } => {
                self.line(if *width == Width::W64 { "\tcqo" } else { "\tcdq" });
            }
            Instruction::Idiv { width, divisor } => self.op1(&format!("idiv{}", suffix(*width)), divisor, *width),
            Instruction::Div { width, divisor } => self.op1(&format!("div{}", suffix(*width)), divisor, *width),

            Instruction::Cmp { width, src, dest } => {
                self.op2(&format!("cmp{}", suffix(*width)), src, dest, *width)
            }
            Instruction::SetCc { cond, dest } => {
                let dest_text = self.operand_byte(dest);
                self.line(&format!("\tset{} {dest_text}", cond_suffix(*cond)));
            }

            Instruction::Jmp(label) => self.line(&format!("\tjmp {}", label.as_str())),
            Instruction::JmpCc { cond, target } => {
                self.line(&format!("\tj{} {}", cond_suffix(*cond), target.as_str()))
            }
            Instruction::Label(name) => self.label(name.as_str()),

            Instruction::Push(operand) => {
                let text = self.operand(operand, Width::W64);
                self.line(&format!("\tpushq {text}"));
            }
            Instruction::Pop(reg) => self.line(&format!("\tpopq {}", reg.name(Width::W64))),
            Instruction::Call(name) => self.line(&format!("\tcall {}", self.target.symbol(name.as_str()))),
            Instruction::Ret => self.line("\tret"),
        }
    }

    fn op2(&mut self, mnemonic: &str, src: &Operand, dest: &Operand, width: Width) {
        let src_text = self.operand(src, width);
        let dest_text = self.operand(dest, width);
        self.line(&format!("\t{mnemonic} {src_text}, {dest_text}"));
    }

    fn op1(&mut self, mnemonic: &str, operand: &Operand, width: Width) {
        let text = self.operand(operand, width);
        self.line(&format!("\t{mnemonic} {text}"));
    }

    fn operand(&self, operand: &Operand, width: Width) -> String {
        match operand {
            Operand::Imm(n) => format!("${n}"),
            Operand::Reg(reg) => reg.name(width).to_string(),
            Operand::Stack(offset) => format!("{offset}(%rbp)"),
            Operand::Data(name) => format!("{}(%rip)", self.target.symbol(name.as_str())),
            Operand::Pseudo(name) => {
                unreachable!("pseudo-register `{name}` was never assigned a stack slot")
            }
            Operand::Indirect(reg) => unreachable!("register-indirect addressing is never emitted ({reg:?})"),
        }
    }

    fn operand_byte(&self, operand: &Operand) -> String {
        match operand {
            Operand::Reg(reg) => reg.byte_name().to_string(),
            other => self.operand(other, Width::W32),
        }
    }

    fn line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn label(&mut self, name: &str) {
        self.output.push_str(name);
        self.output.push_str(":\n");
    }
}

fn suffix(width: Width) -> &'static str {
    match width {
        Width::W32 => "l",
        Width::W64 => "q",
    }
}

fn cond_suffix(cond: Condition) -> &'static str {
    match cond {
        Condition::Equal => "e",
        Condition::NotEqual => "ne",
        Condition::Less => "l",
        Condition::LessOrEqual => "le",
        Condition::Greater => "g",
        Condition::GreaterOrEqual => "ge",
        Condition::Below => "b",
        Condition::BelowOrEqual => "be",
        Condition::Above => "a",
        Condition::AboveOrEqual => "ae",
    }
}

/// Format a complete program for the given target.
pub fn emit(program: &Program, target: Target) -> String {
    Emitter::new(target).emit_program(program)
}
