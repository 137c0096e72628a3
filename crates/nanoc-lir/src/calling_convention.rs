//! System V AMD64 call-lowering constants: which registers carry the first
//! six integer arguments, where the rest live on the stack, and the
//! stack-alignment rule a `call` must observe.

use crate::lir::PhysicalRegister;

pub struct SystemVAbi;

impl SystemVAbi {
    pub const REGISTER_ARGS: usize = PhysicalRegister::ARG_REGS.len();

    pub fn arg_register(index: usize) -> Option<PhysicalRegister> {
        PhysicalRegister::ARG_REGS.get(index).copied()
    }

    /// Byte offset from `%rbp` of the `index`-th stack argument (`index`
    /// counted from the seventh argument overall, i.e. 0-based among the
    /// stack args only). The return address and saved `%rbp` occupy the
    /// first 16 bytes above the frame pointer.
    pub fn stack_arg_offset(index: usize) -> i32 {
        16 + 8 * index as i32
    }

    /// Whether `count` stack-passed arguments need an extra 8 bytes of
    /// padding pushed first to keep `%rsp` 16-byte aligned across `call`.
    pub fn needs_alignment_padding(count: usize) -> bool {
        count % 2 == 1
    }
}
