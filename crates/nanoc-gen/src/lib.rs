//! nanoc-gen — renders the legalized assembly IR to AT&T-syntax text.
//!
//! This crate makes no decisions: every operand and instruction has already
//! been fully resolved by `nanoc-lir`. It cannot fail on well-typed input.

mod asm;
pub mod target;

pub use asm::emit;
pub use target::Target;
