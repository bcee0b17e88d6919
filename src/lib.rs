//! Instruction model for the alang virtual processor.
//!
//! The processor executes fixed-width 33-bit words laid out as
//! `op(5) | grx(5) | m(3) | data(20)`. This crate defines the opcode and
//! addressing-mode tables, the [`Instruction`](struct.Instruction.html)
//! record used by the toolchain, and the bit-level word encoding. The
//! [alangc](../alangc/index.html) compiler emits instructions as assembly
//! text and the [alasm](../alasm/index.html) assembler encodes them.

pub mod constants;

mod enums;
mod instruction;

pub use enums::*;
pub use instruction::*;

/// An encoded instruction. Only the low 33 bits are significant.
pub type Word = u64;
