use crate::constants::*;
use crate::{enum_to_u32, AddressMode, OpCode, Word};
use std::fmt;

/// One assembly instruction: operation, register index, addressing mode
/// and 20-bit payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub op: OpCode,
    pub grx: u8,
    pub m: AddressMode,
    pub data: u32,
}

impl Instruction {
    pub fn new(op: OpCode, grx: u8, m: AddressMode, data: u32) -> Instruction {
        Instruction { op, grx, m, data }
    }

    /// Instruction with all operand fields zeroed.
    pub fn bare(op: OpCode) -> Instruction {
        Instruction::new(op, 0, AddressMode::DIR, 0)
    }

    pub fn encode(&self) -> Word {
        make_word(self.op, self.grx, self.m, self.data)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.op,
            self.grx,
            enum_to_u32(self.m),
            self.data
        )
    }
}

#[inline]
pub fn make_word(op: OpCode, grx: u8, m: AddressMode, data: u32) -> Word {
    ((u64::from(enum_to_u32(op)) << OPCODE_OFFSET) & OPCODE_MASK)
        | ((u64::from(grx) << GRX_OFFSET) & GRX_MASK)
        | ((u64::from(enum_to_u32(m)) << MODE_OFFSET) & MODE_MASK)
        | ((u64::from(data) << DATA_OFFSET) & DATA_MASK)
}

#[cfg(test)]
mod test {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn field_layout() {
        let word = make_word(OpCode::LOAD, 3, AddressMode::IM, 0xABCDE);
        assert_eq!(word >> OPCODE_OFFSET, 1);
        assert_eq!((word & GRX_MASK) >> GRX_OFFSET, 3);
        assert_eq!((word & MODE_MASK) >> MODE_OFFSET, 1);
        assert_eq!(word & DATA_MASK, 0xABCDE);
    }

    #[test]
    fn word_fits_in_33_bits() {
        let word = make_word(OpCode::JGR, 31, AddressMode::REG, DATA_MAX);
        assert!(word < 1u64 << WORD_WIDTH);
    }

    #[test]
    fn bare_ret_encoding() {
        // RET is opcode 13 and everything else is zeroed.
        let word = Instruction::bare(OpCode::RET).encode();
        assert_eq!(word, 13u64 << OPCODE_OFFSET);
        assert_eq!(OpCode::from_u64(13), Some(OpCode::RET));
    }

    #[test]
    fn display_uses_numeric_mode() {
        let instruction = Instruction::new(OpCode::STORE, 0, AddressMode::IND, 7);
        assert_eq!(instruction.to_string(), "STORE 0 2 7");
    }

    #[test]
    fn mnemonic_parsing() {
        assert_eq!("JNE".parse::<OpCode>(), Ok(OpCode::JNE));
        assert_eq!("REG".parse::<AddressMode>(), Ok(AddressMode::REG));
        assert!("JEQ".parse::<OpCode>().is_err());
    }
}
