use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;
use std::fmt;
use std::str::FromStr;

/// Operations understood by the processor, in opcode order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum OpCode {
    //  Mnemonic    | Effect
    //--------------+----------------------------------------------------------
    NOP,   // | Does nothing
    LOAD,  // | GRx = value(m, data)
    STORE, // | MEM[address(m, data)] = GRx
    JMP,   // | PC = data
    ADD,   // | GRx = GRx + value(m, data)
    SUB,   // | GRx = GRx - value(m, data)
    MUL,   // | GRx = GRx * value(m, data)
    JNE,   // | PC = data if the compare flag is "not equal"
    CMP,   // | Compare GRx against value(m, data), setting flags
    AND,   // | GRx = GRx & value(m, data)
    OR,    // | GRx = GRx | value(m, data)
    HALT,  // | Stops the processor
    CALL,  // | Push PC, then PC = data
    RET,   // | Pop PC
    PUSH,  // | Push GRx onto the stack
    POP,   // | Pop the stack into GRx
    LSR,   // | GRx = GRx >> value(m, data)
    LSL,   // | GRx = GRx << value(m, data)
    JGR,   // | PC = data if the compare flag is "greater than"
}

/// Operand interpretation, in encoding order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum AddressMode {
    DIR, // Direct: operand is MEM[data]
    IM,  // Immediate: operand is data itself
    IND, // Indirect: operand is MEM[MEM[data]]
    IDX, // Indexed (reserved)
    REG, // Register: operand is the register with index data
}

/// A mnemonic or addressing mode name missing from the tables above.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownNameError {
    pub kind: &'static str,
    pub name: String,
}

impl UnknownNameError {
    fn new(kind: &'static str, name: &str) -> UnknownNameError {
        UnknownNameError {
            kind,
            name: name.to_owned(),
        }
    }
}

impl fmt::Display for UnknownNameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unknown {} \"{}\".", self.kind, self.name)
    }
}

impl std::error::Error for UnknownNameError {}

impl FromStr for OpCode {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<OpCode, UnknownNameError> {
        let op = match s {
            "NOP" => OpCode::NOP,
            "LOAD" => OpCode::LOAD,
            "STORE" => OpCode::STORE,
            "JMP" => OpCode::JMP,
            "ADD" => OpCode::ADD,
            "SUB" => OpCode::SUB,
            "MUL" => OpCode::MUL,
            "JNE" => OpCode::JNE,
            "CMP" => OpCode::CMP,
            "AND" => OpCode::AND,
            "OR" => OpCode::OR,
            "HALT" => OpCode::HALT,
            "CALL" => OpCode::CALL,
            "RET" => OpCode::RET,
            "PUSH" => OpCode::PUSH,
            "POP" => OpCode::POP,
            "LSR" => OpCode::LSR,
            "LSL" => OpCode::LSL,
            "JGR" => OpCode::JGR,
            _ => return Err(UnknownNameError::new("opcode", s)),
        };
        Ok(op)
    }
}

impl FromStr for AddressMode {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<AddressMode, UnknownNameError> {
        let mode = match s {
            "DIR" => AddressMode::DIR,
            "IM" => AddressMode::IM,
            "IND" => AddressMode::IND,
            "IDX" => AddressMode::IDX,
            "REG" => AddressMode::REG,
            _ => return Err(UnknownNameError::new("addressing mode", s)),
        };
        Ok(mode)
    }
}

#[inline]
pub fn enum_to_u32<T: ToPrimitive + Copy>(val: T) -> u32 {
    val.to_u32().unwrap()
}

macro_rules! impl_enum_display {
    ($e:ty) => {
        impl fmt::Display for $e {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

impl_enum_display!(OpCode);
impl_enum_display!(AddressMode);
