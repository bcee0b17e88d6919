//! Assembler for the [avm](../avm/index.html) instruction set.
//!
//! The input is assembly text with one instruction per line:
//!
//! ```text
//! OP [GRX [M [DATA]]]
//! ```
//!
//! `OP` is a mnemonic from the [`OpCode`](../avm/enum.OpCode.html) table,
//! case-insensitive. `GRX` is a register index up to 31, `M` an addressing
//! mode given either numerically or as one of `DIR`, `IM`, `IND`, `IDX`,
//! `REG`, and `DATA` a payload up to `2^20 - 1`. Missing trailing fields
//! default to zero. Numeric fields accept decimal, `0x`, `0o` and `0b`
//! notation.
//!
//! Blank lines are skipped and `#` starts a comment running to the end of
//! the line, so the annotated output of the
//! [alangc](../alangc/index.html) compiler assembles unchanged.
//!
//! Each instruction encodes to one line of output holding the 33-bit word
//! as ASCII binary, `op(5) | grx(5) | m(3) | data(20)`, high bits first.

use avm::constants::*;
use avm::{AddressMode, Instruction, OpCode};
use num_traits::FromPrimitive;
use std::fmt;
use util::parse_int;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembleError {
    pub message: String,
    pub line: usize,
    pub text: String,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Assemble failed. {} On line {}, \"{}\"",
            self.message, self.line, self.text
        )
    }
}

impl std::error::Error for AssembleError {}

pub type Result<T> = std::result::Result<T, AssembleError>;

/// Assemble a whole program, producing one 33-character binary line per
/// instruction.
pub fn assemble(text: &str) -> Result<String> {
    let mut words = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let code = match raw.find('#') {
            Some(start) => &raw[..start],
            None => raw,
        };
        let code = code.trim();
        if code.is_empty() {
            continue;
        }

        let instruction = parse_line(code).map_err(|message| AssembleError {
            message,
            line: idx + 1,
            text: raw.trim().to_owned(),
        })?;
        words.push(encode_binary(&instruction));
    }

    Ok(words.join("\n"))
}

/// Render the encoded word as its padded ASCII binary representation.
fn encode_binary(instruction: &Instruction) -> String {
    format!(
        "{:0width$b}",
        instruction.encode(),
        width = WORD_WIDTH as usize
    )
}

fn parse_line(line: &str) -> std::result::Result<Instruction, String> {
    let mut fields = line.split_whitespace();

    let mnemonic = fields.next().ok_or_else(|| "Missing mnemonic.".to_owned())?;
    let op: OpCode = mnemonic
        .to_uppercase()
        .parse()
        .map_err(|err| format!("{}", err))?;

    let grx = match fields.next() {
        Some(field) => {
            let value: u32 = parse_int(field)
                .map_err(|_| format!("Invalid register index \"{}\".", field))?;
            if value > GRX_MAX {
                return Err(format!("Register index {} out of range.", value));
            }
            value as u8
        }
        None => 0,
    };

    let m = match fields.next() {
        Some(field) => parse_mode(field)?,
        None => AddressMode::DIR,
    };

    let data = match fields.next() {
        Some(field) => {
            let value: u32 =
                parse_int(field).map_err(|_| format!("Invalid data value \"{}\".", field))?;
            if value > DATA_MAX {
                return Err(format!("Data value {} out of range.", value));
            }
            value
        }
        None => 0,
    };

    Ok(Instruction::new(op, grx, m, data))
}

fn parse_mode(field: &str) -> std::result::Result<AddressMode, String> {
    if let Ok(mode) = field.to_uppercase().parse() {
        return Ok(mode);
    }
    let value: u32 =
        parse_int(field).map_err(|_| format!("Invalid address mode \"{}\".", field))?;
    if value > MODE_MAX {
        return Err(format!("Address mode {} out of range.", value));
    }
    Ok(AddressMode::from_u32(value).unwrap())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bare_return() {
        assert_eq!(
            assemble("RET 0 0 0").unwrap(),
            "011010000000000000000000000000000"
        );
    }

    #[test]
    fn lines_are_33_characters() {
        let output = assemble("LOAD 0 0 1\nADD 0 1 2\nHALT 0 0 0").unwrap();
        for line in output.lines() {
            assert_eq!(line.len(), 33);
            assert!(line.chars().all(|c| c == '0' || c == '1'));
        }
    }

    #[test]
    fn symbolic_and_numeric_modes_agree() {
        assert_eq!(
            assemble("LOAD 0 IM 15").unwrap(),
            assemble("LOAD 0 1 15").unwrap()
        );
        assert_eq!(
            assemble("load 0 reg 1").unwrap(),
            assemble("LOAD 0 4 1").unwrap()
        );
    }

    #[test]
    fn missing_fields_default_to_zero() {
        assert_eq!(assemble("HALT").unwrap(), assemble("HALT 0 0 0").unwrap());
        assert_eq!(assemble("PUSH 0").unwrap(), assemble("PUSH 0 0 0").unwrap());
    }

    #[test]
    fn radix_prefixed_fields() {
        assert_eq!(
            assemble("LOAD 0x1 0b001 0xF").unwrap(),
            assemble("LOAD 1 1 15").unwrap()
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let output = assemble("LOAD 0 0 1\t# x = y\n\nRET 0 0 0 # implicit\n").unwrap();
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn data_limits() {
        assert!(assemble("LOAD 0 1 0").is_ok());
        assert!(assemble("LOAD 0 1 0xFFFFF").is_ok());

        let err = assemble("LOAD 0 1 0x100000").unwrap_err();
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn register_and_mode_limits() {
        assert!(assemble("LOAD 31 0 0").is_ok());
        assert!(assemble("LOAD 32 0 0").is_err());
        assert!(assemble("LOAD 0 4 0").is_ok());
        assert!(assemble("LOAD 0 5 0").is_err());
    }

    #[test]
    fn unknown_mnemonic() {
        let err = assemble("NOP 0 0 0\nFROB 1 2 3").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.text, "FROB 1 2 3");
        assert!(err.message.contains("FROB"));
    }

    #[test]
    fn assembling_is_deterministic() {
        let source = "LOAD 0 0 1\nJNE 0 1 4\nRET 0 0 0";
        assert_eq!(assemble(source).unwrap(), assemble(source).unwrap());
    }
}
