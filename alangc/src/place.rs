//! Places lowered blocks in memory and resolves every placeholder.

use crate::block::{get_block, Block, BlockType};
use crate::error::CompileError;
use crate::lower::{lower_block, LoweredInstruction};
use avm::{AddressMode, Instruction, OpCode};
use std::collections::BTreeMap;

/// A fully placed program: concrete instructions plus the source comments
/// collected during lowering.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub comments: BTreeMap<usize, String>,
}

impl Program {
    /// Render as assembly text, one instruction per line, annotated with
    /// `#` comments where source text is known.
    pub fn to_asm_string(&self) -> String {
        let mut out = String::new();
        for (idx, instruction) in self.instructions.iter().enumerate() {
            out.push_str(&instruction.to_string());
            if let Some(comment) = self.comments.get(&idx) {
                out.push_str("\t# ");
                out.push_str(comment);
            }
            out.push('\n');
        }
        out
    }
}

/// Lower every block, concatenate the streams in flattened block order,
/// record each block's address range, and rewrite all placeholders into
/// concrete jumps.
pub fn compile_blocks(blocks: &mut [Block]) -> Result<Program, CompileError> {
    let mut lowered = Vec::with_capacity(blocks.len());
    for block in blocks.iter() {
        lowered.push(lower_block(block, blocks)?);
    }

    let mut stream = Vec::new();
    let mut comments = BTreeMap::new();
    for (block, (instructions, block_comments)) in blocks.iter_mut().zip(lowered) {
        let start = stream.len() as u32;
        block.start_address = Some(start);
        block.end_address = instructions
            .len()
            .checked_sub(1)
            .map(|last| start + last as u32);
        for (offset, text) in block_comments {
            comments.insert(start as usize + offset, text);
        }
        stream.extend(instructions);
    }

    relocate(&mut stream, blocks)?;

    let instructions = stream
        .into_iter()
        .map(|element| match element {
            LoweredInstruction::Complete(instruction) => instruction,
            // A body block nothing jumps to; keep its slot occupied.
            LoweredInstruction::JmpBack => Instruction::bare(OpCode::NOP),
            LoweredInstruction::JmpTo { .. } => {
                unreachable!("forward placeholders are resolved during relocation")
            }
        })
        .collect();

    Ok(Program {
        instructions,
        comments,
    })
}

fn relocate(stream: &mut [LoweredInstruction], blocks: &[Block]) -> Result<(), CompileError> {
    for idx in 0..stream.len() {
        let (op, block_id, offset) = match stream[idx] {
            LoweredInstruction::JmpTo {
                op,
                block_id,
                offset,
            } => (op, block_id, offset),
            _ => continue,
        };

        let target = get_block(blocks, block_id)
            .ok_or_else(|| CompileError::new(format!("Unknown code block {}.", block_id)))?;
        let start = placed_address(target.start_address, block_id)?;
        stream[idx] = LoweredInstruction::Complete(Instruction::new(
            op,
            0,
            AddressMode::IM,
            start + offset,
        ));

        // For conditional bodies the matching back-edge sits on the block's
        // last word.
        let back_target = match target.block_type {
            // Fall through to the word after the conditional jump.
            BlockType::If => idx as u32 + 1,
            // Loop back to the LOAD opening the condition; the conditional
            // jump is always preceded by exactly LOAD and CMP.
            BlockType::While => idx as u32 - 2,
            _ => continue,
        };
        let end = placed_address(target.end_address, block_id)? as usize;
        stream[end] =
            LoweredInstruction::Complete(Instruction::new(OpCode::JMP, 0, AddressMode::IM, back_target));
    }
    Ok(())
}

fn placed_address(address: Option<u32>, block_id: u32) -> Result<u32, CompileError> {
    address.ok_or_else(|| CompileError::new(format!("Code block {} was never placed.", block_id)))
}
