//! Lowers parsed blocks into linear instruction sequences.
//!
//! Addresses of other blocks are unknown at this stage, so function calls
//! and conditional jumps are emitted as placeholders carrying the target
//! block id; the placer resolves them. Statement text is re-parsed here
//! through the statement-fragment rules of the grammar.

use crate::block::{get_block, Block, BlockType, Statement};
use crate::error::CompileError;
use crate::parser::{AlangParser, Rule};
use avm::{AddressMode, Instruction, OpCode};
use matches::debug_assert_matches;
use pest::iterators::Pair;
use pest::Parser;
use std::collections::BTreeMap;
use util::parse_int;

type Result<T> = std::result::Result<T, CompileError>;

/// Source text per instruction index, used to annotate the emitted
/// assembly.
pub type CommentMap = BTreeMap<usize, String>;

/// An instruction or relocation placeholder produced by lowering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoweredInstruction {
    Complete(Instruction),
    /// Becomes `op 0 IM (start_address(block_id) + offset)` at placement.
    JmpTo {
        op: OpCode,
        block_id: u32,
        offset: u32,
    },
    /// Sentinel ending every `if`/`while` body; the placer rewrites it
    /// using the address of the matching forward jump.
    JmpBack,
}

/// Lower one block to instructions and placeholders, plus the comment map
/// pointing each statement's source text at its first instruction.
pub fn lower_block(
    block: &Block,
    blocks: &[Block],
) -> Result<(Vec<LoweredInstruction>, CommentMap)> {
    let mut instructions = Vec::new();
    let mut comments = CommentMap::new();

    for statement in &block.code {
        match statement {
            Statement::Cond {
                text,
                row,
                target_block,
            } => {
                comments.insert(instructions.len(), text.clone());
                lower_cond(text, *target_block, block, &mut instructions)
                    .map_err(|err| err.at(*row, text))?;
            }
            Statement::Plain { text, row } => {
                comments.insert(instructions.len(), text.clone());
                lower_plain(text, block, blocks, &mut instructions)
                    .map_err(|err| err.at(*row, text))?;
            }
        }
    }

    match block.block_type {
        BlockType::Function => {
            comments.insert(instructions.len(), "default return".to_owned());
            instructions.push(LoweredInstruction::Complete(Instruction::bare(OpCode::RET)));
        }
        BlockType::If | BlockType::While => instructions.push(LoweredInstruction::JmpBack),
        BlockType::Global => {}
    }

    Ok((instructions, comments))
}

/// Split a value token into its optional address prefix and name.
fn split_value(token: &str) -> (Option<char>, &str) {
    let mut chars = token.chars();
    match chars.next() {
        Some(prefix @ '*') | Some(prefix @ '&') => (Some(prefix), chars.as_str()),
        _ => (None, token),
    }
}

/// Resolve a value token to an addressing mode and payload.
fn deref_value(token: &str, block: &Block) -> Result<(AddressMode, u32)> {
    let (prefix, name) = split_value(token);

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        let value: u32 = parse_int(name)
            .map_err(|_| CompileError::new(format!("Invalid integer literal \"{}\".", name)))?;
        return match prefix {
            None => Ok((AddressMode::IM, value)),
            Some('*') => Ok((AddressMode::DIR, value)),
            _ => Err(CompileError::new("Invalid address mode for constant.")),
        };
    }

    let slot = *block
        .variables
        .get(name)
        .ok_or_else(|| CompileError::new(format!("Undeclared variable used: {}", name)))?;
    let mode = match prefix {
        None => AddressMode::DIR,
        Some('&') => AddressMode::IM,
        Some('*') => AddressMode::IND,
        _ => unreachable!(),
    };
    Ok((mode, slot))
}

fn lower_plain(
    text: &str,
    block: &Block,
    blocks: &[Block],
    out: &mut Vec<LoweredInstruction>,
) -> Result<()> {
    let trimmed = text.trim();

    if let Some(rest) = keyword_rest(trimmed, "return") {
        return lower_return(rest, block, out);
    }
    if trimmed == "halt" {
        out.push(LoweredInstruction::Complete(Instruction::bare(
            OpCode::HALT,
        )));
        return Ok(());
    }

    let stripped = strip_spaces(trimmed);
    let body = AlangParser::parse(Rule::stmt_body, &stripped)
        .map_err(|_| CompileError::new(format!("Invalid statement syntax \"{}\".", trimmed)))?
        .next()
        .unwrap()
        .into_inner()
        .next()
        .unwrap();

    match body.as_rule() {
        Rule::assignment => lower_assignment(body, block, blocks, out),
        Rule::expression => lower_expression(body, block, blocks, out),
        _ => unreachable!(),
    }
}

/// If `text` begins with `keyword` at a word boundary, return the rest.
fn keyword_rest<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if !c.is_ascii_alphanumeric() && c != '_' => Some(rest),
        _ => None,
    }
}

fn strip_spaces(text: &str) -> String {
    text.chars().filter(|c| *c != ' ').collect()
}

fn lower_return(rest: &str, block: &Block, out: &mut Vec<LoweredInstruction>) -> Result<()> {
    let token = strip_spaces(rest);
    if !token.is_empty() {
        // Only the leading value token is significant.
        let value = AlangParser::parse(Rule::value, &token)
            .map_err(|_| CompileError::new(format!("Invalid return value \"{}\".", rest.trim())))?
            .next()
            .unwrap();
        let (m, data) = deref_value(value.as_str(), block)?;
        // The return value travels in GR1.
        out.push(LoweredInstruction::Complete(Instruction::new(
            OpCode::LOAD,
            1,
            m,
            data,
        )));
    }
    out.push(LoweredInstruction::Complete(Instruction::bare(OpCode::RET)));
    Ok(())
}

fn lower_assignment(
    pair: Pair<Rule>,
    block: &Block,
    blocks: &[Block],
    out: &mut Vec<LoweredInstruction>,
) -> Result<()> {
    debug_assert_matches!(pair.as_rule(), Rule::assignment);
    let mut inner = pair.into_inner();
    let target = inner.next().unwrap();
    let expression = inner.next().unwrap();

    lower_expression(expression, block, blocks, out)?;

    let (m, data) = deref_value(target.as_str(), block)?;
    if m != AddressMode::DIR && m != AddressMode::IND {
        return Err(CompileError::new(format!(
            "Invalid address mode for assignment to \"{}\".",
            target.as_str()
        )));
    }
    out.push(LoweredInstruction::Complete(Instruction::new(
        OpCode::STORE,
        0,
        m,
        data,
    )));
    Ok(())
}

/// Lower a `+`/`-`/`*` chain, accumulating left to right in GR0.
fn lower_expression(
    pair: Pair<Rule>,
    block: &Block,
    blocks: &[Block],
    out: &mut Vec<LoweredInstruction>,
) -> Result<()> {
    debug_assert_matches!(pair.as_rule(), Rule::expression);
    let mut inner = pair.into_inner();

    let first = inner.next().unwrap();
    lower_term(first, OpCode::LOAD, block, blocks, out)?;

    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "+" => OpCode::ADD,
            "-" => OpCode::SUB,
            "*" => OpCode::MUL,
            _ => unreachable!(),
        };
        let term = inner.next().unwrap();
        lower_term(term, op, block, blocks, out)?;
    }
    Ok(())
}

fn lower_term(
    pair: Pair<Rule>,
    op: OpCode,
    block: &Block,
    blocks: &[Block],
    out: &mut Vec<LoweredInstruction>,
) -> Result<()> {
    debug_assert_matches!(pair.as_rule(), Rule::term);
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::call => {
            lower_call(inner, block, blocks, out)?;
            // The callee left its return value in GR1.
            out.push(LoweredInstruction::Complete(Instruction::new(
                op,
                0,
                AddressMode::REG,
                1,
            )));
        }
        Rule::value => {
            let (m, data) = deref_value(inner.as_str(), block)?;
            out.push(LoweredInstruction::Complete(Instruction::new(
                op, 0, m, data,
            )));
        }
        _ => unreachable!(),
    }
    Ok(())
}

/// Lower a call: save GR0, copy the arguments into the callee's parameter
/// slots, call, restore GR0.
fn lower_call(
    pair: Pair<Rule>,
    block: &Block,
    blocks: &[Block],
    out: &mut Vec<LoweredInstruction>,
) -> Result<()> {
    debug_assert_matches!(pair.as_rule(), Rule::call);
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str();

    let target_id = *block
        .functions
        .get(name)
        .ok_or_else(|| CompileError::new(format!("Undeclared function used: {}", name)))?;
    let target = get_block(blocks, target_id)
        .ok_or_else(|| CompileError::new(format!("Unknown code block {}.", target_id)))?;

    out.push(LoweredInstruction::Complete(Instruction::new(
        OpCode::PUSH,
        0,
        AddressMode::DIR,
        0,
    )));

    if let Some(args) = inner.next() {
        for (idx, arg) in args.into_inner().enumerate() {
            let (m, data) = deref_value(arg.as_str(), block)?;
            let parameter = target.parameters.get(idx).ok_or_else(|| {
                CompileError::new(format!("Too many arguments in call to {}.", name))
            })?;
            let (_, slot) = deref_value(parameter, target)?;

            out.push(LoweredInstruction::Complete(Instruction::new(
                OpCode::LOAD,
                0,
                m,
                data,
            )));
            out.push(LoweredInstruction::Complete(Instruction::new(
                OpCode::STORE,
                0,
                AddressMode::DIR,
                slot,
            )));
        }
    }

    out.push(LoweredInstruction::JmpTo {
        op: OpCode::CALL,
        block_id: target_id,
        offset: 0,
    });
    out.push(LoweredInstruction::Complete(Instruction::new(
        OpCode::POP,
        0,
        AddressMode::DIR,
        0,
    )));
    Ok(())
}

/// Lower an `if`/`while` header into the compare-and-branch triple.
fn lower_cond(
    text: &str,
    target_block: u32,
    block: &Block,
    out: &mut Vec<LoweredInstruction>,
) -> Result<()> {
    let stripped = strip_spaces(text);
    let header = AlangParser::parse(Rule::cond_body, &stripped)
        .map_err(|_| {
            CompileError::new(format!("Invalid conditional header \"{}\".", text.trim()))
        })?
        .next()
        .unwrap()
        .into_inner()
        .next()
        .unwrap();

    let mut inner = header.into_inner();
    let _kind = inner.next().unwrap();
    let lhs = inner.next().unwrap();
    let operator = inner.next().unwrap();
    let rhs = inner.next().unwrap();

    let (m1, v1) = deref_value(lhs.as_str(), block)?;
    let (m2, v2) = deref_value(rhs.as_str(), block)?;

    let load = |m, data| LoweredInstruction::Complete(Instruction::new(OpCode::LOAD, 0, m, data));
    let cmp = |m, data| LoweredInstruction::Complete(Instruction::new(OpCode::CMP, 0, m, data));
    let jump = |op| LoweredInstruction::JmpTo {
        op,
        block_id: target_block,
        offset: 0,
    };

    match operator.as_str() {
        "!=" => {
            out.push(load(m1, v1));
            out.push(cmp(m2, v2));
            out.push(jump(OpCode::JNE));
        }
        "<" => {
            out.push(load(m1, v1));
            out.push(cmp(m2, v2));
            out.push(jump(OpCode::JGR));
        }
        ">" => {
            // The processor only jumps on "greater", so swap the operands.
            out.push(load(m2, v2));
            out.push(cmp(m1, v1));
            out.push(jump(OpCode::JGR));
        }
        _ => unreachable!(),
    }
    Ok(())
}
