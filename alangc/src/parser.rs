//! The alang parser: source text to the flattened list of code blocks.
//!
//! Parsing is recursive over the nested block structure; the result is
//! flattened into a pre-order list (global block first) in which every
//! block's symbol tables already contain the names visible from enclosing
//! scopes. Statement bodies are kept as text and picked apart later by the
//! lowerer.

use crate::block::{Block, BlockType, Statement};
use pest::error::ErrorVariant;
use pest::iterators::Pairs;
use pest::{Parser, Position};
use pest_derive::Parser;
use std::collections::BTreeMap;

#[derive(Parser)]
#[grammar = "alang.pest"]
pub struct AlangParser;

/// Errors from the parse stage, rendered with pest's caret diagnostics.
pub type ParseError = pest::error::Error<Rule>;

/// Parse a whole source file into the flattened block list.
pub fn parse_program(input: &str) -> Result<Vec<Block>, ParseError> {
    let program = AlangParser::parse(Rule::program, input)?.next().unwrap();

    let mut context = ParseContext::new();
    let root = context.build_block(
        program.into_inner(),
        BlockType::Global,
        String::new(),
        Vec::new(),
        None,
    );

    validate(input, &root)?;

    let blocks = flatten(root);
    debug_assert!(blocks
        .iter()
        .enumerate()
        .all(|(idx, block)| block.block_id == idx as u32));
    Ok(blocks)
}

struct BlockNode {
    block: Block,
    children: Vec<BlockNode>,
}

struct ParseContext {
    next_block_id: u32,
    next_slot: u32,
}

impl ParseContext {
    fn new() -> ParseContext {
        // Slot indices start at 1; slot 0 is never given to a variable.
        ParseContext {
            next_block_id: 0,
            next_slot: 1,
        }
    }

    fn alloc_block_id(&mut self) -> u32 {
        let id = self.next_block_id;
        self.next_block_id += 1;
        id
    }

    fn alloc_slot(&mut self) -> u32 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    fn build_block(
        &mut self,
        items: Pairs<Rule>,
        block_type: BlockType,
        name: String,
        parameters: Vec<String>,
        parent_block: Option<u32>,
    ) -> BlockNode {
        let block_id = self.alloc_block_id();
        let mut variables = BTreeMap::new();
        let mut functions = BTreeMap::new();
        let mut code = Vec::new();
        let mut children = Vec::new();

        for parameter in &parameters {
            variables.insert(parameter.clone(), self.alloc_slot());
        }

        for item in items {
            match item.as_rule() {
                Rule::function_def => {
                    let mut inner = item.into_inner();
                    let head = inner.next().unwrap();
                    let fn_name = head.into_inner().next().unwrap().as_str().to_owned();
                    let params = match inner.peek() {
                        Some(pair) if pair.as_rule() == Rule::param_list => inner
                            .next()
                            .unwrap()
                            .into_inner()
                            .map(|p| p.as_str().to_owned())
                            .collect(),
                        _ => Vec::new(),
                    };
                    let child = self.build_block(
                        inner,
                        BlockType::Function,
                        fn_name.clone(),
                        params,
                        Some(block_id),
                    );
                    functions.insert(fn_name, child.block.block_id);
                    children.push(child);
                }
                Rule::cond_def => {
                    let mut inner = item.into_inner();
                    let header = inner.next().unwrap();
                    let row = header.as_span().start_pos().line_col().0 as u32;
                    let text = header.as_str().to_owned();
                    let kind = match header.into_inner().next().unwrap().as_str() {
                        "if" => BlockType::If,
                        "while" => BlockType::While,
                        _ => unreachable!(),
                    };
                    let child =
                        self.build_block(inner, kind, String::new(), Vec::new(), Some(block_id));
                    code.push(Statement::Cond {
                        text,
                        row,
                        target_block: child.block.block_id,
                    });
                    children.push(child);
                }
                Rule::declaration => {
                    let name_pair = item.into_inner().next().unwrap();
                    variables.insert(name_pair.as_str().to_owned(), self.alloc_slot());
                }
                Rule::statement => {
                    let span = item.as_span();
                    let row = span.start_pos().line_col().0 as u32;
                    let text = span.as_str();
                    // Drop the trailing semicolon.
                    let text = text[..text.len() - 1].trim().to_owned();
                    code.push(Statement::Plain { text, row });
                }
                Rule::EOI => {}
                _ => unreachable!(),
            }
        }

        BlockNode {
            block: Block {
                block_id,
                block_type,
                name,
                parent_block,
                parameters,
                variables,
                functions,
                code,
                start_address: None,
                end_address: None,
            },
            children,
        }
    }
}

/// Flatten the block tree into a pre-order list. Each child inherits the
/// `(name, slot)` and `(name, block)` entries of its parent that it does
/// not define itself.
fn flatten(node: BlockNode) -> Vec<Block> {
    let BlockNode { block, children } = node;
    let mut blocks = vec![block];
    for mut child in children {
        let parent = &blocks[0];
        for (name, slot) in &parent.variables {
            child.block.variables.entry(name.clone()).or_insert(*slot);
        }
        for (name, id) in &parent.functions {
            child.block.functions.entry(name.clone()).or_insert(*id);
        }
        blocks.extend(flatten(child));
    }
    blocks
}

fn validate(input: &str, root: &BlockNode) -> Result<(), ParseError> {
    if let Some(statement) = root.block.code.first() {
        let (text, row) = match statement {
            Statement::Cond { text, row, .. } | Statement::Plain { text, row } => (text, *row),
        };
        return Err(custom_error(
            input,
            row,
            format!(
                "No code allowed in the global scope, move \"{}\" into a function.",
                text
            ),
        ));
    }
    if !root.block.functions.contains_key("main") {
        return Err(ParseError::new_from_pos(
            ErrorVariant::CustomError {
                message: "No main function defined.".to_owned(),
            },
            Position::from_start(input),
        ));
    }
    Ok(())
}

/// Build a custom error pointing at the start of the given 1-based row.
fn custom_error(input: &str, row: u32, message: String) -> ParseError {
    let mut offset = 0;
    for _ in 1..row {
        match input[offset..].find('\n') {
            Some(next) => offset += next + 1,
            None => break,
        }
    }
    let position = Position::new(input, offset).unwrap_or_else(|| Position::from_start(input));
    ParseError::new_from_pos(ErrorVariant::CustomError { message }, position)
}
