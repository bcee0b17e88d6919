use serde::Serialize;
use std::collections::BTreeMap;

/// Lexical block kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Global,
    Function,
    If,
    While,
}

/// One statement of a block body.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statement {
    /// An `if`/`while` header, pointing at the block holding its body.
    Cond {
        text: String,
        row: u32,
        target_block: u32,
    },
    /// Any other statement, stored as its source text with the trailing
    /// semicolon removed.
    Plain { text: String, row: u32 },
}

/// A lexical unit of code with its own symbol tables.
///
/// After parsing, `variables` and `functions` also contain every entry
/// inherited from enclosing blocks that is not shadowed locally. The
/// address fields stay unset until the placer runs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Block {
    pub block_id: u32,
    pub block_type: BlockType,
    pub name: String,
    pub parent_block: Option<u32>,
    pub parameters: Vec<String>,
    pub variables: BTreeMap<String, u32>,
    pub functions: BTreeMap<String, u32>,
    pub code: Vec<Statement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_address: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_address: Option<u32>,
}

/// Look a block up by id in the flattened list.
pub fn get_block(blocks: &[Block], block_id: u32) -> Option<&Block> {
    blocks.iter().find(|b| b.block_id == block_id)
}
