use crate::parser::ParseError;
use std::fmt;

/// A failure detected while lowering parsed blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub row: Option<u32>,
    pub text: Option<String>,
}

impl CompileError {
    pub fn new<S: Into<String>>(message: S) -> CompileError {
        CompileError {
            message: message.into(),
            row: None,
            text: None,
        }
    }

    /// Attach the statement the error was detected in. The innermost
    /// context wins.
    pub fn at(mut self, row: u32, text: &str) -> CompileError {
        if self.row.is_none() {
            self.row = Some(row);
            self.text = Some(text.trim().to_owned());
        }
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Compile failed. {}", self.message)?;
        if let (Some(row), Some(text)) = (self.row, self.text.as_ref()) {
            write!(f, " On line {}, \"{}\"", row, text)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Any failure from the parse or compile stages.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Compile(CompileError),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Error {
        Error::Compile(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "Parse failed.\n{}", err),
            Error::Compile(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}
