use std::fmt;
use thiserror::Error;

/// Pipeline phase that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexing,
    Parsing,
    Optimization,
    CodeGeneration,
    Io,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lexing => "lexing",
            Stage::Parsing => "parsing",
            Stage::Optimization => "optimization",
            Stage::CodeGeneration => "code generation",
            Stage::Io => "io",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("Lex error at {line}:{column}: {message}")]
    LexError {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Parse error at line {line}: {message} (got '{found}')")]
    ParseError {
        line: u32,
        message: String,
        found: String,
    },

    #[error("Optimizer error: {0}")]
    OptimizerError(String),

    #[error("Code generation error: {0}")]
    CodeGenError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CompilerError {
    pub fn stage(&self) -> Stage {
        match self {
            CompilerError::LexError { .. } => Stage::Lexing,
            CompilerError::ParseError { .. } => Stage::Parsing,
            CompilerError::OptimizerError(_) => Stage::Optimization,
            CompilerError::CodeGenError(_) => Stage::CodeGeneration,
            CompilerError::IoError(_) => Stage::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompilerError>;
