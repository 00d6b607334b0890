use thiserror::Error;
use std::fmt;

use crate::semantic::SemanticDiagnostic;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogicError {
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer { line: usize, column: usize, message: String },

    #[error("Parser error at line {line}, column {column}: {message}")]
    Parser { line: usize, column: usize, message: String },

    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticDiagnostic),

    #[error("Code generation error: {0}")]
    CodeGen(String),

    #[error("Cannot rebind reserved symbol '{0}'")]
    ReservedSymbol(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("{tool} failed{}: {stderr}", exit_suffix(.status))]
    Toolchain { tool: String, status: Option<i32>, stderr: String },
}

impl LogicError {
    /// 是否为解析阶段的错误（只中止当前语句）
    pub fn is_parse_error(&self) -> bool {
        matches!(self, LogicError::Lexer { .. } | LogicError::Parser { .. })
    }

    /// 进程退出码：工具链错误原样透传其退出码，其余一律为 1
    pub fn exit_code(&self) -> i32 {
        match self {
            LogicError::Toolchain { status: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for LogicError {
    fn from(e: std::io::Error) -> Self {
        LogicError::Io(e.to_string())
    }
}

fn exit_suffix(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" (exit code {})", code),
        None => String::new(),
    }
}

pub type LogicResult<T> = Result<T, LogicError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub fn lexer_error(line: usize, column: usize, message: impl Into<String>) -> LogicError {
    LogicError::Lexer {
        line,
        column,
        message: message.into(),
    }
}

pub fn parser_error(line: usize, column: usize, message: impl Into<String>) -> LogicError {
    LogicError::Parser {
        line,
        column,
        message: message.into(),
    }
}

pub fn codegen_error(message: impl Into<String>) -> LogicError {
    LogicError::CodeGen(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolchain_status_is_propagated() {
        let err = LogicError::Toolchain {
            tool: "nasm".to_string(),
            status: Some(3),
            stderr: "bad operand".to_string(),
        };
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "nasm failed (exit code 3): bad operand");

        let killed = LogicError::Toolchain {
            tool: "ld".to_string(),
            status: None,
            stderr: String::new(),
        };
        assert_eq!(killed.exit_code(), 1);
    }

    #[test]
    fn parse_errors_are_classified() {
        assert!(parser_error(1, 4, "Expected ')'").is_parse_error());
        assert!(lexer_error(1, 1, "Unexpected character").is_parse_error());
        assert!(!codegen_error("missing operand").is_parse_error());
    }
}
