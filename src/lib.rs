pub mod error;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod symbol_table;
pub mod trace;
pub mod rewrite;
pub mod evaluator;
pub mod semantic;
pub mod tac;
pub mod codegen;
pub mod driver;
pub mod toolchain;

pub use ast::{BinaryOp, Node, NodeKind, NodeRef, Quantifier};
pub use driver::{Backends, CompilationOutput, CompileOptions, StatementOutcome, StatementRecord, compile_program};
pub use error::{LogicError, LogicResult};
pub use parser::parse_line;
pub use symbol_table::SymbolTable;
pub use trace::EvaluationLog;

pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile_source(&self, source: &str) -> CompilationOutput {
        compile_program(source, &self.options)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
