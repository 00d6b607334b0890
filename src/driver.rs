//! 多语句驱动
//!
//! 按源码顺序逐条处理语句，所有语句共享一个符号表和一份求值日志。
//! 每条语句依次经过：解析、语义分析、逻辑定律改写、求值、三地址码、
//! 后端。解析错误和硬错误只中止当前语句。

use tracing::{debug, info, warn};

use crate::ast::NodeRef;
use crate::codegen::asm::{AsmGenerator, OptLevel};
use crate::codegen::ir::{IrGenerator, IrModule};
use crate::error::{LogicError, LogicResult};
use crate::evaluator::{Evaluation, evaluate};
use crate::parser::parse_line_at;
use crate::rewrite::{RewriteOptions, apply_logical_laws};
use crate::semantic::{SemanticDiagnostic, perform_semantic_analysis};
use crate::symbol_table::SymbolTable;
use crate::tac::{IntermediateCode, TacGenerator};
use crate::trace::{self, EvaluationLog};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backends {
    Asm,
    Ir,
    #[default]
    Both,
}

impl Backends {
    pub fn asm(self) -> bool {
        matches!(self, Backends::Asm | Backends::Both)
    }

    pub fn ir(self) -> bool {
        matches!(self, Backends::Ir | Backends::Both)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    pub opt_level: OptLevel,
    pub commutative: bool,
    pub backends: Backends,
    pub target_triple: String,
    pub module_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::default(),
            commutative: false,
            backends: Backends::default(),
            target_triple: "x86_64-pc-linux-gnu".to_string(),
            module_name: "logic_module".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    Evaluated(bool),
    /// 警告：本语句没有结果，编译继续
    Unevaluated(SemanticDiagnostic),
    Failed(LogicError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementRecord {
    /// 从 1 开始的源码行号
    pub line: usize,
    pub source: String,
    pub outcome: StatementOutcome,
}

#[derive(Debug)]
pub struct CompilationOutput {
    pub symbol_table: SymbolTable,
    pub log: EvaluationLog,
    pub statements: Vec<StatementRecord>,
    /// 每条成功降低的语句一份
    pub tac: Vec<IntermediateCode>,
    pub asm: Option<String>,
    pub ir: Option<IrModule>,
}

impl CompilationOutput {
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = (usize, &LogicError)> {
        self.statements.iter().filter_map(|s| match &s.outcome {
            StatementOutcome::Failed(e) => Some((s.line, e)),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = (usize, &SemanticDiagnostic)> {
        self.statements.iter().filter_map(|s| match &s.outcome {
            StatementOutcome::Unevaluated(d) => Some((s.line, d)),
            _ => None,
        })
    }

    /// 各语句的结果，无法求值的为 `None`
    pub fn results(&self) -> Vec<Option<bool>> {
        self.statements
            .iter()
            .map(|s| match s.outcome {
                StatementOutcome::Evaluated(v) => Some(v),
                _ => None,
            })
            .collect()
    }
}

struct Driver<'a> {
    options: &'a CompileOptions,
    table: SymbolTable,
    log: EvaluationLog,
    tac: TacGenerator,
    lowered: Vec<IntermediateCode>,
    asm: Option<AsmGenerator>,
    ir: Option<IrGenerator>,
}

impl Driver<'_> {
    /// 写入日志；启用 IR 后端时同时发射相同的追踪
    fn note(&mut self, text: &str) {
        self.log.push(text);
        if let Some(ir) = self.ir.as_mut() {
            ir.trace(text);
        }
    }

    fn statement(&mut self, line: usize, text: &str) -> StatementOutcome {
        let tree = match parse_line_at(text, line) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(line, error = %e, "skipping statement");
                return StatementOutcome::Failed(e);
            }
        };
        let printed = tree.to_string();
        self.note(&trace::evaluating(&printed));

        if let Err(diag) = perform_semantic_analysis(&tree, &mut self.table) {
            if diag.is_warning() {
                warn!(line, diagnostic = %diag, "statement left unevaluated");
                self.note(&trace::warning(&diag.message));
                return StatementOutcome::Unevaluated(diag);
            }
            warn!(line, diagnostic = %diag, "semantic error");
            return StatementOutcome::Failed(LogicError::Semantic(diag));
        }

        let mark = self.log.len();
        let options = RewriteOptions {
            commutative: self.options.commutative,
        };
        let rewritten = apply_logical_laws(&tree, options, &mut self.log);
        if let Some(ir) = self.ir.as_mut() {
            for step in &self.log.steps()[mark..] {
                ir.trace(step.text());
            }
            // 变量值取自求值之前的符号表
            if let Err(e) = ir.lower_statement(&rewritten, &self.table) {
                return StatementOutcome::Failed(e);
            }
        }

        match evaluate(&rewritten, &mut self.table, &mut self.log) {
            Ok(Evaluation::Value(value)) => {
                self.log.push(trace::result(value));
                match self.lower(&printed, &rewritten) {
                    Ok(()) => StatementOutcome::Evaluated(value),
                    Err(e) => StatementOutcome::Failed(e),
                }
            }
            Ok(Evaluation::Unevaluated(diag)) => StatementOutcome::Unevaluated(diag),
            Err(e) => {
                warn!(line, error = %e, "evaluation failed");
                StatementOutcome::Failed(e)
            }
        }
    }

    fn lower(&mut self, label: &str, tree: &NodeRef) -> LogicResult<()> {
        let code = self.tac.generate(tree)?;
        if let Some(asm) = self.asm.as_mut() {
            asm.add_statement(label, &code)?;
        }
        self.lowered.push(code);
        Ok(())
    }
}

/// 编译一个多语句程序。空行和只含 `//` 注释的行被跳过。
pub fn compile_program(source: &str, options: &CompileOptions) -> CompilationOutput {
    let mut driver = Driver {
        options,
        table: SymbolTable::new(),
        log: EvaluationLog::new(),
        tac: TacGenerator::new(),
        lowered: Vec::new(),
        asm: options.backends.asm().then(AsmGenerator::new),
        ir: options
            .backends
            .ir()
            .then(|| IrGenerator::new(options.module_name.clone(), options.target_triple.clone())),
    };

    driver.note(trace::START_PROGRAM);
    let mut statements = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with("//") {
            continue;
        }
        let line = index + 1;
        let outcome = driver.statement(line, text);
        debug!(line, ?outcome, "statement processed");
        statements.push(StatementRecord {
            line,
            source: text.to_string(),
            outcome,
        });
    }
    driver.note(trace::END_PROGRAM);

    let asm = driver.asm.as_ref().map(|asm| asm.finish(options.opt_level));
    let ir = driver.ir.as_ref().map(IrGenerator::finish);
    info!(
        statements = statements.len(),
        symbols = driver.table.len(),
        "compilation unit finished"
    );

    CompilationOutput {
        symbol_table: driver.table,
        log: driver.log,
        statements,
        tac: driver.lowered,
        asm,
        ir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::DiagnosticKind;

    fn run(source: &str) -> CompilationOutput {
        compile_program(source, &CompileOptions::default())
    }

    #[test]
    fn test_statements_share_the_symbol_table() {
        let out = run("A = TRUE\nB = FALSE\nA AND B\n");
        assert_eq!(out.results(), vec![Some(true), Some(false), Some(false)]);
        assert_eq!(out.symbol_table.get("A"), Some(true));
        assert_eq!(out.symbol_table.get("B"), Some(false));
        assert!(!out.has_errors());
        assert_eq!(out.tac.len(), 3);
    }

    #[test]
    fn test_parse_error_only_skips_its_statement() {
        let out = run("A = TRUE\nA AND (\nNOT A\n");
        assert_eq!(out.statements.len(), 3);
        assert!(matches!(out.statements[1].outcome, StatementOutcome::Failed(ref e) if e.is_parse_error()));
        assert_eq!(out.statements[2].outcome, StatementOutcome::Evaluated(false));
        assert!(out.has_errors());
        assert_eq!(out.errors().next().map(|(line, _)| line), Some(2));
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        let out = run("\n// setup\nA = FALSE\n\n   \nNOT A // trailing\n");
        assert_eq!(out.statements.len(), 2);
        assert_eq!(out.statements[1].line, 6);
        assert_eq!(out.results(), vec![Some(false), Some(true)]);
    }

    #[test]
    fn test_ambiguity_is_a_hard_error() {
        let out = run("A = TRUE\nB = TRUE\nC = FALSE\nA -> B AND C\n");
        match &out.statements[3].outcome {
            StatementOutcome::Failed(LogicError::Semantic(diag)) => {
                assert_eq!(diag.kind, DiagnosticKind::AmbiguousExpression);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(out.tac.len(), 3);
    }

    #[test]
    fn test_backend_selection() {
        let options = CompileOptions {
            backends: Backends::Asm,
            ..CompileOptions::default()
        };
        let out = compile_program("TRUE OR FALSE", &options);
        assert!(out.asm.is_some());
        assert!(out.ir.is_none());
    }

    #[test]
    fn test_ir_trace_follows_the_log() {
        let source = "A = TRUE\nB = FALSE\nNOT (A AND B)\nA <-> B\nX AND TRUE\nY = A OR B\n";
        for commutative in [false, true] {
            let options = CompileOptions {
                commutative,
                ..CompileOptions::default()
            };
            let out = compile_program(source, &options);
            let ir = out.ir.as_ref().unwrap();
            assert_eq!(ir.trace_text(), out.log.render_body());
        }
    }
}
