//! 求值叙述（EvaluationLog）
//!
//! 日志是程序数据而不是诊断输出：求值器、改写引擎与 IR 后端都从这里取得
//! 同一套步骤文本，保证生成程序的打印内容与日志逐字一致。

use std::fmt;

use crate::ast::{BinaryOp, bool_text};

pub const TRACE_TITLE: &str = "Logical Expression Evaluation";
pub const TRACE_RULE: &str = "---------------------------";

pub const START_PROGRAM: &str = "Starting evaluation of multiple expressions";
pub const END_PROGRAM: &str = "Completed evaluation of all expressions";
pub const DE_MORGAN: &str = "Applied De Morgan's Law";
pub const DISTRIBUTIVE: &str = "Applied Distributive Law: AND over OR";
pub const IMPLICATION: &str = "Applied Implication Law: A -> B == ~A OR B";
pub const IFF_LAW: &str = "Applied IFF Law: A <-> B == (A -> B) AND (B -> A)";
pub const COMMUTATIVE: &str = "Applied Commutative Law";

const RESULT_PREFIX: &str = "Result: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationStep(String);

impl EvaluationStep {
    pub fn new(text: impl Into<String>) -> Self {
        EvaluationStep(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn is_result(&self) -> bool {
        self.0.starts_with(RESULT_PREFIX)
    }
}

impl fmt::Display for EvaluationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn evaluating(statement: &str) -> String {
    format!("Evaluating expression: {}", statement)
}

pub fn folded(op: BinaryOp, left: bool, right: bool, value: bool) -> String {
    format!(
        "Folded constant: {} {} {} = {}",
        bool_text(left),
        op.trace_name(),
        bool_text(right),
        bool_text(value)
    )
}

pub fn substituted(name: &str, value: bool) -> String {
    format!("Substituted variable {} with value {}", name, bool_text(value))
}

pub fn evaluated_not() -> String {
    "Evaluated NOT operation".to_string()
}

pub fn evaluated(op: BinaryOp) -> String {
    format!("Evaluated {} operation", op.trace_name())
}

pub fn assigned(name: &str, value: bool) -> String {
    format!("Assigned {} = {}", name, bool_text(value))
}

pub fn undefined_variable(name: &str) -> String {
    format!("Warning: Undefined variable '{}'", name)
}

pub fn warning(message: &str) -> String {
    format!("Warning: {}", message)
}

pub fn result(value: bool) -> String {
    format!("{}{}", RESULT_PREFIX, bool_text(value))
}

/// 只追加、不重排、不截断的步骤序列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationLog {
    steps: Vec<EvaluationStep>,
}

impl EvaluationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.steps.push(EvaluationStep::new(text));
    }

    pub fn steps(&self) -> &[EvaluationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.steps.iter().any(|step| step.text() == text)
    }

    /// 程序运行时应打印的文本（不含文件头），每个 `Result:` 之后多一个空行
    pub fn render_body(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(step.text());
            out.push('\n');
            if step.is_result() {
                out.push('\n');
            }
        }
        out
    }

    /// 追踪文件的完整内容
    pub fn render_trace_file(&self) -> String {
        format!("{}\n{}\n\n{}", TRACE_TITLE, TRACE_RULE, self.render_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_texts() {
        assert_eq!(
            folded(BinaryOp::Implies, true, false, false),
            "Folded constant: TRUE IMPLIES FALSE = FALSE"
        );
        assert_eq!(evaluated(BinaryOp::Equiv), "Evaluated IFF/EQUIV operation");
        assert_eq!(substituted("A", true), "Substituted variable A with value TRUE");
        assert_eq!(undefined_variable("X"), "Warning: Undefined variable 'X'");
    }

    #[test]
    fn test_trace_file_layout() {
        let mut log = EvaluationLog::new();
        log.push(START_PROGRAM);
        log.push(evaluating("A = TRUE"));
        log.push(assigned("A", true));
        log.push(result(true));
        log.push(END_PROGRAM);

        assert_eq!(
            log.render_trace_file(),
            "Logical Expression Evaluation\n\
             ---------------------------\n\
             \n\
             Starting evaluation of multiple expressions\n\
             Evaluating expression: A = TRUE\n\
             Assigned A = TRUE\n\
             Result: TRUE\n\
             \n\
             Completed evaluation of all expressions\n"
        );
    }

    #[test]
    fn test_log_is_append_only_in_order() {
        let mut log = EvaluationLog::new();
        log.push("first");
        log.push("second");
        let texts: Vec<&str> = log.steps().iter().map(|s| s.text()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(log.contains("second"));
    }
}
