//! 表达式求值
//!
//! 未定义变量与量词只产生警告并使本语句没有结果，不中止整个编译；
//! 结构残缺的树（量词缺少量词体）才是本语句的硬错误。

use tracing::warn;

use crate::ast::{NodeKind, NodeRef};
use crate::error::{LogicResult, codegen_error};
use crate::semantic::{DiagnosticKind, SemanticDiagnostic};
use crate::symbol_table::SymbolTable;
use crate::trace::{self, EvaluationLog};

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Value(bool),
    /// 无法求值（已作为警告写入日志）
    Unevaluated(SemanticDiagnostic),
}

impl Evaluation {
    pub fn value(&self) -> Option<bool> {
        match self {
            Evaluation::Value(v) => Some(*v),
            Evaluation::Unevaluated(_) => None,
        }
    }
}

/// 对一棵树求值；赋值会写回符号表
pub fn evaluate(node: &NodeRef, table: &mut SymbolTable, log: &mut EvaluationLog) -> LogicResult<Evaluation> {
    match &node.kind {
        NodeKind::Bool(value) => Ok(Evaluation::Value(*value)),
        NodeKind::Var(name) => {
            let resolved = match name.as_str() {
                "TRUE" => Some(true),
                "FALSE" => Some(false),
                _ => table.get(name),
            };
            match resolved {
                Some(value) => {
                    log.push(trace::substituted(name, value));
                    Ok(Evaluation::Value(value))
                }
                None => {
                    warn!(variable = %name, "undefined variable");
                    log.push(trace::undefined_variable(name));
                    Ok(Evaluation::Unevaluated(SemanticDiagnostic::undefined_variable(name)))
                }
            }
        }
        NodeKind::Assign(name, expr) => {
            let value = match evaluate(expr, table, log)? {
                Evaluation::Value(value) => value,
                unevaluated => return Ok(unevaluated),
            };
            table.add_or_update(name, value)?;
            log.push(trace::assigned(name, value));
            Ok(Evaluation::Value(value))
        }
        NodeKind::Not(expr) => {
            let value = match evaluate(expr, table, log)? {
                Evaluation::Value(value) => value,
                unevaluated => return Ok(unevaluated),
            };
            log.push(trace::evaluated_not());
            Ok(Evaluation::Value(!value))
        }
        NodeKind::Binary(op, left, right) => {
            let l = match evaluate(left, table, log)? {
                Evaluation::Value(value) => value,
                unevaluated => return Ok(unevaluated),
            };
            let r = match evaluate(right, table, log)? {
                Evaluation::Value(value) => value,
                unevaluated => return Ok(unevaluated),
            };
            log.push(trace::evaluated(*op));
            Ok(Evaluation::Value(op.apply(l, r)))
        }
        NodeKind::Quantified(q, var, body) => {
            if body.is_none() {
                return Err(codegen_error(format!("{} {} has no body", q.keyword(), var)));
            }
            let diagnostic = SemanticDiagnostic::new(
                DiagnosticKind::InvalidQuantifier,
                format!("Cannot evaluate quantified expression '{} {}'", q.keyword(), var),
            );
            warn!(quantifier = q.keyword(), variable = %var, "quantified expression left unevaluated");
            log.push(trace::warning(&diagnostic.message));
            Ok(Evaluation::Unevaluated(diagnostic))
        }
    }
}
