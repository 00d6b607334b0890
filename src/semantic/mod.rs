//! 语义分析：变量、量词、赋值位置与歧义检查

mod ambiguity;
mod diagnostic;

pub use ambiguity::{check_ambiguous_expression, generate_parenthesized_expression};
pub use diagnostic::{DiagnosticKind, SemanticDiagnostic};

use tracing::debug;

use crate::ast::{Node, NodeKind};
use crate::symbol_table::SymbolTable;

/// 扫描所有赋值节点，在验证之前把被赋值的变量登记进符号表。
/// 右侧是字面量时直接写入其值，否则只登记一个未定义的占位。
pub fn preprocess(node: &Node, table: &mut SymbolTable) -> Result<(), SemanticDiagnostic> {
    match &node.kind {
        NodeKind::Var(_) | NodeKind::Bool(_) => Ok(()),
        NodeKind::Assign(name, expr) => {
            bind_target(name, expr, table)?;
            preprocess(expr, table)
        }
        NodeKind::Not(expr) => preprocess(expr, table),
        NodeKind::Binary(_, left, right) => {
            preprocess(left, table)?;
            preprocess(right, table)
        }
        NodeKind::Quantified(_, _, body) => match body {
            Some(body) => preprocess(body, table),
            None => Ok(()),
        },
    }
}

fn bind_target(name: &str, expr: &Node, table: &mut SymbolTable) -> Result<(), SemanticDiagnostic> {
    let bound = match expr.as_bool() {
        Some(value) => table.add_or_update(name, value),
        None => table.declare(name),
    };
    bound.map_err(|_| {
        SemanticDiagnostic::new(
            DiagnosticKind::TypeMismatch,
            format!("Cannot assign to constant '{}'", name),
        )
    })
}

/// 每个变量引用都必须能在符号表中找到
pub fn validate_variable_usage(node: &Node, table: &mut SymbolTable) -> bool {
    first_undefined_variable(node, table).is_none()
}

fn first_undefined_variable(node: &Node, table: &mut SymbolTable) -> Option<String> {
    match &node.kind {
        NodeKind::Var(name) => {
            if SymbolTable::is_reserved(name) || table.contains(name) {
                None
            } else {
                Some(name.clone())
            }
        }
        NodeKind::Bool(_) => None,
        NodeKind::Assign(name, expr) => {
            if let Some(missing) = first_undefined_variable(expr, table) {
                return Some(missing);
            }
            // 保留已有的值，只补登记
            match bind_target(name, expr, table) {
                Ok(()) => None,
                Err(_) => Some(name.clone()),
            }
        }
        NodeKind::Not(expr) => first_undefined_variable(expr, table),
        NodeKind::Binary(_, left, right) => {
            first_undefined_variable(left, table).or_else(|| first_undefined_variable(right, table))
        }
        NodeKind::Quantified(_, var, body) => {
            // 约束变量先登记，量词体里才能引用它
            if table.declare(var).is_err() {
                return Some(var.clone());
            }
            body.as_ref().and_then(|body| first_undefined_variable(body, table))
        }
    }
}

/// 每个量词都必须有约束变量名和量词体
pub fn validate_quantifier_expression(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Var(_) | NodeKind::Bool(_) => true,
        NodeKind::Assign(_, expr) | NodeKind::Not(expr) => validate_quantifier_expression(expr),
        NodeKind::Binary(_, left, right) => {
            validate_quantifier_expression(left) && validate_quantifier_expression(right)
        }
        NodeKind::Quantified(_, var, body) => match body {
            Some(body) => !var.is_empty() && validate_quantifier_expression(body),
            None => false,
        },
    }
}

/// 赋值只能出现在语句顶层，不能当作布尔操作数
fn nested_assignment(node: &Node, at_root: bool) -> Option<&str> {
    match &node.kind {
        NodeKind::Var(_) | NodeKind::Bool(_) => None,
        NodeKind::Assign(name, expr) => {
            if at_root {
                nested_assignment(expr, false)
            } else {
                Some(name.as_str())
            }
        }
        NodeKind::Not(expr) => nested_assignment(expr, false),
        NodeKind::Binary(_, left, right) => {
            nested_assignment(left, false).or_else(|| nested_assignment(right, false))
        }
        NodeKind::Quantified(_, _, body) => body.as_ref().and_then(|b| nested_assignment(b, false)),
    }
}

/// 预处理 → 赋值位置 → 变量 → 量词 → 歧义，返回第一个失败的诊断
pub fn perform_semantic_analysis(node: &Node, table: &mut SymbolTable) -> Result<(), SemanticDiagnostic> {
    preprocess(node, table)?;

    if let Some(name) = nested_assignment(node, true) {
        return Err(SemanticDiagnostic::new(
            DiagnosticKind::TypeMismatch,
            format!("Assignment to '{}' cannot be used as a boolean operand", name),
        ));
    }

    if let Some(name) = first_undefined_variable(node, table) {
        return Err(SemanticDiagnostic::undefined_variable(&name));
    }

    if !validate_quantifier_expression(node) {
        return Err(SemanticDiagnostic::new(
            DiagnosticKind::InvalidQuantifier,
            "Invalid quantifier expression",
        ));
    }

    let (ok, ambiguous) = check_ambiguous_expression(node);
    if ambiguous {
        return Err(SemanticDiagnostic::ambiguous(generate_parenthesized_expression(node)));
    }
    if !ok {
        return Err(SemanticDiagnostic::new(
            DiagnosticKind::InvalidQuantifier,
            "Invalid quantifier expression",
        ));
    }

    debug!(statement = %node, "semantic analysis passed");
    Ok(())
}
