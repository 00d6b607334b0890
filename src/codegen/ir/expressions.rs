//! 表达式节点的 IR 生成
//!
//! 每个节点物化为一个 `i1` 值。变量在生成时从符号表取值并作为常量
//! 写入，同时在同一位置发射与求值器相同的追踪文本。

use tracing::warn;

use crate::ast::{BinaryOp, NodeKind, NodeRef};
use crate::codegen::ir::context::IrGenerator;
use crate::error::{LogicResult, codegen_error};
use crate::symbol_table::SymbolTable;
use crate::trace;

/// 已物化的值：IR 操作数以及生成时已知的真值
#[derive(Debug, Clone, PartialEq)]
pub struct IrValue {
    pub operand: String,
    pub value: bool,
}

impl IrValue {
    fn constant(value: bool) -> Self {
        Self {
            operand: llvm_bool(value).to_string(),
            value,
        }
    }
}

pub fn llvm_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

impl IrGenerator {
    /// 生成节点值；返回 `None` 表示本语句无法求值（警告已发射）
    pub fn generate_node(&mut self, node: &NodeRef, table: &SymbolTable) -> LogicResult<Option<IrValue>> {
        match &node.kind {
            NodeKind::Bool(value) => Ok(Some(IrValue::constant(*value))),
            NodeKind::Var(name) => {
                let resolved = match name.as_str() {
                    "TRUE" => Some(true),
                    "FALSE" => Some(false),
                    _ => table.get(name),
                };
                match resolved {
                    Some(value) => {
                        self.trace(&trace::substituted(name, value));
                        Ok(Some(IrValue::constant(value)))
                    }
                    None => {
                        warn!(variable = %name, "undefined variable in IR generation");
                        self.trace(&trace::undefined_variable(name));
                        Ok(None)
                    }
                }
            }
            NodeKind::Assign(name, expr) => {
                let Some(value) = self.generate_node(expr, table)? else {
                    return Ok(None);
                };
                self.declare_global(name);
                self.emit_line(&format!(
                    "store i1 {}, ptr {}, align 1",
                    value.operand,
                    IrGenerator::global_name(name)
                ));
                self.trace(&trace::assigned(name, value.value));
                Ok(Some(value))
            }
            NodeKind::Not(expr) => {
                let Some(inner) = self.generate_node(expr, table)? else {
                    return Ok(None);
                };
                let result = self.negate(&inner);
                self.trace(&trace::evaluated_not());
                Ok(Some(result))
            }
            NodeKind::Binary(op, left, right) => {
                let Some(l) = self.generate_node(left, table)? else {
                    return Ok(None);
                };
                let Some(r) = self.generate_node(right, table)? else {
                    return Ok(None);
                };
                let result = self.generate_binary(*op, &l, &r);
                self.trace(&trace::evaluated(*op));
                Ok(Some(result))
            }
            NodeKind::Quantified(q, var, body) => {
                if body.is_none() {
                    return Err(codegen_error(format!("{} {} has no body", q.keyword(), var)));
                }
                self.trace(&trace::warning(&format!(
                    "Cannot evaluate quantified expression '{} {}'",
                    q.keyword(),
                    var
                )));
                Ok(None)
            }
        }
    }

    fn negate(&mut self, value: &IrValue) -> IrValue {
        let temp = self.new_temp();
        self.emit_line(&format!("{} = xor i1 {}, true", temp, value.operand));
        IrValue {
            operand: temp,
            value: !value.value,
        }
    }

    fn generate_binary(&mut self, op: BinaryOp, l: &IrValue, r: &IrValue) -> IrValue {
        let value = op.apply(l.value, r.value);
        let operand = match op {
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                let temp = self.new_temp();
                let mnemonic = match op {
                    BinaryOp::And => "and",
                    BinaryOp::Or => "or",
                    _ => "xor",
                };
                self.emit_line(&format!("{} = {} i1 {}, {}", temp, mnemonic, l.operand, r.operand));
                temp
            }
            BinaryOp::Xnor => {
                let differ = self.new_temp();
                self.emit_line(&format!("{} = xor i1 {}, {}", differ, l.operand, r.operand));
                let temp = self.new_temp();
                self.emit_line(&format!("{} = xor i1 {}, true", temp, differ));
                temp
            }
            // a -> b == NOT a OR b
            BinaryOp::Implies => {
                let not_l = self.negate(l);
                let temp = self.new_temp();
                self.emit_line(&format!("{} = or i1 {}, {}", temp, not_l.operand, r.operand));
                temp
            }
            BinaryOp::Iff | BinaryOp::Equiv => {
                let temp = self.new_temp();
                self.emit_line(&format!("{} = icmp eq i1 {}, {}", temp, l.operand, r.operand));
                temp
            }
        };
        IrValue { operand, value }
    }
}
