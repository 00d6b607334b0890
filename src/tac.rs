//! 三地址码
//!
//! 自底向上降低表达式树：变量与字面量本身就是操作数，不产生指令；
//! 每个一元/二元连接词恰好产生一条指令。指令持有自己的名字副本，
//! 与源树的生命周期无关。

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::ast::{BinaryOp, Node, NodeKind, bool_text};
use crate::error::{LogicResult, codegen_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TacOp {
    Assign,
    Not,
    And,
    Or,
    Xor,
    Xnor,
    Implies,
    Iff,
    Equiv,
}

impl TacOp {
    pub fn from_binary(op: BinaryOp) -> Self {
        match op {
            BinaryOp::And => TacOp::And,
            BinaryOp::Or => TacOp::Or,
            BinaryOp::Xor => TacOp::Xor,
            BinaryOp::Xnor => TacOp::Xnor,
            BinaryOp::Implies => TacOp::Implies,
            BinaryOp::Iff => TacOp::Iff,
            BinaryOp::Equiv => TacOp::Equiv,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            TacOp::Assign => "",
            TacOp::Not => "NOT",
            TacOp::And => "AND",
            TacOp::Or => "OR",
            TacOp::Xor => "XOR",
            TacOp::Xnor => "XNOR",
            TacOp::Implies => "IMPLIES",
            TacOp::Iff => "IFF",
            TacOp::Equiv => "EQUIV",
        }
    }

    /// 真值语义（一元运算只看 `a`）
    pub fn apply(self, a: bool, b: bool) -> bool {
        match self {
            TacOp::Assign => a,
            TacOp::Not => !a,
            TacOp::And => a && b,
            TacOp::Or => a || b,
            TacOp::Xor => a ^ b,
            TacOp::Xnor | TacOp::Iff | TacOp::Equiv => a == b,
            TacOp::Implies => !a || b,
        }
    }
}

/// 指令操作数。`Literal` 打印为 `0`/`1`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Var(String),
    Temp(String),
    Literal(bool),
}

impl Operand {
    pub fn name(&self) -> String {
        match self {
            Operand::Var(name) | Operand::Temp(name) => name.clone(),
            Operand::Literal(value) => (if *value { "1" } else { "0" }).to_string(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(name) | Operand::Temp(name) => f.write_str(name),
            Operand::Literal(value) => f.write_str(bool_text(*value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TacInstruction {
    pub op: TacOp,
    pub result: Operand,
    pub arg1: Operand,
    pub arg2: Option<Operand>,
}

impl fmt::Display for TacInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.op, &self.arg2) {
            (TacOp::Assign, _) => write!(f, "{} = {}", self.result, self.arg1),
            (TacOp::Not, _) => write!(f, "{} = NOT {}", self.result, self.arg1),
            (op, Some(arg2)) => write!(f, "{} = {} {} {}", self.result, self.arg1, op.mnemonic(), arg2),
            (op, None) => write!(f, "{} = {} {} ?", self.result, self.arg1, op.mnemonic()),
        }
    }
}

/// 一条语句的指令序列及其结果操作数
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateCode {
    pub instructions: Vec<TacInstruction>,
    pub result: Operand,
}

impl IntermediateCode {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for IntermediateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instructions {
            writeln!(f, "{}", instr)?;
        }
        Ok(())
    }
}

/// 在整个编译单元内分配唯一的临时变量名
#[derive(Debug, Default)]
pub struct TacGenerator {
    temp_counter: usize,
    /// 出现过的用户变量名，临时变量不会与之重名
    user_names: HashSet<String>,
}

impl TacGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 降低一棵树。出错时丢弃本语句已生成的部分指令。
    pub fn generate(&mut self, node: &Node) -> LogicResult<IntermediateCode> {
        self.user_names.extend(node.variables());
        let mut instructions = Vec::new();
        let result = self.lower(node, &mut instructions)?;
        debug!(count = instructions.len(), "lowered statement to three-address code");
        Ok(IntermediateCode { instructions, result })
    }

    fn new_temp(&mut self) -> Operand {
        loop {
            let name = format!("t{}", self.temp_counter);
            self.temp_counter += 1;
            if !self.user_names.contains(&name) {
                return Operand::Temp(name);
            }
        }
    }

    fn lower(&mut self, node: &Node, out: &mut Vec<TacInstruction>) -> LogicResult<Operand> {
        match &node.kind {
            NodeKind::Var(name) => Ok(Operand::Var(name.clone())),
            NodeKind::Bool(value) => Ok(Operand::Literal(*value)),
            NodeKind::Assign(name, expr) => {
                let value = self.lower(expr, out)?;
                let target = Operand::Var(name.clone());
                out.push(TacInstruction {
                    op: TacOp::Assign,
                    result: target.clone(),
                    arg1: value,
                    arg2: None,
                });
                Ok(target)
            }
            NodeKind::Not(expr) => {
                let arg = self.lower(expr, out)?;
                let result = self.new_temp();
                out.push(TacInstruction {
                    op: TacOp::Not,
                    result: result.clone(),
                    arg1: arg,
                    arg2: None,
                });
                Ok(result)
            }
            NodeKind::Binary(op, left, right) => {
                let arg1 = self.lower(left, out)?;
                let arg2 = self.lower(right, out)?;
                let result = self.new_temp();
                out.push(TacInstruction {
                    op: TacOp::from_binary(*op),
                    result: result.clone(),
                    arg1,
                    arg2: Some(arg2),
                });
                Ok(result)
            }
            NodeKind::Quantified(q, var, body) => match body {
                Some(_) => Err(codegen_error(format!(
                    "Cannot generate code for quantified expression '{} {}'",
                    q.keyword(),
                    var
                ))),
                None => Err(codegen_error(format!("{} {} has no body", q.keyword(), var))),
            },
        }
    }
}

/// 一次性降低（新的临时变量计数）
pub fn generate_three_address_code(node: &Node) -> LogicResult<IntermediateCode> {
    TacGenerator::new().generate(node)
}
