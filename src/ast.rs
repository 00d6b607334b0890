//! 命题逻辑表达式树
//!
//! 节点一经创建便不可变。改写总是构造新树，未改变的子树通过 `Rc` 共享，
//! 不存在对同一节点的原地修改或重复释放。

use std::fmt;
use std::rc::Rc;

/// 共享的子树引用
pub type NodeRef = Rc<Node>;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// 源码中是否显式加了括号（只用于打印和歧义检查）
    pub parenthesized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Var(String),
    Bool(bool),
    Assign(String, NodeRef),
    Not(NodeRef),
    Binary(BinaryOp, NodeRef, NodeRef),
    /// 量词：绑定变量名 + 量词体。体缺失的树只能由手工构造得到，
    /// 语义分析会把它判为非法量词。
    Quantified(Quantifier, String, Option<NodeRef>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Xnor,
    Implies,
    Iff,
    Equiv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Exists,
    Forall,
}

/// NOT 与量词的优先级
pub const UNARY_PRECEDENCE: u8 = 5;

impl BinaryOp {
    /// 运算符优先级，数值越大结合越紧：
    /// NOT(5) > AND(4) > OR/XOR/XNOR(3) > IMPLIES(2) > IFF/EQUIV(1)
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::And => 4,
            BinaryOp::Or | BinaryOp::Xor | BinaryOp::Xnor => 3,
            BinaryOp::Implies => 2,
            BinaryOp::Iff | BinaryOp::Equiv => 1,
        }
    }

    /// 源码中的写法
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::Xnor => "XNOR",
            BinaryOp::Implies => "->",
            BinaryOp::Iff => "<->",
            BinaryOp::Equiv => "==",
        }
    }

    /// 求值日志里使用的名称
    pub fn trace_name(self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::Xnor => "XNOR",
            BinaryOp::Implies => "IMPLIES",
            BinaryOp::Iff | BinaryOp::Equiv => "IFF/EQUIV",
        }
    }

    /// `->` 是右结合的，其余二元运算左结合
    pub fn is_right_associative(self) -> bool {
        self == BinaryOp::Implies
    }

    /// 运算符的真值语义
    pub fn apply(self, left: bool, right: bool) -> bool {
        match self {
            BinaryOp::And => left && right,
            BinaryOp::Or => left || right,
            BinaryOp::Xor => left ^ right,
            BinaryOp::Xnor => left == right,
            BinaryOp::Implies => !left || right,
            BinaryOp::Iff | BinaryOp::Equiv => left == right,
        }
    }
}

impl Quantifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Quantifier::Exists => "EXISTS",
            Quantifier::Forall => "FORALL",
        }
    }
}

/// 把布尔值写成源码形式
pub fn bool_text(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

impl Node {
    pub fn new(kind: NodeKind) -> NodeRef {
        Rc::new(Node { kind, parenthesized: false })
    }

    pub fn var(name: impl Into<String>) -> NodeRef {
        Self::new(NodeKind::Var(name.into()))
    }

    pub fn boolean(value: bool) -> NodeRef {
        Self::new(NodeKind::Bool(value))
    }

    pub fn assign(name: impl Into<String>, expr: NodeRef) -> NodeRef {
        Self::new(NodeKind::Assign(name.into(), expr))
    }

    pub fn not(expr: NodeRef) -> NodeRef {
        Self::new(NodeKind::Not(expr))
    }

    pub fn binary(op: BinaryOp, left: NodeRef, right: NodeRef) -> NodeRef {
        Self::new(NodeKind::Binary(op, left, right))
    }

    pub fn and(left: NodeRef, right: NodeRef) -> NodeRef {
        Self::binary(BinaryOp::And, left, right)
    }

    pub fn or(left: NodeRef, right: NodeRef) -> NodeRef {
        Self::binary(BinaryOp::Or, left, right)
    }

    pub fn implies(left: NodeRef, right: NodeRef) -> NodeRef {
        Self::binary(BinaryOp::Implies, left, right)
    }

    pub fn exists(var: impl Into<String>, body: NodeRef) -> NodeRef {
        Self::new(NodeKind::Quantified(Quantifier::Exists, var.into(), Some(body)))
    }

    pub fn forall(var: impl Into<String>, body: NodeRef) -> NodeRef {
        Self::new(NodeKind::Quantified(Quantifier::Forall, var.into(), Some(body)))
    }

    /// 返回带括号标记的副本（子树共享）
    pub fn parenthesize(node: &NodeRef) -> NodeRef {
        if node.parenthesized {
            return Rc::clone(node);
        }
        Rc::new(Node {
            kind: node.kind.clone(),
            parenthesized: true,
        })
    }

    /// 保留本节点的括号标记，换上新的内容
    pub fn with_kind(&self, kind: NodeKind) -> NodeRef {
        Rc::new(Node {
            kind,
            parenthesized: self.parenthesized,
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            NodeKind::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// 二元连接词节点
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self.kind {
            NodeKind::Binary(op, _, _) => Some(op),
            _ => None,
        }
    }

    /// 节点自身的优先级；叶子节点没有优先级
    pub fn precedence(&self) -> Option<u8> {
        match &self.kind {
            NodeKind::Binary(op, _, _) => Some(op.precedence()),
            NodeKind::Not(_) | NodeKind::Quantified(..) => Some(UNARY_PRECEDENCE),
            NodeKind::Assign(..) => Some(0),
            NodeKind::Var(_) | NodeKind::Bool(_) => None,
        }
    }

    /// 一元/二元连接词的个数（变量、字面量、赋值、量词不计）
    pub fn operator_count(&self) -> usize {
        match &self.kind {
            NodeKind::Var(_) | NodeKind::Bool(_) => 0,
            NodeKind::Assign(_, expr) => expr.operator_count(),
            NodeKind::Not(expr) => 1 + expr.operator_count(),
            NodeKind::Binary(_, l, r) => 1 + l.operator_count() + r.operator_count(),
            NodeKind::Quantified(_, _, body) => body.as_ref().map_or(0, |b| b.operator_count()),
        }
    }

    /// 忽略括号标记比较两棵树的结构
    pub fn same_shape(&self, other: &Node) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Var(a), NodeKind::Var(b)) => a == b,
            (NodeKind::Bool(a), NodeKind::Bool(b)) => a == b,
            (NodeKind::Assign(n1, e1), NodeKind::Assign(n2, e2)) => n1 == n2 && e1.same_shape(e2),
            (NodeKind::Not(a), NodeKind::Not(b)) => a.same_shape(b),
            (NodeKind::Binary(o1, l1, r1), NodeKind::Binary(o2, l2, r2)) => {
                o1 == o2 && l1.same_shape(l2) && r1.same_shape(r2)
            }
            (NodeKind::Quantified(q1, v1, b1), NodeKind::Quantified(q2, v2, b2)) => {
                q1 == q2
                    && v1 == v2
                    && match (b1, b2) {
                        (Some(a), Some(b)) => a.same_shape(b),
                        (None, None) => true,
                        _ => false,
                    }
            }
            _ => false,
        }
    }

    /// 收集树中出现的所有变量名（含赋值目标与量词变量），按首次出现排序
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match &self.kind {
            NodeKind::Var(name) => push_unique(names, name),
            NodeKind::Bool(_) => {}
            NodeKind::Assign(name, expr) => {
                push_unique(names, name);
                expr.collect_variables(names);
            }
            NodeKind::Not(expr) => expr.collect_variables(names),
            NodeKind::Binary(_, l, r) => {
                l.collect_variables(names);
                r.collect_variables(names);
            }
            NodeKind::Quantified(_, var, body) => {
                push_unique(names, var);
                if let Some(body) = body {
                    body.collect_variables(names);
                }
            }
        }
    }

    fn write_child(&self, f: &mut fmt::Formatter<'_>, child: &Node, needs_parens: bool) -> fmt::Result {
        if needs_parens && !child.parenthesized {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parenthesized {
            f.write_str("(")?;
        }
        match &self.kind {
            NodeKind::Var(name) => f.write_str(name)?,
            NodeKind::Bool(value) => f.write_str(bool_text(*value))?,
            NodeKind::Assign(name, expr) => write!(f, "{} = {}", name, expr)?,
            NodeKind::Not(expr) => {
                f.write_str("NOT ")?;
                let needs = expr.precedence().is_some_and(|p| p < UNARY_PRECEDENCE);
                self.write_child(f, expr, needs)?;
            }
            NodeKind::Quantified(q, var, body) => {
                write!(f, "{} {}", q.keyword(), var)?;
                if let Some(body) = body {
                    f.write_str(" ")?;
                    let needs = body.precedence().is_some_and(|p| p < UNARY_PRECEDENCE);
                    self.write_child(f, body, needs)?;
                }
            }
            NodeKind::Binary(op, left, right) => {
                let prec = op.precedence();
                // 同级子表达式：运算符不同，或位于非结合侧时必须加括号
                let left_needs = match left.precedence() {
                    Some(p) if p < prec => true,
                    Some(p) if p == prec => {
                        left.binary_op() != Some(*op) || op.is_right_associative()
                    }
                    _ => false,
                };
                let right_needs = match right.precedence() {
                    Some(p) if p < prec => true,
                    Some(p) if p == prec => {
                        right.binary_op() != Some(*op) || !op.is_right_associative()
                    }
                    _ => false,
                };
                self.write_child(f, left, left_needs)?;
                write!(f, " {} ", op.symbol())?;
                self.write_child(f, right, right_needs)?;
            }
        }
        if self.parenthesized {
            f.write_str(")")?;
        }
        Ok(())
    }
}
