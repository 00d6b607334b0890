//! 歧义检查与全括号建议

use crate::ast::{BinaryOp, Node, NodeKind, UNARY_PRECEDENCE, bool_text};

/// 返回 `(ok, ambiguous)`。
///
/// 一个没有括号标记的二元子表达式在以下位置被视为歧义：
/// - 直接作为 NOT 或量词的操作数；
/// - 优先级低于父运算符，或与父运算符同级但不是同一个运算符
///   （如 `A OR B XOR C`）；
/// - 位于 `->`/`<->`/`==` 的右侧（如 `A -> B AND C`），或其左侧本身
///   也是蕴含/等价（如 `A -> B <-> C`）。
///
/// 结构残缺的量词使 `ok` 为假但不算歧义。
pub fn check_ambiguous_expression(node: &Node) -> (bool, bool) {
    match find_ambiguity(node) {
        Some(Finding::Ambiguous) => (false, true),
        Some(Finding::Malformed) => (false, false),
        None => (true, false),
    }
}

enum Finding {
    Ambiguous,
    Malformed,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

fn find_ambiguity(node: &Node) -> Option<Finding> {
    match &node.kind {
        NodeKind::Var(_) | NodeKind::Bool(_) => None,
        NodeKind::Assign(_, expr) => find_ambiguity(expr),
        NodeKind::Not(expr) => {
            if is_bare_connective(expr) {
                return Some(Finding::Ambiguous);
            }
            find_ambiguity(expr)
        }
        NodeKind::Quantified(_, _, body) => match body {
            Some(body) if is_bare_connective(body) => Some(Finding::Ambiguous),
            Some(body) => find_ambiguity(body),
            None => Some(Finding::Malformed),
        },
        NodeKind::Binary(op, left, right) => {
            if needs_grouping(*op, left, Side::Left) || needs_grouping(*op, right, Side::Right) {
                return Some(Finding::Ambiguous);
            }
            find_ambiguity(left).or_else(|| find_ambiguity(right))
        }
    }
}

fn is_bare_connective(node: &Node) -> bool {
    !node.parenthesized && node.binary_op().is_some()
}

fn needs_grouping(parent: BinaryOp, child: &Node, side: Side) -> bool {
    if child.parenthesized {
        return false;
    }
    let Some(child_op) = child.binary_op() else {
        return false;
    };

    let (pp, cp) = (parent.precedence(), child_op.precedence());
    if cp < pp || (cp == pp && child_op != parent) {
        return true;
    }

    let parent_is_conditional = pp <= BinaryOp::Implies.precedence();
    match side {
        Side::Right => parent_is_conditional,
        Side::Left => parent_is_conditional && cp <= BinaryOp::Implies.precedence(),
    }
}

/// 全括号形式：根运算符的每个操作数都加括号，更深层的每个连接词子表达式
/// 也各自加括号，例如 `A -> B AND C` 得到 `(A) -> (B AND C)`
pub fn generate_parenthesized_expression(node: &Node) -> String {
    match &node.kind {
        NodeKind::Assign(name, expr) => format!("{} = {}", name, generate_parenthesized_expression(expr)),
        NodeKind::Not(expr) => format!("NOT ({})", grouped(expr)),
        NodeKind::Quantified(q, var, Some(body)) => format!("{} {} ({})", q.keyword(), var, grouped(body)),
        NodeKind::Binary(op, left, right) => {
            format!("({}) {} ({})", grouped(left), op.symbol(), grouped(right))
        }
        _ => grouped(node),
    }
}

/// 内部子表达式：叶子原样输出，连接词的非叶子操作数加括号
fn grouped(node: &Node) -> String {
    match &node.kind {
        NodeKind::Var(name) => name.clone(),
        NodeKind::Bool(value) => bool_text(*value).to_string(),
        NodeKind::Assign(name, expr) => format!("{} = {}", name, grouped(expr)),
        NodeKind::Not(expr) => format!("NOT {}", operand(expr)),
        NodeKind::Quantified(q, var, body) => match body {
            Some(body) => format!("{} {} {}", q.keyword(), var, operand(body)),
            None => format!("{} {}", q.keyword(), var),
        },
        NodeKind::Binary(op, left, right) => {
            format!("{} {} {}", operand(left), op.symbol(), operand(right))
        }
    }
}

fn operand(node: &Node) -> String {
    match node.precedence() {
        Some(p) if p < UNARY_PRECEDENCE => format!("({})", grouped(node)),
        _ => grouped(node),
    }
}
