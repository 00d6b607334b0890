//! 逻辑定律改写
//!
//! 后序遍历：先改写子树，再在当前节点上应用定律。每条定律生效时向
//! 求值日志追加一步。每个节点只改写一次，定律新构造出的节点不再参与
//! 本轮改写，结果树的规模与输入成线性或有界倍数关系。

use std::rc::Rc;

use tracing::debug;

use crate::ast::{BinaryOp, Node, NodeKind, NodeRef};
use crate::trace::{self, EvaluationLog};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// 是否对 AND/OR 做左右交换（只影响日志与指令顺序，不影响真值）
    pub commutative: bool,
}

pub fn apply_logical_laws(node: &NodeRef, options: RewriteOptions, log: &mut EvaluationLog) -> NodeRef {
    let before = log.len();
    let rewritten = Rewriter { options, log }.rewrite(node);
    debug!(tree = %rewritten, steps = log.len() - before, "applied logical laws");
    rewritten
}

struct Rewriter<'a> {
    options: RewriteOptions,
    log: &'a mut EvaluationLog,
}

fn build(kind: NodeKind, parenthesized: bool) -> NodeRef {
    Rc::new(Node { kind, parenthesized })
}

impl Rewriter<'_> {
    fn rewrite(&mut self, node: &NodeRef) -> NodeRef {
        match &node.kind {
            NodeKind::Var(_) | NodeKind::Bool(_) => Rc::clone(node),
            NodeKind::Assign(name, expr) => {
                let expr2 = self.rewrite(expr);
                if Rc::ptr_eq(&expr2, expr) {
                    Rc::clone(node)
                } else {
                    node.with_kind(NodeKind::Assign(name.clone(), expr2))
                }
            }
            NodeKind::Quantified(q, var, body) => match body {
                Some(body) => {
                    let body2 = self.rewrite(body);
                    if Rc::ptr_eq(&body2, body) {
                        Rc::clone(node)
                    } else {
                        node.with_kind(NodeKind::Quantified(*q, var.clone(), Some(body2)))
                    }
                }
                None => Rc::clone(node),
            },
            NodeKind::Not(expr) => {
                let expr2 = self.rewrite(expr);
                match self.reduce_not(&expr2, node.parenthesized) {
                    Some(reduced) => reduced,
                    None if Rc::ptr_eq(&expr2, expr) => Rc::clone(node),
                    None => node.with_kind(NodeKind::Not(expr2)),
                }
            }
            NodeKind::Binary(op, left, right) => {
                let left2 = self.rewrite(left);
                let right2 = self.rewrite(right);
                match self.reduce_binary(*op, &left2, &right2, node.parenthesized) {
                    Some(reduced) => reduced,
                    None if Rc::ptr_eq(&left2, left) && Rc::ptr_eq(&right2, right) => Rc::clone(node),
                    None => node.with_kind(NodeKind::Binary(*op, left2, right2)),
                }
            }
        }
    }

    /// 德摩根定律；不适用时返回 `None`
    fn reduce_not(&mut self, operand: &NodeRef, parenthesized: bool) -> Option<NodeRef> {
        let (dual, a, b) = match &operand.kind {
            NodeKind::Binary(BinaryOp::And, a, b) => (BinaryOp::Or, a, b),
            NodeKind::Binary(BinaryOp::Or, a, b) => (BinaryOp::And, a, b),
            _ => return None,
        };
        self.log.push(trace::DE_MORGAN);
        Some(build(
            NodeKind::Binary(dual, Node::not(Rc::clone(a)), Node::not(Rc::clone(b))),
            parenthesized,
        ))
    }

    fn reduce_binary(
        &mut self,
        op: BinaryOp,
        left: &NodeRef,
        right: &NodeRef,
        parenthesized: bool,
    ) -> Option<NodeRef> {
        if let (Some(l), Some(r)) = (left.as_bool(), right.as_bool()) {
            let value = op.apply(l, r);
            self.log.push(trace::folded(op, l, r, value));
            return Some(Node::boolean(value));
        }

        match op {
            BinaryOp::Implies => {
                self.log.push(trace::IMPLICATION);
                let not_left = Node::not(Rc::clone(left));
                Some(build(NodeKind::Binary(BinaryOp::Or, not_left, Rc::clone(right)), parenthesized))
            }
            BinaryOp::Iff | BinaryOp::Equiv => {
                self.log.push(trace::IFF_LAW);
                let forward = Node::implies(Rc::clone(left), Rc::clone(right));
                let backward = Node::implies(Rc::clone(right), Rc::clone(left));
                Some(build(NodeKind::Binary(BinaryOp::And, forward, backward), parenthesized))
            }
            BinaryOp::And => match &right.kind {
                NodeKind::Binary(BinaryOp::Or, b, c) => {
                    self.log.push(trace::DISTRIBUTIVE);
                    let ab = Node::and(Rc::clone(left), Rc::clone(b));
                    let ac = Node::and(Rc::clone(left), Rc::clone(c));
                    Some(build(NodeKind::Binary(BinaryOp::Or, ab, ac), parenthesized))
                }
                _ => self.swap(op, left, right, parenthesized),
            },
            BinaryOp::Or => self.swap(op, left, right, parenthesized),
            BinaryOp::Xor | BinaryOp::Xnor => None,
        }
    }

    fn swap(&mut self, op: BinaryOp, left: &NodeRef, right: &NodeRef, parenthesized: bool) -> Option<NodeRef> {
        if !self.options.commutative {
            return None;
        }
        self.log.push(trace::COMMUTATIVE);
        Some(build(
            NodeKind::Binary(op, Rc::clone(right), Rc::clone(left)),
            parenthesized,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use std::collections::HashMap;

    fn truth(node: &Node, env: &HashMap<String, bool>) -> bool {
        match &node.kind {
            NodeKind::Var(name) => env[name],
            NodeKind::Bool(value) => *value,
            NodeKind::Not(expr) => !truth(expr, env),
            NodeKind::Binary(op, l, r) => op.apply(truth(l, env), truth(r, env)),
            NodeKind::Assign(_, expr) => truth(expr, env),
            NodeKind::Quantified(..) => panic!("quantifiers have no truth value"),
        }
    }

    fn assert_equivalent(source: &str, options: RewriteOptions) -> NodeRef {
        let tree = parse_line(source).unwrap();
        let mut log = EvaluationLog::new();
        let rewritten = apply_logical_laws(&tree, options, &mut log);
        let vars = tree.variables();
        for bits in 0..(1u32 << vars.len()) {
            let env: HashMap<String, bool> = vars
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), bits & (1 << i) != 0))
                .collect();
            assert_eq!(
                truth(&tree, &env),
                truth(&rewritten, &env),
                "{} vs {} under {:?}",
                tree,
                rewritten,
                env
            );
        }
        rewritten
    }

    #[test]
    fn test_de_morgan() {
        let tree = parse_line("NOT (A AND B)").unwrap();
        let mut log = EvaluationLog::new();
        let rewritten = apply_logical_laws(&tree, RewriteOptions::default(), &mut log);
        let expected = Node::or(Node::not(Node::var("A")), Node::not(Node::var("B")));
        assert!(rewritten.same_shape(&expected));
        assert_eq!(log.steps()[0].text(), trace::DE_MORGAN);
    }

    #[test]
    fn test_distributive() {
        let rewritten = assert_equivalent("A AND (B OR C)", RewriteOptions::default());
        assert!(rewritten.same_shape(&Node::or(
            Node::and(Node::var("A"), Node::var("B")),
            Node::and(Node::var("A"), Node::var("C")),
        )));
    }

    #[test]
    fn test_implication_and_iff_are_eliminated() {
        let rewritten = assert_equivalent("A -> B", RewriteOptions::default());
        assert!(rewritten.same_shape(&Node::or(Node::not(Node::var("A")), Node::var("B"))));

        let rewritten = assert_equivalent("A <-> B", RewriteOptions::default());
        assert!(rewritten.same_shape(&Node::and(
            Node::implies(Node::var("A"), Node::var("B")),
            Node::implies(Node::var("B"), Node::var("A")),
        )));

        for source in ["A == B", "(A -> B) <-> NOT (C OR A)", "NOT (A XOR B) -> C XNOR A"] {
            let rewritten = assert_equivalent(source, RewriteOptions::default());
            let printed = rewritten.to_string();
            assert!(!printed.contains("<->") && !printed.contains("=="), "{}", printed);
        }
    }

    #[test]
    fn test_built_nodes_are_not_rewritten_again() {
        let rewritten = assert_equivalent("NOT (A OR (B AND C))", RewriteOptions::default());
        assert!(rewritten.same_shape(&Node::and(
            Node::not(Node::var("A")),
            Node::not(Node::and(Node::var("B"), Node::var("C"))),
        )));
    }

    #[test]
    fn test_iff_chain_stays_bounded() {
        let tree = parse_line("((((A <-> B) <-> C) <-> D) <-> A) <-> B").unwrap();
        let mut log = EvaluationLog::new();
        let rewritten = apply_logical_laws(&tree, RewriteOptions::default(), &mut log);
        // 每层 IFF 把两侧各复制一次：3 + 2 * (左 + 右)
        assert_eq!(rewritten.operator_count(), 93);
        assert_eq!(log.len(), 5);
        assert!(log.steps().iter().all(|step| step.text() == trace::IFF_LAW));
        assert_equivalent("((((A <-> B) <-> C) <-> D) <-> A) <-> B", RewriteOptions::default());
    }

    #[test]
    fn test_literal_folding() {
        let mut log = EvaluationLog::new();
        let tree = parse_line("TRUE -> FALSE").unwrap();
        let rewritten = apply_logical_laws(&tree, RewriteOptions::default(), &mut log);
        assert_eq!(rewritten.as_bool(), Some(false));
        assert_eq!(log.steps()[0].text(), "Folded constant: TRUE IMPLIES FALSE = FALSE");

        let tree = parse_line("FALSE == FALSE").unwrap();
        let rewritten = apply_logical_laws(&tree, RewriteOptions::default(), &mut log);
        assert_eq!(rewritten.as_bool(), Some(true));

        let tree = parse_line("TRUE XOR TRUE").unwrap();
        let rewritten = apply_logical_laws(&tree, RewriteOptions::default(), &mut log);
        assert_eq!(rewritten.as_bool(), Some(false));
    }

    #[test]
    fn test_commutative_swap_is_opt_in() {
        let tree = parse_line("A AND B").unwrap();
        let mut log = EvaluationLog::new();
        let untouched = apply_logical_laws(&tree, RewriteOptions::default(), &mut log);
        assert!(Rc::ptr_eq(&untouched, &tree));
        assert!(log.is_empty());

        let swapped = apply_logical_laws(&tree, RewriteOptions { commutative: true }, &mut log);
        assert_eq!(swapped.to_string(), "B AND A");
        assert!(log.contains(trace::COMMUTATIVE));

        assert_equivalent("A AND (B OR NOT C) -> C", RewriteOptions { commutative: true });
    }

    #[test]
    fn test_unchanged_subtrees_are_shared() {
        let tree = parse_line("X = A XOR (B -> C)").unwrap();
        let mut log = EvaluationLog::new();
        let rewritten = apply_logical_laws(&tree, RewriteOptions::default(), &mut log);
        let (NodeKind::Assign(_, before), NodeKind::Assign(_, after)) = (&tree.kind, &rewritten.kind) else {
            panic!("expected assignments");
        };
        let (NodeKind::Binary(_, a_before, _), NodeKind::Binary(_, a_after, _)) = (&before.kind, &after.kind) else {
            panic!("expected binary nodes");
        };
        assert!(Rc::ptr_eq(a_before, a_after));
    }
}
