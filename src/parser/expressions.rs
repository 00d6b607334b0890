//! 表达式解析（按优先级由低到高）

use crate::ast::{BinaryOp, Node, NodeRef};
use crate::error::LogicResult;
use crate::lexer::Token;
use super::Parser;

/// 解析表达式（入口点）
pub fn parse_expression(parser: &mut Parser) -> LogicResult<NodeRef> {
    parse_iff(parser)
}

/// 解析 `<->` / `==`，左结合
pub fn parse_iff(parser: &mut Parser) -> LogicResult<NodeRef> {
    let mut left = parse_implies(parser)?;
    let mut levels = 0;

    loop {
        let op = match parser.current_token() {
            Token::DoubleArrow => BinaryOp::Iff,
            Token::EqEq => BinaryOp::Equiv,
            _ => break,
        };
        parser.advance();
        parser.enter()?;
        levels += 1;
        let right = parse_implies(parser)?;
        left = Node::binary(op, left, right);
    }

    parser.leave(levels);
    Ok(left)
}

/// 解析 `->`，右结合
pub fn parse_implies(parser: &mut Parser) -> LogicResult<NodeRef> {
    let left = parse_or(parser)?;

    if parser.match_token(&Token::Arrow) {
        parser.enter()?;
        let right = parse_implies(parser)?;
        parser.leave(1);
        return Ok(Node::implies(left, right));
    }

    Ok(left)
}

/// 解析 OR / XOR / XNOR（同一优先级），左结合
pub fn parse_or(parser: &mut Parser) -> LogicResult<NodeRef> {
    let mut left = parse_and(parser)?;
    let mut levels = 0;

    loop {
        let op = match parser.current_token() {
            Token::Or => BinaryOp::Or,
            Token::Xor => BinaryOp::Xor,
            Token::Xnor => BinaryOp::Xnor,
            _ => break,
        };
        parser.advance();
        parser.enter()?;
        levels += 1;
        let right = parse_and(parser)?;
        left = Node::binary(op, left, right);
    }

    parser.leave(levels);
    Ok(left)
}

/// 解析 AND
pub fn parse_and(parser: &mut Parser) -> LogicResult<NodeRef> {
    let mut left = parse_unary(parser)?;
    let mut levels = 0;

    while parser.match_token(&Token::And) {
        parser.enter()?;
        levels += 1;
        let right = parse_unary(parser)?;
        left = Node::and(left, right);
    }

    parser.leave(levels);
    Ok(left)
}

/// 解析一元表达式：NOT 与量词
pub fn parse_unary(parser: &mut Parser) -> LogicResult<NodeRef> {
    if matches!(parser.current_token(), Token::Not | Token::Exists | Token::Forall) {
        parser.enter()?;
        let node = parse_prefixed(parser)?;
        parser.leave(1);
        return Ok(node);
    }
    parse_primary(parser)
}

fn parse_prefixed(parser: &mut Parser) -> LogicResult<NodeRef> {
    match parser.current_token() {
        Token::Not => {
            parser.advance();
            let operand = parse_unary(parser)?;
            Ok(Node::not(operand))
        }
        Token::Exists => {
            parser.advance();
            let var = parser.consume_identifier("Expected variable after EXISTS")?;
            let body = parse_unary(parser)?;
            Ok(Node::exists(var, body))
        }
        Token::Forall => {
            parser.advance();
            let var = parser.consume_identifier("Expected variable after FORALL")?;
            let body = parse_unary(parser)?;
            Ok(Node::forall(var, body))
        }
        _ => parse_primary(parser),
    }
}

/// 解析基本表达式
pub fn parse_primary(parser: &mut Parser) -> LogicResult<NodeRef> {
    match parser.current_token().clone() {
        Token::Identifier(name) => {
            parser.advance();
            Ok(Node::var(name))
        }
        Token::True => {
            parser.advance();
            Ok(Node::boolean(true))
        }
        Token::False => {
            parser.advance();
            Ok(Node::boolean(false))
        }
        Token::LParen => {
            parser.advance();
            parser.enter()?;
            let inner = parse_expression(parser)?;
            parser.consume(&Token::RParen, "Expected ')'")?;
            parser.leave(1);
            Ok(Node::parenthesize(&inner))
        }
        other => Err(parser.error(&format!("Expected expression, found {}", other.describe()))),
    }
}
