//! 逻辑表达式语法分析器
//!
//! 每条语句单独解析：`parse_line` 把一行源码解析为一棵表达式树。
//! 解析结果通过返回值传出，不经过任何全局状态。

mod expressions;

use crate::ast::{Node, NodeRef};
use crate::error::{LogicError, LogicResult, SourceLocation, parser_error};
use crate::lexer::{Lexer, Token, TokenWithLocation};

/// 表达式树允许的最大嵌套层数
pub const MAX_NESTING_DEPTH: usize = 256;

/// 语法分析器
pub struct Parser {
    /// 令牌流（以 `Token::Eof` 结尾）
    pub tokens: Vec<TokenWithLocation>,
    /// 当前解析位置
    pub pos: usize,
    /// 当前嵌套层数
    depth: usize,
}

impl Parser {
    /// 创建新的语法分析器
    pub fn new(tokens: Vec<TokenWithLocation>) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    /// 解析一条语句：`IDENT '=' expr | expr`，并要求之后没有多余的令牌
    pub fn parse_statement(&mut self) -> LogicResult<NodeRef> {
        let statement = if self.is_assignment_start() {
            let name = self.consume_identifier("Expected variable name")?;
            self.consume(&Token::Assign, "Expected '='")?;
            let value = expressions::parse_expression(self)?;
            Node::assign(name, value)
        } else {
            expressions::parse_expression(self)?
        };

        if !self.is_at_end() {
            let found = self.current_token().describe();
            return Err(self.error(&format!("Unexpected {} after expression", found)));
        }
        Ok(statement)
    }

    fn is_assignment_start(&self) -> bool {
        matches!(self.current_token(), Token::Identifier(_))
            && matches!(self.peek_token(), Token::Assign)
    }

    // 辅助方法
    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn current_token(&self) -> &Token {
        self.token_at(self.pos)
    }

    fn peek_token(&self) -> &Token {
        self.token_at(self.pos + 1)
    }

    fn token_at(&self, index: usize) -> &Token {
        self.tokens
            .get(index)
            .or_else(|| self.tokens.last())
            .map_or(&Token::Eof, |t| &t.token)
    }

    fn current_loc(&self) -> SourceLocation {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(SourceLocation { line: 1, column: 1 }, |t| t.loc)
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.current_token() == token
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token: &Token, message: &str) -> LogicResult<Token> {
        if self.check(token) {
            Ok(self.advance())
        } else {
            let found = self.current_token().describe();
            Err(self.error(&format!("{}, found {}", message, found)))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> LogicResult<String> {
        match self.current_token().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(&format!("{}, found {}", message, other.describe()))),
        }
    }

    /// 进入一层嵌套，超过上限时报错
    fn enter(&mut self) -> LogicResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(&format!(
                "Expression nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    fn error(&self, message: &str) -> LogicError {
        let loc = self.current_loc();
        parser_error(loc.line, loc.column, message)
    }
}

/// 解析一行源码
pub fn parse_line(text: &str) -> LogicResult<NodeRef> {
    parse_line_at(text, 1)
}

/// 解析一行源码，错误位置从 `line` 行开始计数
pub fn parse_line_at(text: &str, line: usize) -> LogicResult<NodeRef> {
    let tokens = Lexer::with_line(text, line).tokenize()?;
    let mut parser = Parser::new(tokens);
    parser.parse_statement()
}
