use logos::Logos;
use crate::error::{LogicResult, lexer_error};
use crate::error::SourceLocation;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // 关键字
    #[token("AND")]
    And,
    #[token("OR")]
    Or,
    #[token("NOT")]
    Not,
    #[token("XOR")]
    Xor,
    #[token("XNOR")]
    Xnor,
    #[token("EXISTS")]
    Exists,
    #[token("FORALL")]
    Forall,
    #[token("TRUE")]
    True,
    #[token("FALSE")]
    False,

    // 运算符
    #[token("->")]
    #[token("IMPLIES")]
    Arrow,
    #[token("<->")]
    #[token("IFF")]
    DoubleArrow,
    #[token("==")]
    EqEq,
    #[token("=")]
    Assign,

    // 分隔符
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // 标识符
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // 换行（用于跟踪行号）
    #[token("\n")]
    Newline,

    // 输入结束哨兵，不会由 logos 产生
    Eof,
}

impl Token {
    /// 报错时展示的写法
    pub fn describe(&self) -> String {
        match self {
            Token::And => "AND".to_string(),
            Token::Or => "OR".to_string(),
            Token::Not => "NOT".to_string(),
            Token::Xor => "XOR".to_string(),
            Token::Xnor => "XNOR".to_string(),
            Token::Exists => "EXISTS".to_string(),
            Token::Forall => "FORALL".to_string(),
            Token::True => "TRUE".to_string(),
            Token::False => "FALSE".to_string(),
            Token::Arrow => "'->'".to_string(),
            Token::DoubleArrow => "'<->'".to_string(),
            Token::EqEq => "'=='".to_string(),
            Token::Assign => "'='".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Newline => "end of line".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenWithLocation {
    pub token: Token,
    pub loc: SourceLocation,
}

pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_line(source, 1)
    }

    /// 从指定行号开始计数（多语句驱动按行调用时使用）
    pub fn with_line(source: &'a str, line: usize) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            line,
            line_start: 0,
        }
    }

    pub fn tokenize(&mut self) -> LogicResult<Vec<TokenWithLocation>> {
        let mut tokens = Vec::new();

        while let Some(token_result) = self.inner.next() {
            let span = self.inner.span();
            let loc = SourceLocation {
                line: self.line,
                column: span.start - self.line_start + 1,
            };
            match token_result {
                Ok(Token::Newline) => {
                    // 不保留换行token
                    self.line += 1;
                    self.line_start = span.end;
                }
                Ok(token) => tokens.push(TokenWithLocation { token, loc }),
                Err(_) => {
                    let error_char = &self.source[span];
                    return Err(lexer_error(
                        loc.line,
                        loc.column,
                        format!("Unexpected character: '{}'", error_char),
                    ));
                }
            }
        }

        tokens.push(TokenWithLocation {
            token: Token::Eof,
            loc: SourceLocation {
                line: self.line,
                column: self.source.len() - self.line_start + 1,
            },
        });

        Ok(tokens)
    }
}

pub fn lex(source: &str) -> LogicResult<Vec<TokenWithLocation>> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}
