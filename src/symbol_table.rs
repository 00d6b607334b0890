//! 符号表：变量名到布尔值的绑定
//!
//! `TRUE` 与 `FALSE` 是内建的只读绑定，改写它们会被拒绝。

use std::collections::HashMap;

use tracing::debug;

use crate::error::{LogicError, LogicResult};

/// 内建常量名
pub const RESERVED_NAMES: [&str; 2] = ["TRUE", "FALSE"];

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub value: bool,
    /// 是否已被赋予真实的值（预处理插入的占位符为 false）
    pub defined: bool,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    /// 插入顺序，用于稳定地输出
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            symbols: HashMap::new(),
            order: Vec::new(),
        };
        table.insert("TRUE", true, true);
        table.insert("FALSE", false, true);
        table
    }

    pub fn is_reserved(name: &str) -> bool {
        RESERVED_NAMES.contains(&name)
    }

    /// 更新已有绑定或插入新绑定
    pub fn add_or_update(&mut self, name: &str, value: bool) -> LogicResult<()> {
        if Self::is_reserved(name) {
            return Err(LogicError::ReservedSymbol(name.to_string()));
        }
        debug!(name, value, "binding symbol");
        self.insert(name, value, true);
        Ok(())
    }

    /// 仅在变量不存在时插入占位绑定（未定义，值为 false）
    pub fn declare(&mut self, name: &str) -> LogicResult<()> {
        if Self::is_reserved(name) {
            return Err(LogicError::ReservedSymbol(name.to_string()));
        }
        if !self.symbols.contains_key(name) {
            self.insert(name, false, false);
        }
        Ok(())
    }

    /// 已定义变量的值；不存在或只是占位时返回 `None`
    pub fn get(&self, name: &str) -> Option<bool> {
        self.symbols
            .get(name)
            .filter(|symbol| symbol.defined)
            .map(|symbol| symbol.value)
    }

    /// 原始条目，可以区分“不存在”与“存在但未定义”
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// 用户变量（不含内建常量），按首次插入顺序
    pub fn user_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.order
            .iter()
            .filter(|name| !Self::is_reserved(name))
            .filter_map(|name| self.symbols.get(name))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn insert(&mut self, name: &str, value: bool, defined: bool) {
        match self.symbols.get_mut(name) {
            Some(symbol) => {
                symbol.value = value;
                symbol.defined = defined;
            }
            None => {
                self.order.push(name.to_string());
                self.symbols.insert(
                    name.to_string(),
                    Symbol {
                        name: name.to_string(),
                        value,
                        defined,
                    },
                );
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
