//! IR 生成上下文和状态管理
use std::collections::HashMap;

/// IR 生成器核心上下文
#[derive(Debug)]
pub struct IrGenerator {
    pub module_name: String,
    pub target_triple: String,
    /// `@main` 函数体
    pub code: String,
    pub indent: usize,
    pub temp_counter: usize,
    pub global_strings: HashMap<String, String>,
    /// 按创建顺序保存，声明输出稳定
    pub string_order: Vec<String>,
    pub global_counter: usize,
    /// 被赋值过的用户变量，每个对应一个 `i1` 全局变量
    pub globals: Vec<String>,
    /// 运行时将打印的每一行
    pub trace_lines: Vec<String>,
}

impl IrGenerator {
    pub fn new(module_name: impl Into<String>, target_triple: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            target_triple: target_triple.into(),
            code: String::new(),
            indent: 1,
            temp_counter: 0,
            global_strings: HashMap::new(),
            string_order: Vec::new(),
            global_counter: 0,
            globals: Vec::new(),
            trace_lines: Vec::new(),
        }
    }

    /// 发射一行代码到函数体
    pub fn emit_line(&mut self, line: &str) {
        if !line.is_empty() {
            self.code.push_str(&"  ".repeat(self.indent));
        }
        self.code.push_str(line);
        self.code.push('\n');
    }

    /// 创建新的临时变量
    pub fn new_temp(&mut self) -> String {
        let temp = format!("%t{}", self.temp_counter);
        self.temp_counter += 1;
        temp
    }

    /// 获取或创建字符串常量
    pub fn get_or_create_string_constant(&mut self, s: &str) -> String {
        if let Some(name) = self.global_strings.get(s) {
            return name.clone();
        }

        let name = format!("@.str.{}", self.global_counter);
        self.global_counter += 1;
        self.global_strings.insert(s.to_string(), name.clone());
        self.string_order.push(s.to_string());
        name
    }

    /// 获取字符串常量的声明
    pub fn get_string_declarations(&self) -> String {
        let mut result = String::new();
        for s in &self.string_order {
            let Some(name) = self.global_strings.get(s) else { continue };
            // UTF-8 字节数，+1 为结尾的 NUL
            let len = s.len() + 1;
            result.push_str(&format!(
                "{} = private unnamed_addr constant [{} x i8] c\"{}\\00\", align 1\n",
                name,
                len,
                escape_llvm_string(s)
            ));
        }
        result
    }

    /// 全局变量名（用户变量加 `v_` 前缀）
    pub fn global_name(name: &str) -> String {
        format!("@v_{}", name)
    }

    pub fn declare_global(&mut self, name: &str) {
        if !self.globals.iter().any(|g| g == name) {
            self.globals.push(name.to_string());
        }
    }
}

/// LLVM IR 中特殊字符使用十六进制转义序列
pub fn escape_llvm_string(s: &str) -> String {
    s.replace('\\', "\\5C")
        .replace('"', "\\22")
        .replace('\n', "\\0A")
        .replace('\r', "\\0D")
        .replace('\t', "\\09")
        .replace('\0', "\\00")
}
