//! 生成完毕的 IR 模块

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::LogicResult;

#[derive(Debug, Clone, PartialEq)]
pub struct IrModule {
    pub name: String,
    text: String,
    trace_lines: Vec<String>,
}

impl IrModule {
    pub(crate) fn new(name: String, text: String, trace_lines: Vec<String>) -> Self {
        Self { name, text, trace_lines }
    }

    /// `.ll` 文本
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 程序运行时打印到标准输出的完整内容
    pub fn trace_text(&self) -> String {
        let mut out = String::new();
        for line in &self.trace_lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn trace_lines(&self) -> &[String] {
        &self.trace_lines
    }

    pub fn write_text(&self, path: &Path) -> LogicResult<()> {
        fs::write(path, &self.text)?;
        info!(path = %path.display(), "wrote IR module");
        Ok(())
    }
}
