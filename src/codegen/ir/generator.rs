//! IR 生成器主模块：语句入口与模块组装

use tracing::debug;

use crate::ast::NodeRef;
use crate::codegen::ir::context::IrGenerator;
use crate::codegen::ir::module::IrModule;
use crate::error::LogicResult;
use crate::symbol_table::SymbolTable;
use crate::trace;

impl IrGenerator {
    /// 发射一次 `puts` 调用并记录它将打印的行
    pub fn trace(&mut self, text: &str) {
        let constant = self.get_or_create_string_constant(text);
        self.emit_line(&format!("call i32 @puts(ptr {})", constant));
        self.trace_lines.push(text.to_string());
    }

    /// 按运行时的值在两条结果文本之间选择，随后输出一个空行
    fn trace_result(&mut self, operand: &str, value: bool) {
        let on_true = self.get_or_create_string_constant(&trace::result(true));
        let on_false = self.get_or_create_string_constant(&trace::result(false));
        let chosen = self.new_temp();
        self.emit_line(&format!(
            "{} = select i1 {}, ptr {}, ptr {}",
            chosen, operand, on_true, on_false
        ));
        self.emit_line(&format!("call i32 @puts(ptr {})", chosen));
        self.trace_lines.push(trace::result(value));
        self.trace("");
    }

    /// 生成一条语句。值已知时同时打印结果并返回它；
    /// 出错时丢弃本语句已生成的代码。
    pub fn lower_statement(&mut self, node: &NodeRef, table: &SymbolTable) -> LogicResult<Option<bool>> {
        let code_mark = self.code.len();
        let trace_mark = self.trace_lines.len();

        let generated = match self.generate_node(node, table) {
            Ok(generated) => generated,
            Err(e) => {
                self.code.truncate(code_mark);
                self.trace_lines.truncate(trace_mark);
                return Err(e);
            }
        };

        let value = generated.map(|v| {
            self.trace_result(&v.operand, v.value);
            v.value
        });
        debug!(statement = %node, ?value, "lowered statement to IR");
        Ok(value)
    }

    /// 组装完整模块
    pub fn finish(&self) -> IrModule {
        let mut out = String::new();
        out.push_str(&format!("; ModuleID = '{}'\n", self.module_name));
        out.push_str(&format!("source_filename = \"{}\"\n", self.module_name));
        out.push_str(&format!("target triple = \"{}\"\n\n", self.target_triple));

        let strings = self.get_string_declarations();
        if !strings.is_empty() {
            out.push_str(&strings);
            out.push('\n');
        }
        if !self.globals.is_empty() {
            for name in &self.globals {
                out.push_str(&format!("{} = global i1 false, align 1\n", IrGenerator::global_name(name)));
            }
            out.push('\n');
        }

        out.push_str("declare i32 @puts(ptr)\n\n");
        out.push_str("define i32 @main() {\n");
        out.push_str("entry:\n");
        out.push_str(&self.code);
        out.push_str("  ret i32 0\n");
        out.push_str("}\n");

        IrModule::new(self.module_name.clone(), out, self.trace_lines.clone())
    }
}
