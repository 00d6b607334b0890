//! 结构化 IR 后端（LLVM IR 文本）
//!
//! 直接遍历表达式树而不经过三地址码。生成的程序运行时逐行打印
//! 与求值日志相同的步骤文本。

pub mod context;
mod expressions;
mod generator;
mod module;

pub use context::IrGenerator;
pub use expressions::IrValue;
pub use module::IrModule;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::parser::parse_line;
    use crate::symbol_table::SymbolTable;
    use crate::trace::{self, EvaluationLog};

    fn table_with(bindings: &[(&str, bool)]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (name, value) in bindings {
            table.add_or_update(name, *value).unwrap();
        }
        table
    }

    #[test]
    fn test_trace_matches_evaluator() {
        let mut table = table_with(&[("A", true), ("B", false), ("C", true)]);
        let mut ir = IrGenerator::new("logic_module", "x86_64-pc-linux-gnu");
        let mut log = EvaluationLog::new();

        for source in ["NOT (A AND B)", "A -> B", "C = A XNOR (B <-> C)", "A OR X"] {
            let tree = parse_line(source).unwrap();
            let lowered = ir.lower_statement(&tree, &table).unwrap();
            let evaluated = evaluate(&tree, &mut table, &mut log).unwrap().value();
            if let Some(value) = evaluated {
                log.push(trace::result(value));
            }
            assert_eq!(lowered, evaluated, "{}", source);
        }

        let module = ir.finish();
        assert_eq!(module.trace_text(), log.render_body());
    }

    #[test]
    fn test_values_are_baked_in() {
        let table = table_with(&[("A", true), ("B", false)]);
        let mut ir = IrGenerator::new("logic_module", "x86_64-pc-linux-gnu");
        assert_eq!(ir.lower_statement(&parse_line("A AND B").unwrap(), &table).unwrap(), Some(false));

        let text = ir.finish().text().to_string();
        assert!(text.starts_with("; ModuleID = 'logic_module'\n"));
        assert!(text.contains("target triple = \"x86_64-pc-linux-gnu\""));
        assert!(text.contains("%t0 = and i1 true, false"));
        assert!(text.contains("%t1 = select i1 %t0, ptr"));
        assert!(text.contains("declare i32 @puts(ptr)"));
        assert!(text.contains("define i32 @main() {"));
        assert!(text.trim_end().ends_with("ret i32 0\n}"));
    }

    #[test]
    fn test_assignment_stores_global() {
        let table = table_with(&[("A", true)]);
        let mut ir = IrGenerator::new("m", "x86_64-pc-linux-gnu");
        ir.lower_statement(&parse_line("B = NOT A").unwrap(), &table).unwrap();
        let text = ir.finish().text().to_string();
        assert!(text.contains("@v_B = global i1 false, align 1"));
        assert!(text.contains("store i1 %t0, ptr @v_B, align 1"));
    }

    #[test]
    fn test_undefined_variable_has_no_result() {
        let table = SymbolTable::new();
        let mut ir = IrGenerator::new("m", "x86_64-pc-linux-gnu");
        assert_eq!(ir.lower_statement(&parse_line("X AND TRUE").unwrap(), &table).unwrap(), None);
        let module = ir.finish();
        assert_eq!(module.trace_lines(), &["Warning: Undefined variable 'X'".to_string()]);
        assert!(!module.text().contains("select"));
    }

    #[test]
    fn test_quantifier_is_unevaluated() {
        let table = SymbolTable::new();
        let mut ir = IrGenerator::new("m", "x86_64-pc-linux-gnu");
        assert_eq!(ir.lower_statement(&parse_line("EXISTS x x").unwrap(), &table).unwrap(), None);
        assert_eq!(
            ir.finish().trace_text(),
            "Warning: Cannot evaluate quantified expression 'EXISTS x'\n"
        );
    }
}
