//! lecc 集成测试
//!
//! 通过公开的库接口跑完整的多语句流水线，不调用外部汇编器/链接器。

use lecc::codegen::OptLevel;
use lecc::evaluator::evaluate;
use lecc::rewrite::{RewriteOptions, apply_logical_laws};
use lecc::semantic::DiagnosticKind;
use lecc::tac::generate_three_address_code;
use lecc::{
    Backends, CompilationOutput, CompileOptions, Compiler, EvaluationLog, LogicError, Node, StatementOutcome,
    SymbolTable, parse_line,
};

fn compile(source: &str) -> CompilationOutput {
    Compiler::new().compile_source(source)
}

fn table_with(bindings: &[(&str, bool)]) -> SymbolTable {
    let mut table = SymbolTable::new();
    for (name, value) in bindings {
        table.add_or_update(name, *value).unwrap();
    }
    table
}

/// 改写后再求值
fn rewrite_and_evaluate(source: &str, table: &mut SymbolTable) -> Option<bool> {
    let mut log = EvaluationLog::new();
    let tree = apply_logical_laws(&parse_line(source).unwrap(), RewriteOptions::default(), &mut log);
    evaluate(&tree, table, &mut log).unwrap().value()
}

#[test]
fn test_assignments_then_conjunction() {
    let output = compile("A = TRUE\nB = FALSE\nA AND B\n");
    assert_eq!(output.symbol_table.get("A"), Some(true));
    assert_eq!(output.symbol_table.get("B"), Some(false));
    assert_eq!(output.results().last(), Some(&Some(false)));
    assert!(output.log.contains("Result: FALSE"));
    assert!(!output.has_errors());
}

#[test]
fn test_de_morgan_scenario() {
    let output = compile("A = TRUE\nB = FALSE\nNOT (A AND B)\n");
    assert_eq!(output.results()[2], Some(true));
    assert!(output.log.contains("Applied De Morgan's Law"));

    let mut log = EvaluationLog::new();
    let rewritten = apply_logical_laws(
        &parse_line("NOT (A AND B)").unwrap(),
        RewriteOptions::default(),
        &mut log,
    );
    let expected = Node::or(Node::not(Node::var("A")), Node::not(Node::var("B")));
    assert!(rewritten.same_shape(&expected), "{}", rewritten);
}

#[test]
fn test_ambiguous_implication() {
    let output = compile("A = TRUE\nB = TRUE\nC = TRUE\nA -> B AND C\n");
    match &output.statements[3].outcome {
        StatementOutcome::Failed(LogicError::Semantic(diag)) => {
            assert_eq!(diag.kind, DiagnosticKind::AmbiguousExpression);
            assert!(diag.suggested_rewrite.as_deref().unwrap().contains("(A) -> (B AND C)"));
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
    assert!(output.has_errors());
}

#[test]
fn test_undefined_variable_is_only_a_warning() {
    // 故意宽松：未定义变量不阻止后续语句
    let output = compile("X AND TRUE\nA = TRUE\nNOT A\n");
    match &output.statements[0].outcome {
        StatementOutcome::Unevaluated(diag) => assert_eq!(diag.kind, DiagnosticKind::UndefinedVariable),
        other => panic!("expected a warning, got {:?}", other),
    }
    assert!(output.log.contains("Warning: Undefined variable 'X'"));
    assert_eq!(output.results(), vec![None, Some(true), Some(false)]);
    assert!(!output.has_errors());
    assert_eq!(output.warnings().count(), 1);
}

#[test]
fn test_logical_law_truth_tables() {
    for a in [false, true] {
        for b in [false, true] {
            let mut table = table_with(&[("A", a), ("B", b)]);
            let not_and = rewrite_and_evaluate("NOT (A AND B)", &mut table);
            assert_eq!(not_and, rewrite_and_evaluate("(NOT A) OR (NOT B)", &mut table));
            let not_or = rewrite_and_evaluate("NOT (A OR B)", &mut table);
            assert_eq!(not_or, rewrite_and_evaluate("(NOT A) AND (NOT B)", &mut table));

            let implies = rewrite_and_evaluate("A -> B", &mut table);
            assert_eq!(implies, rewrite_and_evaluate("(NOT A) OR B", &mut table));
            assert_eq!(implies, Some(!a || b));

            assert_eq!(rewrite_and_evaluate("A <-> B", &mut table), Some(a == b));
            assert_eq!(rewrite_and_evaluate("A == B", &mut table), Some(a == b));
        }
    }
}

#[test]
fn test_distributive_law_preserves_truth() {
    for bits in 0..8u8 {
        let (a, b, c) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
        let mut table = table_with(&[("A", a), ("B", b), ("C", c)]);
        assert_eq!(rewrite_and_evaluate("A AND (B OR C)", &mut table), Some(a && (b || c)));
    }
}

#[test]
fn test_tac_instruction_count() {
    for source in ["A", "NOT A", "(A AND B) OR NOT C", "A XNOR (B -> (C <-> A))"] {
        let tree = parse_line(source).unwrap();
        let code = generate_three_address_code(&tree).unwrap();
        assert_eq!(code.len(), tree.operator_count(), "{}", source);
    }
}

#[test]
fn test_print_then_reparse() {
    for source in [
        "A AND B OR C",
        "NOT (A OR B) AND C",
        "A -> B -> C",
        "(A -> B) -> C",
        "A XOR (B XOR C)",
        "X = NOT A <-> B",
        "FORALL x (x OR NOT x)",
    ] {
        let tree = parse_line(source).unwrap();
        let printed = tree.to_string();
        let reparsed = parse_line(&printed).unwrap();
        assert!(tree.same_shape(&reparsed), "{} -> {}", source, printed);
        assert_eq!(reparsed.to_string(), printed);
    }
}

#[test]
fn test_ir_program_prints_the_log() {
    let source = "A = TRUE\nB = FALSE\nC = A -> B\nNOT (A AND B)\n(A XOR B) <-> C\nY AND A\n";
    let output = compile(source);
    let ir = output.ir.as_ref().unwrap();
    assert_eq!(ir.trace_text(), output.log.render_body());
    assert!(ir.text().contains("@v_C = global i1 false, align 1"));
}

#[test]
fn test_trace_file_layout() {
    let output = compile("A = TRUE\nNOT A\n");
    let trace = output.log.render_trace_file();
    assert!(trace.starts_with(
        "Logical Expression Evaluation\n---------------------------\n\nStarting evaluation of multiple expressions\n"
    ));
    assert!(trace.contains("Evaluating expression: A = TRUE\nAssigned A = TRUE\nResult: TRUE\n\n"));
    assert!(trace.contains("Result: FALSE\n\nCompleted evaluation of all expressions\n"));
}

#[test]
fn test_optimization_levels_shrink_assembly() {
    let source = "A = TRUE\nB = FALSE\nA AND B\nNOT (A OR B)\nA <-> B\n";
    let mut sizes = Vec::new();
    for level in [OptLevel::O0, OptLevel::O1, OptLevel::O2] {
        let options = CompileOptions {
            opt_level: level,
            backends: Backends::Asm,
            ..CompileOptions::default()
        };
        let asm = Compiler::with_options(options).compile_source(source).asm.unwrap();
        assert!(asm.contains(&format!("optimization level {}", level.level())));
        sizes.push(asm.lines().count());
    }
    assert!(sizes[0] > sizes[1], "{:?}", sizes);
    assert!(sizes[1] >= sizes[2], "{:?}", sizes);
}

#[test]
fn test_iff_chain_compiles() {
    let output = compile("A = TRUE\nB = TRUE\nC = TRUE\nD = TRUE\n((((A <-> B) <-> C) <-> D) <-> A) <-> B\n");
    assert_eq!(output.results()[4], Some(true));
    assert!(!output.has_errors());
    assert_eq!(output.log.steps().iter().filter(|s| s.text().starts_with("Applied IFF Law")).count(), 5);
    assert_eq!(output.ir.as_ref().unwrap().trace_text(), output.log.render_body());
}

#[test]
fn test_overly_deep_statement_only_fails_itself() {
    let source = format!("A = TRUE\n{}A\nNOT A\n", "NOT ".repeat(20_000));
    let output = compile(&source);
    assert!(matches!(output.statements[1].outcome, StatementOutcome::Failed(ref e) if e.is_parse_error()));
    assert_eq!(output.results(), vec![Some(true), None, Some(false)]);
}

#[test]
fn test_quantifier_parses_but_does_not_evaluate() {
    let output = compile("FORALL x (x OR NOT x)\n");
    match &output.statements[0].outcome {
        StatementOutcome::Unevaluated(diag) => assert_eq!(diag.kind, DiagnosticKind::InvalidQuantifier),
        other => panic!("expected quantifier warning, got {:?}", other),
    }
    assert!(output.tac.is_empty());
}
