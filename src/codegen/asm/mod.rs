//! NASM x86-64 汇编后端
//!
//! 每个变量和临时变量占一个 `.bss` 单元；每条三地址指令展开为
//! 装载/运算/存储序列。每条语句结束时把结果放入 eax 并调用
//! `print_result`，打印 `TRUE` 或 `FALSE`。

pub mod inst;
pub mod optimize;

pub use inst::{AsmInst, Loc, LogicOp, Reg};
pub use optimize::{OptLevel, optimize};

use std::collections::HashSet;

use tracing::debug;

use crate::error::{LogicResult, codegen_error};
use crate::tac::{IntermediateCode, Operand, TacInstruction, TacOp};

const PRINT_RESULT: &str = "print_result";

/// 累积整个编译单元的 `_start` 主体
#[derive(Debug, Default)]
pub struct AsmGenerator {
    cells: Vec<String>,
    known_cells: HashSet<String>,
    body: Vec<AsmInst>,
    statement_count: usize,
}

impl AsmGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条语句。出错时本语句不留下任何指令。
    pub fn add_statement(&mut self, label: &str, code: &IntermediateCode) -> LogicResult<()> {
        let mut block = vec![AsmInst::Comment(format!(
            "statement {}: {}",
            self.statement_count + 1,
            label
        ))];
        let mut cells = Vec::new();

        for instr in &code.instructions {
            block.push(AsmInst::Comment(instr.to_string()));
            self.lower_instruction(instr, &mut block, &mut cells)?;
        }
        let result = self.operand(&code.result, &mut cells);
        block.push(AsmInst::mov(Loc::Reg(Reg::Eax), result));
        block.push(AsmInst::Call(PRINT_RESULT.to_string()));

        for cell in cells {
            if self.known_cells.insert(cell.clone()) {
                self.cells.push(cell);
            }
        }
        debug!(statement = label, instructions = block.len(), "lowered statement to assembly");
        self.body.extend(block);
        self.statement_count += 1;
        Ok(())
    }

    pub fn body(&self) -> &[AsmInst] {
        &self.body
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn statement_count(&self) -> usize {
        self.statement_count
    }

    pub fn optimized_body(&self, level: OptLevel) -> Vec<AsmInst> {
        optimize(self.body.clone(), level)
    }

    /// 生成完整的汇编源文件
    pub fn finish(&self, level: OptLevel) -> String {
        let body = self.optimized_body(level);
        let mut out = String::new();

        out.push_str(&format!("; lecc output, optimization level {}\n", level.level()));
        out.push_str("section .data\n");
        out.push_str("    true_msg db \"TRUE\", 10\n");
        out.push_str("    true_len equ $ - true_msg\n");
        out.push_str("    false_msg db \"FALSE\", 10\n");
        out.push_str("    false_len equ $ - false_msg\n\n");

        out.push_str("section .bss\n");
        for cell in &self.cells {
            out.push_str(&format!("    {} resd 1\n", cell));
        }
        out.push('\n');

        out.push_str("section .text\n");
        out.push_str("    global _start\n\n");
        out.push_str("_start:\n");
        for inst in &body {
            out.push_str(&format!("    {}\n", inst));
        }

        // exit(0)
        out.push_str("    mov rax, 60\n");
        out.push_str("    xor rdi, rdi\n");
        out.push_str("    syscall\n\n");

        out.push_str(&format!("{}:\n", PRINT_RESULT));
        out.push_str("    cmp eax, 0\n");
        out.push_str("    je .print_false\n");
        out.push_str("    mov rsi, true_msg\n");
        out.push_str("    mov rdx, true_len\n");
        out.push_str("    jmp .print_write\n");
        out.push_str(".print_false:\n");
        out.push_str("    mov rsi, false_msg\n");
        out.push_str("    mov rdx, false_len\n");
        out.push_str(".print_write:\n");
        out.push_str("    mov rax, 1\n");
        out.push_str("    mov rdi, 1\n");
        out.push_str("    syscall\n");
        out.push_str("    ret\n");
        out
    }

    fn operand(&self, operand: &Operand, cells: &mut Vec<String>) -> Loc {
        match operand {
            Operand::Literal(value) => Loc::Imm(i32::from(*value)),
            Operand::Var(name) => {
                let cell = format!("v_{}", name);
                cells.push(cell.clone());
                Loc::Mem(cell)
            }
            Operand::Temp(name) => {
                cells.push(name.clone());
                Loc::mem(name.as_str())
            }
        }
    }

    fn lower_instruction(
        &self,
        instr: &TacInstruction,
        block: &mut Vec<AsmInst>,
        cells: &mut Vec<String>,
    ) -> LogicResult<()> {
        let eax = Reg::Eax;
        let a = self.operand(&instr.arg1, cells);
        let result = self.operand(&instr.result, cells);
        if matches!(result, Loc::Imm(_)) {
            return Err(codegen_error(format!("cannot store into literal in '{}'", instr)));
        }

        match instr.op {
            TacOp::Assign => {
                block.push(AsmInst::mov(Loc::Reg(eax), a));
            }
            TacOp::Not => {
                block.push(AsmInst::mov(Loc::Reg(eax), a));
                block.push(AsmInst::logic(LogicOp::Xor, eax, Loc::Imm(1)));
            }
            op => {
                let b = match &instr.arg2 {
                    Some(arg2) => self.operand(arg2, cells),
                    None => return Err(codegen_error(format!("missing second operand in '{}'", instr))),
                };
                lower_binary(op, a, b, block);
            }
        }

        block.push(AsmInst::mov(result, Loc::Reg(eax)));
        Ok(())
    }
}

/// 二元运算，结果留在 eax
fn lower_binary(op: TacOp, a: Loc, b: Loc, block: &mut Vec<AsmInst>) {
    let (eax, ebx, ecx, edx) = (Reg::Eax, Reg::Ebx, Reg::Ecx, Reg::Edx);
    block.push(AsmInst::mov(Loc::Reg(eax), a));
    match op {
        TacOp::And => block.push(AsmInst::logic(LogicOp::And, eax, b)),
        TacOp::Or => block.push(AsmInst::logic(LogicOp::Or, eax, b)),
        TacOp::Xor => block.push(AsmInst::logic(LogicOp::Xor, eax, b)),
        TacOp::Xnor => {
            block.push(AsmInst::logic(LogicOp::Xor, eax, b));
            block.push(AsmInst::logic(LogicOp::Xor, eax, Loc::Imm(1)));
        }
        // a -> b == NOT a OR b
        TacOp::Implies => {
            block.push(AsmInst::logic(LogicOp::Xor, eax, Loc::Imm(1)));
            block.push(AsmInst::mov(Loc::Reg(ebx), b));
            block.push(AsmInst::logic(LogicOp::Or, eax, Loc::Reg(ebx)));
        }
        // a <-> b == (a AND b) OR (NOT a AND NOT b)
        TacOp::Iff | TacOp::Equiv => {
            block.push(AsmInst::mov(Loc::Reg(ebx), b));
            block.push(AsmInst::mov(Loc::Reg(ecx), Loc::Reg(eax)));
            block.push(AsmInst::mov(Loc::Reg(edx), Loc::Reg(ebx)));
            block.push(AsmInst::logic(LogicOp::And, eax, Loc::Reg(ebx)));
            block.push(AsmInst::mov(Loc::Reg(ebx), Loc::Reg(ecx)));
            block.push(AsmInst::mov(Loc::Reg(ecx), Loc::Reg(edx)));
            block.push(AsmInst::logic(LogicOp::Xor, ebx, Loc::Imm(1)));
            block.push(AsmInst::logic(LogicOp::Xor, ecx, Loc::Imm(1)));
            block.push(AsmInst::logic(LogicOp::And, ebx, Loc::Reg(ecx)));
            block.push(AsmInst::logic(LogicOp::Or, eax, Loc::Reg(ebx)));
        }
        TacOp::Assign | TacOp::Not => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::asm::inst::simulate;
    use crate::parser::parse_line;
    use crate::tac::TacGenerator;

    const PROGRAM: [&str; 8] = [
        "A = TRUE",
        "B = FALSE",
        "A AND B",
        "NOT (A AND B)",
        "A -> B",
        "(A <-> B) OR (B == B)",
        "A XNOR B",
        "C = A XOR B",
    ];

    fn generate(lines: &[&str]) -> AsmGenerator {
        let mut tac = TacGenerator::new();
        let mut asm = AsmGenerator::new();
        for line in lines {
            let code = tac.generate(&parse_line(line).unwrap()).unwrap();
            asm.add_statement(line, &code).unwrap();
        }
        asm
    }

    #[test]
    fn test_program_shape() {
        let asm = generate(&PROGRAM[..3]);
        let text = asm.finish(OptLevel::O0);
        assert!(text.contains("section .data"));
        assert!(text.contains("    v_A resd 1\n"));
        assert!(text.contains("    t0 resd 1\n"));
        assert!(text.contains("    mov dword [v_A], 1\n") || text.contains("    mov eax, 1\n"));
        assert!(text.contains("_start:\n"));
        assert!(text.contains("    ; statement 3: A AND B\n"));
        assert!(text.contains("    and eax, [v_B]\n"));
        assert_eq!(text.matches("    call print_result\n").count(), 3);
        assert!(text.contains("    mov rax, 60\n"));
        assert!(text.ends_with("    ret\n"));
        assert_eq!(asm.statement_count(), 3);
    }

    #[test]
    fn test_printed_values() {
        let asm = generate(&PROGRAM);
        assert_eq!(simulate(asm.body()), vec![1, 0, 0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_levels_preserve_behaviour() {
        let asm = generate(&PROGRAM);
        let reference = simulate(&asm.optimized_body(OptLevel::O0));
        for level in [OptLevel::O1, OptLevel::O2] {
            let body = asm.optimized_body(level);
            assert_eq!(simulate(&body), reference, "level {}", level.level());
            assert!(body.len() < asm.body().len());
        }
    }

    #[test]
    fn test_literal_operands_become_immediates() {
        let asm = generate(&["TRUE AND FALSE"]);
        assert!(asm.body().contains(&AsmInst::logic(LogicOp::And, Reg::Eax, Loc::Imm(0))));
        assert_eq!(simulate(asm.body()), vec![0]);
    }

    #[test]
    fn test_bare_literal_statement() {
        let asm = generate(&["TRUE"]);
        assert_eq!(simulate(asm.body()), vec![1]);
        assert!(asm.cells().is_empty());
    }

    #[test]
    fn test_missing_operand_leaves_no_output() {
        let mut asm = AsmGenerator::new();
        let broken = IntermediateCode {
            instructions: vec![TacInstruction {
                op: TacOp::And,
                result: Operand::Temp("t0".into()),
                arg1: Operand::Var("A".into()),
                arg2: None,
            }],
            result: Operand::Temp("t0".into()),
        };
        assert!(asm.add_statement("A AND ?", &broken).is_err());
        assert!(asm.body().is_empty());
        assert!(asm.cells().is_empty());
        assert_eq!(asm.statement_count(), 0);
    }
}
