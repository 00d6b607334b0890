//! 代码生成后端
//!
//! `asm` 从三地址码生成 NASM 汇编；`ir` 直接从表达式树生成 LLVM IR。

pub mod asm;
pub mod ir;

pub use asm::{AsmGenerator, OptLevel};
pub use ir::{IrGenerator, IrModule};
