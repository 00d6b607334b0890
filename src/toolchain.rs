//! 外部工具链调用（nasm / ld / llvm-as / clang）
//!
//! 全部同步执行。非零退出码与启动失败都报告为 `LogicError::Toolchain`。

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{LogicError, LogicResult};

/// 运行一个外部工具并检查退出状态
fn run_tool(tool: &str, command: &mut Command) -> LogicResult<()> {
    debug!(?command, "invoking external tool");
    let output = command.output().map_err(|e| LogicError::Toolchain {
        tool: tool.to_string(),
        status: None,
        stderr: format!("failed to start: {}", e),
    })?;

    if !output.status.success() {
        return Err(LogicError::Toolchain {
            tool: tool.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// 汇编并链接为 ELF64 可执行文件
pub fn assemble_and_link(asm: &Path, object: &Path, exe: &Path) -> LogicResult<()> {
    run_tool(
        "nasm",
        Command::new("nasm").arg("-f").arg("elf64").arg("-o").arg(object).arg(asm),
    )?;
    run_tool(
        "ld",
        Command::new("ld").arg("-e").arg("_start").arg("-o").arg(exe).arg(object),
    )?;
    info!(path = %exe.display(), "linked executable");
    Ok(())
}

/// `.ll` → `.bc`
pub fn write_bitcode(ll: &Path, bc: &Path) -> LogicResult<()> {
    run_tool("llvm-as", Command::new("llvm-as").arg(ll).arg("-o").arg(bc))?;
    info!(path = %bc.display(), "wrote bitcode");
    Ok(())
}

/// 用 clang 把 IR 编译为可执行文件
pub fn compile_ir(ll: &Path, exe: &Path) -> LogicResult<()> {
    run_tool(
        "clang",
        Command::new("clang")
            .arg(ll)
            .arg("-o")
            .arg(exe)
            .arg("-Wno-override-module"),
    )?;
    info!(path = %exe.display(), "compiled IR executable");
    Ok(())
}
