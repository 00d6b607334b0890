//! x86-64 指令模型（只覆盖后端实际会生成的子集）

#[cfg(test)]
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Eax,
    Ebx,
    Ecx,
    Edx,
}

impl Reg {
    pub const ALL: [Reg; 4] = [Reg::Eax, Reg::Ebx, Reg::Ecx, Reg::Edx];

    pub fn name(self) -> &'static str {
        match self {
            Reg::Eax => "eax",
            Reg::Ebx => "ebx",
            Reg::Ecx => "ecx",
            Reg::Edx => "edx",
        }
    }
}

/// 操作数位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Loc {
    Reg(Reg),
    /// `.bss` 中的 32 位单元
    Mem(String),
    Imm(i32),
}

impl Loc {
    pub fn mem(cell: impl Into<String>) -> Self {
        Loc::Mem(cell.into())
    }

    pub fn as_imm(&self) -> Option<i32> {
        match self {
            Loc::Imm(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loc::Reg(reg) => f.write_str(reg.name()),
            Loc::Mem(cell) => write!(f, "[{}]", cell),
            Loc::Imm(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
    Xor,
}

impl LogicOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            LogicOp::And => "and",
            LogicOp::Or => "or",
            LogicOp::Xor => "xor",
        }
    }

    pub fn apply(self, a: i32, b: i32) -> i32 {
        match self {
            LogicOp::And => a & b,
            LogicOp::Or => a | b,
            LogicOp::Xor => a ^ b,
        }
    }

    /// 右操作数为该值时运算不改变目标
    pub fn identity(self) -> i32 {
        match self {
            LogicOp::And => -1,
            LogicOp::Or | LogicOp::Xor => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmInst {
    Mov { dst: Loc, src: Loc },
    /// `op dst, src`，目标总是寄存器
    Logic { op: LogicOp, dst: Reg, src: Loc },
    /// 以 eax 为参数调用子程序，返回后通用寄存器内容不再可靠
    Call(String),
    Comment(String),
}

impl AsmInst {
    pub fn mov(dst: Loc, src: Loc) -> Self {
        AsmInst::Mov { dst, src }
    }

    pub fn logic(op: LogicOp, dst: Reg, src: Loc) -> Self {
        AsmInst::Logic { op, dst, src }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, AsmInst::Comment(_))
    }

    /// 被写入的位置
    pub fn written(&self) -> Option<Loc> {
        match self {
            AsmInst::Mov { dst, .. } => Some(dst.clone()),
            AsmInst::Logic { dst, .. } => Some(Loc::Reg(*dst)),
            AsmInst::Call(_) | AsmInst::Comment(_) => None,
        }
    }

    /// 被读取的位置（立即数不计）
    pub fn read(&self) -> Vec<Loc> {
        let mut out = Vec::new();
        match self {
            AsmInst::Mov { src, .. } => out.push(src.clone()),
            AsmInst::Logic { dst, src, .. } => {
                out.push(Loc::Reg(*dst));
                out.push(src.clone());
            }
            AsmInst::Call(_) => out.push(Loc::Reg(Reg::Eax)),
            AsmInst::Comment(_) => {}
        }
        out.retain(|loc| !matches!(loc, Loc::Imm(_)));
        out
    }

    /// 是否读或写了 `loc`（调用视为改写全部寄存器）
    pub fn touches(&self, loc: &Loc) -> bool {
        if matches!(self, AsmInst::Call(_)) && matches!(loc, Loc::Reg(_)) {
            return true;
        }
        self.written().as_ref() == Some(loc) || self.read().contains(loc)
    }
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmInst::Mov { dst: dst @ Loc::Mem(_), src: src @ Loc::Imm(_) } => {
                write!(f, "mov dword {}, {}", dst, src)
            }
            AsmInst::Mov { dst, src } => write!(f, "mov {}, {}", dst, src),
            AsmInst::Logic { op, dst, src } => write!(f, "{} {}, {}", op.mnemonic(), dst.name(), src),
            AsmInst::Call(label) => write!(f, "call {}", label),
            AsmInst::Comment(text) => write!(f, "; {}", text),
        }
    }
}

#[cfg(test)]
/// 执行指令序列，返回每次调用时 eax 的值
pub(crate) fn simulate(body: &[AsmInst]) -> Vec<i32> {
    let mut regs: HashMap<Reg, i32> = HashMap::new();
    let mut mem: HashMap<String, i32> = HashMap::new();
    let mut printed = Vec::new();
    let read = |loc: &Loc, regs: &HashMap<Reg, i32>, mem: &HashMap<String, i32>| match loc {
        Loc::Reg(r) => regs.get(r).copied().unwrap_or(0x5a5a),
        Loc::Mem(c) => mem.get(c).copied().unwrap_or(0),
        Loc::Imm(v) => *v,
    };
    for inst in body {
        match inst {
            AsmInst::Mov { dst, src } => {
                let value = read(src, &regs, &mem);
                match dst {
                    Loc::Reg(r) => {
                        regs.insert(*r, value);
                    }
                    Loc::Mem(c) => {
                        mem.insert(c.clone(), value);
                    }
                    Loc::Imm(_) => panic!("store to immediate"),
                }
            }
            AsmInst::Logic { op, dst, src } => {
                let value = op.apply(read(&Loc::Reg(*dst), &regs, &mem), read(src, &regs, &mem));
                regs.insert(*dst, value);
            }
            AsmInst::Call(_) => {
                printed.push(read(&Loc::Reg(Reg::Eax), &regs, &mem));
                // 调用之后寄存器内容不可依赖
                regs.clear();
            }
            AsmInst::Comment(_) => {}
        }
    }
    printed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        assert_eq!(AsmInst::mov(Loc::Reg(Reg::Eax), Loc::mem("v_A")).to_string(), "mov eax, [v_A]");
        assert_eq!(AsmInst::mov(Loc::mem("t0"), Loc::Imm(1)).to_string(), "mov dword [t0], 1");
        assert_eq!(AsmInst::logic(LogicOp::Xor, Reg::Eax, Loc::Imm(1)).to_string(), "xor eax, 1");
        assert_eq!(AsmInst::Call("print_result".into()).to_string(), "call print_result");
    }

    #[test]
    fn test_def_use() {
        let inst = AsmInst::logic(LogicOp::Or, Reg::Eax, Loc::Reg(Reg::Ebx));
        assert_eq!(inst.written(), Some(Loc::Reg(Reg::Eax)));
        assert_eq!(inst.read(), vec![Loc::Reg(Reg::Eax), Loc::Reg(Reg::Ebx)]);
        assert!(AsmInst::Call("f".into()).touches(&Loc::Reg(Reg::Edx)));
        assert!(!AsmInst::Call("f".into()).touches(&Loc::mem("t0")));
    }
}
