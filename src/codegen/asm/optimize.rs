//! `_start` 主体上的优化遍
//!
//! 所有遍都只做保持语义的改写：程序唯一可观察的行为是每次
//! `call print_result` 时 eax 的值。

use std::collections::HashSet;

use tracing::debug;

use super::inst::{AsmInst, Loc, LogicOp, Reg};
use crate::error::{LogicError, LogicResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptLevel {
    O0,
    #[default]
    O1,
    O2,
}

impl OptLevel {
    pub fn from_level(level: u8) -> LogicResult<Self> {
        match level {
            0 => Ok(OptLevel::O0),
            1 => Ok(OptLevel::O1),
            2 => Ok(OptLevel::O2),
            other => Err(LogicError::InvalidOption(format!(
                "optimization level {} (expected 0, 1 or 2)",
                other
            ))),
        }
    }

    pub fn level(self) -> u8 {
        match self {
            OptLevel::O0 => 0,
            OptLevel::O1 => 1,
            OptLevel::O2 => 2,
        }
    }
}

const MAX_ROUNDS: usize = 16;

pub fn optimize(mut body: Vec<AsmInst>, level: OptLevel) -> Vec<AsmInst> {
    if level == OptLevel::O0 {
        return body;
    }
    let before = body.len();

    for _ in 0..MAX_ROUNDS {
        let mut changed = remove_redundant_reloads(&mut body);
        changed |= merge_logic_ops(&mut body);
        if level >= OptLevel::O2 {
            changed |= peephole(&mut body);
            changed |= eliminate_dead_code(&mut body);
        }
        if !changed {
            break;
        }
    }
    if level >= OptLevel::O2 {
        sink_loads(&mut body);
    }

    debug!(level = level.level(), before, after = body.len(), "optimized assembly body");
    body
}

/// 下一条非注释指令的下标
fn next_real(body: &[AsmInst], from: usize) -> Option<usize> {
    (from + 1..body.len()).find(|&j| !body[j].is_comment())
}

/// `mov [c], r` 之后紧跟 `mov r2, [c]`：重新加载可以省掉或换成寄存器拷贝
pub fn remove_redundant_reloads(body: &mut Vec<AsmInst>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < body.len() {
        let reload = match (&body[i], next_real(body, i)) {
            (AsmInst::Mov { dst: Loc::Mem(cell), src: Loc::Reg(stored) }, Some(j)) => match &body[j] {
                AsmInst::Mov { dst: Loc::Reg(loaded), src: Loc::Mem(again) } if again == cell => {
                    Some((j, *stored, *loaded))
                }
                _ => None,
            },
            _ => None,
        };
        match reload {
            Some((j, stored, loaded)) if stored == loaded => {
                body.remove(j);
                changed = true;
            }
            Some((j, stored, loaded)) => {
                body[j] = AsmInst::mov(Loc::Reg(loaded), Loc::Reg(stored));
                changed = true;
            }
            None => i += 1,
        }
    }
    changed
}

/// 合并作用于同一目标寄存器的相邻指令
pub fn merge_logic_ops(body: &mut Vec<AsmInst>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < body.len() {
        let Some(j) = next_real(body, i) else { break };
        let merged = match (&body[i], &body[j]) {
            (
                AsmInst::Logic { op: a_op, dst: a_dst, src: Loc::Imm(a) },
                AsmInst::Logic { op: b_op, dst: b_dst, src: Loc::Imm(b) },
            ) if a_op == b_op && a_dst == b_dst => Some(AsmInst::logic(*a_op, *a_dst, Loc::Imm(a_op.apply(*a, *b)))),
            (
                AsmInst::Mov { dst: Loc::Reg(d), src: Loc::Imm(a) },
                AsmInst::Logic { op, dst, src: Loc::Imm(b) },
            ) if d == dst => Some(AsmInst::mov(Loc::Reg(*d), Loc::Imm(op.apply(*a, *b)))),
            (
                AsmInst::Mov { dst: Loc::Reg(d), .. },
                AsmInst::Mov { dst: Loc::Reg(d2), src },
            ) if d == d2 && *src != Loc::Reg(*d) => Some(body[j].clone()),
            _ => None,
        };
        match merged {
            Some(inst) => {
                body[i] = inst;
                body.remove(j);
                changed = true;
            }
            None => i += 1,
        }
    }
    changed
}

/// 短序列化简
pub fn peephole(body: &mut Vec<AsmInst>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < body.len() {
        // 重复的存储
        if let Some(j) = duplicate_store(body, i) {
            body.remove(j);
            changed = true;
            continue;
        }
        let replacement = match &body[i] {
            AsmInst::Mov { dst: Loc::Reg(d), src: Loc::Reg(s) } if d == s => Some(None),
            AsmInst::Logic { op, src: Loc::Imm(v), .. } if *v == op.identity() => Some(None),
            AsmInst::Logic { op: LogicOp::And, dst, src: Loc::Imm(0) } => {
                Some(Some(AsmInst::mov(Loc::Reg(*dst), Loc::Imm(0))))
            }
            AsmInst::Logic { op: LogicOp::Xor, dst, src: Loc::Reg(s) } if s == dst => {
                Some(Some(AsmInst::mov(Loc::Reg(*dst), Loc::Imm(0))))
            }
            AsmInst::Logic { op: LogicOp::And | LogicOp::Or, dst, src: Loc::Reg(s) } if s == dst => Some(None),
            _ => None,
        };
        match replacement {
            Some(Some(inst)) => {
                body[i] = inst;
                changed = true;
                i += 1;
            }
            Some(None) => {
                body.remove(i);
                changed = true;
            }
            None => i += 1,
        }
    }
    changed
}

fn duplicate_store(body: &[AsmInst], i: usize) -> Option<usize> {
    match &body[i] {
        store @ AsmInst::Mov { dst: Loc::Mem(_), src: Loc::Reg(_) } => {
            next_real(body, i).filter(|&j| body[j] == *store)
        }
        _ => None,
    }
}

/// 删除结果之后再也不会被读取的指令（反向活跃性分析）
pub fn eliminate_dead_code(body: &mut Vec<AsmInst>) -> bool {
    let mut live: HashSet<Loc> = HashSet::new();
    let mut keep = vec![true; body.len()];

    for (idx, inst) in body.iter().enumerate().rev() {
        match inst {
            AsmInst::Comment(_) => {}
            AsmInst::Call(_) => {
                for reg in Reg::ALL {
                    live.remove(&Loc::Reg(reg));
                }
                live.insert(Loc::Reg(Reg::Eax));
            }
            AsmInst::Mov { dst, src } => {
                if !live.contains(dst) {
                    keep[idx] = false;
                    continue;
                }
                live.remove(dst);
                if !matches!(src, Loc::Imm(_)) {
                    live.insert(src.clone());
                }
            }
            AsmInst::Logic { dst, src, .. } => {
                if !live.contains(&Loc::Reg(*dst)) {
                    keep[idx] = false;
                    continue;
                }
                if !matches!(src, Loc::Imm(_)) {
                    live.insert(src.clone());
                }
            }
        }
    }

    let before = body.len();
    let mut flags = keep.into_iter();
    body.retain(|_| flags.next().unwrap_or(true));
    body.len() != before
}

/// 把寄存器装载下沉到第一次使用它的位置之前，缩短寄存器的活跃区间
pub fn sink_loads(body: &mut Vec<AsmInst>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < body.len() {
        let load = match &body[i] {
            AsmInst::Mov { dst: Loc::Reg(reg), src } => Some((Loc::Reg(*reg), src.clone())),
            _ => None,
        };
        if let Some((target, src)) = load {
            let mut j = i + 1;
            let mut blocked = false;
            while j < body.len() {
                let inst = &body[j];
                if inst.touches(&target) || matches!(inst, AsmInst::Call(_)) {
                    break;
                }
                if src.as_imm().is_none() && inst.written().as_ref() == Some(&src) {
                    blocked = true;
                    break;
                }
                j += 1;
            }
            let skips_work = body[i + 1..j].iter().any(|inst| !inst.is_comment());
            if !blocked && j < body.len() && skips_work {
                let inst = body.remove(i);
                body.insert(j - 1, inst);
                changed = true;
            }
        }
        i += 1;
    }
    changed
}
