#![allow(dead_code)]

use std::collections::BTreeMap;

use methodopt::bytecode::{ArithOp, Condition, Constant, Insn, InsnList, JumpOp, MethodBody};
use methodopt::frontend::parse;
use methodopt::ir::FunctionBody;
use methodopt::semantics::{analyze, Program};

const STEP_LIMIT: usize = 100_000;

pub fn program(source: &str) -> Program {
    analyze(&parse(source).unwrap()).unwrap()
}

pub fn method(source: &str) -> MethodBody {
    let mut program = program(source);
    assert_eq!(program.methods.len(), 1);
    program.methods.remove(0)
}

pub fn function(source: &str) -> FunctionBody {
    let mut program = program(source);
    assert_eq!(program.funcs.len(), 1);
    program.funcs.remove(0)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Null,
}

impl Value {
    fn int(self) -> i32 {
        match self {
            Value::Int(value) => value,
            Value::Null => panic!("expected an int, found null"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub locals: BTreeMap<u16, Value>,
    pub returned: Option<Value>,
    /// Texts of executed `other` instructions, with `sink` ones followed by
    /// the value they consumed.
    pub effects: Vec<String>,
}

fn test(cond: Condition, stack: &mut Vec<Value>) -> bool {
    let mut pop = || stack.pop().expect("stack underflow");
    match cond {
        Condition::Eq => pop().int() == 0,
        Condition::Ne => pop().int() != 0,
        Condition::Lt => pop().int() < 0,
        Condition::Ge => pop().int() >= 0,
        Condition::Gt => pop().int() > 0,
        Condition::Le => pop().int() <= 0,
        Condition::Null => pop() == Value::Null,
        Condition::NonNull => pop() != Value::Null,
        Condition::ACmpEq | Condition::ACmpNe => {
            let (b, a) = (pop(), pop());
            (a == b) == (cond == Condition::ACmpEq)
        }
        _ => {
            let (b, a) = (pop().int(), pop().int());
            match cond {
                Condition::ICmpEq => a == b,
                Condition::ICmpNe => a != b,
                Condition::ICmpLt => a < b,
                Condition::ICmpGe => a >= b,
                Condition::ICmpGt => a > b,
                Condition::ICmpLe => a <= b,
                _ => unreachable!(),
            }
        }
    }
}

/// Executes `insns` with the given initial locals. Unset slots read as 0.
pub fn run(insns: &InsnList, args: &[(u16, i32)]) -> Outcome {
    let mut outcome = Outcome {
        locals: args.iter().map(|&(slot, v)| (slot, Value::Int(v))).collect(),
        returned: None,
        effects: vec![],
    };
    let mut stack = vec![];
    let mut pc = insns.first();
    let mut steps = 0;
    while let Some(current) = pc {
        steps += 1;
        assert!(steps < STEP_LIMIT, "method did not terminate");
        pc = insns.next(current);
        match insns.get(current).unwrap() {
            Insn::Label | Insn::Nop => {}
            Insn::Jump { op, target } => {
                let taken = match op {
                    JumpOp::Goto => true,
                    JumpOp::If(cond) => test(*cond, &mut stack),
                };
                if taken {
                    pc = Some(*target);
                }
            }
            Insn::Load { slot, .. } => {
                stack.push(*outcome.locals.get(slot).unwrap_or(&Value::Int(0)));
            }
            Insn::Store { slot, .. } => {
                outcome.locals.insert(*slot, stack.pop().expect("stack underflow"));
            }
            Insn::Push(Constant::Int(value)) => stack.push(Value::Int(*value)),
            Insn::Push(Constant::Null) => stack.push(Value::Null),
            Insn::Increment { slot, delta } => {
                let old = outcome.locals.get(slot).map_or(0, |v| v.int());
                outcome
                    .locals
                    .insert(*slot, Value::Int(old.wrapping_add(i32::from(*delta))));
            }
            Insn::Arith(op) => {
                let b = stack.pop().expect("stack underflow").int();
                let a = stack.pop().expect("stack underflow").int();
                stack.push(Value::Int(match op {
                    ArithOp::Add => a.wrapping_add(b),
                    ArithOp::Sub => a.wrapping_sub(b),
                    ArithOp::Mul => a.wrapping_mul(b),
                }));
            }
            Insn::Return { value } => {
                if *value {
                    outcome.returned = Some(stack.pop().expect("stack underflow"));
                }
                break;
            }
            Insn::Other(text) if text == "sink" => {
                let value = stack.pop().expect("stack underflow");
                outcome.effects.push(format!("sink {:?}", value));
            }
            Insn::Other(text) => outcome.effects.push(text.clone()),
        }
    }
    outcome
}

pub fn jumps_are_sound(insns: &InsnList) -> bool {
    insns.iter().all(|(_, insn)| match insn.target() {
        Some(target) => insns.contains(target) && insns.is_label(target),
        None => true,
    })
}
