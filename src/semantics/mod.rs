use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use anyhow::{bail, Context, Result};
use itertools::Itertools;

use crate::bytecode::{
    ArithOp, Condition, Constant, Insn, InsnHandle, InsnList, JumpOp, MethodBody, VarKind,
};
use crate::frontend::{ParseExpr, Span};
use crate::ir::{
    BinaryOperator, DeclId, Expr, ExprKind, FunctionBody, Literal, Offsets, Stmt,
    UnaryOperator, ValueDecl,
};
use crate::utils::Frame;

pub struct Program {
    pub methods: Vec<MethodBody>,
    pub funcs: Vec<FunctionBody>,
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for method in &self.methods {
            writeln!(f, "{}", method)?;
        }
        for func in &self.funcs {
            writeln!(f, "{}", func)?;
        }
        Ok(())
    }
}

fn split_name(qualified: &str) -> (&str, &str) {
    qualified.rsplit_once('.').unwrap_or(("", qualified))
}

fn offsets(span: Span) -> Offsets {
    Offsets::new(span.start, span.end)
}

fn label_name(insn: &ParseExpr) -> Option<&str> {
    match insn {
        ParseExpr::List(parts, _) => match &parts[..] {
            [ParseExpr::Symbol(op, _), ParseExpr::Symbol(name, _)] if op == "label" => {
                Some(name.as_str())
            }
            _ => None,
        },
        _ => None,
    }
}

fn slot_operand(op: &str, operands: &[ParseExpr]) -> Result<u16> {
    match operands {
        [ParseExpr::Integer(slot, _)] => u16::try_from(*slot)
            .with_context(|| format!("{} slot {} is out of range", op, slot)),
        _ => bail!("{} takes exactly one slot number", op),
    }
}

fn no_operands(op: &str, operands: &[ParseExpr], insn: Insn) -> Result<Insn> {
    if operands.is_empty() {
        Ok(insn)
    } else {
        bail!("{} takes no operands", op)
    }
}

fn analyze_insn(insn: &ParseExpr, labels: &HashMap<&str, InsnHandle>) -> Result<Insn> {
    let ParseExpr::List(parts, _) = insn else {
        bail!("instructions must be lists, found {}", insn);
    };
    let Some((ParseExpr::Symbol(op, _), operands)) = parts.split_first() else {
        bail!("instructions must begin with an opcode: {}", insn);
    };
    let jump_target = |operands: &[ParseExpr]| -> Result<InsnHandle> {
        match operands {
            [ParseExpr::Symbol(label, _)] => labels
                .get(label.as_str())
                .copied()
                .with_context(|| format!("jump to undefined label {}", label)),
            _ => bail!("{} takes exactly one label", op),
        }
    };

    Ok(match op.as_str() {
        "label" => match operands {
            [ParseExpr::Symbol(_, _)] => Insn::Label,
            _ => bail!("label takes exactly one name"),
        },
        "goto" => Insn::Jump {
            op: JumpOp::Goto,
            target: jump_target(operands)?,
        },
        "iconst" => match operands {
            [ParseExpr::Integer(value, _)] => Insn::Push(Constant::Int(
                i32::try_from(*value)
                    .with_context(|| format!("iconst {} does not fit in 32 bits", value))?,
            )),
            _ => bail!("iconst takes exactly one integer"),
        },
        "aconst_null" => no_operands(op, operands, Insn::Push(Constant::Null))?,
        "iload" | "aload" | "istore" | "astore" => {
            let slot = slot_operand(op, operands)?;
            let kind = if op.starts_with('i') {
                VarKind::Int
            } else {
                VarKind::Ref
            };
            if op.ends_with("load") {
                Insn::Load { kind, slot }
            } else {
                Insn::Store { kind, slot }
            }
        }
        "iinc" => match operands {
            [ParseExpr::Integer(slot, _), ParseExpr::Integer(delta, _)] => Insn::Increment {
                slot: u16::try_from(*slot)
                    .with_context(|| format!("iinc slot {} is out of range", slot))?,
                delta: i16::try_from(*delta)
                    .with_context(|| format!("iinc delta {} is out of range", delta))?,
            },
            _ => bail!("iinc takes a slot and a delta"),
        },
        "iadd" => no_operands(op, operands, Insn::Arith(ArithOp::Add))?,
        "isub" => no_operands(op, operands, Insn::Arith(ArithOp::Sub))?,
        "imul" => no_operands(op, operands, Insn::Arith(ArithOp::Mul))?,
        "nop" => no_operands(op, operands, Insn::Nop)?,
        "return" => no_operands(op, operands, Insn::Return { value: false })?,
        "ireturn" => no_operands(op, operands, Insn::Return { value: true })?,
        "other" => Insn::Other(operands.iter().join(" ")),
        _ => match Condition::from_mnemonic(op) {
            Some(cond) => Insn::Jump {
                op: JumpOp::If(cond),
                target: jump_target(operands)?,
            },
            None => bail!("unknown opcode {}", op),
        },
    })
}

fn analyze_method(qualified: &str, body: &[ParseExpr]) -> Result<MethodBody> {
    // handles of a freshly built list are the positions of its nodes
    let mut labels = HashMap::new();
    for (position, insn) in body.iter().enumerate() {
        if let Some(name) = label_name(insn) {
            if labels.insert(name, InsnHandle::new(position)).is_some() {
                bail!("label {} is defined twice", name);
            }
        }
    }
    let insns = body
        .iter()
        .map(|insn| analyze_insn(insn, &labels))
        .collect::<Result<Vec<_>>>()?;
    let (owner, name) = split_name(qualified);
    Ok(MethodBody::new(owner, name, InsnList::from_insns(insns)?))
}

#[derive(Copy, Clone)]
struct Binding {
    id: DeclId,
    mutable: bool,
}

type Scope = Frame<String, Binding>;

fn analyze_stmts(
    func: &mut FunctionBody,
    stmts: &[ParseExpr],
    frame: &mut Scope,
) -> Result<Vec<Stmt>> {
    stmts
        .iter()
        .map(|stmt| analyze_stmt(func, stmt, frame))
        .collect()
}

fn analyze_stmt(func: &mut FunctionBody, stmt: &ParseExpr, frame: &mut Scope) -> Result<Stmt> {
    if let ParseExpr::List(parts, span) = stmt {
        if let Some((ParseExpr::Symbol(keyword, _), operands)) = parts.split_first() {
            match keyword.as_str() {
                "val" => return analyze_decl(func, false, operands, *span, frame),
                "var" => return analyze_decl(func, true, operands, *span, frame),
                _ => {}
            }
        }
    }
    Ok(Stmt::Expr(analyze_expr(func, stmt, frame)?))
}

fn analyze_decl(
    func: &mut FunctionBody,
    mutable: bool,
    operands: &[ParseExpr],
    span: Span,
    frame: &mut Scope,
) -> Result<Stmt> {
    let (name, initializer) = match operands {
        [ParseExpr::Symbol(name, _)] if mutable => (name, None),
        [ParseExpr::Symbol(name, _), init] => (name, Some(init)),
        _ => bail!("declarations take a name and an initializer"),
    };
    // the initializer can't see the name it defines
    let initializer = initializer
        .map(|init| analyze_expr(func, init, frame))
        .transpose()?;
    let id = func.new_decl(name);
    frame.assoc(name.to_owned(), Binding { id, mutable });
    Ok(Stmt::Decl(ValueDecl {
        id,
        mutable,
        initializer,
        offsets: offsets(span),
    }))
}

fn lookup(frame: &Scope, name: &str) -> Result<Binding> {
    frame
        .lookup(name)
        .with_context(|| format!("use of undeclared value {}", name))
}

const fn is_variadic(operator: BinaryOperator) -> bool {
    matches!(operator, BinaryOperator::Add | BinaryOperator::Mul)
}

fn analyze_binary(
    func: &mut FunctionBody,
    operator: BinaryOperator,
    operands: &[ParseExpr],
    frame: &mut Scope,
) -> Result<ExprKind> {
    match operands {
        [lhs, rhs] => Ok(ExprKind::Binary {
            operator,
            lhs: Box::new(analyze_expr(func, lhs, frame)?),
            rhs: Box::new(analyze_expr(func, rhs, frame)?),
        }),
        // (+ a b c) nests to the left
        [first, .., last] if is_variadic(operator) => {
            let init = &operands[..operands.len() - 1];
            let lhs = Expr::new(
                analyze_binary(func, operator, init, frame)?,
                offsets(first.span().to(init[init.len() - 1].span())),
            );
            Ok(ExprKind::Binary {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(analyze_expr(func, last, frame)?),
            })
        }
        _ => bail!("{} takes exactly two operands", operator.symbol()),
    }
}

fn analyze_expr(func: &mut FunctionBody, expr: &ParseExpr, frame: &mut Scope) -> Result<Expr> {
    let kind = match expr {
        ParseExpr::Integer(val, _) => ExprKind::Const(Literal::Int(*val)),
        ParseExpr::Symbol(val, _) => match val.as_str() {
            "true" => ExprKind::Const(Literal::Bool(true)),
            "false" => ExprKind::Const(Literal::Bool(false)),
            "null" => ExprKind::Const(Literal::Null),
            name => ExprKind::GetValue(lookup(frame, name)?.id),
        },
        ParseExpr::List(call_expr, _) => {
            let Some((ParseExpr::Symbol(operator, _), operands)) = call_expr.split_first() else {
                bail!("call expressions must have an operator");
            };
            let binary = match operator.as_str() {
                "+" => Some(BinaryOperator::Add),
                "-" => Some(BinaryOperator::Sub),
                "*" => Some(BinaryOperator::Mul),
                "/" => Some(BinaryOperator::Div),
                "%" => Some(BinaryOperator::Rem),
                "<" => Some(BinaryOperator::Lt),
                "<=" => Some(BinaryOperator::Le),
                ">" => Some(BinaryOperator::Gt),
                ">=" => Some(BinaryOperator::Ge),
                "==" => Some(BinaryOperator::Eq),
                "!=" => Some(BinaryOperator::Ne),
                _ => None,
            };
            if let Some(operator) = binary {
                analyze_binary(func, operator, operands, frame)?
            } else {
                match (operator.as_str(), operands) {
                    ("not", [arg]) | ("neg", [arg]) => ExprKind::Unary {
                        operator: if operator == "not" {
                            UnaryOperator::Not
                        } else {
                            UnaryOperator::Neg
                        },
                        arg: Box::new(analyze_expr(func, arg, frame)?),
                    },
                    ("not" | "neg", _) => bail!("{} takes exactly one operand", operator),
                    ("if", [pred, conseq, alt @ ..]) if alt.len() <= 1 => ExprKind::If {
                        pred: Box::new(analyze_expr(func, pred, frame)?),
                        conseq: Box::new(analyze_expr(func, conseq, frame)?),
                        alt: alt
                            .first()
                            .map(|alt| analyze_expr(func, alt, frame).map(Box::new))
                            .transpose()?,
                    },
                    ("if", _) => bail!("if expressions must have either two or three arguments"),
                    ("set", [ParseExpr::Symbol(name, _), value]) => {
                        let binding = lookup(frame, name)?;
                        if !binding.mutable {
                            bail!("cannot assign to val {}", name);
                        }
                        ExprKind::SetValue {
                            decl: binding.id,
                            value: Box::new(analyze_expr(func, value, frame)?),
                        }
                    }
                    ("set", _) => bail!("set takes a name and a value"),
                    ("begin", stmts) => ExprKind::Block(
                        frame.with_child(|frame| analyze_stmts(func, stmts, frame))?,
                    ),
                    ("call", [ParseExpr::Symbol(callee, _), args @ ..]) => ExprKind::Call {
                        callee: callee.clone(),
                        args: args
                            .iter()
                            .map(|arg| analyze_expr(func, arg, frame))
                            .collect::<Result<_>>()?,
                    },
                    ("call", _) => bail!("call expressions must name the callee"),
                    ("return", []) => ExprKind::Return(None),
                    ("return", [value]) => {
                        ExprKind::Return(Some(Box::new(analyze_expr(func, value, frame)?)))
                    }
                    ("return", _) => bail!("return statements have one optional argument"),
                    ("val" | "var", _) => {
                        bail!("declarations may only appear in function bodies and begin blocks")
                    }
                    _ => bail!("invalid operator in call expression: {}", operator),
                }
            }
        }
    };
    Ok(Expr::new(kind, offsets(expr.span())))
}

fn analyze_function(qualified: &str, body: &[ParseExpr]) -> Result<FunctionBody> {
    let (owner, name) = split_name(qualified);
    let mut func = FunctionBody::new(owner, name);
    let stmts = analyze_stmts(&mut func, body, &mut Frame::new())?;
    func.body.stmts = stmts;
    Ok(func)
}

pub fn analyze(exprs: &[ParseExpr]) -> Result<Program> {
    let mut program = Program {
        methods: vec![],
        funcs: vec![],
    };
    let mut names = HashSet::new();
    for expr in exprs {
        let ParseExpr::List(lst, _) = expr else {
            bail!("all top-level expressions must be methods or functions");
        };
        let Some((ParseExpr::Symbol(keyword, _), operands)) = lst.split_first() else {
            bail!("all top-level expressions must be methods or functions");
        };
        let Some((ParseExpr::Symbol(qualified, _), body)) = operands.split_first() else {
            bail!("{} must be followed by its name", keyword);
        };
        if !names.insert(qualified.as_str()) {
            bail!("{} is defined twice", qualified);
        }
        match keyword.as_str() {
            "method" => program.methods.push(
                analyze_method(qualified, body)
                    .with_context(|| format!("in method {}", qualified))?,
            ),
            "func" => program.funcs.push(
                analyze_function(qualified, body)
                    .with_context(|| format!("in function {}", qualified))?,
            ),
            _ => bail!("all top-level expressions must be methods or functions"),
        }
    }
    Ok(program)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::frontend::parse;

    pub(crate) fn program_from_source(source: &str) -> Program {
        analyze(&parse(source).unwrap()).unwrap()
    }

    pub(crate) fn method_from_source(source: &str) -> MethodBody {
        program_from_source(source).methods.remove(0)
    }

    pub(crate) fn function_from_source(source: &str) -> FunctionBody {
        program_from_source(source).funcs.remove(0)
    }

    fn analyze_error(source: &str) -> String {
        match analyze(&parse(source).unwrap()) {
            Ok(_) => panic!("expected {} to be rejected", source),
            Err(err) => format!("{:#}", err),
        }
    }

    #[test]
    fn resolves_forward_labels() {
        let method = method_from_source("(method p.Q.run (goto end) (nop) (label end) (return))");
        assert_eq!(method.owner, "p.Q");
        assert_eq!(method.name, "run");
        assert_eq!(
            method.instructions.get(InsnHandle::new(0)),
            Some(&Insn::Jump {
                op: JumpOp::Goto,
                target: InsnHandle::new(2)
            })
        );
        assert_eq!(
            method.to_string(),
            "(method p.Q.run\n  (goto L2)\n  (nop)\n(label L2)\n  (return)\n)\n"
        );
    }

    #[test]
    fn printed_methods_parse_back() {
        let method = method_from_source(
            "(method A.f (label a) (iload 0) (ifnonnull a) (aconst_null) (astore 1) (other invoke foo) (return))",
        );
        let again = method_from_source(&method.to_string());
        assert_eq!(again.to_string(), method.to_string());
    }

    #[test]
    fn rejects_bad_methods() {
        assert!(analyze_error("(method A.f (goto nowhere))").contains("undefined label nowhere"));
        assert!(analyze_error("(method A.f (label a) (label a))").contains("defined twice"));
        assert!(analyze_error("(method A.f (iconst 5000000000))").contains("32 bits"));
        assert!(analyze_error("(method A.f (istore -1))").contains("out of range"));
        assert!(analyze_error("(method A.f (frobnicate))").contains("unknown opcode"));
        assert!(analyze_error("(method A.f (nop 1))").contains("no operands"));
        assert!(analyze_error("(method A.f (label))").contains("exactly one name"));
        assert!(analyze_error("(method A.f (label a b))").contains("exactly one name"));
        assert!(analyze_error("(method A.f (label 3))").contains("exactly one name"));
    }

    #[test]
    fn scopes_follow_blocks() {
        let func = function_from_source(
            "(func A.f (val x 1) (begin (val x 2) (call use x)) (call use x))",
        );
        let Stmt::Decl(outer) = &func.body.stmts[0] else {
            panic!("expected a declaration");
        };
        let Stmt::Expr(Expr {
            kind: ExprKind::Call { args, .. },
            ..
        }) = &func.body.stmts[2]
        else {
            panic!("expected a call");
        };
        assert_eq!(args[0].kind, ExprKind::GetValue(outer.id));
        assert!(analyze_error("(func A.f (begin (val y 1)) (call use y))").contains("undeclared"));
    }

    #[test]
    fn nests_variadic_arithmetic() {
        let func = function_from_source("(func A.f (+ 1 2 3))");
        assert_eq!(func.to_string(), "(func A.f\n  (+ (+ 1 2) 3))\n");
        assert!(analyze_error("(func A.f (- 1 2 3))").contains("exactly two"));
    }

    #[test]
    fn rejects_bad_functions() {
        assert!(analyze_error("(func A.f (val x 1) (set x 2))").contains("cannot assign to val x"));
        assert!(analyze_error("(func A.f (val x x))").contains("undeclared value x"));
        assert!(analyze_error("(func A.f (if (val x 1) 2))").contains("declarations may only"));
        assert!(analyze_error("(func A.f) (method A.f)").contains("defined twice"));
    }

    #[test]
    fn declarations_record_their_offsets() {
        let source = "(func A.f (var counter) (set counter 3))";
        let func = function_from_source(source);
        let Stmt::Decl(decl) = &func.body.stmts[0] else {
            panic!("expected a declaration");
        };
        assert!(decl.mutable);
        assert_eq!(decl.initializer, None);
        assert_eq!(decl.offsets, Offsets::new(10, 23));
        assert_eq!(&source[decl.offsets.start..decl.offsets.end], "(var counter)");
    }
}
