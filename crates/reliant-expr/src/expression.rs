//! Parsed expressions and their numeric evaluation.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tracing::warn;

use crate::error::{ExprError, Result};
use crate::lexer::{tokenize, Token, TokenKind};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Binary operators, both algebraic and Boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.powf(rhs),
            BinaryOp::And => bool_value(truthy(lhs) && truthy(rhs)),
            BinaryOp::Or => bool_value(truthy(lhs) || truthy(rhs)),
            BinaryOp::Eq => bool_value(lhs == rhs),
            BinaryOp::Ne => bool_value(lhs != rhs),
            BinaryOp::Lt => bool_value(lhs < rhs),
            BinaryOp::Le => bool_value(lhs <= rhs),
            BinaryOp::Gt => bool_value(lhs > rhs),
            BinaryOp::Ge => bool_value(lhs >= rhs),
        }
    }
}

fn truthy(value: f64) -> bool {
    value != 0.0
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// One step of a compiled expression.
///
/// An expression is stored in postfix order: operands push a value, and
/// operators pop their arguments and push the result. The flat form keeps
/// evaluation, cloning and dropping independent of nesting depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Number(f64),
    Variable(String),
    Unary(UnaryOp),
    Binary(BinaryOp),
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    program: Vec<Instruction>,
}

impl Expression {
    /// Parse expression text.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        Ok(Self {
            source: source.to_string(),
            program: compile(tokens)?,
        })
    }

    /// The text this expression was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled program, in postfix order.
    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    /// Distinct variable names, in order of first occurrence.
    pub fn variables(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for instruction in &self.program {
            if let Instruction::Variable(name) = instruction {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
        }
        out
    }

    /// Evaluate against an interpretation of variables.
    ///
    /// Every variable the interpretation does not cover is reported with a
    /// warning before evaluation; evaluation then fails on the first such
    /// variable it reaches.
    pub fn solve(&self, interpretation: &HashMap<String, f64>) -> Result<f64> {
        for var in self.variables() {
            if !interpretation.contains_key(var) {
                warn!(variable = var, "no interpretation for variable <{var}> was provided");
            }
        }
        self.run(|name| interpretation.get(name).copied())
    }

    /// Evaluate with an arbitrary lookup function. Missing variables are errors.
    pub fn eval_with<F>(&self, lookup: F) -> Result<f64>
    where
        F: Fn(&str) -> Option<f64>,
    {
        self.run(lookup)
    }

    /// Evaluate as a Boolean formula over features.
    ///
    /// Every variable is a feature indicator: `1.0` when the feature is in
    /// `enabled`, `0.0` otherwise. Absent features are implicitly disabled.
    pub fn holds(&self, enabled: &BTreeSet<String>) -> bool {
        let value = self
            .run(|name| Some(bool_value(enabled.contains(name))))
            .unwrap_or(0.0);
        truthy(value)
    }

    /// Fully parenthesized rendering of the parsed structure, e.g.
    /// `(0.9 * D)` for `0.9*D`.
    pub fn canonical(&self) -> String {
        let mut stack: Vec<String> = Vec::new();
        for instruction in &self.program {
            let text = match instruction {
                Instruction::Number(n) => n.to_string(),
                Instruction::Variable(name) => name.clone(),
                Instruction::Unary(op) => {
                    let operand = stack.pop().unwrap_or_default();
                    match op {
                        UnaryOp::Neg => format!("-({operand})"),
                        UnaryOp::Not => format!("!({operand})"),
                    }
                }
                Instruction::Binary(op) => {
                    let rhs = stack.pop().unwrap_or_default();
                    let lhs = stack.pop().unwrap_or_default();
                    format!("({lhs} {} {rhs})", op.symbol())
                }
            };
            stack.push(text);
        }
        stack.pop().unwrap_or_default()
    }

    fn run<F>(&self, lookup: F) -> Result<f64>
    where
        F: Fn(&str) -> Option<f64>,
    {
        // `compile` only emits balanced programs, so the stack never runs
        // short; NaN stands in if it somehow did.
        fn pop(stack: &mut Vec<f64>) -> f64 {
            stack.pop().unwrap_or(f64::NAN)
        }

        let mut stack: Vec<f64> = Vec::with_capacity(16);
        for instruction in &self.program {
            let value = match instruction {
                Instruction::Number(n) => *n,
                Instruction::Variable(name) => {
                    lookup(name).ok_or_else(|| ExprError::UnresolvedVariable(name.clone()))?
                }
                Instruction::Unary(UnaryOp::Neg) => -pop(&mut stack),
                Instruction::Unary(UnaryOp::Not) => bool_value(!truthy(pop(&mut stack))),
                Instruction::Binary(op) => {
                    let rhs = pop(&mut stack);
                    let lhs = pop(&mut stack);
                    op.apply(lhs, rhs)
                }
            };
            stack.push(value);
        }
        Ok(pop(&mut stack))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Binding strength of prefix operators: tighter than `*` and `/`, looser
/// than `^`, so `-2^2` is `-(2^2)`.
const PREFIX_PRECEDENCE: u8 = 6;

impl BinaryOp {
    /// Precedence, loosest first:
    /// `||`, `&&`, comparisons, `+ -`, `* /`, (prefix `- !`), `^`.
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mul | BinaryOp::Div => 5,
            BinaryOp::Pow => 7,
        }
    }

    fn is_right_associative(self) -> bool {
        self == BinaryOp::Pow
    }

    fn from_token(kind: &TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Caret => BinaryOp::Pow,
            TokenKind::And => BinaryOp::And,
            TokenKind::Or => BinaryOp::Or,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            _ => return None,
        })
    }
}

/// Entry of the operator stack.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Open,
    Prefix(UnaryOp),
    Infix(BinaryOp),
}

impl Pending {
    fn precedence(self) -> u8 {
        match self {
            Pending::Open => 0,
            Pending::Prefix(_) => PREFIX_PRECEDENCE,
            Pending::Infix(op) => op.precedence(),
        }
    }

    fn instruction(self) -> Option<Instruction> {
        match self {
            Pending::Open => None,
            Pending::Prefix(op) => Some(Instruction::Unary(op)),
            Pending::Infix(op) => Some(Instruction::Binary(op)),
        }
    }
}

/// Operator-precedence (shunting-yard) compilation of a token stream into
/// postfix order. Nesting lives on the explicit operator stack, never on
/// the call stack.
fn compile(tokens: Vec<Token>) -> Result<Vec<Instruction>> {
    const OPERAND: &str = "number, variable or '('";

    let mut program = Vec::with_capacity(tokens.len());
    let mut pending: Vec<Pending> = Vec::new();
    let mut expect_operand = true;

    for tok in tokens {
        if expect_operand {
            match tok.kind {
                TokenKind::Number(n) => program.push(Instruction::Number(n)),
                TokenKind::True => program.push(Instruction::Number(1.0)),
                TokenKind::False => program.push(Instruction::Number(0.0)),
                TokenKind::Ident(name) => program.push(Instruction::Variable(name)),
                TokenKind::LParen => {
                    pending.push(Pending::Open);
                    continue;
                }
                TokenKind::Minus => {
                    pending.push(Pending::Prefix(UnaryOp::Neg));
                    continue;
                }
                TokenKind::Not => {
                    pending.push(Pending::Prefix(UnaryOp::Not));
                    continue;
                }
                // Unary plus.
                TokenKind::Plus => continue,
                other => {
                    return Err(ExprError::UnexpectedToken {
                        found: other.to_string(),
                        offset: tok.span.start,
                        expected: OPERAND.into(),
                    })
                }
            }
            expect_operand = false;
            continue;
        }

        if let Some(op) = BinaryOp::from_token(&tok.kind) {
            while let Some(&top) = pending.last() {
                let binds_tighter = top.precedence() > op.precedence()
                    || (top.precedence() == op.precedence() && !op.is_right_associative());
                if matches!(top, Pending::Open) || !binds_tighter {
                    break;
                }
                pending.pop();
                program.extend(top.instruction());
            }
            pending.push(Pending::Infix(op));
            expect_operand = true;
        } else if tok.kind == TokenKind::RParen {
            loop {
                match pending.pop() {
                    Some(Pending::Open) => break,
                    Some(top) => program.extend(top.instruction()),
                    None => {
                        return Err(ExprError::UnexpectedToken {
                            found: tok.kind.to_string(),
                            offset: tok.span.start,
                            expected: "end of expression".into(),
                        })
                    }
                }
            }
        } else {
            let expected = if pending.iter().any(|p| matches!(p, Pending::Open)) {
                "operator or ')'"
            } else {
                "end of expression"
            };
            return Err(ExprError::UnexpectedToken {
                found: tok.kind.to_string(),
                offset: tok.span.start,
                expected: expected.into(),
            });
        }
    }

    if expect_operand {
        return Err(ExprError::UnexpectedEnd {
            expected: OPERAND.into(),
        });
    }
    while let Some(top) = pending.pop() {
        match top.instruction() {
            Some(instruction) => program.push(instruction),
            None => {
                return Err(ExprError::UnexpectedEnd {
                    expected: "')'".into(),
                })
            }
        }
    }
    Ok(program)
}
