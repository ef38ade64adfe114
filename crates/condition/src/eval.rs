//! Condition compilation and evaluation.
//!
//! Evaluation runs in three stages:
//!
//! 1. lex the condition text,
//! 2. resolve every referenced symbol through the symbol table and the
//!    per-entity cache, recording a trace in first-encounter order,
//! 3. evaluate the parsed expression over the resolved values.
//!
//! Resolution happens before evaluation, so `&&`/`||` short-circuiting
//! never hides a symbol from the trace. Unknown symbols resolve to
//! `NaN` and are logged, never fatal. Operator semantics are loose:
//! operands coerce to numbers for arithmetic and relational operators,
//! comparisons involving `NaN` are false, equality is strict across
//! kinds, and `&&`/`||` yield an operand value rather than a forced
//! boolean. The trigger is the truthiness of the final value.

use indexmap::IndexMap;
use tracing::warn;

use crate::cache::{EvalCache, FactSource};
use crate::error::{ConditionError, Result};
use crate::symbols::Field;
use crate::token::{lex, Token, TokenKind};
use crate::value::Value;

// ── AST ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Symbol(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnaryOp {
    Not,
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

// ── Public surface ───────────────────────────────────────────────────────────

/// A compiled condition, ready to evaluate.
#[derive(Debug, Clone)]
pub struct Condition {
    expr: Expr,
    symbols: Vec<String>,
}

/// The outcome of evaluating one condition against one entity.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub triggered: bool,
    /// Symbol substitutions in first-encounter order.
    pub trace: IndexMap<String, Value>,
}

/// Compile a condition without evaluating it.
pub fn compile(text: &str) -> Result<Condition> {
    if text.trim().is_empty() {
        return Err(ConditionError::Empty);
    }
    let tokens = lex(text)?;
    let mut symbols: Vec<String> = Vec::new();
    for token in &tokens {
        if let TokenKind::Ident(name) = &token.kind {
            if !symbols.iter().any(|s| s == name) {
                symbols.push(name.clone());
            }
        }
    }
    let expr = Parser::new(tokens).parse()?;
    Ok(Condition { expr, symbols })
}

/// Compile and evaluate a condition against one entity key.
pub fn evaluate(
    text: &str,
    key: &str,
    cache: &mut EvalCache,
    source: &dyn FactSource,
) -> Result<Evaluation> {
    Ok(compile(text)?.evaluate(key, cache, source))
}

impl Condition {
    /// Symbols the expression references, in first-encounter order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Referenced symbols the symbol table does not know. They will
    /// resolve to `NaN` at evaluation time.
    pub fn unknown_symbols(&self) -> Vec<&str> {
        self.symbols
            .iter()
            .filter(|s| Field::from_symbol(s).is_none())
            .map(String::as_str)
            .collect()
    }

    pub fn evaluate(
        &self,
        key: &str,
        cache: &mut EvalCache,
        source: &dyn FactSource,
    ) -> Evaluation {
        let trace = self.resolve(key, cache, source);
        let triggered = eval_expr(&self.expr, &trace).truthy();
        Evaluation { triggered, trace }
    }

    fn resolve(
        &self,
        key: &str,
        cache: &mut EvalCache,
        source: &dyn FactSource,
    ) -> IndexMap<String, Value> {
        let mut trace = IndexMap::new();
        for name in &self.symbols {
            let value = match Field::from_symbol(name) {
                Some(field) => match cache.lookup(key, field, source) {
                    Some(value) => value,
                    None => {
                        warn!(key = %key, symbol = %name, "no fact for symbol, resolving to NaN");
                        Value::Num(f64::NAN)
                    }
                },
                None => {
                    warn!(symbol = %name, "unknown condition symbol, resolving to NaN");
                    Value::Num(f64::NAN)
                }
            };
            trace.insert(name.clone(), value);
        }
        trace
    }
}

// ── Parser ───────────────────────────────────────────────────────────────────

// Binding powers: higher binds tighter. The left power is checked
// against min_bp, the right power goes into the recursive call.
mod bp {
    pub const OR: (u8, u8) = (1, 2);
    pub const AND: (u8, u8) = (3, 4);
    pub const EQUALITY: (u8, u8) = (5, 6);
    pub const COMPARISON: (u8, u8) = (7, 8);
    pub const ADD: (u8, u8) = (9, 10);
    pub const MUL: (u8, u8) = (11, 12);
    pub const UNARY: u8 = 13;
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Expr> {
        let expr = self.parse_expr_bp(0)?;
        match self.peek_kind() {
            TokenKind::Eof => Ok(expr),
            other => Err(self.err(format!("unexpected trailing {other:?}"))),
        }
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;
        while let Some((l_bp, r_bp, op)) = infix_bp(self.peek_kind()) {
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr_bp(r_bp)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Literal(Value::Num(n)),
            TokenKind::Str(s) => Expr::Literal(Value::Str(s)),
            TokenKind::True => Expr::Literal(Value::Bool(true)),
            TokenKind::False => Expr::Literal(Value::Bool(false)),
            TokenKind::Ident(name) => Expr::Symbol(name),
            TokenKind::Bang => unary(UnaryOp::Not, self.parse_expr_bp(bp::UNARY)?),
            TokenKind::Minus => unary(UnaryOp::Neg, self.parse_expr_bp(bp::UNARY)?),
            TokenKind::Plus => unary(UnaryOp::Pos, self.parse_expr_bp(bp::UNARY)?),
            TokenKind::LParen => {
                let inner = self.parse_expr_bp(0)?;
                self.expect(&TokenKind::RParen)?;
                inner
            }
            other => {
                return Err(ConditionError::Parse {
                    pos: token.pos,
                    message: format!("unexpected {other:?}"),
                })
            }
        };
        Ok(expr)
    }

    fn peek_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.peek_kind() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {kind:?}, got {:?}", self.peek_kind())))
        }
    }

    fn err(&self, message: String) -> ConditionError {
        let pos = self.tokens.get(self.pos).map_or(0, |t| t.pos);
        ConditionError::Parse { pos, message }
    }
}

fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

fn infix_bp(kind: &TokenKind) -> Option<(u8, u8, BinaryOp)> {
    let ((l_bp, r_bp), op) = match kind {
        TokenKind::OrOr => (bp::OR, BinaryOp::Or),
        TokenKind::AndAnd => (bp::AND, BinaryOp::And),
        TokenKind::EqEq => (bp::EQUALITY, BinaryOp::Eq),
        TokenKind::NotEq => (bp::EQUALITY, BinaryOp::Ne),
        TokenKind::Lt => (bp::COMPARISON, BinaryOp::Lt),
        TokenKind::Le => (bp::COMPARISON, BinaryOp::Le),
        TokenKind::Gt => (bp::COMPARISON, BinaryOp::Gt),
        TokenKind::Ge => (bp::COMPARISON, BinaryOp::Ge),
        TokenKind::Plus => (bp::ADD, BinaryOp::Add),
        TokenKind::Minus => (bp::ADD, BinaryOp::Sub),
        TokenKind::Star => (bp::MUL, BinaryOp::Mul),
        TokenKind::Slash => (bp::MUL, BinaryOp::Div),
        TokenKind::Percent => (bp::MUL, BinaryOp::Rem),
        _ => return None,
    };
    Some((l_bp, r_bp, op))
}

// ── Evaluator ────────────────────────────────────────────────────────────────

fn eval_expr(expr: &Expr, env: &IndexMap<String, Value>) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Symbol(name) => env
            .get(name)
            .cloned()
            .unwrap_or(Value::Num(f64::NAN)),
        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, env);
            match op {
                UnaryOp::Not => Value::Bool(!value.truthy()),
                UnaryOp::Neg => Value::Num(-value.to_number()),
                UnaryOp::Pos => Value::Num(value.to_number()),
            }
        }
        Expr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => {
            let left = eval_expr(lhs, env);
            if left.truthy() {
                eval_expr(rhs, env)
            } else {
                left
            }
        }
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => {
            let left = eval_expr(lhs, env);
            if left.truthy() {
                left
            } else {
                eval_expr(rhs, env)
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            apply_binary(*op, eval_expr(lhs, env), eval_expr(rhs, env))
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Value {
    match op {
        // And/Or are short-circuited in eval_expr; these arms keep the
        // function total.
        BinaryOp::And => {
            if left.truthy() {
                right
            } else {
                left
            }
        }
        BinaryOp::Or => {
            if left.truthy() {
                left
            } else {
                right
            }
        }
        BinaryOp::Eq => Value::Bool(strict_eq(&left, &right)),
        BinaryOp::Ne => Value::Bool(!strict_eq(&left, &right)),
        BinaryOp::Lt => compare(&left, &right, std::cmp::Ordering::is_lt),
        BinaryOp::Le => compare(&left, &right, std::cmp::Ordering::is_le),
        BinaryOp::Gt => compare(&left, &right, std::cmp::Ordering::is_gt),
        BinaryOp::Ge => compare(&left, &right, std::cmp::Ordering::is_ge),
        BinaryOp::Add => match (&left, &right) {
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Value::Str(format!("{}{}", left.render(), right.render()))
            }
            _ => Value::Num(left.to_number() + right.to_number()),
        },
        BinaryOp::Sub => Value::Num(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Num(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Num(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Num(left.to_number() % right.to_number()),
    }
}

/// Equality never coerces: values of different kinds are never equal,
/// and `NaN` is not equal to anything, itself included.
fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => false,
    }
}

/// Relational comparison: string pairs compare lexicographically,
/// everything else coerces to numbers. A `NaN` on either side makes
/// the comparison false.
fn compare(left: &Value, right: &Value, pick: fn(std::cmp::Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    Value::Bool(ordering.is_some_and(pick))
}
