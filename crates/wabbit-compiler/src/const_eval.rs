//! Compile-time evaluation of global initializers.
//!
//! A global's initial value is embedded in the module's global section, so it
//! must be known at compile time. This module folds checked expressions built
//! from literals, operators, casts and references to already-folded constants.
//! Anything else (calls, memory access, variables, operations that would trap
//! at run time) does not fold, and the global is initialized by a store in the
//! entry function instead.

use std::fmt;

use rustc_hash::FxHashMap;
use wabbit_ast::{BinaryOp, Expr, Literal, Location, NodeId, UnaryOp};
use wabbit_core::ValueType;

use crate::check::Annotations;

/// A compile-time constant value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i32),
    Float(f64),
    Bool(bool),
    Char(char),
}

impl ConstValue {
    /// The zero value of a type, used for uninitialized globals.
    pub fn zero(ty: ValueType) -> Self {
        match ty {
            ValueType::Int => ConstValue::Int(0),
            ValueType::Float => ConstValue::Float(0.0),
            ValueType::Bool => ConstValue::Bool(false),
            ValueType::Char => ConstValue::Char('\0'),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ConstValue::Int(_) => ValueType::Int,
            ConstValue::Float(_) => ValueType::Float,
            ConstValue::Bool(_) => ValueType::Bool,
            ConstValue::Char(_) => ValueType::Char,
        }
    }

    /// The 32-bit integer representation of an int, bool or char.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            ConstValue::Int(v) => Some(v),
            ConstValue::Bool(v) => Some(v as i32),
            ConstValue::Char(c) => Some(c as u32 as i32),
            ConstValue::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ConstValue::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Literal> for ConstValue {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Int(v) => ConstValue::Int(v),
            Literal::Float(v) => ConstValue::Float(v),
            Literal::Bool(v) => ConstValue::Bool(v),
            Literal::Char(c) => ConstValue::Char(c),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v:?}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
            ConstValue::Char(c) => write!(f, "{c:?}"),
        }
    }
}

/// Constant expression evaluator.
///
/// Returns `None` for anything that cannot be evaluated at compile time.
pub struct ConstEvaluator<'a> {
    annotations: &'a Annotations,
    /// Folded values of constant definitions, by definition node.
    constants: &'a FxHashMap<NodeId, ConstValue>,
}

impl<'a> ConstEvaluator<'a> {
    pub fn new(annotations: &'a Annotations, constants: &'a FxHashMap<NodeId, ConstValue>) -> Self {
        Self {
            annotations,
            constants,
        }
    }

    /// Evaluate an expression as a constant value.
    pub fn eval(&self, expr: &Expr<'_>) -> Option<ConstValue> {
        match expr {
            Expr::Literal(lit) => Some(lit.value.into()),
            Expr::Unary(unary) => eval_unary(unary.op, self.eval(unary.operand)?),
            Expr::Binary(binary) => {
                let left = self.eval(binary.left)?;
                let right = self.eval(binary.right)?;
                eval_binary(left, binary.op, right)
            }
            Expr::Cast(cast) => eval_cast(self.eval(cast.value)?, cast.target),
            Expr::Location(Location::Named(named)) => {
                let def = self.annotations.resolution(named.id)?;
                self.constants.get(&def).copied()
            }
            Expr::Location(Location::Address(_)) | Expr::Call(_) => None,
        }
    }
}

fn eval_unary(op: UnaryOp, value: ConstValue) -> Option<ConstValue> {
    use ConstValue::*;
    match (op, value) {
        (UnaryOp::Plus, Int(_) | Float(_)) => Some(value),
        (UnaryOp::Neg, Int(v)) => Some(Int(v.wrapping_neg())),
        (UnaryOp::Neg, Float(v)) => Some(Float(-v)),
        (UnaryOp::Not, Bool(v)) => Some(Bool(!v)),
        // Growing memory is a run-time effect.
        _ => None,
    }
}

fn eval_binary(left: ConstValue, op: BinaryOp, right: ConstValue) -> Option<ConstValue> {
    use BinaryOp::*;
    use ConstValue::*;
    match (left, right) {
        (Int(l), Int(r)) => match op {
            Add => Some(Int(l.wrapping_add(r))),
            Sub => Some(Int(l.wrapping_sub(r))),
            Mul => Some(Int(l.wrapping_mul(r))),
            // Division by zero and overflow trap at run time.
            Div => l.checked_div(r).map(Int),
            _ => compare(l.cmp(&r), op).map(Bool),
        },
        (Float(l), Float(r)) => match op {
            Add => Some(Float(l + r)),
            Sub => Some(Float(l - r)),
            Mul => Some(Float(l * r)),
            Div => Some(Float(l / r)),
            _ => compare_float(l, r, op).map(Bool),
        },
        (Char(l), Char(r)) => compare(l.cmp(&r), op).map(Bool),
        (Bool(l), Bool(r)) => match op {
            Equal => Some(Bool(l == r)),
            NotEqual => Some(Bool(l != r)),
            LogicalAnd => Some(Bool(l && r)),
            LogicalOr => Some(Bool(l || r)),
            _ => None,
        },
        _ => None,
    }
}

fn compare(ordering: std::cmp::Ordering, op: BinaryOp) -> Option<bool> {
    use std::cmp::Ordering::*;
    match op {
        BinaryOp::Less => Some(ordering == Less),
        BinaryOp::LessEqual => Some(ordering != Greater),
        BinaryOp::Greater => Some(ordering == Greater),
        BinaryOp::GreaterEqual => Some(ordering != Less),
        BinaryOp::Equal => Some(ordering == Equal),
        BinaryOp::NotEqual => Some(ordering != Equal),
        _ => None,
    }
}

fn compare_float(l: f64, r: f64, op: BinaryOp) -> Option<bool> {
    match op {
        BinaryOp::Less => Some(l < r),
        BinaryOp::LessEqual => Some(l <= r),
        BinaryOp::Greater => Some(l > r),
        BinaryOp::GreaterEqual => Some(l >= r),
        BinaryOp::Equal => Some(l == r),
        BinaryOp::NotEqual => Some(l != r),
        _ => None,
    }
}

fn eval_cast(value: ConstValue, target: ValueType) -> Option<ConstValue> {
    use ConstValue::*;
    match (value, target) {
        (Int(v), ValueType::Float) => Some(Float(v as f64)),
        (Float(v), ValueType::Int) => {
            // Truncation of NaN or an out-of-range value traps at run time.
            let truncated = v.trunc();
            if truncated >= i32::MIN as f64 && truncated <= i32::MAX as f64 {
                Some(Int(truncated as i32))
            } else {
                None
            }
        }
        (Int(v), ValueType::Bool) => Some(Bool(v != 0)),
        (Float(v), ValueType::Bool) => Some(Bool(v != 0.0)),
        (Char(c), ValueType::Bool) => Some(Bool(c != '\0')),
        (value, target) if value.value_type() == target => Some(value),
        _ => None,
    }
}
