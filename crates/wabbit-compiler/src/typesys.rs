//! Operator and cast tables for the primitive types.
//!
//! These tables are the only place legal operator/type and cast/type
//! combinations are defined. Supporting a new combination means adding a
//! row here; the checker, constant folder and lowering all consult the same
//! rows.

use wabbit_ast::{BinaryOp, UnaryOp};
use wabbit_core::ValueType::{self, Bool, Char, Float, Int};

/// `(left, op, right) -> result` for every legal binary operation.
pub const BINARY_OPS: &[(ValueType, BinaryOp, ValueType, ValueType)] = &[
    (Int, BinaryOp::Add, Int, Int),
    (Int, BinaryOp::Sub, Int, Int),
    (Int, BinaryOp::Mul, Int, Int),
    (Int, BinaryOp::Div, Int, Int),
    (Int, BinaryOp::Less, Int, Bool),
    (Int, BinaryOp::LessEqual, Int, Bool),
    (Int, BinaryOp::Greater, Int, Bool),
    (Int, BinaryOp::GreaterEqual, Int, Bool),
    (Int, BinaryOp::Equal, Int, Bool),
    (Int, BinaryOp::NotEqual, Int, Bool),
    (Float, BinaryOp::Add, Float, Float),
    (Float, BinaryOp::Sub, Float, Float),
    (Float, BinaryOp::Mul, Float, Float),
    (Float, BinaryOp::Div, Float, Float),
    (Float, BinaryOp::Less, Float, Bool),
    (Float, BinaryOp::LessEqual, Float, Bool),
    (Float, BinaryOp::Greater, Float, Bool),
    (Float, BinaryOp::GreaterEqual, Float, Bool),
    (Float, BinaryOp::Equal, Float, Bool),
    (Float, BinaryOp::NotEqual, Float, Bool),
    (Char, BinaryOp::Less, Char, Bool),
    (Char, BinaryOp::LessEqual, Char, Bool),
    (Char, BinaryOp::Greater, Char, Bool),
    (Char, BinaryOp::GreaterEqual, Char, Bool),
    (Char, BinaryOp::Equal, Char, Bool),
    (Char, BinaryOp::NotEqual, Char, Bool),
    (Bool, BinaryOp::Equal, Bool, Bool),
    (Bool, BinaryOp::NotEqual, Bool, Bool),
    (Bool, BinaryOp::LogicalAnd, Bool, Bool),
    (Bool, BinaryOp::LogicalOr, Bool, Bool),
];

/// `(op, operand) -> result` for every legal unary operation.
pub const UNARY_OPS: &[(UnaryOp, ValueType, ValueType)] = &[
    (UnaryOp::Plus, Int, Int),
    (UnaryOp::Neg, Int, Int),
    (UnaryOp::Plus, Float, Float),
    (UnaryOp::Neg, Float, Float),
    (UnaryOp::Not, Bool, Bool),
    (UnaryOp::Grow, Int, Int),
];

/// `(from, to)` for every permitted cast.
pub const CASTS: &[(ValueType, ValueType)] = &[
    (Int, Int),
    (Float, Int),
    (Float, Float),
    (Int, Float),
    (Int, Bool),
    (Float, Bool),
    (Char, Bool),
    (Bool, Bool),
    (Char, Char),
];

/// Result type of `left op right`, or `None` if the combination is not supported.
pub fn binary_result(left: ValueType, op: BinaryOp, right: ValueType) -> Option<ValueType> {
    BINARY_OPS
        .iter()
        .find(|&&(l, o, r, _)| l == left && o == op && r == right)
        .map(|&(.., result)| result)
}

/// Result type of `op operand`, or `None` if the combination is not supported.
pub fn unary_result(op: UnaryOp, operand: ValueType) -> Option<ValueType> {
    UNARY_OPS
        .iter()
        .find(|&&(o, ty, _)| o == op && ty == operand)
        .map(|&(.., result)| result)
}

/// Whether a value of type `from` may be cast to `to`.
pub fn cast_allowed(from: ValueType, to: ValueType) -> bool {
    CASTS.contains(&(from, to))
}

/// Result type of casting `from` to `to`, or `None` if not permitted.
pub fn cast_result(from: ValueType, to: ValueType) -> Option<ValueType> {
    cast_allowed(from, to).then_some(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_stays_in_type() {
        for op in [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div] {
            assert_eq!(binary_result(Int, op, Int), Some(Int));
            assert_eq!(binary_result(Float, op, Float), Some(Float));
            assert_eq!(binary_result(Bool, op, Bool), None);
            assert_eq!(binary_result(Char, op, Char), None);
        }
    }

    #[test]
    fn no_mixed_operands() {
        for op in BinaryOp::ALL {
            assert_eq!(binary_result(Float, op, Int), None);
            assert_eq!(binary_result(Int, op, Float), None);
            assert_eq!(binary_result(Char, op, Int), None);
        }
    }

    #[test]
    fn comparisons_yield_bool() {
        for op in BinaryOp::ALL.into_iter().filter(|op| op.is_comparison()) {
            for ty in [Int, Float, Char] {
                assert_eq!(binary_result(ty, op, ty), Some(Bool), "{ty} {op} {ty}");
            }
        }
        assert_eq!(binary_result(Bool, BinaryOp::Less, Bool), None);
        assert_eq!(binary_result(Bool, BinaryOp::Equal, Bool), Some(Bool));
    }

    #[test]
    fn logical_only_on_bool() {
        assert_eq!(binary_result(Bool, BinaryOp::LogicalAnd, Bool), Some(Bool));
        assert_eq!(binary_result(Int, BinaryOp::LogicalOr, Int), None);
    }

    #[test]
    fn unary_table() {
        assert_eq!(unary_result(UnaryOp::Neg, Float), Some(Float));
        assert_eq!(unary_result(UnaryOp::Not, Bool), Some(Bool));
        assert_eq!(unary_result(UnaryOp::Not, Int), None);
        assert_eq!(unary_result(UnaryOp::Neg, Char), None);
        assert_eq!(unary_result(UnaryOp::Grow, Int), Some(Int));
        assert_eq!(unary_result(UnaryOp::Grow, Float), None);
    }

    #[test]
    fn casts() {
        assert_eq!(cast_result(Float, Int), Some(Int));
        assert_eq!(cast_result(Int, Float), Some(Float));
        assert_eq!(cast_result(Char, Bool), Some(Bool));
        assert_eq!(cast_result(Int, Char), None);
        assert_eq!(cast_result(Bool, Int), None);
    }

    #[test]
    fn tables_have_no_duplicate_keys() {
        for (i, a) in BINARY_OPS.iter().enumerate() {
            for b in &BINARY_OPS[i + 1..] {
                assert!((a.0, a.1, a.2) != (b.0, b.1, b.2), "duplicate row {a:?}");
            }
        }
        for (i, a) in UNARY_OPS.iter().enumerate() {
            for b in &UNARY_OPS[i + 1..] {
                assert!((a.0, a.1) != (b.0, b.1), "duplicate row {a:?}");
            }
        }
    }
}
