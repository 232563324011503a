//! The compile environment consulted by rewrite rules.
//!
//! An [`Environment`] supplies the two services rules may need from the
//! surrounding compiler: names for freshly minted variables and compile-time
//! evaluation of constant subexpressions.

use std::cmp::Ordering;

use common_error::{eval_err, type_err, SiftError, SiftResult};
use sift_core::Value;
use sift_expr::{ArithOp, CompareOp, ExprId, ExprOp, ExprTree};

/// Services provided to rules by the surrounding compiler.
pub trait Environment {
    /// Evaluate the constant subtree rooted at `id`.
    ///
    /// Failures are ordinary query compile errors and abort the rewrite run.
    fn eval_const(&mut self, tree: &ExprTree, id: ExprId) -> SiftResult<Value>;

    /// Display name for a fresh variable.
    fn fresh_var_name(&mut self, hint: &str, counter: u64) -> String {
        format!("{hint}{counter}")
    }
}

/// Evaluates literals, constructors, logical operators, comparisons,
/// arithmetic and field access.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEnvironment;

impl Environment for DefaultEnvironment {
    fn eval_const(&mut self, tree: &ExprTree, id: ExprId) -> SiftResult<Value> {
        evaluate(tree, id)
    }
}

/// Evaluate a constant subtree.
pub fn evaluate(tree: &ExprTree, id: ExprId) -> SiftResult<Value> {
    let operand = |slot: usize| -> SiftResult<Value> {
        match tree.child(id, slot) {
            Some(child) => evaluate(tree, child),
            None => eval_err!("{} is missing operand {}", tree.kind(id), slot),
        }
    };
    let operands = || -> SiftResult<Vec<Value>> {
        tree.children(id).map(|child| evaluate(tree, child)).collect()
    };

    match tree.op(id) {
        ExprOp::Const(value) => Ok(value.clone()),
        ExprOp::ArrayCons => Ok(Value::Array(operands()?)),
        ExprOp::RecordCons(names) => Ok(Value::Record(
            names.iter().cloned().zip(operands()?).collect(),
        )),
        ExprOp::And => logical(operands()?, false),
        ExprOp::Or => logical(operands()?, true),
        ExprOp::Not => match operand(0)? {
            Value::Null => Ok(Value::Null),
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => type_err!("not expects a boolean, got {}", other.type_name()),
        },
        ExprOp::Compare(op) => compare(*op, &operand(0)?, &operand(1)?),
        ExprOp::Arith(op) => arith(*op, &operand(0)?, &operand(1)?),
        ExprOp::Field(name) => match operand(0)? {
            Value::Null => Ok(Value::Null),
            record @ Value::Record(_) => Ok(record.field(name).cloned().unwrap_or(Value::Null)),
            other => type_err!("cannot read field {} of a {}", name, other.type_name()),
        },
        other => eval_err!("{} cannot be evaluated at compile time", other.kind()),
    }
}

/// `and` when `dominant` is false, `or` when it is true.
///
/// The dominant literal wins over `null`, which wins over the other literal.
fn logical(operands: Vec<Value>, dominant: bool) -> SiftResult<Value> {
    let word = if dominant { "or" } else { "and" };
    let mut saw_null = false;
    for value in operands {
        match value {
            Value::Bool(b) if b == dominant => return Ok(Value::Bool(dominant)),
            Value::Bool(_) => {}
            Value::Null => saw_null = true,
            other => type_err!("{} expects booleans, got {}", word, other.type_name()),
        }
    }
    Ok(if saw_null {
        Value::Null
    } else {
        Value::Bool(!dominant)
    })
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> SiftResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let ordering = match (left, right) {
        (Value::Long(l), Value::Long(r)) => Some(l.cmp(r)),
        (Value::Long(_) | Value::Double(_), Value::Long(_) | Value::Double(_)) => {
            match (left.as_double(), right.as_double()) {
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => None,
            }
        }
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    };

    let result = match (op, ordering) {
        (CompareOp::Eq, Some(ordering)) => ordering == Ordering::Equal,
        (CompareOp::NotEq, Some(ordering)) => ordering != Ordering::Equal,
        (CompareOp::Eq, None) => left == right,
        (CompareOp::NotEq, None) => left != right,
        (CompareOp::Lt, Some(ordering)) => ordering == Ordering::Less,
        (CompareOp::LtEq, Some(ordering)) => ordering != Ordering::Greater,
        (CompareOp::Gt, Some(ordering)) => ordering == Ordering::Greater,
        (CompareOp::GtEq, Some(ordering)) => ordering != Ordering::Less,
        (_, None) => {
            return Err(SiftError::type_error(format!(
                "cannot compare {} {} {}",
                left.type_name(),
                op.symbol(),
                right.type_name()
            )))
        }
    };
    Ok(Value::Bool(result))
}

fn arith(op: ArithOp, left: &Value, right: &Value) -> SiftResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    match (left, right) {
        (Value::Long(l), Value::Long(r)) => {
            let (l, r) = (*l, *r);
            let result = match op {
                ArithOp::Add => l.checked_add(r),
                ArithOp::Subtract => l.checked_sub(r),
                ArithOp::Multiply => l.checked_mul(r),
                ArithOp::Divide => {
                    if r == 0 {
                        eval_err!("division by zero");
                    }
                    if l.checked_rem(r).is_some_and(|rem| rem != 0) {
                        return Ok(Value::Double(l as f64 / r as f64));
                    }
                    l.checked_div(r)
                }
            };
            match result {
                Some(value) => Ok(Value::Long(value)),
                None => Err(SiftError::value_error(format!(
                    "long overflow in {} {} {}",
                    l,
                    op.symbol(),
                    r
                ))),
            }
        }
        (Value::Long(_) | Value::Double(_), Value::Long(_) | Value::Double(_)) => {
            let (Some(l), Some(r)) = (left.as_double(), right.as_double()) else {
                eval_err!("expected numbers");
            };
            let value = match op {
                ArithOp::Add => l + r,
                ArithOp::Subtract => l - r,
                ArithOp::Multiply => l * r,
                ArithOp::Divide => {
                    if r == 0.0 {
                        eval_err!("division by zero");
                    }
                    l / r
                }
            };
            Ok(Value::Double(value))
        }
        _ => type_err!(
            "cannot apply {} to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_arith(op: ArithOp, l: Value, r: Value) -> SiftResult<Value> {
        let mut tree = ExprTree::new();
        let l = tree.constant(l);
        let r = tree.constant(r);
        let id = tree.arith(op, l, r).unwrap();
        DefaultEnvironment.eval_const(&tree, id)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            eval_arith(ArithOp::Add, Value::Long(2), Value::Long(3)).unwrap(),
            Value::Long(5)
        );
        assert_eq!(
            eval_arith(ArithOp::Divide, Value::Long(7), Value::Long(2)).unwrap(),
            Value::Double(3.5)
        );
        assert_eq!(
            eval_arith(ArithOp::Multiply, Value::Long(2), Value::Double(1.5)).unwrap(),
            Value::Double(3.0)
        );
        assert_eq!(
            eval_arith(ArithOp::Add, Value::Null, Value::Long(1)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_arithmetic_errors() {
        let err = eval_arith(ArithOp::Divide, Value::Long(1), Value::Long(0)).unwrap_err();
        assert_eq!(err.to_string(), "EvaluationError: division by zero");
        assert!(!err.is_internal());

        let err = eval_arith(ArithOp::Add, Value::from("a"), Value::Long(1)).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: cannot apply + to string and long");
        assert!(!err.is_internal());
        let err = eval_arith(ArithOp::Add, Value::Long(i64::MAX), Value::Long(1)).unwrap_err();
        assert!(matches!(err, SiftError::ValueError(_)));
    }

    #[test]
    fn test_logical_three_valued() {
        let t = Value::Bool(true);
        let f = Value::Bool(false);
        assert_eq!(logical(vec![t.clone(), Value::Null], false).unwrap(), Value::Null);
        assert_eq!(logical(vec![f.clone(), Value::Null], false).unwrap(), f);
        assert_eq!(logical(vec![t.clone(), Value::Null], true).unwrap(), t);
        assert_eq!(logical(vec![f.clone(), f.clone()], true).unwrap(), f);
        assert!(matches!(
            logical(vec![Value::Long(1)], false),
            Err(SiftError::TypeError(_))
        ));
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            compare(CompareOp::Lt, &Value::Long(1), &Value::Double(1.5)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            compare(CompareOp::Eq, &Value::from("a"), &Value::Long(1)).unwrap(),
            Value::Bool(false)
        );
        assert!(matches!(
            compare(CompareOp::Gt, &Value::from("a"), &Value::Long(1)),
            Err(SiftError::TypeError(_))
        ));
        assert_eq!(
            compare(CompareOp::GtEq, &Value::Null, &Value::Long(1)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_constructors_and_fields() {
        let mut tree = ExprTree::new();
        let one = tree.constant(1);
        let two = tree.constant(2);
        let arr = tree.array(vec![one, two]).unwrap();
        let rec = tree.record(vec![("xs".into(), arr)]).unwrap();
        let field = tree.field(rec, "xs").unwrap();
        assert_eq!(
            evaluate(&tree, field).unwrap(),
            Value::from(vec![1i64, 2])
        );

        let missing = tree.constant(Value::Record(vec![]));
        let lookup = tree.field(missing, "nope").unwrap();
        assert_eq!(evaluate(&tree, lookup).unwrap(), Value::Null);

        let call = tree.call("now", vec![]).unwrap();
        assert!(evaluate(&tree, call).is_err());
    }
}
