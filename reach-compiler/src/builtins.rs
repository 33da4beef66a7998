use crate::runtime::{Value, VmError};
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Number,
    Bool,
    /// The operator's single type parameter.
    Any,
}

impl Operand {
    fn to_type(self, any: &Type) -> Type {
        match self {
            Operand::Number => Type::number(),
            Operand::Bool => Type::bool(),
            Operand::Any => any.clone(),
        }
    }
}

/// A binary operator bound by name in the root scope of both the checker
/// and the VM.
#[derive(Debug)]
pub struct Operator {
    pub name: &'static str,
    pub params: [Operand; 2],
    pub result: Operand,
    pub apply: fn(&Value, &Value) -> Result<Value, VmError>,
}

impl Operator {
    /// Signature of the operator, with `any` standing in for its type
    /// parameter.
    pub fn signature(&self, any: &Type) -> Type {
        Type::function(
            self.params.iter().map(|param| param.to_type(any)).collect(),
            self.result.to_type(any),
        )
    }
}

const ARITHMETIC: [Operand; 2] = [Operand::Number, Operand::Number];

pub static OPERATORS: [Operator; 10] = [
    Operator {
        name: "+",
        params: ARITHMETIC,
        result: Operand::Number,
        apply: add,
    },
    Operator {
        name: "-",
        params: ARITHMETIC,
        result: Operand::Number,
        apply: subtract,
    },
    Operator {
        name: "*",
        params: ARITHMETIC,
        result: Operand::Number,
        apply: multiply,
    },
    Operator {
        name: "/",
        params: ARITHMETIC,
        result: Operand::Number,
        apply: divide,
    },
    Operator {
        name: "%",
        params: ARITHMETIC,
        result: Operand::Number,
        apply: modulo,
    },
    Operator {
        name: "<",
        params: ARITHMETIC,
        result: Operand::Bool,
        apply: less,
    },
    Operator {
        name: "<=",
        params: ARITHMETIC,
        result: Operand::Bool,
        apply: less_equal,
    },
    Operator {
        name: ">",
        params: ARITHMETIC,
        result: Operand::Bool,
        apply: greater,
    },
    Operator {
        name: ">=",
        params: ARITHMETIC,
        result: Operand::Bool,
        apply: greater_equal,
    },
    Operator {
        name: "!=",
        params: [Operand::Any, Operand::Any],
        result: Operand::Bool,
        apply: not_equal,
    },
];

fn numbers(symbol: &str, lhs: &Value, rhs: &Value) -> Result<(f64, f64), VmError> {
    match (lhs, rhs) {
        (Value::Number(lhs), Value::Number(rhs)) => Ok((*lhs, *rhs)),
        _ => Err(VmError::Runtime(format!(
            "Operator `{symbol}` expects numbers, found `{lhs}` and `{rhs}`"
        ))),
    }
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers("+", lhs, rhs)?;
    Ok(Value::Number(lhs + rhs))
}

fn subtract(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers("-", lhs, rhs)?;
    Ok(Value::Number(lhs - rhs))
}

fn multiply(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers("*", lhs, rhs)?;
    Ok(Value::Number(lhs * rhs))
}

fn divide(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers("/", lhs, rhs)?;
    Ok(Value::Number(lhs / rhs))
}

fn modulo(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers("%", lhs, rhs)?;
    Ok(Value::Number(lhs % rhs))
}

fn less(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers("<", lhs, rhs)?;
    Ok(Value::Bool(lhs < rhs))
}

fn less_equal(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers("<=", lhs, rhs)?;
    Ok(Value::Bool(lhs <= rhs))
}

fn greater(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers(">", lhs, rhs)?;
    Ok(Value::Bool(lhs > rhs))
}

fn greater_equal(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    let (lhs, rhs) = numbers(">=", lhs, rhs)?;
    Ok(Value::Bool(lhs >= rhs))
}

fn not_equal(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    Ok(Value::Bool(lhs != rhs))
}
