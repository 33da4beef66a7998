use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use super::bytecode::{BytecodeBlock, CellKind, Constant};
use crate::builtins::Operator;
use crate::types::Type;

pub type Shared<T> = Rc<RefCell<T>>;

/// Name-based environment chain. Each block scope and call frame gets a
/// child of the environment it runs in.
#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    parent: Option<Shared<Environment>>,
}

impl Environment {
    pub fn root() -> Shared<Environment> {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn child(parent: &Shared<Environment>) -> Shared<Environment> {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    pub fn parent(&self) -> Option<Shared<Environment>> {
        self.parent.clone()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None => self
                .parent
                .as_ref()
                .and_then(|parent| parent.borrow().get(name)),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.values.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

pub struct Closure {
    pub block: Rc<BytecodeBlock>,
    pub environment: Shared<Environment>,
    /// Signature produced by the block's type section.
    pub signature: Type,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("block", &self.block.name)
            .field("signature", &self.signature)
            .finish()
    }
}

/// A deferred operation on a type-level operand.
#[derive(Debug, Clone)]
pub enum Hole {
    Call { callee: Value, arguments: Vec<Value> },
    Subscript { target: Value, index: Value },
    Member { object: Value, field: String },
}

#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Shared<Vec<Value>>),
    Tuple(Shared<Vec<Value>>),
    Object(Shared<BTreeMap<String, Value>>),
    Function(Rc<Closure>),
    Native(&'static Operator),
    Type(Type),
    Hole(Rc<Hole>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(RefCell::new(items)))
    }

    pub fn object(fields: BTreeMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(fields)))
    }

    pub fn string(value: &str) -> Self {
        Value::String(Rc::from(value))
    }

    /// Heap cell kind, or `None` for immediates.
    pub fn cell_kind(&self) -> Option<CellKind> {
        match self {
            Value::Unit | Value::Bool(_) | Value::Number(_) => None,
            Value::String(_) => Some(CellKind::String),
            Value::Array(_) => Some(CellKind::Array),
            Value::Tuple(_) => Some(CellKind::Tuple),
            Value::Object(_) => Some(CellKind::Object),
            Value::Function(_) | Value::Native(_) => Some(CellKind::Function),
            Value::Type(_) => Some(CellKind::Type),
            Value::Hole(_) => Some(CellKind::Hole),
        }
    }

    pub fn is_type_level(&self) -> bool {
        matches!(self, Value::Type(_) | Value::Hole(_))
    }

    /// Zero value of a type, as produced by `NewValue`.
    pub fn default_for(ty: &Type) -> Value {
        match ty {
            Type::Name(name) => match name.as_str() {
                crate::types::BOOL => Value::Bool(false),
                crate::types::NUMBER => Value::Number(0.0),
                crate::types::STRING => Value::string(""),
                crate::types::TYPE => Value::Type(Type::void()),
                _ => Value::Unit,
            },
            Type::Array(_) => Value::array(Vec::new()),
            Type::Tuple(items) => Value::tuple(items.iter().map(Value::default_for).collect()),
            Type::Record(fields) => Value::object(
                fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), Value::default_for(ty)))
                    .collect(),
            ),
            Type::Union(lhs, _) => Value::default_for(lhs),
            Type::Binding(_, inner) => Value::default_for(inner),
            Type::Var(_) | Type::Function { .. } => Value::Unit,
        }
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Unit => Value::Unit,
            Constant::Bool(value) => Value::Bool(*value),
            Constant::Number(value) => Value::Number(*value),
            Constant::String(value) => Value::string(value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (index, value) in items.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (index, value) in items.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
            Value::Object(fields) => {
                write!(f, "{{")?;
                for (index, (key, value)) in fields.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Function(closure) => write!(f, "<function {}>", closure.block.name),
            Value::Native(operator) => write!(f, "<builtin {}>", operator.name),
            Value::Type(ty) => write!(f, "{ty}"),
            Value::Hole(_) => write!(f, "<hole>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Hole(a), Value::Hole(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
