use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use log::trace;
use thiserror::Error;

pub type VarId = u32;

pub const VOID: &str = "Void";
pub const BOOL: &str = "Bool";
pub const NUMBER: &str = "Number";
pub const STRING: &str = "String";
pub const TYPE: &str = "Type";

const BUILTIN_NAMES: [&str; 5] = [VOID, BOOL, NUMBER, STRING, TYPE];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVar {
    pub id: VarId,
    pub name: String,
    /// Created for an inferred parameter.
    pub inferred: bool,
    /// Only unifies with itself.
    pub rigid: bool,
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "t{}", self.id)
        } else {
            f.write_str(&self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Var(TypeVar),
    Name(String),
    Array(Box<Type>),
    Tuple(Vec<Type>),
    Record(BTreeMap<String, Type>),
    Function {
        params: Vec<Type>,
        return_type: Box<Type>,
        /// Leading params that are implicit slots.
        implicit_count: usize,
    },
    Union(Box<Type>, Box<Type>),
    Binding(String, Box<Type>),
}

impl Type {
    pub fn void() -> Self {
        Type::Name(VOID.to_string())
    }

    pub fn bool() -> Self {
        Type::Name(BOOL.to_string())
    }

    pub fn number() -> Self {
        Type::Name(NUMBER.to_string())
    }

    pub fn string() -> Self {
        Type::Name(STRING.to_string())
    }

    pub fn type_type() -> Self {
        Type::Name(TYPE.to_string())
    }

    pub fn array(item: Type) -> Self {
        Type::Array(Box::new(item))
    }

    pub fn record<S: Into<String>>(fields: Vec<(S, Type)>) -> Self {
        Type::Record(
            fields
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        )
    }

    pub fn function(params: Vec<Type>, return_type: Type) -> Self {
        Type::Function {
            params,
            return_type: Box::new(return_type),
            implicit_count: 0,
        }
    }

    pub fn union(lhs: Type, rhs: Type) -> Self {
        Type::Union(Box::new(lhs), Box::new(rhs))
    }

    pub fn binding<S: Into<String>>(name: S, ty: Type) -> Self {
        Type::Binding(name.into(), Box::new(ty))
    }

    pub fn class(&self) -> TypeClass {
        match self {
            Type::Var(_) => TypeClass::Var,
            Type::Name(_) => TypeClass::Name,
            Type::Array(_) => TypeClass::Array,
            Type::Tuple(_) => TypeClass::Tuple,
            Type::Record(_) => TypeClass::Record,
            Type::Function { .. } => TypeClass::Function,
            Type::Union(..) => TypeClass::Union,
            Type::Binding(..) => TypeClass::Binding,
        }
    }

    /// Every variable occurring in the type, first occurrence first.
    pub fn variables(&self) -> Vec<&TypeVar> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        self.collect_variables(&mut seen, &mut found);
        found
    }

    fn collect_variables<'a>(&'a self, seen: &mut HashSet<VarId>, found: &mut Vec<&'a TypeVar>) {
        match self {
            Type::Var(var) => {
                if seen.insert(var.id) {
                    found.push(var);
                }
            }
            Type::Name(_) => {}
            Type::Array(item) => item.collect_variables(seen, found),
            Type::Tuple(items) => {
                for item in items {
                    item.collect_variables(seen, found);
                }
            }
            Type::Record(fields) => {
                for ty in fields.values() {
                    ty.collect_variables(seen, found);
                }
            }
            Type::Function {
                params,
                return_type,
                ..
            } => {
                for param in params {
                    param.collect_variables(seen, found);
                }
                return_type.collect_variables(seen, found);
            }
            Type::Union(lhs, rhs) => {
                lhs.collect_variables(seen, found);
                rhs.collect_variables(seen, found);
            }
            Type::Binding(_, inner) => inner.collect_variables(seen, found),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Var(var) => write!(f, "{var}"),
            Type::Name(name) => f.write_str(name),
            Type::Array(item) => match item.as_ref() {
                Type::Union(..) | Type::Function { .. } => write!(f, "({item})[]"),
                _ => write!(f, "{item}[]"),
            },
            Type::Tuple(items) => {
                let joined = items
                    .iter()
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({joined})")
            }
            Type::Record(fields) => {
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                let joined = fields
                    .iter()
                    .map(|(name, ty)| format!("{name}: {ty}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{ {joined} }}")
            }
            Type::Function {
                params,
                return_type,
                ..
            } => {
                let joined = params
                    .iter()
                    .map(|param| param.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({joined}) -> {return_type}")
            }
            Type::Union(lhs, rhs) => write!(f, "{lhs} | {rhs}"),
            Type::Binding(name, inner) => write!(f, "{name}: {inner}"),
        }
    }
}

/// Coarse classification of a type, as tested by `CheckType` and
/// `CheckTypeOf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeClass {
    AnyValue = 0,
    AnyType = 1,
    Name = 2,
    Var = 3,
    Array = 4,
    Tuple = 5,
    Record = 6,
    Function = 7,
    Union = 8,
    Binding = 9,
    Hole = 10,
}

impl TypeClass {
    const ALL: [TypeClass; 11] = [
        TypeClass::AnyValue,
        TypeClass::AnyType,
        TypeClass::Name,
        TypeClass::Var,
        TypeClass::Array,
        TypeClass::Tuple,
        TypeClass::Record,
        TypeClass::Function,
        TypeClass::Union,
        TypeClass::Binding,
        TypeClass::Hole,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeClass::AnyValue => "any-value",
            TypeClass::AnyType => "any-type",
            TypeClass::Name => "name",
            TypeClass::Var => "var",
            TypeClass::Array => "array",
            TypeClass::Tuple => "tuple",
            TypeClass::Record => "record",
            TypeClass::Function => "function",
            TypeClass::Union => "union",
            TypeClass::Binding => "binding",
            TypeClass::Hole => "hole",
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("Unification failure: expected `{expected}` but found `{found}`")]
    Mismatch { expected: Type, found: Type },
    #[error("Infinite type: `{var}` occurs in `{ty}`")]
    InfiniteType { var: Type, ty: Type },
    #[error("Missing field `{field}` in `{ty}`")]
    MissingField { field: String, ty: Type },
    #[error("Arity mismatch: expected {expected} but found {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("Unknown variable: `{0}`")]
    UnknownVariable(String),
    #[error("Unknown type: `{0}`")]
    UnknownType(String),
    #[error("failed to infer type variable `{0}`")]
    CannotInfer(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
struct VarEntry {
    level: usize,
    binding: Option<Type>,
    generalized: bool,
}

#[derive(Debug, Clone)]
enum TrailEntry {
    Binding { var: VarId, previous: Option<Type> },
    Level { var: VarId, previous: usize },
}

/// Position in the undo trail returned by [`TypeTable::snapshot`].
#[derive(Debug)]
#[must_use]
pub struct Snapshot(usize);

/// Union-find substitution over type variables.
///
/// Bindings, level changes and path compressions are recorded on a trail
/// while at least one snapshot is open, so a failed speculative unification
/// can be undone exactly.
#[derive(Debug, Default)]
pub struct TypeTable {
    vars: Vec<VarEntry>,
    trail: Vec<TrailEntry>,
    snapshots: usize,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_var(&mut self, name: &str, inferred: bool, rigid: bool, level: usize) -> TypeVar {
        let id = self.vars.len() as VarId;
        self.vars.push(VarEntry {
            level,
            binding: None,
            generalized: false,
        });
        TypeVar {
            id,
            name: name.to_string(),
            inferred,
            rigid,
        }
    }

    fn entry(&self, id: VarId) -> Option<&VarEntry> {
        self.vars.get(id as usize)
    }

    pub fn level(&self, id: VarId) -> usize {
        self.entry(id).map_or(0, |entry| entry.level)
    }

    pub fn is_bound(&self, id: VarId) -> bool {
        self.entry(id).map_or(false, |entry| entry.binding.is_some())
    }

    pub fn is_generalized(&self, id: VarId) -> bool {
        self.entry(id).map_or(false, |entry| entry.generalized)
    }

    pub fn generalize(&mut self, id: VarId) {
        if let Some(entry) = self.vars.get_mut(id as usize) {
            entry.generalized = true;
        }
    }

    fn binding(&self, id: VarId) -> Option<Type> {
        self.entry(id).and_then(|entry| entry.binding.clone())
    }

    fn set_binding(&mut self, id: VarId, ty: Type) {
        let Some(entry) = self.vars.get_mut(id as usize) else {
            return;
        };
        let previous = entry.binding.replace(ty);
        if self.snapshots > 0 {
            self.trail.push(TrailEntry::Binding { var: id, previous });
        }
    }

    fn set_level(&mut self, id: VarId, level: usize) {
        let Some(entry) = self.vars.get_mut(id as usize) else {
            return;
        };
        let previous = std::mem::replace(&mut entry.level, level);
        if self.snapshots > 0 {
            self.trail.push(TrailEntry::Level { var: id, previous });
        }
    }

    pub fn snapshot(&mut self) -> Snapshot {
        self.snapshots += 1;
        Snapshot(self.trail.len())
    }

    /// Undoes every change recorded since `snapshot` was taken.
    pub fn rollback_to(&mut self, snapshot: Snapshot) {
        while self.trail.len() > snapshot.0 {
            match self.trail.pop() {
                Some(TrailEntry::Binding { var, previous }) => {
                    if let Some(entry) = self.vars.get_mut(var as usize) {
                        entry.binding = previous;
                    }
                }
                Some(TrailEntry::Level { var, previous }) => {
                    if let Some(entry) = self.vars.get_mut(var as usize) {
                        entry.level = previous;
                    }
                }
                None => break,
            }
        }
        self.close_snapshot();
    }

    /// Keeps the changes made since `snapshot`. An enclosing snapshot can
    /// still undo them.
    pub fn commit(&mut self, _snapshot: Snapshot) {
        self.close_snapshot();
    }

    fn close_snapshot(&mut self) {
        self.snapshots = self.snapshots.saturating_sub(1);
        if self.snapshots == 0 {
            self.trail.clear();
        }
    }

    /// Follows variable bindings to the representative, compressing the
    /// path on the way back.
    pub fn resolve(&mut self, ty: &Type) -> Type {
        let Type::Var(var) = ty else {
            return ty.clone();
        };
        let Some(bound) = self.binding(var.id) else {
            return ty.clone();
        };
        let resolved = self.resolve(&bound);
        if matches!(bound, Type::Var(_)) && resolved != bound {
            self.set_binding(var.id, resolved.clone());
        }
        resolved
    }

    pub fn resolve_deep(&mut self, ty: &Type) -> Type {
        match self.resolve(ty) {
            Type::Var(var) => Type::Var(var),
            Type::Name(name) => Type::Name(name),
            Type::Array(item) => Type::array(self.resolve_deep(&item)),
            Type::Tuple(items) => Type::Tuple(
                items
                    .iter()
                    .map(|item| self.resolve_deep(item))
                    .collect(),
            ),
            Type::Record(fields) => Type::Record(
                fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), self.resolve_deep(ty)))
                    .collect(),
            ),
            Type::Function {
                params,
                return_type,
                implicit_count,
            } => Type::Function {
                params: params.iter().map(|param| self.resolve_deep(param)).collect(),
                return_type: Box::new(self.resolve_deep(&return_type)),
                implicit_count,
            },
            Type::Union(lhs, rhs) => Type::union(self.resolve_deep(&lhs), self.resolve_deep(&rhs)),
            Type::Binding(name, inner) => Type::binding(name, self.resolve_deep(&inner)),
        }
    }

    /// Replaces every generalized variable in `ty` by a fresh non-rigid
    /// variable at `level`. Returns the instance and the variables created.
    pub fn instantiate(&mut self, ty: &Type, level: usize) -> (Type, Vec<TypeVar>) {
        let mut mapping = HashMap::new();
        let mut fresh = Vec::new();
        let instance = self.instantiate_with(ty, level, &mut mapping, &mut fresh);
        (instance, fresh)
    }

    fn instantiate_with(
        &mut self,
        ty: &Type,
        level: usize,
        mapping: &mut HashMap<VarId, Type>,
        fresh: &mut Vec<TypeVar>,
    ) -> Type {
        match self.resolve(ty) {
            Type::Var(var) if self.is_generalized(var.id) => {
                if let Some(existing) = mapping.get(&var.id) {
                    return existing.clone();
                }
                let copy = self.new_var(&var.name, var.inferred, false, level);
                fresh.push(copy.clone());
                mapping.insert(var.id, Type::Var(copy.clone()));
                Type::Var(copy)
            }
            Type::Var(var) => Type::Var(var),
            Type::Name(name) => Type::Name(name),
            Type::Array(item) => Type::array(self.instantiate_with(&item, level, mapping, fresh)),
            Type::Tuple(items) => Type::Tuple(
                items
                    .iter()
                    .map(|item| self.instantiate_with(item, level, mapping, fresh))
                    .collect(),
            ),
            Type::Record(fields) => Type::Record(
                fields
                    .iter()
                    .map(|(name, ty)| {
                        (
                            name.clone(),
                            self.instantiate_with(ty, level, mapping, fresh),
                        )
                    })
                    .collect(),
            ),
            Type::Function {
                params,
                return_type,
                implicit_count,
            } => Type::Function {
                params: params
                    .iter()
                    .map(|param| self.instantiate_with(param, level, mapping, fresh))
                    .collect(),
                return_type: Box::new(self.instantiate_with(&return_type, level, mapping, fresh)),
                implicit_count,
            },
            Type::Union(lhs, rhs) => Type::union(
                self.instantiate_with(&lhs, level, mapping, fresh),
                self.instantiate_with(&rhs, level, mapping, fresh),
            ),
            Type::Binding(name, inner) => {
                Type::binding(name, self.instantiate_with(&inner, level, mapping, fresh))
            }
        }
    }

    /// Rewrites the variables named in `mapping`, leaving everything else
    /// untouched.
    pub fn substitute(&mut self, ty: &Type, mapping: &HashMap<VarId, Type>) -> Type {
        match self.resolve(ty) {
            Type::Var(var) => mapping.get(&var.id).cloned().unwrap_or(Type::Var(var)),
            Type::Name(name) => Type::Name(name),
            Type::Array(item) => Type::array(self.substitute(&item, mapping)),
            Type::Tuple(items) => Type::Tuple(
                items
                    .iter()
                    .map(|item| self.substitute(item, mapping))
                    .collect(),
            ),
            Type::Record(fields) => Type::Record(
                fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), self.substitute(ty, mapping)))
                    .collect(),
            ),
            Type::Function {
                params,
                return_type,
                implicit_count,
            } => Type::Function {
                params: params
                    .iter()
                    .map(|param| self.substitute(param, mapping))
                    .collect(),
                return_type: Box::new(self.substitute(&return_type, mapping)),
                implicit_count,
            },
            Type::Union(lhs, rhs) => {
                Type::union(self.substitute(&lhs, mapping), self.substitute(&rhs, mapping))
            }
            Type::Binding(name, inner) => Type::binding(name, self.substitute(&inner, mapping)),
        }
    }

    pub fn unify(&mut self, expected: &Type, found: &Type) -> Result<(), TypeError> {
        let expected = self.resolve(expected);
        let found = self.resolve(found);
        trace!("unify `{expected}` with `{found}`");

        match (&expected, &found) {
            (Type::Binding(_, inner), _) => self.unify(inner, &found),
            (_, Type::Binding(_, inner)) => self.unify(&expected, inner),
            (Type::Var(lhs), Type::Var(rhs)) if lhs.id == rhs.id => Ok(()),
            (Type::Var(var), _) if !var.rigid => self.bind(var, &found),
            (_, Type::Var(var)) if !var.rigid => self.bind(var, &expected),
            (Type::Union(lhs, rhs), _) => self.unify_either(&expected, lhs, rhs, &found, true),
            (_, Type::Union(lhs, rhs)) => self.unify_either(&found, lhs, rhs, &expected, false),
            (Type::Name(lhs), Type::Name(rhs)) if lhs == rhs => Ok(()),
            (Type::Array(lhs), Type::Array(rhs)) => self.unify(lhs, rhs),
            (Type::Tuple(lhs), Type::Tuple(rhs)) => {
                if lhs.len() != rhs.len() {
                    return Err(TypeError::ArityMismatch {
                        expected: lhs.len(),
                        found: rhs.len(),
                    });
                }
                for (lhs, rhs) in lhs.iter().zip(rhs.iter()) {
                    self.unify(lhs, rhs)?;
                }
                Ok(())
            }
            (Type::Record(lhs), Type::Record(rhs)) => {
                for (name, ty) in lhs {
                    match rhs.get(name) {
                        Some(other) => self.unify(ty, other)?,
                        None => {
                            return Err(TypeError::MissingField {
                                field: name.clone(),
                                ty: self.resolve_deep(&found),
                            })
                        }
                    }
                }
                if let Some(name) = rhs.keys().find(|name| !lhs.contains_key(*name)) {
                    return Err(TypeError::MissingField {
                        field: name.clone(),
                        ty: self.resolve_deep(&expected),
                    });
                }
                Ok(())
            }
            (
                Type::Function {
                    params: lhs_params,
                    return_type: lhs_return,
                    ..
                },
                Type::Function {
                    params: rhs_params,
                    return_type: rhs_return,
                    ..
                },
            ) => {
                if lhs_params.len() != rhs_params.len() {
                    return Err(TypeError::ArityMismatch {
                        expected: lhs_params.len(),
                        found: rhs_params.len(),
                    });
                }
                for (lhs, rhs) in lhs_params.iter().zip(rhs_params.iter()) {
                    self.unify(lhs, rhs)?;
                }
                self.unify(lhs_return, rhs_return)
            }
            _ => Err(self.mismatch(&expected, &found)),
        }
    }

    /// Tries the left member of a union against `other`, then the right one
    /// after undoing whatever the left attempt bound.
    fn unify_either(
        &mut self,
        union: &Type,
        lhs: &Type,
        rhs: &Type,
        other: &Type,
        union_expected: bool,
    ) -> Result<(), TypeError> {
        let snapshot = self.snapshot();
        let first = if union_expected {
            self.unify(lhs, other)
        } else {
            self.unify(other, lhs)
        };
        if first.is_ok() {
            self.commit(snapshot);
            return Ok(());
        }
        self.rollback_to(snapshot);

        let second = if union_expected {
            self.unify(rhs, other)
        } else {
            self.unify(other, rhs)
        };
        second.map_err(|_| {
            if union_expected {
                self.mismatch(union, other)
            } else {
                self.mismatch(other, union)
            }
        })
    }

    fn bind(&mut self, var: &TypeVar, ty: &Type) -> Result<(), TypeError> {
        if let Type::Var(other) = ty {
            if other.id == var.id {
                return Ok(());
            }
        }
        let level = self.level(var.id);
        if self.occurs(var.id, level, ty) {
            return Err(TypeError::InfiniteType {
                var: Type::Var(var.clone()),
                ty: self.resolve_deep(ty),
            });
        }
        trace!("bind `{var}` := `{ty}`");
        self.set_binding(var.id, ty.clone());
        Ok(())
    }

    /// Occurs check. Also lowers the level of every variable in `ty` to
    /// `level` so generalization sees the escape.
    fn occurs(&mut self, id: VarId, level: usize, ty: &Type) -> bool {
        match self.resolve(ty) {
            Type::Var(other) => {
                if other.id == id {
                    return true;
                }
                if self.level(other.id) > level {
                    self.set_level(other.id, level);
                }
                false
            }
            Type::Name(_) => false,
            Type::Array(item) => self.occurs(id, level, &item),
            Type::Tuple(items) => items.iter().any(|item| self.occurs(id, level, item)),
            Type::Record(fields) => fields.values().any(|ty| self.occurs(id, level, ty)),
            Type::Function {
                params,
                return_type,
                ..
            } => {
                params.iter().any(|param| self.occurs(id, level, param))
                    || self.occurs(id, level, &return_type)
            }
            Type::Union(lhs, rhs) => self.occurs(id, level, &lhs) || self.occurs(id, level, &rhs),
            Type::Binding(_, inner) => self.occurs(id, level, &inner),
        }
    }

    fn mismatch(&mut self, expected: &Type, found: &Type) -> TypeError {
        TypeError::Mismatch {
            expected: self.resolve_deep(expected),
            found: self.resolve_deep(found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(table: &mut TypeTable, name: &str) -> Type {
        Type::Var(table.new_var(name, false, false, 1))
    }

    #[test]
    fn binds_variable_to_concrete_type() {
        let mut table = TypeTable::new();
        let a = var(&mut table, "a");
        table.unify(&a, &Type::number()).expect("unify");
        assert_eq!(table.resolve(&a), Type::number());
    }

    #[test]
    fn compresses_variable_chains() {
        let mut table = TypeTable::new();
        let a = var(&mut table, "a");
        let b = var(&mut table, "b");
        let c = var(&mut table, "c");
        table.unify(&a, &b).expect("a ~ b");
        table.unify(&b, &c).expect("b ~ c");
        table.unify(&c, &Type::string()).expect("c ~ String");
        assert_eq!(table.resolve(&a), Type::string());
        let Type::Var(a_var) = &a else { unreachable!() };
        assert_eq!(table.binding(a_var.id), Some(Type::string()));
    }

    #[test]
    fn rejects_infinite_types() {
        let mut table = TypeTable::new();
        let a = var(&mut table, "a");
        let error = table
            .unify(&a, &Type::array(a.clone()))
            .expect_err("occurs check");
        assert!(matches!(error, TypeError::InfiniteType { .. }));
    }

    #[test]
    fn rigid_variables_only_match_themselves() {
        let mut table = TypeTable::new();
        let t = Type::Var(table.new_var("T", false, true, 1));
        let u = Type::Var(table.new_var("U", false, true, 1));
        assert!(table.unify(&t, &t).is_ok());
        assert!(matches!(
            table.unify(&t, &u),
            Err(TypeError::Mismatch { .. })
        ));
        assert!(table.unify(&t, &Type::number()).is_err());
    }

    #[test]
    fn failed_union_branch_is_rolled_back() {
        let mut table = TypeTable::new();
        let a = var(&mut table, "a");
        let left = Type::Tuple(vec![Type::number(), Type::string()]);
        let right = Type::Tuple(vec![Type::bool(), Type::bool()]);
        let found = Type::Tuple(vec![a.clone(), a.clone()]);

        table
            .unify(&Type::union(left, right), &found)
            .expect("right branch");
        assert_eq!(table.resolve(&a), Type::bool());
        assert!(table.trail.is_empty());
    }

    #[test]
    fn snapshot_rollback_restores_levels() {
        let mut table = TypeTable::new();
        let outer = Type::Var(table.new_var("outer", false, false, 1));
        let inner_var = table.new_var("inner", false, false, 3);
        let inner = Type::Var(inner_var.clone());

        let snapshot = table.snapshot();
        table
            .unify(&outer, &Type::array(inner.clone()))
            .expect("bind outer");
        assert_eq!(table.level(inner_var.id), 1);
        table.rollback_to(snapshot);

        assert_eq!(table.level(inner_var.id), 3);
        assert_eq!(table.resolve(&outer), outer);
    }

    #[test]
    fn instantiate_copies_generalized_variables_once() {
        let mut table = TypeTable::new();
        let t = table.new_var("T", false, true, 2);
        table.generalize(t.id);
        let identity = Type::function(vec![Type::Var(t.clone())], Type::Var(t));

        let (instance, fresh) = table.instantiate(&identity, 1);
        assert_eq!(fresh.len(), 1);
        assert!(!fresh[0].rigid);
        let Type::Function {
            params,
            return_type,
            ..
        } = instance
        else {
            panic!("expected function, found {instance:?}");
        };
        assert_eq!(params[0], *return_type);
        assert_eq!(params[0], Type::Var(fresh[0].clone()));
    }
}
