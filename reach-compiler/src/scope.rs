use std::collections::HashMap;

use log::debug;

use crate::types::{Type, TypeTable, VarId};

#[derive(Debug, Default)]
struct ScopeFrame {
    values: HashMap<String, Type>,
    types: HashMap<String, Type>,
}

/// Lexical scopes with separate value and type namespaces.
#[derive(Debug, Default)]
pub struct Scope {
    frames: Vec<ScopeFrame>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(ScopeFrame::default());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    pub fn insert(&mut self, name: &str, ty: Type) {
        if let Some(frame) = self.frames.last_mut() {
            frame.values.insert(name.to_string(), ty);
        }
    }

    pub fn insert_type(&mut self, name: &str, ty: Type) {
        if let Some(frame) = self.frames.last_mut() {
            frame.types.insert(name.to_string(), ty);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.values.get(name))
    }

    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.types.get(name))
    }
}

#[derive(Debug, Default)]
struct UnificationFrame {
    introduced: Vec<VarId>,
}

/// Generalization frames. A variable's level is the depth of the frame it
/// was created in; popping a frame generalizes the variables that never
/// escaped it.
#[derive(Debug, Default)]
pub struct UnificationStack {
    frames: Vec<UnificationFrame>,
}

impl UnificationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(UnificationFrame::default());
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn new_var(&mut self, table: &mut TypeTable, name: &str, inferred: bool, rigid: bool) -> Type {
        let var = table.new_var(name, inferred, rigid, self.depth());
        self.record(var.id);
        Type::Var(var)
    }

    pub fn record(&mut self, id: VarId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.introduced.push(id);
        }
    }

    pub fn instantiate(&mut self, table: &mut TypeTable, ty: &Type) -> Type {
        let (instance, fresh) = table.instantiate(ty, self.depth());
        for var in fresh {
            self.record(var.id);
        }
        instance
    }

    /// Pops the innermost frame. Unbound variables created at or above its
    /// depth are generalized; the rest move to the frame matching their
    /// lowered level. Returns the generalized variables.
    pub fn pop(&mut self, table: &mut TypeTable) -> Vec<VarId> {
        let depth = self.depth();
        let Some(frame) = self.frames.pop() else {
            return Vec::new();
        };

        let mut generalized = Vec::new();
        for id in frame.introduced {
            if table.is_bound(id) || table.is_generalized(id) {
                continue;
            }
            let level = table.level(id);
            if level >= depth {
                table.generalize(id);
                generalized.push(id);
            } else if let Some(outer) = level
                .checked_sub(1)
                .and_then(|index| self.frames.get_mut(index))
            {
                outer.introduced.push(id);
            }
        }

        if !generalized.is_empty() {
            debug!(
                "generalized {} variable(s) at depth {depth}: {generalized:?}",
                generalized.len()
            );
        }
        generalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_bindings_shadow_outer_ones() {
        let mut scope = Scope::new();
        scope.push();
        scope.insert("x", Type::number());
        scope.push();
        scope.insert("x", Type::string());
        assert_eq!(scope.lookup("x"), Some(&Type::string()));
        scope.pop();
        assert_eq!(scope.lookup("x"), Some(&Type::number()));
        assert_eq!(scope.lookup_type("x"), None);
    }

    #[test]
    fn escaped_variables_move_to_the_outer_frame() {
        let mut table = TypeTable::new();
        let mut frames = UnificationStack::new();
        frames.push();
        let outer = frames.new_var(&mut table, "outer", false, false);
        frames.push();
        let inner = frames.new_var(&mut table, "inner", false, false);
        table
            .unify(&outer, &Type::array(inner.clone()))
            .expect("bind outer");

        assert!(frames.pop(&mut table).is_empty());

        let Type::Var(inner_var) = inner else {
            unreachable!()
        };
        assert!(!table.is_generalized(inner_var.id));
        assert_eq!(frames.pop(&mut table), vec![inner_var.id]);
    }
}
