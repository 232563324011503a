//! Variables bound by expressions.
//!
//! A variable is identified by a [`VarId`] handle into the tree's
//! [`VarTable`]. Names are for display only: two distinct variables may share
//! a name (for example after a subtree is cloned with fresh variables), and
//! decompiled text disambiguates them with the id.

use std::collections::HashMap;
use std::fmt;

/// Handle to a variable in a [`VarTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u32);

impl VarId {
    /// Get the index of this variable in its table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Registry of the variables created for one tree.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    names: Vec<String>,
    name_counts: HashMap<String, usize>,
}

impl VarTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new variable with the given display name.
    pub fn fresh(&mut self, name: impl Into<String>) -> VarId {
        let name = name.into();
        let id = VarId(self.names.len() as u32);
        *self.name_counts.entry(name.clone()).or_insert(0) += 1;
        self.names.push(name);
        id
    }

    /// Get the display name of a variable, without the leading `$`.
    pub fn name(&self, var: VarId) -> &str {
        self.names.get(var.index()).map_or("?", String::as_str)
    }

    /// Returns true if `var` was minted by this table.
    pub fn contains(&self, var: VarId) -> bool {
        var.index() < self.names.len()
    }

    /// Number of variables minted so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no variable was minted.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Render a variable reference, e.g. `$x`, or `$x#4` when the name is shared.
    pub fn display(&self, var: VarId) -> String {
        let name = self.name(var);
        if self.name_counts.get(name).copied().unwrap_or(0) > 1 {
            format!("${name}#{}", var.0)
        } else {
            format!("${name}")
        }
    }
}

/// Old-to-new variable mapping used while copying subtrees.
///
/// Callers may pre-populate entries to redirect free variables of the copied
/// subtree; binders inside the subtree that are not yet mapped receive fresh
/// variables during the copy.
#[derive(Debug, Clone, Default)]
pub struct VarMap {
    map: HashMap<VarId, VarId>,
}

impl VarMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `from` to `to`, returning the previous target.
    pub fn insert(&mut self, from: VarId, to: VarId) -> Option<VarId> {
        self.map.insert(from, to)
    }

    /// Look up the target of `var`.
    pub fn get(&self, var: VarId) -> Option<VarId> {
        self.map.get(&var).copied()
    }

    /// Get the target of `var`, or `var` itself when unmapped.
    pub fn resolve(&self, var: VarId) -> VarId {
        self.get(var).unwrap_or(var)
    }

    /// Returns true if `var` is mapped.
    pub fn contains(&self, var: VarId) -> bool {
        self.map.contains_key(&var)
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no entry exists.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_and_display() {
        let mut vars = VarTable::new();
        let x = vars.fresh("x");
        let y = vars.fresh("y");
        assert_ne!(x, y);
        assert_eq!(vars.display(x), "$x");
        assert_eq!(vars.name(y), "y");

        let x2 = vars.fresh("x");
        assert_eq!(vars.display(x), "$x#0");
        assert_eq!(vars.display(x2), "$x#2");
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn test_var_map() {
        let mut vars = VarTable::new();
        let a = vars.fresh("a");
        let b = vars.fresh("b");
        let mut map = VarMap::new();
        assert_eq!(map.resolve(a), a);
        map.insert(a, b);
        assert_eq!(map.resolve(a), b);
        assert!(map.contains(a));
        map.clear();
        assert!(map.is_empty());
    }
}
