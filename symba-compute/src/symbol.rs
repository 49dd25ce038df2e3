//! Interned identifiers for variables and pattern placeholders.
//!
//! Every variable is backed by a [`Symbol`], a process-unique creation-sequence
//! id handed out by a global counter. The id doubles as the canonical ordering
//! key for atomic factors in the degree comparator, so term order is stable
//! and deterministic even for anonymous variables (which have no name to sort
//! by).
//!
//! Interning goes through a [`SymbolTable`]: asking a table for the variable
//! `"x"` twice returns the *same* node (same allocation), which is what makes
//! identifier equality cheap everywhere else. A process-wide default table
//! backs the free functions in [`crate::expr`]; tests that need isolation can
//! construct their own table.

use crate::expr::Node;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// A process-unique identifier for a variable.
///
/// The wrapped id is a creation-sequence number: symbols created earlier
/// compare smaller. This is the documented total order used to break ties
/// between atomic factors during term ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

impl Symbol {
    /// Allocates the next id. Ids are never reused within a process.
    pub(crate) fn fresh() -> Self {
        Symbol(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

/// What a placeholder variable is allowed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Matches any subtree.
    Any,
    /// Matches only `Constant` nodes.
    Constant,
}

/// How a variable came to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymbolKind {
    /// A user-named variable.
    Named,
    /// An anonymous variable; its display name is generated from its id.
    Anon,
    /// A well-known mathematical constant (π, e) that evaluates without an
    /// assignment but otherwise behaves like a variable.
    Builtin(f64),
    /// A pattern-only variable, bound during matching and never evaluated.
    Placeholder(PlaceholderKind),
}

/// An intern table mapping identifiers to their canonical [`Node`] instances.
///
/// Named variables and placeholders live in separate namespaces so a rule
/// table using a placeholder `"x"` does not collide with a user variable
/// `"x"`.
pub struct SymbolTable {
    named: HashMap<String, Node>,
    placeholders: HashMap<String, Node>,
    pi: Node,
    e: Node,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            named: HashMap::new(),
            placeholders: HashMap::new(),
            pi: Node::make_variable(Symbol::fresh(), "π", SymbolKind::Builtin(std::f64::consts::PI)),
            e: Node::make_variable(Symbol::fresh(), "e", SymbolKind::Builtin(std::f64::consts::E)),
        }
    }

    /// The canonical node for the named variable, creating it on first use.
    pub fn variable(&mut self, name: &str) -> Node {
        if name == "π" {
            return self.pi.clone();
        }
        if name == "e" {
            return self.e.clone();
        }
        self.named
            .entry(name.to_string())
            .or_insert_with(|| Node::make_variable(Symbol::fresh(), name, SymbolKind::Named))
            .clone()
    }

    /// A fresh anonymous variable. Each call creates a new identity; the
    /// display name is derived from the id (`x7`, `x8`, …).
    pub fn anon(&mut self) -> Node {
        let sym = Symbol::fresh();
        Node::make_variable(sym, &format!("x{}", sym.id()), SymbolKind::Anon)
    }

    /// The canonical node for a pattern placeholder that matches anything.
    pub fn placeholder(&mut self, name: &str) -> Node {
        self.placeholder_of(name, PlaceholderKind::Any)
    }

    /// The canonical node for a pattern placeholder that matches only
    /// constants.
    pub fn constant_placeholder(&mut self, name: &str) -> Node {
        self.placeholder_of(name, PlaceholderKind::Constant)
    }

    fn placeholder_of(&mut self, name: &str, kind: PlaceholderKind) -> Node {
        self.placeholders
            .entry(name.to_string())
            .or_insert_with(|| {
                Node::make_variable(Symbol::fresh(), name, SymbolKind::Placeholder(kind))
            })
            .clone()
    }

    /// The circle constant as a variable node.
    pub fn pi(&self) -> Node {
        self.pi.clone()
    }

    /// Euler's number as a variable node.
    pub fn e(&self) -> Node {
        self.e.clone()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_TABLE: Lazy<Mutex<SymbolTable>> = Lazy::new(|| Mutex::new(SymbolTable::new()));

/// Runs `f` against the process-wide default intern table.
pub fn with_default_table<R>(f: impl FnOnce(&mut SymbolTable) -> R) -> R {
    let mut table = DEFAULT_TABLE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_returns_the_same_instance() {
        let mut table = SymbolTable::new();
        let a = table.variable("a");
        let b = table.variable("a");
        assert!(a.ptr_eq(&b));
        assert_ne!(a, table.variable("b"));
    }

    #[test]
    fn placeholders_do_not_collide_with_variables() {
        let mut table = SymbolTable::new();
        let var = table.variable("x");
        let ph = table.placeholder("x");
        assert_ne!(var, ph);
    }

    #[test]
    fn anonymous_variables_are_distinct_and_ordered() {
        let mut table = SymbolTable::new();
        let a = table.anon();
        let b = table.anon();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn isolated_tables_do_not_share_names() {
        let mut t1 = SymbolTable::new();
        let mut t2 = SymbolTable::new();
        assert_ne!(t1.variable("x"), t2.variable("x"));
    }
}
