//! The rule table: a catalog of named algebraic identities.
//!
//! Each [`Rule`] pairs a pattern — an expression built over placeholder
//! variables — with a rewrite function that receives the bound groups of a
//! match and produces the replacement subtree, or declines with `None` when
//! the bound groups don't satisfy its preconditions.
//!
//! Identities the smart constructors already apply at construction time
//! (`x+0 → x`, `x·x → x²`, constant folding, …) are deliberately absent:
//! neither their patterns nor their subjects can be built, because both
//! canonicalize away. The table carries what canonicalization cannot see —
//! trigonometric identities, power laws over symbolic exponents, logarithm
//! expansion, absolute-value algebra.

pub mod absolute;
pub mod combine;
pub mod logarithm;
pub mod power;
pub mod trigonometry;

use crate::expr::Node;
use crate::matching::Bindings;
use std::fmt;

/// A named algebraic identity: a pattern and the rewrite it licenses.
pub struct Rule {
    pub name: &'static str,
    pub pattern: Node,
    /// Builds the replacement for a match from its bound groups. `None`
    /// means the rule declines this particular match; the search engine
    /// treats that as "no successor", never as an error.
    pub rewrite: Box<dyn Fn(&Bindings) -> Option<Node>>,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Looks up the subtree bound to a placeholder node.
pub(crate) fn binding(groups: &Bindings, ph: &Node) -> Option<Node> {
    Some(groups.get(&ph.symbol()?)?.clone())
}

/// The full rule table.
pub fn all() -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(power::all());
    rules.extend(combine::all());
    rules.extend(trigonometry::all());
    rules.extend(logarithm::all());
    rules.extend(absolute::all());
    rules
}

#[cfg(test)]
mod tests {
    #[test]
    fn rule_names_are_unique() {
        let rules = super::all();
        let mut names: Vec<&str> = rules.iter().map(|r| r.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }
}
