//! Pattern matching over canonical expression trees.
//!
//! A *pattern* is an ordinary [`Node`] in which some variables are
//! placeholders (created with [`crate::expr::placeholder`] or
//! [`crate::expr::constant_placeholder`]). [`Node::matches`] matches a
//! pattern against the root of a subject; [`Node::search`] matches it
//! against every position in the tree, depth-first. Both return a
//! restartable, finite sequence of [`Match`]es; each match carries the bound
//! placeholder groups and a reconstruction continuation that rebuilds the
//! containing tree with just the matched position replaced, which is what
//! lets the rewrite engine apply a rule at any depth.
//!
//! # Commutative and associative matching
//!
//! Canonical sums and products are right-leaning chains of a flattened
//! operand multiset, so a literal left/right structural match would miss
//! most of the ways a pattern can apply. Chain matching therefore works on
//! the flattened operand sequences of pattern and subject: the syntactically
//! most complex pattern operands claim subject operands first (a complex
//! sub-pattern is the least likely to match, so it prunes the search
//! fastest), placeholders claim single operands, and a trailing placeholder
//! absorbs the re-associated remainder. Within [`Node::search`] a chain
//! match may also leave a sub-multiset of operands unconsumed; the
//! continuation reattaches them around the rewritten part, so a rule like
//! `sin²θ + cos²θ → 1` fires inside `sin²θ + cos²θ + z`.
//!
//! A placeholder that occurs twice must bind structurally equal subtrees
//! both times; conflicting candidate bindings are rejected, not merged.

use crate::expr::{self, Node, NodeKind};
use crate::symbol::{PlaceholderKind, Symbol};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Placeholder bindings produced by a match.
pub type Bindings = HashMap<Symbol, Node>;

/// One way a pattern applies to one position of a subject tree.
#[derive(Clone)]
pub struct Match {
    /// The subtree bound to each placeholder.
    pub bindings: Bindings,
    /// The matched position in the subject.
    pub site: Node,
    wrap: Rc<dyn Fn(Node) -> Node>,
}

impl Match {
    /// Rebuilds the full subject tree with the matched position replaced by
    /// `replacement`. The rebuild goes through the smart constructors, so
    /// the result is canonical.
    pub fn reconstruct(&self, replacement: Node) -> Node {
        (self.wrap)(replacement)
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("bindings", &self.bindings)
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}

/// A finite, restartable sequence of matches. Each call to
/// [`Node::matches`]/[`Node::search`] produces a fresh sequence that can be
/// consumed, counted, or re-driven independently.
pub struct Matches {
    inner: std::vec::IntoIter<Match>,
}

impl Matches {
    fn new(matches: Vec<Match>) -> Self {
        Self {
            inner: matches.into_iter(),
        }
    }
}

impl Iterator for Matches {
    type Item = Match;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl Node {
    /// Matches `pattern` against the root of this node only.
    pub fn matches(&self, pattern: &Node) -> Matches {
        let identity: Rc<dyn Fn(Node) -> Node> = Rc::new(|n| n);
        let mut out = Vec::new();
        for bindings in match_node(self, pattern, &Bindings::new()) {
            out.push(Match {
                bindings,
                site: self.clone(),
                wrap: identity.clone(),
            });
        }
        Matches::new(out)
    }

    /// Matches `pattern` against every position in this tree, depth-first,
    /// including partial chain positions of sums and products.
    pub fn search(&self, pattern: &Node) -> Matches {
        let mut out = Vec::new();
        search_rec(self, pattern, Rc::new(|n| n), &mut out);
        Matches::new(out)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum ChainKind {
    Sum,
    Product,
}

impl ChainKind {
    fn combine(self, a: Node, b: Node) -> Node {
        match self {
            ChainKind::Sum => expr::add(a, b),
            ChainKind::Product => expr::mult(a, b),
        }
    }
}

/// Collects the flattened operand sequence of a chain.
fn flatten(node: &Node, kind: ChainKind, out: &mut Vec<Node>) {
    match (kind, node.kind()) {
        (ChainKind::Sum, NodeKind::Sum(a, b)) | (ChainKind::Product, NodeKind::Product(a, b)) => {
            flatten(a, kind, out);
            flatten(b, kind, out);
        }
        _ => out.push(node.clone()),
    }
}

fn operands(node: &Node, kind: ChainKind) -> Vec<Node> {
    let mut out = Vec::new();
    flatten(node, kind, &mut out);
    out
}

/// Rebuilds a chain from an operand multiset. The operands came from a
/// canonical chain, so re-folding through the constructors cannot introduce
/// new merges; it only restores the chain shape.
fn reassociate(kind: ChainKind, ops: &[Node]) -> Node {
    let mut iter = ops.iter().rev().cloned();
    let mut acc = iter.next().expect("reassociate of an empty operand list");
    for op in iter {
        acc = kind.combine(op, acc);
    }
    acc
}

fn is_any_placeholder(node: &Node) -> bool {
    node.placeholder_kind() == Some(PlaceholderKind::Any)
}

fn bind(bindings: &Bindings, sym: Symbol, subject: &Node) -> Option<Bindings> {
    match bindings.get(&sym) {
        Some(existing) if existing == subject => Some(bindings.clone()),
        Some(_) => None,
        None => {
            let mut out = bindings.clone();
            out.insert(sym, subject.clone());
            Some(out)
        }
    }
}

/// Matches `pattern` against the whole of `subject`, extending `bindings`.
/// Returns every consistent extension.
fn match_node(subject: &Node, pattern: &Node, bindings: &Bindings) -> Vec<Bindings> {
    // indeterminate subjects never match anything
    if subject.is_indeterminate() {
        return Vec::new();
    }
    if let NodeKind::Variable(v) = pattern.kind() {
        return match pattern.placeholder_kind() {
            Some(PlaceholderKind::Any) => bind(bindings, v.sym, subject).into_iter().collect(),
            Some(PlaceholderKind::Constant) => match subject.kind() {
                NodeKind::Constant(_) => bind(bindings, v.sym, subject).into_iter().collect(),
                _ => Vec::new(),
            },
            None => match subject.kind() {
                NodeKind::Variable(s) if s.sym == v.sym => vec![bindings.clone()],
                _ => Vec::new(),
            },
        };
    }
    match (pattern.kind(), subject.kind()) {
        (NodeKind::Constant(p), NodeKind::Constant(s)) => {
            // overlap, not bit equality: differently-rounded equal constants
            // must still match
            if p.overlaps(*s) {
                vec![bindings.clone()]
            } else {
                Vec::new()
            }
        }
        (NodeKind::Sum(..), NodeKind::Sum(..)) => {
            chain_bindings(ChainKind::Sum, pattern, subject, bindings)
        }
        (NodeKind::Product(..), NodeKind::Product(..)) => {
            chain_bindings(ChainKind::Product, pattern, subject, bindings)
        }
        (NodeKind::Power(pa, pb), NodeKind::Power(sa, sb)) => {
            let mut out = Vec::new();
            for base_bindings in match_node(sa, pa, bindings) {
                out.extend(match_node(sb, pb, &base_bindings));
            }
            out
        }
        (NodeKind::Sine(p), NodeKind::Sine(s))
        | (NodeKind::Cosine(p), NodeKind::Cosine(s))
        | (NodeKind::AbsoluteValue(p), NodeKind::AbsoluteValue(s))
        | (NodeKind::Logarithm(p), NodeKind::Logarithm(s)) => match_node(s, p, bindings),
        _ => Vec::new(),
    }
}

fn chain_bindings(
    kind: ChainKind,
    pattern: &Node,
    subject: &Node,
    bindings: &Bindings,
) -> Vec<Bindings> {
    match_chain(kind, &operands(pattern, kind), &operands(subject, kind), bindings, false)
        .into_iter()
        .map(|(b, _)| b)
        .collect()
}

/// Matches a flattened pattern operand list against a flattened subject
/// operand multiset. Returns each consistent set of bindings together with
/// the unconsumed subject operands (always empty unless `allow_remainder`).
fn match_chain(
    kind: ChainKind,
    pattern_ops: &[Node],
    subject_ops: &[Node],
    bindings: &Bindings,
    allow_remainder: bool,
) -> Vec<(Bindings, Vec<Node>)> {
    // most complex first: composite sub-patterns and literals claim operands
    // before placeholders soak up what is left
    let mut order: Vec<&Node> = pattern_ops.iter().collect();
    order.sort_by(|a, b| b.complexity().cmp(&a.complexity()));

    let mut out = Vec::new();
    step(kind, &order, subject_ops.to_vec(), bindings.clone(), allow_remainder, &mut out);

    // a trailing pair of placeholders is orientation-sensitive (one of them
    // absorbs the remainder), so try both assignments
    let n = order.len();
    if n >= 2 {
        let (p1, p2) = (order[n - 2], order[n - 1]);
        if is_any_placeholder(p1) && is_any_placeholder(p2) && p1 != p2 {
            order.swap(n - 2, n - 1);
            step(kind, &order, subject_ops.to_vec(), bindings.clone(), allow_remainder, &mut out);
        }
    }
    out
}

fn step(
    kind: ChainKind,
    pattern_ops: &[&Node],
    remaining: Vec<Node>,
    bindings: Bindings,
    allow_remainder: bool,
    out: &mut Vec<(Bindings, Vec<Node>)>,
) {
    let Some((pattern, rest)) = pattern_ops.split_first() else {
        if remaining.is_empty() || allow_remainder {
            out.push((bindings, remaining));
        }
        return;
    };

    if rest.is_empty() && is_any_placeholder(pattern) {
        if remaining.is_empty() {
            return;
        }
        // the final placeholder takes the whole re-associated remainder …
        let whole = reassociate(kind, &remaining);
        for b in match_node(&whole, pattern, &bindings) {
            out.push((b, Vec::new()));
        }
        // … or, when a remainder may be left over, any single operand
        if allow_remainder && remaining.len() > 1 {
            for i in 0..remaining.len() {
                let mut rest_ops = remaining.clone();
                let subject = rest_ops.remove(i);
                for b in match_node(&subject, pattern, &bindings) {
                    out.push((b, rest_ops.clone()));
                }
            }
        }
        return;
    }

    for i in 0..remaining.len() {
        let mut rest_ops = remaining.clone();
        let subject = rest_ops.remove(i);
        for b in match_node(&subject, pattern, &bindings) {
            step(kind, rest, rest_ops.clone(), b, allow_remainder, out);
        }
    }
}

/// Emits the matches anchored at `node` itself, given the continuation that
/// re-wraps a replacement for this position into the full tree.
fn position_matches(
    node: &Node,
    pattern: &Node,
    wrap: &Rc<dyn Fn(Node) -> Node>,
    out: &mut Vec<Match>,
) {
    let chain_kind = match (pattern.kind(), node.kind()) {
        (NodeKind::Sum(..), NodeKind::Sum(..)) => Some(ChainKind::Sum),
        (NodeKind::Product(..), NodeKind::Product(..)) => Some(ChainKind::Product),
        _ => None,
    };
    match chain_kind {
        Some(kind) => {
            let pattern_ops = operands(pattern, kind);
            let subject_ops = operands(node, kind);
            for (bindings, remainder) in
                match_chain(kind, &pattern_ops, &subject_ops, &Bindings::new(), true)
            {
                let wrap = if remainder.is_empty() {
                    wrap.clone()
                } else {
                    let outer = wrap.clone();
                    let rest = reassociate(kind, &remainder);
                    Rc::new(move |n| outer(kind.combine(n, rest.clone())))
                        as Rc<dyn Fn(Node) -> Node>
                };
                out.push(Match {
                    bindings,
                    site: node.clone(),
                    wrap,
                });
            }
        }
        None => {
            for bindings in match_node(node, pattern, &Bindings::new()) {
                out.push(Match {
                    bindings,
                    site: node.clone(),
                    wrap: wrap.clone(),
                });
            }
        }
    }
}

fn search_rec(
    node: &Node,
    pattern: &Node,
    wrap: Rc<dyn Fn(Node) -> Node>,
    out: &mut Vec<Match>,
) {
    position_matches(node, pattern, &wrap, out);
    match node.kind() {
        NodeKind::Sum(a, b) | NodeKind::Product(a, b) | NodeKind::Power(a, b) => {
            let combine: fn(Node, Node) -> Node = match node.kind() {
                NodeKind::Sum(..) => expr::add,
                NodeKind::Product(..) => expr::mult,
                _ => expr::pow,
            };
            {
                let outer = wrap.clone();
                let right = b.clone();
                search_rec(
                    a,
                    pattern,
                    Rc::new(move |n| outer(combine(n, right.clone()))),
                    out,
                );
            }
            {
                let outer = wrap;
                let left = a.clone();
                search_rec(
                    b,
                    pattern,
                    Rc::new(move |n| outer(combine(left.clone(), n))),
                    out,
                );
            }
        }
        NodeKind::Sine(a) => {
            let outer = wrap;
            search_rec(a, pattern, Rc::new(move |n| outer(expr::sin(n))), out);
        }
        NodeKind::Cosine(a) => {
            let outer = wrap;
            search_rec(a, pattern, Rc::new(move |n| outer(expr::cos(n))), out);
        }
        NodeKind::AbsoluteValue(a) => {
            let outer = wrap;
            search_rec(a, pattern, Rc::new(move |n| outer(expr::abs(n))), out);
        }
        NodeKind::Logarithm(a) => {
            let outer = wrap;
            search_rec(a, pattern, Rc::new(move |n| outer(expr::log(n))), out);
        }
        NodeKind::Constant(_) | NodeKind::Variable(_) | NodeKind::Indeterminate(..) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{
        add, constant, cos, mult, placeholder, pow, sin, two, variable, zero,
    };
    use pretty_assertions::assert_eq;

    fn sym(node: &Node) -> Symbol {
        node.symbol().unwrap()
    }

    #[test]
    fn placeholder_matches_anything_once() {
        let p = placeholder("p");
        let subject = add(variable("x"), constant(1.0));
        let found: Vec<Match> = subject.matches(&p).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bindings[&sym(&p)], subject);
    }

    #[test]
    fn literal_leaves_match_only_themselves() {
        let x = variable("x");
        assert_eq!(x.matches(&x).count(), 1);
        assert_eq!(variable("y").matches(&x).count(), 0);
        assert_eq!(constant(2.0).matches(&constant(2.0)).count(), 1);
        assert_eq!(constant(2.0).matches(&constant(3.0)).count(), 0);
    }

    #[test]
    fn rounded_constants_still_match() {
        let folded = add(constant(0.1), constant(0.2));
        assert_eq!(folded.matches(&constant(0.3)).count(), 1);
    }

    #[test]
    fn kind_mismatch_yields_no_match() {
        let x = variable("x");
        let pattern = sin(placeholder("p"));
        assert_eq!(cos(x.clone()).matches(&pattern).count(), 0);
        assert_eq!(x.matches(&pattern).count(), 0);
    }

    #[test]
    fn commutative_root_match_over_reassociations() {
        let (p, q) = (placeholder("p"), placeholder("q"));
        let pattern = add(p.clone(), q.clone());
        let (x, y, z) = (variable("x"), variable("y"), variable("z"));

        let subject = add(constant(1.0), add(z.clone(), add(y.clone(), x.clone())));
        let found: Vec<Match> = subject.matches(&pattern).collect();
        assert!(!found.is_empty());
        // every split re-evaluates to the whole subject
        for m in &found {
            let rebuilt = add(
                m.bindings[&sym(&p)].clone(),
                m.bindings[&sym(&q)].clone(),
            );
            assert_eq!(rebuilt, subject);
        }

        // the same pattern matches a permuted construction with the same
        // binding sets, because construction order does not change the tree
        let permuted = add(add(x, add(y, z)), constant(1.0));
        assert_eq!(permuted, subject);
        assert_eq!(permuted.matches(&pattern).count(), found.len());
    }

    #[test]
    fn repeated_placeholders_must_agree() {
        let p = placeholder("p");
        let pattern = mult(p.clone(), sin(p.clone()));
        let x = variable("x");
        let good = mult(x.clone(), sin(x.clone()));
        assert_eq!(good.matches(&pattern).count(), 1);
        let bad = mult(variable("y"), sin(x));
        assert_eq!(bad.matches(&pattern).count(), 0);
    }

    #[test]
    fn constant_placeholders_reject_symbols() {
        let c = crate::expr::constant_placeholder("c");
        let pattern = mult(c.clone(), placeholder("rest"));
        let x = variable("x");
        assert!(mult(constant(3.0), x.clone()).matches(&pattern).count() > 0);
        assert_eq!(mult(variable("y"), x).matches(&pattern).count(), 0);
    }

    #[test]
    fn search_reaches_nested_positions() {
        let x = variable("x");
        let pattern = pow(placeholder("p"), two());
        let subject = add(constant(1.0), sin(pow(x.clone(), two())));
        let found: Vec<Match> = subject.search(&pattern).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].site, pow(x.clone(), two()));
        // reconstructing with a replacement swaps exactly that position
        let rebuilt = found[0].reconstruct(zero());
        assert_eq!(rebuilt, add(constant(1.0), sin(zero())));
    }

    #[test]
    fn search_matches_sub_multisets_of_chains() {
        let (x, z) = (variable("x"), variable("z"));
        let pattern = add(
            pow(sin(placeholder("p")), two()),
            pow(cos(placeholder("p")), two()),
        );
        let subject = add(
            pow(sin(x.clone()), two()),
            add(pow(cos(x.clone()), two()), z.clone()),
        );
        let m = subject
            .search(&pattern)
            .next()
            .expect("the pythagorean pair should be found inside the longer sum");
        assert_eq!(m.bindings[&sym(&placeholder("p"))], x);
        // the remainder z is reattached around the replacement
        assert_eq!(m.reconstruct(constant(1.0)), add(constant(1.0), z));
    }

    #[test]
    fn reconstruct_recanonicalizes() {
        let x = variable("x");
        let pattern = sin(placeholder("p"));
        let subject = add(sin(x.clone()), variable("y"));
        let m = subject.search(&pattern).next().unwrap();
        // replacing sin(x) with 0 lets the sum collapse
        assert_eq!(m.reconstruct(zero()), variable("y"));
    }

    #[test]
    fn matches_are_restartable() {
        let p = placeholder("p");
        let subject = add(variable("x"), constant(1.0));
        let first: Vec<Match> = subject.search(&p).collect();
        let second: Vec<Match> = subject.search(&p).collect();
        assert_eq!(first.len(), second.len());
    }
}
