//! The canonical expression tree and its smart constructors.
//!
//! Expressions are immutable, structurally shared [`Node`] trees. They are
//! never built directly from the enum: the smart constructors ([`add`],
//! [`mult`], [`pow`], [`sin`], [`cos`], [`abs`], [`log`]) establish and
//! maintain a canonical form, so every `Node` a caller can observe satisfies
//! the invariants below.
//!
//! # Canonical form
//!
//! - Sums and products are maximally flattened: no direct child of a `Sum` is
//!   itself a `Sum` (likewise for `Product`). Multi-operand sums/products are
//!   right-leaning chains — `a + b + c` is `Sum(a, Sum(b, c))`.
//! - Chain operands are kept in the total order defined by [`degree_cmp`],
//!   and like operands merge on the spot: sum terms sharing a
//!   coefficient-free part sum their coefficients (`x + 3x → 4x`), product
//!   factors sharing a base sum their exponents (`x · x⁻¹ → 1`). No two
//!   canonical siblings are like terms.
//! - Numeric subtrees fold eagerly through [`symba_interval`], and the
//!   identity eliminations `x+0 → x`, `x·0 → 0`, `x·1 → x`, `x^0 → 1`,
//!   `x^1 → x` apply at construction time.
//! - `Indeterminate` is absorbing: a constructor handed an indeterminate
//!   child returns a new indeterminate node referencing it.
//!
//! Because canonicalization is deterministic, *structural equality of
//! canonical nodes implies mathematical equivalence*: `x + 1 + x` and
//! `1 + 2x`, built in any order, are the same tree. The converse does not
//! hold — equivalences beyond canonicalization are the rewrite engine's job
//! (see [`crate::simplify`]).
//!
//! # Reference-identity no-ops
//!
//! Operations that change nothing return the original handle: `add(x, 0)`
//! gives back `x` itself, and [`Node::apply`] returns the identical node when
//! no substitution touched the tree. Callers can therefore detect "nothing
//! changed" with [`Node::ptr_eq`] instead of a structural walk. This is safe
//! because nodes are never mutated after construction.

mod iter;

use crate::symbol::{PlaceholderKind, Symbol, SymbolKind};
pub use iter::NodeIter;
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use symba_interval::Interval;
use thiserror::Error;

/// A numeric assignment for [`Node::eval`].
pub type Assignments = HashMap<Symbol, f64>;

/// A symbolic substitution for [`Node::apply`].
pub type Substitutions = HashMap<Symbol, Node>;

/// An immutable, structurally shared symbolic expression.
///
/// Cloning is cheap (a reference-count bump). The [`PartialEq`], [`Ord`] and
/// [`Hash`] implementations are mutually consistent structural operations:
/// `a == b` implies `a.hashcode() == b.hashcode()`, and `Ord` is the total
/// structural order used to break ties between atomic factors in
/// [`degree_cmp`].
#[derive(Debug, Clone)]
pub struct Node(Arc<NodeKind>);

/// A variable leaf: an interned identifier plus its display name and role.
#[derive(Debug, Clone)]
pub struct Var {
    pub sym: Symbol,
    pub name: Arc<str>,
    pub kind: SymbolKind,
}

/// The closed set of expression node variants.
///
/// Every operation over nodes (constructors, derivative, substitution,
/// evaluation, matching, complexity) matches exhaustively on this enum, so
/// adding a variant is a compile-visible change everywhere.
#[derive(Debug)]
pub enum NodeKind {
    /// A numeric constant as an interval of `f64` bounds; scalars are point
    /// intervals. Never contains NaN — indeterminate folds become
    /// [`NodeKind::Indeterminate`] instead.
    Constant(Interval),
    Variable(Var),
    /// Two operands; the right one may be another `Sum` (right-leaning
    /// chain), the left one never is.
    Sum(Node, Node),
    /// Same chain shape as `Sum`.
    Product(Node, Node),
    /// Base and exponent; the exponent is a full node.
    Power(Node, Node),
    Sine(Node),
    Cosine(Node),
    AbsoluteValue(Node),
    Logarithm(Node),
    /// An undefined algebraic result, carrying a message and the subtrees
    /// that produced it. Absorbs through every constructor.
    Indeterminate(String, Vec<Node>),
}

/// Evaluation failures surfaced by [`Node::eval`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("variable `{0}` is not bound in the assignment")]
    UnboundVariable(String),
    #[error("expression is indeterminate: {0}")]
    Indeterminate(String),
}

static ZERO: Lazy<Node> = Lazy::new(|| Node::new(NodeKind::Constant(Interval::point(0.0))));
static ONE: Lazy<Node> = Lazy::new(|| Node::new(NodeKind::Constant(Interval::point(1.0))));
static NEG_ONE: Lazy<Node> = Lazy::new(|| Node::new(NodeKind::Constant(Interval::point(-1.0))));
static TWO: Lazy<Node> = Lazy::new(|| Node::new(NodeKind::Constant(Interval::point(2.0))));

pub fn zero() -> Node {
    ZERO.clone()
}

pub fn one() -> Node {
    ONE.clone()
}

pub fn neg_one() -> Node {
    NEG_ONE.clone()
}

pub fn two() -> Node {
    TWO.clone()
}

/// A constant node for a scalar. The values of π and e are recognized and
/// returned as their builtin variable nodes, so `constant(PI)` participates
/// in symbolic trigonometric rules instead of hiding behind a float.
pub fn constant(value: f64) -> Node {
    if value == std::f64::consts::PI {
        return pi();
    }
    if value == std::f64::consts::E {
        return e();
    }
    constant_interval(Interval::point(value))
}

/// A constant node for an interval. NaN bounds — the interval primitive's
/// way of reporting an indeterminate form — are routed to an
/// [`NodeKind::Indeterminate`] node here, which is the only place they can
/// enter the tree.
pub fn constant_interval(value: Interval) -> Node {
    if value.is_nan() {
        return indeterminate("numeric fold produced an undefined form", Vec::new());
    }
    if value.is_point() {
        // share the ubiquitous small constants
        if value.lo == 0.0 {
            return zero();
        }
        if value.lo == 1.0 {
            return one();
        }
        if value.lo == -1.0 {
            return neg_one();
        }
        if value.lo == 2.0 {
            return two();
        }
    }
    Node::new(NodeKind::Constant(value))
}

/// The canonical node for a named variable, from the default intern table.
pub fn variable(name: &str) -> Node {
    crate::symbol::with_default_table(|t| t.variable(name))
}

/// A fresh anonymous variable from the default intern table.
pub fn anon_variable() -> Node {
    crate::symbol::with_default_table(|t| t.anon())
}

/// A pattern placeholder that matches any subtree.
pub fn placeholder(name: &str) -> Node {
    crate::symbol::with_default_table(|t| t.placeholder(name))
}

/// A pattern placeholder that matches only constants.
pub fn constant_placeholder(name: &str) -> Node {
    crate::symbol::with_default_table(|t| t.constant_placeholder(name))
}

pub fn pi() -> Node {
    crate::symbol::with_default_table(|t| t.pi())
}

pub fn e() -> Node {
    crate::symbol::with_default_table(|t| t.e())
}

/// An indeterminate node carrying a message and the offending subtrees.
pub fn indeterminate(message: impl Into<String>, parts: Vec<Node>) -> Node {
    Node::new(NodeKind::Indeterminate(message.into(), parts))
}

fn poison(parts: &[&Node]) -> Node {
    let carried = parts
        .iter()
        .filter(|p| p.is_indeterminate())
        .map(|p| (*p).clone())
        .collect();
    indeterminate("operand is indeterminate", carried)
}

/// Adds two canonical nodes, keeping the result canonical.
///
/// The left operand's chain is flattened into the right one; each incoming
/// term bubbles to its ordered position, and two terms with the same
/// coefficient-free part merge by summing coefficients.
pub fn add(a: Node, b: Node) -> Node {
    if a.is_indeterminate() || b.is_indeterminate() {
        return poison(&[&a, &b]);
    }
    // make right precedent: (a+b)+c => a+(b+c)
    if let NodeKind::Sum(aa, ab) = a.kind() {
        let (aa, ab) = (aa.clone(), ab.clone());
        return add(aa, add(ab, b));
    }
    if let NodeKind::Sum(ba, bb) = b.kind() {
        let (ba, bb) = (ba.clone(), bb.clone());
        let (a_coeff, a_term) = a.coefficient();
        let (b_coeff, b_term) = ba.coefficient();
        if a_term == b_term {
            return add(mult(constant_interval(a_coeff.add(b_coeff)), a_term), bb);
        }
        if degree_cmp(&a, &ba) == Ordering::Greater {
            return add(ba, add(a, bb));
        }
    } else {
        let (a_coeff, a_term) = a.coefficient();
        let (b_coeff, b_term) = b.coefficient();
        if a_term == b_term {
            return mult(constant_interval(a_coeff.add(b_coeff)), a_term);
        }
        if degree_cmp(&a, &b) == Ordering::Greater {
            return add(b, a);
        }
    }
    if a.is_zero() {
        return b;
    }
    Node::new(NodeKind::Sum(a, b))
}

/// `a - b` as `a + (-1)·b`.
pub fn sub(a: Node, b: Node) -> Node {
    add(a, mult(neg_one(), b))
}

/// Multiplies two canonical nodes, keeping the result canonical.
///
/// Two factors over the same base merge by summing exponents, which is also
/// where cancellation happens: `x · x⁻¹` folds to `x^0 = 1`.
pub fn mult(a: Node, b: Node) -> Node {
    if a.is_indeterminate() || b.is_indeterminate() {
        return poison(&[&a, &b]);
    }
    if let NodeKind::Product(aa, ab) = a.kind() {
        let (aa, ab) = (aa.clone(), ab.clone());
        return mult(aa, mult(ab, b));
    }
    if let NodeKind::Product(ba, bb) = b.kind() {
        let (ba, bb) = (ba.clone(), bb.clone());
        if let (NodeKind::Constant(ca), NodeKind::Constant(cb)) = (a.kind(), ba.kind()) {
            return mult(constant_interval(ca.mul(*cb)), bb);
        }
        let (a_exp, a_base) = a.exponent();
        let (b_exp, b_base) = ba.exponent();
        if a_base == b_base {
            return mult(pow(a_base, add(a_exp, b_exp)), bb);
        }
        if degree_cmp(&a, &ba) == Ordering::Greater {
            return mult(ba, mult(a, bb));
        }
    } else {
        if let (NodeKind::Constant(ca), NodeKind::Constant(cb)) = (a.kind(), b.kind()) {
            return constant_interval(ca.mul(*cb));
        }
        let (a_exp, a_base) = a.exponent();
        let (b_exp, b_base) = b.exponent();
        if a_base == b_base {
            return pow(a_base, add(a_exp, b_exp));
        }
        if degree_cmp(&a, &b) == Ordering::Greater {
            return mult(b, a);
        }
    }
    if a.is_zero() {
        return zero();
    }
    if a.is_one() {
        return b;
    }
    Node::new(NodeKind::Product(a, b))
}

/// `a / b` as `a · b⁻¹`. Division of anything by the constant zero is an
/// indeterminate node; division by a non-degenerate interval straddling zero
/// comes back from the interval primitive as `[-∞, +∞]`.
pub fn div(a: Node, b: Node) -> Node {
    if a.is_indeterminate() || b.is_indeterminate() {
        return poison(&[&a, &b]);
    }
    if b.is_zero() {
        return indeterminate("division by zero", vec![a]);
    }
    if a.is_zero() {
        return zero();
    }
    if b.is_one() {
        return a;
    }
    if b.as_constant().map(|c| c.is_point() && c.lo == -1.0) == Some(true) {
        return mult(neg_one(), a);
    }
    mult(a, pow(b, neg_one()))
}

/// Raises `a` to the power `b`. Constant bases fold through the interval
/// primitive; `x^0 → 1` and `x^1 → x` apply immediately. Nested powers are
/// deliberately *not* collapsed here — `x^y^z → x^(y·z)` is a rewrite rule,
/// so patterns over nested powers stay constructible.
pub fn pow(a: Node, b: Node) -> Node {
    if a.is_indeterminate() || b.is_indeterminate() {
        return poison(&[&a, &b]);
    }
    if b.is_zero() {
        return one();
    }
    if b.is_one() {
        return a;
    }
    if let (NodeKind::Constant(base), NodeKind::Constant(exp)) = (a.kind(), b.kind()) {
        return constant_interval(base.powf(*exp));
    }
    Node::new(NodeKind::Power(a, b))
}

/// `(a - b)²`: zero exactly when `a = b`, positive otherwise, so equations
/// can be encoded as least-squares error terms.
pub fn eq(a: Node, b: Node) -> Node {
    pow(sub(a, b), two())
}

pub fn sin(a: Node) -> Node {
    if a.is_indeterminate() {
        return poison(&[&a]);
    }
    if let NodeKind::Constant(c) = a.kind() {
        return constant_interval(c.monotone_map(f64::sin));
    }
    Node::new(NodeKind::Sine(a))
}

pub fn cos(a: Node) -> Node {
    if a.is_indeterminate() {
        return poison(&[&a]);
    }
    if let NodeKind::Constant(c) = a.kind() {
        return constant_interval(c.monotone_map(f64::cos));
    }
    Node::new(NodeKind::Cosine(a))
}

/// `tan a` as `sin a / cos a`; there is no tangent node kind.
pub fn tan(a: Node) -> Node {
    div(sin(a.clone()), cos(a))
}

pub fn abs(a: Node) -> Node {
    if a.is_indeterminate() {
        return poison(&[&a]);
    }
    if let NodeKind::Constant(c) = a.kind() {
        return constant_interval(c.abs());
    }
    Node::new(NodeKind::AbsoluteValue(a))
}

/// Natural logarithm. `log` of a negative constant is indeterminate.
pub fn log(a: Node) -> Node {
    if a.is_indeterminate() {
        return poison(&[&a]);
    }
    if let NodeKind::Constant(c) = a.kind() {
        return constant_interval(c.monotone_map(f64::ln));
    }
    Node::new(NodeKind::Logarithm(a))
}

/// The degree signature of a node: each atomic factor mapped to its integer
/// exponent, plus the total degree. Two nodes with equal signatures are
/// "like terms" and are merged by the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degree {
    factors: BTreeMap<Node, i64>,
    total: i64,
}

impl Degree {
    fn of_constant() -> Self {
        Self {
            factors: BTreeMap::new(),
            total: 0,
        }
    }

    fn of_atom(node: Node) -> Self {
        let mut factors = BTreeMap::new();
        factors.insert(node, 1);
        Self { factors, total: 1 }
    }

    fn merge(mut self, other: Self) -> Self {
        for (factor, degree) in other.factors {
            *self.factors.entry(factor).or_insert(0) += degree;
        }
        self.total += other.total;
        self
    }

    fn scale(mut self, n: i64) -> Self {
        for degree in self.factors.values_mut() {
            *degree *= n;
        }
        self.total *= n;
        self
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn factors(&self) -> &BTreeMap<Node, i64> {
        &self.factors
    }
}

/// The total term order used to sort sum/product operands.
///
/// Nodes without a degree signature (sums, powers with symbolic exponents)
/// sort after every monomial; among themselves they fall back to the
/// structural order. Signatures compare by absolute total degree first —
/// `x` and `x⁻¹` land adjacent so the product constructor can cancel them —
/// then by absolute per-factor degree across the union of atomic factors in
/// the structural key order (variables by creation-sequence id), and finally
/// by signed per-factor degree. The signed pass makes `Equal` coincide with
/// *identical* signatures: `x` and `x⁻¹` are neighbors but not equal, so a
/// sum never mistakes them for like terms.
pub fn degree_cmp(a: &Node, b: &Node) -> Ordering {
    match (a.degree(), b.degree()) {
        (None, None) => a.cmp(b),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(da), Some(db)) => {
            if da.total.abs() != db.total.abs() {
                return da.total.cmp(&db.total);
            }
            let mut keys: Vec<&Node> = da.factors.keys().chain(db.factors.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in &keys {
                let x = da.factors.get(*key).copied().unwrap_or(0);
                let y = db.factors.get(*key).copied().unwrap_or(0);
                if x.abs() != y.abs() {
                    return x.cmp(&y);
                }
            }
            for key in &keys {
                let x = da.factors.get(*key).copied().unwrap_or(0);
                let y = db.factors.get(*key).copied().unwrap_or(0);
                if x != y {
                    return x.cmp(&y);
                }
            }
            Ordering::Equal
        }
    }
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Node(Arc::new(kind))
    }

    pub(crate) fn make_variable(sym: Symbol, name: &str, kind: SymbolKind) -> Node {
        Node::new(NodeKind::Variable(Var {
            sym,
            name: Arc::from(name),
            kind,
        }))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0
    }

    /// True if `self` and `other` are the same allocation. Constructors and
    /// [`Node::apply`] return the original handle on no-ops, so this is the
    /// cheap "did anything change" test.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self.kind(), NodeKind::Constant(c) if c.is_point() && c.lo == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self.kind(), NodeKind::Constant(c) if c.is_point() && c.lo == 1.0)
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self.kind(), NodeKind::Indeterminate(..))
    }

    pub fn as_constant(&self) -> Option<Interval> {
        match self.kind() {
            NodeKind::Constant(c) => Some(*c),
            _ => None,
        }
    }

    /// The interned symbol, for variable leaves.
    pub fn symbol(&self) -> Option<Symbol> {
        match self.kind() {
            NodeKind::Variable(v) => Some(v.sym),
            _ => None,
        }
    }

    pub(crate) fn placeholder_kind(&self) -> Option<PlaceholderKind> {
        match self.kind() {
            NodeKind::Variable(Var {
                kind: SymbolKind::Placeholder(k),
                ..
            }) => Some(*k),
            _ => None,
        }
    }

    /// The degree signature, or `None` for sums and other non-monomial
    /// composites.
    pub fn degree(&self) -> Option<Degree> {
        match self.kind() {
            NodeKind::Constant(_) => Some(Degree::of_constant()),
            NodeKind::Variable(_)
            | NodeKind::Sine(_)
            | NodeKind::Cosine(_)
            | NodeKind::AbsoluteValue(_)
            | NodeKind::Logarithm(_) => Some(Degree::of_atom(self.clone())),
            NodeKind::Product(a, b) => match (a.degree(), b.degree()) {
                (Some(da), Some(db)) => Some(da.merge(db)),
                _ => None,
            },
            NodeKind::Power(base, exp) => {
                let exp = exp.as_constant()?;
                if !exp.is_point() || exp.lo.fract() != 0.0 || exp.lo.abs() > i32::MAX as f64 {
                    return None;
                }
                Some(base.degree()?.scale(exp.lo as i64))
            }
            NodeKind::Sum(..) | NodeKind::Indeterminate(..) => None,
        }
    }

    /// Splits a term into its numeric coefficient and the remaining factor:
    /// `3x → (3, x)`, `x → (1, x)`, `5 → (5, 1)`. Canonical products keep
    /// their constant factor leftmost, so one peek suffices.
    pub fn coefficient(&self) -> (Interval, Node) {
        match self.kind() {
            NodeKind::Constant(c) => (*c, one()),
            NodeKind::Product(a, b) => match a.kind() {
                NodeKind::Constant(c) => (*c, b.clone()),
                _ => (Interval::point(1.0), self.clone()),
            },
            _ => (Interval::point(1.0), self.clone()),
        }
    }

    /// Splits a factor into its exponent and base: `x² → (2, x)`,
    /// `x → (1, x)`.
    pub fn exponent(&self) -> (Node, Node) {
        match self.kind() {
            NodeKind::Power(base, exp) => (exp.clone(), base.clone()),
            _ => (one(), self.clone()),
        }
    }

    /// Structural complexity: the weighted node count used as the rewrite
    /// search's priority key. Products and function applications weigh
    /// double — a product compounds (it distributes, it couples factors)
    /// where a sum merely accumulates — so the search prefers `x^(y+1)` over
    /// `x·x^y` and `1` over `sin²θ + cos²θ`. Indeterminate nodes are heavily
    /// penalized so poisoned rewrites never win.
    pub fn complexity(&self) -> u64 {
        self.post_order_iter()
            .map(|node| match node.kind() {
                NodeKind::Constant(_) | NodeKind::Variable(_) => 1,
                NodeKind::Sum(..) | NodeKind::Power(..) => 1,
                NodeKind::Product(..) => 2,
                NodeKind::Sine(_)
                | NodeKind::Cosine(_)
                | NodeKind::AbsoluteValue(_)
                | NodeKind::Logarithm(_) => 2,
                NodeKind::Indeterminate(..) => 25,
            })
            .sum()
    }

    /// A structural hash consistent with `==`, as a plain integer.
    pub fn hashcode(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Left-to-right post-order traversal of the tree.
    pub fn post_order_iter(&self) -> NodeIter<'_> {
        NodeIter::new(self)
    }

    /// Substitutes variables by symbol. Returns the identical node (same
    /// allocation) when no subtree changed; otherwise rebuilds through the
    /// smart constructors, re-canonicalizing along the way.
    pub fn apply(&self, subs: &Substitutions) -> Node {
        match self.kind() {
            NodeKind::Constant(_) | NodeKind::Indeterminate(..) => self.clone(),
            NodeKind::Variable(v) => match subs.get(&v.sym) {
                Some(replacement) => replacement.clone(),
                None => self.clone(),
            },
            NodeKind::Sum(a, b) => {
                let (na, nb) = (a.apply(subs), b.apply(subs));
                if na.ptr_eq(a) && nb.ptr_eq(b) {
                    self.clone()
                } else {
                    add(na, nb)
                }
            }
            NodeKind::Product(a, b) => {
                let (na, nb) = (a.apply(subs), b.apply(subs));
                if na.ptr_eq(a) && nb.ptr_eq(b) {
                    self.clone()
                } else {
                    mult(na, nb)
                }
            }
            NodeKind::Power(a, b) => {
                let (na, nb) = (a.apply(subs), b.apply(subs));
                if na.ptr_eq(a) && nb.ptr_eq(b) {
                    self.clone()
                } else {
                    pow(na, nb)
                }
            }
            NodeKind::Sine(a) => {
                let na = a.apply(subs);
                if na.ptr_eq(a) {
                    self.clone()
                } else {
                    sin(na)
                }
            }
            NodeKind::Cosine(a) => {
                let na = a.apply(subs);
                if na.ptr_eq(a) {
                    self.clone()
                } else {
                    cos(na)
                }
            }
            NodeKind::AbsoluteValue(a) => {
                let na = a.apply(subs);
                if na.ptr_eq(a) {
                    self.clone()
                } else {
                    abs(na)
                }
            }
            NodeKind::Logarithm(a) => {
                let na = a.apply(subs);
                if na.ptr_eq(a) {
                    self.clone()
                } else {
                    log(na)
                }
            }
        }
    }

    /// Evaluates the tree numerically. Fails on variables missing from the
    /// assignment (builtins π and e supply their own values) and on
    /// indeterminate subtrees.
    pub fn eval(&self, assign: &Assignments) -> Result<f64, EvalError> {
        match self.kind() {
            NodeKind::Constant(c) => Ok(c.midpoint()),
            NodeKind::Variable(v) => match assign.get(&v.sym) {
                Some(value) => Ok(*value),
                None => match v.kind {
                    SymbolKind::Builtin(value) => Ok(value),
                    _ => Err(EvalError::UnboundVariable(v.name.to_string())),
                },
            },
            NodeKind::Sum(a, b) => Ok(a.eval(assign)? + b.eval(assign)?),
            NodeKind::Product(a, b) => Ok(a.eval(assign)? * b.eval(assign)?),
            NodeKind::Power(a, b) => Ok(a.eval(assign)?.powf(b.eval(assign)?)),
            NodeKind::Sine(a) => Ok(a.eval(assign)?.sin()),
            NodeKind::Cosine(a) => Ok(a.eval(assign)?.cos()),
            NodeKind::AbsoluteValue(a) => Ok(a.eval(assign)?.abs()),
            NodeKind::Logarithm(a) => Ok(a.eval(assign)?.ln()),
            NodeKind::Indeterminate(message, _) => Err(EvalError::Indeterminate(message.clone())),
        }
    }

    /// Rebuilds the whole tree bottom-up through the smart constructors.
    /// Canonicalization is idempotent, so this is a defensive re-sort used on
    /// rewrite-engine output before it is returned.
    pub fn resorted(&self) -> Node {
        match self.kind() {
            NodeKind::Constant(_) | NodeKind::Variable(_) | NodeKind::Indeterminate(..) => {
                self.clone()
            }
            NodeKind::Sum(a, b) => add(a.resorted(), b.resorted()),
            NodeKind::Product(a, b) => mult(a.resorted(), b.resorted()),
            NodeKind::Power(a, b) => pow(a.resorted(), b.resorted()),
            NodeKind::Sine(a) => sin(a.resorted()),
            NodeKind::Cosine(a) => cos(a.resorted()),
            NodeKind::AbsoluteValue(a) => abs(a.resorted()),
            NodeKind::Logarithm(a) => log(a.resorted()),
        }
    }

    /// Multi-line rendering with box-drawing characters, one node per line.
    pub fn tree_string(&self) -> String {
        fn walk(node: &Node, indent: &str) -> String {
            let binary = |op: &str, a: &Node, b: &Node| {
                format!(
                    "{op}\n{indent}├ {}\n{indent}└ {}",
                    walk(a, &format!("{indent}│ ")),
                    walk(b, &format!("{indent}  "))
                )
            };
            let func = |name: &str, a: &Node| {
                format!("{name}\n{indent}└ {}", walk(a, &format!("{indent}  ")))
            };
            match node.kind() {
                NodeKind::Sum(a, b) => binary("+", a, b),
                NodeKind::Product(a, b) => binary("*", a, b),
                NodeKind::Power(a, b) => binary("^", a, b),
                NodeKind::Sine(a) => func("sin", a),
                NodeKind::Cosine(a) => func("cos", a),
                NodeKind::AbsoluteValue(a) => func("abs", a),
                NodeKind::Logarithm(a) => func("ln", a),
                _ => node.to_string(),
            }
        }
        walk(self, "")
    }

    fn precedence(&self) -> u8 {
        match self.kind() {
            NodeKind::Sum(..) => 1,
            NodeKind::Product(..) => 2,
            NodeKind::Power(..) => 3,
            _ => 4,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self.kind() {
            NodeKind::Constant(_) => 0,
            NodeKind::Variable(_) => 1,
            NodeKind::Power(..) => 2,
            NodeKind::Product(..) => 3,
            NodeKind::Sum(..) => 4,
            NodeKind::Sine(_) => 5,
            NodeKind::Cosine(_) => 6,
            NodeKind::AbsoluteValue(_) => 7,
            NodeKind::Logarithm(_) => 8,
            NodeKind::Indeterminate(..) => 9,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The total structural order over nodes: kind rank first, then contents —
/// constants by `total_cmp` on their bounds, variables by creation-sequence
/// id, composites lexicographically by children. `Equal` coincides exactly
/// with `==`.
impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.ptr_eq(other) {
            return Ordering::Equal;
        }
        use NodeKind::*;
        match (self.kind(), other.kind()) {
            (Constant(a), Constant(b)) => {
                a.lo.total_cmp(&b.lo).then_with(|| a.hi.total_cmp(&b.hi))
            }
            (Variable(a), Variable(b)) => a.sym.cmp(&b.sym),
            (Sum(a1, b1), Sum(a2, b2))
            | (Product(a1, b1), Product(a2, b2))
            | (Power(a1, b1), Power(a2, b2)) => a1.cmp(a2).then_with(|| b1.cmp(b2)),
            (Sine(a), Sine(b))
            | (Cosine(a), Cosine(b))
            | (AbsoluteValue(a), AbsoluteValue(b))
            | (Logarithm(a), Logarithm(b)) => a.cmp(b),
            (Indeterminate(m1, c1), Indeterminate(m2, c2)) => {
                m1.cmp(m2).then_with(|| c1.cmp(c2))
            }
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

/// Consistent with `==`: float bounds hash by bit pattern, and NaN never
/// appears inside a `Constant` (indeterminate folds become
/// [`NodeKind::Indeterminate`] at construction).
impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self.kind() {
            NodeKind::Constant(c) => {
                c.lo.to_bits().hash(state);
                c.hi.to_bits().hash(state);
            }
            NodeKind::Variable(v) => v.sym.hash(state),
            NodeKind::Sum(a, b) | NodeKind::Product(a, b) | NodeKind::Power(a, b) => {
                a.hash(state);
                b.hash(state);
            }
            NodeKind::Sine(a)
            | NodeKind::Cosine(a)
            | NodeKind::AbsoluteValue(a)
            | NodeKind::Logarithm(a) => a.hash(state),
            NodeKind::Indeterminate(message, parts) => {
                message.hash(state);
                parts.hash(state);
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn child(f: &mut fmt::Formatter<'_>, node: &Node, min_prec: u8) -> fmt::Result {
            if node.precedence() < min_prec {
                write!(f, "({node})")
            } else {
                write!(f, "{node}")
            }
        }
        match self.kind() {
            NodeKind::Constant(c) => write!(f, "{}", c.midpoint()),
            NodeKind::Variable(v) => write!(f, "{}", v.name),
            NodeKind::Sum(a, b) => {
                child(f, a, 1)?;
                write!(f, " + ")?;
                child(f, b, 1)
            }
            NodeKind::Product(a, b) => {
                child(f, a, 2)?;
                write!(f, "*")?;
                child(f, b, 2)
            }
            NodeKind::Power(a, b) => {
                child(f, a, 4)?;
                write!(f, "^")?;
                child(f, b, 4)
            }
            NodeKind::Sine(a) => write!(f, "sin({a})"),
            NodeKind::Cosine(a) => write!(f, "cos({a})"),
            NodeKind::AbsoluteValue(a) => write!(f, "abs({a})"),
            NodeKind::Logarithm(a) => write!(f, "ln({a})"),
            NodeKind::Indeterminate(message, _) => write!(f, "[indeterminate: {message}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;
    use pretty_assertions::assert_eq;

    #[test]
    fn constant_folding_is_eager() {
        assert_eq!(add(constant(1.0), constant(2.0)), constant(3.0));
        assert_eq!(mult(constant(2.0), constant(3.0)), constant(6.0));
        assert_eq!(pow(constant(2.0), constant(10.0)), constant(1024.0));
        assert_eq!(sin(constant(0.0)).to_string(), "0");
    }

    #[test]
    fn identity_eliminations() {
        let x = variable("x");
        assert!(add(x.clone(), zero()).ptr_eq(&x));
        assert!(mult(x.clone(), one()).ptr_eq(&x));
        assert_eq!(mult(x.clone(), zero()), zero());
        assert_eq!(pow(x.clone(), zero()), one());
        assert!(pow(x.clone(), one()).ptr_eq(&x));
    }

    #[test]
    fn like_terms_merge_on_construction() {
        let x = variable("x");
        assert_eq!(add(x.clone(), x.clone()), mult(constant(2.0), x.clone()));
        assert_eq!(
            add(mult(constant(3.0), x.clone()), x.clone()),
            mult(constant(4.0), x.clone())
        );
        assert_eq!(sub(x.clone(), x.clone()), zero());
    }

    #[test]
    fn factors_merge_and_cancel() {
        let x = variable("x");
        assert_eq!(mult(x.clone(), x.clone()), pow(x.clone(), two()));
        // x * x^-1 cancels through the exponent merge
        assert_eq!(mult(x.clone(), pow(x.clone(), neg_one())), one());
        assert_eq!(
            mult(mult(constant(2.0), x.clone()), mult(constant(3.0), x.clone())),
            mult(constant(6.0), pow(x.clone(), two()))
        );
    }

    #[test]
    fn distinct_signatures_do_not_merge() {
        let x = variable("x");
        let y = variable("y");
        // y and y*x have different degree signatures
        let sum = add(y.clone(), mult(y.clone(), x.clone()));
        assert!(matches!(sum.kind(), NodeKind::Sum(..)));
        // x and x^2 differ in total degree, so the product keeps both factors
        let prod = mult(x.clone(), pow(x.clone(), two()));
        assert!(matches!(prod.kind(), NodeKind::Product(..)));
    }

    #[test]
    fn sums_flatten_regardless_of_construction_order() {
        let (x, y, z) = (variable("x"), variable("y"), variable("z"));
        let left_heavy = add(add(x.clone(), y.clone()), add(constant(1.0), z.clone()));
        let right_heavy = add(constant(1.0), add(z.clone(), add(y.clone(), x.clone())));
        assert_eq!(left_heavy, right_heavy);
        // no Sum is a direct child of a Sum on the left
        for node in left_heavy.post_order_iter() {
            if let NodeKind::Sum(a, _) = node.kind() {
                assert!(!matches!(a.kind(), NodeKind::Sum(..)));
            }
        }
    }

    #[test]
    fn comparator_is_antisymmetric_and_reflexive() {
        let mut table = SymbolTable::new();
        let nodes = [
            table.anon(),
            table.anon(),
            table.variable("a"),
            constant(4.0),
            mult(table.variable("a"), table.variable("b")),
            add(table.variable("a"), table.variable("b")),
            pow(table.variable("a"), two()),
            sin(table.variable("a")),
        ];
        for a in &nodes {
            assert_eq!(degree_cmp(a, a), Ordering::Equal);
            for b in &nodes {
                assert_eq!(degree_cmp(a, b), degree_cmp(b, a).reverse());
            }
        }
    }

    #[test]
    fn earlier_variables_sort_later() {
        // ported ordering fixture: with a, b, c created in sequence,
        // a > b > c under the comparator
        let mut table = SymbolTable::new();
        let (a, b, c) = (table.anon(), table.anon(), table.anon());
        assert_eq!(degree_cmp(&a, &b), Ordering::Greater);
        assert_eq!(degree_cmp(&b, &c), Ordering::Greater);
        assert_eq!(degree_cmp(&a, &c), Ordering::Greater);
        assert_eq!(degree_cmp(&c, &a), Ordering::Less);
    }

    #[test]
    fn equal_signatures_compare_equal() {
        let mut table = SymbolTable::new();
        let (a, b) = (table.variable("a"), table.variable("b"));
        assert_eq!(
            degree_cmp(&pow(a.clone(), two()), &mult(a.clone(), a.clone())),
            Ordering::Equal
        );
        assert_eq!(
            degree_cmp(&mult(a.clone(), b.clone()), &mult(b.clone(), a.clone())),
            Ordering::Equal
        );
        // x and x^-1 tie on absolute degree, so they sort adjacent, but the
        // signed tie-break keeps them distinct: only products may cancel them
        assert_eq!(
            degree_cmp(&a, &pow(a.clone(), neg_one())),
            Ordering::Greater
        );
    }

    #[test]
    fn reciprocal_terms_are_not_like_terms() {
        let x = variable("x");
        // x + 1/x must stay a two-term sum, not collapse to 2x
        let sum = add(x.clone(), pow(x.clone(), neg_one()));
        assert!(matches!(sum.kind(), NodeKind::Sum(..)));
        let mut assign = Assignments::new();
        assign.insert(x.symbol().unwrap(), 2.0);
        assert_eq!(sum.eval(&assign), Ok(2.5));
    }

    #[test]
    fn sums_sort_after_monomials() {
        let mut table = SymbolTable::new();
        let (a, b) = (table.variable("a"), table.variable("b"));
        let monomial = mult(a.clone(), b.clone());
        let sum = add(a.clone(), b.clone());
        assert_eq!(degree_cmp(&monomial, &sum), Ordering::Less);
        assert_eq!(degree_cmp(&sum, &monomial), Ordering::Greater);
        assert_eq!(degree_cmp(&sum, &sum), Ordering::Equal);
    }

    #[test]
    fn equal_sums_merge_in_products() {
        let x = variable("x");
        let s = add(x.clone(), one());
        assert_eq!(mult(s.clone(), s.clone()), pow(s.clone(), two()));
        // distinct sums stay distinct factors
        let t = add(x.clone(), two());
        assert!(matches!(mult(s.clone(), t.clone()).kind(), NodeKind::Product(..)));
    }

    #[test]
    fn indeterminate_absorbs() {
        let x = variable("x");
        let bad = div(one(), zero());
        assert!(bad.is_indeterminate());
        assert!(add(x.clone(), bad.clone()).is_indeterminate());
        assert!(mult(bad.clone(), x.clone()).is_indeterminate());
        assert!(sin(bad.clone()).is_indeterminate());
        assert!(pow(bad, x).is_indeterminate());
        // 0/0 at the interval level
        assert!(div(zero(), zero()).is_indeterminate());
    }

    #[test]
    fn inexact_constants_still_fold_together() {
        // 0.1 + 0.2 and 0.3 are different floats but overlapping intervals
        let folded = add(constant(0.1), constant(0.2));
        let c = folded.as_constant().unwrap();
        assert!(c.contains(0.1 + 0.2));
        assert!(c.overlaps(symba_interval::Interval::point(0.3)));
    }

    #[test]
    fn apply_preserves_identity_on_no_op() {
        let x = variable("x");
        let y = variable("y");
        let expr = add(pow(x.clone(), two()), y.clone());
        let no_op: Substitutions = HashMap::new();
        assert!(expr.apply(&no_op).ptr_eq(&expr));
        let mut subs = Substitutions::new();
        subs.insert(y.symbol().unwrap(), constant(0.0));
        // y ↦ 0 collapses the sum back to x^2
        assert_eq!(expr.apply(&subs), pow(x, two()));
    }

    #[test]
    fn eval_reports_unbound_variables() {
        let x = variable("x");
        let expr = add(x.clone(), one());
        assert_eq!(
            expr.eval(&Assignments::new()),
            Err(EvalError::UnboundVariable("x".into()))
        );
        let mut assign = Assignments::new();
        assign.insert(x.symbol().unwrap(), 2.0);
        assert_eq!(expr.eval(&assign), Ok(3.0));
        // builtins evaluate without an assignment
        assert_eq!(sin(pi()).eval(&Assignments::new()), Ok(std::f64::consts::PI.sin()));
    }

    #[test]
    fn hash_is_consistent_with_equality() {
        let x = variable("x");
        let a = add(mult(constant(2.0), x.clone()), one());
        let b = add(one(), add(x.clone(), x.clone()));
        assert_eq!(a, b);
        assert_eq!(a.hashcode(), b.hashcode());
    }

    #[test]
    fn display_matches_inline_format() {
        let x = variable("x");
        assert_eq!(add(constant(2.0), x.clone()).to_string(), "2 + x");
        assert_eq!(mult(constant(3.0), x.clone()).to_string(), "3*x");
        assert_eq!(pow(x.clone(), two()).to_string(), "x^2");
        assert_eq!(
            pow(mult(constant(3.0), x.clone()), neg_one()).to_string(),
            "(3*x)^-1"
        );
        assert_eq!(
            mult(constant(2.0), add(x.clone(), one())).to_string(),
            "2*(1 + x)"
        );
        assert_eq!(sin(x.clone()).to_string(), "sin(x)");
        assert!(div(one(), zero()).to_string().starts_with("[indeterminate"));
    }

    #[test]
    fn tree_format_draws_the_chain() {
        let x = variable("x");
        let rendered = add(one(), mult(two(), x)).tree_string();
        assert!(rendered.starts_with("+\n"));
        assert!(rendered.contains("├ 1"));
        assert!(rendered.contains("└ *"));
    }

    #[test]
    fn resorted_is_idempotent() {
        let x = variable("x");
        let expr = add(
            pow(sin(x.clone()), two()),
            add(mult(constant(3.0), x.clone()), one()),
        );
        assert_eq!(expr.resorted(), expr);
    }
}
