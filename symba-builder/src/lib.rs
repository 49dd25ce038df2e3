//! A fluent builder over [`symba_compute`]'s node algebra.
//!
//! [`Expression`] wraps a [`Node`] and sequences constructor calls, so
//! `3x + 4 = y` reads the way it is said:
//!
//! ```
//! use symba_builder::expression;
//!
//! let line = expression(3).times("x").plus(4).eq("y");
//! assert_eq!(line.to_string(), "(4 + -1*y + 3*x)^2");
//! ```
//!
//! Multi-operand constructions and pattern expressions use the typed stack
//! from [`stack`]: [`Expression::push`] opens a new stack frame, unary
//! operations transform the top, and the collapsing operations (`plus()`,
//! `times()`, …) fold the top back into what is below. The stack depth is
//! encoded in the type, so an unbalanced chain is a compile error, not a
//! runtime one.
//!
//! ```
//! use symba_builder::expression;
//!
//! // sin²x + cos²x, built without intermediate bindings
//! let expr = expression("x").sin().squared().push("x").cos().squared().plus();
//! assert_eq!(expr.simplified().to_string(), "1");
//! ```

pub mod matrix;
pub mod stack;

pub use matrix::{matrix, Matrix, MatrixError};
pub use stack::ExpressionStack;

use symba_compute::expr::{self, Node};
use symba_compute::simplify::{rules, simplify};
use symba_compute::{Assignments, EvalError, Substitutions};

/// Anything that can stand for a term in a fluent chain: numbers, variable
/// names, nodes, or other expressions.
pub trait IntoTerm {
    fn into_node(self) -> Node;
}

impl IntoTerm for Node {
    fn into_node(self) -> Node {
        self
    }
}

impl IntoTerm for &Node {
    fn into_node(self) -> Node {
        self.clone()
    }
}

impl IntoTerm for Expression {
    fn into_node(self) -> Node {
        self.node
    }
}

impl IntoTerm for &Expression {
    fn into_node(self) -> Node {
        self.node.clone()
    }
}

impl IntoTerm for f64 {
    fn into_node(self) -> Node {
        expr::constant(self)
    }
}

impl IntoTerm for i32 {
    fn into_node(self) -> Node {
        expr::constant(self.into())
    }
}

/// A name converts to the interned variable of that name.
impl IntoTerm for &str {
    fn into_node(self) -> Node {
        expr::variable(self)
    }
}

/// Starts a fluent chain from a term.
pub fn expression(t: impl IntoTerm) -> Expression {
    Expression {
        node: t.into_node(),
    }
}

/// `-t`
pub fn minus(t: impl IntoTerm) -> Expression {
    expression(t).times(-1)
}

pub fn abs(t: impl IntoTerm) -> Expression {
    expression(t).abs()
}

pub fn sin(t: impl IntoTerm) -> Expression {
    expression(t).sin()
}

pub fn cos(t: impl IntoTerm) -> Expression {
    expression(t).cos()
}

pub fn tan(t: impl IntoTerm) -> Expression {
    expression(t).tan()
}

/// An immutable expression under construction. Every operation returns a new
/// `Expression`; operations that change nothing return one sharing the same
/// node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    node: Node,
}

impl Expression {
    pub(crate) fn from_node(node: Node) -> Expression {
        Expression { node }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    fn wrap(self, node: Node) -> Expression {
        if node.ptr_eq(&self.node) {
            self
        } else {
            Expression { node }
        }
    }

    pub fn plus(self, t: impl IntoTerm) -> Expression {
        let node = expr::add(self.node.clone(), t.into_node());
        self.wrap(node)
    }

    pub fn minus(self, t: impl IntoTerm) -> Expression {
        let node = expr::sub(self.node.clone(), t.into_node());
        self.wrap(node)
    }

    pub fn times(self, t: impl IntoTerm) -> Expression {
        let node = expr::mult(self.node.clone(), t.into_node());
        self.wrap(node)
    }

    pub fn divided_by(self, t: impl IntoTerm) -> Expression {
        let node = expr::div(self.node.clone(), t.into_node());
        self.wrap(node)
    }

    pub fn to_the(self, t: impl IntoTerm) -> Expression {
        let node = expr::pow(self.node.clone(), t.into_node());
        self.wrap(node)
    }

    pub fn squared(self) -> Expression {
        self.to_the(2)
    }

    /// `(self - t)²`: zero exactly where the two sides agree.
    pub fn eq(self, t: impl IntoTerm) -> Expression {
        let node = expr::eq(self.node.clone(), t.into_node());
        self.wrap(node)
    }

    pub fn sin(self) -> Expression {
        let node = expr::sin(self.node.clone());
        self.wrap(node)
    }

    pub fn cos(self) -> Expression {
        let node = expr::cos(self.node.clone());
        self.wrap(node)
    }

    pub fn tan(self) -> Expression {
        let node = expr::tan(self.node.clone());
        self.wrap(node)
    }

    pub fn abs(self) -> Expression {
        let node = expr::abs(self.node.clone());
        self.wrap(node)
    }

    pub fn log(self) -> Expression {
        let node = expr::log(self.node.clone());
        self.wrap(node)
    }

    /// Opens a stack frame holding `t`, for multi-operand constructions.
    pub fn push(self, t: impl IntoTerm) -> ExpressionStack<Expression> {
        ExpressionStack::new(self, t.into_node())
    }

    /// The derivative with respect to a variable term. A non-variable
    /// argument poisons the result rather than panicking.
    pub fn derivative(&self, with: impl IntoTerm) -> Expression {
        let with = with.into_node();
        let node = match with.symbol() {
            Some(sym) => self.node.derivative(sym),
            None => expr::indeterminate(
                "derivative with respect to a non-variable",
                vec![self.node.clone(), with],
            ),
        };
        Expression { node }
    }

    pub fn eval(&self, assign: &Assignments) -> Result<f64, EvalError> {
        self.node.eval(assign)
    }

    pub fn apply(&self, subs: &Substitutions) -> Expression {
        let node = self.node.apply(subs);
        if node.ptr_eq(&self.node) {
            self.clone()
        } else {
            Expression { node }
        }
    }

    /// Runs the rewrite engine over this expression with the standard rule
    /// table.
    pub fn simplified(&self) -> Expression {
        Expression {
            node: simplify(&self.node, &rules::all()),
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.node.fmt(f)
    }
}

impl From<Expression> for Node {
    fn from(e: Expression) -> Node {
        e.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use symba_compute::expr::variable;

    fn assign(pairs: &[(&str, f64)]) -> Assignments {
        pairs
            .iter()
            .map(|(name, value)| (variable(name).symbol().unwrap(), *value))
            .collect()
    }

    #[test]
    fn readme_line_fit() {
        // a line through a known point has zero error and zero slope of the
        // error surface there, and positive curvature in both directions
        let line = expression(3).times("x").plus(4).eq("y");
        let solution = assign(&[("x", 7483.0), ("y", 22453.0)]);

        assert_eq!(line.eval(&solution), Ok(0.0));

        let dx = line.derivative("x");
        assert_eq!(dx.eval(&solution), Ok(0.0));
        let dy = line.derivative("y");
        assert_eq!(dy.eval(&solution), Ok(0.0));

        assert!(dx.derivative("x").eval(&solution).unwrap() > 0.0);
        assert!(dy.derivative("y").eval(&solution).unwrap() > 0.0);

        // the Hessian determinant vanishes: the minimum is a trough, not a pit
        let dxdy = dx.derivative("y");
        let hessian_det = dx
            .derivative("x")
            .times(dy.derivative("y"))
            .minus(dxdy.squared());
        assert_eq!(hessian_det.eval(&solution), Ok(0.0));
    }

    #[test]
    fn chains_canonicalize_as_they_build() {
        assert_eq!(expression(1).plus(2).to_string(), "3");
        assert_eq!(expression(1).plus("x").plus(2).to_string(), "3 + x");
        assert_eq!(expression("x").plus(0).to_string(), "x");
        assert_eq!(expression("x").plus("x").to_string(), "2*x");
        assert_eq!(expression(2).times("x").times(2).to_string(), "4*x");
        assert_eq!(expression("x").times("x").to_string(), "x^2");
        assert_eq!(
            expression(2)
                .times("x")
                .push(3)
                .push("x")
                .times()
                .times()
                .to_string(),
            "6*x^2"
        );
    }

    #[test]
    fn division_prints_as_a_negative_power() {
        // the negative-degree factor sorts before the constant
        assert_eq!(
            expression(2).push(3).push("x").times().divide().to_string(),
            "(3*x)^-1*2"
        );
    }

    #[test]
    fn stacked_construction_flattens() {
        // 1 + (x + (0 + 2)) → 3 + x
        let q = expression(1)
            .push("x")
            .push(0)
            .push(2)
            .plus()
            .plus()
            .plus();
        assert_eq!(q.to_string(), "3 + x");
    }

    #[test]
    fn no_op_operations_share_the_node() {
        let x = expression("x");
        let same = x.clone().plus(0);
        assert!(same.node().ptr_eq(x.node()));
    }

    #[test]
    fn substitution_rebuilds() {
        let expr = expression("x").abs();
        let mut subs = Substitutions::new();
        subs.insert(
            variable("x").symbol().unwrap(),
            variable("y"),
        );
        assert_eq!(expr.apply(&subs).to_string(), "abs(y)");
        assert_eq!(expr.apply(&Substitutions::new()), expr);
    }

    #[test]
    fn pythagorean_identity_through_the_builder() {
        let expr = expression("x")
            .sin()
            .squared()
            .push("x")
            .cos()
            .squared()
            .plus();
        assert_eq!(expr.simplified().to_string(), "1");
    }

    #[test]
    fn derivative_of_a_non_variable_poisons() {
        let d = expression("x").derivative(3);
        assert!(d.node().is_indeterminate());
    }
}
