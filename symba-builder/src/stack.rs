//! The typed expression stack behind multi-operand fluent chains.
//!
//! [`super::Expression::push`] opens a frame; every further `push` nests
//! another. Unary operations (`sin`, `cos`, `abs`, `log`, `squared`,
//! `to_the`) transform the top of the stack in place, and the collapsing
//! operations (`plus`, `minus`, `times`, `divide`, `eq`) combine the top into
//! the frame below, returning it. The nesting depth lives in the type
//! parameter, so collapsing an empty stack is a compile error.

use super::{Expression, IntoTerm};
use symba_compute::expr::{self, Node};

/// A frame that can absorb a finished operand from the stack above it.
pub trait Builder: Sized {
    fn combine(self, op: fn(Node, Node) -> Node, operand: Node) -> Self;
}

impl Builder for Expression {
    fn combine(self, op: fn(Node, Node) -> Node, operand: Node) -> Self {
        let node = op(self.node().clone(), operand);
        if node.ptr_eq(self.node()) {
            self
        } else {
            Expression::from_node(node)
        }
    }
}

impl<P: Builder> Builder for ExpressionStack<P> {
    fn combine(self, op: fn(Node, Node) -> Node, operand: Node) -> Self {
        ExpressionStack {
            parent: self.parent,
            top: op(self.top, operand),
        }
    }
}

/// One stack frame: everything below, plus the operand on top.
#[derive(Debug, Clone)]
pub struct ExpressionStack<P> {
    parent: P,
    top: Node,
}

impl<P: Builder> ExpressionStack<P> {
    pub(crate) fn new(parent: P, top: Node) -> Self {
        Self { parent, top }
    }

    /// Pushes another operand on top of this one.
    pub fn push(self, t: impl IntoTerm) -> ExpressionStack<ExpressionStack<P>> {
        ExpressionStack {
            parent: self,
            top: t.into_node(),
        }
    }

    /// Collapses the stack: `below + top`.
    pub fn plus(self) -> P {
        self.parent.combine(expr::add, self.top)
    }

    /// Collapses the stack: `below - top`.
    pub fn minus(self) -> P {
        self.parent.combine(expr::sub, self.top)
    }

    /// Collapses the stack: `below · top`.
    pub fn times(self) -> P {
        self.parent.combine(expr::mult, self.top)
    }

    /// Collapses the stack: `below / top`.
    pub fn divide(self) -> P {
        self.parent.combine(expr::div, self.top)
    }

    /// Collapses the stack: `(below - top)²`.
    pub fn eq(self) -> P {
        self.parent.combine(expr::eq, self.top)
    }

    pub fn to_the(self, t: impl IntoTerm) -> Self {
        Self {
            parent: self.parent,
            top: expr::pow(self.top, t.into_node()),
        }
    }

    pub fn squared(self) -> Self {
        self.to_the(2)
    }

    pub fn sin(self) -> Self {
        Self {
            parent: self.parent,
            top: expr::sin(self.top),
        }
    }

    pub fn cos(self) -> Self {
        Self {
            parent: self.parent,
            top: expr::cos(self.top),
        }
    }

    pub fn tan(self) -> Self {
        Self {
            parent: self.parent,
            top: expr::tan(self.top),
        }
    }

    pub fn abs(self) -> Self {
        Self {
            parent: self.parent,
            top: expr::abs(self.top),
        }
    }

    pub fn log(self) -> Self {
        Self {
            parent: self.parent,
            top: expr::log(self.top),
        }
    }
}
