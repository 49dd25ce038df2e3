//! Symbolic differentiation by structural recursion.
//!
//! Every rule builds its result through the smart constructors, so
//! derivatives come out pre-canonicalized: `d(x²)/dx` is `2x` directly, not
//! `2·x¹·1`.

use crate::expr::{self, Node, NodeKind};
use crate::symbol::Symbol;

impl Node {
    /// The derivative of this expression with respect to `with`.
    pub fn derivative(&self, with: Symbol) -> Node {
        derivative(self, with)
    }
}

pub fn derivative(f: &Node, with: Symbol) -> Node {
    match f.kind() {
        NodeKind::Constant(_) => expr::zero(),
        NodeKind::Variable(v) => {
            if v.sym == with {
                expr::one()
            } else {
                expr::zero()
            }
        }
        // (f + g)' = f' + g'
        NodeKind::Sum(a, b) => expr::add(derivative(a, with), derivative(b, with)),
        // (f g)' = f' g + f g'
        NodeKind::Product(a, b) => expr::add(
            expr::mult(derivative(a, with), b.clone()),
            expr::mult(a.clone(), derivative(b, with)),
        ),
        NodeKind::Power(base, exp) => {
            let db = derivative(exp, with);
            let da = derivative(base, with);
            if db.is_zero() {
                // power rule: (f^n)' = n f^(n-1) f'
                expr::mult(
                    expr::mult(
                        exp.clone(),
                        expr::pow(base.clone(), expr::sub(exp.clone(), expr::one())),
                    ),
                    da,
                )
            } else {
                // general rule: (f^g)' = f^g (g' ln f + g f'/f)
                expr::mult(
                    f.clone(),
                    expr::add(
                        expr::mult(db, expr::log(base.clone())),
                        expr::mult(exp.clone(), expr::div(da, base.clone())),
                    ),
                )
            }
        }
        NodeKind::Sine(a) => expr::mult(expr::cos(a.clone()), derivative(a, with)),
        NodeKind::Cosine(a) => expr::mult(
            expr::neg_one(),
            expr::mult(expr::sin(a.clone()), derivative(a, with)),
        ),
        // abs(u)' = u' · u / abs(u)
        NodeKind::AbsoluteValue(a) => expr::mult(
            derivative(a, with),
            expr::div(a.clone(), expr::abs(a.clone())),
        ),
        NodeKind::Logarithm(a) => expr::div(derivative(a, with), a.clone()),
        NodeKind::Indeterminate(..) => f.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{
        abs, add, constant, cos, log, mult, pow, sin, sub, two, variable, Assignments,
    };
    use assert_float_eq::assert_float_absolute_eq;

    fn assign(pairs: &[(&Node, f64)]) -> Assignments {
        pairs
            .iter()
            .map(|(node, value)| (node.symbol().unwrap(), *value))
            .collect()
    }

    #[test]
    fn polynomial_power_rule() {
        let x = variable("x");
        let dx = pow(x.clone(), two()).derivative(x.symbol().unwrap());
        assert_eq!(dx, mult(two(), x.clone()));
        for x0 in [-2.5, 0.0, 1.0, 17.25] {
            let got = dx.eval(&assign(&[(&x, x0)])).unwrap();
            assert_float_absolute_eq!(got, 2.0 * x0, 1e-12);
        }
    }

    #[test]
    fn constants_and_foreign_variables_vanish() {
        let x = variable("x");
        let y = variable("y");
        let wrt = x.symbol().unwrap();
        assert!(constant(42.0).derivative(wrt).is_zero());
        assert!(y.derivative(wrt).is_zero());
        assert_eq!(x.derivative(wrt), crate::expr::one());
    }

    #[test]
    fn stationary_minimum_of_a_square() {
        let x = variable("x");
        let wrt = x.symbol().unwrap();
        let parabola = pow(sub(x.clone(), constant(3.0)), two());
        let slope = parabola.derivative(wrt);
        assert_float_absolute_eq!(slope.eval(&assign(&[(&x, 3.0)])).unwrap(), 0.0, 1e-12);
        // second derivative is non-negative around the minimum
        let curvature = slope.derivative(wrt);
        for x0 in [2.9, 3.0, 3.1] {
            assert!(curvature.eval(&assign(&[(&x, x0)])).unwrap() >= 0.0);
        }
    }

    #[test]
    fn product_rule() {
        let x = variable("x");
        let wrt = x.symbol().unwrap();
        // d(x · sin x) = sin x + x cos x
        let d = mult(x.clone(), sin(x.clone())).derivative(wrt);
        for x0 in [0.3f64, 1.7, -2.0] {
            let expected = x0.sin() + x0 * x0.cos();
            assert_float_absolute_eq!(d.eval(&assign(&[(&x, x0)])).unwrap(), expected, 1e-12);
        }
    }

    #[test]
    fn chain_rules() {
        let x = variable("x");
        let wrt = x.symbol().unwrap();
        let inner = pow(x.clone(), two());

        let d_sin = sin(inner.clone()).derivative(wrt);
        let d_cos = cos(inner.clone()).derivative(wrt);
        let d_log = log(inner.clone()).derivative(wrt);
        for x0 in [0.5, 1.2, -1.4] {
            let a = assign(&[(&x, x0)]);
            let u = x0 * x0;
            assert_float_absolute_eq!(d_sin.eval(&a).unwrap(), u.cos() * 2.0 * x0, 1e-12);
            assert_float_absolute_eq!(d_cos.eval(&a).unwrap(), -u.sin() * 2.0 * x0, 1e-12);
            assert_float_absolute_eq!(d_log.eval(&a).unwrap(), 2.0 * x0 / u, 1e-12);
        }
    }

    #[test]
    fn abs_derivative_is_the_sign() {
        let x = variable("x");
        let wrt = x.symbol().unwrap();
        let d = abs(x.clone()).derivative(wrt);
        assert_float_absolute_eq!(d.eval(&assign(&[(&x, 2.0)])).unwrap(), 1.0, 1e-12);
        assert_float_absolute_eq!(d.eval(&assign(&[(&x, -2.0)])).unwrap(), -1.0, 1e-12);
    }

    #[test]
    fn symbolic_exponent_uses_the_general_rule() {
        let x = variable("x");
        let y = variable("y");
        let wrt = x.symbol().unwrap();
        // d(y^x)/dx = y^x ln y
        let d = pow(y.clone(), x.clone()).derivative(wrt);
        let a = assign(&[(&x, 2.0), (&y, 3.0)]);
        assert_float_absolute_eq!(d.eval(&a).unwrap(), 9.0 * 3f64.ln(), 1e-12);
    }

    #[test]
    fn sum_of_terms() {
        let x = variable("x");
        let wrt = x.symbol().unwrap();
        // d(x^2 + 3x + 7) = 2x + 3
        let expr = add(
            pow(x.clone(), two()),
            add(mult(constant(3.0), x.clone()), constant(7.0)),
        );
        assert_eq!(
            expr.derivative(wrt),
            add(constant(3.0), mult(two(), x.clone()))
        );
    }
}
