//! Trigonometric identities.

use super::{binding, Rule};
use crate::expr::{
    add, cos, div, mult, neg_one, one, pi, placeholder, pow, sin, sub, two, zero,
};

/// `sin²x + cos²x = 1`
fn pythagorean() -> Rule {
    let x = placeholder("x");
    Rule {
        name: "sin²x + cos²x = 1",
        pattern: add(
            pow(sin(x.clone()), two()),
            pow(cos(x.clone()), two()),
        ),
        rewrite: Box::new(|_| Some(one())),
    }
}

/// `sin(-x) = -sin(x)`
fn sin_odd() -> Rule {
    let x = placeholder("x");
    Rule {
        name: "sin(-x) = -sin(x)",
        pattern: sin(mult(neg_one(), x.clone())),
        rewrite: Box::new(move |groups| {
            Some(mult(neg_one(), sin(binding(groups, &x)?)))
        }),
    }
}

/// `cos(-x) = cos(x)` — cosine is even.
fn cos_even() -> Rule {
    let x = placeholder("x");
    Rule {
        name: "cos(-x) = cos(x)",
        pattern: cos(mult(neg_one(), x.clone())),
        rewrite: Box::new(move |groups| Some(cos(binding(groups, &x)?))),
    }
}

/// `sin(x+y) = sin x cos y + cos x sin y`
fn sin_sum() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    Rule {
        name: "sin(x+y) = sin(x)cos(y) + cos(x)sin(y)",
        pattern: sin(add(x.clone(), y.clone())),
        rewrite: Box::new(move |groups| {
            let a = binding(groups, &x)?;
            let b = binding(groups, &y)?;
            Some(add(
                mult(sin(a.clone()), cos(b.clone())),
                mult(cos(a), sin(b)),
            ))
        }),
    }
}

/// `cos(x+y) = cos x cos y - sin x sin y`
fn cos_sum() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    Rule {
        name: "cos(x+y) = cos(x)cos(y) - sin(x)sin(y)",
        pattern: cos(add(x.clone(), y.clone())),
        rewrite: Box::new(move |groups| {
            let a = binding(groups, &x)?;
            let b = binding(groups, &y)?;
            Some(sub(
                mult(cos(a.clone()), cos(b.clone())),
                mult(sin(a), sin(b)),
            ))
        }),
    }
}

/// `sin(π) = 0` — the float `sin(3.14159…)` is not zero, the symbol is.
fn sin_pi() -> Rule {
    Rule {
        name: "sin(π) = 0",
        pattern: sin(pi()),
        rewrite: Box::new(|_| Some(zero())),
    }
}

/// `cos(π/2) = 0`
fn cos_half_pi() -> Rule {
    Rule {
        name: "cos(π/2) = 0",
        pattern: cos(div(pi(), two())),
        rewrite: Box::new(|_| Some(zero())),
    }
}

pub fn all() -> Vec<Rule> {
    vec![
        pythagorean(),
        sin_odd(),
        cos_even(),
        sin_sum(),
        cos_sum(),
        sin_pi(),
        cos_half_pi(),
    ]
}

#[cfg(test)]
mod tests {
    use crate::expr::{cos, div, mult, neg_one, pi, sin, two, variable, zero, Assignments};
    use crate::simplify::{rules, simplify};
    use pretty_assertions::assert_eq;

    #[test]
    fn symbolic_pi_beats_floating_error() {
        assert_eq!(simplify(&sin(pi()), &rules::all()), zero());
        assert_eq!(simplify(&cos(div(pi(), two())), &rules::all()), zero());
    }

    #[test]
    fn parity_rules_preserve_value() {
        let x = variable("x");
        let expr = cos(mult(neg_one(), x.clone()));
        let simplified = simplify(&expr, &rules::all());
        assert_eq!(simplified, cos(x.clone()));
        let mut assign = Assignments::new();
        assign.insert(x.symbol().unwrap(), 1.3);
        let before = expr.eval(&assign).unwrap();
        let after = simplified.eval(&assign).unwrap();
        assert!((before - after).abs() < 1e-15);
    }
}
