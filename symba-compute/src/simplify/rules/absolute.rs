//! Absolute-value algebra.

use super::{binding, Rule};
use crate::expr::{abs, mult, neg_one, placeholder};

/// `abs(abs(x)) = abs(x)`
fn idempotent() -> Rule {
    let x = placeholder("x");
    Rule {
        name: "abs(abs(x)) = abs(x)",
        pattern: abs(abs(x.clone())),
        rewrite: Box::new(move |groups| Some(abs(binding(groups, &x)?))),
    }
}

/// `abs(-x) = abs(x)`
fn even() -> Rule {
    let x = placeholder("x");
    Rule {
        name: "abs(-x) = abs(x)",
        pattern: abs(mult(neg_one(), x.clone())),
        rewrite: Box::new(move |groups| Some(abs(binding(groups, &x)?))),
    }
}

/// `abs(x)·abs(y) = abs(x·y)`
fn merge() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    Rule {
        name: "abs(x)*abs(y) = abs(x*y)",
        pattern: mult(abs(x.clone()), abs(y.clone())),
        rewrite: Box::new(move |groups| {
            Some(abs(mult(binding(groups, &x)?, binding(groups, &y)?)))
        }),
    }
}

/// `abs(x·y) = abs(x)·abs(y)`
fn split() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    Rule {
        name: "abs(x*y) = abs(x)*abs(y)",
        pattern: abs(mult(x.clone(), y.clone())),
        rewrite: Box::new(move |groups| {
            Some(mult(
                abs(binding(groups, &x)?),
                abs(binding(groups, &y)?),
            ))
        }),
    }
}

pub fn all() -> Vec<Rule> {
    vec![idempotent(), even(), merge(), split()]
}

#[cfg(test)]
mod tests {
    use crate::expr::{abs, mult, variable};
    use crate::simplify::{rules, simplify};
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_abs_collapses() {
        let x = variable("x");
        assert_eq!(simplify(&abs(abs(x.clone())), &rules::all()), abs(x));
    }

    #[test]
    fn product_of_abs_merges() {
        let x = variable("x");
        let y = variable("y");
        let expr = mult(abs(x.clone()), abs(y.clone()));
        assert_eq!(simplify(&expr, &rules::all()), abs(mult(x, y)));
    }
}
