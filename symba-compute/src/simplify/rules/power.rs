//! Power laws over symbolic exponents.

use super::{binding, Rule};
use crate::expr::{add, mult, one, placeholder, pow, zero};

/// `1^x = 1`
fn one_base() -> Rule {
    let x = placeholder("x");
    Rule {
        name: "1^x = 1",
        pattern: pow(one(), x),
        rewrite: Box::new(|_| Some(one())),
    }
}

/// `0^x = 0`
fn zero_base() -> Rule {
    let x = placeholder("x");
    Rule {
        name: "0^x = 0",
        pattern: pow(zero(), x),
        rewrite: Box::new(|_| Some(zero())),
    }
}

/// `x · x^y = x^(y+1)`
fn merge_into_power() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    Rule {
        name: "x*x^y = x^(y+1)",
        pattern: mult(x.clone(), pow(x.clone(), y.clone())),
        rewrite: Box::new(move |groups| {
            Some(pow(binding(groups, &x)?, add(binding(groups, &y)?, one())))
        }),
    }
}

/// `x^y · x^z = x^(y+z)`
fn merge_powers() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    let z = placeholder("z");
    Rule {
        name: "x^y*x^z = x^(y+z)",
        pattern: mult(pow(x.clone(), y.clone()), pow(x.clone(), z.clone())),
        rewrite: Box::new(move |groups| {
            Some(pow(
                binding(groups, &x)?,
                add(binding(groups, &y)?, binding(groups, &z)?),
            ))
        }),
    }
}

/// `x^(y+z) = x^y · x^z`
fn split_power() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    let z = placeholder("z");
    Rule {
        name: "x^(y+z) = x^y*x^z",
        pattern: pow(x.clone(), add(y.clone(), z.clone())),
        rewrite: Box::new(move |groups| {
            let base = binding(groups, &x)?;
            Some(mult(
                pow(base.clone(), binding(groups, &y)?),
                pow(base, binding(groups, &z)?),
            ))
        }),
    }
}

/// `(x·y)^z = x^z · y^z`
fn distribute_exponent() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    let z = placeholder("z");
    Rule {
        name: "(x*y)^z = x^z*y^z",
        pattern: pow(mult(x.clone(), y.clone()), z.clone()),
        rewrite: Box::new(move |groups| {
            let exp = binding(groups, &z)?;
            Some(mult(
                pow(binding(groups, &x)?, exp.clone()),
                pow(binding(groups, &y)?, exp),
            ))
        }),
    }
}

/// `(x^y)^z = x^(y·z)`
fn collapse_nested() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    let z = placeholder("z");
    Rule {
        name: "x^y^z = x^(y*z)",
        pattern: pow(pow(x.clone(), y.clone()), z.clone()),
        rewrite: Box::new(move |groups| {
            Some(pow(
                binding(groups, &x)?,
                mult(binding(groups, &y)?, binding(groups, &z)?),
            ))
        }),
    }
}

pub fn all() -> Vec<Rule> {
    vec![
        one_base(),
        zero_base(),
        merge_into_power(),
        merge_powers(),
        split_power(),
        distribute_exponent(),
        collapse_nested(),
    ]
}
