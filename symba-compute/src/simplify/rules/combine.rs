//! Like-term combination beyond what the constructors merge.
//!
//! The constructors only merge terms with *equal* degree signatures, so
//! `x + y·x` survives construction; these rules factor such sums during the
//! search.

use super::{binding, Rule};
use crate::expr::{add, mult, one, placeholder};

/// `x + y·x = (y+1)·x`
fn absorb_bare_term() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    Rule {
        name: "x + y*x = (y+1)*x",
        pattern: add(x.clone(), mult(y.clone(), x.clone())),
        rewrite: Box::new(move |groups| {
            Some(mult(
                add(binding(groups, &y)?, one()),
                binding(groups, &x)?,
            ))
        }),
    }
}

/// `y·x + z·x = (y+z)·x`
fn factor_common() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    let z = placeholder("z");
    Rule {
        name: "y*x + z*x = (y+z)*x",
        pattern: add(mult(y.clone(), x.clone()), mult(z.clone(), x.clone())),
        rewrite: Box::new(move |groups| {
            Some(mult(
                add(binding(groups, &y)?, binding(groups, &z)?),
                binding(groups, &x)?,
            ))
        }),
    }
}

pub fn all() -> Vec<Rule> {
    vec![absorb_bare_term(), factor_common()]
}
