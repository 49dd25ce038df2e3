//! Logarithm identities. `log` is the natural logarithm throughout.

use super::{binding, Rule};
use crate::expr::{add, e, log, mult, placeholder, pow};

/// `log(x·y) = log x + log y`
fn product() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    Rule {
        name: "log(x*y) = log(x) + log(y)",
        pattern: log(mult(x.clone(), y.clone())),
        rewrite: Box::new(move |groups| {
            Some(add(
                log(binding(groups, &x)?),
                log(binding(groups, &y)?),
            ))
        }),
    }
}

/// `log(x^y) = y · log x`
fn power() -> Rule {
    let x = placeholder("x");
    let y = placeholder("y");
    Rule {
        name: "log(x^y) = y*log(x)",
        pattern: log(pow(x.clone(), y.clone())),
        rewrite: Box::new(move |groups| {
            Some(mult(binding(groups, &y)?, log(binding(groups, &x)?)))
        }),
    }
}

/// `log(e^x) = x`
fn inverse_of_exp() -> Rule {
    let x = placeholder("x");
    Rule {
        name: "log(e^x) = x",
        pattern: log(pow(e(), x.clone())),
        rewrite: Box::new(move |groups| binding(groups, &x)),
    }
}

pub fn all() -> Vec<Rule> {
    vec![product(), power(), inverse_of_exp()]
}

#[cfg(test)]
mod tests {
    use crate::expr::{e, log, pow, variable};
    use crate::simplify::{rules, simplify};
    use pretty_assertions::assert_eq;

    #[test]
    fn log_undoes_exp() {
        let x = variable("x");
        let expr = log(pow(e(), x.clone()));
        assert_eq!(simplify(&expr, &rules::all()), x);
    }

    #[test]
    fn log_of_power_pulls_the_exponent_down() {
        let x = variable("x");
        let y = variable("y");
        let expr = log(pow(x.clone(), y.clone()));
        // y*log(x) scores no better than log(x^y); the engine keeps the
        // original but must have explored the rewrite
        let simplified = simplify(&expr, &rules::all());
        assert!(simplified == expr || simplified == crate::expr::mult(y, log(x)));
    }
}
