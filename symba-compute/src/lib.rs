//! Symbolic expression trees with canonical forms, pattern matching, and
//! rule-based simplification.
//!
//! # Expression representation
//!
//! Expressions are immutable [`Node`] trees built through smart constructors
//! that enforce a canonical form: sums and products are flattened,
//! right-leaning chains whose operands are sorted by the degree comparator
//! and merged when they are like terms; numeric subtrees fold eagerly through
//! rounding-safe interval arithmetic ([`symba_interval`]); and the usual
//! identity eliminations (`x+0`, `x·1`, `x^1`, …) apply at construction time.
//! Because canonicalization is deterministic, structurally equal nodes are
//! mathematically equivalent, and equality/hash/ordering are cheap structural
//! operations the rest of the crate builds on.
//!
//! ```
//! use symba_compute::expr::{add, constant, mult, variable};
//!
//! let x = variable("x");
//! // x + 1 + x canonicalizes to 1 + 2x, whichever way it is built
//! let a = add(x.clone(), add(constant(1.0), x.clone()));
//! let b = add(constant(1.0), mult(constant(2.0), x.clone()));
//! assert_eq!(a, b);
//! ```
//!
//! # Simplification
//!
//! Everything canonicalization cannot see — trigonometric identities, power
//! laws over symbolic exponents, factoring — lives in a table of rewrite
//! [`Rule`](simplify::Rule)s. [`simplify`] runs a best-first search over the
//! rewrite graph those rules span: pattern matching (including
//! commutative/associative re-association of the flattened chains) finds
//! every way a rule applies anywhere in the tree, a deduplicating visited set
//! keeps the graph finite, and the least complex expression found wins.
//!
//! ```
//! use symba_compute::expr::{add, cos, pow, sin, two, variable};
//! use symba_compute::simplify::{rules, simplify};
//!
//! let theta = variable("θ");
//! let expr = add(
//!     pow(sin(theta.clone()), two()),
//!     pow(cos(theta.clone()), two()),
//! );
//! assert_eq!(simplify(&expr, &rules::all()), symba_compute::expr::one());
//! ```

pub mod derivative;
pub mod expr;
pub mod matching;
pub mod simplify;
pub mod step_collector;
pub mod symbol;

pub use expr::{Assignments, EvalError, Node, NodeKind, Substitutions};
pub use matching::{Bindings, Match, Matches};
pub use simplify::{simplify, simplify_with, Budget, Rule, SearchEvent, Step};
pub use step_collector::StepCollector;
pub use symbol::{PlaceholderKind, Symbol, SymbolKind, SymbolTable};
