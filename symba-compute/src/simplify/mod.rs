//! Best-first search over the rewrite graph.
//!
//! [`simplify`] explores the space of expressions reachable from its input by
//! applying rewrite rules, and returns the least complex expression it finds.
//! The search is a plain best-first graph search:
//!
//! - the frontier is a min-priority queue ordered by [`Node::complexity`]
//!   (a binary heap; ties break by insertion order so runs are
//!   deterministic);
//! - a visited set keyed by the node's structural hash — with full structural
//!   equality resolving collisions, which is exactly what
//!   `HashSet<Node>` does given the consistent `Hash`/`Eq` on [`Node`] —
//!   prevents re-enqueuing an expression already reached by a different
//!   rewrite path, and is what keeps the otherwise-infinite graph finite;
//! - every rule's pattern is [`Node::search`]ed over the dequeued
//!   expression; a rewrite function that declines (returns `None`) simply
//!   produces no successor for that match.
//!
//! The search runs until the queue empties or the work budget — a maximum
//! number of dequeues, deliberately not wall-clock time so results are
//! reproducible across machines — is exhausted. Either way the best
//! expression seen so far is returned (re-canonicalized defensively), never
//! an error: with an expansive rule set the budget is the only thing
//! guaranteeing termination, and a possibly-non-minimal answer beats no
//! answer.

pub mod rules;

use crate::expr::Node;
use crate::step_collector::StepCollector;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;
use tracing::{debug, trace};

pub use rules::Rule;

/// A work budget for [`simplify_with`], counted in dequeued search states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub steps: usize,
}

impl Default for Budget {
    fn default() -> Self {
        // enough for every rule set in this workspace to run to queue
        // exhaustion; the cap only bites on expansive rule sets
        Self { steps: 2500 }
    }
}

/// One state in the rewrite search graph, with provenance.
#[derive(Debug, Clone)]
pub struct Step {
    pub node: Node,
    pub score: u64,
    /// The rule that produced this state, `None` for the initial state.
    pub rule: Option<&'static str>,
    pub parent: Option<Rc<Step>>,
}

/// What the engine reports to a [`StepCollector`].
#[derive(Debug, Clone)]
pub enum SearchEvent {
    /// A rule rewrote `from` into `to`, and `to` was new.
    Applied {
        rule: &'static str,
        from: Node,
        to: Node,
    },
    /// The work budget ran out before the queue emptied.
    BudgetExhausted,
}

struct QueueEntry {
    score: u64,
    seq: u64,
    step: Rc<Step>,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap, we want the lowest score first,
        // and among equal scores the earliest-enqueued state
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Simplifies `node` with the given rules under the default budget.
pub fn simplify(node: &Node, rules: &[Rule]) -> Node {
    simplify_with(node, rules, Budget::default(), &mut ())
}

/// Simplifies `node`, reporting rule applications to `collector`.
pub fn simplify_with(
    node: &Node,
    rules: &[Rule],
    budget: Budget,
    collector: &mut dyn StepCollector<SearchEvent>,
) -> Node {
    let mut todo: BinaryHeap<QueueEntry> = BinaryHeap::new();
    let mut seen: HashSet<Node> = HashSet::new();
    let mut seq = 0u64;

    let start = Rc::new(Step {
        node: node.clone(),
        score: node.complexity(),
        rule: None,
        parent: None,
    });
    let mut best = start.clone();
    seen.insert(node.clone());
    todo.push(QueueEntry {
        score: start.score,
        seq,
        step: start,
    });

    let mut dequeued = 0usize;
    loop {
        if dequeued >= budget.steps {
            debug!(steps = dequeued, "work budget exhausted, keeping best seen");
            collector.push(SearchEvent::BudgetExhausted);
            break;
        }
        let Some(entry) = todo.pop() else {
            break;
        };
        dequeued += 1;
        let from = entry.step;
        if from.score < best.score {
            trace!(score = from.score, node = %from.node, "new best");
            best = from.clone();
        }

        for rule in rules {
            for m in from.node.search(&rule.pattern) {
                // a rewrite that declines its match is not an error, the
                // match just has no successor
                let Some(replacement) = (rule.rewrite)(&m.bindings) else {
                    continue;
                };
                let to_node = m.reconstruct(replacement);
                if seen.insert(to_node.clone()) {
                    debug!(rule = rule.name, source = %from.node, target = %to_node, "enqueue");
                    collector.push(SearchEvent::Applied {
                        rule: rule.name,
                        from: from.node.clone(),
                        to: to_node.clone(),
                    });
                    seq += 1;
                    let step = Rc::new(Step {
                        score: to_node.complexity(),
                        node: to_node,
                        rule: Some(rule.name),
                        parent: Some(from.clone()),
                    });
                    todo.push(QueueEntry {
                        score: step.score,
                        seq,
                        step,
                    });
                }
            }
        }
    }

    best.node.resorted()
}
