//! Per-state boolean models and the worklist evaluator
//!
//! A [`Model`] is an immutable snapshot of the literals true at one game
//! state, closed-world: absence means false. The evaluator seeds the true
//! set (from declared initial facts, or from the previous state's `next`
//! fluents) and then runs a worklist fixpoint over the conditional heads of
//! the rule table until a pass decides nothing further. In a correctly
//! stratified program that leaves nothing undecided.

use crate::error::{Result, TranslationError};
use crate::literal::{next_to_true, strip_negation};
use crate::ruleset::{Entry, RuleSet};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// The set of literals true at one game state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    trues: IndexSet<String>,
}

impl Model {
    /// Negation-aware membership test: any number of `(not ...)` wrappers
    /// is stripped, flipping the answer each time, before the closed-world
    /// lookup.
    pub fn contains(&self, literal: &str) -> bool {
        let (negated, core) = strip_negation(literal);
        self.trues.contains(core) != negated
    }

    /// The true literals, in decision order.
    pub fn trues(&self) -> impl Iterator<Item = &str> + '_ {
        self.trues.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.trues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trues.is_empty()
    }
}

/// Result of evaluating one state.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub model: Model,
    /// Worklist passes run before the fixpoint was reached.
    pub passes: usize,
    /// Heads the fixpoint could not decide. Zero for a correctly
    /// stratified program.
    pub undecided: usize,
}

/// Evaluate the first game state from the declared initial facts.
pub fn initial_model(rules: &RuleSet, max_passes: usize) -> Result<Evaluation> {
    evaluate(rules, rules.initial_trues().clone(), max_passes)
}

/// Evaluate a successor state: every `next` fluent true in the previous
/// model becomes a `true` fluent in the new working set.
pub fn successor_model(rules: &RuleSet, previous: &Model, max_passes: usize) -> Result<Evaluation> {
    let seed: IndexSet<String> = previous.trues().filter_map(next_to_true).collect();
    evaluate(rules, seed, max_passes)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Truth {
    True,
    False,
    Undecided,
}

fn evaluate(rules: &RuleSet, seed: IndexSet<String>, max_passes: usize) -> Result<Evaluation> {
    let mut trues = seed;
    let mut undecided: IndexSet<String> = IndexSet::new();
    for (head, entry) in rules.heads() {
        match entry {
            Entry::Tautology => {
                trues.insert(head.to_string());
            }
            Entry::Rules(_) => {
                if !trues.contains(head) {
                    undecided.insert(head.to_string());
                }
            }
        }
    }

    let mut passes = 0usize;
    while !undecided.is_empty() {
        passes += 1;
        if passes > max_passes {
            return Err(TranslationError::FixpointLimit {
                what: "model evaluation",
                limit: max_passes,
            });
        }

        let mut decided_any = false;
        let queue: Vec<String> = undecided.iter().cloned().collect();
        for head in queue {
            let entry = rules.entry(&head).ok_or_else(|| {
                TranslationError::InvariantViolation(format!(
                    "queued head {} has no table entry",
                    head
                ))
            })?;
            let disjuncts = match entry {
                Entry::Rules(d) => d,
                Entry::Tautology => {
                    trues.insert(head.clone());
                    undecided.shift_remove(&head);
                    decided_any = true;
                    continue;
                }
            };

            let mut some_disjunct_true = false;
            let mut all_disjuncts_false = true;
            for disjunct in disjuncts {
                let mut has_false = false;
                let mut all_true = true;
                for literal in disjunct {
                    match resolve(literal, &trues, &undecided) {
                        Truth::True => {}
                        Truth::False => {
                            has_false = true;
                            all_true = false;
                            break;
                        }
                        Truth::Undecided => all_true = false,
                    }
                }
                if all_true {
                    some_disjunct_true = true;
                    break;
                }
                if !has_false {
                    all_disjuncts_false = false;
                }
            }

            if some_disjunct_true {
                trues.insert(head.clone());
                undecided.shift_remove(&head);
                decided_any = true;
            } else if all_disjuncts_false {
                // closed world: dropping the head from the worklist makes
                // it resolve false from here on
                undecided.shift_remove(&head);
                decided_any = true;
            }
        }

        if !decided_any {
            break;
        }
    }

    Ok(Evaluation {
        undecided: undecided.len(),
        model: Model { trues },
        passes,
    })
}

fn resolve(literal: &str, trues: &IndexSet<String>, undecided: &IndexSet<String>) -> Truth {
    let (negated, core) = strip_negation(literal);
    let value = if trues.contains(core) {
        Truth::True
    } else if undecided.contains(core) {
        Truth::Undecided
    } else {
        Truth::False
    };
    match (value, negated) {
        (Truth::True, true) => Truth::False,
        (Truth::False, true) => Truth::True,
        (v, _) => v,
    }
}
