//! Predicate dependency graph and stratification
//!
//! Built from the ground program at predicate granularity: every rule head
//! predicate depends on each of its body predicates (negation stripped).
//! Self-recursion carries no ordering constraint and is ignored when a
//! predicate is finalized.
//!
//! Stratification assigns each predicate an evaluation stratum by rounds
//! over a worklist; a round that makes no progress indicates a genuine
//! cycle, which is broken by rewriting a state-true dependency to read the
//! previous state instead (`true` becomes `true_old`). Perception must
//! always be computed from the pre-move state, so after strata are
//! assigned every state-true dependency reachable from `sees` is rewritten
//! the same way. A stuck round with nothing left to rewrite is an
//! unstratifiable program and is reported, not looped on.

use crate::error::{Result, TranslationError};
use crate::gdl::{GdlTree, NodeId, NodeKind};
use crate::literal::{is_does, is_sees, is_state_true, oldify, predicate_of};
use crate::ruleset::RuleSet;
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

/// Evaluation stratum of a predicate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stratum {
    Known(u32),
    /// Not yet assigned (or never registered).
    Unknown,
    /// Every ground instance of the predicate was proven permanently
    /// false by simplification.
    Contradiction,
}

/// Report of one stratification run.
#[derive(Debug, Clone, Copy)]
pub struct StratifyReport {
    pub rounds: usize,
    /// Number of dependency edges rewritten to their `_old` variant.
    pub oldified: usize,
}

/// Predicate-level dependency graph over a ground program.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    deps: IndexMap<String, IndexSet<String>>,
    strata: IndexMap<String, Stratum>,
    statics: IndexSet<String>,
}

impl DependencyGraph {
    /// Build the graph from a ground program. Rules whose head is a
    /// `base`/`input` declaration contribute nothing; facts register their
    /// predicate as a node without edges.
    pub fn build(tree: &GdlTree) -> Self {
        let mut graph = DependencyGraph::default();
        for &clause in tree.top_level() {
            let node = tree.node(clause);
            match node.kind {
                NodeKind::Rule => {
                    let children = tree.children(clause);
                    let Some(&head) = children.first() else {
                        continue;
                    };
                    let head_atom = tree.node(head).atom.clone();
                    if head_atom == "base" || head_atom == "input" {
                        continue;
                    }
                    let body_preds: Vec<String> = children[1..]
                        .iter()
                        .map(|&b| stripped_predicate(tree, b))
                        .collect();
                    let entry = graph.deps.entry(head_atom).or_default();
                    for pred in &body_preds {
                        entry.insert(pred.clone());
                    }
                    for pred in body_preds {
                        graph.deps.entry(pred).or_default();
                    }
                }
                NodeKind::Formula | NodeKind::Constant => {
                    graph.deps.entry(node.atom.clone()).or_default();
                }
                NodeKind::Root | NodeKind::Variable => {}
            }
        }
        graph
    }

    /// Register a dependency edge directly. Used by callers that assemble
    /// graphs without going through a ground program.
    pub fn add_dependency(&mut self, head: &str, dep: &str) {
        self.deps
            .entry(head.to_string())
            .or_default()
            .insert(dep.to_string());
        self.deps.entry(dep.to_string()).or_default();
    }

    /// Predicates `key` depends on. Unknown keys yield nothing.
    pub fn neighbours(&self, key: &str) -> impl Iterator<Item = &str> + '_ {
        self.deps.get(key).into_iter().flatten().map(|s| s.as_str())
    }

    /// The stratum of a predicate name.
    pub fn stratum(&self, predicate: &str) -> Stratum {
        self.strata
            .get(predicate)
            .copied()
            .unwrap_or(Stratum::Unknown)
    }

    /// The stratum of a rendered literal, looked up by its predicate.
    pub fn stratum_of_literal(&self, literal: &str) -> Stratum {
        self.stratum(predicate_of(literal))
    }

    /// Whether the predicate's truth is state-invariant.
    pub fn is_static(&self, predicate: &str) -> bool {
        self.statics.contains(predicate)
    }

    /// Assign a stratum to every predicate.
    ///
    /// Rounds over a worklist: a predicate is finalized once every non-self
    /// dependency has a known stratum. A stuck round rewrites unresolved
    /// state-true dependencies of the deferred predicates to their `_old`
    /// variant (stratum 0); if a stuck round has nothing left to rewrite
    /// the program is unstratifiable.
    pub fn compute_strata(&mut self, max_rounds: usize) -> Result<StratifyReport> {
        self.strata.clear();
        self.statics.clear();

        let mut unresolved: IndexSet<String> = IndexSet::new();
        let keys: Vec<String> = self.deps.keys().cloned().collect();
        for key in keys {
            if self.deps[&key].is_empty() {
                self.finalize(&key, 0, true);
            } else {
                self.strata.insert(key.clone(), Stratum::Unknown);
                unresolved.insert(key);
            }
        }

        let mut rounds = 0usize;
        let mut oldified = 0usize;
        while !unresolved.is_empty() {
            rounds += 1;
            if rounds > max_rounds {
                return Err(TranslationError::FixpointLimit {
                    what: "stratification",
                    limit: max_rounds,
                });
            }

            let mut deferred: IndexSet<String> = IndexSet::new();
            let mut progressed = false;
            for key in unresolved.iter() {
                let mut max_below = 0u32;
                let mut all_static = true;
                let mut blocked = false;
                for dep in &self.deps[key] {
                    if dep == key {
                        continue;
                    }
                    match self.strata.get(dep).copied() {
                        Some(Stratum::Known(s)) => {
                            max_below = max_below.max(s + 1);
                            if !self.statics.contains(dep) {
                                all_static = false;
                            }
                        }
                        _ => {
                            blocked = true;
                            break;
                        }
                    }
                }
                if blocked {
                    deferred.insert(key.clone());
                } else {
                    self.finalize(key, max_below, all_static);
                    progressed = true;
                }
            }

            if !progressed {
                let rewritten = self.oldify_blocked(&deferred);
                if rewritten == 0 {
                    return Err(TranslationError::Unstratifiable {
                        unresolved: deferred.len(),
                    });
                }
                oldified += rewritten;
            }
            unresolved = deferred;
        }

        oldified += self.oldify_sees_closure();
        Ok(StratifyReport { rounds, oldified })
    }

    fn finalize(&mut self, key: &str, stratum: u32, deps_static: bool) {
        self.strata.insert(key.to_string(), Stratum::Known(stratum));
        if deps_static && !is_does(key) && !is_state_true(key) {
            self.statics.insert(key.to_string());
        }
    }

    /// Rewrite unresolved state-true dependencies of the deferred
    /// predicates: reading the previous state breaks the temporal cycle.
    fn oldify_blocked(&mut self, deferred: &IndexSet<String>) -> usize {
        let mut rewritten = 0usize;
        for key in deferred {
            let targets: Vec<String> = self.deps[key]
                .iter()
                .filter(|dep| {
                    is_state_true(dep)
                        && !matches!(self.strata.get(*dep).copied(), Some(Stratum::Known(_)))
                })
                .cloned()
                .collect();
            for dep in targets {
                self.rewrite_edge(key.clone(), &dep);
                rewritten += 1;
            }
        }
        rewritten
    }

    /// Perception is computed from the pre-move state: every state-true
    /// dependency reachable from a `sees` predicate becomes `_old`.
    fn oldify_sees_closure(&mut self) -> usize {
        let sees_heads: Vec<String> = self.deps.keys().filter(|k| is_sees(k)).cloned().collect();
        if sees_heads.is_empty() {
            return 0;
        }

        let mut reachable: IndexSet<String> = IndexSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for head in sees_heads {
            reachable.insert(head.clone());
            queue.push_back(head);
        }
        while let Some(key) = queue.pop_front() {
            let targets: Vec<String> = match self.deps.get(&key) {
                Some(deps) => deps.iter().cloned().collect(),
                None => continue,
            };
            for dep in targets {
                if reachable.insert(dep.clone()) {
                    queue.push_back(dep);
                }
            }
        }

        let mut rewritten = 0usize;
        for key in reachable {
            let targets: Vec<String> = match self.deps.get(&key) {
                Some(deps) => deps.iter().filter(|d| is_state_true(d)).cloned().collect(),
                None => continue,
            };
            for dep in targets {
                self.rewrite_edge(key.clone(), &dep);
                rewritten += 1;
            }
        }
        rewritten
    }

    fn rewrite_edge(&mut self, head: String, dep: &str) {
        let old = oldify(dep);
        if let Some(entry) = self.deps.get_mut(&head) {
            entry.shift_remove(dep);
            entry.insert(old.clone());
        }
        self.deps.entry(old.clone()).or_default();
        // old values are a snapshot of the previous state, always available
        self.strata.insert(old, Stratum::Known(0));
    }

    /// Mark rule-defined predicates whose every ground instance was culled
    /// from the rule table as contradictions.
    pub fn mark_contradictions(&mut self, rules: &RuleSet) {
        let surviving: IndexSet<&str> = rules
            .heads()
            .map(|(head, _)| predicate_of(head))
            .collect();
        let gone: Vec<String> = self
            .deps
            .iter()
            .filter(|(key, deps)| !deps.is_empty() && !surviving.contains(key.as_str()))
            .map(|(key, _)| key.clone())
            .collect();
        for key in gone {
            self.strata.insert(key, Stratum::Contradiction);
        }
    }

    /// Export the graph for debugging visualization.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("strict digraph {\n");
        for key in self.deps.keys() {
            out.push_str(&format!("  \"{}\" [label=\"{}\"];\n", key, key));
        }
        for (from, targets) in &self.deps {
            for to in targets {
                out.push_str(&format!("  \"{}\" -> \"{}\";\n", from, to));
            }
        }
        out.push_str("}\n");
        out
    }
}

/// The predicate of a body literal with any leading negation stripped.
fn stripped_predicate(tree: &GdlTree, mut id: NodeId) -> String {
    loop {
        let node = tree.node(id);
        let children = tree.children(id);
        if node.kind == NodeKind::Formula && node.atom == "not" && children.len() == 1 {
            id = children[0];
        } else {
            break;
        }
    }
    tree.node(id).atom.clone()
}
