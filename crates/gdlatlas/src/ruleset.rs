//! DNF rule table and simplification to fixpoint
//!
//! Every rule head owns a disjunction of disjuncts, each disjunct a
//! deduplicated set of body literals. A head proven unconditionally true
//! holds an empty disjunct set (tautology); a head proven unconditionally
//! false is removed from the table (contradiction). Simplification is
//! monotone: literals and disjuncts are only ever removed, an entry only
//! ever strengthened toward tautology or contradiction.

use crate::dependency::{DependencyGraph, Stratum};
use crate::error::{Result, TranslationError};
use crate::gdl::{GdlTree, NodeKind};
use crate::literal::{
    distinct_args, does_to_legal, is_old_state, is_state_true, strip_negation,
};
use indexmap::{IndexMap, IndexSet};

/// A conjunction of literals, deduplicated.
pub type Disjunct = IndexSet<String>;

/// Definition of one head in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Unconditionally true.
    Tautology,
    /// A non-empty disjunction of conjunctions.
    Rules(Vec<Disjunct>),
}

/// The rule table of a ground program.
#[derive(Debug, Default)]
pub struct RuleSet {
    entries: IndexMap<String, Entry>,
    initial_true: IndexSet<String>,
}

enum LiteralOutcome {
    /// Resolvable only later; keep it in the conjunction.
    Keep,
    /// Vacuously true here; drop it from the conjunction.
    Remove,
    /// Falsifies the whole conjunction.
    Unsat,
}

impl RuleSet {
    /// Ingest a ground program.
    ///
    /// Facts other than `init` become tautology entries. `init` facts seed
    /// the initial-state literal set as state-true literals. Rules append
    /// one disjunct per rule to their head's entry.
    pub fn ingest(tree: &GdlTree) -> Result<RuleSet> {
        let mut set = RuleSet::default();
        for &clause in tree.top_level() {
            let node = tree.node(clause);
            match node.kind {
                NodeKind::Formula if node.atom == "init" => {
                    let children = tree.children(clause);
                    if children.len() != 1 {
                        return Err(TranslationError::MalformedClause(tree.render(clause)));
                    }
                    set.initial_true
                        .insert(format!("(true {})", tree.render(children[0])));
                }
                NodeKind::Formula | NodeKind::Constant => {
                    set.entries.insert(tree.render(clause), Entry::Tautology);
                }
                NodeKind::Rule => {
                    let children = tree.children(clause);
                    let Some(&head) = children.first() else {
                        return Err(TranslationError::MalformedClause(tree.render(clause)));
                    };
                    let head_key = tree.render(head);
                    let disjunct: Disjunct =
                        children[1..].iter().map(|&b| tree.render(b)).collect();
                    set.add_disjunct(head_key, disjunct);
                }
                NodeKind::Root | NodeKind::Variable => {
                    return Err(TranslationError::MalformedClause(tree.render(clause)));
                }
            }
        }
        Ok(set)
    }

    fn add_disjunct(&mut self, head: String, disjunct: Disjunct) {
        if disjunct.is_empty() {
            // a bodyless rule is a fact
            self.entries.insert(head, Entry::Tautology);
            return;
        }
        if let Some(existing) = self.entries.get_mut(&head) {
            // OR with an existing tautology stays true
            if let Entry::Rules(disjuncts) = existing {
                if !disjuncts.contains(&disjunct) {
                    disjuncts.push(disjunct);
                }
            }
            return;
        }
        self.entries.insert(head, Entry::Rules(vec![disjunct]));
    }

    /// Simplify the table to a fixpoint and return the number of passes,
    /// the final no-change pass included. On a table already at fixpoint
    /// this is a single pass.
    pub fn cull(&mut self, max_passes: usize) -> Result<usize> {
        let mut passes = 0usize;
        loop {
            passes += 1;
            if passes > max_passes {
                return Err(TranslationError::FixpointLimit {
                    what: "simplification",
                    limit: max_passes,
                });
            }
            let mut changed = false;
            let heads: Vec<String> = self.entries.keys().cloned().collect();
            for head in heads {
                let disjuncts = match self.entries.get(&head) {
                    Some(Entry::Rules(d)) => d.clone(),
                    _ => continue,
                };
                let mut kept: Vec<Disjunct> = Vec::with_capacity(disjuncts.len());
                let mut tautology = false;
                for disjunct in &disjuncts {
                    match self.cull_disjunct(disjunct) {
                        None => changed = true,
                        Some(reduced) => {
                            if reduced.is_empty() {
                                // one unconditional way to derive the head
                                // makes the whole disjunction true
                                tautology = true;
                                changed = true;
                                break;
                            }
                            if reduced.len() != disjunct.len() {
                                changed = true;
                            }
                            if !kept.contains(&reduced) {
                                kept.push(reduced);
                            }
                        }
                    }
                }
                if tautology {
                    self.entries.insert(head, Entry::Tautology);
                } else if kept.is_empty() {
                    self.entries.shift_remove(&head);
                } else {
                    self.entries.insert(head, Entry::Rules(kept));
                }
            }
            if !changed {
                return Ok(passes);
            }
        }
    }

    /// Simplify one conjunction. `None` means the conjunction is
    /// unsatisfiable and must be dropped from its disjunction.
    fn cull_disjunct(&self, disjunct: &Disjunct) -> Option<Disjunct> {
        let mut kept = Disjunct::new();
        for literal in disjunct {
            match self.resolve_literal(literal) {
                LiteralOutcome::Keep => {
                    kept.insert(literal.clone());
                }
                LiteralOutcome::Remove => {}
                LiteralOutcome::Unsat => return None,
            }
        }
        Some(kept)
    }

    fn resolve_literal(&self, literal: &str) -> LiteralOutcome {
        let (negated, core) = strip_negation(literal);

        // distinct is decidable on ground arguments
        if let Some((a, b)) = distinct_args(core) {
            return decide(a != b, negated);
        }

        // state literals are resolved only against a concrete model
        if is_state_true(core) || is_old_state(core) {
            return LiteralOutcome::Keep;
        }

        // a move is admissible only where some legal head exists for it
        if let Some(legal) = does_to_legal(core) {
            if self.entries.contains_key(&legal) {
                return LiteralOutcome::Keep;
            }
            return decide(false, negated);
        }

        match self.entries.get(core) {
            None => decide(false, negated),
            Some(Entry::Tautology) => decide(true, negated),
            Some(Entry::Rules(_)) => LiteralOutcome::Keep,
        }
    }

    /// The entry for a head, if any. Absence means the head is either
    /// undefined or was culled to a contradiction.
    pub fn entry(&self, head: &str) -> Option<&Entry> {
        self.entries.get(head)
    }

    pub fn contains_head(&self, head: &str) -> bool {
        self.entries.contains_key(head)
    }

    pub fn is_tautology(&self, head: &str) -> bool {
        matches!(self.entries.get(head), Some(Entry::Tautology))
    }

    /// Iterate all heads with their entries, in insertion order.
    pub fn heads(&self) -> impl Iterator<Item = (&str, &Entry)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State-true literals declared by `init` facts.
    pub fn initial_trues(&self) -> &IndexSet<String> {
        &self.initial_true
    }

    /// All head keys ordered by ascending stratum of their predicate, ties
    /// broken lexicographically. Heads without a known stratum sort last.
    pub fn ordered_heads(&self, deps: &DependencyGraph) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort_by(|a, b| {
            stratum_rank(deps.stratum_of_literal(a))
                .cmp(&stratum_rank(deps.stratum_of_literal(b)))
                .then_with(|| a.cmp(b))
        });
        keys
    }

    /// Render the table back to source-level clauses, one per line, in
    /// table order.
    pub fn to_gdl(&self) -> String {
        let keys: Vec<String> = self.entries.keys().cloned().collect();
        self.render_keys(&keys)
    }

    /// Render the table back to source-level clauses in stratum order.
    pub fn to_gdl_ordered(&self, deps: &DependencyGraph) -> String {
        let keys = self.ordered_heads(deps);
        self.render_keys(&keys)
    }

    fn render_keys(&self, keys: &[String]) -> String {
        let mut out = String::new();
        for key in keys {
            match &self.entries[key] {
                Entry::Tautology => {
                    out.push_str(key);
                    out.push('\n');
                }
                Entry::Rules(disjuncts) => {
                    for disjunct in disjuncts {
                        out.push_str("(<= ");
                        out.push_str(key);
                        for literal in disjunct {
                            out.push(' ');
                            out.push_str(literal);
                        }
                        out.push_str(")\n");
                    }
                }
            }
        }
        out
    }
}

fn decide(value: bool, negated: bool) -> LiteralOutcome {
    if value != negated {
        LiteralOutcome::Remove
    } else {
        LiteralOutcome::Unsat
    }
}

fn stratum_rank(stratum: Stratum) -> u64 {
    match stratum {
        Stratum::Known(s) => s as u64,
        Stratum::Unknown => u64::MAX - 1,
        Stratum::Contradiction => u64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdl::parse_gdl;

    const MAX_PASSES: usize = 1000;

    fn ingest(source: &str) -> RuleSet {
        RuleSet::ingest(&parse_gdl(source).unwrap()).unwrap()
    }

    #[test]
    fn test_facts_become_tautologies() {
        let set = ingest("(role red) (succ 1 2) terminal");
        assert!(set.is_tautology("(role red)"));
        assert!(set.is_tautology("(succ 1 2)"));
        assert!(set.is_tautology("terminal"));
    }

    #[test]
    fn test_init_seeds_state_not_table() {
        let set = ingest("(init (step 1)) (role red)");
        assert!(set.initial_trues().contains("(true (step 1))"));
        assert!(!set.contains_head("(init (step 1))"));
        assert!(!set.contains_head("(true (step 1))"));
    }

    #[test]
    fn test_rules_accumulate_disjuncts() {
        let set = ingest(
            "(<= (win red) (line red x)) \
             (<= (win red) (line red o))",
        );
        match set.entry("(win red)") {
            Some(Entry::Rules(d)) => assert_eq!(d.len(), 2),
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_literals_and_disjuncts_dedup() {
        let set = ingest(
            "(<= p (q a) (q a)) \
             (<= p (q a))",
        );
        match set.entry("p") {
            Some(Entry::Rules(d)) => {
                assert_eq!(d.len(), 1);
                assert_eq!(d[0].len(), 1);
            }
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_malformed_top_level_rejected() {
        let tree = parse_gdl("?x").unwrap();
        assert!(matches!(
            RuleSet::ingest(&tree),
            Err(TranslationError::MalformedClause(_))
        ));
    }

    #[test]
    fn test_cull_resolves_fact_literals() {
        let mut set = ingest("(q a) (<= p (q a))");
        set.cull(MAX_PASSES).unwrap();
        assert!(set.is_tautology("p"));
    }

    #[test]
    fn test_cull_drops_unsatisfiable_disjuncts() {
        let mut set = ingest("(<= p (q a)) (<= p (r b)) (r b)");
        set.cull(MAX_PASSES).unwrap();
        // (q a) is undefined, so the first disjunct dies; the second one
        // proves the head outright
        assert!(set.is_tautology("p"));
    }

    #[test]
    fn test_cull_removes_contradictions() {
        let mut set = ingest("(<= p (q a)) (<= r p)");
        set.cull(MAX_PASSES).unwrap();
        assert!(!set.contains_head("p"));
        // and the removal cascades into dependents on the next pass
        assert!(!set.contains_head("r"));
    }

    #[test]
    fn test_cull_negative_literal_on_missing_head_is_vacuous() {
        let mut set = ingest("(<= p (not (q a)))");
        set.cull(MAX_PASSES).unwrap();
        assert!(set.is_tautology("p"));
    }

    #[test]
    fn test_cull_negative_literal_on_tautology_is_unsat() {
        let mut set = ingest("(q a) (<= p (not (q a)))");
        set.cull(MAX_PASSES).unwrap();
        assert!(!set.contains_head("p"));
    }

    #[test]
    fn test_state_literals_are_left_for_evaluation() {
        let mut set = ingest("(<= p (true (step 1)))");
        set.cull(MAX_PASSES).unwrap();
        match set.entry("p") {
            Some(Entry::Rules(d)) => {
                assert_eq!(d[0].iter().collect::<Vec<_>>(), vec!["(true (step 1))"]);
            }
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_does_requires_a_legal_head() {
        let mut set = ingest(
            "(legal red noop) \
             (<= (next (idle red)) (does red noop)) \
             (<= (next (oops red)) (does red jump))",
        );
        set.cull(MAX_PASSES).unwrap();
        // admissible move survives untouched
        match set.entry("(next (idle red))") {
            Some(Entry::Rules(d)) => {
                assert_eq!(d[0].iter().collect::<Vec<_>>(), vec!["(does red noop)"]);
            }
            other => panic!("unexpected entry {:?}", other),
        }
        // inadmissible move kills its disjunct, and with it the head
        assert!(!set.contains_head("(next (oops red))"));
    }

    #[test]
    fn test_negated_does_on_missing_legal_is_vacuous() {
        let mut set = ingest("(<= p (not (does red jump)))");
        set.cull(MAX_PASSES).unwrap();
        assert!(set.is_tautology("p"));
    }

    #[test]
    fn test_distinct_resolved_during_cull() {
        let mut set = ingest(
            "(<= p (distinct a b)) \
             (<= q (distinct a a)) \
             (<= r (not (distinct a a)))",
        );
        set.cull(MAX_PASSES).unwrap();
        assert!(set.is_tautology("p"));
        assert!(!set.contains_head("q"));
        assert!(set.is_tautology("r"));
    }

    #[test]
    fn test_cull_is_idempotent_and_reports_passes() {
        let mut set = ingest("(q a) (<= p (q a) (r b)) (r b)");
        let first = set.cull(MAX_PASSES).unwrap();
        assert!(first >= 2);
        let second = set.cull(MAX_PASSES).unwrap();
        assert_eq!(second, 1);
    }

    #[test]
    fn test_to_gdl_rendering() {
        let mut set = ingest("(role red) (<= p (true (step 1)) (not (q a)))");
        set.cull(MAX_PASSES).unwrap();
        let rendered = set.to_gdl();
        assert!(rendered.contains("(role red)\n"));
        assert!(rendered.contains("(<= p (true (step 1)))\n"));
    }
}
