//! Translation session: one game description, start to finish.
//!
//! ```ignore
//! let mut translation = Translation::from_source(source)?;
//! let first = translation.initial_model()?;
//! let second = translation.successor_model(&first)?;
//! println!("{}", translation.to_gdl_ordered());
//! ```
//!
//! The session owns every table the pipeline produces: the domain graph,
//! the ground program, the dependency graph with its strata, and the
//! simplified rule table. All fixpoints run under the caps in
//! [`TranslationConfig`] and fail with an explicit error instead of
//! looping on a pathological cyclic program.

use crate::dependency::DependencyGraph;
use crate::domain::DomainGraph;
use crate::error::{Result, TranslationWarning};
use crate::gdl::{parse_gdl, GdlTree};
use crate::grounding::ground;
use crate::model::{initial_model, successor_model, Model};
use crate::ruleset::RuleSet;
use serde::{Deserialize, Serialize};

/// Caps for the three fixpoints of a translation.
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub max_cull_passes: usize,
    pub max_strat_rounds: usize,
    pub max_eval_passes: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        TranslationConfig {
            max_cull_passes: 1_000,
            max_strat_rounds: 10_000,
            max_eval_passes: 10_000,
        }
    }
}

/// Counters collected while translating and evaluating.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationProfile {
    pub input_clauses: usize,
    pub ground_clauses: usize,
    /// Clause instances produced by substitution.
    pub instances: usize,
    pub cull_passes: usize,
    pub strat_rounds: usize,
    /// Dependency edges rewritten to read the previous state.
    pub oldify_rewrites: usize,
    /// Worklist passes of the most recent model evaluation.
    pub eval_passes: usize,
    /// Heads the most recent evaluation could not decide.
    pub undecided_heads: usize,
}

/// A translated game description and everything computed from it.
pub struct Translation {
    pub domains: DomainGraph,
    pub ground: GdlTree,
    pub deps: DependencyGraph,
    pub rules: RuleSet,
    pub profile: TranslationProfile,
    pub warnings: Vec<TranslationWarning>,
    config: TranslationConfig,
}

impl Translation {
    /// Translate a game description with default caps.
    pub fn from_source(source: &str) -> Result<Self> {
        Self::with_config(source, TranslationConfig::default())
    }

    /// Translate a game description.
    pub fn with_config(source: &str, config: TranslationConfig) -> Result<Self> {
        let tree = parse_gdl(source)?;
        Self::from_tree(&tree, config)
    }

    /// Translate an already-parsed program.
    pub fn from_tree(tree: &GdlTree, config: TranslationConfig) -> Result<Self> {
        let domains = DomainGraph::build(tree);
        let grounding = ground(tree, &domains);

        let mut deps = DependencyGraph::build(&grounding.tree);
        let stratified = deps.compute_strata(config.max_strat_rounds)?;

        let mut rules = RuleSet::ingest(&grounding.tree)?;
        let cull_passes = rules.cull(config.max_cull_passes)?;
        deps.mark_contradictions(&rules);

        let profile = TranslationProfile {
            input_clauses: tree.top_level().len(),
            ground_clauses: grounding.tree.top_level().len(),
            instances: grounding.instances,
            cull_passes,
            strat_rounds: stratified.rounds,
            oldify_rewrites: stratified.oldified,
            eval_passes: 0,
            undecided_heads: 0,
        };

        Ok(Translation {
            domains,
            ground: grounding.tree,
            deps,
            rules,
            profile,
            warnings: grounding.warnings,
            config,
        })
    }

    /// Evaluate the first game state.
    pub fn initial_model(&mut self) -> Result<Model> {
        let eval = initial_model(&self.rules, self.config.max_eval_passes)?;
        self.profile.eval_passes = eval.passes;
        self.profile.undecided_heads = eval.undecided;
        Ok(eval.model)
    }

    /// Evaluate the state following `previous`.
    pub fn successor_model(&mut self, previous: &Model) -> Result<Model> {
        let eval = successor_model(&self.rules, previous, self.config.max_eval_passes)?;
        self.profile.eval_passes = eval.passes;
        self.profile.undecided_heads = eval.undecided;
        Ok(eval.model)
    }

    /// All rule-table heads in ascending stratum order.
    pub fn ordered_heads(&self) -> Vec<String> {
        self.rules.ordered_heads(&self.deps)
    }

    /// Render the simplified table in table order.
    pub fn to_gdl(&self) -> String {
        self.rules.to_gdl()
    }

    /// Render the simplified table in stratum order.
    pub fn to_gdl_ordered(&self) -> String {
        self.rules.to_gdl_ordered(&self.deps)
    }
}
